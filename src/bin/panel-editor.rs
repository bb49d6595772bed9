use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use panel_editor::assets::BundledAssets;
use panel_editor::config::{Config, StartupTarget};
use panel_editor::content::ContentPorts;
use panel_editor::device::Viewport;
use panel_editor::editor::{Adapter, EditorAdapter};
use panel_editor::host::{LogFlash, MemoryLocation};
use panel_editor::keyboard::KeyEvent;
use panel_editor::language::ContentType;
use panel_editor::page::{EditorPage, PageAction, PageOptions};
use panel_editor::persistence::LocalGateway;
use panel_editor::widget::{ChangeOrigin, TextEdit};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config = Config::from_args_and_env()?;

    env_logger::Builder::new()
        .parse_filters(&config.log_level)
        .init();

    if let Some(path) = &config.config_path {
        log::info!("Using config file {}", path.display());
    }

    let location = Arc::new(MemoryLocation::new());
    let mut assets = BundledAssets::new(config.assets.clone());
    if let Some(latency) = config.asset_latency {
        assets = assets.with_latency(latency);
    }

    let page = EditorPage::new(
        PageOptions {
            server_id: config.server_id.clone(),
            classifier: config.classifier.clone(),
            user_agent: config.user_agent.clone(),
            viewport: config.viewport,
            settings: config.settings.clone(),
        },
        Arc::new(config.resolver()),
        Arc::new(assets),
        ContentPorts {
            gateway: Arc::new(LocalGateway::new(&config.root)),
            flash: Arc::new(LogFlash),
            navigator: location.clone(),
            file_browser: location.clone(),
        },
        location.clone(),
    );

    let action = match &config.target {
        StartupTarget::New => PageAction::New,
        StartupTarget::Edit(path) => PageAction::Edit(path.clone()),
    };
    let (opened, mounted) = tokio::join!(page.open(action), page.mount());
    if let Err(e) = opened {
        log::error!("{}", e.to_human());
    }
    if let Err(e) = mounted {
        log::error!("{}", e.to_human());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        match run_command(&page, &location, line.trim()).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => log::error!("{:#}", e),
        }
    }

    page.teardown();
    Ok(())
}

/// Run one driver command; `Ok(false)` ends the session
async fn run_command(page: &EditorPage, location: &MemoryLocation, line: &str) -> Result<bool> {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    match command {
        "" => {}
        ":type" => type_text(page, rest)?,
        ":set" => {
            let adapter = page.loader().adapter().context("Editor is not ready")?;
            adapter.set_value(rest);
        }
        ":lang" => {
            let outcome = page.select_language(ContentType::new(rest)).await?;
            log::info!("Language change: {:?}", outcome);
        }
        ":resize" => {
            let viewport = parse_viewport(rest)?;
            page.resize(viewport);
            let outcome = page.animation_frame().await?;
            log::info!("Resize: {:?}", outcome);
        }
        ":save" => page.save_clicked().await?,
        ":save-as" => page.file_named(rest).await?,
        ":key" => {
            let mut event = KeyEvent::parse(rest)
                .with_context(|| format!("Unrecognized key chord '{}'", rest))?;
            page.handle_key(&mut event).await?;
            log::debug!("Default prevented: {}", event.default_prevented());
        }
        ":retry" => {
            let outcome = page.retry().await?;
            log::info!("Retry: {:?}", outcome);
        }
        ":status" => {
            let status = serde_json::json!({
                "document": page.document(),
                "session": page.session(),
                "loading": page.is_loading(),
                "dirty": page.content().is_dirty(),
                "location": location.url(),
                "directory": location.directory(),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        ":quit" => return Ok(false),
        other => anyhow::bail!("Unknown command '{}'", other),
    }
    Ok(true)
}

/// Append text the way a keystroke batch would
fn type_text(page: &EditorPage, text: &str) -> Result<()> {
    let adapter = page.loader().adapter().context("Editor is not ready")?;
    let end = adapter.get_value().len();
    let edit = TextEdit::insert(end, text);
    match adapter.as_ref() {
        Adapter::Full(full) => full.widget().execute_edits(&[edit]),
        Adapter::Compact(compact) => compact.widget().apply_edits(ChangeOrigin::Input, &[edit]),
    }
    Ok(())
}

fn parse_viewport(args: &str) -> Result<Viewport> {
    let mut parts = args.split_whitespace();
    let mut next = |name: &str| -> Result<u32> {
        parts
            .next()
            .with_context(|| format!("Missing {}", name))?
            .parse()
            .with_context(|| format!("Invalid {}", name))
    };
    let width = next("width")?;
    let height = next("height")?;
    Ok(Viewport::new(width, height))
}
