use crate::app::terminal::{HELP, LineAction, TerminalSurface, parse_line, read_attachment};
use crate::cli::commands::{Cli, Commands, ConfigSource};
use anyhow::{Context, Result};
use omnichat_widget::config::{GistEndpoints, RawWidgetConfig, fetch_gist_config, resolve};
use omnichat_widget::messages::{MessageKind, Role, classify, decode};
use omnichat_widget::session::{WidgetEvent, WidgetHost};
use omnichat_widget::transport::{DemoTiming, demo_factory};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

/// Read the file config (or the default location), apply env overrides, then
/// layer a Gist-hosted `config.json` on top when one is named.
async fn load_raw_config(source: &ConfigSource) -> Result<RawWidgetConfig> {
    let mut raw = RawWidgetConfig::load_or_default(source.config.as_deref())?;
    if let Some(gist) = source.gist.as_deref() {
        let client = reqwest::Client::new();
        let remote = fetch_gist_config(&client, &GistEndpoints::default(), gist).await?;
        info!(gist, "loaded widget config from gist");
        raw = raw.merged_with(remote);
    }
    Ok(raw)
}

async fn run_check(source: ConfigSource) -> Result<()> {
    let raw = load_raw_config(&source).await?;
    let config = resolve(raw)?;

    println!("widget      {}", config.connection.widget_id);
    println!("org         {} ({})", config.connection.org_id, config.connection.org_url);
    println!("header      {} / {}", config.header_title, config.header_subtitle);
    println!(
        "pre-chat    {}",
        if config.prechat_enabled() { "enabled" } else { "disabled" }
    );
    println!("font        {}", config.theme.font_family);
    println!("launcher    {}", config.theme.launcher_icon);
    println!(
        "limits      poll {:?}, typing {:?}, upload {} bytes",
        config.limits.poll_interval, config.limits.typing_timeout, config.limits.max_upload_bytes
    );
    Ok(())
}

async fn run_classify(payload: Option<String>, role: Role) -> Result<()> {
    let raw = match payload {
        Some(payload) => payload,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("read payload from stdin")?;
            buf
        }
    };

    let kind = classify(role, &raw);
    println!("{kind}");
    if let Err(e) = decode(kind, &raw)
        && !matches!(kind, MessageKind::PlainText | MessageKind::System)
    {
        println!("(renders as plain text: {e})");
    }
    Ok(())
}

async fn run_demo(
    source: ConfigSource,
    name: Option<String>,
    email: Option<String>,
    question: Option<String>,
) -> Result<()> {
    let mut raw = load_raw_config(&source).await?;
    // The demo needs no real org; fill in placeholders so it runs out of the box.
    raw.org_id.get_or_insert_with(|| "demo-org".to_string());
    raw.org_url
        .get_or_insert_with(|| "https://demo.omnichannelengagementhub.com".to_string());
    raw.widget_id.get_or_insert_with(|| "demo-widget".to_string());

    let mut host = WidgetHost::new();
    let runtime = host.mount(raw, Arc::new(demo_factory(DemoTiming::default())))?;
    let (tx, rx) = mpsc::channel::<WidgetEvent>(32);

    println!("{HELP}\n");
    tx.send(WidgetEvent::ToggleWindow).await?;
    if let (Some(name), Some(email)) = (name, email) {
        tx.send(WidgetEvent::SubmitPrechat {
            name,
            email,
            question: question.unwrap_or_default(),
        })
        .await?;
    }

    let input = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let event = match parse_line(&line) {
                None => continue,
                Some(LineAction::Event(event)) => event,
                Some(LineAction::Quit) => break,
                Some(LineAction::Help) => {
                    println!("{HELP}");
                    continue;
                }
                Some(LineAction::Invalid(message)) => {
                    println!("!! {message}");
                    continue;
                }
                Some(LineAction::Attach(path)) => match read_attachment(path).await {
                    Ok(file) => WidgetEvent::AttachFile(file),
                    Err(e) => {
                        println!("!! cannot read attachment: {e}");
                        continue;
                    }
                },
            };
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });

    let controller = runtime.run(rx, TerminalSurface::default()).await;
    input.abort();
    info!(state = %controller.state(), entries = controller.timeline().len(), "demo finished");
    Ok(())
}

pub async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Check { source } => run_check(source).await,
        Commands::Classify { payload, role } => run_classify(payload, role.into()).await,
        Commands::Demo {
            source,
            name,
            email,
            question,
        } => run_demo(source, name, email, question).await,
    }
}
