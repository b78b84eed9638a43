//! Veracity - fact-check assistant shell.
//!
//! Main entry point for the Veracity CLI. Wires the three surfaces (page
//! agent, coordinator, panel) over an in-process bus: selections typed into
//! the shell flow through the page agent's gate to the coordinator, get
//! relayed to the panel, and verdicts from the external verification
//! service render to the terminal.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use veracity_config::{
    AgentSettings, Config, ConfigLoader, PanelSettings, RelaySettings, StoreSettings,
};
use veracity_coordinator::{Coordinator, CoordinatorConfig};
use veracity_page_agent::{ChannelSource, PageAgent, PageAgentConfig};
use veracity_panel::{
    Panel, PanelConfig, PanelController, PanelEvent, ReportStore, VerdictView, VerifyClient,
};
use veracity_protocols::bus::{Endpoint, HostActions, MessageBus};
use veracity_protocols::error::HostError;
use veracity_protocols::report::SavedReport;
use veracity_relay::{LocalBus, RetryConfig};

/// Veracity CLI.
#[derive(Parser)]
#[command(name = "veracity")]
#[command(about = "Fact-check assistant shell")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive shell (default): typed lines are checked as selections
    Run,

    /// Verify one piece of text and exit
    Check {
        /// The text to verify
        text: String,

        /// Save the verdict to the report log
        #[arg(long)]
        save: bool,
    },

    /// List or clear saved reports
    Reports {
        /// Clear the report log
        #[arg(long)]
        clear: bool,
    },

    /// Show or update configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the active configuration
    Show,
    /// Set the verification service endpoint
    SetApiBase {
        /// e.g. http://127.0.0.1:8080
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run);

    let config_path = cli.config.clone().unwrap_or_else(ConfigLoader::default_path);
    let config = ConfigLoader::load(&config_path)?;
    veracity_config::validate(&config)?;

    let _guard = init_tracing(matches!(command, Commands::Run));

    match command {
        Commands::Run => run_shell(config).await,
        Commands::Check { text, save } => check_once(config, &text, save).await,
        Commands::Reports { clear } => reports(config, clear).await,
        Commands::Config { action } => configure(config, &config_path, action),
    }
}

fn init_tracing(file_logging: bool) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if file_logging {
        // Keep the terminal clean for the panel; logs go to a rolling file.
        let log_dir = ConfigLoader::default_store_path()
            .parent()
            .map(|parent| parent.join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"));
        let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "veracity.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(writer).with_ansi(false))
            .with(filter)
            .try_init();
        Some(guard)
    } else {
        let _ = tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(filter)
            .try_init();
        None
    }
}

// ============================================================================
// Host actions
// ============================================================================

/// Host side effects for a terminal shell: the panel is the terminal itself,
/// tabs open through the platform's URL opener.
struct SystemHost;

#[async_trait]
impl HostActions for SystemHost {
    async fn open_panel(&self) -> Result<(), HostError> {
        // The terminal panel is always visible in shell mode
        debug!("panel surface already open");
        Ok(())
    }

    async fn open_tab(&self, url: &str) -> Result<(), HostError> {
        let (program, args): (&str, Vec<&str>) = match std::env::consts::OS {
            "macos" => ("open", vec![url]),
            "windows" => ("cmd", vec!["/C", "start", "", url]),
            _ => ("xdg-open", vec![url]),
        };
        std::process::Command::new(program)
            .args(&args)
            .spawn()
            .map(|_| ())
            .map_err(|e| HostError::ActionFailed(format!("{}: {}", program, e)))
    }
}

// ============================================================================
// Config conversions
// ============================================================================

fn retry_config(relay: &RelaySettings) -> RetryConfig {
    RetryConfig {
        max_retries: relay.max_retries,
        base_delay: Duration::from_millis(relay.base_delay_ms),
        max_delay: Duration::from_millis(relay.max_delay_ms),
    }
}

fn agent_config(agent: &AgentSettings, relay: &RelaySettings) -> PageAgentConfig {
    PageAgentConfig {
        monitor_start: Duration::from_millis(agent.monitor_start_ms),
        monitor_max: Duration::from_millis(agent.monitor_max_ms),
        ping_interval: Duration::from_millis(agent.ping_interval_ms),
        debounce: Duration::from_millis(relay.debounce_ms),
    }
}

fn panel_config(panel: &PanelSettings) -> PanelConfig {
    PanelConfig {
        auto_verify_delay: Duration::from_millis(panel.auto_verify_delay_ms),
        poll_interval: Duration::from_millis(panel.poll_interval_ms),
        fallback_stagger: Duration::from_millis(panel.fallback_stagger_ms),
    }
}

fn coordinator_config(panel: &PanelSettings) -> CoordinatorConfig {
    CoordinatorConfig { source_stagger: Duration::from_millis(panel.source_stagger_ms) }
}

fn store_path(store: &StoreSettings) -> PathBuf {
    if store.path.is_empty() {
        ConfigLoader::default_store_path()
    } else {
        PathBuf::from(ConfigLoader::expand_path(&store.path))
    }
}

fn report_store(store: &StoreSettings) -> ReportStore {
    ReportStore::new(store_path(store), store.max_reports)
}

// ============================================================================
// Commands
// ============================================================================

async fn run_shell(config: Config) -> anyhow::Result<()> {
    let retry = retry_config(&config.relay);
    let bus = Arc::new(LocalBus::with_ack_timeout(Duration::from_millis(
        config.relay.ack_timeout_ms,
    )));
    let host: Arc<dyn HostActions> = Arc::new(SystemHost);

    let coordinator_inbox = bus.register(Endpoint::Coordinator, 64);
    let panel_inbox = bus.register(Endpoint::Panel, 64);
    let agent_inbox = bus.register(Endpoint::PageAgent, 64);

    let coordinator = Coordinator::new(
        Arc::clone(&bus) as Arc<dyn MessageBus>,
        Arc::clone(&host),
        coordinator_config(&config.panel),
        retry.clone(),
    );
    coordinator.start(coordinator_inbox)?;

    let controller = Arc::new(
        PanelController::new(
            Arc::clone(&bus) as Arc<dyn MessageBus>,
            VerifyClient::new(config.api.base.clone()),
            report_store(&config.store),
            panel_config(&config.panel),
            retry.clone(),
        )
        .with_fallback_host(Arc::clone(&host)),
    );
    let panel = Panel::new(Arc::clone(&controller));
    panel.start(panel_inbox)?;

    let agent = PageAgent::new(
        Arc::clone(&bus) as Arc<dyn MessageBus>,
        agent_config(&config.agent, &config.relay),
        retry.clone(),
    );
    let (selection_tx, selection_rx) = mpsc::channel(16);
    agent.add_source(Arc::new(ChannelSource::new("stdin", selection_rx)));
    agent.start(agent_inbox)?;

    info!("shell started against {}", config.api.base);

    // Render panel events to the terminal.
    let mut events = controller.events();
    let renderer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => render_event(&event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!("renderer lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    println!("veracity - type or paste text to fact-check it");
    println!("commands: :save  :sources  :report  :reports  :quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if let Some(command) = line.strip_prefix(':') {
                    match command {
                        "quit" | "q" => break,
                        "save" => {
                            if let Err(err) = controller.save_report().await {
                                eprintln!("could not save report: {}", err);
                            }
                        }
                        "sources" => controller.open_all_sources().await,
                        "report" => match controller.current_report_text() {
                            Some(text) => println!("{}", text),
                            None => println!("No verdict yet."),
                        },
                        "reports" => print_reports(&report_store(&config.store)).await?,
                        other => println!("unknown command :{}", other),
                    }
                } else {
                    // A "selection" on the page
                    let _ = selection_tx.send(line).await;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    agent.dispose();
    panel.stop();
    coordinator.stop();
    renderer.abort();
    info!("shell stopped");
    Ok(())
}

fn render_event(event: &PanelEvent) {
    match event {
        PanelEvent::SelectionHighlighted(text) => println!("\n> Checking: \"{}\"", text),
        PanelEvent::SelectionCleared => {}
        PanelEvent::Loading => println!("  verifying..."),
        PanelEvent::Verdict(view) => print!("{}", view),
        PanelEvent::InputRejected(message)
        | PanelEvent::VerifyFailed(message)
        | PanelEvent::Notice(message) => println!("  {}", message),
        PanelEvent::ReportSaved => println!("  Report saved."),
        PanelEvent::SourcesOpened(count) => println!("  Opening {} source(s)...", count),
    }
}

async fn check_once(config: Config, text: &str, save: bool) -> anyhow::Result<()> {
    let text = text.trim();
    if text.is_empty() {
        bail!("Please enter some text to verify");
    }

    let client = VerifyClient::new(config.api.base.clone());
    let result = match client.check(text).await {
        Ok(result) => result,
        Err(err) => bail!("Error: {}", err),
    };

    let view = VerdictView::from(&result);
    print!("{}", view);

    if save {
        let report = SavedReport::new(
            text,
            view.verdict.as_str(),
            result.analysis.confidence,
            view.explanation.clone(),
        );
        report_store(&config.store).save(report).await?;
        println!("Report saved.");
    }
    Ok(())
}

async fn reports(config: Config, clear: bool) -> anyhow::Result<()> {
    let store = report_store(&config.store);
    if clear {
        store.clear().await?;
        println!("Report log cleared.");
        return Ok(());
    }
    print_reports(&store).await
}

async fn print_reports(store: &ReportStore) -> anyhow::Result<()> {
    let reports = store.list().await?;
    if reports.is_empty() {
        println!("No saved reports.");
        return Ok(());
    }
    for (index, report) in reports.iter().enumerate() {
        println!(
            "{}. [{}] {} ({}% confidence)",
            index + 1,
            report.timestamp.format("%Y-%m-%d %H:%M"),
            report.verdict,
            (report.confidence.clamp(0.0, 1.0) * 100.0).round() as u8,
        );
        println!("   \"{}\"", report.text);
        if !report.explanation.is_empty() {
            println!("   {}", report.explanation);
        }
    }
    Ok(())
}

fn configure(mut config: Config, path: &PathBuf, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            println!("# {}", path.display());
            print!("{}", ConfigLoader::to_toml(&config)?);
        }
        ConfigAction::SetApiBase { url } => {
            config.api.base = url.trim().to_string();
            veracity_config::validate(&config)?;
            ConfigLoader::save(&config, path)?;
            println!("Saved. api.base = {}", config.api.base);
        }
    }
    Ok(())
}
