mod app;
mod boot;
mod config;
mod control;
mod error;
mod gesture;
mod logging;
mod net;
mod store;
mod surface;
mod timer;
mod ui;
mod wake;

use crate::app::action::Action;
use crate::app::event::AppEvent;
use crate::app::handler;
use crate::app::state::KioskState;
use crate::control::{ControlCommand, ControlServer};
use crate::gesture::{GestureUnlock, UnlockRegion};
use crate::net::{ConnectivityGate, ConnectivityOracle, StaticOracle, SysfsOracle, Transport};
use crate::store::{FileSettingsStore, MemorySettingsStore, SettingsStore, UrlStore};
use crate::surface::probe::ProbeSettings;
use crate::surface::viewer::Viewer;
use crate::surface::{ProbeSurface, RenderSurface};
use crate::timer::RetryTimer;
use crate::wake::WakeLock;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::mpsc;

/// Appended to the configured user agent on every page request.
const USER_AGENT_SUFFIX: &str = " KioskBrowser/1.0";

#[derive(Parser)]
#[command(name = "kiosk-pin", version, about = "Pin a display to one web page and keep it there")]
struct Cli {
    /// Config file (default: <config dir>/kiosk-pin/config.toml)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Persist and load this URL at boot
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Point the running kiosk at a new URL
    PushUrl {
        #[arg(value_name = "URL")]
        url: String,
    },
    /// Make the running kiosk load its URL again
    Reload,
    /// Write a config file with every default filled in
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;

    if let Some(command) = cli.command {
        logging::init_stderr(&cfg.logging);
        return run_command(command, &cfg, cli.config).await;
    }

    let log_path = logging::init(&cfg.logging)?;
    tracing::info!(
        "kiosk-pin {} starting, logging to {}",
        env!("CARGO_PKG_VERSION"),
        log_path.display()
    );

    // Install panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        original_hook(info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run kiosk
    let result = run_kiosk(&mut terminal, cfg, cli.url).await;

    // Restore terminal
    restore_terminal()?;

    if let Err(e) = result {
        tracing::error!("Kiosk stopped: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

async fn run_command(
    command: Commands,
    cfg: &config::AppConfig,
    path: Option<PathBuf>,
) -> Result<()> {
    let socket = &cfg.control.socket_path;
    match command {
        Commands::PushUrl { url } => {
            let url = url.trim();
            if url.is_empty() {
                bail!("URL must not be empty");
            }
            let reply = control::send_command(socket, &ControlCommand::Url(url.to_string())).await?;
            println!("{}", reply);
        }
        Commands::Reload => {
            let reply = control::send_command(socket, &ControlCommand::Reload).await?;
            println!("{}", reply);
        }
        Commands::InitConfig { force } => {
            let path = path.unwrap_or_else(config::config_path);
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            config::save_config(&config::AppConfig::default(), &path)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}

fn build_state(cfg: &config::AppConfig, surface_width: u16) -> KioskState {
    let settings: Box<dyn SettingsStore> =
        match FileSettingsStore::open(cfg.settings.store_path.clone()) {
            Ok(store) => {
                tracing::info!("Settings stored in {}", store.path().display());
                Box::new(store)
            }
            Err(e) => {
                tracing::warn!("{}; the URL will not survive a restart", e);
                Box::new(MemorySettingsStore::new())
            }
        };

    let oracle: Box<dyn ConnectivityOracle> = if cfg.network.assume_online {
        Box::new(StaticOracle::new([Transport::Ethernet]))
    } else {
        Box::new(SysfsOracle::new(cfg.network.sysfs_root.clone()))
    };

    let policy = cfg.tls.policy.build();
    tracing::info!("Certificate policy: {}", policy.name());

    let region = UnlockRegion::top_right(
        surface_width,
        cfg.gesture.region_width,
        cfg.gesture.region_height,
    );
    KioskState::new(
        UrlStore::new(settings),
        ConnectivityGate::new(oracle),
        policy,
        GestureUnlock::new(region),
    )
}

fn probe_settings(cfg: &config::AppConfig) -> ProbeSettings {
    ProbeSettings {
        timeout: Duration::from_millis(cfg.surface.timeout_ms),
        user_agent: format!("{}{}", cfg.surface.user_agent, USER_AGENT_SUFFIX),
        ca_bundle: cfg.tls.ca_bundle.clone(),
    }
}

/// Carry out one controller effect.
fn execute_action(action: Action, surface: &mut dyn RenderSurface, timer: &mut RetryTimer) {
    match action {
        Action::Load { url, attempt } => surface.load(&url, attempt),
        Action::SetSurfaceVisible(visible) => surface.set_visible(visible),
        Action::ArmRetry { token, delay } => timer.arm(token, delay),
        Action::CancelRetry { token } => timer.cancel(token),
        Action::GoBack => {
            if !surface.go_back_if_possible() {
                tracing::debug!("No history to go back to");
            }
        }
        Action::ResolveCertificate { reply, decision } => reply.send(decision),
        Action::ReleaseSurface => surface.release(),
    }
}

async fn run_kiosk(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    cfg: config::AppConfig,
    url_override: Option<String>,
) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();

    let size = terminal.size()?;
    let mut state = build_state(&cfg, size.width);
    let mut surface = ProbeSurface::new(
        probe_settings(&cfg),
        Viewer::new(cfg.surface.viewer_command.clone()),
        event_tx.clone(),
    );
    let mut timer = RetryTimer::new(event_tx.clone());
    let mut wake_lock = WakeLock::acquire(&cfg.wake_lock.command);

    // Spawn terminal input task
    let term_tx = event_tx.clone();
    let started = Instant::now();
    tokio::spawn(async move {
        let mut reader = EventStream::new();
        while let Some(Ok(event)) = reader.next().await {
            let at_ms = started.elapsed().as_millis() as u64;
            if term_tx.send(AppEvent::Input { event, at_ms }).is_err() {
                break;
            }
        }
    });

    // Supervisor shutdown
    let signal_tx = event_tx.clone();
    tokio::spawn(async move {
        let received = wait_for_shutdown(signal(SignalKind::terminate())).await;
        tracing::info!("{} received", received);
        let _ = signal_tx.send(AppEvent::Teardown);
    });

    let control_task = if cfg.control.enabled {
        match ControlServer::bind(&cfg.control.socket_path) {
            Ok(server) => Some(server.spawn(event_tx.clone())),
            Err(e) => {
                tracing::warn!(
                    "Control socket {} unavailable: {}",
                    cfg.control.socket_path.display(),
                    e
                );
                None
            }
        }
    } else {
        None
    };

    for event in boot::boot_events(url_override.as_deref()) {
        let _ = event_tx.send(event);
    }

    // Initial render
    terminal.draw(|f| ui::render(f, &state))?;

    // Main event loop
    while let Some(event) = event_rx.recv().await {
        let actions = handler::handle_event(&mut state, event);
        for action in actions {
            execute_action(action, &mut surface, &mut timer);
        }

        // Conditional render (only if dirty)
        if state.dirty {
            terminal.draw(|f| ui::render(f, &state))?;
            state.dirty = false;
        }

        if state.torn_down {
            break;
        }
    }

    if let Some(task) = control_task {
        task.abort();
    }
    timer.cancel_all();
    wake_lock.release();
    tracing::info!("kiosk-pin stopped");
    Ok(())
}

/// Wait for SIGTERM or SIGINT. SIGINT is still watched when SIGTERM cannot
/// be. If neither can, this never resolves.
async fn wait_for_shutdown(term: io::Result<Signal>) -> &'static str {
    match term {
        Ok(mut term) => tokio::select! {
            Some(()) = term.recv() => "SIGTERM",
            Ok(()) = tokio::signal::ctrl_c() => "SIGINT",
            else => std::future::pending().await,
        },
        Err(e) => {
            tracing::warn!("Cannot watch SIGTERM: {}", e);
            match tokio::signal::ctrl_c().await {
                Ok(()) => "SIGINT",
                Err(e) => {
                    tracing::warn!("Cannot watch SIGINT: {}", e);
                    std::future::pending().await
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::event::AttemptId;
    use crate::app::state::DisplayState;
    use crate::surface::policy::{CertDecision, CertReply};

    #[derive(Default)]
    struct RecordingSurface {
        loads: Vec<(String, AttemptId)>,
        visible: Vec<bool>,
        back_calls: usize,
        released: bool,
    }

    impl RenderSurface for RecordingSurface {
        fn load(&mut self, url: &str, attempt: AttemptId) {
            self.loads.push((url.to_string(), attempt));
        }

        fn go_back_if_possible(&mut self) -> bool {
            self.back_calls += 1;
            false
        }

        fn set_visible(&mut self, visible: bool) {
            self.visible.push(visible);
        }

        fn release(&mut self) {
            self.released = true;
        }
    }

    fn offline_config() -> config::AppConfig {
        let mut cfg = config::AppConfig::default();
        cfg.settings.store_path = std::env::temp_dir()
            .join(format!("kiosk-pin-main-{}", std::process::id()))
            .join("settings.toml");
        cfg.network.sysfs_root = PathBuf::from("/nonexistent/sys/class/net");
        cfg
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["kiosk-pin", "push-url", "http://ha.lan"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::PushUrl { url }) if url == "http://ha.lan"));

        let cli = Cli::try_parse_from(["kiosk-pin", "--url", "http://a", "--config", "/tmp/k.toml"])
            .unwrap();
        assert_eq!(cli.url.as_deref(), Some("http://a"));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/k.toml")));
        assert!(cli.command.is_none());

        assert!(Cli::try_parse_from(["kiosk-pin", "push-url"]).is_err());
    }

    #[test]
    fn test_probe_settings_user_agent() {
        let cfg = config::AppConfig::default();
        let settings = probe_settings(&cfg);
        assert!(settings.user_agent.ends_with(" KioskBrowser/1.0"));
        assert_eq!(settings.timeout, Duration::from_millis(15_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_keeps_waiting_without_sigterm() {
        let unavailable = Err(io::Error::new(io::ErrorKind::Other, "no signal driver"));
        let waited =
            tokio::time::timeout(Duration::from_secs(60), wait_for_shutdown(unavailable)).await;
        assert!(waited.is_err(), "returned before any signal arrived");
    }

    #[tokio::test(start_paused = true)]
    async fn test_offline_boot_retries_through_timer() {
        let cfg = offline_config();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = build_state(&cfg, 80);
        let mut surface = RecordingSurface::default();
        let mut timer = RetryTimer::new(tx);

        for action in handler::handle_event(&mut state, AppEvent::Start) {
            execute_action(action, &mut surface, &mut timer);
        }
        assert_eq!(state.display, DisplayState::NetworkUnavailable);
        assert!(surface.loads.is_empty());
        assert_eq!(surface.visible, vec![false]);
        assert!(timer.pending().is_some());

        let fired = rx.recv().await.unwrap();
        assert!(matches!(fired, AppEvent::RetryFired { .. }));
        for action in handler::handle_event(&mut state, fired) {
            execute_action(action, &mut surface, &mut timer);
        }
        assert_eq!(state.display, DisplayState::NetworkUnavailable);
        assert!(timer.pending().is_some());

        for action in handler::handle_event(&mut state, AppEvent::Teardown) {
            execute_action(action, &mut surface, &mut timer);
        }
        assert!(surface.released);
        assert_eq!(timer.pending(), None);
    }

    #[tokio::test]
    async fn test_online_boot_loads_and_resolves_certificates() {
        let mut cfg = offline_config();
        cfg.network.assume_online = true;
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut state = build_state(&cfg, 80);
        let mut surface = RecordingSurface::default();
        let mut timer = RetryTimer::new(tx);

        for action in handler::handle_event(&mut state, AppEvent::Start) {
            execute_action(action, &mut surface, &mut timer);
        }
        assert_eq!(state.display, DisplayState::Loading);
        let (url, attempt) = surface.loads[0].clone();
        assert_eq!(url, state.store.get());

        let (reply, decision) = CertReply::channel();
        let event = AppEvent::CertificateError {
            attempt,
            issue: crate::surface::policy::CertificateIssue {
                url,
                reason: "UnknownIssuer".into(),
            },
            reply,
        };
        for action in handler::handle_event(&mut state, event) {
            execute_action(action, &mut surface, &mut timer);
        }
        assert_eq!(decision.await.unwrap(), CertDecision::Trust);

        let back = AppEvent::Input {
            event: crossterm::event::Event::Key(crossterm::event::KeyEvent::new(
                crossterm::event::KeyCode::Esc,
                crossterm::event::KeyModifiers::NONE,
            )),
            at_ms: 0,
        };
        for action in handler::handle_event(&mut state, back) {
            execute_action(action, &mut surface, &mut timer);
        }
        assert_eq!(surface.back_calls, 1);
    }
}
