//! Terminal UI for platemap that loads China's region boundaries and shows
//! the license-plate prefix of each region.

mod app;
mod input;
mod ui;

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration as StdDuration,
};

use anyhow::{Context as _, Result, anyhow};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use platemap_core::{
    HttpFetcher, LoaderConfig, PlateMapService, SourceFetcher, plugin::SourceRegistry,
};
use platemap_provider_cdn as cdn;
use platemap_provider_datav as datav;
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::input::Action;

const DEFAULT_LOG_FILTER: &str = "platemap_core=info,platemap_tui=info";

/// Browse Chinese license-plate prefixes on a region map.
#[derive(Debug, Parser)]
#[command(name = "platemap", version, about)]
struct Cli {
    /// Source to load on start (`cdn` or `datav`)
    #[arg(long)]
    source: Option<String>,

    /// Per-region fetches issued at once
    #[arg(long, default_value_t = 5)]
    batch_size: usize,

    /// Fetch every region at once, ignoring --batch-size
    #[arg(long)]
    unbounded: bool,

    /// Pause between batches in milliseconds
    #[arg(long, default_value_t = 200)]
    delay_ms: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Log file; the terminal itself is taken by the UI
    #[arg(long, default_value = "platemap.log")]
    log_file: PathBuf,
}

impl Cli {
    fn loader_config(&self) -> LoaderConfig {
        let batch_size = if self.unbounded { 0 } else { self.batch_size };
        LoaderConfig::default()
            .with_batch_size(batch_size)
            .with_inter_batch_delay(StdDuration::from_millis(self.delay_ms))
            .with_fetch_timeout(StdDuration::from_secs(self.timeout_secs))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli.log_file)?;

    // HTTP + service setup
    let config = cli.loader_config();
    let fetcher: Arc<dyn SourceFetcher> =
        Arc::new(HttpFetcher::from_config(&config).context("building HTTP client")?);

    let plugins = vec![cdn::plugin(), datav::plugin()];
    let registry = Arc::new(SourceRegistry::new(plugins));
    let service = Arc::new(PlateMapService::new(registry, fetcher, config));

    // App state
    let mut app = App::new(service);
    if let Some(source) = &cli.source {
        app.select_source_by_id(source)
            .ok_or_else(|| anyhow!("unknown source `{source}`"))?;
        app.start_load();
    }

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        // Pick up a finished load before drawing
        if let Some(handle) = app.poll_load() {
            match handle.wait().await {
                Ok(context) => app.on_loaded(context),
                Err(err) => app.on_failed(&err),
            }
        }

        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll for input (non-blocking, small timeout so progress keeps moving)
        if event::poll(StdDuration::from_millis(100))?
            && let CEvent::Key(key) = event::read()?
        {
            match input::handle_key_event(key, &mut app) {
                Action::Quit => break,
                Action::None => {}
                Action::StartLoad => app.start_load(),
                Action::CancelLoad => app.cancel_load(),
            }
        }
    }

    // Leaving drops any running load, which cancels it.
    Ok(())
}

fn init_logging(path: &Path) -> Result<WorkerGuard> {
    let directory = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow!("log path `{}` has no file name", path.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_flag_overrides_batch_size() {
        let cli = Cli::parse_from(["platemap", "--batch-size", "3", "--unbounded"]);
        assert_eq!(
            cli.loader_config().concurrency,
            platemap_core::Concurrency::Unbounded
        );
    }

    #[test]
    fn flags_map_onto_loader_config() {
        let cli = Cli::parse_from(["platemap", "--delay-ms", "50", "--timeout-secs", "3"]);
        let config = cli.loader_config();

        assert_eq!(config.concurrency.batch_size(31), 5);
        assert_eq!(config.inter_batch_delay, StdDuration::from_millis(50));
        assert_eq!(config.fetch_timeout, StdDuration::from_secs(3));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
