mod ui;

use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::Arc,
};

use mindswitch::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    log_store::{CsvLogRepository, LogRepository, MemoryLogRepository},
    report::DaySummary,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    stimulus::StimulusProvider,
    timer::SystemClock,
    App, BanditModel, Control, SessionMachine, SessionState,
};

/// focused work, guided mind-wandering breaks, and a recommender that learns which break restores you
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Runs a work interval, offers a short mind-wandering break with one of four stimuli, scores how much the break helped (MWI), and learns which stimulus to recommend next time. Sessions are appended to a CSV log."
)]
pub struct Cli {
    /// minutes of focused work (5-90, multiples of 5)
    #[clap(short = 'w', long)]
    work_minutes: Option<u32>,

    /// default break length in minutes (1-5)
    #[clap(short = 'r', long)]
    rest_minutes: Option<u32>,

    /// probability of recommending a random stimulus instead of the best one
    #[clap(long)]
    epsilon: Option<f64>,

    /// session log location (CSV)
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// seed the recommender and stimulus randomness
    #[clap(long)]
    seed: Option<u64>,

    /// keep this run's sessions in memory only
    #[clap(long)]
    no_log: bool,

    /// write the effective settings to the config file
    #[clap(long)]
    save_config: bool,

    /// print today's sessions and exit
    #[clap(long)]
    today: bool,
}

impl Cli {
    /// Flags win over stored settings.
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(w) = self.work_minutes {
            cfg.work_minutes = w;
        }
        if let Some(r) = self.rest_minutes {
            cfg.rest_minutes = r;
        }
        if let Some(e) = self.epsilon {
            cfg.epsilon = e;
        }
        if let Some(p) = &self.log_file {
            cfg.log_path = Some(p.clone());
        }
        cfg
    }

    fn open_log(&self, cfg: &Config) -> Box<dyn LogRepository> {
        if self.no_log {
            return Box::new(MemoryLogRepository::new());
        }
        let path = cfg.log_path.clone().unwrap_or_else(AppDirs::log_path);
        Box::new(CsvLogRepository::new(path))
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _guard = init_tracing();

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    if let Err(e) = config.validate() {
        Cli::command().error(ErrorKind::ValueValidation, e).exit();
    }
    if cli.save_config {
        store.save(&config)?;
        tracing::info!(path = %store.path().display(), "config saved");
    }

    let log = cli.open_log(&config);

    if cli.today {
        let day = Local::now().date_naive();
        let summary = DaySummary::new(day, log.filter_by_day(day)?);
        print!("{}", summary.to_text());
        if let Some(path) = log.location() {
            println!("Full log: {}", path.display());
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut machine = SessionMachine::new(
        SessionState::new(config.work_minutes, config.rest_minutes),
        BanditModel::new(config.epsilon),
        log,
        Arc::new(SystemClock),
    );
    if let Some(seed) = cli.seed {
        machine = machine.with_seed(seed);
    }
    let mut app = App::new(machine, StimulusProvider::new(AppDirs::noise_dir(), cli.seed));
    tracing::info!(
        work_minutes = config.work_minutes,
        rest_minutes = config.rest_minutes,
        epsilon = config.epsilon,
        "starting session"
    );

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());

    loop {
        terminal.draw(|f| ui::draw(app, f))?;
        if app.on_event(runner.step()) == Control::Quit {
            break;
        }
    }

    Ok(())
}

/// File-only tracing: the terminal belongs to the TUI. `RUST_LOG` overrides
/// the default filter.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let dir = AppDirs::trace_dir()?;
    std::fs::create_dir_all(&dir).ok()?;

    let file_appender = tracing_appender::rolling::daily(&dir, "mindswitch.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mindswitch=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .try_init()
        .ok()?;

    Some(guard)
}
