use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use amorticheck::app::{App, SerialStatus};
use amorticheck::config::{LoggingSettings, Settings};
use amorticheck::cycle::CycleState;
use amorticheck::report::ReportFormat;
use amorticheck::source::serial;
use amorticheck::{events, ui};

/// UI loop period; also how often cycle events are applied.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "amorticheck", version)]
#[command(about = "Diagnostic dashboard for shock absorbers fed by serial sensors or a simulator")]
struct Args {
    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial port to connect to at startup
    #[arg(short, long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Shock absorber profile id (e.g. "hidraulico", "gas_monotubo")
    #[arg(long)]
    profile: Option<String>,

    /// Manufacturer id (e.g. "bilstein", "kyb")
    #[arg(long)]
    manufacturer: Option<String>,

    /// Seed for the simulator, for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// List serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Run a single diagnosis without the TUI and write the report
    #[arg(long)]
    headless: bool,

    /// Report format
    #[arg(short, long, value_enum)]
    format: Option<ReportFormat>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    if let Some(ref port) = args.port {
        settings.serial.port = Some(port.clone());
    }
    if let Some(baud) = args.baud {
        settings.serial.baud_rate = baud;
    }
    if let Some(seed) = args.seed {
        settings.simulation.seed = Some(seed);
    }
    if let Some(format) = args.format {
        settings.report.format = format;
    }

    if args.list_ports {
        return list_ports();
    }

    init_logging(&settings.logging, !args.headless)?;
    info!(version = env!("CARGO_PKG_VERSION"), "amorticheck starting");

    let rt = tokio::runtime::Runtime::new()?;

    if args.headless {
        return rt.block_on(run_headless(settings, &args));
    }

    // Timers and the serial reader run on the runtime's workers while the UI
    // loop blocks this thread
    let _guard = rt.enter();
    let mut app = App::new(settings, ui::Theme::auto_detect())?;
    select_from_args(&mut app, &args)?;
    if app.settings.serial.port.is_some() {
        app.connect();
    }

    let result = run_tui(&mut app);
    app.disconnect();
    result
}

/// Print the available serial ports
fn list_ports() -> Result<()> {
    for port in serial::available_ports()? {
        println!("{}", port);
    }
    Ok(())
}

fn select_from_args(app: &mut App, args: &Args) -> Result<()> {
    if let Some(ref profile) = args.profile {
        app.select_profile(profile)?;
    }
    if let Some(ref manufacturer) = args.manufacturer {
        app.select_manufacturer(manufacturer)?;
    }
    Ok(())
}

/// Set up tracing. The TUI owns the terminal, so it logs to a file instead.
fn init_logging(settings: &LoggingSettings, to_file: bool) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if to_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&settings.file)
            .with_context(|| format!("failed to open log file {}", settings.file.display()))?;
        builder.with_writer(Mutex::new(file)).with_ansi(false).try_init()
    } else {
        builder.with_writer(io::stderr).try_init()
    };
    result.map_err(|e| anyhow!("failed to initialise logging: {}", e))
}

/// Run one cycle without the TUI, then write the report
async fn run_headless(settings: Settings, args: &Args) -> Result<()> {
    let mut app = App::new(settings, ui::Theme::dark())?;
    select_from_args(&mut app, args)?;

    if app.settings.serial.port.is_some() {
        app.connect();
        if let Some(ref err) = app.serial_error {
            bail!("{}", err);
        }
    }

    info!(
        profile = app.profile().id,
        manufacturer = app.manufacturer().id,
        source = app.source_description(),
        "running headless diagnosis"
    );
    app.toggle_cycle();

    let mut last_logged = 0;
    while app.cycle_state() == CycleState::Running {
        tokio::time::sleep(FRAME_INTERVAL).await;
        app.tick();
        let progress = app.cycle.progress();
        if progress >= last_logged + 10 {
            info!(progress, "diagnosis progress");
            last_logged = progress - progress % 10;
        }
    }

    let path = app.export_report()?;
    println!("{}", path.display());

    app.disconnect();
    while app.serial_status == SerialStatus::Closing {
        tokio::time::sleep(FRAME_INTERVAL).await;
        app.tick();
    }
    Ok(())
}

/// Run the TUI until the user quits
fn run_tui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let result = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    while app.running {
        app.tick();
        terminal.draw(|frame| ui::render(frame, app))?;

        if let Some(Event::Key(key)) = events::poll_event(FRAME_INTERVAL)? {
            events::handle_key_event(app, key);
        }
    }
    Ok(())
}
