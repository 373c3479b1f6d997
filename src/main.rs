use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::DefaultTerminal;
use std::path::Path;
use std::sync::mpsc::channel;
use std::time::Duration;
use tallview::config::AppConfig;
use tallview::{resource, App, AppEvent, Args, ConfigManager, LoadOptions, APP_NAME};

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, args: &Args, config: &AppConfig) -> Result<()> {
    let (tx, rx) = channel::<AppEvent>();
    let mut app = App::new_with_config(tx.clone(), config)?;
    let poll_interval = Duration::from_millis(config.performance.event_poll_interval_ms);

    render(&mut terminal, &mut app)?;
    let configured = config.dataset.path.as_deref();
    match resource::resolve(args.path.as_deref(), configured, &config.dataset.file_name) {
        Ok(path) => {
            let opts = LoadOptions::from_args_and_config(args, &config.dataset);
            tx.send(AppEvent::Open(path, opts))?;
        }
        Err(e) => {
            app.fail_load(&e);
            render(&mut terminal, &mut app)?;
        }
    }

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

/// Send tracing output to `log_path`; the terminal belongs to the UI.
fn init_tracing(log_path: &Path) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(log_path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tallview=debug"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(filter)
        .try_init()
        .map_err(|e| eyre!("Failed to install log subscriber: {}", e))
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        let config_manager = ConfigManager::new(APP_NAME)?;
        let path = config_manager.write_default_config(args.force)?;
        println!("Configuration written to {}", path.display());
        return Ok(Some(()));
    }
    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    color_eyre::install()?;

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    let config = AppConfig::load(APP_NAME)?;
    if args.debug || config.debug.enabled {
        let log_path = ConfigManager::new(APP_NAME)?.config_path(&config.debug.log_file);
        init_tracing(&log_path)?;
        tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting");
    }

    let terminal = ratatui::init();
    let result = run(terminal, &args, &config);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
