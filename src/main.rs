use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{error, info};
use ratatui::{Terminal, backend::CrosstermBackend};
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode, WriteLogger};

use docview::api::{ApiServer, DocumentsHandler, ServerConfig};
use docview::event_source::KeyboardEventSource;
use docview::fetch::HttpDocumentSource;
use docview::mock_data::MockCatalog;
use docview::panic_handler::initialize_panic_handler;
use docview::pdf::mupdf_factory;
use docview::{App, run_app_with_event_source, settings, theme};

#[derive(Parser, Debug)]
#[command(name = "docview", version, about = "Terminal viewer for annotated PDF documents")]
struct Cli {
    /// Base URL of the document API
    #[arg(long, global = true)]
    server: Option<String>,

    /// Log file used by the viewer
    #[arg(long, global = true, default_value = "docview.log")]
    log_file: PathBuf,

    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Browse the catalog, or open document ID directly
    View { id: Option<String> },

    /// Run the mock document API
    Serve {
        #[arg(long)]
        bind: Option<String>,

        /// Directory with PDFs served under /mock-documents/
        #[arg(long)]
        documents_dir: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::View { id: None }) {
        Commands::Serve {
            bind,
            documents_dir,
        } => {
            TermLogger::init(
                cli.log_level,
                Config::default(),
                TerminalMode::Stderr,
                ColorChoice::Auto,
            )?;
            settings::load_settings();
            if let Some(bind) = bind {
                settings::set_bind(bind);
            }
            if let Some(dir) = documents_dir {
                settings::set_documents_dir(dir);
            }
            run_server()
        }
        Commands::View { id } => {
            let log_file = File::create(&cli.log_file)
                .with_context(|| format!("Failed to create log file {:?}", cli.log_file))?;
            WriteLogger::init(cli.log_level, Config::default(), log_file)?;
            settings::load_settings();
            if let Some(url) = cli.server {
                settings::set_server_url(url);
            }
            run_viewer(id.as_deref())
        }
    }
}

fn run_server() -> Result<()> {
    let config = ServerConfig {
        bind: settings::get_bind(),
        delay_ms: settings::get_delay_ms(),
        documents_dir: settings::get_documents_dir(),
        ..ServerConfig::default()
    };
    if let Some(dir) = &config.documents_dir {
        info!("Serving mock documents from {dir:?}");
    }

    let server = ApiServer::bind(config, DocumentsHandler::new(MockCatalog::new()))?;
    server.run();
    Ok(())
}

fn run_viewer(initial_document: Option<&str>) -> Result<()> {
    info!("Starting docview");
    theme::set_theme_by_name(&settings::get_theme_name());

    let server_url = settings::get_server_url();
    let source = HttpDocumentSource::new(&server_url, settings::get_fetch_timeout())?;
    info!("Using document API at {server_url}");

    initialize_panic_handler();

    // Terminal initialization
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(Arc::new(source), mupdf_factory(), initial_document);
    app.set_terminal_title = true;
    let res = run_app_with_event_source(&mut terminal, &mut app, &mut KeyboardEventSource);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        eprintln!("{err:?}");
    }

    info!("Shutting down docview");
    Ok(())
}
