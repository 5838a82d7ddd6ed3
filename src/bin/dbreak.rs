use dbreak::config::{self, Config};
use dbreak::connections::wrap_connection;
use dbreak::render::{OutputFormat, Renderer};
use dbreak::{repl, Connection, DbreakError, DebugSession, Result};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: dbreak [--config PATH] [--json] [NAME=PATH | PATH]...";

/// Command line arguments.
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    json: bool,
    unnamed: Vec<String>,
    named: Vec<(String, String)>,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> std::result::Result<Args, String> {
    let mut parsed = Args::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().ok_or("--config needs a path")?;
                parsed.config = Some(PathBuf::from(path));
            }
            "--json" => parsed.json = true,
            "-h" | "--help" => return Err(USAGE.to_string()),
            flag if flag.starts_with("--") => return Err(format!("unknown option {flag}\n{USAGE}")),
            _ => match arg.split_once('=') {
                Some((name, path)) if !name.is_empty() => parsed.named.push((name.to_string(), path.to_string())),
                _ => parsed.unnamed.push(arg),
            },
        }
    }
    Ok(parsed)
}

fn open(path: &str) -> Result<Connection> {
    info!(path, "opening SQLite database");
    Ok(Connection::raw(rusqlite::Connection::open(path)?))
}

fn build_session(args: &Args, config: &Config) -> Result<DebugSession> {
    let mut unnamed = args
        .unnamed
        .iter()
        .map(|path| open(path))
        .collect::<Result<Vec<_>>>()?;
    let named = args
        .named
        .iter()
        .map(|(name, path)| Ok((name.clone(), open(path)?)))
        .collect::<Result<Vec<_>>>()?;

    if unnamed.is_empty() && named.is_empty() && config.connections.is_empty() {
        unnamed.push(open(":memory:")?);
    }

    // With nothing on the command line, the first configured connection
    // seeds the session.
    let mut configured = config.connections.iter();
    let mut session = if unnamed.is_empty() && named.is_empty() {
        let (name, path) = configured
            .next()
            .ok_or_else(|| DbreakError::Config("no connections configured".to_string()))?;
        DebugSession::from_connections(Vec::<Connection>::new(), vec![(name.clone(), open(path)?)])?
    } else {
        DebugSession::from_connections(unnamed, named)?
    };

    for (name, path) in configured {
        if session.connections().contains(name) {
            warn!(name = %name, "configured connection clashes with a command line name, skipping it");
            continue;
        }
        session.add_connection(name, wrap_connection(open(path)?)?)?;
    }
    Ok(session)
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };

    let config = match config::resolve_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize the logging system using tracing subscriber
    init_logging(&config);
    info!("Starting dbreak...");

    let mut session = match build_session(&args, &config) {
        Ok(session) => session,
        Err(e) => {
            error!(error = %e, "failed to set up connections");
            eprintln!("Failed to set up connections: {e}");
            std::process::exit(1);
        }
    };

    let format = if args.json { OutputFormat::Json } else { config.console.output };
    if let Err(e) = repl::run_repl(&mut session, Renderer::new(format), &config.console) {
        error!(error = %e, "console failed");
        eprintln!("Console error: {e}");
        std::process::exit(1);
    }
}
