//! Synheart Barometer CLI
//!
//! Stress barometer over physiological recordings.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use synheart_barometer::{
    assessment::{evaluate, AssessmentRequest},
    config::Config,
    inspect::{inspect, InspectRequest, ParamSelection},
    signal::IndexRange,
    store::{subject_label, DataSource},
    VERSION,
};

#[derive(Parser)]
#[command(name = "synheart-barometer")]
#[command(author = "Synheart")]
#[command(version = VERSION)]
#[command(about = "Stress barometer over physiological recordings", long_about = None)]
struct Cli {
    /// Data directory to read recordings from (overrides configuration)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Port to listen on (defaults to the configured port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the stress assessment of a subject
    Assess {
        /// Subject identifier (S2 or 2)
        #[arg(long)]
        subject: String,

        /// Sample range, e.g. 0:1000
        #[arg(long)]
        range: Option<String>,

        /// Number of history windows
        #[arg(long, default_value = "0")]
        windows: usize,

        /// Samples per history window
        #[arg(long)]
        window_size: Option<usize>,
    },

    /// Print a preview of a subject's recording
    Inspect {
        /// Subject identifier (S2 or 2)
        #[arg(long)]
        subject: String,

        /// Preview sample size
        #[arg(long)]
        n: Option<usize>,

        /// Export full data (capped) instead of a preview
        #[arg(long)]
        full: bool,

        /// Sample range, e.g. 100:200
        #[arg(long)]
        range: Option<String>,

        /// Channel allow-list, e.g. TEMP:5,EDA
        #[arg(long)]
        params: Option<String>,
    },

    /// List subjects per recording file
    Subjects,

    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show configuration
    Show,

    /// Change one setting and save it
    Set {
        /// Setting name, e.g. port or data_dir
        key: String,

        /// New value (`auto` clears data_dir)
        value: String,
    },

    /// Restore the default configuration
    Reset,
}

fn main() {
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        eprintln!("Warning: Could not load configuration ({e}), using defaults");
        Config::default()
    });
    if cli.data_dir.is_some() {
        config.data_dir = cli.data_dir;
    }

    match cli.command {
        Commands::Serve { port } => {
            cmd_serve(config, port);
        }
        Commands::Assess {
            subject,
            range,
            windows,
            window_size,
        } => {
            cmd_assess(&config, &subject, range.as_deref(), windows, window_size);
        }
        Commands::Inspect {
            subject,
            n,
            full,
            range,
            params,
        } => {
            cmd_inspect(&config, &subject, n, full, range.as_deref(), params.as_deref());
        }
        Commands::Subjects => {
            cmd_subjects(&config);
        }
        Commands::Config { action } => match action {
            None | Some(ConfigAction::Show) => cmd_config(&config),
            Some(ConfigAction::Set { key, value }) => cmd_config_set(&key, &value),
            Some(ConfigAction::Reset) => cmd_config_reset(),
        },
    }
}

#[cfg(feature = "server")]
fn cmd_serve(config: Config, port: Option<u16>) {
    use synheart_barometer::server::{run, ServerConfig};
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("Synheart Barometer v{VERSION}");
    println!();
    println!("  Data directory: {:?}", DataSource::from_config(&config).resolve_dir());

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: Could not start async runtime: {e}");
            std::process::exit(1);
        }
    };

    let port = port.unwrap_or(config.port);
    let result: anyhow::Result<()> = runtime.block_on(async move {
        let (addr, shutdown_tx) = run(ServerConfig::new(port, config)).await?;
        println!("  Listening on: http://{addr}");
        println!();
        println!("Press Ctrl+C to stop.");

        tokio::signal::ctrl_c().await?;
        println!();
        println!("Stopping server...");
        let _ = shutdown_tx.send(());
        Ok(())
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(not(feature = "server"))]
fn cmd_serve(_config: Config, _port: Option<u16>) {
    eprintln!("Error: This build does not include the HTTP server (enable the `server` feature)");
    std::process::exit(1);
}

fn cmd_assess(
    config: &Config,
    subject: &str,
    range: Option<&str>,
    windows: usize,
    window_size: Option<usize>,
) {
    let recording = load_or_exit(config, subject);
    let request = AssessmentRequest {
        range: range.and_then(IndexRange::parse),
        windows,
        window_size: window_size.unwrap_or(config.default_window_size),
    };

    print_json(&evaluate(&recording, subject, &request));
}

fn cmd_inspect(
    config: &Config,
    subject: &str,
    n: Option<usize>,
    full: bool,
    range: Option<&str>,
    params: Option<&str>,
) {
    let recording = load_or_exit(config, subject);
    let request = InspectRequest {
        n: n.unwrap_or(config.default_sample_size),
        full,
        range: range.and_then(IndexRange::parse),
        params: params.map(ParamSelection::parse),
    };

    print_json(&inspect(&recording, &subject_label(subject), &request));
}

fn cmd_subjects(config: &Config) {
    let source = DataSource::from_config(config);
    println!("Data directory: {:?}", source.resolve_dir());
    println!();

    let by_file = match source.subjects_by_file(None) {
        Ok(by_file) => by_file,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if by_file.is_empty() {
        println!("No recordings found.");
        return;
    }

    for (file, subjects) in by_file {
        match subjects {
            Ok(subjects) if subjects.is_empty() => println!("  {file}: (no subject markers)"),
            Ok(subjects) => println!("  {file}: {}", subjects.join(", ")),
            Err(e) => println!("  {file}: error: {e}"),
        }
    }
}

fn cmd_config(config: &Config) {
    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(config).unwrap_or_else(|_| "Error".to_string())
    );
}

fn cmd_config_set(key: &str, value: &str) {
    let mut config = Config::load().unwrap_or_default();
    if let Err(e) = config.set(key, value) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    if let Err(e) = config.save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    println!("Set {key} in {:?}", Config::config_path());
}

fn cmd_config_reset() {
    if let Err(e) = Config::default().save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    println!("Configuration reset to defaults.");
}

fn load_or_exit(config: &Config, subject: &str) -> synheart_barometer::signal::Recording {
    match DataSource::from_config(config).load_subject(subject) {
        Ok(recording) => recording,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error: Could not serialize result: {e}");
            std::process::exit(1);
        }
    }
}
