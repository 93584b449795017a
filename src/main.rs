//! twirl CLI - spinner demos and config management

use anyhow::Result;
use clap::{Parser, Subcommand};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use twirl::{
    symbols, Attribute, Color, Context, InterruptSupervisor, Spinner, SpinnerBuilder,
    SpinnerConfig, Style, NO_MESSAGE,
};

#[derive(Parser)]
#[command(name = "twirl")]
#[command(about = "Animated terminal spinners")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Config file (default: ~/.config/twirl/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Never animate; print plain lines instead
    #[arg(long, alias = "ni", global = true)]
    non_interactive: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scripted demo tasks
    Demo,

    /// Show every frame set in the catalog
    All {
        /// Seconds to show each frame set
        #[arg(short, long, default_value = "2")]
        seconds: u64,
    },

    /// List frame set names
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a single spinner
    Run {
        /// Message next to the spinner
        #[arg(short, long)]
        message: Option<String>,

        /// Prefix label
        #[arg(short, long)]
        prefix: Option<String>,

        /// Frame set name
        #[arg(short, long)]
        symbols: Option<String>,

        /// How long to spin
        #[arg(long, default_value = "3")]
        seconds: u64,

        /// Finish with a failure
        #[arg(long)]
        fail: bool,
    },

    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Initialize configuration file with defaults
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Validate configuration
    Validate,
}

#[derive(Serialize)]
struct CatalogEntry {
    name: &'static str,
    frames: &'static [&'static str],
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging on stderr so it never lands on the spinner line
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.clone().unwrap_or_else(SpinnerConfig::default_path);

    match cli.command {
        Commands::Config(cmd) => run_config(cmd, config_path)?,
        Commands::List { json } => run_list(json)?,
        Commands::Demo => {
            let context = spinner_context(cli.non_interactive)?;
            run_demo(&context).await;
        }
        Commands::All { seconds } => {
            let context = spinner_context(cli.non_interactive)?;
            run_all(&context, seconds).await;
        }
        Commands::Run {
            message,
            prefix,
            symbols,
            seconds,
            fail,
        } => {
            let config = SpinnerConfig::load_from(config_path)?;
            let context = spinner_context(cli.non_interactive)?;

            let mut builder = SpinnerBuilder::from_config(config).context(context);
            if let Some(message) = message {
                builder = builder.message(message);
            }
            if let Some(prefix) = prefix {
                builder = builder.prefix(prefix);
            }
            if let Some(name) = symbols {
                builder = builder.symbols(name.as_str());
            }
            if let Err(err) = builder.validate() {
                warn!("{}", err);
            }
            run_single(builder.build(), seconds, fail).await;
        }
    }

    Ok(())
}

/// Context with the interrupt supervisor wired to exit the process
fn spinner_context(non_interactive: bool) -> Result<Context> {
    let supervisor = InterruptSupervisor::install()?;
    let mut interrupts = supervisor.subscribe();
    tokio::spawn(async move {
        if let Ok(interrupt) = interrupts.recv().await {
            debug!(?interrupt, "exiting after interrupt");
            std::process::exit(interrupt.exit_code());
        }
    });

    let context = Context::from_env().with_interrupts(supervisor);
    if non_interactive {
        context.set_non_interactive(true);
    }
    Ok(context)
}

async fn run_single(spinner: Spinner, seconds: u64, fail: bool) {
    spinner.start();
    sleep(Duration::from_secs(seconds)).await;
    if fail {
        spinner.fail(NO_MESSAGE);
    } else {
        spinner.done(["Finished"]);
    }
}

/// Show every catalog entry in turn
async fn run_all(context: &Context, seconds: u64) {
    let width = symbols::names().map(str::len).max().unwrap_or(0);
    let hint = Style::from(Color::DarkGrey)
        .then(Attribute::Italic)
        .paint("(Press Ctrl+C to exit)");

    for name in symbols::names() {
        let spinner = Spinner::builder()
            .context(context.clone())
            .message(hint.clone())
            .prefix(format!("{:width$}", name, width = width))
            .symbols(name)
            .build();
        spinner.start();
        sleep(Duration::from_secs(seconds)).await;
        spinner.done([spinner.symbols().concat()]);
    }
}

async fn run_demo(context: &Context) {
    simple_task(context).await;
    connection(context).await;
    failed_connection(context).await;
}

async fn simple_task(context: &Context) {
    let spinner = Spinner::builder()
        .context(context.clone())
        .spinner_color(Color::Green)
        .prefix("Simple Task #1")
        .done_color(Style::from(Color::Green).then(Attribute::Italic))
        .build();
    spinner.start();
    sleep(Duration::from_secs(2)).await;
    spinner.done(["Task Completed!"]);
}

/// Connect, then stream through a batch of files
async fn connection(context: &Context) {
    let spinner = Spinner::builder()
        .context(context.clone())
        .symbols("circles2")
        .spinner_color(Color::AnsiValue(214))
        .message("Connecting...")
        .prefix("S3 Backup")
        .build();
    spinner.start();
    sleep(Duration::from_secs(2)).await;

    spinner.update_symbols(["✓"]);
    spinner.update_spinner_color(Color::Green);
    spinner.update_message("Connected!");
    spinner.update_message_color(Style::from(Color::Green).then(Attribute::Italic));
    sleep(Duration::from_secs(1)).await;

    spinner.update_message_color(Color::DarkGrey);
    spinner.update_spinner_color(Style::new());
    spinner.update_symbols("grow");
    for _ in 0..15 {
        spinner.update_message(&format!("{}.zip", random_name(12)));
        sleep(Duration::from_millis(200)).await;
    }
    spinner.done(["Backup completed!"]);
}

async fn failed_connection(context: &Context) {
    let spinner = Spinner::builder()
        .context(context.clone())
        .message("Trying to connect...")
        .prefix("AWS Server")
        .fail_color(Style::from(Color::Red).then(Attribute::SlowBlink))
        .build();
    spinner.start();
    sleep(Duration::from_secs(2)).await;
    spinner.fail(["Connection Failed!"]);
}

fn random_name(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

fn run_list(json: bool) -> Result<()> {
    if json {
        let entries: Vec<CatalogEntry> = symbols::catalog()
            .map(|(name, frames)| CatalogEntry { name, frames })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let width = symbols::names().map(str::len).max().unwrap_or(0);
    for (name, frames) in symbols::catalog() {
        println!("{:width$}  {}", name, frames.join(" "), width = width);
    }
    Ok(())
}

fn run_config(cmd: ConfigCommands, path: PathBuf) -> Result<()> {
    match cmd {
        ConfigCommands::Init { force } => {
            if path.exists() && !force {
                println!("Config already exists at {}", path.display());
                println!("Use --force to overwrite");
                return Ok(());
            }
            SpinnerConfig::default().save_to(path.clone())?;
            info!("Wrote default config to {}", path.display());
            println!("Created {}", path.display());
        }
        ConfigCommands::Show => {
            let config = SpinnerConfig::load_from(path)?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigCommands::Path => {
            println!("{}", path.display());
        }
        ConfigCommands::Validate => {
            let config = SpinnerConfig::load_required(path)?;
            match config.validate() {
                Ok(()) => println!("Configuration is valid"),
                Err(err) => {
                    println!("Configuration error: {}", err);
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}
