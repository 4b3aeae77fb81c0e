use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use kursbot::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for kursbot::AppCommand {
    fn from(cmd: Commands) -> kursbot::AppCommand {
        match cmd {
            Commands::Bot => kursbot::AppCommand::Bot,
            Commands::List => kursbot::AppCommand::List,
            Commands::Rate { code } => kursbot::AppCommand::Rate { code },
            Commands::Convert { code, amount } => kursbot::AppCommand::Convert { code, amount },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the Telegram bot
    Bot,
    /// List all exchange rates
    List,
    /// Show the rate of a currency and its change since the last query
    Rate {
        /// Currency code, e.g. USD
        code: String,
    },
    /// Convert an amount of a currency into roubles
    Convert {
        /// Currency code, e.g. USD
        code: String,
        /// Amount to convert, `100.5` or `100,5`
        amount: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => kursbot::cli::setup::setup(),
        Some(cmd) => kursbot::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
