use clap::{Parser, Subcommand};

mod commands;

use commands::calibration::CalibrationArgs;
use commands::stuck_check::StuckCheckArgs;

#[derive(Parser)]
#[command(name = "signal-monitor")]
#[command(about = "Operational checks for the ai_signals trading-signal table", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count stuck ai_signals rows (non-virtual) and list the oldest offenders
    StuckCheck(StuckCheckArgs),
    /// Win-probability calibration report over one or more date windows
    Calibration(CalibrationArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::StuckCheck(args) => commands::stuck_check::run(args).await?,
        Commands::Calibration(args) => commands::calibration::run(args).await?,
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
