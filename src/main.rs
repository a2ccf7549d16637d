use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

#[derive(Parser)]
#[command(name = "trendboard")]
#[command(about = "Calendar-windowed trend charts for dashboard widgets")]
struct Cli {
    #[arg(
        long,
        env = "TRENDBOARD_DATA_DIR",
        default_value = "trendboard-data",
        help = "Directory holding settings.json and the record store"
    )]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Refresh every widget until Ctrl-C (the default)
    Run,
    /// Load a JSON document export into the SQLite store
    Import { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    trendboard_lib::init_logging();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => trendboard_lib::run(&cli.data_dir).await,
        Commands::Import { file } => {
            let imported = trendboard_lib::import(&cli.data_dir, &file).await?;
            info!("{imported} records imported into {}", cli.data_dir.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["trendboard", "--data-dir", "/tmp/board"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.data_dir, PathBuf::from("/tmp/board"));
    }

    #[test]
    fn import_takes_a_file() {
        let cli = Cli::try_parse_from(["trendboard", "import", "tweets.json"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Import {
                file: PathBuf::from("tweets.json")
            })
        );
    }

    #[test]
    fn import_without_a_file_is_rejected() {
        let err = Cli::try_parse_from(["trendboard", "import"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn help_flag_requests_help_output() {
        let err = Cli::try_parse_from(["trendboard", "--help"]).err().unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
