use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "certchain",
    about = "certchain: tamper-evident certificates on a replicated hash-linked ledger",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Server and ledger configuration (TOML). Missing file means defaults.
    #[arg(short, long, global = true, default_value = "certchain.toml")]
    pub config: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Seed every empty replica with the genesis block
    Init(InitArgs),
    /// Show the most recent blocks
    Log(LogArgs),
    /// Show a single block
    Show(ShowArgs),
    /// Validate every replica's chain (indices, links, proofs)
    Validate,
    /// Compare the replicas' contents
    Consistency,
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Replace replicas that cannot be decoded
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,
    /// Replica to read (N1, N2, ...)
    #[arg(long, default_value = "N1")]
    pub replica: String,
}

#[derive(Args)]
pub struct ShowArgs {
    pub index: u64,
    #[arg(long, default_value = "N1")]
    pub replica: String,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Override the configured bind address
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_with_globals() {
        let cli = Cli::try_parse_from([
            "certchain", "log", "-n", "5", "--replica", "N3", "--format", "json",
        ])
        .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.config, PathBuf::from("certchain.toml"));
        match cli.command {
            Command::Log(args) => {
                assert_eq!(args.limit, 5);
                assert_eq!(args.replica, "N3");
            }
            _ => panic!("expected log"),
        }
    }

    #[test]
    fn parses_serve_bind() {
        let cli = Cli::try_parse_from(["certchain", "serve", "--bind", "0.0.0.0:8000"]).unwrap();
        match cli.command {
            Command::Serve(args) => assert_eq!(args.bind.unwrap().port(), 8000),
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn rejects_bad_index() {
        assert!(Cli::try_parse_from(["certchain", "show", "minus-one"]).is_err());
    }
}
