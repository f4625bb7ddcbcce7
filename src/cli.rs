use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Watchlist checker for grocery store specials")]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "config.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Search the store price APIs for watchlist offers
    Check {
        /// Run the full checker but do not send an email
        #[arg(long)]
        no_email: bool,
        /// Keep running, re-checking on the configured interval
        #[arg(long)]
        watch: bool,
    },
    /// Scrape the configured store specials pages
    Scrape {
        /// Log every scraped item and skip the email sink
        #[arg(long)]
        test: bool,
    },
    /// Check the mailbox for recent store newsletters
    Mail {
        /// Days to look back (overrides the configured window)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Parse a PDF catalogue, or every catalogue in a directory
    Pdf {
        path: PathBuf,
    },
    /// Fetch one raw API response and print sample products
    Probe {
        store: String,
        keyword: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_flags_parse() {
        let cli = Cli::try_parse_from(["specials-sniper", "check", "--no-email"]).expect("parse");
        assert_eq!(cli.config, PathBuf::from("config.json"));
        match cli.command {
            Command::Check { no_email, watch } => {
                assert!(no_email);
                assert!(!watch);
            }
            _ => panic!("expected check subcommand"),
        }
    }

    #[test]
    fn probe_takes_store_and_keyword() {
        let cli = Cli::try_parse_from([
            "specials-sniper",
            "--config",
            "other.json",
            "probe",
            "coles",
            "tim tam",
        ])
        .expect("parse");
        assert_eq!(cli.config, PathBuf::from("other.json"));
        match cli.command {
            Command::Probe { store, keyword } => {
                assert_eq!(store, "coles");
                assert_eq!(keyword, "tim tam");
            }
            _ => panic!("expected probe subcommand"),
        }
    }
}
