//! Command line interface for the `chunkwire` binary.
//!
//! `split` turns a file into transport-ready packet lines and `join` turns
//! those lines back into the original body.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Command line arguments for the `chunkwire` binary.
#[derive(Debug, Parser)]
#[command(
    name = "chunkwire",
    version,
    about = "Split payloads into transport-sized packets and join them back"
)]
pub struct Cli {
    /// JSON configuration file. Defaults apply when omitted.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Frame and fragment a file, printing one encoded packet per line.
    Split {
        /// Topic the payload is published under.
        #[arg(short, long)]
        topic: String,
        /// Send packets as fast as possible instead of at the configured pace.
        #[arg(long)]
        no_pace: bool,
        /// Input file; standard input when omitted.
        input: Option<PathBuf>,
    },
    /// Reassemble packet lines and write each completed payload body.
    Join {
        /// Peer identity attached to deliveries.
        #[arg(short, long, default_value = "local")]
        peer: String,
        /// Output file; standard output when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Input file of packet lines; standard input when omitted.
        input: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn parses_split() {
        let cli = Cli::parse_from(["chunkwire", "split", "--topic", "chat", "in.bin"]);
        match cli.command {
            Command::Split {
                topic,
                no_pace,
                input,
            } => {
                assert_eq!(topic, "chat");
                assert!(!no_pace);
                assert_eq!(input, Some(PathBuf::from("in.bin")));
            }
            Command::Join { .. } => panic!("expected split"),
        }
    }

    #[test]
    fn parses_join_with_global_config() {
        let cli = Cli::parse_from(["chunkwire", "join", "--config", "c.json", "-o", "out"]);
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
        match cli.command {
            Command::Join { peer, output, input } => {
                assert_eq!(peer, "local");
                assert_eq!(output, Some(PathBuf::from("out")));
                assert_eq!(input, None);
            }
            Command::Split { .. } => panic!("expected join"),
        }
    }

    #[test]
    fn split_requires_topic() {
        assert!(Cli::try_parse_from(["chunkwire", "split"]).is_err());
    }
}
