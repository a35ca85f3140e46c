use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::app_config::LogLevel;
use crate::domain::entities::QualityLevel;

#[derive(Debug, Parser)]
#[command(
    name = "thumbline",
    version,
    about = "Resolve and cache video thumbnails from loose references",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH", global = true)]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum, global = true)]
    pub log_level: Option<LogLevel>,

    /// On-disk cache directory.
    #[arg(long, value_name = "DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Use the on-disk response cache.
    #[arg(long, global = true)]
    pub persistent_cache: Option<bool>,

    /// Decoded images kept in memory.
    #[arg(long, global = true)]
    pub memory_capacity: Option<usize>,

    /// Pause between failed candidates, in milliseconds.
    #[arg(long, value_name = "MS", global = true)]
    pub retry_delay_ms: Option<u64>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Maximum simultaneous downloads.
    #[arg(long, global = true)]
    pub max_concurrent: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the candidate URLs for a reference, most preferred first.
    Chain {
        /// Video id, share link, playback link or image URL.
        reference: String,
        /// Preferred quality.
        #[arg(short, long, value_enum)]
        quality: Option<QualityLevel>,
    },
    /// Resolve a reference through the caches and the network.
    Resolve {
        /// Video id, share link, playback link or image URL.
        reference: String,
        /// Preferred quality.
        #[arg(short, long, value_enum)]
        quality: Option<QualityLevel>,
        /// Write the decoded image here; the format follows the extension.
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Print the identifier extracted from a reference.
    Id {
        /// Video id, share link or playback link.
        reference: String,
    },
    /// Remove every entry from the on-disk cache.
    ClearCache,
}

impl Command {
    /// Quality passed to the subcommand, if any.
    #[must_use]
    pub const fn quality(&self) -> Option<QualityLevel> {
        match self {
            Self::Chain { quality, .. } | Self::Resolve { quality, .. } => *quality,
            Self::Id { .. } | Self::ClearCache => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolve_with_output() {
        let args = CliArgs::parse_from([
            "thumbline",
            "resolve",
            "https://youtu.be/abc",
            "-q",
            "max",
            "-o",
            "out.png",
        ]);
        let Command::Resolve {
            reference,
            quality,
            output,
        } = args.command
        else {
            panic!("expected resolve");
        };
        assert_eq!(reference, "https://youtu.be/abc");
        assert_eq!(quality, Some(QualityLevel::Max));
        assert_eq!(output, Some(PathBuf::from("out.png")));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CliArgs::parse_from(["thumbline", "clear-cache", "--cache-dir", "/tmp/x"]);
        assert!(matches!(args.command, Command::ClearCache));
        assert_eq!(args.cache_dir, Some(PathBuf::from("/tmp/x")));
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(CliArgs::try_parse_from(["thumbline"]).is_err());
    }
}
