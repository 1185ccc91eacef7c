//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::sandbox::{ResourceLimits, DEFAULT_TIMEOUT_SECS};

#[derive(Parser)]
#[command(name = "tsar")]
#[command(author, version, about = "Translate the keyword dialect into Python and run it in a sandbox", long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: SubCommand,

    /// Dictionary file (JSON object of keyword -> replacement)
    #[arg(long, global = true, env = "TSAR_DICTIONARY", default_value = "dictionary.json")]
    pub dictionary: PathBuf,

    /// Isolation backend used to run programs
    #[arg(long, global = true, env = "TSAR_BACKEND", value_enum, default_value_t = Backend::Docker)]
    pub backend: Backend,

    /// Container image (docker backend)
    #[arg(long, global = true, env = "TSAR_IMAGE", default_value = crate::sandbox::boundary::DEFAULT_IMAGE)]
    pub image: String,

    /// Interpreter run directly on the host (host backend)
    #[arg(long, global = true, env = "TSAR_INTERPRETER", default_value = crate::sandbox::boundary::DEFAULT_INTERPRETER)]
    pub interpreter: String,

    /// Wall-clock limit in seconds
    #[arg(long, global = true, env = "TSAR_TIMEOUT", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Memory ceiling in megabytes
    #[arg(long, global = true, env = "TSAR_MEMORY_MB", default_value_t = 128)]
    pub memory_mb: u64,

    /// CPU share (e.g. 0.5 for half a core)
    #[arg(long, global = true, env = "TSAR_CPUS", default_value_t = 0.5)]
    pub cpus: f64,

    /// File whose contents are fed to the program's standard input
    #[arg(long, global = true, value_name = "FILE")]
    pub stdin: Option<PathBuf>,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output (echo program output live, debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Args {
    pub fn limits(&self) -> ResourceLimits {
        ResourceLimits {
            memory_mb: self.memory_mb,
            cpu_share: self.cpus,
            ..ResourceLimits::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Throwaway container per run
    Docker,
    /// Interpreter on the host, memory limit only
    Host,
}

#[derive(Subcommand)]
pub enum SubCommand {
    /// Translate and run inline dialect code
    Run {
        /// Dialect source code
        code: String,
    },

    /// Translate and run a dialect source file (.tsar)
    File {
        /// Path to the source file
        path: PathBuf,
    },

    /// Translate without running
    Translate {
        /// Inline code or path to a .tsar file
        input: String,
    },

    /// List the active dictionary, longest keywords first
    Words,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_defaults() {
        let args = Args::try_parse_from(["tsar", "run", "выведи(1)"]).unwrap();
        assert!(matches!(args.command, SubCommand::Run { ref code } if code == "выведи(1)"));
        assert_eq!(args.backend, Backend::Docker);
        assert_eq!(args.limits(), ResourceLimits::default());
    }

    #[test]
    fn test_parse_global_options_after_subcommand() {
        let args = Args::try_parse_from([
            "tsar", "file", "a.tsar", "--backend", "host", "--timeout", "3", "--memory-mb", "64",
        ])
        .unwrap();
        assert_eq!(args.backend, Backend::Host);
        assert_eq!(args.timeout, 3);
        assert_eq!(args.limits().memory_mb, 64);
        assert!(args.limits().network_disabled);
    }

    #[test]
    fn test_missing_command_is_error() {
        assert!(Args::try_parse_from(["tsar"]).is_err());
    }
}
