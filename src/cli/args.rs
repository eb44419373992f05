//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `build`: Bundle the project, in standard or Globalize mode
//! - `init`: Initialize the intlpack configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct BuildCommand {
    /// Compile formatters at build time and bundle the runtime-only library
    #[arg(long, env = "INTLPACK_GLOBALIZE")]
    pub globalize: bool,

    /// Path to the config file (default: search upwards for .intlpackrc.json)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Bundle the entry module and everything it requires
    Build(BuildCommand),
    /// Initialize a new .intlpackrc.json configuration file
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build_flags() {
        let args = Arguments::try_parse_from(["intlpack", "build", "--globalize", "-v"]).unwrap();
        let Some(Command::Build(cmd)) = &args.command else {
            panic!("expected build command");
        };
        assert!(cmd.globalize);
        assert!(cmd.config.is_none());
    }

    #[test]
    fn test_parse_config_path() {
        let args =
            Arguments::try_parse_from(["intlpack", "build", "--config", "conf/a.json"]).unwrap();
        let Some(Command::Build(cmd)) = args.command else {
            panic!("expected build command");
        };
        assert_eq!(cmd.config, Some(PathBuf::from("conf/a.json")));
    }

    #[test]
    fn test_debug_assert() {
        Arguments::command().debug_assert();
    }
}
