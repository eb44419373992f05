use anyhow::Result;

use super::{
    args::{Arguments, Command},
    commands::{build::build, init::init},
    exit_status::ExitStatus,
};

/// Dispatch to the command handler.
pub fn run(Arguments { command }: Arguments) -> Result<ExitStatus> {
    match command {
        Some(Command::Build(cmd)) => build(cmd),
        Some(Command::Init) => init(),
        None => {
            anyhow::bail!("No command provided. Use --help to see available commands.")
        }
    }
}
