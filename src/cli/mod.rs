//! Command-line interface: argument parsing, command handlers and report
//! printing.

use std::process::ExitCode;

use anyhow::Result;

mod args;
mod commands;
mod exit_status;
mod report;
mod run;

pub use args::{Arguments, BuildCommand, Command};
pub use exit_status::ExitStatus;
pub use report::{BuildMode, FAILURE_MARK, SUCCESS_MARK};

pub fn run_cli(args: Arguments) -> Result<ExitCode> {
    let Some(args) = args.with_command_or_help() else {
        return Ok(ExitStatus::Success.into());
    };

    Ok(run::run(args)?.into())
}
