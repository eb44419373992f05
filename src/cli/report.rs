//! Build report printing.
//!
//! Kept apart from the bundler so it stays usable as a library: the bundler
//! returns data, only this module writes to the terminal.

use std::io::{self, Write};

use colored::Colorize;

use crate::bundler::{BuildOutput, ModuleWarning};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Standard,
    Globalize,
}

impl BuildMode {
    pub fn label(self) -> &'static str {
        match self {
            BuildMode::Standard => "standard",
            BuildMode::Globalize => "globalize",
        }
    }
}

pub fn print_build(output: &BuildOutput, mode: BuildMode, verbose: bool) {
    print_build_to(output, mode, verbose, &mut io::stdout().lock());
}

/// Print a build report to a custom writer.
pub fn print_build_to<W: Write>(output: &BuildOutput, mode: BuildMode, verbose: bool, writer: &mut W) {
    if verbose {
        for module in &output.modules {
            let _ = writeln!(writer, "{} {}", format!("[{}]", module.id).dimmed(), module.resource);
            for dep in &module.dependencies {
                let target = match (&dep.request, dep.resolved) {
                    (Some(request), Some(id)) => format!("{} -> [{}]", request, id),
                    (Some(request), None) => format!("{} -> {}", request, "missing".red()),
                    (None, _) => String::new(),
                };
                let _ = writeln!(writer, "    {} {}", dep.category.cyan(), target);
            }
        }
    }

    for warning in &output.warnings {
        print_warning(warning, writer);
    }

    for asset in &output.assets {
        let _ = writeln!(writer, "{} {}", "emitted".bold(), asset.display());
    }

    let summary = format!(
        "Built {} module{} in {} mode",
        output.modules.len(),
        if output.modules.len() == 1 { "" } else { "s" },
        mode.label()
    );
    let line = if output.warnings.is_empty() {
        format!("{} {}", SUCCESS_MARK.green(), summary.green())
    } else {
        format!(
            "{} {}",
            FAILURE_MARK.yellow(),
            format!(
                "{} ({} warning{})",
                summary,
                output.warnings.len(),
                if output.warnings.len() == 1 { "" } else { "s" }
            )
            .yellow()
        )
    };
    let _ = writeln!(writer, "{}", line);
}

fn print_warning<W: Write>(warning: &ModuleWarning, writer: &mut W) {
    let _ = writeln!(
        writer,
        "{} {}\n  {} {}",
        "warning:".bold().yellow(),
        warning.message,
        "-->".blue(),
        warning.resource
    );
}
