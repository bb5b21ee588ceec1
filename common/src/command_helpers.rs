use crate::types::Opts;
use anyhow::{Context, bail};
use std::process::{Command, Output};

/// Returns a printable string of the given command
///
pub fn format_command(cmd: &Command) -> String {
    format!(
        "{} {}",
        cmd.get_program().to_string_lossy(),
        cmd.get_args()
            .map(|arg| arg.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    )
}

/// Runs a read-only command and returns its output as a Vec of strings, one per line.
/// Empty lines are omitted. A non-zero exit is an error, carrying whatever the command
/// wrote to stderr.
///
pub fn output_as_lines(mut cmd: Command, opts: &Opts) -> anyhow::Result<Vec<String>> {
    if opts.verbose {
        println!("{}", format_command(&cmd));
    }

    let raw_output = checked_output(&mut cmd)?;
    let string_output = String::from_utf8(raw_output.stdout)?;
    let lines: Vec<String> = string_output
        .lines()
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect();

    Ok(lines)
}

/// Runs a command which changes something. With noop set, the command is printed and
/// nothing else happens.
///
pub fn run_command(mut cmd: Command, opts: &Opts) -> anyhow::Result<()> {
    if opts.verbose || opts.noop {
        println!("{}", format_command(&cmd));
    }

    if opts.noop {
        return Ok(());
    }

    checked_output(&mut cmd)?;
    Ok(())
}

fn checked_output(cmd: &mut Command) -> anyhow::Result<Output> {
    let output = cmd
        .output()
        .with_context(|| format!("failed to run '{}'", format_command(cmd)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "'{}' exited {}: {}",
            format_command(cmd),
            output.status.code().map_or("on a signal".to_string(), |c| c.to_string()),
            stderr.trim()
        );
    }

    Ok(output)
}
