use colored::Colorize;
use snapmanage::{RollbackPlan, Snapshot};
use std::io::{self, BufRead, Write};
use time::{format_description, OffsetDateTime, UtcOffset};

pub fn print_listing<'a, W: Write>(
    out: &mut W,
    snapshots: impl Iterator<Item = &'a Snapshot>,
) -> io::Result<usize> {
    let mut count = 0;

    for snapshot in snapshots {
        writeln!(out, "{}", basic_line(snapshot))?;
        count += 1;
    }

    if count == 0 {
        writeln!(out, "No snapshots.")?;
    }

    Ok(count)
}

pub fn print_plan<W: Write>(out: &mut W, plan: &RollbackPlan) -> io::Result<()> {
    writeln!(
        out,
        "Rolling back {} to @{} discards all changes made since {}.",
        plan.dataset,
        plan.target.name,
        format_timestamp(plan.target.created_at)
    )?;

    if plan.doomed.is_empty() {
        writeln!(out, "No snapshots will be destroyed.")
    } else {
        writeln!(out, "These snapshots will be destroyed:")?;
        for snapshot in &plan.doomed {
            writeln!(out, "{}", basic_line(snapshot).red())?;
        }
        Ok(())
    }
}

/// Asks a yes/no question. Anything but y or yes, including end of input, is a no.
///
pub fn confirm<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    question: &str,
) -> io::Result<bool> {
    write!(out, "{} [y/N] > ", question)?;
    out.flush()?;

    let mut buffer = String::new();
    if input.read_line(&mut buffer)? == 0 {
        writeln!(out)?;
        return Ok(false);
    }

    Ok(matches!(
        buffer.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn basic_line(snapshot: &Snapshot) -> String {
    format!(
        "{:>4} {:<30} {}",
        snapshot.sequence,
        snapshot.name,
        format_timestamp(snapshot.created_at)
    )
}

fn format_timestamp(timestamp: OffsetDateTime) -> String {
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    format_timestamp_in(timestamp, local_offset)
}

fn format_timestamp_in(timestamp: OffsetDateTime, offset: UtcOffset) -> String {
    let format = match format_description::parse(
        "[year]-[month]-[day] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]",
    ) {
        Ok(format) => format,
        Err(_) => return String::from("Invalid date"),
    };

    timestamp
        .to_offset(offset)
        .format(&format)
        .unwrap_or_else(|_| String::from("Invalid date"))
}
