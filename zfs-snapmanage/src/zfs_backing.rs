use camino::Utf8PathBuf;
use common::command_helpers::{format_command, output_as_lines, run_command};
use common::types::Opts;
use snapmanage::{BackingError, BackingSystem, Dataset, SnapshotRecord};
use std::process::Command;
use time::OffsetDateTime;

/// Drives snapshots through zfs(8).
///
pub struct ZfsBacking {
    zfs: Utf8PathBuf,
    opts: Opts,
}

impl ZfsBacking {
    pub fn new(zfs: Utf8PathBuf, opts: Opts) -> Self {
        Self { zfs, opts }
    }

    fn command(&self, action: &str) -> Command {
        let mut cmd = Command::new(&self.zfs);
        cmd.arg(action);
        cmd
    }

    fn change(&self, cmd: Command) -> Result<(), BackingError> {
        let description = format_command(&cmd);
        run_command(cmd, &self.opts).map_err(|e| BackingError::with_source(description, e))
    }
}

impl BackingSystem for ZfsBacking {
    fn create_snapshot(&self, dataset: &Dataset, name: &str) -> Result<(), BackingError> {
        let mut cmd = self.command("snapshot");
        cmd.arg(dataset.snapshot_path(name));
        self.change(cmd)
    }

    // -r, because zfs won't roll back past later snapshots without it. Not -R: that
    // would take clones with it.
    fn rollback_to(&self, dataset: &Dataset, name: &str) -> Result<(), BackingError> {
        let mut cmd = self.command("rollback");
        cmd.arg("-r").arg(dataset.snapshot_path(name));
        self.change(cmd)
    }

    fn destroy_snapshot(&self, dataset: &Dataset, name: &str) -> Result<(), BackingError> {
        let mut cmd = self.command("destroy");
        cmd.arg(dataset.snapshot_path(name));
        self.change(cmd)
    }

    fn enumerate(&self, dataset: &Dataset) -> Result<Vec<SnapshotRecord>, BackingError> {
        let mut cmd = self.command("list");
        cmd.arg("-Hp")
            .arg("-t")
            .arg("snapshot")
            .arg("-d")
            .arg("1")
            .arg("-s")
            .arg("createtxg")
            .arg("-o")
            .arg("name,creation")
            .arg(dataset.name());

        let description = format_command(&cmd);
        let lines = output_as_lines(cmd, &self.opts)
            .map_err(|e| BackingError::with_source(description, e))?;

        parse_listing(&lines, dataset)
    }
}

/// Turns `zfs list -Hp -o name,creation` output into records. Lines for any other
/// dataset are ignored.
///
fn parse_listing(lines: &[String], dataset: &Dataset) -> Result<Vec<SnapshotRecord>, BackingError> {
    let prefix = dataset.snapshot_path("");

    lines
        .iter()
        .filter_map(|line| {
            let (full_name, creation) = match line.split_once('\t') {
                Some(fields) => fields,
                None => return Some(Err(BackingError::new(format!("cannot parse '{}'", line)))),
            };

            let name = full_name.strip_prefix(&prefix)?;
            Some(parse_creation(creation).map(|created_at| SnapshotRecord::new(name, created_at)))
        })
        .collect()
}

fn parse_creation(field: &str) -> Result<OffsetDateTime, BackingError> {
    let seconds: i64 = field
        .trim()
        .parse()
        .map_err(|e| BackingError::with_source(format!("bad creation time '{}'", field), e))?;

    OffsetDateTime::from_unix_timestamp(seconds)
        .map_err(|e| BackingError::with_source(format!("bad creation time '{}'", field), e))
}
