use crate::user_interaction::{confirm, print_listing, print_plan};
use anyhow::{anyhow, bail};
use common::rules::{any_rule_matches, parse_rules};
use regex::Regex;
use snapmanage::{BackingSystem, SnapshotOperations};
use std::io::{BufRead, Write};
use std::sync::LazyLock;

pub const INTRO: &str =
    "Welcome to interactive ZFS SnapManage shell.\nType help or ? for list commands.\n";
pub const PROMPT: &str = "(SnapManage) ";

const HELP: &str = "\
snapshot <name>       take a snapshot
rollback <name>       roll back to a snapshot, destroying every later one
destroy <name>        destroy a snapshot
list [pattern,...]    list snapshots, oldest first. Patterns may use * as a wildcard
reconcile             re-read the snapshot list from zfs
help, ?               show this
quit, exit            leave the shell";

static COMMAND_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\?|[a-zA-Z]+)(?:\s+(.*?))?\s*$").expect("valid regex"));

#[derive(Debug, PartialEq, Eq)]
enum ShellCommand {
    Snapshot(String),
    Rollback(String),
    Destroy(String),
    List(Vec<String>),
    Reconcile,
    Help,
    Quit,
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// Reads commands from `input` and applies them to one dataset's snapshots, writing
/// everything the user should see to `output`.
///
pub struct Shell<B, R, W> {
    ops: SnapshotOperations<B>,
    input: R,
    output: W,
    assume_yes: bool,
}

impl<B: BackingSystem, R: BufRead, W: Write> Shell<B, R, W> {
    pub fn new(ops: SnapshotOperations<B>, input: R, output: W, assume_yes: bool) -> Self {
        Self {
            ops,
            input,
            output,
            assume_yes,
        }
    }

    /// Runs a single command line.
    pub fn onecmd(&mut self, line: &str) -> anyhow::Result<()> {
        match parse_command(line)? {
            Some(command) => self.execute(command).map(|_| ()),
            None => Ok(()),
        }
    }

    /// Prompts for and runs commands until told to quit or the input runs dry. A failed
    /// command is reported and the loop carries on. Returns how many commands failed.
    pub fn cmdloop(&mut self) -> anyhow::Result<usize> {
        let mut errs = 0;
        write!(self.output, "{}", INTRO)?;

        loop {
            write!(self.output, "{}", PROMPT)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                writeln!(self.output)?;
                break;
            }

            let result = parse_command(&line)
                .and_then(|command| command.map_or(Ok(Flow::Continue), |c| self.execute(c)));

            match result {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => (),
                Err(e) => {
                    writeln!(self.output, "ERROR: {:#}", e)?;
                    errs += 1;
                }
            }
        }

        Ok(errs)
    }

    fn execute(&mut self, command: ShellCommand) -> anyhow::Result<Flow> {
        tracing::debug!(?command, "executing");

        match command {
            ShellCommand::Snapshot(name) => {
                let sequence = self.ops.create(&name)?.sequence;
                writeln!(
                    self.output,
                    "Created {} (#{})",
                    self.ops.dataset().snapshot_path(&name),
                    sequence
                )?;
            }
            ShellCommand::Rollback(name) => self.rollback(&name)?,
            ShellCommand::Destroy(name) => self.destroy(&name)?,
            ShellCommand::List(rules) => {
                print_listing(
                    &mut self.output,
                    self.ops.list().filter(|s| any_rule_matches(&s.name, &rules)),
                )?;
            }
            ShellCommand::Reconcile => {
                let count = self.ops.reconcile()?;
                writeln!(
                    self.output,
                    "{} has {} snapshot(s)",
                    self.ops.dataset(),
                    count
                )?;
            }
            ShellCommand::Help => writeln!(self.output, "{}", HELP)?,
            ShellCommand::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    fn rollback(&mut self, name: &str) -> anyhow::Result<()> {
        let outcome = self.ops.rollback(name, false)?;
        print_plan(&mut self.output, outcome.plan())?;

        if !self.assume_yes && !confirm(&mut self.input, &mut self.output, "Really roll back?")? {
            bail!("not confirmed: nothing was rolled back");
        }

        let outcome = self.ops.rollback(name, true)?;
        writeln!(
            self.output,
            "Rolled back to {}, destroying {} snapshot(s)",
            self.ops.dataset().snapshot_path(name),
            outcome.plan().doomed.len()
        )?;
        Ok(())
    }

    fn destroy(&mut self, name: &str) -> anyhow::Result<()> {
        let snapshot_path = self.ops.dataset().snapshot_path(name);
        self.ops.store().find(name)?;

        if !self.assume_yes
            && !confirm(
                &mut self.input,
                &mut self.output,
                &format!("Really destroy {}?", snapshot_path),
            )?
        {
            bail!("not confirmed: nothing was destroyed");
        }

        self.ops.destroy(name)?;
        writeln!(self.output, "Destroyed {}", snapshot_path)?;
        Ok(())
    }
}

/// Splits a line into a command and its argument. Blank lines are `None`.
///
fn parse_command(line: &str) -> anyhow::Result<Option<ShellCommand>> {
    if line.trim().is_empty() {
        return Ok(None);
    }

    let captures = COMMAND_LINE
        .captures(line)
        .ok_or_else(|| anyhow!("cannot parse '{}'. Try 'help'", line.trim()))?;

    let verb = captures[1].to_lowercase();
    let arg = captures
        .get(2)
        .map(|m| m.as_str().to_string())
        .filter(|a| !a.is_empty());

    let command = match (verb.as_str(), arg) {
        ("snapshot", Some(name)) => ShellCommand::Snapshot(name),
        ("rollback", Some(name)) => ShellCommand::Rollback(name),
        ("destroy", Some(name)) => ShellCommand::Destroy(name),
        ("snapshot" | "rollback" | "destroy", None) => bail!("usage: {} <name>", verb),
        ("list", rules) => ShellCommand::List(rules.map(|r| parse_rules(&r)).unwrap_or_default()),
        ("reconcile", None) => ShellCommand::Reconcile,
        ("help" | "?", None) => ShellCommand::Help,
        ("quit" | "exit" | "eof", None) => ShellCommand::Quit,
        ("reconcile" | "help" | "?" | "quit" | "exit" | "eof", Some(_)) => {
            bail!("'{}' takes no arguments", verb)
        }
        (other, _) => bail!("unknown command '{}'. Try 'help'", other),
    };

    Ok(Some(command))
}

#[cfg(test)]
mod test {
    use super::*;
    use snapmanage::memory::MemoryBacking;
    use snapmanage::{Dataset, SnapshotStore};
    use std::io::Cursor;

    fn shell<'a>(
        backing: &'a MemoryBacking,
        input: &str,
        assume_yes: bool,
    ) -> Shell<&'a MemoryBacking, Cursor<String>, Vec<u8>> {
        let ops = SnapshotOperations::new(
            SnapshotStore::new(Dataset::new("rpool/test").unwrap()),
            backing,
        );
        Shell::new(ops, Cursor::new(input.to_string()), Vec::new(), assume_yes)
    }

    fn output<B, R>(shell: Shell<B, R, Vec<u8>>) -> String {
        String::from_utf8(shell.output).unwrap()
    }

    fn names<B: BackingSystem, R: BufRead>(shell: &Shell<B, R, Vec<u8>>) -> Vec<String> {
        shell.ops.list().map(|s| s.name.clone()).collect()
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(None, parse_command("   \n").unwrap());
        assert_eq!(
            Some(ShellCommand::Snapshot("before upgrade".to_string())),
            parse_command("snapshot  before upgrade \n").unwrap()
        );
        assert_eq!(
            Some(ShellCommand::Rollback("monday".to_string())),
            parse_command("ROLLBACK monday").unwrap()
        );
        assert_eq!(
            Some(ShellCommand::List(Vec::new())),
            parse_command("list").unwrap()
        );
        assert_eq!(
            Some(ShellCommand::List(vec!["mon*".to_string(), "*day".to_string()])),
            parse_command("list mon*,*day").unwrap()
        );
        assert_eq!(Some(ShellCommand::Help), parse_command("?").unwrap());
        assert_eq!(Some(ShellCommand::Quit), parse_command("exit").unwrap());
        assert_eq!(Some(ShellCommand::Quit), parse_command("EOF").unwrap());

        assert!(parse_command("snapshot").is_err());
        assert!(parse_command("snapshot \n").is_err());
        assert_eq!(Some(ShellCommand::Quit), parse_command("quit\n").unwrap());
        assert!(parse_command("quit now").is_err());
        assert!(parse_command("mount rpool").is_err());
        assert!(parse_command("123").is_err());
    }

    #[test]
    fn test_onecmd_snapshot_and_list() {
        let backing = MemoryBacking::new();
        let mut shell = shell(&backing, "", false);

        shell.onecmd("snapshot a").unwrap();
        shell.onecmd("snapshot b").unwrap();
        assert!(shell.onecmd("snapshot a").is_err());
        shell.onecmd("list").unwrap();

        assert_eq!(vec!["a", "b"], names(&shell));
        let text = output(shell);
        assert!(text.contains("Created rpool/test@a (#1)"));
        assert!(text.contains("Created rpool/test@b (#2)"));
        assert!(text.contains(&format!("   1 {:<30} ", "a")));
    }

    #[test]
    fn test_rollback_needs_confirmation() {
        let backing = MemoryBacking::new();
        let mut shell = shell(&backing, "n\n", false);
        for name in ["a", "b", "c"] {
            shell.onecmd(&format!("snapshot {}", name)).unwrap();
        }

        assert!(shell.onecmd("rollback a").is_err());
        assert_eq!(vec!["a", "b", "c"], names(&shell));
        assert_eq!(vec!["a", "b", "c"], backing.snapshots("rpool/test"));

        let text = output(shell);
        assert!(text.contains("These snapshots will be destroyed:"));
        assert!(text.contains("Really roll back? [y/N] > "));
    }

    #[test]
    fn test_rollback_confirmed() {
        let backing = MemoryBacking::new();
        let mut shell = shell(&backing, "y\n", false);
        for name in ["a", "b", "c"] {
            shell.onecmd(&format!("snapshot {}", name)).unwrap();
        }

        shell.onecmd("rollback a").unwrap();

        assert_eq!(vec!["a"], names(&shell));
        assert_eq!(vec!["a"], backing.snapshots("rpool/test"));
        assert!(output(shell).contains("Rolled back to rpool/test@a, destroying 2 snapshot(s)"));
    }

    #[test]
    fn test_rollback_assume_yes() {
        let backing = MemoryBacking::new();
        let mut shell = shell(&backing, "", true);
        shell.onecmd("snapshot a").unwrap();
        shell.onecmd("snapshot b").unwrap();

        shell.onecmd("rollback a").unwrap();
        assert_eq!(vec!["a"], names(&shell));
    }

    #[test]
    fn test_rollback_missing() {
        let backing = MemoryBacking::new();
        let mut shell = shell(&backing, "y\n", false);
        shell.onecmd("snapshot a").unwrap();

        let err = shell.onecmd("rollback missing").unwrap_err();
        assert_eq!("no snapshot 'missing'", err.to_string());
        assert_eq!(vec!["a"], names(&shell));
    }

    #[test]
    fn test_destroy() {
        let backing = MemoryBacking::new();
        let mut shell = shell(&backing, "yes\nno\n", false);
        shell.onecmd("snapshot a").unwrap();
        shell.onecmd("snapshot b").unwrap();

        shell.onecmd("destroy a").unwrap();
        assert!(shell.onecmd("destroy b").is_err());
        assert!(shell.onecmd("destroy a").is_err());

        assert_eq!(vec!["b"], names(&shell));
        assert!(output(shell).contains("Destroyed rpool/test@a"));
    }

    #[test]
    fn test_cmdloop() {
        let backing = MemoryBacking::new();
        backing.insert_external("rpool/test", "from-cron");
        let input = "snapshot monday\n\
                     snapshot tuesday\n\
                     snapshot monday\n\
                     reconcile\n\
                     list *day\n\
                     bogus\n\
                     quit\n\
                     snapshot never\n";
        let mut shell = shell(&backing, input, false);

        assert_eq!(2, shell.cmdloop().unwrap());

        // from-cron predates both, so reconcile puts it first
        assert_eq!(vec!["from-cron", "monday", "tuesday"], names(&shell));
        let text = output(shell);
        assert!(text.starts_with(INTRO));
        assert!(text.contains(PROMPT));
        assert!(text.contains("ERROR: snapshot 'monday' already exists on rpool/test"));
        assert!(text.contains("ERROR: unknown command 'bogus'"));
        assert!(text.contains("rpool/test has 3 snapshot(s)"));
        assert!(!text.contains("from-cron "));
    }

    #[test]
    fn test_cmdloop_stops_at_end_of_input() {
        let backing = MemoryBacking::new();
        let mut shell = shell(&backing, "snapshot a\n", false);

        assert_eq!(0, shell.cmdloop().unwrap());
        assert_eq!(vec!["a"], names(&shell));
        assert!(output(shell).ends_with(&format!("{}\n", PROMPT)));
    }

    #[test]
    fn test_cmdloop_rollback_reads_confirmation_from_input() {
        let backing = MemoryBacking::new();
        let input = "snapshot a\nsnapshot b\nrollback a\ny\nlist\n";
        let mut shell = shell(&backing, input, false);

        assert_eq!(0, shell.cmdloop().unwrap());
        assert_eq!(vec!["a"], names(&shell));
        assert!(output(shell).contains("Really roll back? [y/N] > "));
    }
}
