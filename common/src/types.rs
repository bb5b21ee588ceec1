/// Switches which change how commands are run, rather than what they do.
///
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Opts {
    /// Print every command before running it
    pub verbose: bool,
    /// Print commands which would change something instead of running them
    pub noop: bool,
}
