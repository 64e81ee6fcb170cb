// src/system/environment.rs

//! The execution environment a run consumes.
//!
//! The core never mutates an environment beyond `exit`; it only decorates it.
//! [`ProcessEnvironment`] is backed by the real process, [`InMemoryEnvironment`]
//! by buffers and is what tests (ours and the embedding application's) use.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::rc::Rc;

use super::stream::{Buffer, Readable, StandardError, StandardInput, StandardOutput, Writable};

/// Positional arguments, in order.
pub type Arguments = Rc<[String]>;

/// Variable name to value.
pub type Variables = Rc<BTreeMap<String, String>>;

/// The status a run reports to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExitCode(u8);

impl ExitCode {
    /// Exit code `0`.
    pub const SUCCESS: Self = Self(0);
    /// Exit code `1`.
    pub const FAILURE: Self = Self(1);

    /// Wraps a raw process exit code.
    pub fn new(code: u8) -> Self {
        Self(code)
    }

    /// The raw process exit code.
    pub fn code(self) -> u8 {
        self.0
    }

    /// Whether this is exit code `0`.
    pub fn is_successful(self) -> bool {
        self.0 == 0
    }
}

impl From<u8> for ExitCode {
    fn from(code: u8) -> Self {
        Self(code)
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        Self::from(code.0)
    }
}

/// Capability giving access to the streams, arguments and variables of a run.
pub trait Environment {
    /// Whether a user is attached to the terminal.
    fn interactive(&self) -> bool;
    /// The input stream.
    fn input(&self) -> Rc<dyn Readable>;
    /// The output stream.
    fn output(&self) -> Rc<dyn Writable>;
    /// The error stream.
    fn error(&self) -> Rc<dyn Writable>;
    /// The positional arguments of the run.
    fn arguments(&self) -> Arguments;
    /// The variables visible to the run.
    fn variables(&self) -> Variables;
    /// Records the exit code the run will report.
    fn exit(&self, code: ExitCode);
    /// The exit code recorded so far, `0` by default.
    fn exit_code(&self) -> ExitCode;
    /// The directory the run was started from.
    fn working_directory(&self) -> PathBuf;
}

impl fmt::Debug for dyn Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("arguments", &self.arguments())
            .field("exit_code", &self.exit_code())
            .finish_non_exhaustive()
    }
}

/// The environment of the current process.
pub struct ProcessEnvironment {
    input: Rc<dyn Readable>,
    output: Rc<dyn Writable>,
    error: Rc<dyn Writable>,
    arguments: Arguments,
    variables: Variables,
    exit_code: Cell<ExitCode>,
    working_directory: PathBuf,
}

impl fmt::Debug for ProcessEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessEnvironment")
            .field("arguments", &self.arguments)
            .field("exit_code", &self.exit_code.get())
            .field("working_directory", &self.working_directory)
            .finish_non_exhaustive()
    }
}

impl ProcessEnvironment {
    /// Captures the process variables and working directory.
    ///
    /// `arguments` are the positional arguments left once the binary name
    /// (and any flags of the binary itself) have been stripped.
    ///
    /// # Errors
    /// Returns an error if the current directory cannot be determined.
    pub fn new(arguments: Vec<String>) -> io::Result<Self> {
        let working_directory = std::env::current_dir()?;
        let working_directory = dunce::simplified(&working_directory).to_path_buf();

        Ok(Self {
            input: Rc::new(StandardInput),
            output: Rc::new(StandardOutput),
            error: Rc::new(StandardError),
            arguments: arguments.into(),
            variables: Rc::new(std::env::vars().collect()),
            exit_code: Cell::new(ExitCode::SUCCESS),
            working_directory,
        })
    }
}

impl Environment for ProcessEnvironment {
    fn interactive(&self) -> bool {
        io::stdin().is_terminal() && io::stdout().is_terminal()
    }

    fn input(&self) -> Rc<dyn Readable> {
        Rc::clone(&self.input)
    }

    fn output(&self) -> Rc<dyn Writable> {
        Rc::clone(&self.output)
    }

    fn error(&self) -> Rc<dyn Writable> {
        Rc::clone(&self.error)
    }

    fn arguments(&self) -> Arguments {
        Rc::clone(&self.arguments)
    }

    fn variables(&self) -> Variables {
        Rc::clone(&self.variables)
    }

    fn exit(&self, code: ExitCode) {
        self.exit_code.set(code);
    }

    fn exit_code(&self) -> ExitCode {
        self.exit_code.get()
    }

    fn working_directory(&self) -> PathBuf {
        self.working_directory.clone()
    }
}

/// An environment backed by in-memory buffers.
///
/// Counts calls to `variables()` so callers can check how often the
/// variables snapshot was taken.
#[derive(Debug)]
pub struct InMemoryEnvironment {
    interactive: bool,
    input: Rc<Buffer>,
    output: Rc<Buffer>,
    error: Rc<Buffer>,
    arguments: Arguments,
    variables: Variables,
    variables_calls: Cell<usize>,
    exit_code: Cell<ExitCode>,
    working_directory: PathBuf,
}

impl Default for InMemoryEnvironment {
    fn default() -> Self {
        Self {
            interactive: false,
            input: Rc::new(Buffer::new()),
            output: Rc::new(Buffer::new()),
            error: Rc::new(Buffer::new()),
            arguments: Rc::from(Vec::<String>::new()),
            variables: Rc::new(BTreeMap::new()),
            variables_calls: Cell::new(0),
            exit_code: Cell::new(ExitCode::SUCCESS),
            working_directory: PathBuf::from("/"),
        }
    }
}

impl InMemoryEnvironment {
    /// A non-interactive environment with no arguments, no variables and empty streams.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the positional arguments.
    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments = arguments.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the variables, replacing any previous ones.
    pub fn with_variables<I, K, V>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.variables = Rc::new(
            variables
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    /// Sets what the input stream yields.
    pub fn with_input(mut self, content: impl Into<String>) -> Self {
        self.input = Rc::new(Buffer::with_content(content));
        self
    }

    /// Sets whether the environment reports itself as interactive.
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    /// Sets the working directory.
    pub fn with_working_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_directory = path.into();
        self
    }

    /// The buffer behind `output()`.
    pub fn output_buffer(&self) -> Rc<Buffer> {
        Rc::clone(&self.output)
    }

    /// The buffer behind `error()`.
    pub fn error_buffer(&self) -> Rc<Buffer> {
        Rc::clone(&self.error)
    }

    /// How many times `variables()` has been called.
    pub fn variables_calls(&self) -> usize {
        self.variables_calls.get()
    }
}

impl Environment for InMemoryEnvironment {
    fn interactive(&self) -> bool {
        self.interactive
    }

    fn input(&self) -> Rc<dyn Readable> {
        self.input.clone()
    }

    fn output(&self) -> Rc<dyn Writable> {
        self.output.clone()
    }

    fn error(&self) -> Rc<dyn Writable> {
        self.error.clone()
    }

    fn arguments(&self) -> Arguments {
        Rc::clone(&self.arguments)
    }

    fn variables(&self) -> Variables {
        self.variables_calls.set(self.variables_calls.get() + 1);
        Rc::clone(&self.variables)
    }

    fn exit(&self, code: ExitCode) {
        self.exit_code.set(code);
    }

    fn exit_code(&self) -> ExitCode {
        self.exit_code.get()
    }

    fn working_directory(&self) -> PathBuf {
        self.working_directory.clone()
    }
}
