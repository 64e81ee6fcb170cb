//! # Dispatcher
//!
//! Decides what a run does with its command list and carries it out.

use std::io;
use std::rc::Rc;

use thiserror::Error;

use crate::{
    constants::LISTING_HEADER,
    core::{command::Command, container::ServiceError},
    system::environment::Environment,
};

/// Why a run stopped with an error.
#[derive(Error, Debug)]
pub enum RunError {
    /// A wiring mistake: a command or dependency names an unknown service.
    #[error(transparent)]
    Service(#[from] ServiceError),
    /// The selected command returned an error.
    #[error("Command '{name}' failed: {source}")]
    Command {
        /// The command that failed.
        name: String,
        /// Its error, untouched.
        #[source]
        source: anyhow::Error,
    },
    /// The listing could not be written.
    #[error("Could not write to output: {0}")]
    Io(#[from] io::Error),
}

/// What a run does with its command list.
#[derive(Debug)]
pub enum Selection<'a> {
    /// Run `command` with `arguments`.
    Execute {
        /// The selected command.
        command: &'a Rc<dyn Command>,
        /// The arguments it receives.
        arguments: &'a [String],
    },
    /// Print the names of all commands.
    List,
}

/// Finds a command by its exact name.
fn find_command<'a>(commands: &'a [Rc<dyn Command>], name: &str) -> Option<&'a Rc<dyn Command>> {
    commands.iter().find(|command| command.name() == name)
}

/// Decides which command, if any, a run executes.
///
/// - A single command always runs, with every argument, whatever its name.
/// - With several commands, the first argument selects one by name and the
///   rest are handed to it. No argument, or no match, means listing.
/// - No command at all also means listing (an empty one).
pub fn select<'a>(commands: &'a [Rc<dyn Command>], arguments: &'a [String]) -> Selection<'a> {
    match commands {
        [command] => Selection::Execute {
            command,
            arguments,
        },
        _ => match arguments.split_first() {
            Some((name, rest)) => match find_command(commands, name) {
                Some(command) => Selection::Execute {
                    command,
                    arguments: rest,
                },
                None => Selection::List,
            },
            None => Selection::List,
        },
    }
}

/// Runs the selected command against an environment.
#[derive(Debug)]
pub struct Dispatcher {
    env: Rc<dyn Environment>,
}

impl Dispatcher {
    /// A dispatcher reading its arguments from `env`.
    pub fn new(env: Rc<dyn Environment>) -> Self {
        Self { env }
    }

    /// Executes exactly one command or writes the listing.
    ///
    /// Whatever the command does to the environment is left as is; its error,
    /// if any, is returned untouched.
    pub fn dispatch(&self, commands: &[Rc<dyn Command>]) -> Result<(), RunError> {
        let arguments = self.env.arguments();
        log::debug!("Dispatching args: {:?}", arguments);

        match select(commands, &arguments) {
            Selection::Execute { command, arguments } => {
                log::debug!("Executing command '{}'.", command.name());
                command
                    .execute(self.env.as_ref(), arguments)
                    .map_err(|source| RunError::Command {
                        name: command.name().to_string(),
                        source,
                    })
            }
            Selection::List => {
                log::debug!("No command selected, listing {} command(s).", commands.len());
                self.list(commands)
            }
        }
    }

    fn list(&self, commands: &[Rc<dyn Command>]) -> Result<(), RunError> {
        let output = self.env.output();
        output.write(&format!("{LISTING_HEADER}\n"))?;
        for command in commands {
            output.write(&format!("  {}\n", command.name()))?;
        }
        Ok(())
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::environment::InMemoryEnvironment;
    use std::cell::Cell;

    /// Counts its invocations and records the arguments it received.
    struct Recorder {
        name: &'static str,
        calls: Cell<usize>,
        received: std::cell::RefCell<Vec<String>>,
    }

    impl Recorder {
        fn new(name: &'static str) -> Rc<Self> {
            Rc::new(Self {
                name,
                calls: Cell::new(0),
                received: Default::default(),
            })
        }
    }

    impl Command for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn execute(&self, _env: &dyn Environment, arguments: &[String]) -> anyhow::Result<()> {
            self.calls.set(self.calls.get() + 1);
            *self.received.borrow_mut() = arguments.to_vec();
            Ok(())
        }
    }

    fn to_args(params: &[&str]) -> Vec<String> {
        params.iter().map(|s| s.to_string()).collect()
    }

    // --- `select` Tests ---

    #[test]
    fn test_select_single_command_ignores_its_name() {
        let foo: Rc<dyn Command> = Recorder::new("foo");
        let commands = vec![foo];
        let args = to_args(&["bar", "baz"]);

        assert!(matches!(
            select(&commands, &args),
            Selection::Execute { command, arguments }
                if command.name() == "foo" && arguments == args.as_slice()
        ));
    }

    #[test]
    fn test_select_by_first_argument() {
        let commands: Vec<Rc<dyn Command>> = vec![Recorder::new("foo"), Recorder::new("bar")];
        let args = to_args(&["bar", "--flag", "value"]);

        let rest = to_args(&["--flag", "value"]);

        assert!(matches!(
            select(&commands, &args),
            Selection::Execute { command, arguments }
                if command.name() == "bar" && arguments == rest.as_slice()
        ));
    }

    #[test]
    fn test_select_lists_without_arguments_or_match() {
        let commands: Vec<Rc<dyn Command>> = vec![Recorder::new("foo"), Recorder::new("bar")];

        assert!(matches!(select(&commands, &[]), Selection::List));
        assert!(matches!(
            select(&commands, &to_args(&["baz"])),
            Selection::List
        ));
        // Matching is exact.
        assert!(matches!(
            select(&commands, &to_args(&["Foo"])),
            Selection::List
        ));
    }

    #[test]
    fn test_select_empty_list() {
        assert!(matches!(select(&[], &to_args(&["foo"])), Selection::List));
    }

    // --- `Dispatcher` Tests ---

    #[test]
    fn test_dispatch_runs_only_the_matching_command() {
        let foo = Recorder::new("foo");
        let bar = Recorder::new("bar");
        let env = Rc::new(InMemoryEnvironment::new().with_arguments(["foo", "a", "b"]));
        let commands: Vec<Rc<dyn Command>> = vec![foo.clone(), bar.clone()];

        Dispatcher::new(env.clone()).dispatch(&commands).unwrap();

        assert_eq!(foo.calls.get(), 1);
        assert_eq!(bar.calls.get(), 0);
        assert_eq!(*foo.received.borrow(), to_args(&["a", "b"]));
        assert!(env.output_buffer().contents().is_empty());
    }

    #[test]
    fn test_dispatch_lists_command_names() {
        let foo = Recorder::new("foo");
        let bar = Recorder::new("bar");
        let env = Rc::new(InMemoryEnvironment::new());
        let commands: Vec<Rc<dyn Command>> = vec![foo.clone(), bar.clone()];

        Dispatcher::new(env.clone()).dispatch(&commands).unwrap();

        assert_eq!(foo.calls.get(), 0);
        assert_eq!(bar.calls.get(), 0);
        assert_eq!(
            env.output_buffer().contents(),
            "Available commands:\n  foo\n  bar\n"
        );
        assert!(env.exit_code().is_successful());
    }

    #[test]
    fn test_dispatch_propagates_command_error() {
        struct Failing;

        impl Command for Failing {
            fn name(&self) -> &str {
                "fail"
            }

            fn execute(&self, _env: &dyn Environment, _arguments: &[String]) -> anyhow::Result<()> {
                anyhow::bail!("boom")
            }
        }

        let env = Rc::new(InMemoryEnvironment::new());
        let commands: Vec<Rc<dyn Command>> = vec![Rc::new(Failing)];

        let error = Dispatcher::new(env).dispatch(&commands).unwrap_err();
        assert!(matches!(error, RunError::Command { ref name, .. } if name == "fail"));
        assert!(error.to_string().contains("boom"));
    }

    #[test]
    fn test_service_error_message_is_kept() {
        let error = RunError::from(ServiceError::NotFound("app.command".to_string()));
        assert_eq!(error.to_string(), "app.command");
    }
}
