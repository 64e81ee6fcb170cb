// src/core/command.rs

//! Commands: named, invocable units of application behavior.

use std::fmt;
use std::rc::Rc;

use anyhow::Result;

use crate::constants::{DEFAULT_COMMAND_NAME, DEFAULT_GREETING};
use crate::system::environment::Environment;

/// A unit of behavior selected and invoked by the dispatcher.
///
/// `name` is the command's identity. It is used for matching against the
/// first positional argument and for the listing, nothing else.
pub trait Command {
    /// The name the command is selected and listed by.
    fn name(&self) -> &str;

    /// Runs the command.
    ///
    /// `arguments` are the positional arguments left after the command name
    /// (all of them when the command is the only one registered). Writing
    /// output and setting the exit code are the command's own business.
    fn execute(&self, env: &dyn Environment, arguments: &[String]) -> Result<()>;
}

impl fmt::Debug for dyn Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command").field("name", &self.name()).finish()
    }
}

/// Where a registered command comes from.
#[derive(Debug, Clone)]
pub enum CommandSource {
    /// A concrete command supplied directly.
    Instance(Rc<dyn Command>),
    /// The identifier of a service that resolves to an `Rc<dyn Command>`.
    Service(String),
}

impl CommandSource {
    /// The identifier used to describe this source in logs.
    pub fn describe(&self) -> &str {
        match self {
            Self::Instance(command) => command.name(),
            Self::Service(identifier) => identifier,
        }
    }
}

impl From<Rc<dyn Command>> for CommandSource {
    fn from(command: Rc<dyn Command>) -> Self {
        Self::Instance(command)
    }
}

impl From<&str> for CommandSource {
    fn from(identifier: &str) -> Self {
        Self::Service(identifier.to_string())
    }
}

impl From<String> for CommandSource {
    fn from(identifier: String) -> Self {
        Self::Service(identifier)
    }
}

/// The command run when nothing else is registered: it greets.
#[derive(Debug, Default)]
pub struct HelloWorld;

impl Command for HelloWorld {
    fn name(&self) -> &str {
        DEFAULT_COMMAND_NAME
    }

    fn execute(&self, env: &dyn Environment, _arguments: &[String]) -> Result<()> {
        env.output().write(&format!("{DEFAULT_GREETING}\n"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system::environment::InMemoryEnvironment;

    #[test]
    fn test_hello_world_writes_greeting_line() {
        let env = InMemoryEnvironment::new();

        HelloWorld.execute(&env, &[]).unwrap();

        assert_eq!(env.output_buffer().contents(), "Hello world\n");
        assert_eq!(env.output_buffer().writes(), 1);
    }

    #[test]
    fn test_command_source_conversions() {
        let named = CommandSource::from("app.command");
        assert!(matches!(&named, CommandSource::Service(id) if id == "app.command"));
        assert_eq!(named.describe(), "app.command");

        let instance = CommandSource::from(Rc::new(HelloWorld) as Rc<dyn Command>);
        assert_eq!(instance.describe(), "hello");
        assert_eq!(format!("{:?}", instance), "Instance(Command { name: \"hello\" })");
    }
}
