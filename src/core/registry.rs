// src/core/registry.rs

//! Builds the ordered list of commands for one run.
//!
//! A registry holds an optional command factory and a list of command
//! sources. It is evaluated once, when the dispatcher needs the list, so that
//! factories observe the overlaid environment.

use std::fmt;
use std::rc::Rc;

use crate::core::command::{Command, CommandSource, HelloWorld};
use crate::core::container::{Resolver, ServiceContainer, ServiceError};
use crate::system::{environment::Environment, os::OperatingSystem};

/// Produces commands from the environment, the OS and a resolver for services.
pub type CommandFactory = Box<
    dyn FnOnce(
        &Rc<dyn Environment>,
        &Rc<dyn OperatingSystem>,
        &Resolver<'_>,
    ) -> Result<Vec<Rc<dyn Command>>, ServiceError>,
>;

/// Wraps a closure into a [`CommandFactory`].
pub fn command_factory<F>(build: F) -> CommandFactory
where
    F: FnOnce(
            &Rc<dyn Environment>,
            &Rc<dyn OperatingSystem>,
            &Resolver<'_>,
        ) -> Result<Vec<Rc<dyn Command>>, ServiceError>
        + 'static,
{
    Box::new(
        move |env: &Rc<dyn Environment>, os: &Rc<dyn OperatingSystem>, get: &Resolver<'_>| {
            build(env, os, get)
        },
    )
}

/// The commands registered for a run, not yet evaluated.
#[derive(Default)]
pub struct CommandRegistry {
    factory: Option<CommandFactory>,
    sources: Vec<CommandSource>,
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("factory", &self.factory.is_some())
            .field("sources", &self.sources)
            .finish()
    }
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the factory producing the hand-wired commands, replacing any previous one.
    pub fn set_factory(&mut self, factory: CommandFactory) {
        self.factory = Some(factory);
    }

    /// Appends a command, either concrete or service-backed.
    pub fn add(&mut self, source: CommandSource) {
        self.sources.push(source);
    }

    /// Whether neither a factory nor a command was registered.
    pub fn is_empty(&self) -> bool {
        self.factory.is_none() && self.sources.is_empty()
    }

    /// Evaluates the registry against `container`.
    ///
    /// The factory's commands come first, followed by the registered sources
    /// in order. Service-backed sources are resolved now; an unknown service
    /// is returned as [`ServiceError::NotFound`]. With nothing registered, the
    /// result is the single built-in [`HelloWorld`] command.
    pub fn build(self, container: &ServiceContainer) -> Result<Vec<Rc<dyn Command>>, ServiceError> {
        if self.is_empty() {
            log::debug!("No command registered, falling back to the built-in greeting.");
            return Ok(vec![Rc::new(HelloWorld) as Rc<dyn Command>]);
        }

        let mut commands = match self.factory {
            Some(factory) => factory(
                container.environment(),
                container.operating_system(),
                &container.resolver(),
            )?,
            None => Vec::new(),
        };

        for source in self.sources {
            log::debug!("Adding command from '{}'.", source.describe());
            let command = match source {
                CommandSource::Instance(command) => command,
                CommandSource::Service(identifier) => {
                    let command = container.resolve_as::<Rc<dyn Command>>(&identifier)?;
                    Rc::clone(&*command)
                }
            };
            commands.push(command);
        }

        log::debug!("Registry built {} command(s).", commands.len());
        Ok(commands)
    }
}
