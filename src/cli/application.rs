//! # Application
//!
//! The registration surface offered to the embedding program and the run
//! procedure tying everything together.
//!
//! A run goes through a single linear chain:
//!
//! 1. **Decoration:** the registered operating-system and environment
//!    decorators are applied, in order, around the base capabilities.
//! 2. **Overlay:** the `.env` file of the configuration directory (if any) is
//!    loaded once and the environment is wrapped so that real variables win
//!    and overlay entries fill the gaps.
//! 3. **Services:** a fresh container receives every registered factory.
//! 4. **Registry:** the command list is built against the overlaid
//!    environment, resolving service-backed commands.
//! 5. **Dispatch:** exactly one command runs, or the list of names is printed.
//!
//! Missing configuration is never an error. An unknown service is, and it
//! leaves `run` as [`RunError::Service`].

use std::any::Any;
use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use crate::{
    cli::dispatcher::{Dispatcher, RunError},
    core::{
        command::{Command, CommandSource},
        config_loader,
        container::{self, Factory, Resolver, ServiceContainer, ServiceError},
        overlay::OverlayEnvironment,
        registry::{self, CommandRegistry},
    },
    system::{environment::Environment, os::OperatingSystem, resilient::ResilientOperatingSystem},
};

type EnvironmentDecorator = Box<dyn FnOnce(Rc<dyn Environment>) -> Rc<dyn Environment>>;
type OperatingSystemDecorator = Box<dyn FnOnce(Rc<dyn OperatingSystem>) -> Rc<dyn OperatingSystem>>;

/// Builder and runner for one command-line application.
///
/// Every builder method consumes the application and returns the updated one.
pub struct Application {
    env: Rc<dyn Environment>,
    os: Rc<dyn OperatingSystem>,
    config_dir: Option<PathBuf>,
    registry: CommandRegistry,
    services: Vec<(String, Factory)>,
    env_decorators: Vec<EnvironmentDecorator>,
    os_decorators: Vec<OperatingSystemDecorator>,
}

impl fmt::Debug for Application {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let services: Vec<&str> = self.services.iter().map(|(id, _)| id.as_str()).collect();
        f.debug_struct("Application")
            .field("config_dir", &self.config_dir)
            .field("registry", &self.registry)
            .field("services", &services)
            .field("env_decorators", &self.env_decorators.len())
            .field("os_decorators", &self.os_decorators.len())
            .finish_non_exhaustive()
    }
}

impl Application {
    /// An application running against `env` and `os`, with nothing registered.
    pub fn new(env: Rc<dyn Environment>, os: Rc<dyn OperatingSystem>) -> Self {
        Self {
            env,
            os,
            config_dir: None,
            registry: CommandRegistry::new(),
            services: Vec::new(),
            env_decorators: Vec::new(),
            os_decorators: Vec::new(),
        }
    }

    /// Looks for a `.env` file in `path` when the application runs.
    pub fn config_at(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(path.into());
        self
    }

    /// Sets the factory producing the application's commands.
    pub fn commands<F>(mut self, build: F) -> Self
    where
        F: FnOnce(
                &Rc<dyn Environment>,
                &Rc<dyn OperatingSystem>,
                &Resolver<'_>,
            ) -> Result<Vec<Rc<dyn Command>>, ServiceError>
            + 'static,
    {
        self.registry.set_factory(registry::command_factory(build));
        self
    }

    /// Adds a command: a service identifier (`&str`/`String`) resolved at
    /// run time, or a concrete `Rc<dyn Command>`.
    pub fn command(mut self, source: impl Into<CommandSource>) -> Self {
        self.registry.add(source.into());
        self
    }

    /// Registers (or replaces) the factory of service `identifier`.
    ///
    /// Services backing a command must produce an `Rc<dyn Command>`.
    pub fn service<T, F>(mut self, identifier: impl Into<String>, build: F) -> Self
    where
        T: Any,
        F: Fn(&Rc<dyn Environment>, &Rc<dyn OperatingSystem>, &Resolver<'_>) -> Result<T, ServiceError>
            + 'static,
    {
        self.services
            .push((identifier.into(), container::factory(build)));
        self
    }

    /// Wraps the environment with `decorator` before the overlay is applied.
    pub fn map_environment<F>(mut self, decorator: F) -> Self
    where
        F: FnOnce(Rc<dyn Environment>) -> Rc<dyn Environment> + 'static,
    {
        self.env_decorators.push(Box::new(decorator));
        self
    }

    /// Wraps the operating system with `decorator`.
    pub fn map_operating_system<F>(mut self, decorator: F) -> Self
    where
        F: FnOnce(Rc<dyn OperatingSystem>) -> Rc<dyn OperatingSystem> + 'static,
    {
        self.os_decorators.push(Box::new(decorator));
        self
    }

    /// Retries transient filesystem failures.
    pub fn use_resilient_operating_system(self) -> Self {
        self.map_operating_system(|os| {
            Rc::new(ResilientOperatingSystem::new(os)) as Rc<dyn OperatingSystem>
        })
    }

    /// Runs the application.
    ///
    /// The outcome is communicated through the environment (output streams and
    /// exit code). Errors are only returned for wiring mistakes (unknown
    /// services), command failures and failed writes of the listing.
    pub fn run(self) -> Result<(), RunError> {
        let Application {
            env,
            os,
            config_dir,
            registry,
            services,
            env_decorators,
            os_decorators,
        } = self;

        // --- 1. Decoration ---
        let os = os_decorators
            .into_iter()
            .fold(os, |os, decorate| decorate(os));
        let env = env_decorators
            .into_iter()
            .fold(env, |env, decorate| decorate(env));

        // --- 2. Overlay ---
        let overlay = match &config_dir {
            Some(dir) => config_loader::load(dir, os.as_ref()),
            None => Default::default(),
        };
        let env: Rc<dyn Environment> = Rc::new(OverlayEnvironment::new(env, overlay));

        // --- 3. Services ---
        let mut services_container = ServiceContainer::new(Rc::clone(&env), Rc::clone(&os));
        for (identifier, factory) in services {
            services_container.register(identifier, factory);
        }

        // --- 4. Registry ---
        let commands = registry.build(&services_container)?;

        // --- 5. Dispatch ---
        Dispatcher::new(env).dispatch(&commands)
    }
}
