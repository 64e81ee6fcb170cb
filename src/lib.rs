//! cliframe - a bootstrap layer for command-line applications.
//!
//! Given an execution environment and an operating-system capability, an
//! [`Application`] overlays the variables of an optional `.env` file, builds
//! its commands (hand-wired or resolved lazily from a service container) and
//! runs exactly one of them, or lists them.
//!
//! - [`system`] - Environment and operating-system capabilities
//! - [`core`] - Overlay, service container, commands and registry
//! - [`cli`] - Dispatcher, application builder and ready-made commands

pub mod cli;
pub mod constants;
pub mod core;
pub mod system;

pub use cli::application::Application;
pub use cli::dispatcher::RunError;
pub use core::command::{Command, CommandSource, HelloWorld};
pub use core::container::{Resolver, Service, ServiceContainer, ServiceError};
pub use system::environment::{
    Arguments, Environment, ExitCode, InMemoryEnvironment, ProcessEnvironment, Variables,
};
pub use system::os::{
    Directory, Filesystem, InMemoryDirectory, InMemoryFilesystem, InMemoryOperatingSystem,
    LocalOperatingSystem, OperatingSystem,
};
pub use system::stream::{Buffer, Readable, Writable};
