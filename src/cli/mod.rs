//! # Run Surface
//!
//! - **`application`**: the builder an embedding program configures (config
//!   directory, commands, services, decorators) and the `run` procedure.
//! - **`dispatcher`**: selects and executes the command of a run, or lists
//!   the available ones.
//! - **`handlers`**: ready-made commands.

pub mod application;
pub mod dispatcher;
pub mod handlers;
