// src/core/mod.rs

//! Composition logic: overlay loading, the service container and commands.

pub mod command;
pub mod config_loader;
pub mod container;
pub mod dotenv;
pub mod overlay;
pub mod registry;
