// src/constants.rs

//! Names and limits shared across the crate.

/// The name of the overlay file looked up inside the configured directory.
pub const DOTENV_FILENAME: &str = ".env";

/// The line written by the built-in command when no command is registered.
pub const DEFAULT_GREETING: &str = "Hello world";

/// The header written above the command listing.
pub const LISTING_HEADER: &str = "Available commands:";

/// The name under which the built-in greeting command is listed.
pub const DEFAULT_COMMAND_NAME: &str = "hello";

/// How many times the resilient filesystem attempts a transient operation.
pub const RESILIENT_ATTEMPTS: u32 = 3;

/// Pause between two attempts of the resilient filesystem, in milliseconds.
pub const RESILIENT_BACKOFF_MS: u64 = 10;
