//! # System Interaction Layer
//!
//! This module provides the capabilities the core consumes: the execution
//! environment and the operating system. It serves as a boundary between the
//! composition logic and the specifics of processes, streams and files.
//!
//! ## Modules
//!
//! - **`stream`**: Readable/writable sinks, backed by the standard streams or by
//!   in-memory buffers.
//! - **`environment`**: The `Environment` capability (arguments, variables,
//!   streams, exit code), with a process-backed and an in-memory implementation.
//! - **`os`**: The `OperatingSystem` capability and its filesystem, with a local
//!   and an in-memory implementation.
//! - **`resilient`**: An operating-system decorator retrying transient
//!   filesystem failures.

pub mod environment;
pub mod os;
pub mod resilient;
pub mod stream;
