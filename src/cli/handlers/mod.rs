// src/cli/handlers/mod.rs

//! Ready-made commands an application can register.

pub mod variables;
