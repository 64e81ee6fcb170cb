// src/cli/handlers/variables.rs

//! The `env` command.

use anyhow::{Context, Result};

use crate::{
    core::command::Command,
    system::environment::{Environment, ExitCode},
};

/// Prints environment variables as `KEY=VALUE` lines.
///
/// Without arguments every variable is printed. With arguments only the named
/// ones are; an unknown name is reported on the error stream and the exit code
/// is set to 1.
#[derive(Debug, Default)]
pub struct PrintVariables;

impl Command for PrintVariables {
    fn name(&self) -> &str {
        "env"
    }

    fn execute(&self, env: &dyn Environment, arguments: &[String]) -> Result<()> {
        let variables = env.variables();
        let output = env.output();

        if arguments.is_empty() {
            for (key, value) in variables.iter() {
                output
                    .write(&format!("{key}={value}\n"))
                    .context("Failed to write variables")?;
            }
            return Ok(());
        }

        for name in arguments {
            match variables.get(name) {
                Some(value) => output
                    .write(&format!("{name}={value}\n"))
                    .context("Failed to write variables")?,
                None => {
                    env.error()
                        .write(&format!("Variable '{name}' is not defined.\n"))
                        .context("Failed to write error")?;
                    env.exit(ExitCode::FAILURE);
                }
            }
        }
        Ok(())
    }
}
