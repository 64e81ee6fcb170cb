// src/bin/cliframe.rs

//! Demo binary built on the cliframe bootstrap layer.

use anyhow::{Context, Result};
use clap::Parser;
use cliframe::{
    Application, Command, Environment, LocalOperatingSystem, ProcessEnvironment, RunError,
    ServiceError, cli::handlers::variables::PrintVariables,
};
use colored::*;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

/// cliframe: a demo application wired through the cliframe bootstrap layer.
///
/// Variables from `<config>/.env` are available to every command, beneath the
/// real process variables.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(disable_help_subcommand = true)]
struct Cli {
    /// Directory holding the `.env` file. Defaults to the user config directory.
    #[arg(long)]
    config: Option<String>,

    /// Retry transient filesystem failures.
    #[arg(long)]
    resilient: bool,

    /// The command to run and its arguments.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

/// Greets whoever the `greeting.name` service names.
struct Greet {
    name: Rc<String>,
}

impl Command for Greet {
    fn name(&self) -> &str {
        "greet"
    }

    fn execute(&self, env: &dyn Environment, arguments: &[String]) -> Result<()> {
        let name = arguments.first().map(String::as_str).unwrap_or(self.name.as_str());
        env.output().write(&format!("Hello {name}\n"))?;
        Ok(())
    }
}

/// The directory searched for `.env`, if one can be determined.
///
/// Configuration is optional, so an unusable path only costs the overlay.
fn config_dir(cli: &Cli) -> Option<PathBuf> {
    match &cli.config {
        Some(template) => match shellexpand::full(template) {
            Ok(expanded) => Some(PathBuf::from(expanded.into_owned())),
            Err(e) => {
                log::warn!("Failed to expand config path '{}': {}", template, e);
                None
            }
        },
        None => {
            let dir = dirs::config_dir().map(|dir| dir.join("cliframe"));
            if dir.is_none() {
                log::debug!("No system config directory, running without overlay.");
            }
            dir
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    log::debug!("CLI args parsed: {:?}", cli);

    let config_dir = config_dir(&cli);
    let env = Rc::new(ProcessEnvironment::new(cli.args).context("Failed to read process state")?);

    let mut app = Application::new(env.clone(), Rc::new(LocalOperatingSystem::new()));
    if let Some(dir) = config_dir {
        app = app.config_at(dir);
    }
    app = app
        .command(Rc::new(PrintVariables) as Rc<dyn Command>)
        .command("greet")
        .service("greet", |_, _, get| {
            let name = get.get_as::<String>("greeting.name")?;
            Ok(Rc::new(Greet { name }) as Rc<dyn Command>)
        })
        .service("greeting.name", |env, _, _| {
            Ok(env
                .variables()
                .get("GREETING_NAME")
                .cloned()
                .unwrap_or_else(|| "world".to_string()))
        });

    if cli.resilient {
        app = app.use_resilient_operating_system();
    }

    app.run()?;
    Ok(env.exit_code().into())
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            if let Some(RunError::Service(ServiceError::NotFound(identifier))) =
                e.downcast_ref::<RunError>()
            {
                eprintln!(
                    "\n{}: no service registered as '{}'",
                    "Error".red().bold(),
                    identifier
                );
            } else {
                eprintln!("\n{}: {:#}", "Error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}
