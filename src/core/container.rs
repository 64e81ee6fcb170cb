//! # Service Container
//!
//! A lazy, memoizing registry of services keyed by identifier.
//!
//! Each identifier maps to a slot: either a factory not yet run, a factory
//! currently running, or the instance it produced. A factory receives the
//! environment, the operating system and a [`Resolver`] bound to the same
//! container, so services can pull their dependencies on demand, in any
//! registration order.
//!
//! ## Invariants
//!
//! - A factory runs at most once per container; later requests for the same
//!   identifier return the cached instance (`Rc::ptr_eq` holds).
//! - Requesting an unregistered identifier fails with
//!   [`ServiceError::NotFound`], whose message is exactly the identifier.
//! - Requesting an identifier whose factory is still running fails with
//!   [`ServiceError::Circular`] instead of recursing forever.

use std::any::{Any, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::system::{environment::Environment, os::OperatingSystem};

/// A resolved, type-erased service instance.
pub type Service = Rc<dyn Any>;

/// Builds a service from the environment, the OS and a resolver for its dependencies.
pub type Factory = Box<
    dyn Fn(&Rc<dyn Environment>, &Rc<dyn OperatingSystem>, &Resolver<'_>) -> Result<Service, ServiceError>,
>;

/// Failures of service resolution.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// No factory is registered under the identifier. Displays as the bare identifier.
    #[error("{0}")]
    NotFound(String),
    /// The identifier was requested again while its own factory was running.
    #[error("Circular dependency detected while resolving service '{0}'")]
    Circular(String),
    /// The instance exists but is not of the requested type.
    #[error("Service '{identifier}' is not of type '{expected}'")]
    TypeMismatch {
        /// The service requested.
        identifier: String,
        /// The type name the caller asked for.
        expected: &'static str,
    },
    /// The factory itself reported an error.
    #[error("Service '{identifier}' could not be built: {source}")]
    Failed {
        /// The service whose factory failed.
        identifier: String,
        /// What went wrong.
        #[source]
        source: anyhow::Error,
    },
}

impl ServiceError {
    /// Wraps a factory's own failure.
    pub fn failed(identifier: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Failed {
            identifier: identifier.into(),
            source: source.into(),
        }
    }

    /// The identifier this error is about.
    pub fn identifier(&self) -> &str {
        match self {
            Self::NotFound(identifier) | Self::Circular(identifier) => identifier,
            Self::TypeMismatch { identifier, .. } | Self::Failed { identifier, .. } => identifier,
        }
    }
}

/// Wraps a typed factory into a [`Factory`].
pub fn factory<T, F>(build: F) -> Factory
where
    T: Any,
    F: Fn(&Rc<dyn Environment>, &Rc<dyn OperatingSystem>, &Resolver<'_>) -> Result<T, ServiceError>
        + 'static,
{
    Box::new(
        move |env: &Rc<dyn Environment>, os: &Rc<dyn OperatingSystem>, get: &Resolver<'_>| {
            build(env, os, get).map(|instance| Rc::new(instance) as Service)
        },
    )
}

enum Slot {
    Pending(Factory),
    Resolving,
    Resolved(Service),
}

/// The per-run service container.
pub struct ServiceContainer {
    env: Rc<dyn Environment>,
    os: Rc<dyn OperatingSystem>,
    slots: RefCell<HashMap<String, Slot>>,
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.borrow();
        let mut identifiers: Vec<&String> = slots.keys().collect();
        identifiers.sort();
        f.debug_struct("ServiceContainer")
            .field("services", &identifiers)
            .finish_non_exhaustive()
    }
}

impl ServiceContainer {
    /// Creates an empty container handing `env` and `os` to every factory.
    pub fn new(env: Rc<dyn Environment>, os: Rc<dyn OperatingSystem>) -> Self {
        Self {
            env,
            os,
            slots: RefCell::new(HashMap::new()),
        }
    }

    /// Adds or replaces the factory for `identifier`. Nothing is built yet.
    ///
    /// Replacing an identifier also drops any instance already cached for it.
    pub fn register(&mut self, identifier: impl Into<String>, factory: Factory) {
        self.slots
            .get_mut()
            .insert(identifier.into(), Slot::Pending(factory));
    }

    /// The environment given to factories.
    pub fn environment(&self) -> &Rc<dyn Environment> {
        &self.env
    }

    /// The operating system given to factories.
    pub fn operating_system(&self) -> &Rc<dyn OperatingSystem> {
        &self.os
    }

    /// A resolver bound to this container.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver { container: self }
    }

    /// Returns the instance for `identifier`, building it on first request.
    pub fn resolve(&self, identifier: &str) -> Result<Service, ServiceError> {
        // The borrow must be released before the factory runs: it may resolve
        // other services through the same container.
        let factory = {
            let mut slots = self.slots.borrow_mut();
            let slot = slots
                .get_mut(identifier)
                .ok_or_else(|| ServiceError::NotFound(identifier.to_string()))?;

            match std::mem::replace(slot, Slot::Resolving) {
                Slot::Resolved(instance) => {
                    log::trace!("Service '{}' already resolved.", identifier);
                    *slot = Slot::Resolved(Rc::clone(&instance));
                    return Ok(instance);
                }
                Slot::Resolving => {
                    return Err(ServiceError::Circular(identifier.to_string()));
                }
                Slot::Pending(factory) => factory,
            }
        };

        log::debug!("Resolving service '{}'.", identifier);
        let result = factory(&self.env, &self.os, &self.resolver());

        let mut slots = self.slots.borrow_mut();
        match result {
            Ok(instance) => {
                slots.insert(identifier.to_string(), Slot::Resolved(Rc::clone(&instance)));
                Ok(instance)
            }
            Err(e) => {
                // Let a later request try again.
                slots.insert(identifier.to_string(), Slot::Pending(factory));
                Err(e)
            }
        }
    }

    /// Resolves `identifier` and downcasts it to `T`.
    pub fn resolve_as<T: Any>(&self, identifier: &str) -> Result<Rc<T>, ServiceError> {
        self.resolve(identifier)?
            .downcast::<T>()
            .map_err(|_| ServiceError::TypeMismatch {
                identifier: identifier.to_string(),
                expected: type_name::<T>(),
            })
    }
}

/// Handle given to factories to request other services from their container.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    container: &'a ServiceContainer,
}

impl Resolver<'_> {
    /// Resolves `identifier`, building it on first request.
    pub fn get(&self, identifier: &str) -> Result<Service, ServiceError> {
        self.container.resolve(identifier)
    }

    /// Resolves `identifier` and downcasts it to `T`.
    pub fn get_as<T: Any>(&self, identifier: &str) -> Result<Rc<T>, ServiceError> {
        self.container.resolve_as(identifier)
    }
}
