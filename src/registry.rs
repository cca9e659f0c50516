// Copyright © 2024 Pathway

//! A small service locator.
//!
//! Services are registered as factories keyed by their type and an optional
//! instance name. Lookups that miss locally continue in the parent registry.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;

type Factory<T> = Arc<dyn Fn() -> Arc<T> + Send + Sync>;

#[allow(clippy::ref_option)]
fn instance_suffix(name: &Option<String>) -> String {
    name.as_ref()
        .map(|name| format!(", instance name: {name}"))
        .unwrap_or_default()
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("the service {service} has already been registered{}", instance_suffix(.name))]
    ServiceAlreadyRegistered {
        service: &'static str,
        name: Option<String>,
    },

    #[error("the service {service} cannot be resolved{}", instance_suffix(.name))]
    ServiceNotFound {
        service: &'static str,
        name: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct InstanceKey {
    type_id: TypeId,
    name: Option<String>,
}

impl InstanceKey {
    fn of<T: ?Sized + 'static>(name: Option<&str>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: name.map(str::to_string),
        }
    }
}

struct Registration {
    service: &'static str,
    factory: Box<dyn Any + Send + Sync>,
}

#[derive(Default)]
pub struct ServiceRegistry {
    parent: Option<Arc<ServiceRegistry>>,
    registrations: RwLock<HashMap<InstanceKey, Registration>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry that falls back to `parent` for services it doesn't know.
    pub fn with_parent(parent: Arc<ServiceRegistry>) -> Self {
        Self {
            parent: Some(parent),
            registrations: RwLock::default(),
        }
    }

    pub fn parent(&self) -> Option<&Arc<ServiceRegistry>> {
        self.parent.as_ref()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<InstanceKey, Registration>> {
        self.registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<InstanceKey, Registration>> {
        self.registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Drops every local registration; the parent is left untouched.
    pub fn reset(&self) {
        self.write().clear();
    }

    pub fn register<T, F>(&self, factory: F) -> Result<(), Error>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.register_entry(None, factory)
    }

    pub fn register_named<T, F>(&self, name: &str, factory: F) -> Result<(), Error>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.register_entry(Some(name), factory)
    }

    /// Registers a shared instance; every lookup returns the same `Arc`.
    pub fn register_instance<T>(&self, instance: Arc<T>) -> Result<(), Error>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.register_entry(None, move || instance.clone())
    }

    fn register_entry<T, F>(&self, name: Option<&str>, factory: F) -> Result<(), Error>
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        let key = InstanceKey::of::<T>(name);
        let mut registrations = self.write();
        if registrations.contains_key(&key) {
            return Err(Error::ServiceAlreadyRegistered {
                service: type_name::<T>(),
                name: key.name,
            });
        }
        debug!(
            "Registering service {}{}",
            type_name::<T>(),
            instance_suffix(&key.name)
        );
        let factory: Factory<T> = Arc::new(factory);
        registrations.insert(
            key,
            Registration {
                service: type_name::<T>(),
                factory: Box::new(factory),
            },
        );
        Ok(())
    }

    pub fn unregister<T: ?Sized + 'static>(&self) -> bool {
        self.write().remove(&InstanceKey::of::<T>(None)).is_some()
    }

    pub fn unregister_named<T: ?Sized + 'static>(&self, name: &str) -> bool {
        self.write()
            .remove(&InstanceKey::of::<T>(Some(name)))
            .is_some()
    }

    /// Only local registrations count, the parent is not consulted.
    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.read().contains_key(&InstanceKey::of::<T>(None))
    }

    pub fn is_registered_named<T: ?Sized + 'static>(&self, name: &str) -> bool {
        self.read()
            .contains_key(&InstanceKey::of::<T>(Some(name)))
    }

    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>, Error> {
        self.resolve(None)
    }

    pub fn get_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: &str,
    ) -> Result<Arc<T>, Error> {
        self.resolve(Some(name))
    }

    fn resolve<T: ?Sized + Send + Sync + 'static>(
        &self,
        name: Option<&str>,
    ) -> Result<Arc<T>, Error> {
        let factory = self
            .read()
            .get(&InstanceKey::of::<T>(name))
            .and_then(|registration| registration.factory.downcast_ref::<Factory<T>>())
            .cloned();
        // the lock is released before the factory runs, factories may use the registry
        if let Some(factory) = factory {
            return Ok(factory());
        }
        match &self.parent {
            Some(parent) => parent.resolve(name),
            None => Err(Error::ServiceNotFound {
                service: type_name::<T>(),
                name: name.map(str::to_string),
            }),
        }
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let services: Vec<&'static str> = self
            .read()
            .values()
            .map(|registration| registration.service)
            .collect();
        f.debug_struct("ServiceRegistry")
            .field("services", &services)
            .field("parent", &self.parent)
            .finish()
    }
}
