// Provider container

use crate::Error;
use girder_log::{debug, trace};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// A type-keyed store of shared instances.
///
/// Child scopes see everything their parent holds and may shadow it with
/// their own registrations without touching the parent.
#[derive(Clone, Default)]
pub struct Container {
    providers: Arc<RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>>,
    parent: Option<Box<Container>>,
}

impl Container {
    pub fn new() -> Self {
        debug!("Creating new container");
        Self::default()
    }

    /// A scope layered over this container.
    pub fn child(&self) -> Self {
        trace!("Creating child container scope");
        Self {
            providers: Arc::default(),
            parent: Some(Box::new(self.clone())),
        }
    }

    /// Register a provider instance
    pub fn register<T: Send + Sync + 'static>(&self, instance: T) {
        self.register_arc(Arc::new(instance));
    }

    pub fn register_arc<T: Send + Sync + 'static>(&self, instance: Arc<T>) {
        let type_name = std::any::type_name::<T>();
        self.providers.write().insert(TypeId::of::<T>(), instance);
        debug!({ provider = type_name }, "Provider registered");
    }

    /// Register a provider using a factory function
    pub fn register_factory<T: Send + Sync + 'static, F>(&self, factory: F)
    where
        F: FnOnce() -> T,
    {
        self.register(factory());
    }

    /// Resolve a provider by type, searching parent scopes.
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, Error> {
        let type_name = std::any::type_name::<T>();

        let local = self
            .providers
            .read()
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|any| any.downcast::<T>().ok());

        match (local, &self.parent) {
            (Some(instance), _) => {
                trace!({ provider = type_name }, "Provider resolved");
                Ok(instance)
            }
            (None, Some(parent)) => parent.resolve::<T>(),
            (None, None) => {
                debug!({ provider = type_name }, "Provider not found in container");
                Err(Error::ProviderNotFound(type_name.to_string()))
            }
        }
    }

    /// Check if a provider is registered in this scope or a parent.
    pub fn has<T: Send + Sync + 'static>(&self) -> bool {
        self.providers.read().contains_key(&TypeId::of::<T>())
            || self.parent.as_ref().is_some_and(|p| p.has::<T>())
    }

    /// Clear the providers of this scope only.
    pub fn clear(&self) {
        let mut providers = self.providers.write();
        let count = providers.len();
        providers.clear();
        debug!({ provider_count = count }, "Cleared container scope");
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("providers", &self.providers.read().len())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
