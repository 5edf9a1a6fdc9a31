//! Component type registry
//!
//! Maps component type names to the factories that instantiate them. Each
//! manager consults its own registry when asked to create a component.

use crate::ComponentManager;
use core_types::{Address, ComponentType};
use platform_api::MessagingError;
use std::collections::HashMap;
use std::rc::Rc;
use thiserror::Error;

/// Error types for registry operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Component type already registered
    #[error("component type already registered: {0}")]
    AlreadyRegistered(ComponentType),
    /// Component type not found
    #[error("unknown component type: {0}")]
    NotFound(ComponentType),
}

impl From<RegistryError> for MessagingError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::AlreadyRegistered(ty) => {
                MessagingError::InvalidState(format!("component type already registered: {}", ty))
            }
            RegistryError::NotFound(ty) => MessagingError::NotFound(format!("component type {}", ty)),
        }
    }
}

/// Builds the behaviour of a freshly created component
///
/// Called after the component exists (and, for requested components, after
/// its root channel is connected). Typically creates channels and attaches
/// listeners. Returning an error destroys the component again.
pub trait ComponentFactory {
    fn instantiate(
        &self,
        manager: &mut ComponentManager,
        component: Address,
    ) -> Result<(), MessagingError>;
}

impl<F> ComponentFactory for F
where
    F: Fn(&mut ComponentManager, Address) -> Result<(), MessagingError>,
{
    fn instantiate(
        &self,
        manager: &mut ComponentManager,
        component: Address,
    ) -> Result<(), MessagingError> {
        self(manager, component)
    }
}

/// Component factory registry
///
/// Cloning shares the factories.
#[derive(Clone, Default)]
pub struct ComponentRegistry {
    factories: HashMap<ComponentType, Rc<dyn ComponentFactory>>,
}

impl ComponentRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory for a component type
    pub fn register(
        &mut self,
        component_type: impl Into<ComponentType>,
        factory: impl ComponentFactory + 'static,
    ) -> Result<(), RegistryError> {
        let component_type = component_type.into();
        if self.factories.contains_key(&component_type) {
            return Err(RegistryError::AlreadyRegistered(component_type));
        }
        self.factories.insert(component_type, Rc::new(factory));
        Ok(())
    }

    /// Looks up the factory for a component type
    pub fn lookup(
        &self,
        component_type: &ComponentType,
    ) -> Result<Rc<dyn ComponentFactory>, RegistryError> {
        self.factories
            .get(component_type)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(component_type.clone()))
    }

    pub fn contains(&self, component_type: &ComponentType) -> bool {
        self.factories.contains_key(component_type)
    }

    /// Unregisters a component type
    pub fn unregister(&mut self, component_type: &ComponentType) -> Result<(), RegistryError> {
        self.factories
            .remove(component_type)
            .map(|_| ())
            .ok_or_else(|| RegistryError::NotFound(component_type.clone()))
    }

    /// Registered types, sorted by name
    pub fn types(&self) -> Vec<ComponentType> {
        let mut types: Vec<_> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }

    /// Returns the number of registered types
    pub fn count(&self) -> usize {
        self.factories.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_: &mut ComponentManager, _: Address) -> Result<(), MessagingError> {
        Ok(())
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ComponentRegistry::new();
        registry.register("worker", noop).unwrap();

        assert!(registry.lookup(&ComponentType::from("worker")).is_ok());
        assert!(registry.contains(&ComponentType::from("worker")));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = ComponentRegistry::new();
        registry.register("worker", noop).unwrap();
        let result = registry.register("worker", noop);
        assert_eq!(
            result,
            Err(RegistryError::AlreadyRegistered(ComponentType::from("worker")))
        );
    }

    #[test]
    fn test_lookup_nonexistent() {
        let registry = ComponentRegistry::new();
        let result = registry.lookup(&ComponentType::from("ghost"));
        assert!(matches!(result, Err(RegistryError::NotFound(_))));

        let err: MessagingError = RegistryError::NotFound(ComponentType::from("ghost")).into();
        assert!(matches!(err, MessagingError::NotFound(_)));
    }

    #[test]
    fn test_unregister() {
        let mut registry = ComponentRegistry::new();
        registry.register("worker", noop).unwrap();
        registry.unregister(&ComponentType::from("worker")).unwrap();
        assert_eq!(registry.count(), 0);
        assert!(registry.unregister(&ComponentType::from("worker")).is_err());
    }

    #[test]
    fn test_types_sorted() {
        let mut registry = ComponentRegistry::new();
        registry.register("b", noop).unwrap();
        registry.register("a", noop).unwrap();
        assert_eq!(
            registry.types(),
            vec![ComponentType::from("a"), ComponentType::from("b")]
        );
    }
}
