//! "Type in, instance out" service lookup for hosts that only know keys.

use std::sync::Arc;

use crate::{container::Container, errors::Result, instance::Instance, key::TypeKey};

pub trait ServiceProvider: Send + Sync {
    fn get_service(&self, key: &TypeKey) -> Result<Instance>;
}

impl ServiceProvider for Container {
    fn get_service(&self, key: &TypeKey) -> Result<Instance> {
        self.resolve_key(key)
    }
}

/// Typed helpers over any [`ServiceProvider`].
pub trait ServiceProviderExt: ServiceProvider {
    fn get_service_of<T>(&self) -> Result<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get_service(&TypeKey::of::<T>())?.downcast::<T>()
    }
}

impl<P: ServiceProvider + ?Sized> ServiceProviderExt for P {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DiError;

    struct Port(u16);

    #[test]
    fn test_lookup_through_trait_object() {
        let container = Container::new();
        container
            .register_single_instance::<Port>(Arc::new(Port(8080)))
            .unwrap();

        let provider: &dyn ServiceProvider = &container;
        let instance = provider.get_service(&TypeKey::of::<Port>()).unwrap();
        assert_eq!(instance.require::<Port>().unwrap().0, 8080);

        let port = provider.get_service_of::<Port>().unwrap().unwrap();
        assert_eq!(port.0, 8080);
    }

    #[test]
    fn test_missing_service() {
        let container = Container::new();
        let error = container.get_service(&TypeKey::of::<Port>()).unwrap_err();
        assert!(matches!(error, DiError::UnregisteredType { .. }));
    }
}
