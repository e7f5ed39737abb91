use std::{
    any::Any,
    fmt,
    sync::Arc,
};

use crate::{
    errors::{DiError, Result},
    key::TypeKey,
};

/// Type-erased, shareable service value.
///
/// The erased payload is always an `Arc<T>` for the type `T` named by
/// [`Instance::key`], which lets trait-object views (`Arc<dyn Trait>`) travel
/// through the same machinery as concrete types. An instance may be empty:
/// that is the explicit "null" a caller can register as a singleton.
#[derive(Clone)]
pub struct Instance {
    key: TypeKey,
    value: Option<Arc<dyn Any + Send + Sync>>,
    // address of the shared service, for identity checks across views
    addr: usize,
}

impl Instance {
    pub fn new<T>(value: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let addr = Arc::as_ptr(&value) as *const () as usize;
        let erased: Arc<dyn Any + Send + Sync> = Arc::new(value);
        Self {
            key: TypeKey::of::<T>(),
            value: Some(erased),
            addr,
        }
    }

    /// The explicit empty value for `key`.
    pub fn empty(key: TypeKey) -> Self {
        Self {
            key,
            value: None,
            addr: 0,
        }
    }

    pub fn from_option<T>(value: Option<Arc<T>>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        match value {
            Some(value) => Self::new(value),
            None => Self::empty(TypeKey::of::<T>()),
        }
    }

    pub fn key(&self) -> TypeKey {
        self.key
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// View the value as `Arc<T>`. `Ok(None)` for the empty value.
    pub fn downcast<T>(&self) -> Result<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let expected = TypeKey::of::<T>();
        if self.key != expected {
            return Err(DiError::TypeMismatch {
                expected,
                actual: self.key,
            });
        }

        match &self.value {
            None => Ok(None),
            Some(erased) => erased
                .downcast_ref::<Arc<T>>()
                .cloned()
                .map(Some)
                .ok_or(DiError::TypeMismatch {
                    expected,
                    actual: self.key,
                }),
        }
    }

    /// Like [`Instance::downcast`] but the empty value is an error.
    pub fn require<T>(&self) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.downcast::<T>()?.ok_or(DiError::EmptyInstance { type_key: self.key })
    }

    /// Reference identity of the underlying service, independent of the
    /// view it is wrapped in.
    pub fn same_as(&self, other: &Instance) -> bool {
        match (&self.value, &other.value) {
            (Some(_), Some(_)) => self.addr == other.addr,
            (None, None) => self.key == other.key,
            _ => false,
        }
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("key", &self.key)
            .field("empty", &self.is_empty())
            .finish()
    }
}
