//! Assignability between a requested service and its implementation.
//!
//! `I: Upcast<C>` states that a shared `C` can be handed out as a shared `I`.
//! Every type trivially provides itself; trait-object services declare their
//! implementations with [`implements!`](crate::implements):
//!
//! ```
//! use di::implements;
//!
//! trait Greeter: Send + Sync {}
//! struct English;
//! impl Greeter for English {}
//!
//! implements!(dyn Greeter => English);
//! ```

use std::{fmt, sync::Arc};

use crate::{errors::Result, instance::Instance, key::TypeKey};

pub trait Upcast<C: ?Sized> {
    fn upcast(concrete: Arc<C>) -> Arc<Self>;
}

impl<T: ?Sized> Upcast<T> for T {
    fn upcast(concrete: Arc<T>) -> Arc<T> {
        concrete
    }
}

/// Declare that a trait object is implemented by the listed concrete types.
#[macro_export]
macro_rules! implements {
    ($service:ty => $($concrete:ty),+ $(,)?) => {
        $(
            impl $crate::Upcast<$concrete> for $service {
                fn upcast(concrete: ::std::sync::Arc<$concrete>) -> ::std::sync::Arc<Self> {
                    concrete
                }
            }
        )+
    };
}

type CastFn = dyn Fn(Instance) -> Result<Instance> + Send + Sync;

/// Type-erased `Upcast`: turns an instance of `concrete` into an instance of
/// `requested`. Empty instances stay empty.
#[derive(Clone)]
pub struct Caster {
    requested: TypeKey,
    concrete: TypeKey,
    cast: Arc<CastFn>,
}

impl Caster {
    pub fn of<I, C>() -> Self
    where
        I: ?Sized + Upcast<C> + Send + Sync + 'static,
        C: ?Sized + Send + Sync + 'static,
    {
        Self {
            requested: TypeKey::of::<I>(),
            concrete: TypeKey::of::<C>(),
            cast: Arc::new(|instance: Instance| {
                let viewed = instance.downcast::<C>()?.map(<I as Upcast<C>>::upcast);
                Ok(Instance::from_option(viewed))
            }),
        }
    }

    pub fn requested(&self) -> TypeKey {
        self.requested
    }

    pub fn concrete(&self) -> TypeKey {
        self.concrete
    }

    pub fn cast(&self, instance: Instance) -> Result<Instance> {
        (self.cast)(instance)
    }
}

impl fmt::Debug for Caster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Caster({} -> {})", self.concrete, self.requested)
    }
}
