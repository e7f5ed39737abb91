//! Constructor metadata.
//!
//! Rust has no runtime reflection, so a type opts into constructor-based
//! registration by implementing [`Injectable`] and listing its constructors.
//! The usual way to describe a constructor is [`ConstructorDescriptor::from_fn`],
//! which reads the parameter types straight from the function signature:
//!
//! ```
//! use std::sync::Arc;
//! use di::{ConstructorDescriptor, Injectable};
//!
//! struct Clock;
//! struct Scheduler {
//!     clock: Arc<Clock>,
//! }
//!
//! impl Injectable for Clock {
//!     fn constructors() -> Vec<ConstructorDescriptor> {
//!         vec![ConstructorDescriptor::from_fn("new", || Clock)]
//!     }
//! }
//!
//! impl Injectable for Scheduler {
//!     fn constructors() -> Vec<ConstructorDescriptor> {
//!         vec![ConstructorDescriptor::from_fn("new", |clock: Arc<Clock>| Scheduler { clock })]
//!     }
//! }
//! ```
//!
//! Parameters are `Arc<T>` (the dependency must be present) or
//! `Option<Arc<T>>` (an explicitly registered empty value is accepted).

use std::{fmt, sync::Arc};

use crate::{
    errors::{DiError, Result},
    instance::Instance,
    key::TypeKey,
};

/// A type that can be built from its constructors' dependencies.
pub trait Injectable: Send + Sync + Sized + 'static {
    /// All constructors of the type, in declaration order.
    ///
    /// Returning an empty list (or only private constructors) marks the
    /// type as not constructable.
    fn constructors() -> Vec<ConstructorDescriptor>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

type Invoker = dyn Fn(Arguments) -> Result<Instance> + Send + Sync;

/// One constructor of a type: its parameter types in declaration order and
/// a callable that builds the instance from resolved arguments.
#[derive(Clone)]
pub struct ConstructorDescriptor {
    owner: TypeKey,
    name: &'static str,
    visibility: Visibility,
    parameters: Vec<TypeKey>,
    invoke: Arc<Invoker>,
}

impl ConstructorDescriptor {
    /// Describe a constructor by hand. `invoke` receives exactly
    /// `parameters.len()` arguments.
    pub fn new<F>(owner: TypeKey, name: &'static str, parameters: Vec<TypeKey>, invoke: F) -> Self
    where
        F: Fn(Arguments) -> Result<Instance> + Send + Sync + 'static,
    {
        Self {
            owner,
            name,
            visibility: Visibility::Public,
            parameters,
            invoke: Arc::new(invoke),
        }
    }

    /// Describe a constructor from a plain function or closure.
    pub fn from_fn<T, Args, F>(name: &'static str, constructor: F) -> Self
    where
        T: Send + Sync + 'static,
        F: ConstructorFn<T, Args>,
    {
        let owner = TypeKey::of::<T>();
        Self::new(owner, name, F::parameters(), move |mut args| {
            let value = constructor.construct(&mut args)?;
            args.finish()?;
            Ok(Instance::new(Arc::new(value)))
        })
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    pub fn owner(&self) -> TypeKey {
        self.owner
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    pub fn parameters(&self) -> &[TypeKey] {
        &self.parameters
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Call the constructor with one resolved value per declared parameter.
    pub fn invoke(&self, values: Vec<Instance>) -> Result<Instance> {
        let args = Arguments::new(self.owner, self.name, self.arity(), values);
        if args.remaining() != self.arity() {
            return Err(args.count_error(args.remaining()));
        }
        (self.invoke)(args)
    }
}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("owner", &self.owner)
            .field("name", &self.name)
            .field("visibility", &self.visibility)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Resolved constructor arguments, consumed in parameter order.
pub struct Arguments {
    owner: TypeKey,
    constructor: &'static str,
    declared: usize,
    consumed: usize,
    values: std::vec::IntoIter<Instance>,
}

impl Arguments {
    pub(crate) fn new(
        owner: TypeKey,
        constructor: &'static str,
        declared: usize,
        values: Vec<Instance>,
    ) -> Self {
        Self {
            owner,
            constructor,
            declared,
            consumed: 0,
            values: values.into_iter(),
        }
    }

    fn count_error(&self, actual: usize) -> DiError {
        DiError::ArgumentCount {
            owner: self.owner,
            constructor: self.constructor,
            expected: self.declared,
            actual,
        }
    }

    pub fn next_instance(&mut self) -> Result<Instance> {
        let instance = self
            .values
            .next()
            .ok_or_else(|| self.count_error(self.consumed + 1))?;
        self.consumed += 1;
        Ok(instance)
    }

    /// Next argument, which must be non-empty.
    pub fn next<T>(&mut self) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.next_instance()?.require::<T>()
    }

    /// Next argument, accepting the explicit empty value.
    pub fn next_optional<T>(&mut self) -> Result<Option<Arc<T>>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.next_instance()?.downcast::<T>()
    }

    /// Arguments not consumed yet.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    /// Fails if arguments were left unconsumed.
    pub fn finish(self) -> Result<()> {
        if self.values.len() == 0 {
            Ok(())
        } else {
            Err(self.count_error(self.consumed))
        }
    }
}

/// A constructor parameter type.
pub trait FromArgument: Sized {
    /// The service the parameter asks for.
    fn key() -> TypeKey;

    fn from_argument(args: &mut Arguments) -> Result<Self>;
}

impl<T> FromArgument for Arc<T>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn key() -> TypeKey {
        TypeKey::of::<T>()
    }

    fn from_argument(args: &mut Arguments) -> Result<Self> {
        args.next::<T>()
    }
}

impl<T> FromArgument for Option<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    fn key() -> TypeKey {
        TypeKey::of::<T>()
    }

    fn from_argument(args: &mut Arguments) -> Result<Self> {
        args.next_optional::<T>()
    }
}

/// Functions usable as constructors: every parameter implements
/// [`FromArgument`], the return value is the constructed type.
pub trait ConstructorFn<T, Args>: Send + Sync + 'static {
    fn parameters() -> Vec<TypeKey>;

    fn construct(&self, args: &mut Arguments) -> Result<T>;
}

macro_rules! impl_constructor_fn {
    ($($param:ident),*) => {
        impl<F, T, $($param,)*> ConstructorFn<T, ($($param,)*)> for F
        where
            F: Fn($($param),*) -> T + Send + Sync + 'static,
            $($param: FromArgument,)*
        {
            fn parameters() -> Vec<TypeKey> {
                vec![$(<$param as FromArgument>::key()),*]
            }

            #[allow(unused_variables)]
            fn construct(&self, args: &mut Arguments) -> Result<T> {
                Ok((self)($(<$param as FromArgument>::from_argument(args)?),*))
            }
        }
    };
}

impl_constructor_fn!();
impl_constructor_fn!(A1);
impl_constructor_fn!(A1, A2);
impl_constructor_fn!(A1, A2, A3);
impl_constructor_fn!(A1, A2, A3, A4);
impl_constructor_fn!(A1, A2, A3, A4, A5);
impl_constructor_fn!(A1, A2, A3, A4, A5, A6);
impl_constructor_fn!(A1, A2, A3, A4, A5, A6, A7);
impl_constructor_fn!(A1, A2, A3, A4, A5, A6, A7, A8);
