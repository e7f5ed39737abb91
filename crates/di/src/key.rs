use std::{
    any::TypeId,
    fmt,
    hash::{Hash, Hasher},
};

/// Identifier of a service slot in the container.
///
/// Works for concrete types as well as trait objects (`dyn Trait`), so both
/// sides of an interface binding can be keyed the same way. Equality and
/// hashing use only the `TypeId`; the name is kept for diagnostics.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key of `T`. `T` may be unsized, e.g. `TypeKey::of::<dyn Greeter>()`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The `TypeId` the key compares by.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type path as reported by `std::any::type_name`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type name without module paths, e.g. `Arc<dyn Greeter>` instead of
    /// `alloc::sync::Arc<dyn app::Greeter>`.
    pub fn short_name(&self) -> String {
        let mut out = String::with_capacity(self.name.len());
        let mut segment = String::new();
        for ch in self.name.chars() {
            match ch {
                ':' => segment.clear(),
                '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' => {
                    out.push_str(&segment);
                    segment.clear();
                    out.push(ch);
                }
                _ => segment.push(ch),
            }
        }
        out.push_str(&segment);
        out
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    trait Marker {}
    struct Plain;

    #[test]
    fn test_keys_compare_by_type() {
        assert_eq!(TypeKey::of::<Plain>(), TypeKey::of::<Plain>());
        assert_ne!(TypeKey::of::<Plain>(), TypeKey::of::<dyn Marker>());

        let mut set = HashSet::new();
        set.insert(TypeKey::of::<Plain>());
        set.insert(TypeKey::of::<Plain>());
        set.insert(TypeKey::of::<dyn Marker>());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_short_name_strips_paths() {
        let key = TypeKey::of::<std::sync::Arc<dyn Marker>>();
        assert_eq!(key.short_name(), "Arc<dyn Marker>");
        assert_eq!(TypeKey::of::<Plain>().short_name(), "Plain");
    }
}
