//! Constructor selection strategies.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{catalog::TypeInfo, injectable::ConstructorDescriptor};

/// Picks the constructor a concrete type is built with.
///
/// Only public constructors are candidates. `None` means the type cannot be
/// constructed.
pub trait ConstructorSelector: Send + Sync {
    fn select(&self, info: &TypeInfo) -> Option<ConstructorDescriptor>;

    fn name(&self) -> &'static str;
}

/// Greatest parameter count wins; ties go to the first declared.
#[derive(Debug, Default, Clone, Copy)]
pub struct MostSpecific;

impl ConstructorSelector for MostSpecific {
    fn select(&self, info: &TypeInfo) -> Option<ConstructorDescriptor> {
        let mut best: Option<&ConstructorDescriptor> = None;
        for candidate in info.public_constructors() {
            if best.map_or(true, |current| candidate.arity() > current.arity()) {
                best = Some(candidate);
            }
        }
        best.cloned()
    }

    fn name(&self) -> &'static str {
        "most_specific"
    }
}

/// Fewest parameters wins; ties go to the first declared.
#[derive(Debug, Default, Clone, Copy)]
pub struct LeastSpecific;

impl ConstructorSelector for LeastSpecific {
    fn select(&self, info: &TypeInfo) -> Option<ConstructorDescriptor> {
        let mut best: Option<&ConstructorDescriptor> = None;
        for candidate in info.public_constructors() {
            if best.map_or(true, |current| candidate.arity() < current.arity()) {
                best = Some(candidate);
            }
        }
        best.cloned()
    }

    fn name(&self) -> &'static str {
        "least_specific"
    }
}

/// Built-in selection policies, as named in configuration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    #[default]
    MostSpecific,
    LeastSpecific,
}

impl SelectionStrategy {
    pub fn selector(self) -> Arc<dyn ConstructorSelector> {
        match self {
            Self::MostSpecific => Arc::new(MostSpecific),
            Self::LeastSpecific => Arc::new(LeastSpecific),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "most_specific" => Some(Self::MostSpecific),
            "least_specific" => Some(Self::LeastSpecific),
            _ => None,
        }
    }
}
