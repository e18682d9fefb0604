//! The process-wide layout cache.
//!
//! [`LayoutRegistry`] maps each mappable type to its single
//! [`TypeLayout`], building layouts on demand. Resolution of a nested or
//! parent type recurses through the registry, so shared layouts are built
//! once and reused wherever they are referenced.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::convert::ConverterPair;
use crate::error::MappingResult;
use crate::layout::TypeLayout;
use crate::mappable::Mappable;

/// Thread-safe cache of one layout per mappable type.
///
/// # Concurrency
///
/// Lookups take a read lock; a cache miss builds the layout with no lock
/// held (so recursive resolution of nested types cannot deadlock) and
/// publishes it under the write lock, first insert wins. Two callers racing
/// on the same unresolved type may build it twice, but layout construction
/// is deterministic and only one result is ever published, so every caller
/// observes the same instance. Published layouts are immutable.
///
/// Mutually-recursive mappable types are not supported: the type graph must
/// be a DAG, and a declaration cycle recurses until the stack is exhausted.
pub struct LayoutRegistry {
    layouts: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    converters: HashMap<TypeId, ConverterPair>,
}

impl LayoutRegistry {
    /// Creates an empty registry with no custom converters.
    pub fn new() -> Self {
        Self::with_converters(HashMap::new())
    }

    /// Creates a registry with a fixed custom-converter table. The table
    /// cannot change afterwards; the facade builder seals it at build time.
    pub(crate) fn with_converters(converters: HashMap<TypeId, ConverterPair>) -> Self {
        LayoutRegistry {
            layouts: RwLock::new(HashMap::new()),
            converters,
        }
    }

    /// Returns the cached layout for `T`, building it on first use.
    pub fn layout<T: Mappable>(&self) -> MappingResult<Arc<TypeLayout<T>>> {
        let key = TypeId::of::<T>();

        if let Some(cached) = self.layouts.read().unwrap().get(&key) {
            return Ok(downcast_layout(cached));
        }

        // Build outside the lock; a concurrent builder of the same type is
        // harmless because only the first published result is kept.
        let built: Arc<TypeLayout<T>> = Arc::new(TypeLayout::build(self)?);

        let mut layouts = self.layouts.write().unwrap();
        let published = layouts.entry(key).or_insert_with(|| built);
        Ok(downcast_layout(published))
    }

    /// The registered converter pair for the exact type id, if any.
    pub(crate) fn converter(&self, id: TypeId) -> Option<ConverterPair> {
        self.converters.get(&id).cloned()
    }
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LayoutRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutRegistry")
            .field("layouts", &self.layouts.read().unwrap().len())
            .field("converters", &self.converters.len())
            .finish()
    }
}

fn downcast_layout<T: Mappable>(entry: &Arc<dyn Any + Send + Sync>) -> Arc<TypeLayout<T>> {
    entry
        .clone()
        .downcast::<TypeLayout<T>>()
        .expect("layout cache entry holds a layout of another type")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::FieldKind;
    use crate::mappable::FieldSet;
    use crate::value::{FromValue, IntoValue};

    #[derive(Default)]
    struct Account {
        id: Option<String>,
        login: String,
    }

    impl Mappable for Account {
        fn type_name() -> &'static str {
            "Account"
        }

        fn declare(fields: &mut FieldSet<Self>) {
            fields
                .field(
                    "id",
                    FieldKind::Text,
                    |a: &Self| a.id.clone().into_value(),
                    |a, v| {
                        a.id = FromValue::from_value(v)?;
                        Ok(())
                    },
                )
                .field(
                    "login",
                    FieldKind::Text,
                    |a: &Self| a.login.clone().into_value(),
                    |a, v| {
                        a.login = FromValue::from_value(v)?;
                        Ok(())
                    },
                );
        }
    }

    #[test]
    fn layouts_are_cached_per_type() {
        let registry = LayoutRegistry::new();
        let first = registry.layout::<Account>().unwrap();
        let second = registry.layout::<Account>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn concurrent_first_use_observes_one_layout() {
        let registry = Arc::new(LayoutRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                std::thread::spawn(move || registry.layout::<Account>().unwrap())
            })
            .collect();

        let layouts: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        let published = registry.layout::<Account>().unwrap();
        for layout in layouts {
            assert!(Arc::ptr_eq(&layout, &published));
        }
    }
}
