//! Dependency edges of the module graph and the registries that give each
//! dependency kind its resolver and its renderer.
//!
//! A dependency is plain data. What the host does with it is decided by the
//! concrete type: the compilation looks up a [`ModuleFactory`] keyed by the
//! dependency's `TypeId` to resolve it, and a [`DependencyTemplate`] keyed the
//! same way to render it during code generation.

use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    fmt,
    path::PathBuf,
    sync::Arc,
};

use anyhow::Result;

use super::{
    module::{ModuleGraph, ModuleId},
    runtime::RuntimeTemplate,
    source::ReplaceSource,
};

pub trait Dependency: Any + fmt::Debug {
    /// Short human readable kind, used in diagnostics.
    fn category(&self) -> &'static str;

    /// The request to resolve, if this dependency points at another module.
    fn request(&self) -> Option<&str> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Position of a dependency inside its owning module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyRef {
    pub module: ModuleId,
    pub index: usize,
}

/// Input to a module factory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveData {
    /// Directory of the module issuing the request.
    pub context: PathBuf,
    pub request: String,
}

/// Turns a request into a concrete resource path.
pub trait ModuleFactory {
    fn create(&self, data: &ResolveData) -> Result<PathBuf>;
}

pub struct TemplateContext<'a> {
    pub dependency: DependencyRef,
    pub module_graph: &'a ModuleGraph,
    pub runtime: &'a RuntimeTemplate,
}

impl TemplateContext<'_> {
    /// The module this dependency resolved to, if resolution succeeded.
    pub fn resolved_module(&self) -> Option<ModuleId> {
        self.module_graph.resolved(self.dependency)
    }
}

/// Renders a dependency into its owning module's source.
///
/// Rendering is infallible: a template that cannot produce a meaningful
/// result must encode the failure in the emitted code.
pub trait DependencyTemplate {
    fn apply(&self, dep: &dyn Dependency, source: &mut ReplaceSource, ctx: &TemplateContext<'_>);
}

/// Map from a concrete dependency type to a handler.
pub struct DependencyRegistry<V: ?Sized> {
    entries: HashMap<TypeId, (&'static str, Arc<V>)>,
}

impl<V: ?Sized> Default for DependencyRegistry<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V: ?Sized> fmt::Debug for DependencyRegistry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        f.debug_set().entries(names).finish()
    }
}

impl<V: ?Sized> DependencyRegistry<V> {
    pub fn set<D: Dependency>(&mut self, handler: Arc<V>) {
        self.entries
            .insert(TypeId::of::<D>(), (type_name::<D>(), handler));
    }

    pub fn get(&self, dep: &dyn Dependency) -> Option<&Arc<V>> {
        self.entries
            .get(&dep.as_any().type_id())
            .map(|(_, handler)| handler)
    }

    pub fn contains<D: Dependency>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<D>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct First;

    impl Dependency for First {
        fn category(&self) -> &'static str {
            "first"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[derive(Debug)]
    struct Second;

    impl Dependency for Second {
        fn category(&self) -> &'static str {
            "second"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_registry_is_keyed_by_concrete_type() {
        let mut registry: DependencyRegistry<str> = DependencyRegistry::default();
        registry.set::<First>(Arc::from("first handler"));

        assert!(registry.contains::<First>());
        assert!(!registry.contains::<Second>());
        assert_eq!(
            registry.get(&First).map(|handler| &**handler),
            Some("first handler")
        );
        assert!(registry.get(&Second).is_none());
    }
}
