use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    ops::Range,
    path::{Path, PathBuf},
};

use serde::Serialize;

use super::dependency::{Dependency, DependencyRef};

/// Numeric module id. The entry module is always `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModuleId(pub usize);

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A free (unbound) identifier used as an expression, e.g. `__CLDR_DATA__`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeIdentifier {
    pub name: String,
    pub range: Range<usize>,
    /// Used as a shorthand property (`{ name }`), so a replacement must keep the key.
    pub shorthand: bool,
}

#[derive(Debug)]
pub struct NormalModule {
    pub id: ModuleId,
    /// Canonical path of the file backing this module.
    pub resource: PathBuf,
    pub source: String,
    pub dependencies: Vec<Box<dyn Dependency>>,
    pub free_identifiers: Vec<FreeIdentifier>,
}

impl NormalModule {
    pub fn new(id: ModuleId, resource: PathBuf, source: String) -> Self {
        Self {
            id,
            resource,
            source,
            dependencies: Vec::new(),
            free_identifiers: Vec::new(),
        }
    }

    /// Append a dependency after the module has been parsed.
    pub fn add_dependency(&mut self, dep: Box<dyn Dependency>) {
        self.dependencies.push(dep);
    }

    /// Directory used as the context for this module's requests.
    pub fn context(&self) -> &Path {
        self.resource.parent().unwrap_or(Path::new("."))
    }

    pub fn resource_str(&self) -> String {
        self.resource.to_string_lossy().into_owned()
    }
}

/// Resolution results of a compilation.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    resolved: BTreeMap<DependencyRef, ModuleId>,
    by_resource: HashMap<PathBuf, ModuleId>,
}

impl ModuleGraph {
    pub fn resolved(&self, dep: DependencyRef) -> Option<ModuleId> {
        self.resolved.get(&dep).copied()
    }

    pub fn set_resolved(&mut self, dep: DependencyRef, module: ModuleId) {
        self.resolved.insert(dep, module);
    }

    pub fn module_for(&self, resource: &Path) -> Option<ModuleId> {
        self.by_resource.get(resource).copied()
    }

    pub fn register(&mut self, resource: PathBuf, module: ModuleId) {
        self.by_resource.insert(resource, module);
    }

    pub fn module_count(&self) -> usize {
        self.by_resource.len()
    }
}
