//! Build-time injection of generated modules.
//!
//! - [`InjectedModuleDependency`]: a require of a generated module, placed at
//!   offset 0 of the owning module's output and optionally bound to a variable.
//! - [`InjectedModuleTemplate`]: renders it, falling back to a throwing
//!   expression when the generated module could not be resolved.
//! - [`GlobalizePlugin`]: runs the synthesis step when the target module is
//!   built and attaches the dependency.
//! - [`ModuleWriter`]: where generated source is persisted.

mod dependency;
mod plugin;
mod writer;

pub use dependency::{InjectedModuleDependency, InjectedModuleTemplate};
pub use plugin::{DEFAULT_REQUEST, DEFAULT_RUNTIME_REQUEST, DEFAULT_TARGET, GlobalizePlugin};
pub use writer::{MemoryWriter, ModuleWriter, TempDirWriter};
