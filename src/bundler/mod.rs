//! Minimal CommonJS bundler.
//!
//! Just enough of a build system to host plugins: a [`Compiler`] with hooks,
//! a [`Compilation`] that walks the module graph, pluggable dependency kinds
//! with their own factories and templates, and a single-file bundle runtime.
//!
//! ## Build phases
//!
//! 1. **Make**: resolve the entry, then read, scan and hook every reachable
//!    module (`compilation.hooks.parsed`, `compilation.hooks.succeed_module`)
//!    before resolving its dependencies.
//! 2. **Code generation**: apply each dependency's template to a
//!    [`ReplaceSource`] of its module.
//! 3. **Emit**: wrap modules into the bundle, fire `compiler.hooks.emit`,
//!    write assets.

pub mod compilation;
pub mod compiler;
pub mod dependencies;
pub mod dependency;
pub mod factory;
pub mod hooks;
pub mod module;
pub mod options;
pub mod parser;
pub mod plugins;
pub mod resolver;
pub mod runtime;
pub mod source;

pub use compilation::{Compilation, CompilationParams, ModuleSummary, ModuleWarning};
pub use compiler::{Assets, BuildOutput, Compiler, Plugin};
pub use dependency::{Dependency, DependencyRef, DependencyTemplate, ModuleFactory, TemplateContext};
pub use module::{ModuleId, NormalModule};
pub use options::{BuildOptions, OutputOptions, ResolveOptions};
pub use source::ReplaceSource;
