//! intlpack - build-time i18n injection for a CommonJS bundler
//!
//! intlpack bundles a JavaScript project and, in Globalize mode, compiles the
//! project's formatters and message templates at build time, injecting the
//! generated module at the top of the entry module.
//!
//! ## Module Structure
//!
//! - `bundler`: Minimal host build system (compiler, hooks, module graph, codegen)
//! - `inject`: Injected dependency, its renderer and the Globalize plugin
//! - `synthesis`: Formatter extraction and compilation against CLDR data
//! - `config`: Configuration file loading and parsing
//! - `cli`: Command-line interface layer

pub mod bundler;
pub mod cli;
pub mod config;
pub mod inject;
pub mod synthesis;
