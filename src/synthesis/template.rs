use std::path::PathBuf;

use super::compile::Compiled;
use crate::bundler::runtime::js_string;

/// Wraps compiled formatter code into a loadable module.
pub trait ModuleTemplate {
    fn render(&self, compiled: &Compiled) -> String;
}

/// Requires the runtime pieces by absolute path from the library's `dist`
/// directory, binding the first one to `Globalize`.
#[derive(Debug, Clone)]
pub struct RuntimeRequireTemplate {
    dist: PathBuf,
}

impl RuntimeRequireTemplate {
    pub fn new(dist: impl Into<PathBuf>) -> Self {
        Self { dist: dist.into() }
    }

    fn path(&self, file_name: &str) -> String {
        js_string(&self.dist.join(file_name).to_string_lossy())
    }
}

impl ModuleTemplate for RuntimeRequireTemplate {
    fn render(&self, compiled: &Compiled) -> String {
        let mut out = String::new();
        let mut dependencies = compiled.dependencies.iter();
        if let Some(first) = dependencies.next() {
            out.push_str(&format!(
                "const Globalize = require({});\n",
                self.path(first.file_name())
            ));
        }
        for dep in dependencies {
            out.push_str(&format!("require({});\n", self.path(dep.file_name())));
        }
        out.push_str(&compiled.code);
        out.push_str("\nmodule.exports = Globalize;\n");
        out
    }
}
