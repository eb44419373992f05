use anyhow::{Context, Result};
use regex::Regex;

use crate::bundler::compiler::{Compiler, Plugin};

/// Redirects every request matching `pattern` to `new_request` before it is
/// resolved.
#[derive(Debug, Clone)]
pub struct NormalModuleReplacementPlugin {
    pattern: Regex,
    new_request: String,
}

impl NormalModuleReplacementPlugin {
    pub fn new(pattern: Regex, new_request: impl Into<String>) -> Self {
        Self {
            pattern,
            new_request: new_request.into(),
        }
    }

    pub fn from_pattern(pattern: &str, new_request: impl Into<String>) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .with_context(|| format!("Invalid module replacement pattern: \"{}\"", pattern))?;
        Ok(Self::new(pattern, new_request))
    }

    /// The request that `request` is rewritten to, if it matches.
    pub fn rewrite(&self, request: &str) -> Option<&str> {
        self.pattern
            .is_match(request)
            .then_some(self.new_request.as_str())
    }
}

impl Plugin for NormalModuleReplacementPlugin {
    fn name(&self) -> &'static str {
        "NormalModuleReplacementPlugin"
    }

    fn apply(&self, compiler: &mut Compiler) -> Result<()> {
        let plugin = self.clone();
        compiler
            .hooks
            .normal_module_factory
            .tap(self.name(), move |factory| {
                let plugin = plugin.clone();
                factory
                    .hooks
                    .before_resolve
                    .tap("NormalModuleReplacementPlugin", move |data| {
                        if let Some(new_request) = plugin.rewrite(&data.request) {
                            data.request = new_request.to_string();
                        }
                        Ok(())
                    });
                Ok(())
            });
        Ok(())
    }
}
