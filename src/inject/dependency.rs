use std::any::Any;

use crate::bundler::{Dependency, DependencyTemplate, ReplaceSource, TemplateContext};

/// Requires a generated module at the very top of the owning module.
///
/// Created by a plugin after the owner was built. Resolution and lifetime
/// belong to the compilation; the dependency itself is never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedModuleDependency {
    request: String,
    variable: Option<String>,
}

impl InjectedModuleDependency {
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
            variable: None,
        }
    }

    /// Bind the required value to `variable` instead of discarding it.
    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = Some(variable.into());
        self
    }
}

impl Dependency for InjectedModuleDependency {
    fn category(&self) -> &'static str {
        "injected"
    }

    fn request(&self) -> Option<&str> {
        Some(&self.request)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Default)]
pub struct InjectedModuleTemplate;

impl DependencyTemplate for InjectedModuleTemplate {
    fn apply(&self, dep: &dyn Dependency, source: &mut ReplaceSource, ctx: &TemplateContext<'_>) {
        let Some(dep) = dep.as_any().downcast_ref::<InjectedModuleDependency>() else {
            return;
        };

        let content = ctx
            .runtime
            .module_expression(ctx.resolved_module(), &dep.request);
        let prefix = dep
            .variable
            .as_ref()
            .map(|variable| format!("var {} = ", variable))
            .unwrap_or_default();

        source.insert(0, format!("{}{};\n", prefix, content));
    }
}
