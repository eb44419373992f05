//! Built-in dependency kinds.

use std::{any::Any, ops::Range};

use super::{
    dependency::{Dependency, DependencyTemplate, TemplateContext},
    source::ReplaceSource,
};

/// The configured entry point. Never owned by a module.
#[derive(Debug, Clone)]
pub struct EntryDependency {
    request: String,
}

impl EntryDependency {
    pub fn new(request: impl Into<String>) -> Self {
        Self {
            request: request.into(),
        }
    }
}

impl Dependency for EntryDependency {
    fn category(&self) -> &'static str {
        "entry"
    }

    fn request(&self) -> Option<&str> {
        Some(&self.request)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// `require("request")` found by the parser.
#[derive(Debug, Clone)]
pub struct CommonJsRequireDependency {
    request: String,
    range: Range<usize>,
}

impl CommonJsRequireDependency {
    pub fn new(request: impl Into<String>, range: Range<usize>) -> Self {
        Self {
            request: request.into(),
            range,
        }
    }
}

impl Dependency for CommonJsRequireDependency {
    fn category(&self) -> &'static str {
        "commonjs"
    }

    fn request(&self) -> Option<&str> {
        Some(&self.request)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Replaces the whole call expression with a require-by-id.
#[derive(Debug, Default)]
pub struct CommonJsRequireTemplate;

impl DependencyTemplate for CommonJsRequireTemplate {
    fn apply(&self, dep: &dyn Dependency, source: &mut ReplaceSource, ctx: &TemplateContext<'_>) {
        let Some(dep) = dep.as_any().downcast_ref::<CommonJsRequireDependency>() else {
            return;
        };
        let expression = ctx
            .runtime
            .module_expression(ctx.resolved_module(), &dep.request);
        source.replace(dep.range.start, dep.range.end, expression);
    }
}

/// A source range replaced by fixed code at build time.
#[derive(Debug, Clone)]
pub struct ConstDependency {
    expression: String,
    range: Range<usize>,
}

impl ConstDependency {
    pub fn new(expression: impl Into<String>, range: Range<usize>) -> Self {
        Self {
            expression: expression.into(),
            range,
        }
    }
}

impl Dependency for ConstDependency {
    fn category(&self) -> &'static str {
        "const"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Default)]
pub struct ConstTemplate;

impl DependencyTemplate for ConstTemplate {
    fn apply(&self, dep: &dyn Dependency, source: &mut ReplaceSource, _ctx: &TemplateContext<'_>) {
        if let Some(dep) = dep.as_any().downcast_ref::<ConstDependency>() {
            source.replace(dep.range.start, dep.range.end, dep.expression.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::{
        dependency::DependencyRef,
        module::{ModuleGraph, ModuleId},
        runtime::RuntimeTemplate,
    };
    use pretty_assertions::assert_eq;

    fn context(graph: &ModuleGraph) -> TemplateContext<'_> {
        static RUNTIME: RuntimeTemplate = RuntimeTemplate;
        TemplateContext {
            dependency: DependencyRef {
                module: ModuleId(0),
                index: 0,
            },
            module_graph: graph,
            runtime: &RUNTIME,
        }
    }

    #[test]
    fn test_require_rendered_by_id() {
        let code = "var G = require('globalize');";
        let dep = CommonJsRequireDependency::new("globalize", 8..28);
        let mut graph = ModuleGraph::default();
        graph.set_resolved(
            DependencyRef {
                module: ModuleId(0),
                index: 0,
            },
            ModuleId(2),
        );

        let mut source = ReplaceSource::new(code);
        CommonJsRequireTemplate.apply(&dep, &mut source, &context(&graph));
        assert_eq!(source.render(), "var G = __intlpack_require__(2);");
    }

    #[test]
    fn test_unresolved_require_becomes_missing_module() {
        let code = "require('./gone');";
        let dep = CommonJsRequireDependency::new("./gone", 0..17);
        let graph = ModuleGraph::default();

        let mut source = ReplaceSource::new(code);
        CommonJsRequireTemplate.apply(&dep, &mut source, &context(&graph));
        let rendered = source.render();
        assert!(rendered.starts_with("!(function intlpackMissingModule()"));
        assert!(rendered.contains("Cannot find module './gone'"));
        assert!(rendered.ends_with(";"));
    }

    #[test]
    fn test_const_replaces_range() {
        let code = "const data = __CLDR_DATA__;";
        let dep = ConstDependency::new("null", 13..26);
        let graph = ModuleGraph::default();

        let mut source = ReplaceSource::new(code);
        ConstTemplate.apply(&dep, &mut source, &context(&graph));
        assert_eq!(source.render(), "const data = null;");
    }
}
