//! A single build: module graph construction followed by code generation.
//!
//! The graph is walked breadth first from the entry. Each module is read,
//! scanned, handed to the `parsed` and `succeed_module` hooks, and only then
//! are its dependencies resolved. Dependencies appended by a hook are
//! therefore resolved exactly like the ones the parser found.

use std::{collections::VecDeque, fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result, anyhow};
use serde::Serialize;

use super::{
    dependencies::{
        CommonJsRequireDependency, CommonJsRequireTemplate, ConstDependency, ConstTemplate,
        EntryDependency,
    },
    dependency::{
        Dependency, DependencyRef, DependencyRegistry, DependencyTemplate, ModuleFactory,
        ResolveData, TemplateContext,
    },
    factory::NormalModuleFactory,
    hooks::SyncHook,
    module::{ModuleGraph, ModuleId, NormalModule},
    options::BuildOptions,
    parser::scan_module,
    runtime::{RenderedModule, RuntimeTemplate},
    source::ReplaceSource,
};

#[derive(Debug, Default)]
pub struct CompilationHooks {
    /// After a module's source has been scanned.
    pub parsed: SyncHook<NormalModule>,
    /// After a module has been built, before its dependencies are resolved.
    pub succeed_module: SyncHook<NormalModule>,
}

#[derive(Debug, Clone)]
pub struct CompilationParams {
    pub normal_module_factory: Arc<NormalModuleFactory>,
}

/// A dependency that could not be resolved. Not fatal; the generated code
/// throws when the dependency is evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleWarning {
    pub resource: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencySummary {
    pub category: &'static str,
    pub request: Option<String>,
    pub resolved: Option<ModuleId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleSummary {
    pub id: ModuleId,
    pub resource: String,
    pub dependencies: Vec<DependencySummary>,
}

pub struct Compilation {
    pub options: Arc<BuildOptions>,
    pub params: CompilationParams,
    pub hooks: CompilationHooks,
    pub dependency_factories: DependencyRegistry<dyn ModuleFactory>,
    pub dependency_templates: DependencyRegistry<dyn DependencyTemplate>,
    pub module_graph: ModuleGraph,
    pub modules: Vec<NormalModule>,
    pub warnings: Vec<ModuleWarning>,
    runtime: RuntimeTemplate,
}

impl Compilation {
    pub fn new(options: Arc<BuildOptions>, params: CompilationParams) -> Self {
        let mut compilation = Self {
            options,
            params,
            hooks: CompilationHooks::default(),
            dependency_factories: DependencyRegistry::default(),
            dependency_templates: DependencyRegistry::default(),
            module_graph: ModuleGraph::default(),
            modules: Vec::new(),
            warnings: Vec::new(),
            runtime: RuntimeTemplate,
        };
        compilation.register_builtin_dependencies();
        compilation
    }

    fn register_builtin_dependencies(&mut self) {
        let factory: Arc<dyn ModuleFactory> = self.params.normal_module_factory.clone();
        self.dependency_factories
            .set::<EntryDependency>(factory.clone());
        self.dependency_factories
            .set::<CommonJsRequireDependency>(factory);

        self.dependency_templates
            .set::<CommonJsRequireDependency>(Arc::new(CommonJsRequireTemplate));
        self.dependency_templates
            .set::<ConstDependency>(Arc::new(ConstTemplate));
    }

    /// Build the module graph starting at the configured entry.
    pub fn build(&mut self) -> Result<()> {
        let entry = EntryDependency::new(self.options.entry.clone());
        let factory = self.factory_for(&entry)?;
        let entry_resource = factory
            .create(&ResolveData {
                context: self.options.context.clone(),
                request: self.options.entry.clone(),
            })
            .context("Entry module not found")?;

        let mut queue = VecDeque::new();
        self.discover(entry_resource, &mut queue);

        while let Some((id, resource)) = queue.pop_front() {
            let module = self.build_module(id, resource)?;
            self.process_dependencies(&module, &mut queue)?;
            debug_assert_eq!(module.id.0, self.modules.len());
            self.modules.push(module);
        }

        Ok(())
    }

    fn discover(&mut self, resource: PathBuf, queue: &mut VecDeque<(ModuleId, PathBuf)>) -> ModuleId {
        if let Some(id) = self.module_graph.module_for(&resource) {
            return id;
        }
        let id = ModuleId(self.module_graph.module_count());
        self.module_graph.register(resource.clone(), id);
        queue.push_back((id, resource));
        id
    }

    fn build_module(&self, id: ModuleId, resource: PathBuf) -> Result<NormalModule> {
        let mut content = fs::read_to_string(&resource)
            .with_context(|| format!("Failed to read module {}", resource.display()))?;
        // The parser drops a byte order mark, so ranges are relative to the text after it.
        if content.starts_with('\u{feff}') {
            content.remove(0);
        }

        let mut module = if resource.extension().is_some_and(|ext| ext == "json") {
            let value: serde_json::Value = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON module {}", resource.display()))?;
            NormalModule::new(id, resource, format!("module.exports = {};\n", value))
        } else {
            let scanned = scan_module(&content, &resource.to_string_lossy())?;
            let mut module = NormalModule::new(id, resource, content);
            for call in scanned.requires {
                module.add_dependency(Box::new(CommonJsRequireDependency::new(
                    call.request,
                    call.range,
                )));
            }
            module.free_identifiers = scanned.free_identifiers;
            module
        };

        self.hooks.parsed.call(&mut module)?;
        self.hooks.succeed_module.call(&mut module)?;
        Ok(module)
    }

    fn process_dependencies(
        &mut self,
        module: &NormalModule,
        queue: &mut VecDeque<(ModuleId, PathBuf)>,
    ) -> Result<()> {
        for (index, dep) in module.dependencies.iter().enumerate() {
            let Some(request) = dep.request() else {
                continue;
            };
            let factory = self.factory_for(dep.as_ref())?;
            let data = ResolveData {
                context: module.context().to_path_buf(),
                request: request.to_string(),
            };

            match factory.create(&data) {
                Ok(resource) => {
                    let target = self.discover(resource, queue);
                    self.module_graph.set_resolved(
                        DependencyRef {
                            module: module.id,
                            index,
                        },
                        target,
                    );
                }
                Err(err) => self.warnings.push(ModuleWarning {
                    resource: module.resource_str(),
                    message: format!("{:#}", err),
                }),
            }
        }
        Ok(())
    }

    fn factory_for(&self, dep: &dyn Dependency) -> Result<Arc<dyn ModuleFactory>> {
        self.dependency_factories.get(dep).cloned().ok_or_else(|| {
            anyhow!(
                "No module factory registered for {} dependency",
                dep.category()
            )
        })
    }

    /// Render every module, applying each dependency's template.
    pub fn code_generation(&self) -> Result<Vec<RenderedModule>> {
        self.modules
            .iter()
            .map(|module| {
                let mut source = ReplaceSource::new(module.source.as_str());
                for (index, dep) in module.dependencies.iter().enumerate() {
                    let template = self.dependency_templates.get(dep.as_ref()).ok_or_else(|| {
                        anyhow!(
                            "No template registered for {} dependency in {}",
                            dep.category(),
                            module.resource.display()
                        )
                    })?;
                    let ctx = TemplateContext {
                        dependency: DependencyRef {
                            module: module.id,
                            index,
                        },
                        module_graph: &self.module_graph,
                        runtime: &self.runtime,
                    };
                    template.apply(dep.as_ref(), &mut source, &ctx);
                }
                Ok(RenderedModule {
                    id: module.id,
                    resource: module.resource_str(),
                    code: source.render(),
                })
            })
            .collect()
    }

    pub fn module_summaries(&self) -> Vec<ModuleSummary> {
        self.modules
            .iter()
            .map(|module| ModuleSummary {
                id: module.id,
                resource: module.resource_str(),
                dependencies: module
                    .dependencies
                    .iter()
                    .enumerate()
                    .map(|(index, dep)| DependencySummary {
                        category: dep.category(),
                        request: dep.request().map(str::to_string),
                        resolved: self.module_graph.resolved(DependencyRef {
                            module: module.id,
                            index,
                        }),
                    })
                    .collect(),
            })
            .collect()
    }
}
