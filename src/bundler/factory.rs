use std::path::PathBuf;

use anyhow::Result;

use super::{
    dependency::{ModuleFactory, ResolveData},
    hooks::SyncHook,
    resolver::Resolver,
};

#[derive(Debug, Default)]
pub struct NormalModuleFactoryHooks {
    /// Fired before resolution; taps may rewrite the request.
    pub before_resolve: SyncHook<ResolveData>,
}

/// Resolves requests of ordinary module dependencies.
#[derive(Debug)]
pub struct NormalModuleFactory {
    pub hooks: NormalModuleFactoryHooks,
    resolver: Resolver,
}

impl NormalModuleFactory {
    pub fn new(resolver: Resolver) -> Self {
        Self {
            hooks: NormalModuleFactoryHooks::default(),
            resolver,
        }
    }
}

impl ModuleFactory for NormalModuleFactory {
    fn create(&self, data: &ResolveData) -> Result<PathBuf> {
        let mut data = data.clone();
        self.hooks.before_resolve.call(&mut data)?;
        self.resolver.resolve(&data.context, &data.request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_before_resolve_can_redirect() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::write(root.join("real.js"), "").unwrap();

        let mut factory = NormalModuleFactory::new(Resolver::new(vec![], vec![".js".into()]));
        factory.hooks.before_resolve.tap("Redirect", |data| {
            data.request = "./real".to_string();
            Ok(())
        });

        let resolved = factory
            .create(&ResolveData {
                context: root.clone(),
                request: "./virtual".to_string(),
            })
            .unwrap();
        assert_eq!(resolved, root.join("real.js"));
    }
}
