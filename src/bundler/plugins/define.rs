use std::{collections::BTreeMap, sync::Arc};

use anyhow::Result;

use crate::bundler::{
    compiler::{Compiler, Plugin},
    dependencies::ConstDependency,
};

/// Replaces free identifiers with code fixed at build time.
///
/// Values are inserted verbatim, so a string constant must already be
/// quoted (`"\"en\""`), and JSON data can be passed as serialized JSON.
#[derive(Debug, Clone, Default)]
pub struct DefinePlugin {
    definitions: Arc<BTreeMap<String, String>>,
}

impl DefinePlugin {
    pub fn new(definitions: BTreeMap<String, String>) -> Self {
        Self {
            definitions: Arc::new(definitions),
        }
    }
}

impl Plugin for DefinePlugin {
    fn name(&self) -> &'static str {
        "DefinePlugin"
    }

    fn apply(&self, compiler: &mut Compiler) -> Result<()> {
        let definitions = self.definitions.clone();
        compiler.hooks.compilation.tap(self.name(), move |compilation| {
            let definitions = definitions.clone();
            compilation.hooks.parsed.tap("DefinePlugin", move |module| {
                let constants: Vec<ConstDependency> = module
                    .free_identifiers
                    .iter()
                    .filter_map(|ident| {
                        let code = definitions.get(&ident.name)?;
                        let code = if ident.shorthand {
                            format!("{}: {}", ident.name, code)
                        } else {
                            code.clone()
                        };
                        Some(ConstDependency::new(code, ident.range.clone()))
                    })
                    .collect();
                for constant in constants {
                    module.add_dependency(Box::new(constant));
                }
                Ok(())
            });
            Ok(())
        });
        Ok(())
    }
}
