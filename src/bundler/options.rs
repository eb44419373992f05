use std::path::PathBuf;

/// Fully resolved build options. Paths are absolute.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Base directory; the entry request is resolved from here.
    pub context: PathBuf,
    pub entry: String,
    pub output: OutputOptions,
    pub resolve: ResolveOptions,
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub path: PathBuf,
    pub filename: String,
}

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    pub modules: Vec<PathBuf>,
    pub extensions: Vec<String>,
}

impl BuildOptions {
    /// Options with the conventional layout under `context`.
    pub fn with_context(context: PathBuf) -> Self {
        Self {
            entry: "./src/index.js".to_string(),
            output: OutputOptions {
                path: context.join("dist"),
                filename: "bundle.js".to_string(),
            },
            resolve: ResolveOptions {
                modules: vec![context.clone(), context.join("node_modules")],
                extensions: vec![".js".to_string(), ".jsx".to_string()],
            },
            context,
        }
    }
}
