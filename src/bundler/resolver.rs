use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

#[derive(Debug, Clone)]
pub struct Resolver {
    /// Directories searched for bare requests, in order.
    modules: Vec<PathBuf>,
    /// Extensions tried when a request does not name an existing file.
    extensions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct PackageJson {
    main: Option<String>,
}

impl Resolver {
    pub fn new(modules: Vec<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            modules,
            extensions,
        }
    }

    /// Resolve `request` issued from the directory `context` to a canonical file path.
    pub fn resolve(&self, context: &Path, request: &str) -> Result<PathBuf> {
        let found = if Path::new(request).is_absolute() {
            self.load(Path::new(request))
        } else if is_relative_request(request) {
            self.load(&context.join(request))
        } else {
            self.modules
                .iter()
                .find_map(|dir| self.load(&dir.join(request)))
        };

        let path = found.ok_or_else(|| {
            anyhow!(
                "Module not found: Can't resolve '{}' in '{}'",
                request,
                context.display()
            )
        })?;

        path.canonicalize()
            .with_context(|| format!("Failed to canonicalize {}", path.display()))
    }

    fn load(&self, path: &Path) -> Option<PathBuf> {
        self.load_as_file(path)
            .or_else(|| self.load_as_directory(path))
    }

    fn load_as_file(&self, path: &Path) -> Option<PathBuf> {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        self.extensions.iter().find_map(|ext| {
            let mut candidate = path.as_os_str().to_os_string();
            candidate.push(ext);
            let candidate = PathBuf::from(candidate);
            candidate.is_file().then_some(candidate)
        })
    }

    fn load_as_directory(&self, dir: &Path) -> Option<PathBuf> {
        if !dir.is_dir() {
            return None;
        }

        let manifest = dir.join("package.json");
        if let Some(main) = fs::read_to_string(&manifest)
            .ok()
            .and_then(|content| serde_json::from_str::<PackageJson>(&content).ok())
            .and_then(|package| package.main)
        {
            let target = dir.join(main);
            if let Some(found) = self.load_as_file(&target) {
                return Some(found);
            }
            if target.is_dir()
                && let Some(found) = self.load_as_file(&target.join("index"))
            {
                return Some(found);
            }
        }

        self.load_as_file(&dir.join("index"))
    }
}

fn is_relative_request(request: &str) -> bool {
    request == "."
        || request == ".."
        || request.starts_with("./")
        || request.starts_with("../")
        || request.starts_with(".\\")
        || request.starts_with("..\\")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(root: &Path, path: &str, content: &str) {
        let file = root.join(path);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, content).unwrap();
    }

    fn resolver(root: &Path) -> Resolver {
        Resolver::new(
            vec![root.to_path_buf(), root.join("node_modules")],
            vec![".js".to_string(), ".jsx".to_string()],
        )
    }

    #[test]
    fn test_resolves_relative_with_extension() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        write(&root, "src/util.jsx", "");

        let resolved = resolver(&root).resolve(&root.join("src"), "./util").unwrap();
        assert_eq!(resolved, root.join("src/util.jsx"));
    }

    #[test]
    fn test_resolves_package_main() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        write(
            &root,
            "node_modules/globalize/package.json",
            r#"{ "main": "./dist/globalize.js" }"#,
        );
        write(&root, "node_modules/globalize/dist/globalize.js", "");

        let resolved = resolver(&root).resolve(&root.join("src"), "globalize").unwrap();
        assert_eq!(resolved, root.join("node_modules/globalize/dist/globalize.js"));
    }

    #[test]
    fn test_resolves_deep_bare_request() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        write(&root, "node_modules/globalize/dist/globalize-runtime.js", "");

        let resolved = resolver(&root)
            .resolve(&root, "globalize/dist/globalize-runtime")
            .unwrap();
        assert_eq!(
            resolved,
            root.join("node_modules/globalize/dist/globalize-runtime.js")
        );
    }

    #[test]
    fn test_resolves_directory_index() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        write(&root, "src/lib/index.js", "");

        let resolved = resolver(&root).resolve(&root.join("src"), "./lib").unwrap();
        assert_eq!(resolved, root.join("src/lib/index.js"));
    }

    #[test]
    fn test_missing_module_error() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();

        let err = resolver(&root).resolve(&root, "nope").unwrap_err();
        assert!(err.to_string().contains("Can't resolve 'nope'"));
    }
}
