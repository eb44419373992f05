use std::fs;

use anyhow::{Context, Result};

use crate::bundler::compiler::{Compiler, Plugin};

/// Empties the output directory right before new assets are written.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanPlugin;

impl Plugin for CleanPlugin {
    fn name(&self) -> &'static str {
        "CleanPlugin"
    }

    fn apply(&self, compiler: &mut Compiler) -> Result<()> {
        compiler.hooks.emit.tap(self.name(), |assets| {
            let dir = &assets.output_path;
            if !dir.is_dir() {
                return Ok(());
            }
            for entry in fs::read_dir(dir)
                .with_context(|| format!("Failed to read output directory {}", dir.display()))?
            {
                let path = entry?.path();
                let removed = if path.is_dir() {
                    fs::remove_dir_all(&path)
                } else {
                    fs::remove_file(&path)
                };
                removed
                    .with_context(|| format!("Failed to remove stale output {}", path.display()))?;
            }
            Ok(())
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::options::BuildOptions;
    use tempfile::tempdir;

    #[test]
    fn test_removes_stale_files_before_emit() {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("dist/old")).unwrap();
        fs::write(root.join("src/index.js"), "1;\n").unwrap();
        fs::write(root.join("dist/stale.js"), "").unwrap();
        fs::write(root.join("dist/old/chunk.js"), "").unwrap();

        let compiler =
            Compiler::new(BuildOptions::with_context(root.clone()), vec![Box::new(CleanPlugin)])
                .unwrap();
        compiler.run().unwrap();

        assert!(root.join("dist/bundle.js").exists());
        assert!(!root.join("dist/stale.js").exists());
        assert!(!root.join("dist/old").exists());
    }
}
