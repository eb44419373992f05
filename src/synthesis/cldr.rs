//! CLDR JSON loading.
//!
//! The `cldr-data` package lays out one JSON document per topic, each rooted
//! at its full path (`{"main": {"en": {"numbers": ...}}}`). Documents are
//! deep-merged into a single tree, so lookups use JSON pointers such as
//! `/main/en/numbers` or `/supplemental/plurals-type-cardinal/en`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow, bail};
use glob::glob;
use serde_json::{Map, Value};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq)]
pub struct CldrData {
    root: Value,
}

impl Default for CldrData {
    fn default() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }
}

impl CldrData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything under `<root>/supplemental` plus `<root>/main/<locale>`.
    pub fn for_locale(root: &Path, locale: &str) -> Result<Self> {
        let mut data = Self::new();
        data.load_dir(&root.join("supplemental"))?;
        data.load_dir(&root.join("main").join(locale))
            .with_context(|| format!("Missing locale data for '{}'", locale))?;
        Ok(data)
    }

    /// Load the files matching `patterns`, relative to `base`, in order.
    pub fn from_patterns(base: &Path, patterns: &[String]) -> Result<Self> {
        let mut data = Self::new();
        for pattern in patterns {
            for path in expand(base, pattern)? {
                data.load_file(&path)?;
            }
        }
        Ok(data)
    }

    /// Recursively load every `.json` file in `dir`, in file name order.
    pub fn load_dir(&mut self, dir: &Path) -> Result<()> {
        if !dir.is_dir() {
            bail!("CLDR directory not found: {}", dir.display());
        }
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
                self.load_file(path)?;
            }
        }
        Ok(())
    }

    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read CLDR file: {}", path.display()))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse CLDR file: {}", path.display()))?;
        self.merge(value);
        Ok(())
    }

    /// Deep-merge `source` into the tree. Objects merge key by key, arrays
    /// index by index, anything else overwrites.
    pub fn merge(&mut self, source: Value) {
        merge_value(&mut self.root, source);
    }

    pub fn get(&self, pointer: &str) -> Option<&Value> {
        self.root.pointer(pointer)
    }

    pub fn require(&self, pointer: &str) -> Result<&Value> {
        self.get(pointer)
            .ok_or_else(|| anyhow!("Missing locale data '{}'", pointer))
    }

    /// Like [`CldrData::require`], for data that must be an object.
    pub fn require_object(&self, pointer: &str) -> Result<&Map<String, Value>> {
        self.require(pointer)?
            .as_object()
            .ok_or_else(|| anyhow!("Locale data '{}' is not an object", pointer))
    }

    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn to_json(&self) -> String {
        self.root.to_string()
    }
}

fn merge_value(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(target), Value::Array(source)) => {
            for (index, value) in source.into_iter().enumerate() {
                match target.get_mut(index) {
                    Some(existing) => merge_value(existing, value),
                    None => target.push(value),
                }
            }
        }
        (target, source) => *target = source,
    }
}

fn expand(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = base.join(pattern);
    let full = full.to_string_lossy();
    let mut paths = glob(&full)
        .with_context(|| format!("Invalid CLDR file pattern '{}'", pattern))?
        .collect::<Result<Vec<_>, _>>()?;
    if paths.is_empty() {
        bail!("No CLDR files match '{}'", pattern);
    }
    paths.sort();
    Ok(paths)
}
