//! Build-time compilation of Globalize formatters.
//!
//! The pipeline is pure: formatter signatures are [`extract`]ed, compiled
//! against CLDR data for the default locale together with the message
//! templates, then wrapped by a [`ModuleTemplate`]. Nothing is written to
//! disk here; persisting the result is the caller's job.

pub mod cldr;
pub mod compile;
pub mod extract;
pub mod message;
pub mod plural;
pub mod template;

use std::{collections::BTreeMap, path::PathBuf};

use anyhow::{Context, Result};

pub use cldr::CldrData;
pub use compile::{Compiled, compile_extracts};
pub use extract::{FormatterCall, FormatterKind, RuntimeModule, extract};
pub use template::{ModuleTemplate, RuntimeRequireTemplate};

/// Produces the source text of the generated formatter module.
pub trait Synthesize {
    fn synthesize(&self) -> Result<String>;
}

pub struct GlobalizeSynthesizer {
    default_locale: String,
    cldr_root: PathBuf,
    signatures: Vec<String>,
    messages: BTreeMap<String, String>,
    template: Box<dyn ModuleTemplate>,
}

impl GlobalizeSynthesizer {
    pub fn new(
        default_locale: impl Into<String>,
        cldr_root: impl Into<PathBuf>,
        template: Box<dyn ModuleTemplate>,
    ) -> Self {
        Self {
            default_locale: default_locale.into(),
            cldr_root: cldr_root.into(),
            signatures: Vec::new(),
            messages: BTreeMap::new(),
            template,
        }
    }

    pub fn with_signatures(mut self, signatures: Vec<String>) -> Self {
        self.signatures = signatures;
        self
    }

    pub fn with_messages(mut self, messages: BTreeMap<String, String>) -> Self {
        self.messages = messages;
        self
    }
}

impl Synthesize for GlobalizeSynthesizer {
    fn synthesize(&self) -> Result<String> {
        let extracts = self
            .signatures
            .iter()
            .map(|signature| extract(signature))
            .collect::<Result<Vec<_>>>()?;
        let cldr = CldrData::for_locale(&self.cldr_root, &self.default_locale)?;
        let compiled = compile_extracts(&self.default_locale, &extracts, &self.messages, &cldr)
            .with_context(|| format!("Failed to compile formatters for '{}'", self.default_locale))?;
        Ok(self.template.render(&compiled))
    }
}
