use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use anyhow::{Context, Result, bail};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{
    bundler::{BuildOptions, OutputOptions, ResolveOptions},
    inject::{DEFAULT_REQUEST, DEFAULT_RUNTIME_REQUEST, DEFAULT_TARGET},
};

pub const CONFIG_FILE_NAME: &str = ".intlpackrc.json";

static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap());

const RESERVED_WORDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield",
];

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_entry")]
    pub entry: String,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub resolve: ResolveConfig,
    /// Empty the output directory before writing the bundle.
    #[serde(default = "default_clean")]
    pub clean: bool,
    #[serde(default)]
    pub define: DefineConfig,
    #[serde(default)]
    pub globalize: GlobalizeConfig,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: String,
    #[serde(default = "default_output_filename")]
    pub filename: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveConfig {
    #[serde(default = "default_resolve_modules")]
    pub modules: Vec<String>,
    #[serde(default = "default_resolve_extensions")]
    pub extensions: Vec<String>,
}

/// Standard mode: the identifier replaced with merged CLDR data.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefineConfig {
    #[serde(default = "default_define_key")]
    pub key: String,
    #[serde(default = "default_cldr_files")]
    pub cldr_files: Vec<String>,
}

/// Globalize mode: build-time formatter compilation.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalizeConfig {
    #[serde(default = "default_locale")]
    pub default_locale: String,
    #[serde(default = "default_cldr_root")]
    pub cldr_root: String,
    #[serde(default = "default_runtime_dist")]
    pub runtime_dist: String,
    /// Resource pattern of the module that receives the formatters.
    #[serde(default = "default_target")]
    pub target: String,
    /// Request pattern redirected to the runtime-only build.
    #[serde(default = "default_request")]
    pub request: String,
    #[serde(default = "default_runtime_request")]
    pub runtime_request: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<String>,
    #[serde(default = "default_formatters")]
    pub formatters: Vec<String>,
    #[serde(default = "default_messages")]
    pub messages: BTreeMap<String, String>,
}

fn default_entry() -> String {
    "./src/index.js".to_string()
}

fn default_output_path() -> String {
    "dist".to_string()
}

fn default_output_filename() -> String {
    "bundle.js".to_string()
}

fn default_resolve_modules() -> Vec<String> {
    [".", "node_modules"].map(String::from).to_vec()
}

fn default_resolve_extensions() -> Vec<String> {
    [".js", ".jsx"].map(String::from).to_vec()
}

fn default_clean() -> bool {
    true
}

fn default_define_key() -> String {
    "__CLDR_DATA__".to_string()
}

fn default_cldr_files() -> Vec<String> {
    [
        "main/en/ca-gregorian.json",
        "main/en/currencies.json",
        "main/en/dateFields.json",
        "main/en/numbers.json",
        "main/en/timeZoneNames.json",
        "main/en/units.json",
        "supplemental/currencyData.json",
        "supplemental/likelySubtags.json",
        "supplemental/numberingSystems.json",
        "supplemental/ordinals.json",
        "supplemental/plurals.json",
        "supplemental/timeData.json",
        "supplemental/weekData.json",
    ]
    .map(|file| format!("node_modules/cldr-data/{}", file))
    .to_vec()
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_cldr_root() -> String {
    "node_modules/cldr-data".to_string()
}

fn default_runtime_dist() -> String {
    "node_modules/globalize/dist".to_string()
}

fn default_target() -> String {
    DEFAULT_TARGET.to_string()
}

fn default_request() -> String {
    DEFAULT_REQUEST.to_string()
}

fn default_runtime_request() -> String {
    DEFAULT_RUNTIME_REQUEST.to_string()
}

fn default_formatters() -> Vec<String> {
    [
        r#"Globalize.dateFormatter({datetime: "medium"})(new Date())"#,
        r#"Globalize.dateToPartsFormatter()(new Date())"#,
        r#"Globalize.dateParser({skeleton: "GyMMMd"})("Nov 30, 2010 AD")"#,
        r#"Globalize.numberFormatter({maximumFractionDigits: 5})(Math.PI)"#,
        r#"Globalize.numberParser({style: "percent"})("50%")"#,
        r#"Globalize.currencyFormatter("USD", {style: "code"})(69900)"#,
        r#"Globalize.pluralGenerator({type: "ordinal"})(2)"#,
        r#"Globalize.relativeTimeFormatter("month")(3)"#,
        r#"Globalize.unitFormatter("second", {form: "narrow"})(10)"#,
    ]
    .map(String::from)
    .to_vec()
}

fn default_messages() -> BTreeMap<String, String> {
    let guest_info = [
        "{gender, select,",
        "  female {{guestCount, plural, offset:1",
        "    =0 {{host} does not host a party.}",
        "    =1 {{host} invites {guest} to her party.}",
        "    =2 {{host} invites {guest} and one other person to her party.}",
        "    other {{host} invites {guest} and # other people to her party.}}}",
        "  male {{guestCount, plural, offset:1",
        "    =0 {{host} does not host a party.}",
        "    =1 {{host} invites {guest} to his party.}",
        "    =2 {{host} invites {guest} and one other person to his party.}",
        "    other {{host} invites {guest} and # other people to his party.}}}",
        "  other {{guestCount, plural, offset:1",
        "    =0 {{host} does not host a party.}",
        "    =1 {{host} invites {guest} to their party.}",
        "    =2 {{host} invites {guest} and one other person to their party.}",
        "    other {{host} invites {guest} and # other people to their party.}}}}",
    ]
    .join("\n");

    BTreeMap::from([
        (
            "simpleGuestInfo".to_string(),
            "{host} invites {guest} to a party.".to_string(),
        ),
        ("guestInfo".to_string(), guest_info),
    ])
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            filename: default_output_filename(),
        }
    }
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            modules: default_resolve_modules(),
            extensions: default_resolve_extensions(),
        }
    }
}

impl Default for DefineConfig {
    fn default() -> Self {
        Self {
            key: default_define_key(),
            cldr_files: default_cldr_files(),
        }
    }
}

impl Default for GlobalizeConfig {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
            cldr_root: default_cldr_root(),
            runtime_dist: default_runtime_dist(),
            target: default_target(),
            request: default_request(),
            runtime_request: default_runtime_request(),
            variable: None,
            formatters: default_formatters(),
            messages: default_messages(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            entry: default_entry(),
            output: OutputConfig::default(),
            resolve: ResolveConfig::default(),
            clean: default_clean(),
            define: DefineConfig::default(),
            globalize: GlobalizeConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Patterns must compile and formatter signatures must not be blank.
    pub fn validate(&self) -> Result<()> {
        if self.entry.trim().is_empty() {
            bail!("'entry' must not be empty");
        }

        for pattern in &self.define.cldr_files {
            Pattern::new(pattern).with_context(|| {
                format!("Invalid glob pattern in 'define.cldrFiles': \"{}\"", pattern)
            })?;
        }

        Regex::new(&self.globalize.target).with_context(|| {
            format!("Invalid regex in 'globalize.target': \"{}\"", self.globalize.target)
        })?;
        Regex::new(&self.globalize.request).with_context(|| {
            format!("Invalid regex in 'globalize.request': \"{}\"", self.globalize.request)
        })?;

        if let Some(variable) = &self.globalize.variable
            && (!IDENTIFIER_REGEX.is_match(variable) || RESERVED_WORDS.contains(&variable.as_str()))
        {
            bail!(
                "'globalize.variable' must be a JavaScript identifier: \"{}\"",
                variable
            );
        }

        if self
            .globalize
            .formatters
            .iter()
            .any(|signature| signature.trim().is_empty())
        {
            bail!("Empty formatter signature in 'globalize.formatters'");
        }

        Ok(())
    }

    /// Bundler options with every path resolved against `base_dir`.
    pub fn build_options(&self, base_dir: &Path) -> BuildOptions {
        BuildOptions {
            context: base_dir.to_path_buf(),
            entry: self.entry.clone(),
            output: OutputOptions {
                path: base_dir.join(&self.output.path),
                filename: self.output.filename.clone(),
            },
            resolve: ResolveOptions {
                modules: self
                    .resolve
                    .modules
                    .iter()
                    .map(|dir| normalize(base_dir.join(dir)))
                    .collect(),
                extensions: self.resolve.extensions.clone(),
            },
        }
    }
}

/// Drop `.` components so `<base>/.` compares equal to `<base>`.
fn normalize(path: PathBuf) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, std::path::Component::CurDir))
        .collect()
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// Directory relative paths in the config are resolved against: the
    /// config file's directory, or the start directory when using defaults.
    pub base_dir: PathBuf,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => load_config_file(&path),
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            base_dir: start_dir.to_path_buf(),
            from_file: false,
        }),
    }
}

pub fn load_config_file(path: &Path) -> Result<ConfigLoadResult> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;
    config.validate()?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(ConfigLoadResult {
        config,
        base_dir,
        from_file: true,
    })
}
