use std::{
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Ok, Result};
use insta_cmd::get_cargo_bin;
use serde_json::{Value, json};
use tempfile::TempDir;

mod build;
mod init;

const BIN_NAME: &str = "intlpack";

pub struct CliTest {
    _temp_dir: TempDir,
    project_dir: PathBuf,
}

impl CliTest {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().canonicalize()?;
        fs::create_dir_all(project_dir.join(".git"))?;
        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
        })
    }

    /// A project shaped like a real one: an entry module using Globalize,
    /// the library with its runtime-only build, and a small CLDR tree.
    pub fn with_globalize_project() -> Result<Self> {
        let test = Self::new()?;
        test.write_file("src/index.js", ENTRY)?;

        test.write_file(
            "node_modules/globalize/package.json",
            r#"{ "name": "globalize", "main": "dist/globalize.js" }"#,
        )?;
        test.write_file(
            "node_modules/globalize/dist/globalize.js",
            "module.exports = { full: true };\n",
        )?;
        test.write_file(
            "node_modules/globalize/dist/globalize-runtime.js",
            "module.exports = { runtime: true, locale: function () {} };\n",
        )?;
        for piece in [
            "number",
            "plural",
            "currency",
            "date",
            "message",
            "relative-time",
            "unit",
        ] {
            test.write_file(
                &format!("node_modules/globalize/dist/globalize-runtime/{}.js", piece),
                &format!("require('../globalize-runtime');\n// {}\n", piece),
            )?;
        }

        for (path, value) in cldr_files() {
            test.write_json(&format!("node_modules/cldr-data/{}", path), &value)?;
        }
        Ok(test)
    }

    pub fn write_file(&self, path: &str, content: &str) -> Result<()> {
        let file_path = self.project_dir.join(path);

        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory:{}", parent.display()))?;
        }

        fs::write(&file_path, content)
            .with_context(|| format!("Failed to write file: {}", file_path.display()))?;

        Ok(())
    }

    pub fn write_json(&self, path: &str, value: &Value) -> Result<()> {
        self.write_file(path, &serde_json::to_string_pretty(value)?)
    }

    pub fn root(&self) -> &Path {
        &self.project_dir
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(get_cargo_bin(BIN_NAME));
        cmd.current_dir(&self.project_dir);
        cmd.env_clear();
        cmd.env("NO_COLOR", "1"); // Disable colors for consistent test output
        cmd
    }

    pub fn build_command(&self) -> Command {
        let mut cmd = self.command();
        cmd.arg("build");
        cmd
    }

    pub fn read_file(&self, path: &str) -> Result<String> {
        let file_path = self.project_dir.join(path);
        fs::read_to_string(&file_path)
            .with_context(|| format!("Failed to read file: {}", file_path.display()))
    }
}

const ENTRY: &str = r#"const Globalize = require('globalize');

Globalize.locale('en');

const cldrData = __CLDR_DATA__;
if (cldrData) {
	Globalize.load(cldrData);
}

[
	Globalize.numberFormatter({maximumFractionDigits: 5})(Math.PI),
	Globalize.pluralGenerator({type: "ordinal"})(2)
].forEach(value => console.log(value));
"#;

fn cldr_files() -> Vec<(&'static str, Value)> {
    vec![
        (
            "main/en/ca-gregorian.json",
            json!({"main": {"en": {"dates": {"calendars": {"gregorian": {
                "dateFormats": {"medium": "MMM d, y"},
                "timeFormats": {"medium": "h:mm:ss a"},
                "dateTimeFormats": {"medium": "{1}, {0}", "availableFormats": {"GyMMMd": "MMM d, y G"}}
            }}}}}}),
        ),
        (
            "main/en/currencies.json",
            json!({"main": {"en": {"numbers": {"currencies": {
                "USD": {"displayName": "US Dollar", "symbol": "$"}
            }}}}}),
        ),
        (
            "main/en/dateFields.json",
            json!({"main": {"en": {"dates": {"fields": {
                "month": {
                    "displayName": "month",
                    "relative-type-0": "this month",
                    "relativeTime-type-future": {"relativeTimePattern-count-one": "in {0} month", "relativeTimePattern-count-other": "in {0} months"}
                }
            }}}}}),
        ),
        (
            "main/en/numbers.json",
            json!({"main": {"en": {"numbers": {
                "defaultNumberingSystem": "latn",
                "symbols-numberSystem-latn": {"decimal": ".", "group": ",", "percentSign": "%"},
                "decimalFormats-numberSystem-latn": {"standard": "#,##0.###"},
                "percentFormats-numberSystem-latn": {"standard": "#,##0%"},
                "currencyFormats-numberSystem-latn": {"standard": "¤#,##0.00"}
            }}}}),
        ),
        (
            "main/en/timeZoneNames.json",
            json!({"main": {"en": {"dates": {"timeZoneNames": {"gmtFormat": "GMT{0}"}}}}}),
        ),
        (
            "main/en/units.json",
            json!({"main": {"en": {"units": {"narrow": {
                "duration-second": {"unitPattern-count-other": "{0}s"}
            }}}}}),
        ),
        (
            "supplemental/currencyData.json",
            json!({"supplemental": {"currencyData": {"fractions": {"DEFAULT": {"_digits": "2", "_rounding": "0"}}}}}),
        ),
        (
            "supplemental/likelySubtags.json",
            json!({"supplemental": {"likelySubtags": {"en": "en-Latn-US"}}}),
        ),
        (
            "supplemental/numberingSystems.json",
            json!({"supplemental": {"numberingSystems": {"latn": {"_digits": "0123456789", "_type": "numeric"}}}}),
        ),
        (
            "supplemental/ordinals.json",
            json!({"supplemental": {"plurals-type-ordinal": {"en": {
                "pluralRule-count-few": "n % 10 = 3 and n % 100 != 13",
                "pluralRule-count-one": "n % 10 = 1 and n % 100 != 11",
                "pluralRule-count-two": "n % 10 = 2 and n % 100 != 12",
                "pluralRule-count-other": ""
            }}}}),
        ),
        (
            "supplemental/plurals.json",
            json!({"supplemental": {"plurals-type-cardinal": {"en": {
                "pluralRule-count-one": "i = 1 and v = 0 @integer 1",
                "pluralRule-count-other": " @integer 0, 2~16, 100, 1000"
            }}}}),
        ),
        (
            "supplemental/timeData.json",
            json!({"supplemental": {"timeData": {"001": {"_allowed": "H h", "_preferred": "H"}}}}),
        ),
        (
            "supplemental/weekData.json",
            json!({"supplemental": {"weekData": {"firstDay": {"001": "mon"}}}}),
        ),
    ]
}
