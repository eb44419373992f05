//! Compilation of extracted formatters into runtime code.
//!
//! Every formatter is rebuilt from precomputed CLDR slices through the
//! runtime's `Globalize._<method>Fn(...)` factories and stored under its
//! canonical key in `Globalize._formatters`. Entries are emitted in key order
//! and CLDR documents are merged in file name order, so identical inputs
//! always produce identical code.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Value, json};

use super::{
    cldr::CldrData,
    extract::{FormatterCall, FormatterKind, RuntimeModule},
    message::{Message, MessageRuntime},
    plural::PluralRules,
};
use crate::bundler::runtime::js_string;

const MESSAGE_HELPERS: &str = r#"var messageSelect = function (value, cases) {
  return (Object.prototype.hasOwnProperty.call(cases, value) ? cases[value] : cases.other)();
};
var messagePlural = function (value, offset, pluralFn, cases) {
  var exact = "=" + value;
  if (Object.prototype.hasOwnProperty.call(cases, exact)) return cases[exact](value - offset);
  var category = pluralFn(value - offset);
  return (Object.prototype.hasOwnProperty.call(cases, category) ? cases[category] : cases.other)(value - offset);
};"#;

const MESSAGE_RUNTIME: MessageRuntime<'static> = MessageRuntime {
    select_fn: "messageSelect",
    plural_fn: "messagePlural",
    cardinal: "plurals.cardinal",
    ordinal: "plurals.ordinal",
};

/// Generated code plus the runtime files it needs, core first.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub code: String,
    pub dependencies: Vec<RuntimeModule>,
}

/// Compile `extracts` and every entry of `messages` for `locale`.
pub fn compile_extracts(
    locale: &str,
    extracts: &[FormatterCall],
    messages: &BTreeMap<String, String>,
    cldr: &CldrData,
) -> Result<Compiled> {
    let mut calls: BTreeMap<String, FormatterCall> = BTreeMap::new();
    for call in extracts {
        calls.insert(call.key(), call.clone());
    }
    for name in messages.keys() {
        let call = FormatterCall {
            kind: FormatterKind::MessageFormatter,
            args: vec![Value::String(name.clone())],
        };
        calls.insert(call.key(), call);
    }

    let mut compiler = FormatterCompiler {
        locale,
        cldr,
        messages,
        cardinal: false,
        ordinal: false,
        has_messages: false,
    };

    let mut entries = Vec::new();
    let mut dependencies: BTreeSet<RuntimeModule> = BTreeSet::from([RuntimeModule::Core]);
    for (key, call) in &calls {
        let expr = compiler
            .compile(call)
            .with_context(|| format!("Failed to compile {}", key))?;
        dependencies.extend(call.kind.runtime_modules().iter().copied());
        entries.push(format!("formatters[{}] = {};", js_string(key), expr));
    }

    let mut lines = vec![
        format!("Globalize.locale({});", js_string(locale)),
        "var formatters = Globalize._formatters || (Globalize._formatters = {});".to_string(),
    ];

    if compiler.cardinal || compiler.ordinal {
        dependencies.insert(RuntimeModule::Plural);
        lines.push("var plurals = {};".to_string());
        if compiler.cardinal {
            lines.push(format!(
                "plurals.cardinal = {};",
                compiler.plural_rules("cardinal")?.to_js()
            ));
        }
        if compiler.ordinal {
            lines.push(format!(
                "plurals.ordinal = {};",
                compiler.plural_rules("ordinal")?.to_js()
            ));
        }
    }
    if compiler.has_messages {
        lines.push(MESSAGE_HELPERS.to_string());
    }
    lines.extend(entries);

    Ok(Compiled {
        code: lines.join("\n"),
        dependencies: dependencies.into_iter().collect(),
    })
}

struct FormatterCompiler<'a> {
    locale: &'a str,
    cldr: &'a CldrData,
    messages: &'a BTreeMap<String, String>,
    cardinal: bool,
    ordinal: bool,
    has_messages: bool,
}

impl FormatterCompiler<'_> {
    fn main(&self, path: &str) -> Result<&Value> {
        self.cldr.require(&format!("/main/{}/{}", self.locale, path))
    }

    fn plural_rules(&self, kind: &str) -> Result<PluralRules> {
        let pointer = format!("/supplemental/plurals-type-{}/{}", kind, self.locale);
        PluralRules::from_cldr(self.cldr.require_object(&pointer)?)
    }

    fn numbering_system(&self) -> Result<&str> {
        self.main("numbers/defaultNumberingSystem")?
            .as_str()
            .ok_or_else(|| anyhow!("Invalid default numbering system for '{}'", self.locale))
    }

    fn number_pattern(&self, style: &str) -> Result<Value> {
        let nu = self.numbering_system()?;
        let symbols = self.main(&format!("numbers/symbols-numberSystem-{}", nu))?;
        let pattern = self.main(&format!("numbers/{}Formats-numberSystem-{}/standard", style, nu))?;
        Ok(json!({ "symbols": symbols, "pattern": pattern }))
    }

    fn compile(&mut self, call: &FormatterCall) -> Result<String> {
        let options = Value::Object(call.options().cloned().unwrap_or_default());
        let runtime_fn = format!("Globalize.{}", call.kind.runtime_fn());

        match call.kind {
            FormatterKind::DateFormatter
            | FormatterKind::DateToPartsFormatter
            | FormatterKind::DateParser => {
                let calendar = self.main("dates/calendars/gregorian")?;
                let props = json!({ "options": options, "calendar": calendar });
                Ok(format!("{}({})", runtime_fn, props))
            }
            FormatterKind::NumberFormatter
            | FormatterKind::NumberToPartsFormatter
            | FormatterKind::NumberParser => {
                let style = option_str(&options, "style").unwrap_or("decimal");
                let mut props = self.number_pattern(style)?;
                props["options"] = options;
                Ok(format!("{}({})", runtime_fn, props))
            }
            FormatterKind::CurrencyFormatter | FormatterKind::CurrencyToPartsFormatter => {
                let code = call.string_arg()?;
                let style = match option_str(&options, "style") {
                    Some("accounting") => "accounting",
                    _ => "standard",
                };
                let nu = self.numbering_system()?;
                let mut props = self.number_pattern("decimal")?;
                props["pattern"] = self
                    .main(&format!("numbers/currencyFormats-numberSystem-{}/{}", nu, style))?
                    .clone();
                props["currency"] = self.main(&format!("numbers/currencies/{}", code))?.clone();
                props["fractions"] = self
                    .cldr
                    .get(&format!("/supplemental/currencyData/fractions/{}", code))
                    .or_else(|| self.cldr.get("/supplemental/currencyData/fractions/DEFAULT"))
                    .cloned()
                    .unwrap_or(Value::Null);
                props["code"] = Value::String(code.to_string());
                props["options"] = options;
                Ok(format!("{}({})", runtime_fn, props))
            }
            FormatterKind::PluralGenerator => {
                let kind = option_str(&options, "type").unwrap_or("cardinal");
                match kind {
                    "cardinal" => self.cardinal = true,
                    "ordinal" => self.ordinal = true,
                    other => bail!("Unknown plural type '{}'", other),
                }
                self.plural_rules(kind)?;
                Ok(format!("{}(plurals.{})", runtime_fn, kind))
            }
            FormatterKind::RelativeTimeFormatter => {
                let unit = call.string_arg()?;
                let field = match option_str(&options, "form") {
                    Some(form) if form != "long" => format!("{}-{}", unit, form),
                    _ => unit.to_string(),
                };
                self.cardinal = true;
                let mut props = self.number_pattern("decimal")?;
                props["field"] = self.main(&format!("dates/fields/{}", field))?.clone();
                props["options"] = options;
                Ok(format!("{}({}, plurals.cardinal)", runtime_fn, props))
            }
            FormatterKind::UnitFormatter => {
                let unit = call.string_arg()?;
                let form = option_str(&options, "form").unwrap_or("long");
                let units = self.main(&format!("units/{}", form))?;
                let suffix = format!("-{}", unit);
                let data = units
                    .as_object()
                    .and_then(|units| {
                        units
                            .iter()
                            .find(|(key, _)| *key == unit || key.ends_with(&suffix))
                    })
                    .map(|(_, data)| data.clone())
                    .ok_or_else(|| {
                        anyhow!(
                            "Missing locale data '/main/{}/units/{}/{}'",
                            self.locale,
                            form,
                            unit
                        )
                    })?;
                self.cardinal = true;
                let mut props = self.number_pattern("decimal")?;
                props["unit"] = data;
                props["options"] = options;
                Ok(format!("{}({}, plurals.cardinal)", runtime_fn, props))
            }
            FormatterKind::MessageFormatter => {
                let name = call.string_arg()?;
                let pattern = self
                    .messages
                    .get(name)
                    .ok_or_else(|| anyhow!("Message '{}' is not defined", name))?;
                let message = Message::parse(pattern)
                    .with_context(|| format!("Invalid message '{}'", name))?;
                self.has_messages = true;
                self.cardinal |= message.uses_plural(false);
                self.ordinal |= message.uses_plural(true);
                Ok(format!(
                    "{}({})",
                    runtime_fn,
                    message.to_js(&MESSAGE_RUNTIME)
                ))
            }
        }
    }
}

fn option_str<'a>(options: &'a Value, key: &str) -> Option<&'a str> {
    options.get(key).and_then(Value::as_str)
}
