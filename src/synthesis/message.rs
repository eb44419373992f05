//! ICU MessageFormat subset.
//!
//! Supported syntax:
//!
//! - literal text, with `''` for a quote and `'{...}'` for quoted literals
//! - `{name}` simple arguments
//! - `{name, select, key {...} other {...}}`
//! - `{name, plural, offset:1 =0 {...} one {...} other {...}}` and
//!   `selectordinal`, with `#` for the (offset) number inside a case
//!
//! A parsed [`Message`] is compiled to a JavaScript function taking the
//! argument object. It can also be formatted natively, which is what the
//! tests rely on to pin down the semantics.

use anyhow::{Result, anyhow, bail};
use serde_json::{Map, Value};

use super::plural::{PluralCategory, PluralRules};
use crate::bundler::runtime::js_string;

#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(String),
    Argument(String),
    /// `#` inside a plural case.
    Pound,
    Select {
        arg: String,
        cases: Vec<(String, Vec<Part>)>,
    },
    Plural {
        arg: String,
        ordinal: bool,
        offset: u64,
        cases: Vec<(PluralKey, Vec<Part>)>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PluralKey {
    Exact(u64),
    Category(PluralCategory),
}

impl PluralKey {
    fn js_key(&self) -> String {
        match self {
            PluralKey::Exact(value) => format!("={}", value),
            PluralKey::Category(category) => category.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    parts: Vec<Part>,
}

/// Names of the runtime helpers and plural functions the compiled code uses.
#[derive(Debug, Clone)]
pub struct MessageRuntime<'a> {
    pub select_fn: &'a str,
    pub plural_fn: &'a str,
    pub cardinal: &'a str,
    pub ordinal: &'a str,
}

impl Message {
    pub fn parse(pattern: &str) -> Result<Self> {
        let mut parser = MessageParser {
            chars: pattern.chars().collect(),
            pos: 0,
        };
        let parts = parser.parts(false, false)?;
        if parser.pos < parser.chars.len() {
            bail!("Unexpected '}}' at offset {}", parser.pos);
        }
        Ok(Self { parts })
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Whether any plural (`ordinal = false`) or selectordinal (`true`) is used.
    pub fn uses_plural(&self, ordinal: bool) -> bool {
        fn walk(parts: &[Part], ordinal: bool) -> bool {
            parts.iter().any(|part| match part {
                Part::Select { cases, .. } => cases.iter().any(|(_, parts)| walk(parts, ordinal)),
                Part::Plural {
                    ordinal: o, cases, ..
                } => *o == ordinal || cases.iter().any(|(_, parts)| walk(parts, ordinal)),
                _ => false,
            })
        }
        walk(&self.parts, ordinal)
    }

    /// `function (d) { return ...; }`
    pub fn to_js(&self, runtime: &MessageRuntime<'_>) -> String {
        format!(
            "function (d) {{ return {}; }}",
            concat_js(&self.parts, runtime)
        )
    }

    pub fn format(
        &self,
        args: &Map<String, Value>,
        cardinal: &PluralRules,
        ordinal: &PluralRules,
    ) -> Result<String> {
        let mut out = String::new();
        format_parts(&self.parts, args, cardinal, ordinal, None, &mut out)?;
        Ok(out)
    }
}

fn concat_js(parts: &[Part], runtime: &MessageRuntime<'_>) -> String {
    let pieces: Vec<String> = parts.iter().map(|part| part_js(part, runtime)).collect();
    match parts.first() {
        None => "\"\"".to_string(),
        Some(Part::Text(_)) => pieces.join(" + "),
        Some(_) => format!("\"\" + {}", pieces.join(" + ")),
    }
}

fn part_js(part: &Part, runtime: &MessageRuntime<'_>) -> String {
    match part {
        Part::Text(text) => js_string(text),
        Part::Argument(name) => format!("d[{}]", js_string(name)),
        Part::Pound => "p".to_string(),
        Part::Select { arg, cases } => {
            let cases: Vec<String> = cases
                .iter()
                .map(|(key, parts)| {
                    format!(
                        "{}: function () {{ return {}; }}",
                        js_string(key),
                        concat_js(parts, runtime)
                    )
                })
                .collect();
            format!(
                "{}(d[{}], {{ {} }})",
                runtime.select_fn,
                js_string(arg),
                cases.join(", ")
            )
        }
        Part::Plural {
            arg,
            ordinal,
            offset,
            cases,
        } => {
            let cases: Vec<String> = cases
                .iter()
                .map(|(key, parts)| {
                    format!(
                        "{}: function (p) {{ return {}; }}",
                        js_string(&key.js_key()),
                        concat_js(parts, runtime)
                    )
                })
                .collect();
            let rules = if *ordinal {
                runtime.ordinal
            } else {
                runtime.cardinal
            };
            format!(
                "{}(d[{}], {}, {}, {{ {} }})",
                runtime.plural_fn,
                js_string(arg),
                offset,
                rules,
                cases.join(", ")
            )
        }
    }
}

fn format_parts(
    parts: &[Part],
    args: &Map<String, Value>,
    cardinal: &PluralRules,
    ordinal: &PluralRules,
    pound: Option<f64>,
    out: &mut String,
) -> Result<()> {
    for part in parts {
        match part {
            Part::Text(text) => out.push_str(text),
            Part::Argument(name) => out.push_str(&display(argument(args, name)?)),
            Part::Pound => match pound {
                Some(value) => out.push_str(&format!("{}", value)),
                None => out.push('#'),
            },
            Part::Select { arg, cases } => {
                let value = display(argument(args, arg)?);
                let case = cases
                    .iter()
                    .find(|(key, _)| *key == value)
                    .or_else(|| cases.iter().find(|(key, _)| key == "other"))
                    .ok_or_else(|| anyhow!("No case for '{}' in select '{}'", value, arg))?;
                format_parts(&case.1, args, cardinal, ordinal, pound, out)?;
            }
            Part::Plural {
                arg,
                ordinal: is_ordinal,
                offset,
                cases,
            } => {
                let value = argument(args, arg)?
                    .as_f64()
                    .ok_or_else(|| anyhow!("Plural argument '{}' is not a number", arg))?;
                let shifted = value - *offset as f64;
                let rules = if *is_ordinal { ordinal } else { cardinal };
                let category = rules.select(&shifted.into());

                let case = cases
                    .iter()
                    .find(|(key, _)| matches!(key, PluralKey::Exact(exact) if *exact as f64 == value))
                    .or_else(|| {
                        cases
                            .iter()
                            .find(|(key, _)| *key == PluralKey::Category(category))
                    })
                    .or_else(|| {
                        cases
                            .iter()
                            .find(|(key, _)| *key == PluralKey::Category(PluralCategory::Other))
                    })
                    .ok_or_else(|| anyhow!("No case for {} in plural '{}'", value, arg))?;
                format_parts(&case.1, args, cardinal, ordinal, Some(shifted), out)?;
            }
        }
    }
    Ok(())
}

fn argument<'a>(args: &'a Map<String, Value>, name: &str) -> Result<&'a Value> {
    args.get(name)
        .ok_or_else(|| anyhow!("Missing message argument '{}'", name))
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

struct MessageParser {
    chars: Vec<char>,
    pos: usize,
}

impl MessageParser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.pos += 1;
                Ok(())
            }
            Some(c) => bail!("Expected '{}' but found '{}' at offset {}", expected, c, self.pos),
            None => bail!("Expected '{}' but reached the end of the message", expected),
        }
    }

    fn word(&mut self) -> String {
        self.skip_whitespace();
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| !c.is_whitespace() && !matches!(c, '{' | '}' | ','))
        {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Parse text and arguments until an unmatched `}` or the end.
    fn parts(&mut self, nested: bool, in_plural: bool) -> Result<Vec<Part>> {
        let mut parts = Vec::new();
        let mut text = String::new();

        while let Some(c) = self.peek() {
            match c {
                '{' => {
                    if !text.is_empty() {
                        parts.push(Part::Text(std::mem::take(&mut text)));
                    }
                    self.pos += 1;
                    parts.push(self.argument(in_plural)?);
                }
                '}' => {
                    if nested {
                        break;
                    }
                    bail!("Unexpected '}}' at offset {}", self.pos);
                }
                '#' if in_plural => {
                    if !text.is_empty() {
                        parts.push(Part::Text(std::mem::take(&mut text)));
                    }
                    self.pos += 1;
                    parts.push(Part::Pound);
                }
                '\'' => {
                    self.pos += 1;
                    self.quoted(&mut text, in_plural);
                }
                _ => {
                    text.push(c);
                    self.pos += 1;
                }
            }
        }

        if !text.is_empty() {
            parts.push(Part::Text(text));
        }
        Ok(parts)
    }

    /// Called after an apostrophe.
    fn quoted(&mut self, text: &mut String, in_plural: bool) {
        match self.peek() {
            Some('\'') => {
                text.push('\'');
                self.pos += 1;
            }
            Some(c) if matches!(c, '{' | '}') || (c == '#' && in_plural) => {
                while let Some(c) = self.peek() {
                    self.pos += 1;
                    if c == '\'' {
                        if self.peek() == Some('\'') {
                            text.push('\'');
                            self.pos += 1;
                            continue;
                        }
                        return;
                    }
                    text.push(c);
                }
            }
            _ => text.push('\''),
        }
    }

    fn argument(&mut self, in_plural: bool) -> Result<Part> {
        let name = self.word();
        if name.is_empty() {
            bail!("Missing argument name at offset {}", self.pos);
        }
        self.skip_whitespace();

        match self.peek() {
            Some('}') => {
                self.pos += 1;
                return Ok(Part::Argument(name));
            }
            Some(',') => self.pos += 1,
            _ => bail!("Unclosed argument '{}'", name),
        }

        let kind = self.word();
        self.expect(',')?;
        let part = match kind.as_str() {
            "select" => Part::Select {
                cases: self.select_cases(&name, in_plural)?,
                arg: name,
            },
            "plural" | "selectordinal" => {
                let offset = self.offset()?;
                Part::Plural {
                    cases: self.plural_cases(&name)?,
                    arg: name,
                    ordinal: kind == "selectordinal",
                    offset,
                }
            }
            other => bail!("Unsupported argument type '{}' for '{}'", other, name),
        };
        self.expect('}')?;
        Ok(part)
    }

    fn offset(&mut self) -> Result<u64> {
        self.skip_whitespace();
        let rest: String = self.chars[self.pos..].iter().take(7).collect();
        if rest != "offset:" {
            return Ok(0);
        }
        self.pos += 7;
        let value = self.word();
        value
            .parse()
            .map_err(|_| anyhow!("Invalid plural offset '{}'", value))
    }

    fn case_body(&mut self, in_plural: bool) -> Result<Vec<Part>> {
        self.expect('{')?;
        let parts = self.parts(true, in_plural)?;
        self.expect('}')?;
        Ok(parts)
    }

    fn select_cases(&mut self, arg: &str, in_plural: bool) -> Result<Vec<(String, Vec<Part>)>> {
        let mut cases = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('}') | None => break,
                _ => {}
            }
            let key = self.word();
            if key.is_empty() {
                bail!("Missing case key in select '{}'", arg);
            }
            cases.push((key, self.case_body(in_plural)?));
        }
        if !cases.iter().any(|(key, _)| key == "other") {
            bail!("Select '{}' has no 'other' case", arg);
        }
        Ok(cases)
    }

    fn plural_cases(&mut self, arg: &str) -> Result<Vec<(PluralKey, Vec<Part>)>> {
        let mut cases = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('}') | None => break,
                _ => {}
            }
            let key = self.word();
            let key = match key.strip_prefix('=') {
                Some(value) => PluralKey::Exact(
                    value
                        .parse()
                        .map_err(|_| anyhow!("Invalid exact case '{}' in plural '{}'", key, arg))?,
                ),
                None => PluralKey::Category(key.parse()?),
            };
            cases.push((key, self.case_body(true)?));
        }
        if !cases
            .iter()
            .any(|(key, _)| *key == PluralKey::Category(PluralCategory::Other))
        {
            bail!("Plural '{}' has no 'other' case", arg);
        }
        Ok(cases)
    }
}
