//! CLDR plural rules.
//!
//! Rules come from `supplemental/plurals.json` (cardinal) and
//! `supplemental/ordinals.json` (ordinal), one map per locale:
//!
//! ```json
//! { "pluralRule-count-one": "i = 1 and v = 0 @integer 1",
//!   "pluralRule-count-other": " @integer 0, 2~16, 100" }
//! ```
//!
//! Each rule is parsed once and can either be evaluated here or compiled into
//! a standalone JavaScript function for the generated module.

use std::{fmt, str::FromStr};

use anyhow::{Context, Result, anyhow, bail};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            PluralCategory::Zero => "zero",
            PluralCategory::One => "one",
            PluralCategory::Two => "two",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }
}

impl FromStr for PluralCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "zero" => PluralCategory::Zero,
            "one" => PluralCategory::One,
            "two" => PluralCategory::Two,
            "few" => PluralCategory::Few,
            "many" => PluralCategory::Many,
            "other" => PluralCategory::Other,
            _ => bail!("Unknown plural category '{}'", s),
        })
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operands of a number as defined by UTS #35.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PluralOperands {
    pub n: f64,
    pub i: f64,
    pub v: f64,
    pub w: f64,
    pub f: f64,
    pub t: f64,
}

impl PluralOperands {
    fn get(&self, operand: Operand) -> f64 {
        match operand {
            Operand::N => self.n,
            Operand::I => self.i,
            Operand::V => self.v,
            Operand::W => self.w,
            Operand::F => self.f,
            Operand::T => self.t,
            Operand::C | Operand::E => 0.0,
        }
    }
}

impl FromStr for PluralOperands {
    type Err = anyhow::Error;

    /// Parse a decimal string; trailing zeros are significant (`"1.0"` has `v = 1`).
    fn from_str(s: &str) -> Result<Self> {
        let digits = s.trim().trim_start_matches('-');
        let (int, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if int.is_empty() || !int.bytes().all(|b| b.is_ascii_digit()) {
            bail!("Invalid number '{}'", s);
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            bail!("Invalid number '{}'", s);
        }
        let trimmed = frac.trim_end_matches('0');
        let parse = |part: &str| -> f64 {
            if part.is_empty() {
                0.0
            } else {
                part.parse().unwrap_or(0.0)
            }
        };

        Ok(Self {
            n: digits.parse().with_context(|| format!("Invalid number '{}'", s))?,
            i: parse(int),
            v: frac.len() as f64,
            w: trimmed.len() as f64,
            f: parse(frac),
            t: parse(trimmed),
        })
    }
}

impl From<f64> for PluralOperands {
    fn from(value: f64) -> Self {
        format!("{}", value.abs())
            .parse()
            .unwrap_or(Self {
                n: value.abs(),
                i: value.abs().trunc(),
                v: 0.0,
                w: 0.0,
                f: 0.0,
                t: 0.0,
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    N,
    I,
    V,
    W,
    F,
    T,
    C,
    E,
}

impl Operand {
    fn parse(token: &str) -> Option<Self> {
        Some(match token {
            "n" => Operand::N,
            "i" => Operand::I,
            "v" => Operand::V,
            "w" => Operand::W,
            "f" => Operand::F,
            "t" => Operand::T,
            "c" => Operand::C,
            "e" => Operand::E,
            _ => return None,
        })
    }

    fn js_name(self) -> &'static str {
        match self {
            Operand::N => "n",
            Operand::I => "i",
            Operand::V => "v",
            Operand::W => "w",
            Operand::F => "f",
            Operand::T => "t",
            Operand::C | Operand::E => "0",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Relation {
    operand: Operand,
    modulus: Option<u64>,
    negated: bool,
    /// `within` accepts non-integers inside a range; `in`/`=`/`is` do not.
    within: bool,
    ranges: Vec<(u64, u64)>,
}

impl Relation {
    fn matches(&self, operands: &PluralOperands) -> bool {
        let mut x = operands.get(self.operand);
        if let Some(m) = self.modulus {
            x %= m as f64;
        }
        let hit = self.ranges.iter().any(|&(lo, hi)| {
            if lo == hi {
                x == lo as f64
            } else {
                (self.within || x.fract() == 0.0) && x >= lo as f64 && x <= hi as f64
            }
        });
        hit != self.negated
    }

    fn to_js(&self) -> String {
        let x = match self.modulus {
            Some(m) => format!("{} % {}", self.operand.js_name(), m),
            None => self.operand.js_name().to_string(),
        };
        let tests: Vec<String> = self
            .ranges
            .iter()
            .map(|&(lo, hi)| {
                if lo == hi {
                    format!("{} === {}", x, lo)
                } else if self.within {
                    format!("{} >= {} && {} <= {}", x, lo, x, hi)
                } else {
                    format!("({}) % 1 === 0 && {} >= {} && {} <= {}", x, x, lo, x, hi)
                }
            })
            .collect();

        let joined = if tests.len() == 1 {
            tests[0].clone()
        } else {
            tests
                .iter()
                .map(|test| format!("({})", test))
                .collect::<Vec<_>>()
                .join(" || ")
        };
        if self.negated {
            format!("!({})", joined)
        } else {
            format!("({})", joined)
        }
    }
}

/// `or` of `and` groups. Empty means "always" (used by `other`).
#[derive(Debug, Clone, PartialEq, Default)]
struct Condition(Vec<Vec<Relation>>);

impl Condition {
    fn matches(&self, operands: &PluralOperands) -> bool {
        self.0.is_empty()
            || self
                .0
                .iter()
                .any(|group| group.iter().all(|relation| relation.matches(operands)))
    }

    fn to_js(&self) -> String {
        self.0
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(Relation::to_js)
                    .collect::<Vec<_>>()
                    .join(" && ")
            })
            .collect::<Vec<_>>()
            .join(" || ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PluralRules {
    rules: Vec<(PluralCategory, Condition)>,
}

impl PluralRules {
    /// Parse a locale's `pluralRule-count-*` map.
    pub fn from_cldr(rules: &Map<String, Value>) -> Result<Self> {
        let mut parsed = Vec::new();
        for (key, value) in rules {
            let Some(category) = key.strip_prefix("pluralRule-count-") else {
                continue;
            };
            let category: PluralCategory = category.parse()?;
            let text = value
                .as_str()
                .ok_or_else(|| anyhow!("Plural rule '{}' is not a string", key))?;
            let condition = parse_condition(text)
                .with_context(|| format!("Invalid plural rule '{}': \"{}\"", key, text))?;
            parsed.push((category, condition));
        }
        parsed.sort_by_key(|(category, _)| *category);
        Ok(Self { rules: parsed })
    }

    pub fn categories(&self) -> Vec<PluralCategory> {
        let mut categories: Vec<_> = self.rules.iter().map(|(category, _)| *category).collect();
        if !categories.contains(&PluralCategory::Other) {
            categories.push(PluralCategory::Other);
        }
        categories
    }

    pub fn select(&self, operands: &PluralOperands) -> PluralCategory {
        self.rules
            .iter()
            .filter(|(category, _)| *category != PluralCategory::Other)
            .find(|(_, condition)| !condition.0.is_empty() && condition.matches(operands))
            .map(|(category, _)| *category)
            .unwrap_or(PluralCategory::Other)
    }

    /// A JavaScript function expression mapping a number to its category.
    pub fn to_js(&self) -> String {
        let mut out = String::from("function (n) {\n");
        out.push_str("  var s = String(Math.abs(n)).split(\".\"), i = +s[0], f = s[1] || \"\", v = f.length, t = f.replace(/0+$/, \"\"), w = t.length;\n");
        out.push_str("  n = Math.abs(+n); f = +f; t = +t;\n");
        for (category, condition) in &self.rules {
            if *category == PluralCategory::Other || condition.0.is_empty() {
                continue;
            }
            out.push_str(&format!(
                "  if ({}) return \"{}\";\n",
                condition.to_js(),
                category
            ));
        }
        out.push_str("  return \"other\";\n}");
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Number(u64),
    Eq,
    NotEq,
    Percent,
    Comma,
    DotDot,
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(&c) = chars.peek() {
        match c {
            c if c.is_whitespace() => {
                chars.next();
            }
            'a'..='z' => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if !c.is_ascii_lowercase() {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
            '0'..='9' => {
                let mut digits = String::new();
                while let Some(&c) = chars.peek() {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    digits.push(c);
                    chars.next();
                }
                tokens.push(Token::Number(digits.parse()?));
            }
            '=' => {
                chars.next();
                tokens.push(Token::Eq);
            }
            '!' => {
                chars.next();
                if chars.next() != Some('=') {
                    bail!("Expected '=' after '!'");
                }
                tokens.push(Token::NotEq);
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '.' => {
                chars.next();
                if chars.next() != Some('.') {
                    bail!("Expected '..'");
                }
                tokens.push(Token::DotDot);
            }
            other => bail!("Unexpected character '{}'", other),
        }
    }
    Ok(tokens)
}

fn parse_condition(text: &str) -> Result<Condition> {
    // Samples (`@integer`, `@decimal`) are documentation only.
    let rule = text.split('@').next().unwrap_or_default();
    let tokens = tokenize(rule)?;
    if tokens.is_empty() {
        return Ok(Condition::default());
    }

    let mut parser = RuleParser { tokens, pos: 0 };
    let mut groups = vec![vec![parser.relation()?]];
    while let Some(token) = parser.next() {
        match token {
            Token::Word(word) if word == "and" => {
                let relation = parser.relation()?;
                if let Some(group) = groups.last_mut() {
                    group.push(relation);
                }
            }
            Token::Word(word) if word == "or" => groups.push(vec![parser.relation()?]),
            other => bail!("Unexpected {:?}", other),
        }
    }
    Ok(Condition(groups))
}

struct RuleParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl RuleParser {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn word(&mut self, expected: &str) -> bool {
        if matches!(self.peek(), Some(Token::Word(word)) if word == expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn number(&mut self) -> Result<u64> {
        match self.next() {
            Some(Token::Number(value)) => Ok(value),
            other => bail!("Expected a number, found {:?}", other),
        }
    }

    fn relation(&mut self) -> Result<Relation> {
        let operand = match self.next() {
            Some(Token::Word(word)) => {
                Operand::parse(&word).ok_or_else(|| anyhow!("Unknown operand '{}'", word))?
            }
            other => bail!("Expected an operand, found {:?}", other),
        };

        let modulus = if self.word("mod") || matches!(self.peek(), Some(Token::Percent)) {
            if matches!(self.peek(), Some(Token::Percent)) {
                self.pos += 1;
            }
            Some(self.number()?)
        } else {
            None
        };

        let (negated, within, is) = match self.next() {
            Some(Token::Eq) => (false, false, false),
            Some(Token::NotEq) => (true, false, false),
            Some(Token::Word(word)) => match word.as_str() {
                "is" => (self.word("not"), false, true),
                "in" => (false, false, false),
                "within" => (false, true, false),
                "not" => {
                    if self.word("in") {
                        (true, false, false)
                    } else if self.word("within") {
                        (true, true, false)
                    } else {
                        bail!("Expected 'in' or 'within' after 'not'");
                    }
                }
                other => bail!("Unknown relation '{}'", other),
            },
            other => bail!("Expected a relation, found {:?}", other),
        };

        let ranges = if is {
            let value = self.number()?;
            vec![(value, value)]
        } else {
            self.range_list()?
        };

        Ok(Relation {
            operand,
            modulus,
            negated,
            within,
            ranges,
        })
    }

    fn range_list(&mut self) -> Result<Vec<(u64, u64)>> {
        let mut ranges = Vec::new();
        loop {
            let lo = self.number()?;
            let hi = if matches!(self.peek(), Some(Token::DotDot)) {
                self.pos += 1;
                self.number()?
            } else {
                lo
            };
            ranges.push((lo, hi));
            if matches!(self.peek(), Some(Token::Comma)) {
                self.pos += 1;
            } else {
                return Ok(ranges);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rules(value: Value) -> PluralRules {
        PluralRules::from_cldr(value.as_object().unwrap()).unwrap()
    }

    fn english_cardinal() -> PluralRules {
        rules(json!({
            "pluralRule-count-one": "i = 1 and v = 0 @integer 1",
            "pluralRule-count-other": " @integer 0, 2~16, 100, 1000 @decimal 0.0~1.5"
        }))
    }

    fn english_ordinal() -> PluralRules {
        rules(json!({
            "pluralRule-count-one": "n % 10 = 1 and n % 100 != 11 @integer 1, 21, 31",
            "pluralRule-count-two": "n % 10 = 2 and n % 100 != 12 @integer 2, 22, 32",
            "pluralRule-count-few": "n % 10 = 3 and n % 100 != 13 @integer 3, 23, 33",
            "pluralRule-count-other": " @integer 0, 4~18, 100"
        }))
    }

    fn select(rules: &PluralRules, n: &str) -> PluralCategory {
        rules.select(&n.parse().unwrap())
    }

    #[test]
    fn test_operands() {
        let operands: PluralOperands = "1.50".parse().unwrap();
        assert_eq!(operands.n, 1.5);
        assert_eq!(operands.i, 1.0);
        assert_eq!(operands.v, 2.0);
        assert_eq!(operands.w, 1.0);
        assert_eq!(operands.f, 50.0);
        assert_eq!(operands.t, 5.0);
    }

    #[test]
    fn test_english_cardinal() {
        let rules = english_cardinal();
        assert_eq!(select(&rules, "1"), PluralCategory::One);
        assert_eq!(select(&rules, "1.0"), PluralCategory::Other);
        assert_eq!(select(&rules, "0"), PluralCategory::Other);
        assert_eq!(select(&rules, "2"), PluralCategory::Other);
    }

    #[test]
    fn test_english_ordinal() {
        let rules = english_ordinal();
        assert_eq!(select(&rules, "1"), PluralCategory::One);
        assert_eq!(select(&rules, "2"), PluralCategory::Two);
        assert_eq!(select(&rules, "23"), PluralCategory::Few);
        assert_eq!(select(&rules, "11"), PluralCategory::Other);
        assert_eq!(select(&rules, "12"), PluralCategory::Other);
        assert_eq!(select(&rules, "4"), PluralCategory::Other);
        assert_eq!(
            rules.categories(),
            vec![
                PluralCategory::One,
                PluralCategory::Two,
                PluralCategory::Few,
                PluralCategory::Other
            ]
        );
    }

    #[test]
    fn test_ranges_lists_and_or() {
        // Polish "few" and "many".
        let rules = rules(json!({
            "pluralRule-count-one": "i = 1 and v = 0",
            "pluralRule-count-few": "v = 0 and i % 10 = 2..4 and i % 100 != 12..14",
            "pluralRule-count-many": "v = 0 and i != 1 and i % 10 = 0..1 or v = 0 and i % 10 = 5..9 or v = 0 and i % 100 = 12..14",
            "pluralRule-count-other": ""
        }));
        assert_eq!(select(&rules, "1"), PluralCategory::One);
        assert_eq!(select(&rules, "3"), PluralCategory::Few);
        assert_eq!(select(&rules, "13"), PluralCategory::Many);
        assert_eq!(select(&rules, "5"), PluralCategory::Many);
        assert_eq!(select(&rules, "22"), PluralCategory::Few);
        assert_eq!(select(&rules, "1.5"), PluralCategory::Other);
    }

    #[test]
    fn test_is_not_and_within() {
        let rules = rules(json!({
            "pluralRule-count-zero": "n is 0",
            "pluralRule-count-one": "n within 0..2 and n is not 2",
            "pluralRule-count-other": ""
        }));
        assert_eq!(select(&rules, "0"), PluralCategory::Zero);
        assert_eq!(select(&rules, "1.5"), PluralCategory::One);
        assert_eq!(select(&rules, "2"), PluralCategory::Other);
    }

    #[test]
    fn test_to_js_english_cardinal() {
        let js = english_cardinal().to_js();
        assert!(js.starts_with("function (n) {\n"));
        assert!(js.contains("  if ((i === 1) && (v === 0)) return \"one\";\n"));
        assert!(js.ends_with("  return \"other\";\n}"));
    }

    #[test]
    fn test_to_js_ranges() {
        let rules = rules(json!({
            "pluralRule-count-few": "n % 10 = 3..4,9 and n % 100 != 10..19"
        }));
        let js = rules.to_js();
        assert!(js.contains(
            "if ((((n % 10) % 1 === 0 && n % 10 >= 3 && n % 10 <= 4) || (n % 10 === 9)) && !((n % 100) % 1 === 0 && n % 100 >= 10 && n % 100 <= 19)) return \"few\";"
        ));
    }

    #[test]
    fn test_invalid_rule() {
        let err = PluralRules::from_cldr(
            json!({ "pluralRule-count-one": "q = 1" }).as_object().unwrap(),
        )
        .unwrap_err();
        assert!(format!("{:#}", err).contains("Unknown operand 'q'"));
    }

    #[test]
    fn test_from_f64() {
        let operands = PluralOperands::from(-2.25);
        assert_eq!(operands.i, 2.0);
        assert_eq!(operands.v, 2.0);
        assert_eq!(operands.t, 25.0);
    }
}
