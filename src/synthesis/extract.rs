//! Formatter extraction from call signatures.
//!
//! A signature is the JavaScript expression the application evaluates at
//! runtime, e.g. `Globalize.currencyFormatter("USD", {style: "code"})(69900)`.
//! Only the formatter factory call matters: its method name selects the
//! formatter kind and its literal arguments become the formatter options.

use std::{fmt, sync::Arc};

use anyhow::{Result, anyhow, bail};
use serde_json::{Map, Number, Value};
use swc_common::{FileName, Globals, SourceMap};
use swc_ecma_ast::{CallExpr, Callee, Expr, Lit, MemberProp, Prop, PropName, PropOrSpread, UnaryOp};
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax};

/// Runtime pieces of the formatting library, in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuntimeModule {
    Core,
    Number,
    Plural,
    Currency,
    Date,
    Message,
    RelativeTime,
    Unit,
}

impl RuntimeModule {
    /// File name relative to the library's `dist` directory.
    pub fn file_name(self) -> &'static str {
        match self {
            RuntimeModule::Core => "globalize-runtime.js",
            RuntimeModule::Number => "globalize-runtime/number.js",
            RuntimeModule::Plural => "globalize-runtime/plural.js",
            RuntimeModule::Currency => "globalize-runtime/currency.js",
            RuntimeModule::Date => "globalize-runtime/date.js",
            RuntimeModule::Message => "globalize-runtime/message.js",
            RuntimeModule::RelativeTime => "globalize-runtime/relative-time.js",
            RuntimeModule::Unit => "globalize-runtime/unit.js",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatterKind {
    DateFormatter,
    DateToPartsFormatter,
    DateParser,
    NumberFormatter,
    NumberToPartsFormatter,
    NumberParser,
    CurrencyFormatter,
    CurrencyToPartsFormatter,
    PluralGenerator,
    RelativeTimeFormatter,
    UnitFormatter,
    MessageFormatter,
}

impl FormatterKind {
    pub const ALL: [FormatterKind; 12] = [
        FormatterKind::DateFormatter,
        FormatterKind::DateToPartsFormatter,
        FormatterKind::DateParser,
        FormatterKind::NumberFormatter,
        FormatterKind::NumberToPartsFormatter,
        FormatterKind::NumberParser,
        FormatterKind::CurrencyFormatter,
        FormatterKind::CurrencyToPartsFormatter,
        FormatterKind::PluralGenerator,
        FormatterKind::RelativeTimeFormatter,
        FormatterKind::UnitFormatter,
        FormatterKind::MessageFormatter,
    ];

    pub fn method(self) -> &'static str {
        match self {
            FormatterKind::DateFormatter => "dateFormatter",
            FormatterKind::DateToPartsFormatter => "dateToPartsFormatter",
            FormatterKind::DateParser => "dateParser",
            FormatterKind::NumberFormatter => "numberFormatter",
            FormatterKind::NumberToPartsFormatter => "numberToPartsFormatter",
            FormatterKind::NumberParser => "numberParser",
            FormatterKind::CurrencyFormatter => "currencyFormatter",
            FormatterKind::CurrencyToPartsFormatter => "currencyToPartsFormatter",
            FormatterKind::PluralGenerator => "pluralGenerator",
            FormatterKind::RelativeTimeFormatter => "relativeTimeFormatter",
            FormatterKind::UnitFormatter => "unitFormatter",
            FormatterKind::MessageFormatter => "messageFormatter",
        }
    }

    pub fn from_method(method: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.method() == method)
    }

    /// Name of the runtime factory that rebuilds this formatter from
    /// precomputed properties.
    pub fn runtime_fn(self) -> String {
        format!("_{}Fn", self.method())
    }

    pub fn runtime_modules(self) -> &'static [RuntimeModule] {
        use RuntimeModule::*;
        match self {
            FormatterKind::DateFormatter
            | FormatterKind::DateToPartsFormatter
            | FormatterKind::DateParser => &[Core, Number, Date],
            FormatterKind::NumberFormatter
            | FormatterKind::NumberToPartsFormatter
            | FormatterKind::NumberParser => &[Core, Number],
            FormatterKind::CurrencyFormatter | FormatterKind::CurrencyToPartsFormatter => {
                &[Core, Number, Currency]
            }
            FormatterKind::PluralGenerator => &[Core, Plural],
            FormatterKind::RelativeTimeFormatter => &[Core, Number, Plural, RelativeTime],
            FormatterKind::UnitFormatter => &[Core, Number, Plural, Unit],
            FormatterKind::MessageFormatter => &[Core, Message],
        }
    }
}

impl fmt::Display for FormatterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method())
    }
}

/// A formatter factory call with literal arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatterCall {
    pub kind: FormatterKind,
    pub args: Vec<Value>,
}

impl FormatterCall {
    /// Canonical key, stable across runs: `method(arg,arg)` with JSON args.
    pub fn key(&self) -> String {
        let args: Vec<String> = self.args.iter().map(Value::to_string).collect();
        format!("{}({})", self.kind.method(), args.join(","))
    }

    /// First argument as a string, for kinds that take a name first.
    pub fn string_arg(&self) -> Result<&str> {
        self.args
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("{} expects a string as its first argument", self.kind))
    }

    /// The options object, wherever it appears in the arguments.
    pub fn options(&self) -> Option<&Map<String, Value>> {
        self.args.iter().find_map(Value::as_object)
    }
}

/// Parse `signature` and extract the formatter factory call in it.
pub fn extract(signature: &str) -> Result<FormatterCall> {
    use swc_common::GLOBALS;

    GLOBALS.set(&Globals::new(), || {
        let source_map = Arc::new(SourceMap::default());
        let source_file =
            source_map.new_source_file(FileName::Anon.into(), signature.to_string());
        let mut parser = Parser::new(
            Syntax::Es(EsSyntax::default()),
            StringInput::from(&*source_file),
            None,
        );
        let expr = parser
            .parse_expr()
            .map_err(|e| anyhow!("Invalid formatter signature `{}`: {:?}", signature, e))?;

        let call = find_factory_call(&expr)
            .ok_or_else(|| anyhow!("No formatter call found in `{}`", signature))?;
        let (method, args) = call;
        let kind = FormatterKind::from_method(method)
            .ok_or_else(|| anyhow!("Unknown formatter `{}` in `{}`", method, signature))?;

        let args = args
            .iter()
            .map(|arg| {
                if arg.spread.is_some() {
                    bail!("Spread arguments are not supported in `{}`", signature);
                }
                literal_to_json(&arg.expr)
                    .map_err(|e| anyhow!("{} in `{}`", e, signature))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FormatterCall { kind, args })
    })
}

/// Find `<object>.<method>(args)`, looking through curried calls such as
/// `Globalize.x(opts)(value)`.
fn find_factory_call(expr: &Expr) -> Option<(&str, &[swc_ecma_ast::ExprOrSpread])> {
    match expr {
        Expr::Paren(paren) => find_factory_call(&paren.expr),
        Expr::Call(call) => factory_of(call),
        _ => None,
    }
}

fn factory_of(call: &CallExpr) -> Option<(&str, &[swc_ecma_ast::ExprOrSpread])> {
    let Callee::Expr(callee) = &call.callee else {
        return None;
    };
    match &**callee {
        Expr::Member(member) => match &member.prop {
            MemberProp::Ident(ident) => Some((ident.sym.as_str(), &call.args)),
            _ => None,
        },
        other => find_factory_call(other),
    }
}

fn literal_to_json(expr: &Expr) -> Result<Value> {
    match expr {
        Expr::Paren(paren) => literal_to_json(&paren.expr),
        Expr::Lit(Lit::Str(s)) => Ok(Value::String(s.value.to_string_lossy().to_string())),
        Expr::Lit(Lit::Num(n)) => number(n.value),
        Expr::Lit(Lit::Bool(b)) => Ok(Value::Bool(b.value)),
        Expr::Lit(Lit::Null(_)) => Ok(Value::Null),
        Expr::Unary(unary) if unary.op == UnaryOp::Minus => match &*unary.arg {
            Expr::Lit(Lit::Num(n)) => number(-n.value),
            _ => bail!("Unsupported negation"),
        },
        Expr::Array(array) => array
            .elems
            .iter()
            .map(|elem| match elem {
                Some(elem) if elem.spread.is_none() => literal_to_json(&elem.expr),
                _ => bail!("Unsupported array element"),
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        Expr::Object(object) => {
            let mut map = Map::new();
            for prop in &object.props {
                let PropOrSpread::Prop(prop) = prop else {
                    bail!("Unsupported object spread");
                };
                let Prop::KeyValue(kv) = &**prop else {
                    bail!("Only `key: value` properties are supported");
                };
                let key = match &kv.key {
                    PropName::Ident(ident) => ident.sym.to_string(),
                    PropName::Str(s) => s.value.to_string_lossy().to_string(),
                    PropName::Num(n) => n.value.to_string(),
                    _ => bail!("Unsupported property key"),
                };
                map.insert(key, literal_to_json(&kv.value)?);
            }
            Ok(Value::Object(map))
        }
        _ => bail!("Only literal arguments are supported"),
    }
}

fn number(value: f64) -> Result<Value> {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return Ok(Value::Number(Number::from(value as i64)));
    }
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| anyhow!("Non-finite number"))
}
