//! Textual contract of the bundle runtime.
//!
//! Every piece of generated code that refers to the runtime goes through
//! [`RuntimeTemplate`], so quoting and statement termination live in one
//! place.

use super::module::ModuleId;

pub const REQUIRE_FN: &str = "__intlpack_require__";

#[derive(Debug, Clone, Default)]
pub struct RuntimeTemplate;

/// JSON quoting is a valid JavaScript string literal.
pub fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

impl RuntimeTemplate {
    pub fn module_id(&self, id: ModuleId) -> String {
        serde_json::Value::from(id.0).to_string()
    }

    /// `__intlpack_require__(<id>)`
    pub fn require_call(&self, id: ModuleId) -> String {
        format!("{}({})", REQUIRE_FN, self.module_id(id))
    }

    /// An expression that throws `MODULE_NOT_FOUND` when evaluated.
    pub fn missing_module(&self, request: &str) -> String {
        let message = format!("Cannot find module '{}'", request);
        format!(
            "!(function intlpackMissingModule() {{ var e = new Error({}); e.code = 'MODULE_NOT_FOUND'; throw e; }}())",
            js_string(&message)
        )
    }

    /// Require expression for a dependency, or the missing-module marker.
    pub fn module_expression(&self, resolved: Option<ModuleId>, request: &str) -> String {
        match resolved {
            Some(id) => self.require_call(id),
            None => self.missing_module(request),
        }
    }
}

/// A module's generated code, ready to be placed into the bundle.
#[derive(Debug, Clone)]
pub struct RenderedModule {
    pub id: ModuleId,
    pub resource: String,
    pub code: String,
}

/// Wrap rendered modules into a self-executing bundle that runs module `0`.
pub fn render_bundle(modules: &[RenderedModule]) -> String {
    let mut out = String::new();
    out.push_str("(function (modules) {\n");
    out.push_str("  var installedModules = {};\n");
    out.push_str(&format!("  function {}(moduleId) {{\n", REQUIRE_FN));
    out.push_str("    if (installedModules[moduleId]) {\n");
    out.push_str("      return installedModules[moduleId].exports;\n");
    out.push_str("    }\n");
    out.push_str("    var module = (installedModules[moduleId] = { id: moduleId, exports: {} });\n");
    out.push_str(&format!(
        "    modules[moduleId].call(module.exports, module, module.exports, {});\n",
        REQUIRE_FN
    ));
    out.push_str("    return module.exports;\n");
    out.push_str("  }\n");
    out.push_str(&format!("  return {}(0);\n", REQUIRE_FN));
    out.push_str("})([\n");

    for (position, module) in modules.iter().enumerate() {
        if position > 0 {
            out.push_str(",\n");
        }
        out.push_str(&format!(
            "/* {} {} */\nfunction (module, exports, {}) {{\n",
            module.id,
            module.resource.replace("*/", "*\\/"),
            REQUIRE_FN
        ));
        out.push_str(&module.code);
        if !module.code.ends_with('\n') {
            out.push('\n');
        }
        out.push('}');
    }

    out.push_str("\n]);\n");
    out
}
