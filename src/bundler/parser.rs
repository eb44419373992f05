//! JavaScript module scanning.
//!
//! The host does not transform code. It only needs two things from the AST:
//! the `require("...")` calls with literal requests, and identifiers used as
//! expressions that no enclosing scope binds (candidates for compile-time
//! constant substitution). Both are reported with byte ranges
//! into the original source.

use std::{collections::HashSet, ops::Range, sync::Arc};

use anyhow::{Result, anyhow};
use swc_common::{BytePos, FileName, Globals, SourceMap, Span};
use swc_ecma_ast::{
    ArrowExpr, AssignTargetPat, BindingIdent, BlockStmt, CallExpr, Callee, CatchClause, ClassDecl, ClassExpr,
    Constructor, Expr, FnDecl, FnExpr, ForInStmt, ForOfStmt, ForStmt, Function, GetterProp, Ident,
    ImportDefaultSpecifier, ImportNamedSpecifier, ImportStarAsSpecifier, Lit, Prop,
    SetterProp, SimpleAssignTarget, VarDecl, VarDeclKind,
};
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax};
use swc_ecma_visit::{Visit, VisitWith};

use super::module::FreeIdentifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequireCall {
    pub request: String,
    /// Range of the whole `require(...)` call expression.
    pub range: Range<usize>,
}

#[derive(Debug, Default)]
pub struct ScannedModule {
    pub requires: Vec<RequireCall>,
    pub free_identifiers: Vec<FreeIdentifier>,
}

/// Parse `code` and collect its requires and free identifiers.
pub fn scan_module(code: &str, file_path: &str) -> Result<ScannedModule> {
    use swc_common::GLOBALS;

    GLOBALS.set(&Globals::new(), || {
        let source_map = Arc::new(SourceMap::default());
        let source_file = source_map
            .new_source_file(FileName::Real(file_path.into()).into(), code.to_string());

        let syntax = Syntax::Es(EsSyntax {
            jsx: true,
            ..Default::default()
        });
        let mut parser = Parser::new(syntax, StringInput::from(&*source_file), None);

        let program = parser
            .parse_program()
            .map_err(|e| anyhow!("Failed to parse {}: {:?}", file_path, e))?;

        let mut scanner = ModuleScanner::new(source_file.start_pos);
        program.visit_with(&mut scanner);
        Ok(scanner.finish())
    })
}

/// A lexical scope. Function scopes also receive hoisted `var` bindings.
struct Scope {
    parent: Option<usize>,
    function: bool,
    bindings: HashSet<String>,
}

struct Use {
    ident: FreeIdentifier,
    scope: usize,
}

struct ModuleScanner {
    start_pos: BytePos,
    requires: Vec<RequireCall>,
    scopes: Vec<Scope>,
    current: usize,
    /// Scope receiving bindings while inside a `var` declarator.
    hoist_to: Option<usize>,
    /// Inside a destructuring assignment target, where identifiers are not declared.
    assigning: bool,
    uses: Vec<Use>,
}

impl ModuleScanner {
    fn new(start_pos: BytePos) -> Self {
        Self {
            start_pos,
            requires: Vec::new(),
            scopes: vec![Scope {
                parent: None,
                function: true,
                bindings: HashSet::new(),
            }],
            current: 0,
            hoist_to: None,
            assigning: false,
            uses: Vec::new(),
        }
    }

    fn range(&self, span: Span) -> Range<usize> {
        let lo = span.lo.0.saturating_sub(self.start_pos.0) as usize;
        let hi = span.hi.0.saturating_sub(self.start_pos.0) as usize;
        lo..hi
    }

    fn in_scope(&mut self, function: bool, visit: impl FnOnce(&mut Self)) {
        self.scopes.push(Scope {
            parent: Some(self.current),
            function,
            bindings: HashSet::new(),
        });
        let outer = std::mem::replace(&mut self.current, self.scopes.len() - 1);
        let hoist_to = if function { self.hoist_to.take() } else { self.hoist_to };
        let assigning = std::mem::take(&mut self.assigning);
        visit(self);
        self.current = outer;
        self.hoist_to = hoist_to;
        self.assigning = assigning;
    }

    fn function_scope(&self) -> usize {
        let mut scope = self.current;
        while !self.scopes[scope].function {
            match self.scopes[scope].parent {
                Some(parent) => scope = parent,
                None => break,
            }
        }
        scope
    }

    fn bind(&mut self, name: &str) {
        let scope = self.hoist_to.unwrap_or(self.current);
        self.scopes[scope].bindings.insert(name.to_string());
    }

    fn record_use(&mut self, ident: &Ident, shorthand: bool) {
        self.uses.push(Use {
            ident: FreeIdentifier {
                name: ident.sym.to_string(),
                range: self.range(ident.span),
                shorthand,
            },
            scope: self.current,
        });
    }

    /// Bindings are resolved once the whole module is seen, so a use before
    /// its hoisted declaration is still bound.
    fn is_bound(&self, name: &str, mut scope: usize) -> bool {
        loop {
            if self.scopes[scope].bindings.contains(name) {
                return true;
            }
            match self.scopes[scope].parent {
                Some(parent) => scope = parent,
                None => return false,
            }
        }
    }

    fn finish(self) -> ScannedModule {
        let free_identifiers = self
            .uses
            .iter()
            .filter(|u| !self.is_bound(&u.ident.name, u.scope))
            .map(|u| u.ident.clone())
            .collect();
        ScannedModule {
            requires: self.requires,
            free_identifiers,
        }
    }
}

impl Visit for ModuleScanner {
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if let Callee::Expr(callee) = &node.callee
            && let Expr::Ident(ident) = &**callee
            && ident.sym.as_str() == "require"
            && node.args.len() == 1
            && node.args[0].spread.is_none()
            && let Expr::Lit(Lit::Str(s)) = &*node.args[0].expr
            && let Some(request) = s.value.as_str()
        {
            self.requires.push(RequireCall {
                request: request.to_string(),
                range: self.range(node.span),
            });
            return;
        }
        node.visit_children_with(self);
    }

    fn visit_expr(&mut self, node: &Expr) {
        if let Expr::Ident(ident) = node {
            self.record_use(ident, false);
        }
        node.visit_children_with(self);
    }

    fn visit_prop(&mut self, node: &Prop) {
        if let Prop::Shorthand(ident) = node {
            self.record_use(ident, true);
        }
        node.visit_children_with(self);
    }

    // `x = 1` neither binds nor reads `x`.
    fn visit_simple_assign_target(&mut self, node: &SimpleAssignTarget) {
        if !matches!(node, SimpleAssignTarget::Ident(_)) {
            node.visit_children_with(self);
        }
    }

    fn visit_assign_target_pat(&mut self, node: &AssignTargetPat) {
        let assigning = std::mem::replace(&mut self.assigning, true);
        node.visit_children_with(self);
        self.assigning = assigning;
    }

    fn visit_binding_ident(&mut self, node: &BindingIdent) {
        if !self.assigning {
            self.bind(&node.id.sym);
        }
        node.visit_children_with(self);
    }

    fn visit_var_decl(&mut self, node: &VarDecl) {
        if node.kind == VarDeclKind::Var {
            let hoist_to = self.hoist_to.replace(self.function_scope());
            node.visit_children_with(self);
            self.hoist_to = hoist_to;
        } else {
            node.visit_children_with(self);
        }
    }

    fn visit_fn_decl(&mut self, node: &FnDecl) {
        self.bind(&node.ident.sym);
        node.function.visit_with(self);
    }

    fn visit_fn_expr(&mut self, node: &FnExpr) {
        self.in_scope(true, |scanner| {
            if let Some(ident) = &node.ident {
                scanner.bind(&ident.sym);
            }
            node.function.visit_with(scanner);
        });
    }

    fn visit_class_decl(&mut self, node: &ClassDecl) {
        self.bind(&node.ident.sym);
        node.class.visit_with(self);
    }

    fn visit_class_expr(&mut self, node: &ClassExpr) {
        self.in_scope(false, |scanner| {
            if let Some(ident) = &node.ident {
                scanner.bind(&ident.sym);
            }
            node.class.visit_with(scanner);
        });
    }

    fn visit_import_named_specifier(&mut self, node: &ImportNamedSpecifier) {
        self.bind(&node.local.sym);
    }

    fn visit_import_default_specifier(&mut self, node: &ImportDefaultSpecifier) {
        self.bind(&node.local.sym);
    }

    fn visit_import_star_as_specifier(&mut self, node: &ImportStarAsSpecifier) {
        self.bind(&node.local.sym);
    }

    fn visit_function(&mut self, node: &Function) {
        self.in_scope(true, |scanner| node.visit_children_with(scanner));
    }

    fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
        self.in_scope(true, |scanner| node.visit_children_with(scanner));
    }

    fn visit_constructor(&mut self, node: &Constructor) {
        self.in_scope(true, |scanner| node.visit_children_with(scanner));
    }

    fn visit_getter_prop(&mut self, node: &GetterProp) {
        self.in_scope(true, |scanner| node.visit_children_with(scanner));
    }

    fn visit_setter_prop(&mut self, node: &SetterProp) {
        self.in_scope(true, |scanner| node.visit_children_with(scanner));
    }

    fn visit_block_stmt(&mut self, node: &BlockStmt) {
        self.in_scope(false, |scanner| node.visit_children_with(scanner));
    }

    fn visit_catch_clause(&mut self, node: &CatchClause) {
        self.in_scope(false, |scanner| node.visit_children_with(scanner));
    }

    fn visit_for_stmt(&mut self, node: &ForStmt) {
        self.in_scope(false, |scanner| node.visit_children_with(scanner));
    }

    fn visit_for_in_stmt(&mut self, node: &ForInStmt) {
        self.in_scope(false, |scanner| node.visit_children_with(scanner));
    }

    fn visit_for_of_stmt(&mut self, node: &ForOfStmt) {
        self.in_scope(false, |scanner| node.visit_children_with(scanner));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_collects_literal_requires_with_ranges() {
        let code = "const G = require('globalize');\nrequire(\"./side-effect\");\n";
        let scanned = scan_module(code, "index.js").unwrap();

        let requests: Vec<_> = scanned
            .requires
            .iter()
            .map(|call| call.request.as_str())
            .collect();
        assert_eq!(requests, vec!["globalize", "./side-effect"]);

        let first = &scanned.requires[0];
        assert_eq!(&code[first.range.clone()], "require('globalize')");
    }

    #[test]
    fn test_ignores_dynamic_requires() {
        let code = "const name = 'x';\nrequire(name);\nrequire('a', 'b');\n";
        let scanned = scan_module(code, "index.js").unwrap();
        assert!(scanned.requires.is_empty());
    }

    #[test]
    fn test_free_identifiers_exclude_bindings() {
        let code = "const cldrData = __CLDR_DATA__;\nif (cldrData) { load(cldrData); }\nfunction load(x) { return x; }\n";
        let scanned = scan_module(code, "index.js").unwrap();

        let names: Vec<_> = scanned
            .free_identifiers
            .iter()
            .map(|ident| ident.name.as_str())
            .collect();
        assert_eq!(names, vec!["__CLDR_DATA__"]);

        let ident = &scanned.free_identifiers[0];
        assert_eq!(&code[ident.range.clone()], "__CLDR_DATA__");
    }

    fn free_names(code: &str) -> Vec<String> {
        scan_module(code, "index.js")
            .unwrap()
            .free_identifiers
            .into_iter()
            .map(|ident| ident.name)
            .collect()
    }

    #[test]
    fn test_shadowing_is_scoped() {
        let code = "function f() { const D = 2; return D; }\nconst d = D;\n";
        let scanned = scan_module(code, "index.js").unwrap();

        assert_eq!(scanned.free_identifiers.len(), 1);
        let ident = &scanned.free_identifiers[0];
        assert_eq!(ident.name, "D");
        assert_eq!(ident.range.start, code.rfind('D').unwrap());
    }

    #[test]
    fn test_var_hoists_to_function_scope() {
        let code = "function f() { if (x) { var D = 1; } return D; }\nD;\n";
        assert_eq!(free_names(code), vec!["x", "D"]);

        let code = "{ let D = 1; }\nD;\n";
        assert_eq!(free_names(code), vec!["D"]);
    }

    #[test]
    fn test_parameters_and_catch_bindings() {
        let code = "const g = (D) => D;\ntry { run(); } catch (E) { log(E); }\n";
        assert_eq!(free_names(code), vec!["run", "log"]);
    }

    #[test]
    fn test_assignment_does_not_bind() {
        let code = "D = 1;\n[E] = [2];\nuse(D, E);\n";
        assert_eq!(free_names(code), vec!["use", "D", "E"]);
    }

    #[test]
    fn test_shorthand_property_is_marked() {
        let code = "const o = { D, e: D };\n";
        let scanned = scan_module(code, "index.js").unwrap();

        let found: Vec<_> = scanned
            .free_identifiers
            .iter()
            .map(|ident| (ident.name.as_str(), ident.shorthand, &code[ident.range.clone()]))
            .collect();
        assert_eq!(found, vec![("D", true, "D"), ("D", false, "D")]);
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = scan_module("const = ;", "broken.js").unwrap_err();
        assert!(err.to_string().contains("broken.js"));
    }
}
