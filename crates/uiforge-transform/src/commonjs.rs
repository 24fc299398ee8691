//! Lowering of ES module syntax to CommonJS.
//!
//! Works on plain JavaScript (JSX and types already removed). Only top-level
//! module declarations are rewritten; everything else is copied through by
//! span, so the printed code is never re-formatted.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BindingPatternKind, Declaration, ExportAllDeclaration, ExportDefaultDeclaration,
    ExportDefaultDeclarationKind, ExportNamedDeclaration, ImportDeclaration,
    ImportDeclarationSpecifier, ModuleExportName, Statement,
};
use oxc_parser::Parser;
use oxc_span::{GetSpan, SourceType, Span};

use crate::traits::{CompiledUnit, TransformError};

/// Prefix for the variables holding required modules.
const MODULE_BINDING_PREFIX: &str = "__uiforge_m";

/// Rewrite `import`/`export` declarations into `require` calls and `exports`
/// assignments.
///
/// Imports are hoisted to the top of the unit, matching module semantics.
pub fn lower_modules(source: &str) -> Result<CompiledUnit, TransformError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::mjs()).parse();

    if !ret.errors.is_empty() {
        return Err(TransformError::Parse(join_diagnostics(&ret.errors)));
    }

    let mut lowering = Lowering::new(source);

    for stmt in ret.program.body.iter() {
        match stmt {
            Statement::ImportDeclaration(decl) => lowering.import(decl),
            Statement::ExportDefaultDeclaration(decl) => lowering.export_default(decl),
            Statement::ExportNamedDeclaration(decl) => lowering.export_named(decl)?,
            Statement::ExportAllDeclaration(decl) => lowering.export_all(decl),
            _ => {}
        }
    }

    Ok(lowering.finish())
}

/// Join parser diagnostics into one message.
pub(crate) fn join_diagnostics<E: std::fmt::Display>(errors: &[E]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Accumulates the rewritten unit.
struct Lowering<'s> {
    source: &'s str,
    /// Hoisted `require` bindings
    prologue: String,
    body: String,
    /// Byte offset up to which `source` has been copied into `body`
    cursor: usize,
    /// (specifier, binding) for each required module
    modules: Vec<(String, String)>,
    exports: Vec<String>,
}

impl<'s> Lowering<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            prologue: String::new(),
            body: String::with_capacity(source.len() + 256),
            cursor: 0,
            modules: Vec::new(),
            exports: Vec::new(),
        }
    }

    fn text(&self, span: Span) -> &'s str {
        &self.source[span.start as usize..span.end as usize]
    }

    /// Replace the statement at `span` with `replacement`.
    fn replace(&mut self, span: Span, replacement: &str) {
        let start = span.start as usize;
        self.body.push_str(&self.source[self.cursor..start]);
        self.body.push_str(replacement);
        self.cursor = span.end as usize;
    }

    /// Binding for a required module, emitting the `require` on first use.
    fn require(&mut self, specifier: &str) -> String {
        if let Some((_, binding)) = self.modules.iter().find(|(s, _)| s == specifier) {
            return binding.clone();
        }

        let binding = format!("{}{}", MODULE_BINDING_PREFIX, self.modules.len());
        self.prologue.push_str(&format!(
            "var {} = require({});\n",
            binding,
            string_literal(specifier)
        ));
        self.modules.push((specifier.to_string(), binding.clone()));
        binding
    }

    fn record_export(&mut self, name: &str) {
        if !self.exports.iter().any(|e| e == name) {
            self.exports.push(name.to_string());
        }
    }

    fn import(&mut self, decl: &ImportDeclaration<'_>) {
        let module = self.require(decl.source.value.as_str());

        if let Some(specifiers) = &decl.specifiers {
            for specifier in specifiers.iter() {
                let line = match specifier {
                    ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => format!(
                        "var {local} = {m} == null ? {m} : {m}.__esModule ? {m}.default : {m};\n",
                        local = s.local.name.as_str(),
                        m = module,
                    ),
                    ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                        format!("var {} = {};\n", s.local.name.as_str(), module)
                    }
                    ImportDeclarationSpecifier::ImportSpecifier(s) => format!(
                        "var {local} = {m} == null ? undefined : {access};\n",
                        local = s.local.name.as_str(),
                        m = module,
                        access = member(&module, &export_name(&s.imported)),
                    ),
                };
                self.prologue.push_str(&line);
            }
        }

        self.replace(decl.span, "");
    }

    fn export_default(&mut self, decl: &ExportDefaultDeclaration<'_>) {
        let replacement = match &decl.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(func) => match &func.id {
                Some(id) => format!(
                    "{}\nexports.default = {};",
                    self.text(func.span),
                    id.name.as_str()
                ),
                None => format!("exports.default = {};", self.text(func.span)),
            },
            ExportDefaultDeclarationKind::ClassDeclaration(class) => match &class.id {
                Some(id) => format!(
                    "{}\nexports.default = {};",
                    self.text(class.span),
                    id.name.as_str()
                ),
                None => format!("exports.default = {};", self.text(class.span)),
            },
            expression => {
                let start = expression.span().start;
                let text = self.text(Span::new(start, decl.span.end)).trim_end();
                if text.ends_with(';') {
                    format!("exports.default = {}", text)
                } else {
                    format!("exports.default = {};", text)
                }
            }
        };

        self.record_export("default");
        self.replace(decl.span, &replacement);
    }

    fn export_named(&mut self, decl: &ExportNamedDeclaration<'_>) -> Result<(), TransformError> {
        let mut replacement = String::new();

        if let Some(declaration) = &decl.declaration {
            let names = declared_names(declaration)?;
            let text = self.text(declaration.span()).trim_end();
            replacement.push_str(text);
            if !text.ends_with(';') && !text.ends_with('}') {
                replacement.push(';');
            }
            for name in names {
                replacement.push_str(&format!("\n{} = {};", member("exports", &name), name));
                self.record_export(&name);
            }
        }

        let origin = decl
            .source
            .as_ref()
            .map(|source| self.require(source.value.as_str()));

        for specifier in decl.specifiers.iter() {
            let local = export_name(&specifier.local);
            let exported = export_name(&specifier.exported);
            let value = match &origin {
                Some(module) => member(module, &local),
                None => local,
            };
            replacement.push_str(&format!("\n{} = {};", member("exports", &exported), value));
            self.record_export(&exported);
        }

        self.replace(decl.span, replacement.trim_start());
        Ok(())
    }

    fn export_all(&mut self, decl: &ExportAllDeclaration<'_>) {
        let module = self.require(decl.source.value.as_str());

        let replacement = match &decl.exported {
            Some(name) => {
                let name = export_name(name);
                let line = format!("{} = {};", member("exports", &name), module);
                self.record_export(&name);
                line
            }
            None => format!(
                "Object.keys({m} || {{}}).forEach(function (k) {{ if (k !== \"default\" && !(k in exports)) exports[k] = {m}[k]; }});",
                m = module
            ),
        };

        self.replace(decl.span, &replacement);
    }

    fn finish(mut self) -> CompiledUnit {
        self.body.push_str(&self.source[self.cursor..]);

        let mut code = self.prologue;
        code.push_str(&self.body);

        CompiledUnit {
            code,
            imports: self.modules.into_iter().map(|(s, _)| s).collect(),
            exports: self.exports,
        }
    }
}

/// Identifiers bound by an exported declaration.
fn declared_names(declaration: &Declaration<'_>) -> Result<Vec<String>, TransformError> {
    match declaration {
        Declaration::VariableDeclaration(var) => var
            .declarations
            .iter()
            .map(|declarator| match &declarator.id.kind {
                BindingPatternKind::BindingIdentifier(ident) => Ok(ident.name.to_string()),
                _ => Err(TransformError::Unsupported(
                    "destructuring in an exported declaration".to_string(),
                )),
            })
            .collect(),
        Declaration::FunctionDeclaration(func) => {
            Ok(func.id.iter().map(|id| id.name.to_string()).collect())
        }
        Declaration::ClassDeclaration(class) => {
            Ok(class.id.iter().map(|id| id.name.to_string()).collect())
        }
        // Type-only declarations have been stripped by this point.
        _ => Ok(Vec::new()),
    }
}

fn export_name(name: &ModuleExportName<'_>) -> String {
    match name {
        ModuleExportName::IdentifierName(ident) => ident.name.to_string(),
        ModuleExportName::IdentifierReference(ident) => ident.name.to_string(),
        ModuleExportName::StringLiteral(lit) => lit.value.to_string(),
    }
}

/// Property access on `target`, bracketed when `name` is not an identifier.
fn member(target: &str, name: &str) -> String {
    if is_identifier(name) {
        format!("{}.{}", target, name)
    } else {
        format!("{}[{}]", target, string_literal(name))
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// A JavaScript string literal for `value`.
fn string_literal(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}
