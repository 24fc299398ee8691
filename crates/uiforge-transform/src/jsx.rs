//! JSX/TSX transform built on oxc.

use std::path::Path;

use oxc_allocator::Allocator;
use oxc_codegen::Codegen;
use oxc_parser::Parser;
use oxc_semantic::SemanticBuilder;
use oxc_span::SourceType;
use oxc_transformer::{JsxRuntime, TransformOptions, Transformer};

use crate::commonjs::{join_diagnostics, lower_modules};
use crate::source::SourceText;
use crate::traits::{CompiledUnit, Transform, TransformError};

/// Virtual file name reported in diagnostics.
const VIRTUAL_PATH: &str = "component.tsx";

/// Parses generated components as TSX, lowers JSX to classic
/// `React.createElement` calls, strips type annotations, then rewrites the
/// module syntax into CommonJS.
#[derive(Debug, Default, Clone, Copy)]
pub struct OxcTransform;

impl OxcTransform {
    /// Create a new oxc transform.
    pub fn new() -> Self {
        Self
    }

    /// Run parse, JSX lowering and printing. Returns plain ES module code.
    pub fn print_js(&self, source: &str) -> Result<String, TransformError> {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::tsx()).parse();

        if !ret.errors.is_empty() {
            return Err(TransformError::Parse(join_diagnostics(&ret.errors)));
        }

        let mut program = ret.program;

        let scoping = SemanticBuilder::new()
            .build(&program)
            .semantic
            .into_scoping();

        let mut options = TransformOptions::default();
        options.jsx.runtime = JsxRuntime::Classic;

        let ret = Transformer::new(&allocator, Path::new(VIRTUAL_PATH), &options)
            .build_with_scoping(scoping, &mut program);

        if !ret.errors.is_empty() {
            return Err(TransformError::Parse(join_diagnostics(&ret.errors)));
        }

        Ok(Codegen::new().build(&program).code)
    }
}

impl Transform for OxcTransform {
    fn name(&self) -> &'static str {
        "oxc"
    }

    fn transform(&self, source: &SourceText) -> Result<CompiledUnit, TransformError> {
        if source.is_blank() {
            return Err(TransformError::Empty);
        }

        let printed = self.print_js(source.as_str())?;
        let unit = lower_modules(&printed)?;

        tracing::debug!(
            imports = ?unit.imports,
            exports = ?unit.exports,
            "Compiled {} bytes of source into {} bytes",
            source.len(),
            unit.code.len()
        );

        Ok(unit)
    }
}
