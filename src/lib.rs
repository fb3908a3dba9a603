//! Cmpc UI Component Compiler
//!
//! The transformation core of a component compiler: it rewrites source
//! modules that declare UI components through metadata annotations into
//! plain, runtime-agnostic class definitions carrying static metadata,
//! links component style assets into each module's import graph, and keeps
//! an incremental cache that decides per rebuild whether the project's
//! global stylesheet can be reused without recomputation.
//!
//! # Features
//!
//! - Annotation-to-static rewrite: `@Prop`/`@State`/`@Event`/`@Element`
//!   fields become constructor-initialized members plus static accessor
//!   metadata (`is`, `properties`, `states`, `events`)
//! - Style import linking under two module conventions (static ESM
//!   imports, eager CommonJS requires)
//! - Incremental global style builds with a cycle-safe import-graph walk
//! - Per-build diagnostics that degrade gracefully instead of aborting
//! - Watch mode driving incremental rebuilds from file change sets
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use cmpc::{compile_file, Result};
//!
//! fn main() -> Result<()> {
//!     compile_file("src/cmp-a.tsx", "dist/cmp-a.js")?;
//!     Ok(())
//! }
//! ```
//!
//! # Transform Pipeline
//!
//! 1. **Parse** - statement-granular module parse
//! 2. **Discover** - build component metadata from annotations
//! 3. **Rewrite** - annotated fields to constructor + static accessors
//! 4. **Link** - style asset imports in the target module convention
//! 5. **Emit** - rendered output module (skipped when nothing changed)

pub mod ast;
pub mod codegen;
pub mod diagnostics;
pub mod discovery;
pub mod error;
pub mod field_rewriter;
pub mod parser;
pub mod platform;
pub mod style_cache;
pub mod style_linker;
pub mod types;
pub mod utils;

pub mod cli;

use std::borrow::Cow;
use std::path::{Path, PathBuf};

// Re-export commonly used types and functions
pub use ast::{Annotation, ClassDecl, ClassMember, CtorStatement, Module, Statement};
pub use codegen::CodeGenerator;
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use discovery::{discover_components, DiscoveredComponent};
pub use error::{CompilerError, Result};
pub use field_rewriter::{rewrite_class, rewrite_module};
pub use parser::{parse_module_source, Parser};
pub use platform::{
    BasicCssOptimizer, CssOptimizer, DiskFileSys, FileSys, NullWatchRegistry,
    PassthroughTransformChain, QueryStringSerializer, StyleImportConfig, StyleImportRequest,
    StylePathSerializer, TransformChain, TransformOutput, WatchRegistry,
};
pub use style_cache::{CacheState, GlobalStyleBuilder, StyleSession};
pub use style_linker::link_style_imports;
pub use types::{
    AnnotatedField, BuildContext, ComponentMeta, Encapsulation, EventOptions, FieldKind,
    ModuleFormat, PropOptions, StyleEntry,
};

/// Compiler version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Compilation options and settings
#[derive(Debug, Clone)]
pub struct CompilerOptions {
    /// Output module convention for generated style imports
    pub module_format: ModuleFormat,

    /// Encoding configuration for derived style module paths
    pub style_import: StyleImportConfig,

    /// Entry point of the project-wide global stylesheet, if configured
    pub global_style: Option<PathBuf>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            module_format: ModuleFormat::Esm,
            style_import: StyleImportConfig::default(),
            global_style: None,
        }
    }
}

/// Result of transforming one module.
#[derive(Debug, Clone)]
pub struct CompiledModule {
    /// Output module text. Equal to the input source when no rewrite was
    /// needed.
    pub code: String,
    /// Components discovered in the module.
    pub components: Vec<DiscoveredComponent>,
    /// False when both passes left the tree untouched, letting callers
    /// skip downstream rewriting.
    pub changed: bool,
}

/// Transform one module from source text: parse, discover, rewrite, link,
/// emit. When neither pass changes the tree the original source is
/// returned verbatim.
pub fn compile_module_source(
    source: &str,
    module_path: &Path,
    options: &CompilerOptions,
) -> Result<CompiledModule> {
    let file = module_path.to_string_lossy();
    let module = parse_module_source(source, &file)?;
    let components = discover_components(&module, module_path);

    let rewritten = rewrite_module(&module, &components);
    let linked = link_style_imports(
        rewritten.as_ref(),
        &components,
        module_path,
        options.module_format,
        &QueryStringSerializer,
        &options.style_import,
    );

    let changed = matches!(rewritten, Cow::Owned(_)) || matches!(linked, Cow::Owned(_));
    let code = if changed {
        CodeGenerator::new().emit_module(linked.as_ref())
    } else {
        source.to_string()
    };

    Ok(CompiledModule {
        code,
        components,
        changed,
    })
}

/// Compile a module file to an output file with explicit options.
pub fn compile_file_with_options(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    options: &CompilerOptions,
) -> Result<CompiledModule> {
    let input = input.as_ref();
    let fs = DiskFileSys;
    let source = fs.read_to_string(input)?;
    let compiled = compile_module_source(&source, input, options)?;
    fs.write(output.as_ref(), &compiled.code)?;
    log::info!(
        "compiled '{}' ({} components, {})",
        input.display(),
        compiled.components.len(),
        if compiled.changed { "rewritten" } else { "unchanged" }
    );
    Ok(compiled)
}

/// Compile a module file to an output file with default options.
pub fn compile_file(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<CompiledModule> {
    compile_file_with_options(input, output, &CompilerOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"import { h } from 'runtime';

@Component({ tag: 'cmp-a', styleUrl: './cmp-a.css', shadow: true })
export class CmpA extends HTMLElement {
  @Prop() first: string = 'hello';
  @State() open = false;

  render() {
    return this.first;
  }
}
"#;

    #[test]
    fn test_pipeline_end_to_end() {
        let options = CompilerOptions::default();
        let compiled =
            compile_module_source(SOURCE, Path::new("/proj/src/cmp-a.tsx"), &options).unwrap();

        assert!(compiled.changed);
        assert_eq!(compiled.components.len(), 1);
        assert_eq!(compiled.components[0].meta.tag, "cmp-a");

        // Style import appended after the runtime import
        assert!(compiled.code.contains(
            "import cmpAStyle0 from './cmp-a.css?tag=cmp-a&encapsulation=shadow&mode='"
        ));
        // Annotations consumed, fields moved to the constructor
        assert!(!compiled.code.contains("@Component"));
        assert!(!compiled.code.contains("@Prop"));
        assert!(compiled.code.contains("super();"));
        assert!(compiled.code.contains("this.first = 'hello';"));
        assert!(compiled.code.contains("this.open = false;"));
        assert!(compiled.code.contains("static get is() { return 'cmp-a'; }"));
        assert!(compiled.code.contains("static get properties()"));
        assert!(compiled.code.contains("static get states()"));
        // User method survives verbatim
        assert!(compiled.code.contains("render()"));
    }

    #[test]
    fn test_pipeline_commonjs_format() {
        let options = CompilerOptions {
            module_format: ModuleFormat::CommonJs,
            style_import: StyleImportConfig { query_data: false },
            ..Default::default()
        };
        let compiled =
            compile_module_source(SOURCE, Path::new("/proj/src/cmp-a.tsx"), &options).unwrap();
        assert!(compiled
            .code
            .starts_with("const cmpAStyle0 = require('./cmp-a.css');"));
    }

    #[test]
    fn test_plain_module_passes_through_verbatim() {
        let source = "const x = 1;\nfunction f() { return x; }\n";
        let compiled = compile_module_source(
            source,
            Path::new("/proj/src/util.ts"),
            &CompilerOptions::default(),
        )
        .unwrap();
        assert!(!compiled.changed);
        assert_eq!(compiled.code, source);
        assert!(compiled.components.is_empty());
    }
}
