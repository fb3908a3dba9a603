//! Collaborator seams for the transform core
//!
//! The core consumes its surroundings through these narrow traits: file
//! access, watch registration, the style plugin-transform chain, the CSS
//! optimizer, and the style module-path serializer. Default disk-backed
//! implementations are provided; tests substitute doubles.

use crate::diagnostics::Diagnostics;
use crate::error::{CompilerError, Result};
use crate::types::Encapsulation;
use crate::utils::relative_import_path;
use std::fs;
use std::path::{Path, PathBuf};

/// File system access used by the style pipeline.
pub trait FileSys {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn write(&self, path: &Path, text: &str) -> Result<()>;
}

/// Disk-backed [`FileSys`].
#[derive(Debug, Default)]
pub struct DiskFileSys;

impl FileSys for DiskFileSys {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CompilerError::file_not_found(path.to_string_lossy()),
            _ => CompilerError::Io(e),
        })
    }

    fn write(&self, path: &Path, text: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, text)?;
        Ok(())
    }
}

/// Registration of files the surrounding watcher should track. Idempotent;
/// registering the same path twice is a no-op.
pub trait WatchRegistry {
    fn add_watch_file(&mut self, path: &Path);
}

/// Watch registry that discards registrations (non-watch builds).
#[derive(Debug, Default)]
pub struct NullWatchRegistry;

impl WatchRegistry for NullWatchRegistry {
    fn add_watch_file(&mut self, _path: &Path) {}
}

/// Watch registry collecting paths for the caller to feed a file watcher.
#[derive(Debug, Default)]
pub struct CollectingWatchRegistry {
    paths: Vec<PathBuf>,
}

impl CollectingWatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl WatchRegistry for CollectingWatchRegistry {
    fn add_watch_file(&mut self, path: &Path) {
        if !self.paths.iter().any(|p| p == path) {
            self.paths.push(path.to_path_buf());
        }
    }
}

/// Result of running the plugin transform chain over a style file.
/// Matched exhaustively; shape sniffing is confined to the chain itself.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutput {
    /// No applicable transform; distinct from empty output.
    NoTransform,
    /// Transformed style text.
    Code(String),
    /// Transformed style text plus extra files the output depends on.
    CodeWithDeps {
        code: String,
        dependencies: Vec<PathBuf>,
    },
}

/// Plugin transform chain for style sources.
pub trait TransformChain {
    fn run_transforms(&self, path: &Path) -> Result<TransformOutput>;
}

/// Chain with no plugins: plain CSS is passed through as-is, anything else
/// is not transformable.
#[derive(Debug, Default)]
pub struct PassthroughTransformChain {
    fs: DiskFileSys,
}

impl PassthroughTransformChain {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransformChain for PassthroughTransformChain {
    fn run_transforms(&self, path: &Path) -> Result<TransformOutput> {
        let is_css = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("css"))
            .unwrap_or(false);
        if !is_css {
            return Ok(TransformOutput::NoTransform);
        }
        Ok(TransformOutput::Code(self.fs.read_to_string(path)?))
    }
}

/// CSS optimizer boundary.
pub trait CssOptimizer {
    fn optimize(&self, diagnostics: &mut Diagnostics, code: &str, path: &Path) -> Result<String>;
}

/// Minimal optimizer: strips comments and collapses whitespace runs.
/// Stands in for the real minifier behind the same seam.
#[derive(Debug, Default)]
pub struct BasicCssOptimizer;

impl CssOptimizer for BasicCssOptimizer {
    fn optimize(&self, _diagnostics: &mut Diagnostics, code: &str, _path: &Path) -> Result<String> {
        let without_comments = strip_css_comments(code);
        let mut out = String::with_capacity(without_comments.len());
        let mut last_was_space = false;
        for ch in without_comments.chars() {
            if ch.is_whitespace() {
                if !last_was_space {
                    out.push(' ');
                    last_was_space = true;
                }
            } else {
                out.push(ch);
                last_was_space = false;
            }
        }
        Ok(out.trim().to_string())
    }
}

fn strip_css_comments(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let bytes = code.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'*' {
            i += 2;
            while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                i += 1;
            }
            i = (i + 2).min(bytes.len());
        } else {
            out.push(bytes[i] as char);
            i += 1;
        }
    }
    out
}

/// Inputs for deriving one style module path.
#[derive(Debug, Clone)]
pub struct StyleImportRequest {
    pub importee_path: PathBuf,
    pub importer_path: PathBuf,
    pub tag: String,
    pub encapsulation: Encapsulation,
    pub mode: String,
}

/// Configuration for the style module-path encoding.
#[derive(Debug, Clone)]
pub struct StyleImportConfig {
    /// Append the component metadata as query parameters. When off, the
    /// derived path is just the importer-relative specifier.
    pub query_data: bool,
}

impl Default for StyleImportConfig {
    fn default() -> Self {
        Self { query_data: true }
    }
}

/// Derives the module specifier a generated style import uses. The linker
/// accepts the returned string verbatim.
pub trait StylePathSerializer {
    fn serialize(&self, request: &StyleImportRequest, config: &StyleImportConfig) -> String;
}

/// Stable query-parameter encoding of the four inputs, in fixed order.
#[derive(Debug, Default)]
pub struct QueryStringSerializer;

impl StylePathSerializer for QueryStringSerializer {
    fn serialize(&self, request: &StyleImportRequest, config: &StyleImportConfig) -> String {
        let base = relative_import_path(&request.importee_path, &request.importer_path);
        if !config.query_data {
            return base;
        }
        format!(
            "{}?tag={}&encapsulation={}&mode={}",
            base,
            request.tag,
            request.encapsulation.as_str(),
            request.mode
        )
    }
}
