//! Incremental global style builder
//!
//! Produces the project's single global stylesheet, reusing the previous
//! result whenever the transitive style import graph proves it still
//! valid. Session state (the import graph and the cached text) lives in an
//! explicitly owned [`StyleSession`] passed into every build; one lock
//! scope covers the full check-then-recompute sequence so competing
//! rebuilds cannot interleave a stale recomputation over a fresher one.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::{CompilerError, Result};
use crate::platform::{CssOptimizer, FileSys, TransformChain, TransformOutput, WatchRegistry};
use crate::types::{BuildContext, MAX_IMPORT_WALK_DEPTH};
use crate::utils::normalize_path;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Observable states of the global style cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    NoGlobalStyleConfigured,
    Uncached,
    CacheValid,
    CacheInvalid,
    Computing,
    ComputedOk,
    ComputedFailed,
}

/// Why a cached value was considered stale.
#[derive(Debug, Clone, PartialEq, Eq)]
enum StaleReason {
    FirstBuild,
    FullBuildRequested,
    EntryChanged,
    DirectDependencyChanged(PathBuf),
    ReachableChanged(PathBuf),
}

#[derive(Debug, PartialEq)]
enum Decision {
    Valid,
    Stale(StaleReason),
}

#[derive(Debug, Default)]
struct SessionState {
    /// Style file -> files it statically imports, in discovery order.
    /// Entries are extended as files are discovered, never replaced
    /// wholesale.
    css_module_imports: HashMap<PathBuf, Vec<PathBuf>>,
    /// Last successfully computed global stylesheet; `None` marks an
    /// invalid cache.
    cached_global_style: Option<String>,
}

impl SessionState {
    fn merge_dependencies(&mut self, file: &Path, found: impl IntoIterator<Item = PathBuf>) {
        let deps = self.css_module_imports.entry(file.to_path_buf()).or_default();
        for dep in found {
            if !deps.contains(&dep) {
                deps.push(dep);
            }
        }
    }
}

/// Session-scoped cache state. Created once per compiler session and
/// discarded at session end; incremental rebuilds share it.
#[derive(Debug, Default)]
pub struct StyleSession {
    inner: Mutex<SessionState>,
}

impl StyleSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded direct dependencies of `file`, for inspection.
    pub fn dependencies_of(&self, file: &Path) -> Vec<PathBuf> {
        self.inner
            .lock()
            .expect("style session lock")
            .css_module_imports
            .get(file)
            .cloned()
            .unwrap_or_default()
    }

    /// The currently cached stylesheet, if the cache is valid.
    pub fn cached_style(&self) -> Option<String> {
        self.inner
            .lock()
            .expect("style session lock")
            .cached_global_style
            .clone()
    }
}

/// The incremental builder, parameterized over its collaborators.
pub struct GlobalStyleBuilder<'a> {
    fs: &'a dyn FileSys,
    chain: &'a dyn TransformChain,
    optimizer: &'a dyn CssOptimizer,
}

impl<'a> GlobalStyleBuilder<'a> {
    pub fn new(
        fs: &'a dyn FileSys,
        chain: &'a dyn TransformChain,
        optimizer: &'a dyn CssOptimizer,
    ) -> Self {
        Self {
            fs,
            chain,
            optimizer,
        }
    }

    /// Produce the global stylesheet for this build, or `None` when no
    /// global style is configured or the computation failed. Failures are
    /// reported as diagnostics and degrade the cache; they never abort the
    /// build.
    pub fn build(
        &self,
        session: &StyleSession,
        ctx: &BuildContext,
        entry: Option<&Path>,
        diagnostics: &mut Diagnostics,
        watch: &mut dyn WatchRegistry,
    ) -> Option<String> {
        let entry = match entry {
            Some(path) => path,
            None => {
                log::debug!("global style: {:?}", CacheState::NoGlobalStyleConfigured);
                return None;
            }
        };

        // One mutex scope around the full check-then-recompute sequence:
        // at most one recomputation in flight per session.
        let mut state = session.inner.lock().expect("style session lock");

        match self.decide(&mut state, ctx, entry) {
            Decision::Valid => {
                log::debug!("global style: {:?}", CacheState::CacheValid);
                state.cached_global_style.clone()
            }
            Decision::Stale(reason) => {
                log::debug!(
                    "global style: {:?} ({:?}) -> {:?}",
                    CacheState::CacheInvalid,
                    reason,
                    CacheState::Computing
                );
                match self.recompute(&mut state, entry, diagnostics, watch) {
                    Ok(code) => {
                        log::debug!("global style: {:?}", CacheState::ComputedOk);
                        state.cached_global_style = Some(code.clone());
                        Some(code)
                    }
                    Err(error) => {
                        log::debug!("global style: {:?}", CacheState::ComputedFailed);
                        diagnostics.report(failure_kind(&error), error.to_string(), Some(entry));
                        // The next build starts from a known cold state
                        state.cached_global_style = None;
                        None
                    }
                }
            }
        }
    }

    /// The staleness decision, evaluated in fixed short-circuit order. The
    /// rebuild pre-filter check deliberately precedes the entry-file check;
    /// downstream behavior depends on this exact sequencing.
    fn decide(&self, state: &mut SessionState, ctx: &BuildContext, entry: &Path) -> Decision {
        if state.cached_global_style.is_none() {
            return Decision::Stale(StaleReason::FirstBuild);
        }
        if ctx.requires_full_build {
            return Decision::Stale(StaleReason::FullBuildRequested);
        }
        if ctx.is_rebuild && !ctx.has_style_changes {
            return Decision::Valid;
        }
        if ctx.has_changed(entry) {
            return Decision::Stale(StaleReason::EntryChanged);
        }
        if let Some(deps) = state.css_module_imports.get(entry) {
            if let Some(changed) = deps.iter().find(|d| ctx.has_changed(d)) {
                return Decision::Stale(StaleReason::DirectDependencyChanged(changed.clone()));
            }
        }

        let mut visited = HashSet::new();
        visited.insert(entry.to_path_buf());
        if let Some(changed) = self.walk_for_change(state, ctx, entry, &mut visited, 0) {
            return Decision::Stale(StaleReason::ReachableChanged(changed));
        }
        Decision::Valid
    }

    /// Depth-first reachability walk over the current import statements.
    /// The visited set makes cyclic and diamond-shaped graphs safe; an
    /// unreadable file ends its branch without failing the walk.
    fn walk_for_change(
        &self,
        state: &mut SessionState,
        ctx: &BuildContext,
        file: &Path,
        visited: &mut HashSet<PathBuf>,
        depth: usize,
    ) -> Option<PathBuf> {
        if depth >= MAX_IMPORT_WALK_DEPTH {
            log::warn!(
                "style import walk depth limit reached at '{}'",
                file.display()
            );
            return None;
        }
        let content = match self.fs.read_to_string(file) {
            Ok(content) => content,
            Err(_) => return None,
        };
        let imports = extract_css_imports(&content, file);
        state.merge_dependencies(file, imports.iter().cloned());

        for import in imports {
            if ctx.has_changed(&import) {
                return Some(import);
            }
            if visited.insert(import.clone()) {
                if let Some(changed) =
                    self.walk_for_change(state, ctx, &import, visited, depth + 1)
                {
                    return Some(changed);
                }
            }
        }
        None
    }

    /// Re-run the transform chain and optimizer for the entry file,
    /// recording returned dependencies and watch registrations.
    fn recompute(
        &self,
        state: &mut SessionState,
        entry: &Path,
        diagnostics: &mut Diagnostics,
        watch: &mut dyn WatchRegistry,
    ) -> Result<String> {
        let (code, dependencies) = match self.chain.run_transforms(entry)? {
            TransformOutput::NoTransform => (self.fs.read_to_string(entry)?, Vec::new()),
            TransformOutput::Code(code) => (code, Vec::new()),
            TransformOutput::CodeWithDeps { code, dependencies } => (code, dependencies),
        };

        // Direct imports of the entry feed the next build's cheap
        // dependency check before any walk
        let imports = extract_css_imports(&code, entry);
        state.merge_dependencies(entry, imports.iter().cloned());
        state.merge_dependencies(entry, dependencies.iter().cloned());
        for path in imports.iter().chain(dependencies.iter()) {
            watch.add_watch_file(path);
        }
        watch.add_watch_file(entry);

        self.optimizer.optimize(diagnostics, &code, entry)
    }
}

fn failure_kind(error: &CompilerError) -> DiagnosticKind {
    match error {
        CompilerError::Io(_) | CompilerError::FileNotFound { .. } => DiagnosticKind::IoFailure,
        CompilerError::Optimize { .. } => DiagnosticKind::OptimizeFailure,
        _ => DiagnosticKind::TransformFailure,
    }
}

/// Extract `@import` targets from CSS text, resolved against the
/// importing file's directory. Remote and bare-package imports are not
/// part of the local graph.
fn extract_css_imports(content: &str, file: &Path) -> Vec<PathBuf> {
    let pattern = Regex::new(r#"@import\s+(?:url\(\s*)?["']?([^"'()\s;]+)["']?\s*\)?"#).unwrap();
    let dir = file.parent().unwrap_or_else(|| Path::new(""));
    let mut imports = Vec::new();
    for capture in pattern.captures_iter(content) {
        let target = &capture[1];
        if target.starts_with("http:") || target.starts_with("https:") || target.starts_with("//") {
            continue;
        }
        let resolved = if Path::new(target).is_absolute() {
            normalize_path(Path::new(target))
        } else {
            normalize_path(&dir.join(target))
        };
        if !imports.contains(&resolved) {
            imports.push(resolved);
        }
    }
    imports
}
