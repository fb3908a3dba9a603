//! Command-line interface for the cmpc compiler

use crate::error::{CompilerError, Result};
use crate::platform::{
    BasicCssOptimizer, DiskFileSys, FileSys, NullWatchRegistry, PassthroughTransformChain,
    StyleImportConfig,
};
use crate::style_cache::{GlobalStyleBuilder, StyleSession};
use crate::types::{BuildContext, ModuleFormat};
use crate::{compile_file_with_options, CompilerOptions};
use clap::{Arg, ArgAction, Command};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// Module source extensions the compiler picks up.
const MODULE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    module_format: Option<String>,
    global_style: Option<String>,
    out_dir: Option<String>,
    style_query_data: Option<bool>,
}

pub struct Cli {
    config: ConfigFile,
    start_time: Instant,
}

impl Cli {
    pub fn new() -> Self {
        Self {
            config: ConfigFile::default(),
            start_time: Instant::now(),
        }
    }

    pub fn run(&mut self) -> Result<()> {
        self.start_time = Instant::now();

        let matches = self.build_cli().get_matches();

        if let Some(config_path) = matches.get_one::<String>("config") {
            self.load_config_file(config_path)?;
        }

        let verbose = matches.get_count("verbose");
        setup_logging(verbose);

        match matches.subcommand() {
            Some(("compile", sub_matches)) => self.handle_compile_command(sub_matches),
            Some(("build-style", sub_matches)) => self.handle_build_style_command(sub_matches),
            Some(("watch", sub_matches)) => self.handle_watch_command(sub_matches),
            _ => {
                println!("No subcommand specified. Use --help for usage information.");
                Ok(())
            }
        }
    }

    fn build_cli(&self) -> Command {
        Command::new(crate::NAME)
            .version(crate::VERSION)
            .about(crate::DESCRIPTION)
            .arg(
                Arg::new("config")
                    .short('c')
                    .long("config")
                    .value_name("FILE")
                    .help("Configuration file path")
                    .action(ArgAction::Set),
            )
            .arg(
                Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .help("Increase verbosity (can be used multiple times)")
                    .action(ArgAction::Count),
            )
            .subcommand(
                Command::new("compile")
                    .about("Transform component modules to plain class modules")
                    .arg(
                        Arg::new("input")
                            .value_name("FILE|DIR")
                            .help("Module file or source directory")
                            .required(true),
                    )
                    .arg(
                        Arg::new("out-dir")
                            .short('o')
                            .long("out-dir")
                            .value_name("DIR")
                            .help("Output directory (default: dist)"),
                    )
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .value_name("esm|cjs")
                            .help("Output module convention (default: esm)"),
                    )
                    .arg(
                        Arg::new("no-style-data")
                            .long("no-style-data")
                            .help("Emit plain style paths without query metadata")
                            .action(ArgAction::SetTrue),
                    ),
            )
            .subcommand(
                Command::new("build-style")
                    .about("Build the global stylesheet from its entry file")
                    .arg(
                        Arg::new("entry")
                            .value_name("FILE")
                            .help("Global style entry file")
                            .required(true),
                    )
                    .arg(
                        Arg::new("output")
                            .short('o')
                            .long("output")
                            .value_name("FILE")
                            .help("Output stylesheet path"),
                    ),
            )
            .subcommand(
                Command::new("watch")
                    .about("Watch a source directory and rebuild incrementally")
                    .arg(
                        Arg::new("dir")
                            .value_name("DIR")
                            .help("Source directory to watch")
                            .required(true),
                    )
                    .arg(
                        Arg::new("out-dir")
                            .short('o')
                            .long("out-dir")
                            .value_name("DIR")
                            .help("Output directory (default: dist)"),
                    )
                    .arg(
                        Arg::new("global-style")
                            .long("global-style")
                            .value_name("FILE")
                            .help("Global style entry file"),
                    )
                    .arg(
                        Arg::new("format")
                            .long("format")
                            .value_name("esm|cjs")
                            .help("Output module convention (default: esm)"),
                    ),
            )
    }

    fn load_config_file(&mut self, path: &str) -> Result<()> {
        let content = fs::read_to_string(path).map_err(|e| {
            CompilerError::config(format!("cannot read config file '{}': {}", path, e))
        })?;
        self.config = toml::from_str(&content).map_err(|e| {
            CompilerError::config(format!("invalid config file '{}': {}", path, e))
        })?;
        Ok(())
    }

    fn resolve_options(&self, matches: &clap::ArgMatches) -> Result<CompilerOptions> {
        let format_name = matches
            .try_get_one::<String>("format")
            .ok()
            .flatten()
            .cloned()
            .or_else(|| self.config.module_format.clone());
        let module_format = match format_name.as_deref() {
            None | Some("esm") => ModuleFormat::Esm,
            Some("cjs") | Some("commonjs") => ModuleFormat::CommonJs,
            Some(other) => {
                return Err(CompilerError::config(format!(
                    "unknown module format '{}'",
                    other
                )))
            }
        };

        let query_data = if matches
            .try_get_one::<bool>("no-style-data")
            .ok()
            .flatten()
            .copied()
            .unwrap_or(false)
        {
            false
        } else {
            self.config.style_query_data.unwrap_or(true)
        };

        let global_style = self.config.global_style.as_ref().map(PathBuf::from);

        Ok(CompilerOptions {
            module_format,
            style_import: StyleImportConfig { query_data },
            global_style,
        })
    }

    fn resolve_out_dir(&self, matches: &clap::ArgMatches) -> PathBuf {
        matches
            .get_one::<String>("out-dir")
            .cloned()
            .or_else(|| self.config.out_dir.clone())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("dist"))
    }

    fn handle_compile_command(&self, matches: &clap::ArgMatches) -> Result<()> {
        let input = PathBuf::from(matches.get_one::<String>("input").unwrap());
        let out_dir = self.resolve_out_dir(matches);
        let options = self.resolve_options(matches)?;

        let mut compiled_count = 0usize;
        let mut component_count = 0usize;

        if input.is_dir() {
            for module in collect_module_files(&input) {
                let relative = module.strip_prefix(&input).unwrap_or(&module);
                let output = out_dir.join(relative).with_extension("js");
                let compiled = compile_file_with_options(&module, &output, &options)?;
                compiled_count += 1;
                component_count += compiled.components.len();
            }
        } else {
            let file_name = input
                .file_name()
                .ok_or_else(|| CompilerError::config("input has no file name"))?;
            let output = out_dir.join(file_name).with_extension("js");
            let compiled = compile_file_with_options(&input, &output, &options)?;
            compiled_count += 1;
            component_count += compiled.components.len();
        }

        println!(
            "Compiled {} module(s), {} component(s) in {:.1?}",
            compiled_count,
            component_count,
            self.start_time.elapsed()
        );
        Ok(())
    }

    fn handle_build_style_command(&self, matches: &clap::ArgMatches) -> Result<()> {
        let entry = PathBuf::from(matches.get_one::<String>("entry").unwrap());
        let output = matches.get_one::<String>("output").map(PathBuf::from);

        let session = StyleSession::new();
        let css = build_global_style(&session, &BuildContext::first_build(), Some(&entry));

        match css {
            Some(css) => {
                match &output {
                    Some(path) => {
                        DiskFileSys.write(path, &css)?;
                        println!("Wrote global stylesheet to '{}'", path.display());
                    }
                    None => println!("{}", css),
                }
                Ok(())
            }
            None => Err(CompilerError::transform(
                entry.to_string_lossy(),
                "global style build produced no output",
            )),
        }
    }

    fn handle_watch_command(&self, matches: &clap::ArgMatches) -> Result<()> {
        let dir = PathBuf::from(matches.get_one::<String>("dir").unwrap());
        let out_dir = self.resolve_out_dir(matches);
        let mut options = self.resolve_options(matches)?;
        if let Some(path) = matches.get_one::<String>("global-style") {
            options.global_style = Some(PathBuf::from(path));
        }

        let session = StyleSession::new();

        // Initial full build
        let built = self.build_all(&dir, &out_dir, &options)?;
        let css = build_global_style(
            &session,
            &BuildContext::first_build(),
            options.global_style.as_deref(),
        );
        if let (Some(css), Some(entry)) = (&css, &options.global_style) {
            self.write_global_style(&out_dir, entry, css)?;
        }
        println!(
            "Initial build: {} module(s). Watching '{}' for changes...",
            built,
            dir.display()
        );

        let (tx, rx) = channel();
        let mut watcher: RecommendedWatcher = notify::recommended_watcher(tx)
            .map_err(|e| CompilerError::config(format!("cannot create watcher: {}", e)))?;
        watcher
            .watch(&dir, RecursiveMode::Recursive)
            .map_err(|e| CompilerError::config(format!("cannot watch '{}': {}", dir.display(), e)))?;

        loop {
            // Drain one change burst, debounced
            let first = match rx.recv() {
                Ok(event) => event,
                Err(_) => break,
            };
            let mut changed: HashSet<PathBuf> = HashSet::new();
            collect_event_paths(first, &mut changed);
            while let Ok(event) = rx.recv_timeout(Duration::from_millis(50)) {
                collect_event_paths(event, &mut changed);
            }
            if changed.is_empty() {
                continue;
            }

            let files_changed: Vec<PathBuf> = changed.into_iter().collect();
            let ctx = BuildContext::rebuild(files_changed);
            self.rebuild(&dir, &out_dir, &options, &session, &ctx)?;
        }
        Ok(())
    }

    fn build_all(&self, dir: &Path, out_dir: &Path, options: &CompilerOptions) -> Result<usize> {
        let mut count = 0usize;
        for module in collect_module_files(dir) {
            let relative = module.strip_prefix(dir).unwrap_or(&module);
            let output = out_dir.join(relative).with_extension("js");
            compile_file_with_options(&module, &output, options)?;
            count += 1;
        }
        Ok(count)
    }

    fn rebuild(
        &self,
        dir: &Path,
        out_dir: &Path,
        options: &CompilerOptions,
        session: &StyleSession,
        ctx: &BuildContext,
    ) -> Result<()> {
        let started = Instant::now();
        let mut rebuilt = 0usize;

        for path in &ctx.files_changed {
            if !is_module_file(path) || !path.starts_with(dir) {
                continue;
            }
            if !path.exists() {
                continue;
            }
            let relative = path.strip_prefix(dir).unwrap_or(path);
            let output = out_dir.join(relative).with_extension("js");
            match compile_file_with_options(path, &output, options) {
                Ok(_) => rebuilt += 1,
                Err(e) => eprintln!("Rebuild failed for '{}': {}", path.display(), e),
            }
        }

        let css = build_global_style(session, ctx, options.global_style.as_deref());
        if let (Some(css), Some(entry)) = (&css, &options.global_style) {
            self.write_global_style(out_dir, entry, css)?;
        }

        println!(
            "Rebuilt {} module(s) ({} file(s) changed) in {:.1?}",
            rebuilt,
            ctx.files_changed.len(),
            started.elapsed()
        );
        Ok(())
    }

    fn write_global_style(&self, out_dir: &Path, entry: &Path, css: &str) -> Result<()> {
        let name = entry
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("global.css"));
        DiskFileSys.write(&out_dir.join(name), css)
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the global style pipeline with the default disk-backed
/// collaborators, reporting diagnostics to stderr.
fn build_global_style(
    session: &StyleSession,
    ctx: &BuildContext,
    entry: Option<&Path>,
) -> Option<String> {
    let fs_impl = DiskFileSys;
    let chain = PassthroughTransformChain::new();
    let optimizer = BasicCssOptimizer;
    let builder = GlobalStyleBuilder::new(&fs_impl, &chain, &optimizer);
    let mut diagnostics = crate::Diagnostics::new();
    let mut watch = NullWatchRegistry;
    let css = builder.build(session, ctx, entry, &mut diagnostics, &mut watch);
    for diagnostic in diagnostics.entries() {
        eprintln!("{}", diagnostic);
    }
    css
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    let _ = env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init();
}

fn is_module_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MODULE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Module sources under `dir`, skipping dependency and output directories.
fn collect_module_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_entry(|e| {
            let name = e.file_name().to_string_lossy();
            name != "node_modules" && name != "dist" && !name.starts_with('.')
        })
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_module_file(p))
        .collect();
    files.sort();
    files
}

fn collect_event_paths(
    event: std::result::Result<notify::Event, notify::Error>,
    changed: &mut HashSet<PathBuf>,
) {
    if let Ok(event) = event {
        for path in event.paths {
            changed.insert(path);
        }
    }
}
