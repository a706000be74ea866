//! Build command - Transform templates and write their outputs

use clap::{Args, ValueEnum};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use vellum_atelier::transform_document;

use super::{build_context, collect_files, resolve_root, DocumentReport, DEFAULT_EXTENSION};
use crate::config::load_config;

const DEFAULT_OUTPUT: &str = "./dist";

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    /// Write emitted templates and `.js` dependency modules
    #[default]
    Files,
    /// Write one JSON report per template
    Json,
    /// Only show statistics (no output)
    Stats,
}

#[derive(Args, Default)]
pub struct BuildArgs {
    /// Glob pattern(s) or directories to match templates (default: ./src/**/*.wxml)
    #[arg(default_value = super::DEFAULT_PATTERN)]
    pub patterns: Vec<String>,

    /// Output directory (default: ./dist)
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "files")]
    pub format: OutputFormat,

    /// Working root (default: current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// File extension to pick up when walking directories
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    pub ext: String,

    /// Minify emitted templates
    #[arg(long)]
    pub minimize: bool,

    /// Number of threads (default: number of CPUs)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Show timing profile breakdown
    #[arg(long)]
    pub profile: bool,

    /// Continue on errors
    #[arg(long)]
    pub continue_on_error: bool,
}

#[derive(Debug)]
struct BuildStats {
    success: AtomicUsize,
    failed: AtomicUsize,
    dependencies: AtomicUsize,
}

impl BuildStats {
    fn new() -> Self {
        Self {
            success: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            dependencies: AtomicUsize::new(0),
        }
    }
}

/// One successfully transformed template, ready to be written.
struct BuildOutput {
    report: DocumentReport,
    asset: Option<(String, String)>,
}

pub fn run(args: BuildArgs) {
    let start = Instant::now();

    if let Some(threads) = args.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            eprintln!("Failed to configure thread pool: {}", e);
        }
    }

    let root = resolve_root(args.root.as_deref());
    let config = load_config(&root);
    let ctx = build_context(&root, &config);
    let mut options = config.loader.clone();
    options.minimize |= args.minimize;

    let ext = if args.ext.is_empty() {
        DEFAULT_EXTENSION
    } else {
        args.ext.as_str()
    };
    let files = collect_files(&root, &args.patterns, ext);
    tracing::debug!("collected {} templates under {}", files.len(), root.display());

    if files.is_empty() {
        eprintln!("No templates found matching the patterns");
        std::process::exit(1);
    }

    let stats = BuildStats::new();
    let collect_elapsed = start.elapsed();

    if args.profile {
        eprintln!(
            "Found {} files in {:.4}s. Transforming using {} threads...",
            files.len(),
            collect_elapsed.as_secs_f64(),
            rayon::current_num_threads()
        );
    }

    let transform_start = Instant::now();
    let results: Vec<BuildOutput> = files
        .par_iter()
        .filter_map(|path| {
            let transformed = fs::read_to_string(path)
                .map_err(|e| format!("Failed to read file: {}", e))
                .and_then(|source| {
                    transform_document(&ctx, path, &source, &options).map_err(|e| e.to_string())
                });

            match transformed {
                Ok(output) => {
                    stats.success.fetch_add(1, Ordering::Relaxed);
                    stats
                        .dependencies
                        .fetch_add(output.dependencies.len(), Ordering::Relaxed);

                    let report = DocumentReport::new(&root, path, &output);
                    let asset = output.asset.map(|asset| (asset.path, asset.content));
                    Some(BuildOutput { report, asset })
                }
                Err(e) => {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    eprintln!("Error transforming {}: {}", path.display(), e);

                    if !args.continue_on_error {
                        std::process::exit(1);
                    }

                    None
                }
            }
        })
        .collect();
    let transform_elapsed = transform_start.elapsed();

    let out_dir = if args.output.as_os_str().is_empty() {
        PathBuf::from(DEFAULT_OUTPUT)
    } else {
        args.output.clone()
    };

    let io_start = Instant::now();
    match args.format {
        OutputFormat::Stats => {}
        OutputFormat::Files => {
            for result in &results {
                if let Some((path, content)) = &result.asset {
                    write_output(&out_dir, path, content);
                }
                write_output(&out_dir, &result.report.module_path(), &result.report.code);
            }
        }
        OutputFormat::Json => {
            for result in &results {
                let json = serde_json::to_string_pretty(&result.report).unwrap_or_default();
                let path = format!("{}.json", result.report.document);
                write_output(&out_dir, &path, &json);
            }
        }
    }
    let io_elapsed = io_start.elapsed();

    let success = stats.success.load(Ordering::Relaxed);
    let failed = stats.failed.load(Ordering::Relaxed);
    let dependencies = stats.dependencies.load(Ordering::Relaxed);
    let total_elapsed = start.elapsed();

    if args.profile {
        eprintln!();
        eprintln!("Profile:");
        eprintln!("  collect:   {:.4}s", collect_elapsed.as_secs_f64());
        eprintln!("  transform: {:.4}s", transform_elapsed.as_secs_f64());
        eprintln!("  write:     {:.4}s", io_elapsed.as_secs_f64());
    }

    let file_word = if success == 1 { "file" } else { "files" };
    eprintln!(
        "Transformed {} {} ({} dependencies) in {:.4}s",
        success,
        file_word,
        dependencies,
        total_elapsed.as_secs_f64()
    );

    if failed > 0 {
        eprintln!("{} failed", failed);
        std::process::exit(1);
    }
}

fn write_output(out_dir: &Path, rel: &str, content: &str) {
    let out_path = out_dir.join(rel);
    if let Some(parent) = out_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Failed to create {}: {}", parent.display(), e);
            return;
        }
    }
    if let Err(e) = fs::write(&out_path, content) {
        eprintln!("Failed to write {}: {}", out_path.display(), e);
    }
}
