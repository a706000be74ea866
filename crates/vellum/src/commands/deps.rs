//! Deps command - Print the dependencies of templates

use clap::Args;
use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;
use vellum_atelier::transform_document;

use super::{build_context, collect_files, resolve_root, DocumentReport, DEFAULT_EXTENSION};
use crate::config::load_config;

#[derive(Args)]
pub struct DepsArgs {
    /// Glob pattern(s) or directories to match templates
    #[arg(default_value = super::DEFAULT_PATTERN)]
    pub patterns: Vec<String>,

    /// Working root (default: current directory)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// File extension to pick up when walking directories
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    pub ext: String,

    /// Print a JSON array instead of text
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: DepsArgs) {
    let root = resolve_root(args.root.as_deref());
    let config = load_config(&root);
    let ctx = build_context(&root, &config);
    let mut options = config.loader.clone();
    options.emit_file = false;

    let files = collect_files(&root, &args.patterns, &args.ext);
    if files.is_empty() {
        eprintln!("No templates found matching patterns: {:?}", args.patterns);
        return;
    }

    let results: Vec<Result<DocumentReport, String>> = files
        .par_iter()
        .map(|path| {
            let source = fs::read_to_string(path)
                .map_err(|e| format!("{}: failed to read: {}", path.display(), e))?;
            transform_document(&ctx, path, &source, &options)
                .map(|output| DocumentReport::new(&root, path, &output))
                .map_err(|e| format!("{}: {}", path.display(), e))
        })
        .collect();

    let mut failed = false;
    let mut reports = Vec::with_capacity(results.len());
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                eprintln!("Error: {}", e);
                failed = true;
            }
        }
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).unwrap_or_default()
        );
    } else {
        for report in &reports {
            println!("{}", report.document);
            for dep in report.dependencies.iter().chain(&report.scripts) {
                println!("  {}", dep);
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}
