use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::analyzers::FileAnalyzer;
use crate::config::ResultguardConfig;
use crate::core::{AnalysisReport, Severity};
use crate::io::output::{create_writer, OutputFormat};
use crate::io::walker::FileWalker;

pub struct CheckOptions {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub success_flag: Option<String>,
    pub failure_flag: Option<String>,
    pub value_accessor: Option<String>,
    pub receiver_contains: Option<String>,
    pub severity: Option<Severity>,
}

/// Runs one check over a file tree. Returns `true` when findings exist so
/// the caller can map that to the exit code.
pub fn run(options: CheckOptions) -> Result<bool> {
    let config = resolve_config(&options)?;
    let report = analyze_tree(&options.path, &config)?;

    let writer: Box<dyn Write> = match &options.output {
        Some(path) => Box::new(
            File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    create_writer(writer, options.format).write_report(&report)?;

    Ok(report.has_findings())
}

/// Walks the tree and analyzes every file, one independent engine walk per
/// discovered access, fanned out per file.
pub fn analyze_tree(root: &PathBuf, config: &ResultguardConfig) -> Result<AnalysisReport> {
    let files = FileWalker::new(root.clone()).walk()?;
    log::info!("checking {} file(s) under {}", files.len(), root.display());

    let file_reports: Vec<_> = files
        .par_iter()
        .map(|path| FileAnalyzer::new(config).analyze_path(path))
        .collect();

    let mut report = AnalysisReport::new(root.clone());
    for result in file_reports {
        match result {
            Ok(file_report) => report.merge_file(file_report),
            // A file that cannot be read or parsed does not abort the run.
            Err(err) => {
                log::warn!("{err}");
                report.files_scanned += 1;
            }
        }
    }
    report.sort();
    Ok(report)
}

fn resolve_config(options: &CheckOptions) -> Result<ResultguardConfig> {
    let mut config = match &options.config {
        Some(path) => ResultguardConfig::load(path)?,
        None => ResultguardConfig::discover(&options.path),
    };
    if let Some(name) = &options.success_flag {
        config.protocol.success_flag = name.clone();
    }
    if let Some(name) = &options.failure_flag {
        config.protocol.failure_flag = name.clone();
    }
    if let Some(name) = &options.value_accessor {
        config.protocol.value_accessor = name.clone();
    }
    if options.receiver_contains.is_some() {
        config.receiver_contains = options.receiver_contains.clone();
    }
    if let Some(severity) = options.severity {
        config.severity = severity;
    }
    Ok(config)
}
