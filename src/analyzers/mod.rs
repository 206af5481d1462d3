pub mod access;

use proc_macro2::Span;
use quote::ToTokens;
use syn::spanned::Spanned;
use syn::visit::{self, Visit};
use syn::{Block, Expr};
use thiserror::Error;

use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::analyze_body;
use crate::config::ResultguardConfig;
use crate::core::{AnalysisFailure, FileReport, Finding};

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: syn::Error,
    },
}

/// One function body together with the name it is reported under.
struct FunctionBody<'ast> {
    name: String,
    block: &'ast Block,
}

/// Collects every function body in a file: free functions, impl methods,
/// and trait default methods, wherever they are nested.
#[derive(Default)]
struct BodyCollector<'ast> {
    bodies: Vec<FunctionBody<'ast>>,
}

impl<'ast> Visit<'ast> for BodyCollector<'ast> {
    fn visit_item_fn(&mut self, item: &'ast syn::ItemFn) {
        self.bodies.push(FunctionBody {
            name: item.sig.ident.to_string(),
            block: &item.block,
        });
        visit::visit_item_fn(self, item);
    }

    fn visit_impl_item_fn(&mut self, item: &'ast syn::ImplItemFn) {
        self.bodies.push(FunctionBody {
            name: item.sig.ident.to_string(),
            block: &item.block,
        });
        visit::visit_impl_item_fn(self, item);
    }

    fn visit_trait_item_fn(&mut self, item: &'ast syn::TraitItemFn) {
        if let Some(block) = &item.default {
            self.bodies.push(FunctionBody {
                name: item.sig.ident.to_string(),
                block,
            });
        }
        visit::visit_trait_item_fn(self, item);
    }
}

/// Runs the guard-inference engine over every value access in a file.
pub struct FileAnalyzer<'a> {
    config: &'a ResultguardConfig,
}

impl<'a> FileAnalyzer<'a> {
    pub fn new(config: &'a ResultguardConfig) -> Self {
        Self { config }
    }

    pub fn analyze_path(&self, path: &Path) -> Result<FileReport, AnalyzeError> {
        let source = fs::read_to_string(path).map_err(|source| AnalyzeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.analyze_source(&source, path)
    }

    pub fn analyze_source(&self, source: &str, path: &Path) -> Result<FileReport, AnalyzeError> {
        let file = syn::parse_file(source).map_err(|source| AnalyzeError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut collector = BodyCollector::default();
        collector.visit_file(&file);
        let receivers = access::ReceiverIndex::build(&file, &self.config.protocol);

        let mut report = FileReport::new(path.to_path_buf());
        for body in &collector.bodies {
            self.analyze_body_accesses(body, &receivers, path, &mut report);
        }
        log::debug!(
            "{}: {} finding(s), {} error(s)",
            path.display(),
            report.findings.len(),
            report.errors.len()
        );
        Ok(report)
    }

    fn analyze_body_accesses(
        &self,
        body: &FunctionBody<'_>,
        receivers: &access::ReceiverIndex,
        path: &Path,
        report: &mut FileReport,
    ) {
        let protocol = &self.config.protocol;
        for target in access::collect_value_accesses(body.block, protocol) {
            if !self.receiver_permitted(target, receivers) {
                continue;
            }
            match analyze_body(body.block, target, protocol) {
                Ok(true) => {}
                Ok(false) => {
                    let start = span_start(target);
                    report.findings.push(Finding::new(
                        path.to_path_buf(),
                        start.0,
                        start.1,
                        body.name.clone(),
                        target.to_token_stream().to_string(),
                        self.config.severity,
                    ));
                }
                Err(err) => {
                    log::warn!("{}: {} (in fn {})", path.display(), err, body.name);
                    let start = span_start(target);
                    report.errors.push(AnalysisFailure {
                        file: path.to_path_buf(),
                        line: start.0,
                        message: err.to_string(),
                    });
                }
            }
        }
    }

    /// Stands in for the receiver's type: an explicit substring filter when
    /// configured, otherwise the receiver must look like a wrapper value
    /// somewhere in the file (flag check, flag pattern, or hinted type).
    fn receiver_permitted(&self, target: &Expr, receivers: &access::ReceiverIndex) -> bool {
        match &self.config.receiver_contains {
            Some(needle) => access::receiver_text(target)
                .is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase())),
            None => receivers.is_wrapper_receiver(target),
        }
    }
}

fn span_start(expr: &Expr) -> (usize, usize) {
    let span: Span = expr.span();
    let start = span.start();
    // Columns are zero-based in proc-macro2; findings report one-based.
    (start.line, start.column + 1)
}
