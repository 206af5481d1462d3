use crate::core::{AnalysisReport, Severity};
use colored::*;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Terminal,
    Json,
}

pub trait OutputWriter {
    fn write_report(&mut self, report: &AnalysisReport) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_report(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        self.writer.write_all(json.as_bytes())?;
        writeln!(self.writer)?;
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_report(&mut self, report: &AnalysisReport) -> anyhow::Result<()> {
        for finding in &report.findings {
            let severity = match finding.severity {
                Severity::Warning => "warning".yellow().bold(),
                Severity::Error => "error".red().bold(),
            };
            writeln!(
                self.writer,
                "{}:{}:{}: {} [{}] {} ({})",
                finding.file.display().to_string().cyan(),
                finding.line,
                finding.column,
                severity,
                finding.rule.dimmed(),
                finding.message,
                finding.access.bold(),
            )?;
        }
        for error in &report.errors {
            writeln!(
                self.writer,
                "{}:{}: {} {}",
                error.file.display().to_string().cyan(),
                error.line,
                "analysis error".red().bold(),
                error.message,
            )?;
        }

        writeln!(self.writer)?;
        let summary = format!(
            "{} file(s) scanned, {} finding(s), {} analysis error(s)",
            report.files_scanned,
            report.findings.len(),
            report.errors.len()
        );
        if report.has_findings() {
            writeln!(self.writer, "{}", summary.yellow())?;
        } else {
            writeln!(self.writer, "{}", summary.green())?;
        }
        Ok(())
    }
}

pub fn create_writer(writer: Box<dyn Write>, format: OutputFormat) -> Box<dyn OutputWriter> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer)),
    }
}
