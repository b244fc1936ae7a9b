//! Minimal CLI: load a schema file → (check documents | print the schema)
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use tracing::{debug, info};

use json_record::{Mode, Record, RecordError, RecordType, SchemaSet};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate JSON/NDJSON documents against declared record schemas
#[derive(Parser, Debug)]
#[command(name = "json-record", version, about)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// check documents against a record type and report every violation
    Check(CheckOut),
    /// print the record types declared in a schema file
    Schema(SchemaOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// JQ pre-process filter for each document.
    #[arg(long)]
    jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    /// schema file declaring the record types
    #[arg(long)]
    schema: PathBuf,

    /// record type to check against (defaults to the schema's root)
    #[arg(long)]
    record: Option<String>,

    #[command(flatten)]
    input_settings: InputSettings,

    /// report only the first violation per document
    #[arg(long)]
    fail_fast: bool,

    /// write accepted documents, after coercion, as NDJSON to this file
    #[arg(short, long)]
    out: Option<PathBuf>,
}

#[derive(clap::Parser, Debug)]
struct SchemaOut {
    /// schema file declaring the record types
    #[arg(long)]
    schema: PathBuf,
}

/// One input document and where it came from.
#[derive(Debug)]
struct Document {
    source: String,
    index: usize,
    value: serde_json::Value,
}

/// One checked document, labelled `<source>#<n>`.
#[derive(Debug)]
struct Outcome {
    label: String,
    result: Result<Record, RecordError>,
}

#[derive(Debug)]
struct CheckReport {
    outcomes: Vec<Outcome>,
}

/// Renders every record type of a schema file.
struct SchemaListing<'a>(&'a SchemaSet);

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_documents(&self) -> Result<Vec<Document>> {
        let source_paths = resolve_file_path_patterns(&self.input)?;
        let mut out = Vec::new();
        for source_path in source_paths {
            let source_path_str = source_path.to_string_lossy().to_string();
            let source = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source_path_str}"))?;

            let mut parsed = Vec::new();
            if self.ndjson {
                for (line_no, line) in source.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let value = serde_json::from_str::<serde_json::Value>(line).with_context(|| {
                        format!("failed to parse line {} of {source_path_str}", line_no + 1)
                    })?;
                    parsed.push(value);
                }
            } else {
                let value = serde_json::from_str::<serde_json::Value>(&source)
                    .with_context(|| format!("failed to parse JSON source file {source_path_str}"))?;
                parsed.push(value);
            }

            let mut index = 0;
            for value in parsed {
                for value in self.select(value, &source_path_str)? {
                    out.push(Document { source: source_path_str.clone(), index, value });
                    index += 1;
                }
            }
        }
        debug!(documents = out.len(), "inputs loaded");
        Ok(out)
    }

    /// Apply the JSON pointer, then the jq filter.
    fn select(&self, value: serde_json::Value, source: &str) -> Result<Vec<serde_json::Value>> {
        let value = match self.json_pointer.as_deref() {
            None => value,
            Some(pointer) => match value.pointer(pointer) {
                Some(node) => node.clone(),
                None => bail!("JSON pointer {pointer} matched nothing in {source}"),
            },
        };
        match self.jq_expr.as_deref() {
            None => Ok(vec![value]),
            Some(jq_expr) => crate::jq_exec::run_filter(jq_expr, &value)
                .with_context(|| format!("failed to apply jq expression to {source}")),
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> Result<ExitCode> {
        match &self.cmd {
            Command::Check(target) => target.run(),
            Command::Schema(target) => {
                let schemas = load_schemas(&target.schema)?;
                print!("{}", SchemaListing(&schemas));
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

impl CheckOut {
    fn run(&self) -> Result<ExitCode> {
        let schemas = load_schemas(&self.schema)?;
        let record_type = select_record_type(&schemas, self.record.as_deref(), &self.schema)?;
        let mode = if self.fail_fast { Mode::FailFast } else { Mode::Exhaustive };

        let documents = self.input_settings.load_documents()?;
        info!(record = record_type.name(), documents = documents.len(), "checking");

        let report = check_documents(&record_type, &documents, mode);
        report.print(&record_type);
        if let Some(out) = self.out.as_ref() {
            write_ndjson(out, &report.accepted_ndjson()?)?;
        }
        Ok(report.exit_code())
    }
}

impl CheckReport {
    fn rejected(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.result.is_err()).count()
    }

    fn all_accepted(&self) -> bool {
        self.rejected() == 0
    }

    fn exit_code(&self) -> ExitCode {
        if self.all_accepted() { ExitCode::SUCCESS } else { ExitCode::FAILURE }
    }

    /// One line per accepted document, after coercion, in input order.
    fn accepted_ndjson(&self) -> Result<String> {
        let mut out = String::new();
        for outcome in &self.outcomes {
            if let Ok(record) = &outcome.result {
                writeln!(out, "{}", serde_json::to_string(record)?)?;
            }
        }
        Ok(out)
    }

    fn print(&self, record_type: &RecordType) {
        for outcome in &self.outcomes {
            match &outcome.result {
                Ok(_) => println!("{} {}", "ok".green().bold(), outcome.label),
                Err(error) => print_rejection(&outcome.label, record_type, error),
            }
        }
        let summary = format!("{} checked, {} rejected", self.outcomes.len(), self.rejected());
        if self.all_accepted() {
            println!("{}", summary.green());
        } else {
            println!("{}", summary.red());
        }
    }
}

impl fmt::Display for SchemaListing<'_> {
    /// `Name {` / `    field: type,` / `}` per record type, in declaration order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let schemas = self.0;
        for (name, record_type) in schemas.iter() {
            let root = if name == schemas.root_name() { " (root)" } else { "" };
            writeln!(f, "{name}{root} {{")?;
            for (field, ty) in record_type.schema().iter() {
                writeln!(f, "    {field}: {ty},")?;
            }
            writeln!(f, "}}")?;
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn load_schemas(path: &Path) -> Result<SchemaSet> {
    SchemaSet::from_path(path, Mode::FailFast)
        .with_context(|| format!("failed to load schema {}", path.display()))
}

/// The named record type, or the schema's root when no name is given.
fn select_record_type(schemas: &SchemaSet, name: Option<&str>, schema_path: &Path) -> Result<RecordType> {
    match name {
        None => Ok(schemas.root().clone()),
        Some(name) => match schemas.get(name) {
            Some(record_type) => Ok(record_type.clone()),
            None => bail!("record type {name:?} is not declared in {}", schema_path.display()),
        },
    }
}

/// Documents are independent; each worker owns the records it builds.
fn check_documents(record_type: &RecordType, documents: &[Document], mode: Mode) -> CheckReport {
    let outcomes = documents
        .par_iter()
        .map(|doc| Outcome {
            label: format!("{}#{}", doc.source, doc.index),
            result: record_type.from_plain_with(&doc.value, mode),
        })
        .collect();
    CheckReport { outcomes }
}

fn write_ndjson(out: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(out, contents).with_context(|| format!("failed to write {}", out.display()))
}

fn print_rejection(label: &str, record_type: &RecordType, error: &RecordError) {
    println!("{} {} ({})", "rejected".red().bold(), label, record_type.name());
    match error {
        RecordError::Invalid { violations, .. } => {
            for violation in violations {
                println!("    {}: {}", violation.path.to_string().yellow(), violation.message);
            }
        }
        RecordError::UnknownField { .. } => println!("    {error}"),
    }
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern).with_context(|| format!("bad glob pattern {pattern}"))? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // An explicit glob that matched nothing is an error, not an empty run.
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
