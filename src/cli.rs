//! Minimal CLI: check documents against a schema, or normalize a schema.
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use json_vet::{describe, document, issue::display_path, SafeParseResult, Schema, Value};
use tracing::debug;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// validate JSON/NDJSON documents against a JSON-Schema document
#[derive(Parser, Debug)]
#[command(name = "json-vet", version, about)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// validate every input and print each issue with its path
    Check(CheckOut),
    /// compile the schema document and print its normalized JSON Schema
    Normalize(NormalizeOut),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0/payload)
    #[arg(long)]
    json_pointer: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(clap::Parser, Debug)]
struct CheckOut {
    /// JSON-Schema document to validate against
    #[arg(long, short)]
    schema: PathBuf,

    #[command(flatten)]
    input_settings: InputSettings,

    /// print one JSON report per document instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(clap::Parser, Debug)]
struct NormalizeOut {
    /// JSON-Schema document to compile
    #[arg(long, short)]
    schema: PathBuf,

    /// output .json file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

/// One document pulled out of an input file.
struct Sample {
    source: String,
    /// 1-based line for NDJSON inputs.
    line: Option<usize>,
    value: serde_json::Value,
}

impl Sample {
    fn label(&self) -> String {
        match self.line {
            Some(line) => format!("{}:{line}", self.source),
            None => self.source.clone(),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl InputSettings {
    fn load_process(&self, mut apply: impl FnMut(Sample) -> Result<()>) -> Result<()> {
        let source_paths = resolve_file_path_patterns(&self.input).context("failed to resolve input file paths")?;
        for source_path in source_paths {
            let source = source_path.to_string_lossy().to_string();
            let text = std::fs::read_to_string(&source_path)
                .with_context(|| format!("failed to read source file {source}"))?;
            if self.ndjson {
                for (i, line) in text.lines().enumerate() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let value = serde_json::from_str(line)
                        .with_context(|| format!("failed to parse JSON at {source}:{}", i + 1))?;
                    apply(self.select(Sample { source: source.clone(), line: Some(i + 1), value })?)?;
                }
            } else {
                let value = serde_json::from_str(&text)
                    .with_context(|| format!("failed to parse JSON source file ({source})"))?;
                apply(self.select(Sample { source, line: None, value })?)?;
            }
        }
        Ok(())
    }

    fn select(&self, mut sample: Sample) -> Result<Sample> {
        if let Some(pointer) = &self.json_pointer {
            sample.value = sample
                .value
                .pointer(pointer)
                .cloned()
                .ok_or_else(|| anyhow!("JSON pointer {pointer} matched nothing in {}", sample.label()))?;
        }
        Ok(sample)
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    /// Returns `false` when any checked document failed validation.
    pub fn run(&self) -> Result<bool> {
        match &self.cmd {
            Command::Check(target) => {
                let schema = load_schema(&target.schema)?;
                let mut failed = 0usize;
                let mut total = 0usize;
                target.input_settings.load_process(|sample| {
                    total += 1;
                    if !report(&schema, &sample, target.json)? {
                        failed += 1;
                    }
                    Ok(())
                })?;
                debug!(total, failed, "check finished");
                if !target.json {
                    let summary = format!("{failed} of {total} document(s) failed");
                    if failed == 0 {
                        eprintln!("{}", summary.green());
                    } else {
                        eprintln!("{}", summary.red().bold());
                    }
                }
                Ok(failed == 0)
            }
            Command::Normalize(target) => {
                let schema = load_schema(&target.schema)?;
                let schema_src = serde_json::to_string_pretty(&describe::to_json_schema(&schema))?;
                if let Some(out) = target.out.as_ref() {
                    if let Some(parent) = out.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(out, &schema_src).with_context(|| format!("failed to write {}", out.display()))?;
                } else {
                    println!("{schema_src}");
                }
                Ok(true)
            }
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn load_schema(path: &Path) -> Result<Schema> {
    document::load_schema_file(path).with_context(|| format!("failed to load schema {}", path.display()))
}

/// Print the outcome for one document; `true` when it passed.
fn report(schema: &Schema, sample: &Sample, json: bool) -> Result<bool> {
    let outcome = schema.safe_parse(Value::from(&sample.value))?;
    if json {
        let issues = outcome.error().map(|e| e.to_json()).unwrap_or_else(|| serde_json::json!([]));
        let line = serde_json::json!({
            "source": sample.source,
            "line": sample.line,
            "success": outcome.is_success(),
            "issues": issues,
        });
        println!("{line}");
        return Ok(outcome.is_success());
    }
    match outcome {
        SafeParseResult::Success(_) => {
            println!("{} {}", "ok".green().bold(), sample.label());
            Ok(true)
        }
        SafeParseResult::Failure(err) => {
            println!("{} {}", "FAIL".red().bold(), sample.label());
            for issue in err.issues() {
                let at = if issue.path.is_empty() { "(root)".to_string() } else { display_path(&issue.path) };
                println!("  {} {} {}", at.cyan(), issue.message, format!("[{}]", issue.code()).dimmed());
            }
            Ok(false)
        }
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
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
