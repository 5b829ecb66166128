//! Minimal CLI: check data files against their schemas, or pretty-print.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::error::{LoadError, ParseError, context_at};
use crate::reader;
use crate::stringify::{self, Style};

// -------------------------------- Types ----------------------------------- //

/// check notation files against their schemas, or pretty-print them
#[derive(Parser, Debug)]
#[command(name = "nota", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// parse files and check each against its schema
    Check(CheckSettings),
    /// parse one file and pretty-print it
    Print(PrintSettings),
}

#[derive(Args, Debug)]
struct CheckSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,

    /// check against this schema instead of each file's @schema directive
    #[arg(long)]
    schema: Option<PathBuf>,

    /// emit a machine-readable JSON report instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct PrintSettings {
    /// input data file
    file: PathBuf,

    /// indent unit
    #[arg(long, default_value = "  ")]
    indent: String,

    /// paint scalars with ANSI colors
    #[arg(long, default_value_t = false)]
    color: bool,

    /// output file (stdout if omitted)
    #[arg(short, long)]
    out: Option<PathBuf>,
}

// ----------------------------- Implementation ------------------------------ //

struct FileReport {
    path: PathBuf,
    outcome: Result<(), LoadError>,
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Check(settings) => settings.run(),
            Command::Print(settings) => settings.run(),
        }
    }
}

impl CheckSettings {
    fn run(&self) -> anyhow::Result<()> {
        let files = resolve_file_path_patterns(&self.input)?;
        if files.is_empty() {
            return Err(anyhow!("no input files"));
        }

        // Files are independent; load and check in parallel, report in the
        // original order.
        let reports: Vec<FileReport> = files
            .par_iter()
            .map(|path| FileReport {
                path: path.clone(),
                outcome: reader::load_file(path, self.schema.as_deref()).map(|_| ()),
            })
            .collect();

        if self.json {
            self.emit_json(&reports)?;
        } else {
            self.emit_text(&reports);
        }

        let failed = reports.iter().filter(|r| r.outcome.is_err()).count();
        if failed > 0 {
            return Err(anyhow!("{failed} of {} file(s) failed", reports.len()));
        }
        Ok(())
    }

    fn emit_text(&self, reports: &[FileReport]) {
        for report in reports {
            let name = report.path.display();
            match &report.outcome {
                Ok(()) => println!("{} {name}", "ok".green()),
                Err(error) => {
                    println!("{} {name}", "FAIL".red());
                    self.print_error(report, error);
                }
            }
        }
    }

    fn print_error(&self, report: &FileReport, error: &LoadError) {
        match error {
            LoadError::Io { .. } => println!("  {error}"),
            LoadError::DataErrors(errors) => print_parse_errors(&report.path, errors),
            LoadError::SchemaErrors(errors) => match &self.schema {
                Some(path) => print_parse_errors(path, errors),
                // The directive path is internal to the loader; fall back to
                // offset display.
                None => {
                    for e in errors {
                        println!("  schema: {e}");
                    }
                }
            },
            LoadError::CheckErrors(errors) => {
                for e in errors {
                    println!("  {e}");
                }
            }
        }
    }

    fn emit_json(&self, reports: &[FileReport]) -> anyhow::Result<()> {
        let entries: Vec<serde_json::Value> = reports
            .iter()
            .map(|report| match &report.outcome {
                Ok(()) => serde_json::json!({
                    "file": report.path,
                    "ok": true,
                }),
                Err(error) => serde_json::json!({
                    "file": report.path,
                    "ok": false,
                    "kind": error_kind(error),
                    "errors": error_list(error),
                }),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        Ok(())
    }
}

fn error_kind(error: &LoadError) -> &'static str {
    match error {
        LoadError::Io { .. } => "io",
        LoadError::DataErrors(_) => "data-parse",
        LoadError::SchemaErrors(_) => "schema-parse",
        LoadError::CheckErrors(_) => "check",
    }
}

fn error_list(error: &LoadError) -> serde_json::Value {
    match error {
        LoadError::Io { .. } => serde_json::json!([error.to_string()]),
        LoadError::DataErrors(errors) | LoadError::SchemaErrors(errors) => {
            serde_json::json!(errors)
        }
        LoadError::CheckErrors(errors) => serde_json::json!(errors),
    }
}

fn print_parse_errors(path: &Path, errors: &[ParseError]) {
    let text = fs::read_to_string(path).unwrap_or_default();
    for e in errors {
        let cx = context_at(&text, e.offset);
        println!("  {}:{}: {}", cx.line_number, cx.column + 1, e.message);
        if !cx.line.is_empty() {
            println!("    {}", cx.line);
        }
    }
}

impl PrintSettings {
    fn run(&self) -> anyhow::Result<()> {
        let text = fs::read_to_string(&self.file)
            .with_context(|| format!("failed to read {}", self.file.display()))?;
        let value = match crate::parse::parse_data(&text) {
            Ok(value) => value,
            Err(errors) => {
                print_parse_errors(&self.file, &errors);
                return Err(anyhow!(
                    "{} parse error(s) in {}",
                    errors.len(),
                    self.file.display()
                ));
            }
        };
        let style = Style { indent: self.indent.clone(), color: self.color };
        let rendered = stringify::stringify_styled(&value, &style);
        match &self.out {
            Some(out) => {
                if let Some(parent) = out.parent() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("failed to create {}", parent.display()))?;
                }
                fs::write(out, format!("{rendered}\n"))
                    .with_context(|| format!("failed to write {}", out.display()))?;
            }
            None => println!("{rendered}"),
        }
        Ok(())
    }
}

// ---------------------------- Internal helpers ----------------------------- //

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
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
                // Pattern was explicitly a glob but matched nothing.
                return Err(anyhow!("glob pattern matched no files: {pattern}"));
            }
        } else {
            // Literal path; existence is checked at load time.
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}

// -------------------------------- Tests ----------------------------------- //
