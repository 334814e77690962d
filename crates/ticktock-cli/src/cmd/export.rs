//! `tt export`: write every ticket to a spreadsheet-friendly file.

use std::path::{Path, PathBuf};

use super::{Context, Session};
use crate::output::render;
use anyhow::Context as _;
use clap::Args;
use serde::Serialize;
use ticktock_core::export::{DEFAULT_EXPORT_STEM, ExportFormat, export_to_path};
use tracing::info;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// File format: csv or json. Defaults to the output file's extension,
    /// else csv.
    #[arg(long = "file-format", value_name = "FORMAT", value_parser = parse_format)]
    pub file_format: Option<ExportFormat>,

    /// Destination file (default: tickets.csv or tickets.json).
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

fn parse_format(raw: &str) -> Result<ExportFormat, String> {
    raw.parse()
}

fn format_from_path(path: &Path) -> Option<ExportFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| ext.parse().ok())
}

impl ExportArgs {
    fn resolve(&self) -> (ExportFormat, PathBuf) {
        let format = self
            .file_format
            .or_else(|| self.output.as_deref().and_then(format_from_path))
            .unwrap_or_default();
        let path = self.output.clone().unwrap_or_else(|| {
            PathBuf::from(format!("{DEFAULT_EXPORT_STEM}.{}", format.extension()))
        });
        (format, path)
    }
}

#[derive(Debug, Serialize)]
struct ExportOutput {
    path: String,
    format: &'static str,
    rows: usize,
}

pub fn run_export(args: &ExportArgs, ctx: &Context) -> anyhow::Result<()> {
    let session = Session::open(ctx)?;
    let (format, path) = args.resolve();
    let records = session.store.export_records();

    export_to_path(&records, format, &path)
        .with_context(|| format!("exporting to {}", path.display()))?;
    info!(path = %path.display(), rows = records.len(), "export written");

    let output = ExportOutput {
        path: path.display().to_string(),
        format: format.extension(),
        rows: records.len(),
    };
    render(ctx.output, &output, |o, w| {
        writeln!(w, "✓ exported {} ticket(s) to {}", o.rows, o.path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: ExportArgs,
    }

    #[test]
    fn defaults_to_tickets_csv() {
        let w = Wrapper::parse_from(["test"]);
        assert_eq!(w.args.resolve(), (ExportFormat::Csv, PathBuf::from("tickets.csv")));
    }

    #[test]
    fn json_extension_picks_json() {
        let w = Wrapper::parse_from(["test", "-o", "out/day.json"]);
        assert_eq!(w.args.resolve().0, ExportFormat::Json);
    }

    #[test]
    fn explicit_format_names_default_file() {
        let w = Wrapper::parse_from(["test", "--file-format", "json"]);
        assert_eq!(w.args.resolve(), (ExportFormat::Json, PathBuf::from("tickets.json")));
    }

    #[test]
    fn explicit_format_beats_extension() {
        let w = Wrapper::parse_from(["test", "--file-format", "csv", "-o", "x.json"]);
        assert_eq!(w.args.resolve(), (ExportFormat::Csv, PathBuf::from("x.json")));
    }
}
