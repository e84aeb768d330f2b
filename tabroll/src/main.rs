//! # tabroll
//!
//! A CLI for generating grouped tabular reports with per-level totals.
//!
//! ## Overview
//!
//! tabroll is built on top of tabrollib. It reads a report definition
//! (columns and grouping levels, JSON) plus flat CSV data, and renders a
//! grouped report with subtotals to one of several output formats.
//!
//! ## Usage
//!
//! ```bash
//! # HTML report to stdout
//! tabroll report.json data.csv
//!
//! # CSV output including totals rows
//! tabroll report.json data.csv --format csv --totals
//!
//! # XLSX workbook (requires an output file)
//! tabroll report.json data.csv --format xlsx --output report.xlsx
//!
//! # Paginated plain text, 80 columns by 50 lines
//! tabroll report.json data.csv --format text --page-width 80 --page-lines 50
//! ```
//!
//! Input rows must be sorted by the grouping columns; the engine detects
//! group boundaries by comparing consecutive rows, exactly like a
//! control-break report writer.

mod config;

use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use console::Style;
use tabrollib::{
    Column, ColumnFormat, DelimitedSink, Destination, HtmlOptions, HtmlSink, OutputFormat,
    PagedSink, Record, Report, Sink, TextPageDevice, Value, WorkbookSink,
};

use config::ReportDefinition;

/// Build the clap Command structure
fn build_command() -> Command {
    Command::new("tabroll")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Grouped tabular report generator with per-level totals")
        .arg(
            Arg::new("definition")
                .help("Report definition file (JSON: columns and levels)")
                .required(true),
        )
        .arg(
            Arg::new("data")
                .help("Input data file (CSV with a header row)")
                .required(true),
        )
        .arg(
            Arg::new("format")
                .short('F')
                .long("format")
                .value_parser(["html", "csv", "tsv", "xlsx", "text"])
                .default_value("html")
                .help("Output format"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Write output to a file instead of stdout (required for xlsx)"),
        )
        .arg(
            Arg::new("title")
                .short('t')
                .long("title")
                .help("Report title (overrides the definition file)"),
        )
        .arg(
            Arg::new("totals")
                .long("totals")
                .action(ArgAction::SetTrue)
                .help("Include totals rows in csv/tsv output"),
        )
        .arg(
            Arg::new("show-keys")
                .long("show-keys")
                .action(ArgAction::SetTrue)
                .help("Never suppress duplicate group-key values"),
        )
        .arg(
            Arg::new("suppress-keys")
                .long("suppress-keys")
                .action(ArgAction::SetTrue)
                .help("Suppress duplicate group-key values in csv/tsv output"),
        )
        .arg(
            Arg::new("fragment")
                .long("fragment")
                .action(ArgAction::SetTrue)
                .help("Emit an HTML table fragment instead of a complete document"),
        )
        .arg(
            Arg::new("page-width")
                .long("page-width")
                .value_parser(clap::value_parser!(usize))
                .default_value("100")
                .help("Page width in characters (text format)"),
        )
        .arg(
            Arg::new("page-lines")
                .long("page-lines")
                .value_parser(clap::value_parser!(usize))
                .default_value("60")
                .help("Lines per page (text format)"),
        )
}

/// Read CSV data into records, typing fields by the column definitions.
fn read_records(path: &str, columns: &[Column]) -> anyhow::Result<Vec<Record>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to read data file '{}'", path))?;
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for result in reader.records() {
        let raw = result?;
        let mut record = Record::new();
        for (header, field) in headers.iter().zip(raw.iter()) {
            let is_number = columns
                .iter()
                .any(|c| c.name == header && c.format == ColumnFormat::Number);
            let value = if is_number {
                match field.trim().parse::<f64>() {
                    Ok(n) => Value::Num(n),
                    Err(_) => Value::Str(field.to_string()),
                }
            } else {
                Value::Str(field.to_string())
            };
            record.set(header, value);
        }
        records.push(record);
    }
    Ok(records)
}

/// Drive a report over all records and finish it.
fn run_report<S: Sink>(mut report: Report<S>, records: &[Record]) -> anyhow::Result<Report<S>> {
    for record in records {
        report.output_row(record)?;
    }
    report.finish()?;
    Ok(report)
}

/// Pick the destination for text-producing sinks.
fn destination(output: Option<&String>) -> anyhow::Result<Destination> {
    match output {
        Some(path) => Destination::file(path)
            .with_context(|| format!("failed to create output file '{}'", path)),
        None => Ok(Destination::writer(std::io::stdout())),
    }
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let definition_path = matches
        .get_one::<String>("definition")
        .expect("definition is required");
    let data_path = matches.get_one::<String>("data").expect("data is required");
    let output = matches.get_one::<String>("output");
    let format = OutputFormat::from_name(
        matches
            .get_one::<String>("format")
            .map(|s| s.as_str())
            .unwrap_or("html"),
    );

    let definition = ReportDefinition::load(definition_path)
        .with_context(|| format!("failed to load report definition '{}'", definition_path))?;
    let columns = definition.columns();
    let levels = definition.levels();
    if columns.is_empty() {
        bail!("report definition has no columns");
    }

    let title = matches
        .get_one::<String>("title")
        .cloned()
        .unwrap_or_else(|| definition.title.clone());

    let records = read_records(data_path, &columns)?;

    let show_keys = matches.get_flag("show-keys");
    match format {
        OutputFormat::Html => {
            let options = HtmlOptions {
                complete_document: !matches.get_flag("fragment"),
                show_group_keys: show_keys,
                ..HtmlOptions::default()
            };
            let sink = HtmlSink::with_destination(options, destination(output)?);
            run_report(Report::new(columns, levels, sink).title(title), &records)?;
        }
        OutputFormat::Csv | OutputFormat::Tsv => {
            let dest = destination(output)?;
            let sink = if format == OutputFormat::Csv {
                DelimitedSink::csv(dest)
            } else {
                DelimitedSink::tsv(dest)
            };
            let sink = sink
                .with_totals(matches.get_flag("totals"))
                .with_group_keys(!matches.get_flag("suppress-keys"));
            run_report(Report::new(columns, levels, sink).title(title), &records)?;
        }
        OutputFormat::Xlsx => {
            let Some(path) = output else {
                bail!("xlsx output requires --output <FILE>");
            };
            let sink = WorkbookSink::to_path(path).with_group_keys(show_keys);
            run_report(Report::new(columns, levels, sink).title(title), &records)?;
        }
        OutputFormat::Text => {
            let width = *matches.get_one::<usize>("page-width").unwrap_or(&100);
            let lines = *matches.get_one::<usize>("page-lines").unwrap_or(&60);
            let device = TextPageDevice::with_geometry(destination(output)?, width, lines);
            let sink = PagedSink::new(device).with_group_keys(show_keys);
            run_report(Report::new(columns, levels, sink).title(title), &records)?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = build_command().get_matches();
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", Style::new().red().bold().apply_to("Error:"), e);
            ExitCode::FAILURE
        }
    }
}
