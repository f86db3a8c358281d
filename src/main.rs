// Entry point and high-level CLI flow.
//
// `report` loads a work order export, classifies it against an as-of date and
// writes the monthly, group, late and disposition tables plus a JSON bundle
// for the chart and slide renderers. `classify` stops after classification.
mod cli;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use std::fs;
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{ClassifyArgs, Cli, Commands, ReportArgs};
use wo_governance::classifier::{classify, ClassifyOutcome};
use wo_governance::config::EngineConfig;
use wo_governance::loader::load_work_orders;
use wo_governance::missed::Stoplight;
use wo_governance::output;
use wo_governance::pipeline::prepare_report;
use wo_governance::types::{SummaryRow, WorkOrderRow};
use wo_governance::util::{format_int, format_number};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Report(args) => run_report(args),
        Commands::Classify(args) => run_classify(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(p) => EngineConfig::load(p)
            .with_context(|| format!("failed to read config {}", p.display())),
        None => Ok(EngineConfig::default()),
    }
}

/// The only place the wall clock is consulted.
fn resolve_as_of(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Local::now().date_naive())
}

fn load_and_classify(
    input: &Path,
    as_of: NaiveDate,
    config: &EngineConfig,
) -> Result<ClassifyOutcome> {
    let (records, load_report) = load_work_orders(input, &config.columns)
        .with_context(|| format!("failed to load {}", input.display()))?;
    println!(
        "Processing dataset... ({} rows read, {} loaded)",
        format_int(load_report.total_rows),
        format_int(load_report.loaded_rows)
    );
    if load_report.parse_errors > 0 {
        println!(
            "Note: {} rows skipped due to parse errors.",
            format_int(load_report.parse_errors)
        );
    }
    if load_report.unknown_period > 0 {
        println!(
            "Note: {} rows have no usable date and report as Unassigned.",
            format_int(load_report.unknown_period)
        );
    }

    let outcome = classify(records, as_of, &config.classifier);
    if !outcome.warnings.is_empty() {
        warn!(
            count = outcome.warnings.len(),
            "data quality warnings raised during classification (RUST_LOG=debug lists them)"
        );
    }
    Ok(outcome)
}

fn run_classify(args: ClassifyArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let as_of = resolve_as_of(args.as_of);
    let outcome = load_and_classify(&args.input, as_of, &config)?;

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let rows: Vec<WorkOrderRow> = outcome.records.iter().map(WorkOrderRow::from).collect();
    output::write_csv(&args.output, &rows)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(path = %args.output.display(), rows = rows.len(), "wrote classified work orders");
    Ok(())
}

fn run_report(args: ReportArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let as_of = resolve_as_of(args.as_of);
    let outcome = load_and_classify(&args.input, as_of, &config)?;
    let report = prepare_report(&outcome, as_of, &config, args.work_type.map(Into::into))?;

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("failed to create {}", args.out_dir.display()))?;
    let out = |name: &str| args.out_dir.join(name);

    println!("Generating reports (as of {})...\n", as_of);
    let window_note = format!("{} to {}", report.window_start, report.window_end);
    let group_note = format!("Month {}", report.group_period.label());
    let late_note = format!("> {} days overdue", config.report.extreme_late_days);

    let mut monthly_rows: Vec<SummaryRow> = report.monthly.rows.clone();
    monthly_rows.push(report.monthly_total.clone());
    output::write_csv(&out("monthly_summary.csv"), &monthly_rows).context("monthly summary")?;
    output::preview_table(
        "Monthly Work Order Summary",
        Some(window_note.as_str()),
        &monthly_rows,
        args.preview_rows,
    );

    let mut ytd_rows: Vec<SummaryRow> = report.year_to_date.rows.clone();
    ytd_rows.push(report.year_to_date_total.clone());
    output::write_csv(&out("year_to_date_summary.csv"), &ytd_rows).context("year-to-date summary")?;
    if let Some(previous) = &report.previous_month {
        println!(
            "Previous month {}: {} due, {} missed ({})\n",
            report.group_period.label(),
            previous.due(),
            previous.missed,
            Stoplight::rate(previous.missed, &config.report.stoplight),
        );
    }

    output::write_csv(&out("group_summary.csv"), &report.by_group.rows).context("group summary")?;
    output::preview_table(
        "Work Orders by Group",
        Some(group_note.as_str()),
        &report.by_group.rows,
        args.preview_rows,
    );

    output::write_csv(&out("late_work_orders.csv"), &report.late).context("late listing")?;
    output::write_csv(&out("extreme_late.csv"), &report.extreme_late)
        .context("extreme late listing")?;
    output::preview_table(
        "Extreme Late Work Orders",
        Some(late_note.as_str()),
        &report.extreme_late,
        args.preview_rows,
    );

    output::write_csv(&out("disposition.csv"), &report.disposition).context("disposition")?;
    output::write_json(&out("governance.json"), &report).context("governance bundle")?;

    let stoplights = report.period_series.stoplights(&config.report.stoplight);
    if let (Some(period), Some(light)) = (report.period_series.periods.last(), stoplights.last()) {
        println!("Latest period {}: {}", period, light);
    }
    println!(
        "Governance: {} due, {} completed, {} missed, completion {}%",
        format_int(report.overview.due),
        format_int(report.overview.completed),
        format_int(report.overview.missed),
        format_number(report.overview.completion_percent * 100.0, 1)
    );
    info!(out_dir = %args.out_dir.display(), "reports written");
    Ok(())
}
