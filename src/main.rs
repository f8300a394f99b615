//! Campaign Explorer: text and chart report over the filtered campaign dataset
//!
//! This is the main entrypoint that loads the dataset, applies the filter
//! flags, computes every view and renders the charts.

use anyhow::Result;
use campaign_explorer::aggregate::SummaryTable;
use campaign_explorer::summary::{dataset_facts, SpendComparison};
use campaign_explorer::{render_report, Args, ExplorerContext, Report, Session, ViewOutcome};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(level: &str, quiet: bool) {
    let effective_level = if quiet { "warn" } else { level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.quiet);

    let start_time = Instant::now();
    let ctx = Arc::new(ExplorerContext::from_path(&args.input)?);
    info!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "dataset ready"
    );

    let mut session = Session::new(ctx.clone());
    args.apply_to(&mut session)?;
    let report = session.report();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&ctx, &report, args.verbose);
    }

    if !args.no_charts {
        let charts = render_report(&report, Path::new(&args.output_dir))?;
        let failed = charts.iter().filter(|c| c.error.is_some()).count();
        if !args.json {
            println!("\n✓ {} charts written to {}", charts.len() - failed, args.output_dir);
            if failed > 0 {
                println!("  {} charts could not be drawn (see log)", failed);
            }
        }
    }

    info!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "report complete"
    );
    Ok(())
}

fn print_report(ctx: &ExplorerContext, report: &Report, verbose: bool) {
    let facts = dataset_facts(ctx);
    println!("=== Dataset ===");
    println!("Records: {}", facts.records);
    println!("Missing income: {:.2}%", facts.income_missing_pct);
    println!("Response = 1: {:.2}%", facts.response_rate_pct);
    if let (Some(first), Some(last)) = (facts.first_enrollment, facts.last_enrollment) {
        println!("Dt_Customer: {} -> {}", first, last);
    }

    let thresholds = ctx.thresholds();
    if verbose {
        println!("Income p99.5: {:?}", thresholds.income_p995);
        println!("Age at enrollment p99.5: {:?}", thresholds.age_p995);
        println!("Filter: {:?}", report.filter);
    }

    println!("\n=== Filter summary ===");
    match &report.spend_comparison {
        ViewOutcome::Ready(SpendComparison::Complete {
            kpis,
            median_declined,
            median_accepted,
            difference,
        }) => {
            println!(
                "Records: {} | Response = 1: {:.2}%",
                kpis.records, kpis.response_rate_pct
            );
            println!(
                "Median TotalSpend (0): {:.0} | (1): {:.0} | Difference (1-0): {:.0}",
                median_declined, median_accepted, difference
            );
        }
        ViewOutcome::Ready(SpendComparison::MissingGroup { kpis, missing }) => {
            println!(
                "Records: {} | Response = 1: {:.2}%",
                kpis.records, kpis.response_rate_pct
            );
            println!("Spend comparison unavailable: no rows with {}", missing);
        }
        ViewOutcome::NoData(message) | ViewOutcome::Failed(message) => println!("{}", message),
    }

    if let ViewOutcome::Ready(income) = &report.income_summary {
        println!(
            "Income (known {}): mean {:.0} | median {:.0} | p99.5 {:.0}",
            income.known, income.mean, income.median, income.p995
        );
    }

    print_table("Mean purchases by channel", &report.channel_means);
    print_table("Mean spend by category", &report.category_means);
    println!("\nSegmentation: {}", report.segmentation.label());
    print_table("Channel mix (mean share)", &report.channel_mix);
    print_table("Spend composition (mean share)", &report.spend_mix);
    if verbose {
        print_table("Purchase intensity by channel", &report.channel_intensity);
    }
}

fn print_table(title: &str, outcome: &ViewOutcome<SummaryTable>) {
    println!("\n=== {} ===", title);
    match outcome {
        ViewOutcome::Ready(table) => {
            for group in &table.groups {
                let segment = group.key.segment.as_deref().unwrap_or("");
                let values: Vec<String> = table
                    .group_rows(&group.key)
                    .map(|r| format!("{}={:.3}", r.item, r.value))
                    .collect();
                println!(
                    "  {} {:<12} (n={:>4}) {}",
                    group.key.response,
                    segment,
                    group.rows,
                    values.join("  ")
                );
            }
        }
        ViewOutcome::NoData(message) | ViewOutcome::Failed(message) => println!("  {}", message),
    }
}
