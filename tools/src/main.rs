//! sales-runner: headless front end for the sales metrics core.
//!
//! Usage:
//!   sales-runner augment --input data.csv --output data_aug.csv --seed 12345
//!   sales-runner report --data data_aug.csv --from 2024-01-01 --to 2024-06-30 --category Herramientas
//!   sales-runner report --data data_aug.csv --json

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sales_metrics_core::{
    augmenter::augment_file,
    config::SalesConfig,
    metrics::DashboardReport,
    session::{SalesFilter, SalesSession},
    types::DateRange,
};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about = "Sales dataset augmenter and metrics report")]
struct Args {
    /// JSON config file; built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Expand a seed file into the enriched dataset
    Augment {
        #[arg(long, default_value = "data.csv")]
        input: PathBuf,
        #[arg(long, default_value = "data_aug.csv")]
        output: PathBuf,
        /// Master seed; derived from the clock when omitted
        #[arg(long)]
        seed: Option<u64>,
        /// Overrides the configured number of months forward
        #[arg(long)]
        months: Option<u32>,
    },
    /// Load a dataset, filter it and print every dashboard view
    Report {
        #[arg(long, default_value = "data_aug.csv")]
        data: PathBuf,
        /// First day included (YYYY-MM-DD); defaults to the earliest sale
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day included (YYYY-MM-DD); defaults to the latest sale
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Exact category; every category when omitted
        #[arg(long)]
        category: Option<String>,
        /// Emit the report as JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SalesConfig::load(&path.display().to_string())
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SalesConfig::default(),
    };

    match args.command {
        Command::Augment { input, output, seed, months } => {
            if let Some(months) = months {
                config.augment.months_forward = months;
            }
            let seed = seed.unwrap_or_else(clock_seed);
            log::info!("Augmenting with seed {seed}");
            let report = augment_file(&input, &output, &config.augment, seed)
                .with_context(|| format!("augmenting {}", input.display()))?;

            println!("=== AUGMENT SUMMARY ===");
            println!("  seed:          {}", report.seed);
            println!("  input:         {}", input.display());
            println!("  output:        {}", output.display());
            println!("  seed rows:     {}", report.seed_rows);
            println!("  output rows:   {}", report.output_rows);
            println!("  clamped cells: {}", report.clamped_cells);
            println!("  undated rows:  {}", report.dropped_dates);
        }
        Command::Report { data, from, to, category, json } => {
            let mut session = SalesSession::new(config.metrics.clone());
            let table = session
                .load(&data)
                .with_context(|| format!("loading {}", data.display()))?;
            let options = table
                .filter_options()
                .context("dataset has no dated rows")?;

            let range = DateRange::new(
                from.unwrap_or(options.first_date),
                to.unwrap_or(options.last_date),
            );
            let mut filter = SalesFilter::new(range);
            if let Some(category) = category {
                if !options.categories.contains(&category) {
                    log::warn!("Category {category:?} not present in {}", data.display());
                }
                filter = filter.with_category(category);
            }

            let report = DashboardReport::build(&table, &filter, session.config());
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
    }
    Ok(())
}

fn print_report(report: &DashboardReport) {
    let f = &report.filter;
    println!("=== SALES REPORT ===");
    println!("  range:           {} .. {}", f.dates.start, f.dates.end);
    println!("  category:        {}", f.category.as_deref().unwrap_or("All"));
    println!("  rows:            {}", report.row_count);
    println!("  total revenue:   {:.0}", report.kpis.total_revenue);
    println!("  units sold:      {}", report.kpis.units_sold);
    match report.kpis.average_ticket {
        Some(t) => println!("  avg ticket:      {t:.0}"),
        None => println!("  avg ticket:      -"),
    }
    println!("  unique products: {}", report.kpis.unique_products);

    println!();
    println!("=== TOP PRODUCTS BY UNITS ===");
    for p in &report.top_products {
        println!(
            "  {:<40} {:>8} units | revenue {:>14.0} | avg {:>10.0} | {}",
            p.product, p.units_sold, p.revenue, p.mean_price, p.category
        );
    }

    println!();
    println!("=== MARGIN VS ROTATION ===");
    let mr = &report.margin_rotation;
    println!("  products plotted: {}", mr.products.len());
    println!("  median rotation:  {}", fmt_opt(mr.median_rotation, 1));
    println!("  median margin %:  {}", fmt_opt(mr.median_margin_percent, 1));
    for p in &report.top_by_rotation {
        println!(
            "  {:<40} rotation {:>6} | margin {:>5}%",
            p.product,
            p.rotation,
            fmt_opt(p.mean_margin_percent, 1)
        );
    }

    println!();
    println!("=== SATISFACTION BY CATEGORY ===");
    for c in &report.satisfaction_by_category {
        println!(
            "  {:<30} {:.2} | {:>6} sales | revenue {:>14.0}",
            c.category, c.mean_satisfaction, c.sales_count, c.revenue
        );
    }
    let dist: Vec<String> = report
        .satisfaction_distribution
        .iter()
        .map(|b| format!("{}★ {}", b.score, b.count))
        .collect();
    println!("  distribution: {}", dist.join(" | "));

    println!();
    println!("=== CHANNEL PRICES (vs homecenter) ===");
    for c in &report.channel_prices {
        println!(
            "  {:<30} hc {:>10.0} | amazon {:>10.0} ({:>6}%) | ml {:>10.0} ({:>6}%)",
            c.category,
            c.homecenter,
            c.amazon,
            fmt_opt(c.amazon_diff_percent, 1),
            c.mercadolibre,
            fmt_opt(c.mercadolibre_diff_percent, 1)
        );
    }
    for ch in &report.channel_overview {
        println!(
            "  {:<12} mean rating {}",
            ch.channel.to_string(),
            fmt_opt(ch.mean_rating, 2)
        );
    }

    println!();
    println!("=== MONTHLY REVENUE ===");
    for point in &report.monthly_trend {
        println!("  {} | {:>14.0} | {:>8} units", point.bucket, point.revenue, point.units_sold);
    }
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_else(|| "-".into())
}

fn clock_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
