use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use customer_segments::config::{DEFAULT_CONFIG_PATH, SegmentationConfig};
use customer_segments::models::CustomerDataset;
use customer_segments::processor::{
    CustomerLookup, CustomerReport, MonthPair, SegmentQuery, population_summary,
};
use customer_segments::{SegmentError, SegmentationPipeline};
use polars::prelude::*;
use serde::Serialize;
use std::env;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Customer classification and segmentation over monthly purchase spreadsheets
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Spreadsheet to analyse (.xlsx, .xls, .ods or .csv)
    #[arg(short, long)]
    input: PathBuf,

    /// Configuration file; falls back to SEGMENTS_CONFIG, then the bundled defaults
    #[arg(short, long)]
    config: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the month columns in chronological order
    Columns,
    /// Class distribution of the whole population
    Summary,
    /// Report for a single customer
    Customer {
        #[arg(long, conflicts_with = "name", required_unless_present = "name")]
        code: Option<String>,
        #[arg(long)]
        name: Option<String>,
        /// Month used for the shortfall (defaults to the latest)
        #[arg(long)]
        current: Option<String>,
        /// Month checked against the goal (defaults to the one before the latest)
        #[arg(long)]
        comparison: Option<String>,
    },
    /// Filter customers into a segment
    Segment {
        /// Category to include; repeat for several. Defaults to every category
        #[arg(long = "category")]
        categories: Vec<String>,
        #[arg(long, default_value_t = 0)]
        min_frequency: usize,
        #[arg(long)]
        max_frequency: Option<usize>,
        #[arg(long, default_value_t = 0.0)]
        min_average: f64,
        #[arg(long)]
        max_average: Option<f64>,
        /// Trailing months used for frequency and average
        #[arg(long)]
        window: Option<usize>,
        /// Write the segment to a .csv or .parquet file
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    generated_at: DateTime<Utc>,
    source: &'a str,
    payload: T,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load environment variables
    dotenv::dotenv().ok();

    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .or_else(|| env::var("SEGMENTS_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = SegmentationConfig::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;
    info!("Loaded configuration from {}", config_path);

    let pipeline = SegmentationPipeline::new(config).context("Failed to build pipeline")?;

    let dataset = match pipeline.load_file(&args.input) {
        Ok(dataset) => dataset,
        Err(e) => {
            error!("❌ Could not load {}: {}", args.input.display(), e);
            return Err(e).context("Dataset rejected");
        }
    };
    info!(
        "✅ Loaded {} customers with {} months from {}",
        dataset.len(),
        dataset.months.len(),
        args.input.display()
    );

    let source = args.input.display().to_string();
    match &args.command {
        Command::Columns => run_columns(&args, &source, &dataset),
        Command::Summary => run_summary(&args, &source, &pipeline, &dataset),
        Command::Customer {
            code,
            name,
            current,
            comparison,
        } => {
            let lookup = match (code, name) {
                (Some(code), _) => CustomerLookup::Code(code.clone()),
                (None, Some(name)) => CustomerLookup::Name(name.clone()),
                (None, None) => anyhow::bail!("either --code or --name is required"),
            };
            run_customer(
                &args,
                &source,
                &pipeline,
                &dataset,
                &lookup,
                current.as_deref(),
                comparison.as_deref(),
            )
        }
        Command::Segment {
            categories,
            min_frequency,
            max_frequency,
            min_average,
            max_average,
            window,
            export,
        } => {
            let mut query = if categories.is_empty() {
                pipeline.default_query(&dataset)
            } else {
                SegmentQuery::for_categories(
                    categories.iter().cloned(),
                    pipeline.config().segment.window_months,
                )
            };
            if let Some(window) = window {
                query.window = customer_segments::processor::Window::Last(*window);
            }
            let query = query
                .with_frequency(*min_frequency..=max_frequency.unwrap_or(usize::MAX))
                .with_average(*min_average..=max_average.unwrap_or(f64::MAX));

            run_segment(&args, &source, &pipeline, &dataset, &query, export.as_deref())
        }
    }
}

fn print_json<T: Serialize>(source: &str, payload: T) -> Result<()> {
    let envelope = Envelope {
        generated_at: Utc::now(),
        source,
        payload,
    };
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

fn run_columns(args: &Args, source: &str, dataset: &CustomerDataset) -> Result<()> {
    if args.json {
        return print_json(source, &dataset.months);
    }

    println!("=== Month Columns ({}) ===", dataset.months.len());
    for (position, month) in dataset.months.iter().enumerate() {
        println!("{:>3}. {}", position + 1, month.header);
    }
    Ok(())
}

fn run_summary(args: &Args, source: &str, pipeline: &SegmentationPipeline, dataset: &CustomerDataset) -> Result<()> {
    let population = pipeline.classify(dataset);
    let summary = population_summary(&population);

    if args.json {
        return print_json(source, &summary);
    }

    println!("=== Customer Classes ({} customers) ===", population.len());
    for (class, count) in &summary {
        let percentage = if population.is_empty() {
            0.0
        } else {
            (*count as f64 / population.len() as f64) * 100.0
        };
        println!(
            "{:<13} {:>6} ({:>5.1}%)  {}",
            class.label(),
            count,
            percentage,
            pipeline.actions().action(*class)
        );
    }
    Ok(())
}

fn run_customer(
    args: &Args,
    source: &str,
    pipeline: &SegmentationPipeline,
    dataset: &CustomerDataset,
    lookup: &CustomerLookup,
    current: Option<&str>,
    comparison: Option<&str>,
) -> Result<()> {
    let population = pipeline.classify(dataset);

    let result = if current.is_some() || comparison.is_some() {
        let pair = MonthPair::resolve(dataset, current, comparison)?;
        pipeline.report_with_months(dataset, &population, lookup, pair)
    } else {
        pipeline.report(dataset, &population, lookup)
    };

    let report = match result {
        Ok(report) => report,
        Err(SegmentError::CustomerNotFound(key)) => {
            warn!("⚠️ No customer found for '{}'", key);
            println!("No matches for '{}'", key);
            if let CustomerLookup::Name(name) = lookup {
                let similar = dataset.names_containing(name);
                if !similar.is_empty() {
                    println!("Similar names:");
                    for candidate in similar.iter().take(10) {
                        println!("   {}", candidate);
                    }
                }
            }
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if args.json {
        return print_json(source, &report);
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &CustomerReport) {
    println!("=== Customer: {} ===", report.legal_name);
    println!("Code:      {}", report.code);
    println!("Category:  {} ({})", report.category_raw, report.effective_category);
    println!("Email:     {}", CustomerReport::display_field(&report.email));
    println!("Province:  {}", CustomerReport::display_field(&report.province));
    println!("Phone:     {}", CustomerReport::display_field(&report.phone));
    println!(
        "Average ({} months, incl. zeros): ${:.2}",
        report.window_months, report.window_average
    );
    println!("Total ({} months): ${:.2}", report.window_months, report.window_total);
    println!("Discount:  {}", report.discount_label);
    println!("Class:     {}", report.class);
    println!("Action:    {}", report.action);

    println!("\n=== Monthly Purchases ===");
    for point in &report.history {
        println!("{:<20} ${:>15.0}", point.month, point.amount);
    }

    println!("\n=== Goal ===");
    match (&report.goal.comparison_month, report.goal.met_goal) {
        (Some(month), Some(met)) => println!(
            "Goal met in {}: {} (${:.0} vs ${:.0})",
            month,
            if met { "yes" } else { "no" },
            report.goal.comparison_amount.unwrap_or_default(),
            report.goal.goal_amount
        ),
        _ => println!("Not enough months to evaluate a past goal"),
    }
    println!(
        "Shortfall for {}: ${:.0}",
        report.goal.current_month, report.goal.shortfall
    );
}

fn run_segment(
    args: &Args,
    source: &str,
    pipeline: &SegmentationPipeline,
    dataset: &CustomerDataset,
    query: &SegmentQuery,
    export: Option<&Path>,
) -> Result<()> {
    let population = pipeline.classify(dataset);
    let segment = pipeline.segment(dataset, &population, query);

    if segment.window_truncated {
        warn!(
            "⚠️ Only {} months of data; filters use every available month",
            segment.window_months
        );
    }

    if let Some(path) = export {
        let mut df = segment.to_dataframe()?;
        write_frame(&mut df, path)?;
        info!("Stored segment of {} customers at {}", segment.len(), path.display());
    }

    if args.json {
        return print_json(source, &segment);
    }

    println!("=== Segment ({} customers) ===", segment.len());
    if segment.is_empty() {
        println!("No matches for the selected filters");
        return Ok(());
    }

    for member in &segment.members {
        let record = member.customer.record;
        println!(
            "{:<10} {:<35} {:<15} freq={:>2} avg=${:>12.0} {}",
            record.code,
            record.legal_name,
            record.effective_category,
            member.frequency,
            member.average_inclusive,
            member.customer.class
        );
    }

    println!("\n=== Class Distribution ===");
    for (class, count) in segment.class_distribution() {
        if count > 0 {
            println!("{:<13} {}", class.label(), count);
        }
    }
    Ok(())
}

fn write_frame(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") => {
            ParquetWriter::new(&mut file).finish(df)?;
        }
        _ => {
            CsvWriter::new(&mut file).include_header(true).finish(df)?;
        }
    }
    Ok(())
}
