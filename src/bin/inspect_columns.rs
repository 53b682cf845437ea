use anyhow::{Context, Result};
use customer_segments::config::{DEFAULT_CONFIG_PATH, SegmentationConfig};
use customer_segments::loader::SpreadsheetLoader;
use customer_segments::processor::{SchemaNormalizer, normalize_header};
use std::env;
use std::path::PathBuf;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let input: PathBuf = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: inspect_columns <spreadsheet>")?;

    let config_path = env::var("SEGMENTS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = SegmentationConfig::load(&config_path)?;
    let normalizer = SchemaNormalizer::new(&config.normalizer)?;

    println!("=== INSPECTING COLUMN DISCOVERY ===\n");

    let df = SpreadsheetLoader::load(&input)?;
    println!("1. Raw headers ({}):", df.width());
    let headers: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| {
            let normalized = normalize_header(name);
            println!("   {:<30} -> {}", name.as_str(), normalized);
            normalized
        })
        .collect();

    let description = normalizer.describe(&headers);

    println!("\n2. Month columns in chronological order ({}):", description.months.len());
    for month in &description.months {
        println!(
            "   {:<30} period={} index={}",
            month.header, month.period, month.index
        );
    }

    println!("\n3. Dropped columns ({}):", description.dropped.len());
    for dropped in &description.dropped {
        println!("   {:<30} {:?}", dropped.header, dropped.reason);
    }

    println!("\n4. Descriptive columns ({}):", description.other.len());
    for header in &description.other {
        println!("   {}", header);
    }

    if description.months.is_empty() {
        println!("\n❌ No valid month columns: the dataset would be rejected");
    } else {
        let dataset = normalizer.normalize(&df)?;
        println!("\n✅ {} customers normalized", dataset.len());
        println!("   Categories: {:?}", dataset.categories());
    }

    Ok(())
}
