//! rfm-segmenter: RFM customer segmentation CLI
//!
//! Loads customer records, scores and segments them, prints descriptive
//! statistics, and writes the RFM table plus campaign target lists.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use rfm_segmenter::{
    analysis_date_after_latest, build_rfm_table, generate_segment_charts, load_customers, report,
    select_targets, write_customer_ids, write_rfm_table, Args, CampaignConfig,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .compact()
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let start_time = Instant::now();

    // Step 1: Load customers
    let customers = load_customers(&args.input)?;
    info!(customers = customers.len(), input = %args.input.display(), "loaded customers");
    report::print_dataset_overview(&customers, args.top);

    // Step 2: Score and segment
    let analysis_date = match args.parse_analysis_date()? {
        Some(date) => date,
        None => analysis_date_after_latest(&customers, args.offset_days)
            .context("Input contains no purchase dates to anchor the analysis date")?,
    };
    let table = build_rfm_table(&customers, analysis_date)?;
    report::print_segment_summary(&table);

    write_rfm_table(&args.output, &table)?;
    println!("\nRFM table saved to: {}", args.output.display());

    // Step 3: Campaign target lists
    let campaigns = match &args.campaigns {
        Some(path) => CampaignConfig::load(path)?,
        None => CampaignConfig::default(),
    };
    std::fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Failed to create {}", args.output_dir.display()))?;

    println!("\n=== Campaign Targets ===");
    for campaign in &campaigns.campaigns {
        let targets = select_targets(&customers, &table, campaign);
        let path = args.output_dir.join(campaign.output_file());
        write_customer_ids(&path, &targets)?;
        println!(
            "{}: {} customers saved to {}",
            campaign.name,
            targets.len(),
            path.display()
        );
    }

    // Step 4: Charts
    if let Some(chart) = &args.chart {
        generate_segment_charts(&table, chart)?;
    }

    let elapsed = start_time.elapsed();
    println!("\nTotal processing time: {:.2}s", elapsed.as_secs_f64());

    Ok(())
}
