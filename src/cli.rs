//! Command-line interface definitions and argument parsing

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use crate::metrics::DEFAULT_ANALYSIS_OFFSET_DAYS;

/// Customer segmentation CLI using quantile-based RFM scoring
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input CSV file
    #[arg(short, long, default_value = "flo_data_20K.csv")]
    pub input: PathBuf,

    /// Reference date for recency, as YYYY-MM-DD.
    /// Defaults to the latest purchase date plus --offset-days
    #[arg(short, long)]
    pub analysis_date: Option<String>,

    /// Days added to the latest purchase date when no analysis date is given
    #[arg(long, default_value_t = DEFAULT_ANALYSIS_OFFSET_DAYS)]
    pub offset_days: u32,

    /// Output path for the scored RFM table
    #[arg(short, long, default_value = "rfm_segments.csv")]
    pub output: PathBuf,

    /// TOML file with [[campaign]] target definitions
    #[arg(short, long)]
    pub campaigns: Option<PathBuf>,

    /// Directory for campaign target lists
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Base path for SVG segment charts
    #[arg(long)]
    pub chart: Option<PathBuf>,

    /// Rows shown in the top-customer tables
    #[arg(long, default_value = "10")]
    pub top: usize,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse the analysis date, if one was given.
    /// Expected format: "YYYY-MM-DD"
    pub fn parse_analysis_date(&self) -> crate::Result<Option<NaiveDate>> {
        if let Some(ref date_str) = self.analysis_date {
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d")
                .map_err(|_| anyhow::anyhow!("Invalid analysis date: {}", date_str))?;
            Ok(Some(date))
        } else {
            Ok(None)
        }
    }
}
