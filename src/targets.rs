//! Campaign target lists: segment membership combined with category interest

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

use crate::data::CustomerRecord;
use crate::model::RfmTable;
use crate::segment::Segment;

/// A marketing campaign aimed at some segments and interest categories.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Campaign {
    pub name: String,
    pub segments: Vec<Segment>,
    /// Interest tags, any of which qualifies a customer. Empty selects the
    /// whole segment.
    #[serde(default)]
    pub categories: Vec<String>,
    /// File name for the target list; defaults to `<name>.csv`.
    #[serde(default)]
    pub output: Option<String>,
}

impl Campaign {
    pub fn output_file(&self) -> String {
        self.output
            .clone()
            .unwrap_or_else(|| format!("{}.csv", self.name))
    }

    fn wants(&self, customer: &CustomerRecord) -> bool {
        self.categories.is_empty()
            || self
                .categories
                .iter()
                .any(|category| customer.interested_in(category))
    }
}

/// Set of campaigns, usually loaded from a TOML file with `[[campaign]]` tables.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CampaignConfig {
    #[serde(rename = "campaign", default)]
    pub campaigns: Vec<Campaign>,
}

impl Default for CampaignConfig {
    /// New-brand launch for loyal women's-category shoppers, and a men's and
    /// children's discount for lapsed or new customers.
    fn default() -> Self {
        Self {
            campaigns: vec![
                Campaign {
                    name: "new_brand_targets".to_string(),
                    segments: vec![Segment::Champions, Segment::LoyalCustomers],
                    categories: vec!["KADIN".to_string()],
                    output: Some("new_brand_target_customer_ids.csv".to_string()),
                },
                Campaign {
                    name: "discount_targets".to_string(),
                    segments: vec![
                        Segment::CantLoose,
                        Segment::Hibernating,
                        Segment::NewCustomers,
                    ],
                    categories: vec!["ERKEK".to_string(), "COCUK".to_string()],
                    output: Some("discount_target_customer_ids.csv".to_string()),
                },
            ],
        }
    }
}

impl CampaignConfig {
    pub fn from_toml_str(contents: &str) -> crate::Result<Self> {
        let config: CampaignConfig =
            toml::from_str(contents).context("Invalid campaign configuration")?;
        for campaign in &config.campaigns {
            if campaign.segments.is_empty() {
                anyhow::bail!("Campaign '{}' must list at least one segment", campaign.name);
            }
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&contents)
    }
}

/// Customer ids of `campaign` targets, in table order.
pub fn select_targets(
    customers: &[CustomerRecord],
    table: &RfmTable,
    campaign: &Campaign,
) -> Vec<String> {
    let by_id: HashMap<&str, &CustomerRecord> = customers
        .iter()
        .map(|c| (c.customer_id.as_str(), c))
        .collect();

    let targets: Vec<String> = table
        .in_segments(&campaign.segments)
        .filter(|record| {
            by_id
                .get(record.customer_id.as_str())
                .is_some_and(|customer| campaign.wants(customer))
        })
        .map(|record| record.customer_id.clone())
        .collect();

    debug!(
        campaign = %campaign.name,
        targets = targets.len(),
        "selected campaign targets"
    );
    targets
}
