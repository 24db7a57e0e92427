//! Aggregator
//!
//! Fans a [`RegionEnumerator`] out over every discovered region and merges
//! the outcomes into one [`Inventory`].

use super::discovery::discover_regions;
use super::worker::{run_region, RegionEnumerator, RegionOutcome};
use super::InventorySettings;
use crate::error::InventoryError;
use crate::provider::CloudApi;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;

/// Records grouped by region, plus per-region diagnostics.
///
/// Serializes as `{"<region>": [...], ..., "DebugErrors": {"<region>": "..."}}`
/// with `DebugErrors` left out when no region failed. Keys are sorted, so the
/// output does not depend on which region finished first.
#[derive(Debug, Serialize)]
pub struct Inventory<R> {
    #[serde(flatten)]
    pub regions: BTreeMap<String, Vec<R>>,
    #[serde(rename = "DebugErrors", skip_serializing_if = "BTreeMap::is_empty")]
    pub diagnostics: BTreeMap<String, String>,
}

impl<R> Default for Inventory<R> {
    fn default() -> Self {
        Self {
            regions: BTreeMap::new(),
            diagnostics: BTreeMap::new(),
        }
    }
}

impl<R> Inventory<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one region's outcome in. Regions with no records and no error
    /// are left out entirely.
    pub fn merge(&mut self, outcome: RegionOutcome<R>) {
        match outcome.result {
            Ok(records) if records.is_empty() => {}
            Ok(records) => {
                self.regions.insert(outcome.region, records);
            }
            Err(failure) => {
                self.diagnostics.insert(outcome.region, failure.description);
            }
        }
    }

    /// Append a single record under `region`
    pub fn push(&mut self, region: &str, record: R) {
        self.regions.entry(region.to_string()).or_default().push(record);
    }

    pub fn record_count(&self) -> usize {
        self.regions.values().map(Vec::len).sum()
    }
}

/// Collect one resource kind across every region of the account.
///
/// Fails only when the region list itself cannot be obtained.
pub async fn collect<C, E>(
    api: &C,
    enumerator: &E,
    settings: &InventorySettings,
) -> Result<Inventory<E::Record>, InventoryError>
where
    C: CloudApi,
    E: RegionEnumerator,
{
    let regions = discover_regions(api, &settings.reference_region).await?;
    let attempted = regions.len();

    let outcomes: Vec<RegionOutcome<E::Record>> = stream::iter(regions)
        .map(|region| run_region(api, enumerator, region, settings.region_timeout))
        .buffer_unordered(settings.concurrency.max(1))
        .collect()
        .await;

    let mut inventory = Inventory::new();
    for outcome in outcomes {
        inventory.merge(outcome);
    }

    tracing::info!(
        "{}: {} records from {} of {} regions, {} failed",
        enumerator.service(),
        inventory.record_count(),
        inventory.regions.len(),
        attempted,
        inventory.diagnostics.len()
    );

    Ok(inventory)
}
