//! Inventory core
//!
//! Region fan-out, pagination, normalization and merging. The core only
//! talks to the cloud through [`CloudApi`](crate::provider::CloudApi), so
//! every piece here can run against an in-memory provider.
//!
//! # Architecture
//!
//! - [`discovery`] - lists the regions to fan out over
//! - [`fetcher`] - drives page cursors to completion
//! - [`normalize`] - get-with-default accessors and timestamp formatting
//! - [`worker`] - one region, failures absorbed into a [`RegionOutcome`]
//! - [`aggregator`] - bounded concurrent fan-out and single-writer merge
//! - [`instances`], [`clusters`], [`databases`], [`buckets`] - one per kind
//! - [`response`] - the `statusCode`/`headers`/`body` envelope
//!
//! # Example
//!
//! ```ignore
//! use cloud_inventory::inventory::{handle, InventorySettings, ResourceKind};
//!
//! async fn example(api: &impl cloud_inventory::provider::CloudApi) {
//!     let settings = InventorySettings::default();
//!     let response = handle(api, ResourceKind::Instances, &settings, &serde_json::Value::Null).await;
//!     println!("{}", response.body);
//! }
//! ```

pub mod aggregator;
pub mod buckets;
pub mod clusters;
pub mod databases;
pub mod discovery;
pub mod fetcher;
pub mod instances;
pub mod normalize;
pub mod response;
pub mod worker;

pub use aggregator::{collect, Inventory};
pub use buckets::collect_buckets;
pub use clusters::Clusters;
pub use databases::Databases;
pub use instances::Instances;
pub use response::HandlerResponse;
pub use worker::{RegionEnumerator, RegionOutcome};

use crate::provider::CloudApi;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// Resource kinds the collector knows how to enumerate
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ResourceKind {
    /// EC2 instances
    Instances,
    /// EKS clusters
    Clusters,
    /// RDS database instances
    Databases,
    /// S3 buckets
    Buckets,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Instances => "instances",
            ResourceKind::Clusters => "clusters",
            ResourceKind::Databases => "databases",
            ResourceKind::Buckets => "buckets",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Knobs for one inventory run
#[derive(Debug, Clone, PartialEq)]
pub struct InventorySettings {
    /// Region asked for the region list
    pub reference_region: String,
    /// Region of buckets without a location constraint
    pub default_bucket_region: String,
    /// Regions (or buckets) processed at once
    pub concurrency: usize,
    /// Give up on a region after this long; `None` waits forever
    pub region_timeout: Option<Duration>,
}

impl Default for InventorySettings {
    fn default() -> Self {
        Self {
            reference_region: "us-east-1".to_string(),
            default_bucket_region: "us-east-1".to_string(),
            concurrency: 8,
            region_timeout: Some(Duration::from_secs(60)),
        }
    }
}

/// Handle one inventory request.
///
/// `_context` is the invoker's request payload; nothing in it affects the
/// inventory. Always returns a response: 200 for complete or partial
/// inventories, 500 when the regions (or buckets) could not be listed.
pub async fn handle<C: CloudApi>(
    api: &C,
    kind: ResourceKind,
    settings: &InventorySettings,
    _context: &Value,
) -> HandlerResponse {
    tracing::info!("Inventory request for {}", kind);

    let response = match kind {
        ResourceKind::Instances => collect(api, &Instances, settings)
            .await
            .map(|inventory| HandlerResponse::ok(&inventory)),
        ResourceKind::Clusters => collect(api, &Clusters, settings)
            .await
            .map(|inventory| HandlerResponse::ok(&inventory)),
        ResourceKind::Databases => collect(api, &Databases, settings)
            .await
            .map(|inventory| HandlerResponse::ok(&inventory)),
        ResourceKind::Buckets => collect_buckets(api, settings)
            .await
            .map(|inventory| HandlerResponse::ok(&inventory)),
    };

    response.unwrap_or_else(|err| HandlerResponse::failure(&err))
}
