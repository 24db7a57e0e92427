//! Provider interface
//!
//! The inventory core talks to the cloud only through [`CloudApi`]. Each
//! method is one provider call; pagination is driven by the caller.
//! Descriptors are handed back as decoded JSON trees, shaped the way the
//! provider sends them.

use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::Value;

/// One page of a paginated call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub items: Vec<Value>,
    pub next_token: Option<String>,
}

impl Page {
    pub fn new(items: Vec<Value>, next_token: Option<String>) -> Self {
        Self { items, next_token }
    }

    /// A page with no continuation
    pub fn last(items: Vec<Value>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

#[async_trait]
pub trait CloudApi: Send + Sync {
    /// List the regions enabled for the account, asking `reference_region`
    async fn list_regions(&self, reference_region: &str) -> Result<Vec<String>, ApiError>;

    /// One page of compute instances (reservations already flattened)
    async fn describe_instances(
        &self,
        region: &str,
        next_token: Option<&str>,
    ) -> Result<Page, ApiError>;

    /// One page of managed cluster names
    async fn list_clusters(&self, region: &str, next_token: Option<&str>)
        -> Result<Page, ApiError>;

    /// Full descriptor of one managed cluster
    async fn describe_cluster(&self, region: &str, name: &str) -> Result<Value, ApiError>;

    /// One page of managed database instances
    async fn describe_db_instances(
        &self,
        region: &str,
        marker: Option<&str>,
    ) -> Result<Page, ApiError>;

    /// One page of buckets (global, not per region)
    async fn list_buckets(&self, continuation_token: Option<&str>) -> Result<Page, ApiError>;

    /// Raw location constraint of a bucket. `None` for classic buckets.
    async fn get_bucket_location(&self, bucket: &str) -> Result<Option<String>, ApiError>;

    /// Versioning configuration document of a bucket
    async fn get_bucket_versioning(&self, bucket: &str, region: &str) -> Result<Value, ApiError>;

    /// Default encryption configuration document of a bucket
    async fn get_bucket_encryption(&self, bucket: &str, region: &str) -> Result<Value, ApiError>;
}
