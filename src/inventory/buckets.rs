//! Object storage buckets (S3)
//!
//! Buckets are global: they are listed once and then placed under the region
//! each one lives in. The per-bucket lookups (location, versioning,
//! encryption) never drop a bucket; a failed lookup becomes a sentinel.

use super::aggregator::Inventory;
use super::fetcher::fetch_all;
use super::normalize::{as_list, get_str, str_or_na, timestamp_or_na};
use super::InventorySettings;
use crate::error::{ApiError, InventoryError};
use crate::provider::CloudApi;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::Value;

/// Region reported when the location lookup itself fails
pub const UNKNOWN_REGION: &str = "Unknown";
/// Versioning status when the lookup fails
pub const VERSIONING_UNKNOWN: &str = "Unknown";
/// Versioning status of a bucket that never had it turned on
pub const VERSIONING_DISABLED: &str = "Disabled";
/// Encryption when the lookup fails or no default rule exists
pub const ENCRYPTION_NONE: &str = "None";

/// Error S3 returns for a bucket without default encryption
const NO_ENCRYPTION_CODE: &str = "ServerSideEncryptionConfigurationNotFoundError";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketRecord {
    pub name: String,
    pub region: String,
    pub creation_date: String,
    pub versioning: String,
    pub encryption: String,
}

/// Map a raw location constraint to a region name.
///
/// Classic buckets have no constraint and live in the default region;
/// `EU` is the legacy spelling of `eu-west-1`.
pub fn resolve_region(constraint: Option<&str>, default_region: &str) -> String {
    match constraint.map(str::trim) {
        None | Some("") => default_region.to_string(),
        Some("EU") => "eu-west-1".to_string(),
        Some(region) => region.to_string(),
    }
}

/// Versioning status from a `GetBucketVersioning` document
pub fn versioning_status(doc: &Value) -> String {
    get_str(doc, "Status")
        .unwrap_or(VERSIONING_DISABLED)
        .to_string()
}

/// Algorithm of the first default encryption rule
pub fn encryption_algorithm(doc: &Value) -> String {
    as_list(doc.get("Rule"))
        .first()
        .and_then(|rule| get_str(rule, "ApplyServerSideEncryptionByDefault.SSEAlgorithm"))
        .unwrap_or(ENCRYPTION_NONE)
        .to_string()
}

/// Build the record for one `ListBuckets` entry, doing the follow-up lookups
pub async fn describe_bucket<C: CloudApi>(
    api: &C,
    bucket: &Value,
    default_region: &str,
) -> BucketRecord {
    let name = str_or_na(bucket, "Name");

    let region = match api.get_bucket_location(&name).await {
        Ok(constraint) => resolve_region(constraint.as_deref(), default_region),
        Err(err) => {
            tracing::warn!("s3: location of {} unavailable: {}", name, err);
            UNKNOWN_REGION.to_string()
        }
    };

    let lookup_region = if region == UNKNOWN_REGION {
        default_region
    } else {
        region.as_str()
    };

    let (versioning, encryption) = tokio::join!(
        api.get_bucket_versioning(&name, lookup_region),
        api.get_bucket_encryption(&name, lookup_region),
    );

    let versioning = match versioning {
        Ok(doc) => versioning_status(&doc),
        Err(err) => {
            tracing::warn!("s3: versioning of {} unavailable: {}", name, err);
            VERSIONING_UNKNOWN.to_string()
        }
    };

    let encryption = match encryption {
        Ok(doc) => encryption_algorithm(&doc),
        Err(err) => {
            if err.code() != Some(NO_ENCRYPTION_CODE) {
                tracing::warn!("s3: encryption of {} unavailable: {}", name, err);
            }
            ENCRYPTION_NONE.to_string()
        }
    };

    BucketRecord {
        name,
        region,
        creation_date: timestamp_or_na(bucket, "CreationDate"),
        versioning,
        encryption,
    }
}

/// Collect every bucket of the account, grouped by the bucket's region.
///
/// Fails only when the bucket list itself cannot be obtained.
pub async fn collect_buckets<C: CloudApi>(
    api: &C,
    settings: &InventorySettings,
) -> Result<Inventory<BucketRecord>, InventoryError> {
    let buckets = fetch_all("s3:ListBuckets", |token| async move {
        api.list_buckets(token.as_deref()).await
    })
    .await
    .map_err(|err: ApiError| {
        tracing::error!("Bucket listing failed: {} ({})", err, err.class_name());
        InventoryError::BucketListing(err)
    })?;

    let default_region = settings.default_bucket_region.as_str();
    let records: Vec<BucketRecord> = stream::iter(buckets.iter())
        .map(|bucket| describe_bucket(api, bucket, default_region))
        .buffered(settings.concurrency.max(1))
        .collect()
        .await;

    let mut inventory = Inventory::new();
    for record in records {
        let region = record.region.clone();
        inventory.push(&region, record);
    }

    tracing::info!(
        "s3: {} buckets across {} regions",
        inventory.record_count(),
        inventory.regions.len()
    );

    Ok(inventory)
}
