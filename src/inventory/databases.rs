//! Managed database instances (RDS)

use super::fetcher::fetch_all;
use super::normalize::{format_timestamp, lookup, str_or_na};
use super::worker::RegionEnumerator;
use crate::error::ApiError;
use crate::provider::CloudApi;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DbInstanceRecord {
    #[serde(rename = "DBInstanceIdentifier")]
    pub identifier: String,
    #[serde(rename = "Engine")]
    pub engine: String,
    #[serde(rename = "DBInstanceClass")]
    pub instance_class: String,
    #[serde(rename = "InstanceCreateTime")]
    pub create_time: String,
    #[serde(rename = "AvailabilityZone")]
    pub availability_zone: String,
    #[serde(rename = "Status")]
    pub status: String,
    #[serde(rename = "Region")]
    pub region: String,
}

/// Normalize one `DescribeDBInstances` item.
///
/// A missing or unreadable creation time is an error, not `N/A`.
pub fn normalize_db_instance(db: &Value, region: &str) -> Result<DbInstanceRecord, ApiError> {
    let create_time = lookup(db, "InstanceCreateTime")
        .and_then(format_timestamp)
        .ok_or(ApiError::MissingField("InstanceCreateTime"))?;

    Ok(DbInstanceRecord {
        identifier: str_or_na(db, "DBInstanceIdentifier"),
        engine: str_or_na(db, "Engine"),
        instance_class: str_or_na(db, "DBInstanceClass"),
        create_time,
        availability_zone: str_or_na(db, "AvailabilityZone"),
        status: str_or_na(db, "DBInstanceStatus"),
        region: region.to_string(),
    })
}

pub struct Databases;

#[async_trait]
impl RegionEnumerator for Databases {
    type Record = DbInstanceRecord;

    fn service(&self) -> &'static str {
        "rds"
    }

    async fn enumerate<C: CloudApi>(
        &self,
        api: &C,
        region: &str,
    ) -> Result<Vec<DbInstanceRecord>, ApiError> {
        let label = format!("rds:DescribeDBInstances@{}", region);
        let items = fetch_all(&label, |marker| async move {
            api.describe_db_instances(region, marker.as_deref()).await
        })
        .await?;

        items
            .iter()
            .map(|db| normalize_db_instance(db, region))
            .collect()
    }
}
