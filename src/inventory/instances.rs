//! Compute instances (EC2)

use super::fetcher::fetch_all;
use super::normalize::{as_list, lookup, str_or_na, timestamp_or_na, NOT_AVAILABLE};
use super::worker::RegionEnumerator;
use crate::error::ApiError;
use crate::provider::CloudApi;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceRecord {
    pub name: String,
    pub instance_id: String,
    #[serde(rename = "Type")]
    pub instance_type: String,
    pub state: String,
    pub launch_time: String,
    pub region: String,
}

/// Normalize one `DescribeInstances` instance item
pub fn normalize_instance(item: &Value, region: &str) -> InstanceRecord {
    InstanceRecord {
        name: name_tag(item),
        instance_id: str_or_na(item, "instanceId"),
        instance_type: str_or_na(item, "instanceType"),
        state: str_or_na(item, "instanceState.name"),
        launch_time: timestamp_or_na(item, "launchTime"),
        region: region.to_string(),
    }
}

/// Value of the first `Name` tag
fn name_tag(item: &Value) -> String {
    as_list(lookup(item, "tagSet.item"))
        .into_iter()
        .find(|tag| tag.get("key").and_then(Value::as_str) == Some("Name"))
        .and_then(|tag| tag.get("value").and_then(Value::as_str))
        .filter(|name| !name.is_empty())
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

pub struct Instances;

#[async_trait]
impl RegionEnumerator for Instances {
    type Record = InstanceRecord;

    fn service(&self) -> &'static str {
        "ec2"
    }

    async fn enumerate<C: CloudApi>(
        &self,
        api: &C,
        region: &str,
    ) -> Result<Vec<InstanceRecord>, ApiError> {
        let label = format!("ec2:DescribeInstances@{}", region);
        let items = fetch_all(&label, |token| async move {
            api.describe_instances(region, token.as_deref()).await
        })
        .await?;

        Ok(items
            .iter()
            .map(|item| normalize_instance(item, region))
            .collect())
    }
}
