//! Managed Kubernetes clusters (EKS)

use super::fetcher::fetch_all;
use super::normalize::{str_or_na, timestamp_or_na};
use super::worker::RegionEnumerator;
use crate::error::ApiError;
use crate::provider::CloudApi;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use serde_json::Value;

/// DescribeCluster calls in flight per region
const DESCRIBE_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClusterRecord {
    pub name: String,
    pub status: String,
    pub version: String,
    pub arn: String,
    pub created_at: String,
    pub endpoint: String,
    pub region: String,
}

/// Normalize one `DescribeCluster` cluster object
pub fn normalize_cluster(cluster: &Value, region: &str) -> ClusterRecord {
    ClusterRecord {
        name: str_or_na(cluster, "name"),
        status: str_or_na(cluster, "status"),
        version: str_or_na(cluster, "version"),
        arn: str_or_na(cluster, "arn"),
        created_at: timestamp_or_na(cluster, "createdAt"),
        endpoint: str_or_na(cluster, "endpoint"),
        region: region.to_string(),
    }
}

pub struct Clusters;

#[async_trait]
impl RegionEnumerator for Clusters {
    type Record = ClusterRecord;

    fn service(&self) -> &'static str {
        "eks"
    }

    /// List cluster names, then describe each one. A cluster that can't be
    /// described is dropped; the rest of the region still counts.
    async fn enumerate<C: CloudApi>(
        &self,
        api: &C,
        region: &str,
    ) -> Result<Vec<ClusterRecord>, ApiError> {
        let label = format!("eks:ListClusters@{}", region);
        let names = fetch_all(&label, |token| async move {
            api.list_clusters(region, token.as_deref()).await
        })
        .await?;

        let names: Vec<String> = names
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect();

        let described: Vec<Option<ClusterRecord>> = stream::iter(names)
            .map(|name| async move {
                match api.describe_cluster(region, &name).await {
                    Ok(cluster) => Some(normalize_cluster(&cluster, region)),
                    Err(err) => {
                        tracing::warn!(
                            "eks: dropping cluster {} in {}: {}",
                            name,
                            region,
                            err.description()
                        );
                        None
                    }
                }
            })
            .buffered(DESCRIBE_CONCURRENCY)
            .collect()
            .await;

        Ok(described.into_iter().flatten().collect())
    }
}
