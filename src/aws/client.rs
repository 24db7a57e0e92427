//! AWS Client
//!
//! [`CloudApi`] over the EC2, EKS, RDS and S3 wire protocols.

use super::credentials::{load_credentials, Credentials};
use super::http::{xml_to_json, AwsHttpClient};
use crate::error::ApiError;
use crate::inventory::normalize::{as_list, get_str, lookup};
use crate::provider::{CloudApi, Page};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

const EC2_API_VERSION: &str = "2016-11-15";
const RDS_API_VERSION: &str = "2014-10-31";

/// Region that answers the global S3 calls (ListBuckets, GetBucketLocation)
const S3_GLOBAL_REGION: &str = "us-east-1";

/// Page sizes requested from each service
const EC2_PAGE_SIZE: u32 = 1000;
const EKS_PAGE_SIZE: u32 = 100;
const RDS_PAGE_SIZE: u32 = 100;
const S3_PAGE_SIZE: u32 = 1000;

/// DNS suffix of the partition a region belongs to
pub fn endpoint_domain(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "amazonaws.com.cn"
    } else if region.starts_with("eusc-") {
        "amazonaws.eu"
    } else {
        "amazonaws.com"
    }
}

/// Main AWS client
#[derive(Clone)]
pub struct AwsClient {
    pub http: AwsHttpClient,
    /// Single endpoint for every service (LocalStack and friends)
    pub endpoint_url: Option<String>,
}

impl AwsClient {
    /// Create a client for `profile`, resolving its credentials
    pub fn new(
        profile: &str,
        endpoint_url: Option<&str>,
        request_timeout: Option<Duration>,
    ) -> Result<Self> {
        let credentials =
            load_credentials(profile).context("Failed to initialize AWS credentials")?;
        Self::with_credentials(credentials, endpoint_url, request_timeout)
    }

    /// Create a client with explicit credentials
    pub fn with_credentials(
        credentials: Credentials,
        endpoint_url: Option<&str>,
        request_timeout: Option<Duration>,
    ) -> Result<Self> {
        let http = AwsHttpClient::new(credentials, request_timeout)?;
        Ok(Self {
            http,
            endpoint_url: endpoint_url.map(|u| u.trim_end_matches('/').to_string()),
        })
    }

    // =========================================================================
    // URL helpers
    // =========================================================================

    /// Base URL of a regional service endpoint
    pub fn service_url(&self, service: &str, region: &str) -> String {
        match &self.endpoint_url {
            Some(base) => base.clone(),
            None => format!("https://{}.{}.{}", service, region, endpoint_domain(region)),
        }
    }

    /// Query-protocol URL: `{endpoint}/?Action=..&Version=..&k=v`
    pub fn query_url(
        &self,
        service: &str,
        region: &str,
        action: &str,
        version: &str,
        params: &[(&str, String)],
    ) -> String {
        let mut url = format!(
            "{}/?Action={}&Version={}",
            self.service_url(service, region),
            action,
            version
        );
        for (key, value) in params {
            url.push_str(&format!("&{}={}", key, urlencoding::encode(value)));
        }
        url
    }

    /// URL of a bucket subresource (`?location`, `?versioning`, ...)
    pub fn bucket_url(&self, bucket: &str, region: &str, subresource: &str) -> String {
        let bucket_enc = urlencoding::encode(bucket);
        match &self.endpoint_url {
            Some(base) => format!("{}/{}?{}", base, bucket_enc, subresource),
            // Dotted names break the wildcard certificate of virtual-hosted URLs
            None if bucket.contains('.') => format!(
                "https://s3.{}.{}/{}?{}",
                region,
                endpoint_domain(region),
                bucket_enc,
                subresource
            ),
            None => format!(
                "https://{}.s3.{}.{}/?{}",
                bucket,
                region,
                endpoint_domain(region),
                subresource
            ),
        }
    }

    async fn query(
        &self,
        service: &str,
        region: &str,
        action: &str,
        version: &str,
        params: &[(&str, String)],
    ) -> Result<Value, ApiError> {
        let url = self.query_url(service, region, action, version, params);
        let body = self.http.post(service, region, &url).await?;
        xml_to_json(&body)
    }

    async fn rest_json(&self, service: &str, region: &str, url: &str) -> Result<Value, ApiError> {
        let body = self.http.get(service, region, url).await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|e| ApiError::Decode(format!("{}: {}", url, e)))
    }

    /// S3 GET returning the document under its root element
    async fn s3_document(&self, region: &str, url: &str, root: &str) -> Result<Value, ApiError> {
        let body = self.http.get("s3", region, url).await?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        let mut doc = xml_to_json(&body)?;
        Ok(doc.get_mut(root).map(Value::take).unwrap_or(Value::Null))
    }
}

/// Continuation token at `path`, ignoring empty strings
fn token_at(doc: &Value, path: &str) -> Option<String> {
    get_str(doc, path).map(String::from)
}

fn owned(items: Vec<&Value>) -> Vec<Value> {
    items.into_iter().cloned().collect()
}

#[async_trait]
impl CloudApi for AwsClient {
    async fn list_regions(&self, reference_region: &str) -> Result<Vec<String>, ApiError> {
        let doc = self
            .query("ec2", reference_region, "DescribeRegions", EC2_API_VERSION, &[])
            .await?;

        Ok(
            as_list(lookup(&doc, "DescribeRegionsResponse.regionInfo.item"))
                .into_iter()
                .filter_map(|r| get_str(r, "regionName"))
                .map(String::from)
                .collect(),
        )
    }

    async fn describe_instances(
        &self,
        region: &str,
        next_token: Option<&str>,
    ) -> Result<Page, ApiError> {
        let mut params = vec![("MaxResults", EC2_PAGE_SIZE.to_string())];
        if let Some(token) = next_token {
            params.push(("NextToken", token.to_string()));
        }

        let doc = self
            .query("ec2", region, "DescribeInstances", EC2_API_VERSION, &params)
            .await?;

        let instances = as_list(lookup(&doc, "DescribeInstancesResponse.reservationSet.item"))
            .into_iter()
            .flat_map(|reservation| as_list(lookup(reservation, "instancesSet.item")))
            .cloned()
            .collect();

        Ok(Page::new(
            instances,
            token_at(&doc, "DescribeInstancesResponse.nextToken"),
        ))
    }

    async fn list_clusters(
        &self,
        region: &str,
        next_token: Option<&str>,
    ) -> Result<Page, ApiError> {
        let mut url = format!(
            "{}/clusters?maxResults={}",
            self.service_url("eks", region),
            EKS_PAGE_SIZE
        );
        if let Some(token) = next_token {
            url.push_str(&format!("&nextToken={}", urlencoding::encode(token)));
        }

        let doc = self.rest_json("eks", region, &url).await?;
        Ok(Page::new(
            owned(as_list(doc.get("clusters"))),
            token_at(&doc, "nextToken"),
        ))
    }

    async fn describe_cluster(&self, region: &str, name: &str) -> Result<Value, ApiError> {
        let url = format!(
            "{}/clusters/{}",
            self.service_url("eks", region),
            urlencoding::encode(name)
        );
        let mut doc = self.rest_json("eks", region, &url).await?;
        doc.get_mut("cluster")
            .map(Value::take)
            .ok_or(ApiError::MissingField("cluster"))
    }

    async fn describe_db_instances(
        &self,
        region: &str,
        marker: Option<&str>,
    ) -> Result<Page, ApiError> {
        let mut params = vec![("MaxRecords", RDS_PAGE_SIZE.to_string())];
        if let Some(marker) = marker {
            params.push(("Marker", marker.to_string()));
        }

        let doc = self
            .query("rds", region, "DescribeDBInstances", RDS_API_VERSION, &params)
            .await?;

        let result = lookup(&doc, "DescribeDBInstancesResponse.DescribeDBInstancesResult")
            .cloned()
            .unwrap_or(Value::Null);

        Ok(Page::new(
            owned(as_list(lookup(&result, "DBInstances.DBInstance"))),
            token_at(&result, "Marker"),
        ))
    }

    async fn list_buckets(&self, continuation_token: Option<&str>) -> Result<Page, ApiError> {
        let mut url = format!(
            "{}/?max-buckets={}",
            self.service_url("s3", S3_GLOBAL_REGION),
            S3_PAGE_SIZE
        );
        if let Some(token) = continuation_token {
            url.push_str(&format!("&continuation-token={}", urlencoding::encode(token)));
        }

        let body = self.http.get("s3", S3_GLOBAL_REGION, &url).await?;
        let doc = xml_to_json(&body)?;
        let result = doc
            .get("ListAllMyBucketsResult")
            .cloned()
            .unwrap_or(Value::Null);

        Ok(Page::new(
            owned(as_list(lookup(&result, "Buckets.Bucket"))),
            token_at(&result, "ContinuationToken"),
        ))
    }

    async fn get_bucket_location(&self, bucket: &str) -> Result<Option<String>, ApiError> {
        let url = self.bucket_url(bucket, S3_GLOBAL_REGION, "location");
        let doc = self
            .s3_document(S3_GLOBAL_REGION, &url, "LocationConstraint")
            .await?;
        Ok(doc.as_str().filter(|s| !s.is_empty()).map(String::from))
    }

    async fn get_bucket_versioning(&self, bucket: &str, region: &str) -> Result<Value, ApiError> {
        let url = self.bucket_url(bucket, region, "versioning");
        self.s3_document(region, &url, "VersioningConfiguration")
            .await
    }

    async fn get_bucket_encryption(&self, bucket: &str, region: &str) -> Result<Value, ApiError> {
        let url = self.bucket_url(bucket, region, "encryption");
        self.s3_document(region, &url, "ServerSideEncryptionConfiguration")
            .await
    }
}
