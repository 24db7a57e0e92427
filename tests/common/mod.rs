//! In-memory provider shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use cloud_inventory::error::ApiError;
use cloud_inventory::provider::{CloudApi, Page};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// A failure the fake raises. `ApiError` is not `Clone`, so failures are
/// stored as a recipe and built on each call.
#[derive(Debug, Clone)]
pub enum Fail {
    Service(&'static str, &'static str, u16),
    Connect,
}

impl Fail {
    pub fn opt_in() -> Self {
        Fail::Service(
            "OptInRequired",
            "You are not subscribed to this service.",
            401,
        )
    }

    fn build(&self, region: &str) -> ApiError {
        match self {
            Fail::Service(code, message, status) => ApiError::service(code, message, *status),
            Fail::Connect => ApiError::Connection {
                endpoint: format!("https://fake.{}.amazonaws.com/", region),
                reason: "connection refused".to_string(),
            },
        }
    }
}

/// Serve `pages` with `page-N` cursors
pub fn page_of(pages: &[Vec<Value>], token: Option<&str>) -> Page {
    let index = token
        .and_then(|t| t.strip_prefix("page-"))
        .and_then(|n| n.parse::<usize>().ok())
        .unwrap_or(0);
    let items = pages.get(index).cloned().unwrap_or_default();
    let next = (index + 1 < pages.len()).then(|| format!("page-{}", index + 1));
    Page::new(items, next)
}

#[derive(Default)]
pub struct FakeApi {
    pub regions: Vec<String>,
    pub discovery_error: Option<Fail>,
    /// `(service, region)` pairs whose calls fail
    pub region_errors: HashMap<(String, String), Fail>,
    pub instances: HashMap<String, Vec<Vec<Value>>>,
    pub clusters: HashMap<String, Vec<Value>>,
    pub broken_clusters: Vec<String>,
    pub databases: HashMap<String, Vec<Vec<Value>>>,
    pub buckets: Vec<Vec<Value>>,
    pub bucket_listing_error: Option<Fail>,
    pub locations: HashMap<String, Result<Option<String>, Fail>>,
    pub versioning: HashMap<String, Result<Value, Fail>>,
    pub encryption: HashMap<String, Result<Value, Fail>>,
    /// Every call made, as `service:region`
    pub calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn with_regions(regions: &[&str]) -> Self {
        Self {
            regions: regions.iter().map(|r| r.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn fail_region(mut self, service: &str, region: &str, fail: Fail) -> Self {
        self.region_errors
            .insert((service.to_string(), region.to_string()), fail);
        self
    }

    pub fn instance_pages(mut self, region: &str, pages: Vec<Vec<Value>>) -> Self {
        self.instances.insert(region.to_string(), pages);
        self
    }

    pub fn cluster_list(mut self, region: &str, clusters: Vec<Value>) -> Self {
        self.clusters.insert(region.to_string(), clusters);
        self
    }

    pub fn database_pages(mut self, region: &str, pages: Vec<Vec<Value>>) -> Self {
        self.databases.insert(region.to_string(), pages);
        self
    }

    pub fn bucket(
        mut self,
        name: &str,
        location: Result<Option<&str>, Fail>,
        versioning: Result<Value, Fail>,
        encryption: Result<Value, Fail>,
    ) -> Self {
        let entry = json!({"Name": name, "CreationDate": "2021-06-01T12:00:00.000Z"});
        match self.buckets.first_mut() {
            Some(page) => page.push(entry),
            None => self.buckets.push(vec![entry]),
        }
        self.locations.insert(
            name.to_string(),
            location.map(|l| l.map(|s| s.to_string())),
        );
        self.versioning.insert(name.to_string(), versioning);
        self.encryption.insert(name.to_string(), encryption);
        self
    }

    pub fn call_count(&self, service: &str) -> usize {
        let prefix = format!("{}:", service);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(&prefix))
            .count()
    }

    fn record(&self, service: &str, region: &str) -> Result<(), ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", service, region));
        match self
            .region_errors
            .get(&(service.to_string(), region.to_string()))
        {
            Some(fail) => Err(fail.build(region)),
            None => Ok(()),
        }
    }
}

/// EC2-shaped instance descriptor
pub fn instance(id: &str, name: Option<&str>) -> Value {
    let mut item = json!({
        "instanceId": id,
        "instanceType": "t3.micro",
        "instanceState": {"code": "16", "name": "running"},
        "launchTime": "2024-03-01T08:30:00.000Z"
    });
    if let Some(name) = name {
        item["tagSet"] = json!({"item": [{"key": "Name", "value": name}]});
    }
    item
}

/// EKS-shaped cluster descriptor
pub fn cluster(name: &str) -> Value {
    json!({
        "name": name,
        "status": "ACTIVE",
        "version": "1.29",
        "arn": format!("arn:aws:eks:us-east-1:123456789012:cluster/{}", name),
        "createdAt": 1_700_000_000.0,
        "endpoint": format!("https://{}.gr7.eks.amazonaws.com", name)
    })
}

/// RDS-shaped database descriptor
pub fn database(id: &str, create_time: Option<&str>) -> Value {
    let mut item = json!({
        "DBInstanceIdentifier": id,
        "Engine": "postgres",
        "DBInstanceClass": "db.t3.micro",
        "AvailabilityZone": "us-east-1a",
        "DBInstanceStatus": "available"
    });
    if let Some(time) = create_time {
        item["InstanceCreateTime"] = json!(time);
    }
    item
}

#[async_trait]
impl CloudApi for FakeApi {
    async fn list_regions(&self, reference_region: &str) -> Result<Vec<String>, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("regions:{}", reference_region));
        match &self.discovery_error {
            Some(fail) => Err(fail.build(reference_region)),
            None => Ok(self.regions.clone()),
        }
    }

    async fn describe_instances(
        &self,
        region: &str,
        next_token: Option<&str>,
    ) -> Result<Page, ApiError> {
        self.record("ec2", region)?;
        let pages = self.instances.get(region).cloned().unwrap_or_default();
        Ok(page_of(&pages, next_token))
    }

    async fn list_clusters(
        &self,
        region: &str,
        next_token: Option<&str>,
    ) -> Result<Page, ApiError> {
        self.record("eks", region)?;
        let names: Vec<Value> = self
            .clusters
            .get(region)
            .map(|cs| cs.iter().map(|c| c["name"].clone()).collect())
            .unwrap_or_default();
        Ok(page_of(&[names], next_token))
    }

    async fn describe_cluster(&self, region: &str, name: &str) -> Result<Value, ApiError> {
        self.record("eks-describe", region)?;
        if self.broken_clusters.iter().any(|b| b == name) {
            return Err(ApiError::service(
                "ResourceNotFoundException",
                "No cluster found",
                404,
            ));
        }
        self.clusters
            .get(region)
            .and_then(|cs| cs.iter().find(|c| c["name"] == name))
            .cloned()
            .ok_or(ApiError::MissingField("cluster"))
    }

    async fn describe_db_instances(
        &self,
        region: &str,
        marker: Option<&str>,
    ) -> Result<Page, ApiError> {
        self.record("rds", region)?;
        let pages = self.databases.get(region).cloned().unwrap_or_default();
        Ok(page_of(&pages, marker))
    }

    async fn list_buckets(&self, continuation_token: Option<&str>) -> Result<Page, ApiError> {
        self.calls.lock().unwrap().push("s3:global".to_string());
        match &self.bucket_listing_error {
            Some(fail) => Err(fail.build("us-east-1")),
            None => Ok(page_of(&self.buckets, continuation_token)),
        }
    }

    async fn get_bucket_location(&self, bucket: &str) -> Result<Option<String>, ApiError> {
        match self.locations.get(bucket) {
            Some(Ok(location)) => Ok(location.clone()),
            Some(Err(fail)) => Err(fail.build("us-east-1")),
            None => Ok(None),
        }
    }

    async fn get_bucket_versioning(&self, bucket: &str, region: &str) -> Result<Value, ApiError> {
        match self.versioning.get(bucket) {
            Some(Ok(doc)) => Ok(doc.clone()),
            Some(Err(fail)) => Err(fail.build(region)),
            None => Ok(Value::Null),
        }
    }

    async fn get_bucket_encryption(&self, bucket: &str, region: &str) -> Result<Value, ApiError> {
        match self.encryption.get(bucket) {
            Some(Ok(doc)) => Ok(doc.clone()),
            Some(Err(fail)) => Err(fail.build(region)),
            None => Ok(Value::Null),
        }
    }
}
