//! Region Worker
//!
//! Runs one [`RegionEnumerator`] against one region and turns whatever
//! happens into a [`RegionOutcome`]. Nothing raised inside a region gets
//! past this point.

use crate::error::{ApiError, ErrorCategory, RegionFailure};
use crate::provider::CloudApi;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// A resource kind that is enumerated region by region
#[async_trait]
pub trait RegionEnumerator: Send + Sync {
    /// Normalized record produced for each resource
    type Record: Serialize + Send;

    /// Service name, for logs
    fn service(&self) -> &'static str;

    /// Fetch and normalize every resource of this kind in `region`
    async fn enumerate<C: CloudApi>(
        &self,
        api: &C,
        region: &str,
    ) -> Result<Vec<Self::Record>, ApiError>;
}

/// What one region produced
#[derive(Debug)]
pub struct RegionOutcome<R> {
    pub region: String,
    pub result: Result<Vec<R>, RegionFailure>,
}

/// Enumerate one region, absorbing any failure.
///
/// A region that runs past `deadline` is reported like an unreachable
/// endpoint.
pub async fn run_region<C, E>(
    api: &C,
    enumerator: &E,
    region: String,
    deadline: Option<Duration>,
) -> RegionOutcome<E::Record>
where
    C: CloudApi,
    E: RegionEnumerator,
{
    tracing::debug!("{}: enumerating {}", enumerator.service(), region);

    let work = enumerator.enumerate(api, &region);
    let result = match deadline {
        Some(limit) => tokio::time::timeout(limit, work)
            .await
            .unwrap_or_else(|_| Err(ApiError::Deadline(limit))),
        None => work.await,
    };

    let result = match result {
        Ok(records) => {
            tracing::debug!(
                "{}: {} records in {}",
                enumerator.service(),
                records.len(),
                region
            );
            Ok(records)
        }
        Err(err) => {
            report(enumerator.service(), &region, &err);
            Err(RegionFailure::from(&err))
        }
    };

    RegionOutcome { region, result }
}

fn report(service: &str, region: &str, err: &ApiError) {
    match err.category() {
        ErrorCategory::Authorization => tracing::warn!(
            "{}: skipping {} ({})",
            service,
            region,
            err.code().unwrap_or("unauthorized")
        ),
        ErrorCategory::Connectivity => {
            tracing::warn!("{}: {} unreachable: {}", service, region, err)
        }
        ErrorCategory::Unexpected => tracing::error!(
            "{}: unexpected failure in {}: {} - {}",
            service,
            region,
            err.class_name(),
            err
        ),
    }
}
