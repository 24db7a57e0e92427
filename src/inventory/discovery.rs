//! Region Discovery

use crate::error::InventoryError;
use crate::provider::CloudApi;
use std::collections::HashSet;

/// List every region enabled for the account.
///
/// Failure here is fatal for the request: there is nothing to fan out over.
pub async fn discover_regions<C: CloudApi>(
    api: &C,
    reference_region: &str,
) -> Result<Vec<String>, InventoryError> {
    let mut regions = api.list_regions(reference_region).await.map_err(|err| {
        tracing::error!("Region discovery failed: {} ({})", err, err.class_name());
        InventoryError::Discovery(err)
    })?;

    let mut seen = HashSet::new();
    regions.retain(|r| !r.is_empty() && seen.insert(r.clone()));

    tracing::info!(
        "Discovered {} regions via {}",
        regions.len(),
        reference_region
    );
    Ok(regions)
}
