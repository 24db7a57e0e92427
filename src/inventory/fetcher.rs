//! Paginated Fetcher
//!
//! Drives a provider's page-cursor protocol to completion.

use crate::error::ApiError;
use crate::provider::Page;
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;

/// Fetch all items (auto-paginate).
///
/// `fetch_page` is called with `None` first, then with each cursor the
/// provider hands back, until a page comes without one. Items keep page
/// order, then within-page order. A cursor that was already sent ends the
/// loop, so a provider cycling through tokens cannot keep it running.
pub async fn fetch_all<F, Fut>(label: &str, mut fetch_page: F) -> Result<Vec<Value>, ApiError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page, ApiError>>,
{
    let mut all_items = Vec::new();
    let mut page_token: Option<String> = None;
    let mut sent: HashSet<String> = HashSet::new();
    let mut pages = 0usize;

    loop {
        let result = fetch_page(page_token.clone()).await?;
        pages += 1;
        all_items.extend(result.items);

        let next_token = result.next_token.filter(|t| !t.is_empty());
        match next_token {
            None => break,
            Some(token) if sent.contains(&token) => {
                tracing::warn!(
                    "{}: provider repeated page token after {} pages, stopping",
                    label,
                    pages
                );
                break;
            }
            Some(token) => {
                sent.insert(token.clone());
                page_token = Some(token);
            }
        }
    }

    tracing::debug!("{}: {} items in {} pages", label, all_items.len(), pages);
    Ok(all_items)
}
