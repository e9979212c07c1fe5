//! Offset pagination over v2 catalog endpoints
//!
//! Pages are requested through the cached request layer until a page comes
//! back shorter than the limit. A failed or malformed page stops the walk
//! and whatever accumulated so far is returned, so one bad page degrades a
//! listing instead of discarding it.

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::printful::client::PrintfulClient;
use crate::printful::models::PagedResponse;

pub async fn collect_paged<T: DeserializeOwned>(
    client: &PrintfulClient,
    endpoint: &str,
    extra_params: &[(String, String)],
    limit: u32,
    force_refresh: bool,
) -> Vec<T> {
    let mut items: Vec<T> = Vec::new();
    let mut offset: u32 = 0;

    loop {
        let mut params = extra_params.to_vec();
        params.push(("limit".to_string(), limit.to_string()));
        params.push(("offset".to_string(), offset.to_string()));

        let Some(page) = client.request(endpoint, &params, force_refresh).await else {
            break;
        };
        let page: PagedResponse<T> = match serde_json::from_value(page) {
            Ok(page) => page,
            Err(err) => {
                warn!(endpoint = %endpoint, error = %err, "Unexpected page shape, stopping pagination");
                break;
            }
        };

        let count = page.data.len() as u32;
        items.extend(page.data);
        if count < limit {
            break;
        }
        offset += limit;
    }

    items
}
