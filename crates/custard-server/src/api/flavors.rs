use axum::{extract::State, Extension, Json};
use custard_core::{shop_today, FlavorRecord};

use super::AppState;
use crate::middleware::RequestId;

/// Today's flavors as a bare JSON array. Always 200; an empty array means
/// no shop could be read.
pub(super) async fn list_flavors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<Vec<FlavorRecord>> {
    let records = state.cache.get_or_refresh(shop_today()).await;
    tracing::debug!(request_id = %req_id.0, count = records.len(), "served flavors");
    Json(records)
}
