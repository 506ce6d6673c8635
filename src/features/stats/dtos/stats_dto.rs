use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

/// Rating summary over a facility's approved reviews
///
/// Recomputed from the reviews table on every request; nothing here is
/// cached or stored.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FacilityRatingSummary {
    pub facility_id: Uuid,
    /// Number of approved reviews
    pub total: i64,
    /// Mean rating, 0.0 when there are no approved reviews
    pub average: f64,
    /// Approved review count per rating value, zero-filled over 1..=5
    pub histogram: BTreeMap<u8, i64>,
}
