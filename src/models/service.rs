use serde::{Deserialize, Serialize};

/// An entry in the spa's treatment catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaService {
    pub id: i64,
    pub kind: String,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: u32,
    pub price: i64,
}

/// Total treatment time of a selection of services, as used for a booking's length.
pub fn total_duration(services: &[SpaService]) -> u32 {
    services.iter().map(|s| s.duration_minutes).sum()
}
