//! Plant storage trait.

use crate::StoreError;
use sprout_types::{LocationProfile, PlantId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// A registered plant. Plants belong to exactly one user and are never deleted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlantRecord {
    pub id: PlantId,
    pub owner: UserId,
    pub species: String,
    pub registered_at: Timestamp,
    /// Geo baseline; set at registration or by the first geo claim.
    pub location_profile: Option<LocationProfile>,
    /// Opaque signature of the first accepted photo.
    pub fingerprint: Option<String>,
    /// 0–100, refreshed by accepted health scans.
    pub health_score: u8,
    pub total_points_earned: i64,
    pub active: bool,
}

impl PlantRecord {
    pub fn new(
        id: PlantId,
        owner: UserId,
        species: impl Into<String>,
        location_profile: Option<LocationProfile>,
        registered_at: Timestamp,
    ) -> Self {
        Self {
            id,
            owner,
            species: species.into(),
            registered_at,
            location_profile,
            fingerprint: None,
            health_score: 100,
            total_points_earned: 0,
            active: true,
        }
    }
}

pub trait PlantStore {
    fn get_plant(&self, id: &PlantId) -> Result<Option<PlantRecord>, StoreError>;

    fn plants_for_user(&self, owner: &UserId) -> Result<Vec<PlantRecord>, StoreError>;

    fn require_plant(&self, id: &PlantId) -> Result<PlantRecord, StoreError> {
        self.get_plant(id)?
            .ok_or_else(|| StoreError::NotFound(format!("plant {id}")))
    }
}
