//! User and plant lifecycle: registration and soft deactivation.

use crate::error::LedgerError;
use crate::points_ledger::PointsLedger;
use sprout_store::{LedgerBatch, LedgerStore, PlantRecord, PlantStore, UserRecord, UserStore};
use sprout_types::{GeoPoint, InputError, LocationProfile, PlantId, UserId};

impl<S: LedgerStore> PointsLedger<S> {
    /// Create a user. Re-registering an existing id returns the stored record
    /// unchanged.
    pub fn register_user(&self, id: UserId, display_name: Option<String>) -> Result<UserRecord, LedgerError> {
        let mut batch = self.store().begin_batch()?;
        if let Some(existing) = batch.get_user(&id)? {
            return Ok(existing);
        }
        let user = UserRecord::new(id, display_name, self.clock().now());
        batch.put_user(&user)?;
        batch.commit()?;
        tracing::info!(user = %user.id, "user registered");
        Ok(user)
    }

    /// Register a plant for an active user.
    ///
    /// With a location the geo baseline is fixed now; without one, the first
    /// geo-checked claim establishes it.
    pub fn register_plant(
        &self,
        owner: &UserId,
        id: PlantId,
        species: impl Into<String>,
        location: Option<GeoPoint>,
    ) -> Result<PlantRecord, LedgerError> {
        let now = self.clock().now();
        let mut batch = self.store().begin_batch()?;
        let user = batch
            .get_user(owner)?
            .ok_or_else(|| InputError::UnknownUser(owner.to_string()))?;
        if !user.active {
            return Err(InputError::InactiveUser(owner.to_string()).into());
        }
        if batch.get_plant(&id)?.is_some() {
            return Err(LedgerError::PlantExists(id));
        }
        let plant = PlantRecord::new(
            id,
            owner.clone(),
            species,
            location.map(|point| LocationProfile::new(point, now)),
            now,
        );
        batch.put_plant(&plant)?;
        batch.commit()?;
        tracing::info!(plant = %plant.id, owner = %owner, species = %plant.species, "plant registered");
        Ok(plant)
    }

    pub fn deactivate_user(&self, id: &UserId) -> Result<UserRecord, LedgerError> {
        let mut batch = self.store().begin_batch()?;
        let mut user = batch
            .get_user(id)?
            .ok_or_else(|| InputError::UnknownUser(id.to_string()))?;
        if user.active {
            user.active = false;
            batch.put_user(&user)?;
            batch.commit()?;
            tracing::info!(user = %id, "user deactivated");
        }
        Ok(user)
    }

    pub fn deactivate_plant(&self, id: &PlantId) -> Result<PlantRecord, LedgerError> {
        let mut batch = self.store().begin_batch()?;
        let mut plant = batch
            .get_plant(id)?
            .ok_or_else(|| InputError::UnknownPlant(id.to_string()))?;
        if plant.active {
            plant.active = false;
            batch.put_plant(&plant)?;
            batch.commit()?;
            tracing::info!(plant = %id, "plant deactivated");
        }
        Ok(plant)
    }

    /// An active plant together with its active owner.
    pub fn active_plant(&self, id: &PlantId) -> Result<(PlantRecord, UserRecord), LedgerError> {
        let plant = self
            .store()
            .get_plant(id)?
            .ok_or_else(|| InputError::UnknownPlant(id.to_string()))?;
        if !plant.active {
            return Err(InputError::InactivePlant(id.to_string()).into());
        }
        let user = self
            .store()
            .get_user(&plant.owner)?
            .ok_or_else(|| InputError::UnknownUser(plant.owner.to_string()))?;
        if !user.active {
            return Err(InputError::InactiveUser(user.id.to_string()).into());
        }
        Ok((plant, user))
    }
}
