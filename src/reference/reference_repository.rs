use diesel::prelude::*;
use std::sync::Arc;

use crate::db::{get_connection, DbPool};
use crate::errors::Result;
use crate::schema::{centers, users, vaccines};

use super::reference_errors::ReferenceError;
use super::reference_model::{Center, User, Vaccine};
use super::reference_traits::ReferenceLookupTrait;

/// Diesel-backed reference lookups
pub struct ReferenceLookup {
    pool: Arc<DbPool>,
}

impl ReferenceLookup {
    pub fn new(pool: Arc<DbPool>) -> Self {
        ReferenceLookup { pool }
    }
}

impl ReferenceLookupTrait for ReferenceLookup {
    fn get_vaccine(&self, vaccine_id: &str) -> Result<Vaccine> {
        let mut conn = get_connection(&self.pool)?;
        let vaccine = vaccines::table
            .find(vaccine_id)
            .first::<Vaccine>(&mut conn)
            .optional()
            .map_err(ReferenceError::from)?
            .ok_or_else(|| {
                ReferenceError::NotFound(format!("Vaccine with id {} not found", vaccine_id))
            })?;
        Ok(vaccine)
    }

    fn get_center(&self, center_id: &str) -> Result<Center> {
        let mut conn = get_connection(&self.pool)?;
        let center = centers::table
            .find(center_id)
            .first::<Center>(&mut conn)
            .optional()
            .map_err(ReferenceError::from)?
            .ok_or_else(|| {
                ReferenceError::NotFound(format!("Center with id {} not found", center_id))
            })?;
        Ok(center)
    }

    fn get_user(&self, key: &str) -> Result<User> {
        let mut conn = get_connection(&self.pool)?;
        // Ledger addresses are stored canonical-lowercase, so the wallet
        // branch compares against the normalized form of the key.
        let normalized = key.to_ascii_lowercase();
        let user = users::table
            .filter(
                users::id
                    .eq(key)
                    .or(users::email.eq(key))
                    .or(users::wallet_address.eq(normalized)),
            )
            .first::<User>(&mut conn)
            .optional()
            .map_err(ReferenceError::from)?
            .ok_or_else(|| ReferenceError::NotFound(format!("User {} not found", key)))?;
        Ok(user)
    }

    fn get_linked_address(&self, user_id: &str) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        let address = users::table
            .find(user_id)
            .select(users::wallet_address)
            .first::<Option<String>>(&mut conn)
            .optional()
            .map_err(ReferenceError::from)?
            .flatten();
        Ok(address)
    }
}
