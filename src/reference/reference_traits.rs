use super::reference_model::{Center, User, Vaccine};
use crate::errors::Result;

/// Trait defining the read-only reference lookups this core depends on.
/// The catalogs themselves are maintained elsewhere.
pub trait ReferenceLookupTrait: Send + Sync {
    fn get_vaccine(&self, vaccine_id: &str) -> Result<Vaccine>;

    fn get_center(&self, center_id: &str) -> Result<Center>;

    /// Resolves a user by id, email, or linked ledger address.
    fn get_user(&self, key: &str) -> Result<User>;

    /// Reads a patient's linked external-ledger address, if any.
    /// The raw stored value is returned; callers validate the format.
    fn get_linked_address(&self, user_id: &str) -> Result<Option<String>>;
}
