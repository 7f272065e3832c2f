pub(crate) mod reference_errors;
pub(crate) mod reference_model;
pub(crate) mod reference_repository;
pub(crate) mod reference_traits;

pub use reference_errors::ReferenceError;
pub use reference_model::{Center, User, Vaccine};
pub use reference_repository::ReferenceLookup;
pub use reference_traits::ReferenceLookupTrait;
