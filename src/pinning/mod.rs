pub(crate) mod pinning_client;
pub(crate) mod pinning_model;

pub use pinning_client::{MetadataPinningTrait, PinningClient, PinningConfig};
pub use pinning_model::{PinAttribute, PinMetadata, PLACEHOLDER_CONTENT_URI};
