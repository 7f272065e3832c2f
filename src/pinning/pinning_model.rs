use serde::{Deserialize, Serialize};

/// Deterministic URI returned when pinning is unavailable, so certificate
/// issuance can still proceed with a resolvable placeholder.
pub const PLACEHOLDER_CONTENT_URI: &str = "ipfs://QmPlaceholderMetadataHash";

/// One trait entry of a pinned metadata document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinAttribute {
    pub trait_type: String,
    pub value: String,
}

impl PinAttribute {
    pub fn new(trait_type: &str, value: impl Into<String>) -> Self {
        PinAttribute {
            trait_type: trait_type.to_string(),
            value: value.into(),
        }
    }
}

/// Token metadata document pinned to content-addressed storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinMetadata {
    pub name: String,
    pub description: String,
    pub image: String,
    pub attributes: Vec<PinAttribute>,
}
