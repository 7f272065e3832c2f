use serde::{Deserialize, Serialize};

use crate::pinning::{PinAttribute, PinMetadata};

const DEFAULT_CERTIFICATE_IMAGE: &str = "ipfs://QmVaxTrackCertificateArtwork";
const ISSUER: &str = "VaxTrack Platform";
const CERTIFICATE_TYPE: &str = "Vaccination Certificate";
const TOKEN_STANDARD: &str = "ERC-721";

/// Terminal result of one certificate-issuance attempt. Everything except a
/// retryable failure is modeled here, because none of these may surface as
/// an error to whoever completed the final dose.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueOutcome {
    Minted { token_id: i64, tx_hash: String },
    AlreadyIssued,
    ClaimHeld,
    NoLinkedAddress,
    InvalidAddress(String),
    GatewayDisabled,
}

/// Verification payload decorated with formatted certificate ids
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedCertificate {
    pub token_id: i64,
    pub certificate_id: String,
    pub certificate_id_short: String,
    pub is_valid: bool,
    pub patient: String,
    pub vaccine_name: String,
    pub center_name: String,
    pub vaccination_date: String,
    pub issued_at: String,
}

/// Builds the metadata document pinned for a vaccination certificate.
pub fn vaccination_certificate_metadata(
    booking_id: &str,
    patient_name: &str,
    vaccine_name: &str,
    center_name: &str,
    vaccination_date: &str,
    doses: i32,
) -> PinMetadata {
    PinMetadata {
        name: format!("VaxTrack Certificate #{}", booking_id),
        description: format!(
            "Official vaccination certificate for {}. This certificate proves vaccination with {} at {} on {}. Issued by {}.",
            patient_name, vaccine_name, center_name, vaccination_date, ISSUER
        ),
        image: DEFAULT_CERTIFICATE_IMAGE.to_string(),
        attributes: vec![
            PinAttribute::new("Booking ID", booking_id),
            PinAttribute::new("Patient Name", patient_name),
            PinAttribute::new("Vaccine Name", vaccine_name),
            PinAttribute::new("Vaccination Center", center_name),
            PinAttribute::new("Vaccination Date", vaccination_date),
            PinAttribute::new("Number of Doses", doses.to_string()),
            PinAttribute::new("Issued By", ISSUER),
            PinAttribute::new("Certificate Type", CERTIFICATE_TYPE),
            PinAttribute::new("Standard", TOKEN_STANDARD),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_carries_the_full_attribute_set() {
        let metadata = vaccination_certificate_metadata(
            "booking-9",
            "Jane Roe",
            "CoviShield",
            "Central Clinic",
            "2026-03-01",
            2,
        );

        assert_eq!(metadata.name, "VaxTrack Certificate #booking-9");
        assert!(metadata.description.contains("Jane Roe"));
        assert!(metadata.description.contains("CoviShield"));

        let traits: Vec<&str> = metadata
            .attributes
            .iter()
            .map(|a| a.trait_type.as_str())
            .collect();
        assert_eq!(
            traits,
            vec![
                "Booking ID",
                "Patient Name",
                "Vaccine Name",
                "Vaccination Center",
                "Vaccination Date",
                "Number of Doses",
                "Issued By",
                "Certificate Type",
                "Standard",
            ]
        );

        let doses = metadata
            .attributes
            .iter()
            .find(|a| a.trait_type == "Number of Doses")
            .unwrap();
        assert_eq!(doses.value, "2");
    }
}
