use serde::{Deserialize, Serialize};

/// Request body for mirroring a booking onto the ledger
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub vaccine_name: String,
    pub center_name: String,
    pub date: String,
    pub time: String,
    pub patient_address: String,
    pub price_minor: i64,
}

/// Receipt returned by the ledger for a mirrored booking
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTxReceipt {
    pub tx_hash: String,
    pub appointment_id: Option<String>,
}

/// Request body for minting a vaccination certificate
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintCertificateRequest {
    pub patient_address: String,
    pub booking_id: String,
    pub vaccine_name: String,
    pub center_name: String,
    pub vaccination_date: String,
    pub token_uri: String,
}

/// A freshly minted certificate token
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintedCertificate {
    pub token_id: i64,
    pub tx_hash: String,
    pub block_number: i64,
}

/// On-ledger certificate record returned by verification
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRecord {
    pub is_valid: bool,
    pub patient: String,
    pub vaccine_name: String,
    pub center_name: String,
    pub vaccination_date: String,
    /// Seconds since the Unix epoch, as recorded on the ledger.
    pub issued_at: i64,
}
