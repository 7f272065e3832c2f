pub(crate) mod ledger_address;
pub(crate) mod ledger_errors;
pub(crate) mod ledger_gateway;
pub(crate) mod ledger_model;

pub use ledger_address::LedgerAddress;
pub use ledger_errors::LedgerError;
pub use ledger_gateway::{HttpLedgerGateway, LedgerConfig, LedgerGatewayTrait};
pub use ledger_model::{
    CertificateRecord, CreateAppointmentRequest, LedgerTxReceipt, MintCertificateRequest,
    MintedCertificate,
};
