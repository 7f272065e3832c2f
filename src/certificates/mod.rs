pub(crate) mod certificates_errors;
pub(crate) mod certificates_format;
pub(crate) mod certificates_model;
pub(crate) mod certificates_service;
pub(crate) mod certificates_traits;

pub use certificates_errors::CertificateError;
pub use certificates_format::{format_certificate_id, format_with_year, parse_token_id};
pub use certificates_model::{vaccination_certificate_metadata, IssueOutcome, VerifiedCertificate};
pub use certificates_service::CertificateService;
pub use certificates_traits::CertificateIssuerTrait;
