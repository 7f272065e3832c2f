use async_trait::async_trait;
use chrono::{Datelike, Utc};
use log::{debug, error, info, warn};
use std::sync::Arc;

use crate::bookings::BookingRepositoryTrait;
use crate::errors::Result;
use crate::ledger::{LedgerAddress, LedgerGatewayTrait, MintCertificateRequest};
use crate::pinning::MetadataPinningTrait;
use crate::reference::ReferenceLookupTrait;

use super::certificates_errors::CertificateError;
use super::certificates_format::{format_certificate_id, format_with_year};
use super::certificates_model::{
    vaccination_certificate_metadata, IssueOutcome, VerifiedCertificate,
};
use super::certificates_traits::CertificateIssuerTrait;

/// Coordinates certificate issuance for completed bookings: builds and pins
/// the metadata, mints the ledger token, and records the result exactly once.
pub struct CertificateService<B, L, G, P>
where
    B: BookingRepositoryTrait,
    L: ReferenceLookupTrait,
    G: LedgerGatewayTrait,
    P: MetadataPinningTrait,
{
    bookings: Arc<B>,
    reference: Arc<L>,
    ledger: Option<Arc<G>>,
    pinning: Arc<P>,
}

impl<B, L, G, P> CertificateService<B, L, G, P>
where
    B: BookingRepositoryTrait,
    L: ReferenceLookupTrait,
    G: LedgerGatewayTrait,
    P: MetadataPinningTrait,
{
    pub fn new(
        bookings: Arc<B>,
        reference: Arc<L>,
        ledger: Option<Arc<G>>,
        pinning: Arc<P>,
    ) -> Self {
        CertificateService {
            bookings,
            reference,
            ledger,
            pinning,
        }
    }

    /// Verifies a certificate on the ledger and decorates the record with
    /// formatted certificate ids.
    pub async fn verify_certificate(&self, token_id: i64) -> Result<VerifiedCertificate> {
        if token_id <= 0 {
            return Err(CertificateError::InvalidTokenId(token_id.to_string()).into());
        }
        let gateway = self
            .ledger
            .as_ref()
            .ok_or(CertificateError::GatewayDisabled)?;

        let record = gateway.verify_certificate(token_id).await?;
        let issued_at = chrono::DateTime::from_timestamp(record.issued_at, 0)
            .map(|d| d.to_rfc3339())
            .unwrap_or_else(|| record.issued_at.to_string());

        Ok(VerifiedCertificate {
            token_id,
            certificate_id: format_with_year(token_id, Utc::now().year()),
            certificate_id_short: format_certificate_id(token_id),
            is_valid: record.is_valid,
            patient: record.patient,
            vaccine_name: record.vaccine_name,
            center_name: record.center_name,
            vaccination_date: record.vaccination_date,
            issued_at,
        })
    }
}

#[async_trait]
impl<B, L, G, P> CertificateIssuerTrait for CertificateService<B, L, G, P>
where
    B: BookingRepositoryTrait,
    L: ReferenceLookupTrait,
    G: LedgerGatewayTrait,
    P: MetadataPinningTrait,
{
    async fn issue_for_booking(&self, booking_id: &str) -> Result<IssueOutcome> {
        let booking = self.bookings.get_by_id(booking_id)?;

        if booking.certificate_token_id.is_some() {
            debug!("Booking {} already has a certificate, nothing to do", booking_id);
            return Ok(IssueOutcome::AlreadyIssued);
        }

        let patient = self.reference.get_user(&booking.patient_id)?;
        let vaccine = self.reference.get_vaccine(&booking.vaccine_id)?;
        let center = self.reference.get_center(&booking.center_id)?;

        let raw_address = match self.reference.get_linked_address(&booking.patient_id)? {
            Some(raw) => raw,
            None => {
                warn!(
                    "Booking {} completed but patient {} has no linked ledger address, skipping certificate",
                    booking_id, patient.id
                );
                return Ok(IssueOutcome::NoLinkedAddress);
            }
        };
        let address = match LedgerAddress::parse(&raw_address) {
            Ok(address) => address,
            Err(_) => {
                error!(
                    "Booking {} has an invalid linked ledger address '{}', skipping certificate",
                    booking_id, raw_address
                );
                return Ok(IssueOutcome::InvalidAddress(raw_address));
            }
        };

        let gateway = match &self.ledger {
            Some(gateway) => gateway.clone(),
            None => {
                warn!(
                    "Ledger gateway not configured, cannot mint certificate for booking {}",
                    booking_id
                );
                return Ok(IssueOutcome::GatewayDisabled);
            }
        };

        // Claim the mint before any external call; losing the claim means
        // another worker is (or was) minting.
        if !self.bookings.claim_certificate(booking_id).await? {
            debug!("Certificate claim for booking {} is held elsewhere", booking_id);
            return Ok(IssueOutcome::ClaimHeld);
        }

        let metadata = vaccination_certificate_metadata(
            &booking.id,
            &patient.full_name,
            &vaccine.name,
            &center.name,
            &booking.first_dose_date,
            booking.total_doses,
        );
        let token_uri = self.pinning.upload_metadata(&metadata).await;

        let request = MintCertificateRequest {
            patient_address: address.into_string(),
            booking_id: booking.id.clone(),
            vaccine_name: vaccine.name,
            center_name: center.name,
            vaccination_date: booking.first_dose_date.clone(),
            token_uri,
        };

        let minted = match gateway.mint_certificate(&request).await {
            Ok(minted) => minted,
            Err(e) => {
                error!("Certificate mint for booking {} failed: {}", booking_id, e);
                self.bookings.release_certificate_claim(booking_id).await?;
                return Err(e.into());
            }
        };

        self.bookings
            .record_certificate(booking_id, minted.token_id, &minted.tx_hash)
            .await?;
        info!(
            "Minted certificate {} for booking {} (tx {}, block {})",
            format_certificate_id(minted.token_id),
            booking_id,
            minted.tx_hash,
            minted.block_number
        );

        Ok(IssueOutcome::Minted {
            token_id: minted.token_id,
            tx_hash: minted.tx_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointments::AppointmentDB;
    use crate::bookings::{
        Booking, BookingDB, BookingStatus, LedgerMirrorStatus, LedgerMirrorUpdate, OverallStatus,
    };
    use crate::errors::{Error, ValidationError};
    use crate::ledger::{
        CertificateRecord, CreateAppointmentRequest, LedgerError, LedgerTxReceipt,
        MintedCertificate,
    };
    use crate::models::Paged;
    use crate::outbox::NewOutboxEvent;
    use crate::pinning::{PinMetadata, PLACEHOLDER_CONTENT_URI};
    use crate::reference::{Center, ReferenceError, User, Vaccine};
    use std::sync::Mutex;

    const GOOD_ADDRESS: &str = "0x00000000000000000000000000000000000000aa";

    fn completed_booking() -> Booking {
        let now = chrono::Utc::now().naive_utc();
        Booking {
            id: "booking-1".to_string(),
            patient_id: "user-1".to_string(),
            vaccine_id: "vaccine-1".to_string(),
            center_id: "center-1".to_string(),
            first_dose_date: "2026-03-01".to_string(),
            first_dose_time: "09:00".to_string(),
            total_doses: 2,
            total_amount: 120.0,
            status: BookingStatus::Confirmed,
            overall_status: OverallStatus::Completed,
            doctor_assigned: true,
            ledger_tx_hash: None,
            ledger_appointment_id: None,
            ledger_status: LedgerMirrorStatus::Skipped,
            certificate_token_id: None,
            certificate_tx_hash: None,
            certificate_claimed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    struct MockBookingRepository {
        booking: Mutex<Booking>,
        claimed: Mutex<bool>,
    }

    impl MockBookingRepository {
        fn new(booking: Booking) -> Self {
            MockBookingRepository {
                booking: Mutex::new(booking),
                claimed: Mutex::new(false),
            }
        }

        fn is_claimed(&self) -> bool {
            *self.claimed.lock().unwrap()
        }

        fn token_id(&self) -> Option<String> {
            self.booking.lock().unwrap().certificate_token_id.clone()
        }
    }

    #[async_trait]
    impl BookingRepositoryTrait for MockBookingRepository {
        fn get_by_id(&self, _booking_id: &str) -> Result<Booking> {
            Ok(self.booking.lock().unwrap().clone())
        }

        fn list(&self, _page: i64, _size: i64) -> Result<Paged<Booking>> {
            Err(Error::Validation(ValidationError::InvalidInput(
                "not used in this test".to_string(),
            )))
        }

        fn list_for_patient(
            &self,
            _patient_id: &str,
            _only_in_progress: bool,
        ) -> Result<Vec<Booking>> {
            Ok(Vec::new())
        }

        async fn create_with_appointments(
            &self,
            _booking: BookingDB,
            _appointments: Vec<AppointmentDB>,
            _event: NewOutboxEvent,
        ) -> Result<Booking> {
            Err(Error::Validation(ValidationError::InvalidInput(
                "not used in this test".to_string(),
            )))
        }

        async fn record_ledger_mirror(
            &self,
            _booking_id: &str,
            _update: LedgerMirrorUpdate,
        ) -> Result<()> {
            Ok(())
        }

        async fn claim_certificate(&self, _booking_id: &str) -> Result<bool> {
            let mut claimed = self.claimed.lock().unwrap();
            if *claimed || self.booking.lock().unwrap().certificate_token_id.is_some() {
                return Ok(false);
            }
            *claimed = true;
            Ok(true)
        }

        async fn release_certificate_claim(&self, _booking_id: &str) -> Result<()> {
            *self.claimed.lock().unwrap() = false;
            Ok(())
        }

        async fn record_certificate(
            &self,
            _booking_id: &str,
            token_id: i64,
            tx_hash: &str,
        ) -> Result<()> {
            let mut booking = self.booking.lock().unwrap();
            booking.certificate_token_id = Some(token_id.to_string());
            booking.certificate_tx_hash = Some(tx_hash.to_string());
            Ok(())
        }
    }

    struct MockReference {
        wallet: Option<String>,
    }

    impl ReferenceLookupTrait for MockReference {
        fn get_vaccine(&self, _vaccine_id: &str) -> Result<Vaccine> {
            let now = chrono::Utc::now().naive_utc();
            Ok(Vaccine {
                id: "vaccine-1".to_string(),
                name: "CoviShield".to_string(),
                manufacturer: None,
                doses_required: 2,
                created_at: now,
            })
        }

        fn get_center(&self, _center_id: &str) -> Result<Center> {
            let now = chrono::Utc::now().naive_utc();
            Ok(Center {
                id: "center-1".to_string(),
                name: "Central Clinic".to_string(),
                address: None,
                created_at: now,
            })
        }

        fn get_user(&self, key: &str) -> Result<User> {
            if key != "user-1" {
                return Err(ReferenceError::NotFound(format!("User {} not found", key)).into());
            }
            let now = chrono::Utc::now().naive_utc();
            Ok(User {
                id: "user-1".to_string(),
                full_name: "Jane Roe".to_string(),
                email: Some("jane@example.test".to_string()),
                wallet_address: self.wallet.clone(),
                created_at: now,
            })
        }

        fn get_linked_address(&self, _user_id: &str) -> Result<Option<String>> {
            Ok(self.wallet.clone())
        }
    }

    struct MockGateway {
        mints: Mutex<u32>,
        failures_remaining: Mutex<u32>,
    }

    impl MockGateway {
        fn new() -> Self {
            MockGateway {
                mints: Mutex::new(0),
                failures_remaining: Mutex::new(0),
            }
        }

        fn failing_once() -> Self {
            MockGateway {
                mints: Mutex::new(0),
                failures_remaining: Mutex::new(1),
            }
        }

        fn mint_count(&self) -> u32 {
            *self.mints.lock().unwrap()
        }
    }

    #[async_trait]
    impl LedgerGatewayTrait for MockGateway {
        async fn create_appointment(
            &self,
            _request: &CreateAppointmentRequest,
        ) -> std::result::Result<LedgerTxReceipt, LedgerError> {
            Err(LedgerError::Unavailable("not used in this test".to_string()))
        }

        async fn mint_certificate(
            &self,
            _request: &MintCertificateRequest,
        ) -> std::result::Result<MintedCertificate, LedgerError> {
            let mut failures = self.failures_remaining.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(LedgerError::Unavailable("mint node down".to_string()));
            }
            *self.mints.lock().unwrap() += 1;
            Ok(MintedCertificate {
                token_id: 42,
                tx_hash: "0xmint".to_string(),
                block_number: 1337,
            })
        }

        async fn verify_certificate(
            &self,
            token_id: i64,
        ) -> std::result::Result<CertificateRecord, LedgerError> {
            Ok(CertificateRecord {
                is_valid: true,
                patient: GOOD_ADDRESS.to_string(),
                vaccine_name: "CoviShield".to_string(),
                center_name: "Central Clinic".to_string(),
                vaccination_date: "2026-03-01".to_string(),
                issued_at: 1_767_225_600 + token_id,
            })
        }
    }

    struct MockPinning;

    #[async_trait]
    impl MetadataPinningTrait for MockPinning {
        async fn upload_metadata(&self, _metadata: &PinMetadata) -> String {
            PLACEHOLDER_CONTENT_URI.to_string()
        }

        fn http_url(&self, content_uri: &str) -> String {
            content_uri.to_string()
        }
    }

    fn service(
        bookings: Arc<MockBookingRepository>,
        gateway: Option<Arc<MockGateway>>,
        wallet: Option<&str>,
    ) -> CertificateService<MockBookingRepository, MockReference, MockGateway, MockPinning> {
        CertificateService::new(
            bookings,
            Arc::new(MockReference {
                wallet: wallet.map(|w| w.to_string()),
            }),
            gateway,
            Arc::new(MockPinning),
        )
    }

    #[tokio::test]
    async fn mints_once_and_records_the_certificate() {
        let bookings = Arc::new(MockBookingRepository::new(completed_booking()));
        let gateway = Arc::new(MockGateway::new());
        let service = service(bookings.clone(), Some(gateway.clone()), Some(GOOD_ADDRESS));

        let outcome = service.issue_for_booking("booking-1").await.unwrap();
        assert_eq!(
            outcome,
            IssueOutcome::Minted {
                token_id: 42,
                tx_hash: "0xmint".to_string()
            }
        );
        assert_eq!(bookings.token_id(), Some("42".to_string()));
        assert_eq!(gateway.mint_count(), 1);

        // a second invocation is a no-op guarded by the recorded token
        let outcome = service.issue_for_booking("booking-1").await.unwrap();
        assert_eq!(outcome, IssueOutcome::AlreadyIssued);
        assert_eq!(gateway.mint_count(), 1);
    }

    #[tokio::test]
    async fn missing_linked_address_skips_without_claiming() {
        let bookings = Arc::new(MockBookingRepository::new(completed_booking()));
        let gateway = Arc::new(MockGateway::new());
        let service = service(bookings.clone(), Some(gateway.clone()), None);

        let outcome = service.issue_for_booking("booking-1").await.unwrap();
        assert_eq!(outcome, IssueOutcome::NoLinkedAddress);
        assert!(!bookings.is_claimed());
        assert_eq!(gateway.mint_count(), 0);
        assert_eq!(bookings.token_id(), None);
    }

    #[tokio::test]
    async fn invalid_linked_address_skips() {
        let bookings = Arc::new(MockBookingRepository::new(completed_booking()));
        let gateway = Arc::new(MockGateway::new());
        let service = service(bookings.clone(), Some(gateway.clone()), Some("not-a-wallet"));

        let outcome = service.issue_for_booking("booking-1").await.unwrap();
        assert_eq!(
            outcome,
            IssueOutcome::InvalidAddress("not-a-wallet".to_string())
        );
        assert_eq!(gateway.mint_count(), 0);
    }

    #[tokio::test]
    async fn held_claim_short_circuits_the_mint() {
        let bookings = Arc::new(MockBookingRepository::new(completed_booking()));
        *bookings.claimed.lock().unwrap() = true;
        let gateway = Arc::new(MockGateway::new());
        let service = service(bookings.clone(), Some(gateway.clone()), Some(GOOD_ADDRESS));

        let outcome = service.issue_for_booking("booking-1").await.unwrap();
        assert_eq!(outcome, IssueOutcome::ClaimHeld);
        assert_eq!(gateway.mint_count(), 0);
    }

    #[tokio::test]
    async fn mint_failure_releases_the_claim_for_retry() {
        let bookings = Arc::new(MockBookingRepository::new(completed_booking()));
        let gateway = Arc::new(MockGateway::failing_once());
        let service = service(bookings.clone(), Some(gateway.clone()), Some(GOOD_ADDRESS));

        let err = service.issue_for_booking("booking-1").await.unwrap_err();
        assert!(matches!(err, Error::Ledger(LedgerError::Unavailable(_))));
        assert!(!bookings.is_claimed());
        assert_eq!(bookings.token_id(), None);

        // the retry can claim again and succeed
        let outcome = service.issue_for_booking("booking-1").await.unwrap();
        assert!(matches!(outcome, IssueOutcome::Minted { token_id: 42, .. }));
        assert_eq!(gateway.mint_count(), 1);
    }

    #[tokio::test]
    async fn disabled_gateway_is_a_skip_not_an_error() {
        let bookings = Arc::new(MockBookingRepository::new(completed_booking()));
        let service = service(bookings.clone(), None, Some(GOOD_ADDRESS));

        let outcome = service.issue_for_booking("booking-1").await.unwrap();
        assert_eq!(outcome, IssueOutcome::GatewayDisabled);
        assert_eq!(bookings.token_id(), None);
    }

    #[tokio::test]
    async fn verify_decorates_the_ledger_record() {
        let bookings = Arc::new(MockBookingRepository::new(completed_booking()));
        let gateway = Arc::new(MockGateway::new());
        let service = service(bookings, Some(gateway), Some(GOOD_ADDRESS));

        let verified = service.verify_certificate(42).await.unwrap();
        assert_eq!(verified.token_id, 42);
        assert_eq!(verified.certificate_id_short, "VTC-000042");
        assert!(verified.certificate_id.starts_with("VTC-2"));
        assert!(verified.is_valid);
        assert!(verified.issued_at.contains('T'));

        let err = service.verify_certificate(0).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Certificate(CertificateError::InvalidTokenId(_))
        ));
    }
}
