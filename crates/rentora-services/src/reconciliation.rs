//! Payment reconciliation
//!
//! Bridges local payment records and the asynchronous payment provider.
//! Initiation creates a PENDING record before the provider is contacted;
//! provider webhooks later settle, fail or refund that record. All event
//! handling is idempotent: replaying a webhook never double-applies.
//!
//! Provider calls never run inside a database transaction. A timeout or
//! provider error leaves the local record PENDING so a later event or a
//! retry can still resolve it.

use rentora_core::{
    config::{BookingConfig, ProviderConfig},
    models::{Actor, Booking, Payment, PaymentStatus, PaymentType},
    traits::{BookingRepository, PaymentRepository, VehicleRepository},
    AppError, AppResult,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::access::AccessPolicy;
use crate::booking::BookingService;
use crate::constants::PROVIDER_STATUS_HOLD;
use crate::provider::{ChargeRequest, PaymentGateway, ProviderEvent, ProviderEventType};

/// Result of a payment initiation
#[derive(Debug, Clone)]
pub struct PaymentInitiation {
    pub payment: Payment,
    /// Checkout URL for the client; absent when an existing pending
    /// payment was returned instead of a new provider session
    pub checkout_url: Option<String>,
    /// False when an existing pending payment was reused
    pub created: bool,
}

/// Payment initiation and provider event reconciliation
pub struct ReconciliationService<P, G, V, B>
where
    P: PaymentRepository,
    G: PaymentGateway,
    V: VehicleRepository,
    B: BookingRepository,
{
    payments: Arc<P>,
    gateway: Arc<G>,
    bookings: Arc<BookingService<V, B>>,
    policy: AccessPolicy,
    provider_name: String,
    currency: String,
    deposit_amount: Decimal,
}

impl<P, G, V, B> ReconciliationService<P, G, V, B>
where
    P: PaymentRepository,
    G: PaymentGateway,
    V: VehicleRepository,
    B: BookingRepository,
{
    pub fn new(
        payments: Arc<P>,
        gateway: Arc<G>,
        bookings: Arc<BookingService<V, B>>,
        provider: &ProviderConfig,
        booking_config: &BookingConfig,
    ) -> AppResult<Self> {
        let deposit_amount = Decimal::try_from(booking_config.security_deposit_amount)
            .map_err(|e| AppError::Config(format!("Invalid security deposit amount: {}", e)))?
            .round_dp(2);

        Ok(Self {
            payments,
            gateway,
            bookings,
            policy: AccessPolicy,
            provider_name: provider.name.clone(),
            currency: booking_config.currency.clone(),
            deposit_amount,
        })
    }

    fn charge_amount(&self, booking: &Booking, payment_type: PaymentType) -> Decimal {
        match payment_type {
            PaymentType::SecurityDeposit => self.deposit_amount,
            _ => booking.total_cost,
        }
    }

    /// Initiate a payment for a booking.
    ///
    /// Idempotent: a pending payment of the same type on the same
    /// booking is returned as-is instead of creating a second provider
    /// session. The local record is written before the provider call so
    /// a timeout never loses the charge.
    #[instrument(skip(self, actor))]
    pub async fn initiate_payment(
        &self,
        actor: &Actor,
        booking_id: i64,
        payment_type: PaymentType,
    ) -> AppResult<PaymentInitiation> {
        if !matches!(
            payment_type,
            PaymentType::RentalFee | PaymentType::SecurityDeposit
        ) {
            return Err(AppError::Validation(format!(
                "Payment type '{}' cannot be initiated by clients",
                payment_type
            )));
        }

        let booking = self.bookings.get_booking(actor, booking_id).await?;

        if !booking.status.holds_interval() {
            return Err(AppError::Validation(format!(
                "Cannot initiate payments for a {} booking",
                booking.status
            )));
        }

        if let Some(existing) = self.payments.find_pending(booking_id, payment_type).await? {
            debug!(
                "Reusing pending {} payment {} for booking {}",
                payment_type, existing.reference, booking_id
            );
            return Ok(PaymentInitiation {
                payment: existing,
                checkout_url: None,
                created: false,
            });
        }

        let amount = self.charge_amount(&booking, payment_type);
        let payment = Payment::new(
            booking_id,
            amount,
            self.currency.clone(),
            payment_type,
            self.provider_name.clone(),
        );
        let payment = self.payments.create(&payment).await?;

        // Provider call happens after the record exists and outside any
        // transaction. On failure the record stays PENDING.
        let session = self
            .gateway
            .initiate_charge(&ChargeRequest {
                reference: payment.reference,
                amount,
                currency: self.currency.clone(),
                description: format!("{} for booking {}", payment_type, booking_id),
                capture: !payment_type.uses_hold(),
            })
            .await?;

        info!(
            "Initiated {} payment {} of {} {} for booking {}",
            payment_type, payment.reference, amount, self.currency, booking_id
        );

        Ok(PaymentInitiation {
            payment,
            checkout_url: session.checkout_url,
            created: true,
        })
    }

    /// Apply a provider webhook event.
    ///
    /// Events referencing unknown payments are acknowledged and logged;
    /// returning an error would only make the provider retry a delivery
    /// we can never apply.
    #[instrument(skip(self, event), fields(event_type = ?event.event_type))]
    pub async fn handle_event(&self, event: &ProviderEvent) -> AppResult<()> {
        match event.event_type {
            ProviderEventType::Success => self.apply_success(event).await,
            ProviderEventType::Failure => self.apply_failure(event).await,
            ProviderEventType::Refund => self.apply_refund(event).await,
        }
    }

    async fn find_referenced(&self, event: &ProviderEvent) -> AppResult<Option<Payment>> {
        let reference = match event.payment_reference {
            Some(reference) => reference,
            None => {
                warn!("Provider event without payment reference, ignoring");
                return Ok(None);
            }
        };
        let payment = self.payments.find_by_reference(reference).await?;
        if payment.is_none() {
            warn!("Provider event for unknown payment {}, ignoring", reference);
        }
        Ok(payment)
    }

    async fn apply_success(&self, event: &ProviderEvent) -> AppResult<()> {
        let payment = match self.find_referenced(event).await? {
            Some(payment) => payment,
            None => return Ok(()),
        };

        if payment.status.is_settled() {
            debug!("Payment {} already settled, skipping replay", payment.reference);
            return Ok(());
        }

        let held = event.provider_status.as_deref() == Some(PROVIDER_STATUS_HOLD)
            || payment.payment_type.uses_hold();
        let status = if held {
            PaymentStatus::Authorized
        } else {
            PaymentStatus::Completed
        };

        let payment = self
            .payments
            .update_status(
                payment.reference,
                status,
                event.external_transaction_id.as_deref(),
                Some(&event.payload),
            )
            .await?;

        info!("Payment {} settled as {}", payment.reference, status);

        // A captured rental fee confirms the booking; holds do not.
        if payment.payment_type == PaymentType::RentalFee && status == PaymentStatus::Completed {
            self.bookings.confirm_booking(payment.booking_id).await?;
        }

        Ok(())
    }

    async fn apply_failure(&self, event: &ProviderEvent) -> AppResult<()> {
        let payment = match self.find_referenced(event).await? {
            Some(payment) => payment,
            None => return Ok(()),
        };

        // Only a pending payment can fail; settled, refunded and
        // already-failed records ignore out-of-order deliveries.
        if payment.status != PaymentStatus::Pending {
            warn!(
                "Failure event for {} payment {}, ignoring out-of-order delivery",
                payment.status, payment.reference
            );
            return Ok(());
        }

        self.payments
            .update_status(
                payment.reference,
                PaymentStatus::Failed,
                event.external_transaction_id.as_deref(),
                Some(&event.payload),
            )
            .await?;

        // The booking is left untouched; the client may retry the charge.
        info!("Payment {} marked failed", payment.reference);
        Ok(())
    }

    async fn apply_refund(&self, event: &ProviderEvent) -> AppResult<()> {
        let transaction_id = match event.external_transaction_id.as_deref() {
            Some(id) => id,
            None => {
                warn!("Refund event without transaction id, ignoring");
                return Ok(());
            }
        };

        let touched = self
            .payments
            .mark_refunded_by_transaction(transaction_id)
            .await?;

        if touched == 0 {
            warn!("Refund event for unknown transaction {}, ignoring", transaction_id);
        } else {
            info!("Transaction {} refunded ({} payment(s))", transaction_id, touched);
        }
        Ok(())
    }

    /// Release the held security deposit of a booking.
    ///
    /// Agency-side operation. If the provider call fails the deposit
    /// stays AUTHORIZED and the release can be retried.
    #[instrument(skip(self, actor))]
    pub async fn release_security_deposit(
        &self,
        actor: &Actor,
        booking_id: i64,
    ) -> AppResult<Payment> {
        let booking = self.bookings.get_booking(actor, booking_id).await?;
        self.policy.authorize_release_deposit(actor, &booking)?;

        let deposit = self
            .payments
            .find_authorized_deposit(booking_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No authorized security deposit for booking {}",
                    booking_id
                ))
            })?;

        let transaction_id = deposit.provider_transaction_id.as_deref().ok_or_else(|| {
            AppError::Internal(format!(
                "Authorized deposit {} has no provider transaction id",
                deposit.reference
            ))
        })?;

        self.gateway.release_hold(transaction_id).await?;

        let released = self
            .payments
            .update_status(deposit.reference, PaymentStatus::Refunded, None, None)
            .await?;

        info!(
            "Security deposit {} released for booking {}",
            released.reference, booking_id
        );
        Ok(released)
    }

    /// Payments attached to a booking, visibility-checked
    pub async fn list_payments(&self, actor: &Actor, booking_id: i64) -> AppResult<Vec<Payment>> {
        self.bookings.get_booking(actor, booking_id).await?;
        self.payments.list_for_booking(booking_id).await
    }

    /// Confirm a booking once its rental fee settles; exposed for
    /// completeness of the lifecycle wiring
    pub async fn confirm_after_settlement(&self, booking_id: i64) -> AppResult<Booking> {
        self.bookings.confirm_booking(booking_id).await
    }
}
