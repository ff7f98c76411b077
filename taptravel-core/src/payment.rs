use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use taptravel_shared::{BackendError, Masked};

use crate::backend::{BookingBackend, IntentRequest, IntentSecrets};

/// A provider-issued, single-use authorization for one `(trip, rider, amount)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub client_secret: Masked<String>,
    pub ephemeral_key: Masked<String>,
    pub customer: String,
    pub amount: i64,
    pub trip_id: String,
    pub rider_id: String,
    pub created_at: DateTime<Utc>,
}

impl PaymentIntent {
    pub fn new(secrets: IntentSecrets, request: &IntentRequest) -> Self {
        Self {
            client_secret: secrets.client_secret,
            ephemeral_key: secrets.ephemeral_key,
            customer: secrets.customer,
            amount: request.amount,
            trip_id: request.bus_id.clone(),
            rider_id: request.user_id.clone(),
            created_at: Utc::now(),
        }
    }

    /// Provider id of the intent. Client secrets have the form
    /// `<intent id>_secret_<nonce>`, so the id is safe to log.
    ///
    /// For a secret without that shape the reference is `<customer>@<created
    /// millis>`, which support can still match against the provider account.
    pub fn id(&self) -> String {
        match self.client_secret.expose().split_once("_secret_") {
            Some((id, _)) => id.to_string(),
            None => format!("{}@{}", self.customer, self.created_at.timestamp_millis()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SheetErrorCode {
    /// The rider dismissed the sheet.
    Canceled,
    Failed,
}

/// Error reported by the hosted payment sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct SheetError {
    pub code: SheetErrorCode,
    pub message: String,
}

impl SheetError {
    pub fn canceled() -> Self {
        Self {
            code: SheetErrorCode::Canceled,
            message: "The payment flow has been canceled".to_string(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            code: SheetErrorCode::Failed,
            message: message.into(),
        }
    }
}

/// What the sheet needs to prepare itself for one intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSetup {
    pub client_secret: Masked<String>,
    pub customer_id: String,
    pub ephemeral_key: Masked<String>,
    pub merchant_display_name: String,
    pub amount: i64,
}

/// The provider-hosted payment sheet: card entry and confirmation happen
/// inside it and are never seen by this crate.
#[async_trait]
pub trait PaymentSheet: Send + Sync {
    async fn init_payment_sheet(&self, setup: &SheetSetup) -> Result<(), SheetError>;

    /// Suspends until the rider completes or dismisses the sheet.
    async fn present_payment_sheet(&self) -> Result<(), SheetError>;
}

/// Everything the payment state machine needs from the outside world.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: &IntentRequest) -> Result<PaymentIntent, BackendError>;

    async fn prepare(&self, intent: &PaymentIntent) -> Result<(), SheetError>;

    async fn present(&self) -> Result<(), SheetError>;
}

/// Gateway backed by the ticketing backend (intent creation) and a hosted sheet.
pub struct SheetGateway {
    backend: Arc<dyn BookingBackend>,
    sheet: Arc<dyn PaymentSheet>,
    merchant_display_name: String,
}

impl SheetGateway {
    pub fn new(
        backend: Arc<dyn BookingBackend>,
        sheet: Arc<dyn PaymentSheet>,
        merchant_display_name: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            sheet,
            merchant_display_name: merchant_display_name.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for SheetGateway {
    async fn create_intent(&self, request: &IntentRequest) -> Result<PaymentIntent, BackendError> {
        let secrets = self.backend.create_payment_intent(request).await?;
        Ok(PaymentIntent::new(secrets, request))
    }

    async fn prepare(&self, intent: &PaymentIntent) -> Result<(), SheetError> {
        let setup = SheetSetup {
            client_secret: intent.client_secret.clone(),
            customer_id: intent.customer.clone(),
            ephemeral_key: intent.ephemeral_key.clone(),
            merchant_display_name: self.merchant_display_name.clone(),
            amount: intent.amount,
        };
        self.sheet.init_payment_sheet(&setup).await
    }

    async fn present(&self) -> Result<(), SheetError> {
        self.sheet.present_payment_sheet().await
    }
}

/// Failures of the payment step. The booking session survives all of them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment initialization failed: {0}")]
    InitializationFailed(String),

    /// Provider-supplied message, shown to the rider as is.
    #[error("Payment failed: {0}")]
    Declined(String),

    #[error("Payment not possible in state {0}")]
    InvalidState(String),

    #[error("Booking is not ready for payment: {0}")]
    NotReady(String),
}
