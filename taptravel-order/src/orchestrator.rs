use std::collections::HashSet;
use std::sync::Arc;
use taptravel_core::backend::IntentRequest;
use taptravel_core::payment::{PaymentError, PaymentGateway, PaymentIntent, SheetErrorCode};

use crate::models::{PaymentOutcome, PaymentReceipt, PaymentState};
use crate::session::BookingSession;

/// Drives one session's payment through intent creation and the hosted sheet.
///
/// Every initialization asks the backend for a new intent; an intent whose
/// client secret was already handed to the sheet is never prepared again.
pub struct PaymentOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    state: PaymentState,
    intent: Option<PaymentIntent>,
    used_secrets: HashSet<String>,
}

impl PaymentOrchestrator {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            gateway,
            state: PaymentState::Idle,
            intent: None,
            used_secrets: HashSet::new(),
        }
    }

    pub fn state(&self) -> &PaymentState {
        &self.state
    }

    pub fn intent(&self) -> Option<&PaymentIntent> {
        self.intent.as_ref()
    }

    /// Request a fresh intent for the session's current amount and prepare the
    /// sheet with it. On success the state is `Ready`.
    pub async fn initialize(&mut self, session: &BookingSession) -> Result<(), PaymentError> {
        if !self.state.can_initialize() {
            return Err(PaymentError::InvalidState(self.state.to_string()));
        }
        session
            .check_ready()
            .map_err(|e| PaymentError::NotReady(e.to_string()))?;

        let request = IntentRequest {
            amount: session.compute_amount(),
            bus_id: session.trip_id().to_string(),
            user_id: session.rider().id.clone(),
            admin_id: session.admin_id().map(str::to_string),
        };

        self.state = PaymentState::Initializing;
        self.intent = None;
        tracing::info!(
            session_id = %session.id(),
            trip_id = %request.bus_id,
            amount = request.amount,
            "Creating payment intent"
        );

        let intent = match self.gateway.create_intent(&request).await {
            Ok(intent) => intent,
            Err(e) => return Err(self.initialization_failed(e.to_string())),
        };

        let secret = intent.client_secret.expose().clone();
        if self.used_secrets.contains(&secret) {
            return Err(self.initialization_failed(format!(
                "intent {} was already used",
                intent.id()
            )));
        }

        if let Err(e) = self.gateway.prepare(&intent).await {
            return Err(self.initialization_failed(e.message));
        }

        self.used_secrets.insert(secret);
        tracing::info!(intent_id = %intent.id(), "Payment sheet ready");
        self.intent = Some(intent);
        self.state = PaymentState::Ready;
        Ok(())
    }

    /// Show the prepared sheet and wait for the rider.
    ///
    /// A dismissed sheet can be shown again with the same intent. A failed
    /// payment drops the intent, so the next attempt starts from
    /// [`initialize`](Self::initialize).
    pub async fn present(&mut self) -> Result<PaymentOutcome, PaymentError> {
        let presentable = matches!(self.state, PaymentState::Ready)
            || (matches!(self.state, PaymentState::Cancelled) && self.intent.is_some());
        if !presentable {
            return Err(PaymentError::InvalidState(self.state.to_string()));
        }
        let Some(intent) = self.intent.as_ref() else {
            return Err(PaymentError::InvalidState(self.state.to_string()));
        };
        let intent_id = intent.id();

        self.state = PaymentState::Presenting;
        tracing::debug!(intent_id = %intent_id, "Presenting payment sheet");

        match self.gateway.present().await {
            Ok(()) => {
                let receipt = PaymentReceipt::new(
                    intent_id.clone(),
                    intent.amount,
                    intent.trip_id.clone(),
                    intent.rider_id.clone(),
                );
                self.intent = None;
                self.state = PaymentState::Succeeded;
                tracing::info!(intent_id = %intent_id, amount = receipt.amount(), "Payment succeeded");
                Ok(PaymentOutcome::Succeeded(receipt))
            }
            Err(e) if e.code == SheetErrorCode::Canceled => {
                self.state = PaymentState::Cancelled;
                tracing::info!(intent_id = %intent_id, "Payment sheet dismissed");
                Ok(PaymentOutcome::Cancelled)
            }
            Err(e) => {
                self.intent = None;
                self.state = PaymentState::Failed {
                    reason: e.message.clone(),
                };
                tracing::warn!(intent_id = %intent_id, error = %e, "Payment failed");
                Ok(PaymentOutcome::Failed { reason: e.message })
            }
        }
    }

    /// Forget the prepared intent, e.g. after the selection changed.
    pub fn reset(&mut self) {
        if self.intent.take().is_some() {
            tracing::debug!("Discarding prepared payment intent");
        }
        self.state = PaymentState::Idle;
    }

    fn initialization_failed(&mut self, cause: String) -> PaymentError {
        tracing::warn!(error = %cause, "Payment initialization failed");
        self.intent = None;
        self.state = PaymentState::Failed {
            reason: "initialization failed".to_string(),
        };
        PaymentError::InitializationFailed(cause)
    }
}
