use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use taptravel_catalog::TripSource;
use taptravel_core::backend::{BookingBackend, IntentRequest, IntentSecrets, SeatStatusUpdate, TicketBatch};
use taptravel_shared::{BackendError, Masked, Trip};

use crate::app_config::BackendConfig;

/// Ticketing backend reached over HTTP/JSON.
#[derive(Clone)]
pub struct HttpBookingBackend {
    client: Client,
    base_url: String,
    token: Option<Masked<String>>,
}

impl HttpBookingBackend {
    pub fn new(config: &BackendConfig, token: Option<Masked<String>>) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token.expose()),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T, BackendError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(call = what, error = %e, "Backend call failed");
                BackendError::Network(e.to_string())
            })?;

        match response.status() {
            status if status.is_success() => response
                .json::<T>()
                .await
                .map_err(|e| BackendError::Decode(e.to_string())),
            StatusCode::NOT_FOUND => Err(BackendError::NotFound(what.to_string())),
            status => {
                let message = response.text().await.unwrap_or_default();
                tracing::warn!(call = what, status = status.as_u16(), "Backend rejected call");
                Err(BackendError::Rejected {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

#[async_trait]
impl TripSource for HttpBookingBackend {
    async fn fetch_trip(&self, trip_id: &str) -> Result<Trip, BackendError> {
        let request = self.client.get(self.url(&format!("bus/{}", trip_id)));
        self.send(request, &format!("trip {}", trip_id)).await
    }
}

#[async_trait]
impl BookingBackend for HttpBookingBackend {
    async fn create_payment_intent(
        &self,
        request: &IntentRequest,
    ) -> Result<IntentSecrets, BackendError> {
        let call = self
            .client
            .post(self.url("payment/create-payment-intent"))
            .json(request);
        self.send(call, "payment intent").await
    }

    async fn update_seat_status(
        &self,
        update: &SeatStatusUpdate,
    ) -> Result<serde_json::Value, BackendError> {
        let call = self
            .client
            .patch(self.url("bus/update-seat-status"))
            .json(update);
        self.send(call, "seat status").await
    }

    async fn generate_tickets(
        &self,
        batch: &TicketBatch,
    ) -> Result<serde_json::Value, BackendError> {
        let call = self.client.post(self.url("ticket/generate")).json(batch);
        self.send(call, "ticket generation").await
    }
}
