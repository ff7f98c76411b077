use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use taptravel_catalog::TripSource;
use taptravel_shared::{BackendError, Gender, Masked};

/// Body of `POST /payment/create-payment-intent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentRequest {
    pub amount: i64,
    pub bus_id: String,
    pub user_id: String,
    pub admin_id: Option<String>,
}

/// Credentials returned for a freshly created intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentSecrets {
    pub client_secret: Masked<String>,
    pub ephemeral_key: Masked<String>,
    pub customer: String,
}

/// One entry of `seatsData` in `PATCH /bus/update-seat-status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatStatus {
    pub seat_number: String,
    pub booked: bool,
    pub email: String,
    pub gender: Gender,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatStatusUpdate {
    pub bus_id: String,
    pub seats_data: Vec<SeatStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRequest {
    pub user_id: String,
    pub bus_id: String,
    pub seat_number: String,
}

/// Body of `POST /ticket/generate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketBatch {
    pub tickets: Vec<TicketRequest>,
}

/// The ticketing backend. Seat state is owned here; the client only ever
/// holds a snapshot.
#[async_trait]
pub trait BookingBackend: TripSource {
    async fn create_payment_intent(
        &self,
        request: &IntentRequest,
    ) -> Result<IntentSecrets, BackendError>;

    /// Commit seats. The backend re-checks availability and neighbor genders.
    async fn update_seat_status(
        &self,
        update: &SeatStatusUpdate,
    ) -> Result<serde_json::Value, BackendError>;

    async fn generate_tickets(
        &self,
        batch: &TicketBatch,
    ) -> Result<serde_json::Value, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shapes() {
        let request = IntentRequest {
            amount: 5000,
            bus_id: "bus-1".to_string(),
            user_id: "rider-1".to_string(),
            admin_id: Some("admin-1".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "amount": 5000, "busId": "bus-1", "userId": "rider-1", "adminId": "admin-1" })
        );

        let update = SeatStatusUpdate {
            bus_id: "bus-1".to_string(),
            seats_data: vec![SeatStatus {
                seat_number: "R1-2".to_string(),
                booked: true,
                email: "rider@example.com".to_string(),
                gender: Gender::Female,
            }],
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({
                "busId": "bus-1",
                "seatsData": [{ "seatNumber": "R1-2", "booked": true, "email": "rider@example.com", "gender": "F" }]
            })
        );
    }

    #[test]
    fn test_intent_secrets_from_backend() {
        let secrets: IntentSecrets = serde_json::from_value(serde_json::json!({
            "clientSecret": "pi_1_secret_x",
            "ephemeralKey": "ek_1",
            "customer": "cus_1"
        }))
        .unwrap();

        assert_eq!(secrets.client_secret.expose(), "pi_1_secret_x");
        assert!(!format!("{:?}", secrets).contains("ek_1"));
    }
}
