use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use super::gender::{self, Gender};

/// One seat of a trip as reported by `GET /bus/{tripId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub seat_number: String,
    #[serde(default)]
    pub booked: bool,
    #[serde(default, deserialize_with = "gender::deserialize_optional")]
    pub gender: Option<Gender>,
}

impl Seat {
    pub fn open(seat_number: impl Into<String>) -> Self {
        Self {
            seat_number: seat_number.into(),
            booked: false,
            gender: None,
        }
    }

    pub fn booked(seat_number: impl Into<String>, gender: Option<Gender>) -> Self {
        Self {
            seat_number: seat_number.into(),
            booked: true,
            gender,
        }
    }
}

/// Per-seat fare in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fare {
    pub actual_price: i64,
    #[serde(default)]
    pub service_fee: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusDetails {
    #[serde(default)]
    pub admin_id: Option<String>,
    #[serde(default)]
    pub bus_type: Option<String>,
    #[serde(default)]
    pub bus_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteInfo {
    #[serde(default)]
    pub start_city: String,
    #[serde(default)]
    pub end_city: String,
}

/// A scheduled departure with its seat layout and fare.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub route: Option<RouteInfo>,
    #[serde(default)]
    pub departure_time: Option<String>,
    #[serde(default)]
    pub arrival_time: Option<String>,
    #[serde(default)]
    pub bus_details: Option<BusDetails>,
    pub fare: Fare,
    #[serde(default)]
    pub seats: Vec<Seat>,
}

impl Trip {
    /// Operator account that receives the payment.
    pub fn admin_id(&self) -> Option<&str> {
        self.bus_details.as_ref()?.admin_id.as_deref()
    }

    /// One-line description, e.g. `Lahore → Karachi, departs 9:05 AM, arrives 5:30 PM`.
    pub fn summary(&self) -> String {
        let route = match &self.route {
            Some(route) => format!("{} → {}", route.start_city, route.end_city),
            None => "Unknown route".to_string(),
        };
        format!(
            "{}, departs {}, arrives {}",
            route,
            format_clock(self.departure_time.as_deref()),
            format_clock(self.arrival_time.as_deref()),
        )
    }
}

/// Render a `HH:MM` (or `HH:MM:SS`) time on a 12-hour clock; `N/A` when absent or unreadable.
pub fn format_clock(time: Option<&str>) -> String {
    let Some(raw) = time else {
        return "N/A".to_string();
    };
    let parsed = NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"));
    match parsed {
        Ok(t) => {
            let (pm, hour) = t.hour12();
            format!("{}:{:02} {}", hour, t.minute(), if pm { "PM" } else { "AM" })
        }
        Err(_) => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_from_backend_payload() {
        let payload = serde_json::json!({
            "_id": "bus-42",
            "route": { "startCity": "Lahore", "endCity": "Karachi" },
            "departureTime": "21:05",
            "arrivalTime": "06:30",
            "busDetails": { "adminId": "admin-7", "busType": "Luxury", "busNumber": "LHR-101" },
            "fare": { "actualPrice": 2500, "serviceFee": 100 },
            "seats": [
                { "seatNumber": "R1-1", "booked": true, "gender": "F" },
                { "seatNumber": "R1-2", "booked": false, "gender": null },
                { "seatNumber": "R1-3", "booked": false, "gender": "" },
                { "seatNumber": "R1-4" }
            ]
        });

        let trip: Trip = serde_json::from_value(payload).unwrap();
        assert_eq!(trip.id.as_deref(), Some("bus-42"));
        assert_eq!(trip.admin_id(), Some("admin-7"));
        assert_eq!(trip.fare.actual_price, 2500);
        assert_eq!(trip.seats.len(), 4);
        assert_eq!(trip.seats[0], Seat::booked("R1-1", Some(Gender::Female)));
        assert_eq!(trip.seats[2].gender, None);
        assert!(!trip.seats[3].booked);
        assert_eq!(trip.summary(), "Lahore → Karachi, departs 9:05 PM, arrives 6:30 AM");
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(Some("00:15")), "12:15 AM");
        assert_eq!(format_clock(Some("12:00:00")), "12:00 PM");
        assert_eq!(format_clock(Some("late")), "N/A");
        assert_eq!(format_clock(None), "N/A");
    }
}
