use serde::{Deserialize, Serialize};

/// The signed-in rider, taken from the session token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiderIdentity {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
}
