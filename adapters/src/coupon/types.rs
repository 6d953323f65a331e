//! Wire shapes of the coupon service.

use corelib::User;
use serde::{Deserialize, Serialize};

/// `POST /users/random` answer.
#[derive(Debug, Deserialize)]
pub struct UsersEnvelope {
    pub data: Vec<WireUser>,
}

#[derive(Debug, Deserialize)]
pub struct WireUser {
    pub id: WireId,
    pub name: String,
}

/// The service has shipped both string and numeric ids.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Signed(i64),
    Unsigned(u64),
}

impl From<WireId> for String {
    fn from(id: WireId) -> Self {
        match id {
            WireId::Text(s) => s,
            WireId::Signed(n) => n.to_string(),
            WireId::Unsigned(n) => n.to_string(),
        }
    }
}

impl From<WireUser> for User {
    fn from(w: WireUser) -> Self {
        User::new(String::from(w.id), w.name)
    }
}

/// `POST /user-coupons` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest<'a> {
    pub user_id: &'a str,
    pub coupon_id: &'a str,
}

/// `{ "error": { "message": "..." } }`
#[derive(Debug, Default, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorEnvelope {
    /// Pulls `error.message` out of a raw body, if the body has that shape.
    pub fn message_from(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .and_then(|e| e.error)
            .and_then(|b| b.message)
    }
}
