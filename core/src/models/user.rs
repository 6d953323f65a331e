use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Opaque user identifier as issued by the coupon service.
pub type UserId = String;

/// Per-user progress marker during a test run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Ready,
    Testing,
    Success,
    Failed,
}

impl UserStatus {
    pub const ALL: [UserStatus; 4] = [
        UserStatus::Ready,
        UserStatus::Testing,
        UserStatus::Success,
        UserStatus::Failed,
    ];

    /// True once the user's claim has settled one way or the other.
    pub fn is_settled(&self) -> bool {
        matches!(self, UserStatus::Success | UserStatus::Failed)
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserStatus::Ready => "ready",
            UserStatus::Testing => "testing",
            UserStatus::Success => "success",
            UserStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ready" => Ok(UserStatus::Ready),
            "testing" => Ok(UserStatus::Testing),
            "success" => Ok(UserStatus::Success),
            "failed" => Ok(UserStatus::Failed),
            other => Err(format!("invalid user status: {other}")),
        }
    }
}

/// A synthetic user. `id` and `name` never change after creation; only
/// `status` moves while a batch is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub status: UserStatus,
}

impl User {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: UserStatus::Ready,
        }
    }

    /// First `n` characters of the id, used for compact listings.
    pub fn short_id(&self, n: usize) -> &str {
        match self.id.char_indices().nth(n) {
            Some((idx, _)) => &self.id[..idx],
            None => &self.id,
        }
    }
}
