use corelib::UserId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("user not found: {0}")]
    UnknownUser(UserId),

    #[error("duplicate user id: {0}")]
    DuplicateId(UserId),
}
