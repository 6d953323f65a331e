use corelib::{UserId, UserStatus};

/// Change notification published after every registry mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// The whole collection was swapped for `count` fresh users.
    Replaced { count: usize },
    /// The collection was emptied.
    Cleared,
    StatusChanged { id: UserId, status: UserStatus },
    /// Every user was put back to `ready`.
    StatusesReset,
}
