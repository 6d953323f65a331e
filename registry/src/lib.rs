pub mod errors;
pub mod events;
pub mod manager;

pub use errors::RegistryError;
pub use events::RegistryEvent;
pub use manager::{StatusCounts, UserRegistry};
