pub mod attendees;
pub mod constants;
pub mod error;
pub mod logger;
pub mod models;
pub mod recurrence;
pub mod roles;
pub mod service;
pub mod storage;

pub use error::ParishError;
pub use logger::in_memory::InMemoryAuditLogger;
pub use service::ParishService;
pub use storage::in_memory::InMemoryStore;

#[cfg(test)]
mod tests; // Include integration tests
