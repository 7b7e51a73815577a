//! Booking persistence: data model, abstract store traits, and an in-memory
//! reference store.
//!
//! The engine treats persistence as an external collaborator; everything it
//! needs is expressed through [`store::BookingStore`] and
//! [`store::RoomDirectory`]. [`memory::MemoryStore`] implements both and
//! backs the workspace tests.

pub mod error;
pub mod memory;
pub mod model;
pub mod store;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use store::{BookingStore, RoomDirectory};
