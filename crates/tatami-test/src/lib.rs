//! Tatami booking engine - integration test support.
//!
//! This crate re-exports the workspace crates so integration tests can use
//! `tatami_test::` paths against the full stack.

#![allow(ambiguous_glob_reexports)]

pub mod component {
    pub use tatami_core::*;
    pub use tatami_service::*;

    pub mod model {
        pub use tatami_store::model::*;
    }

    pub mod store {
        pub use tatami_store::{BookingStore, MemoryStore, RoomDirectory, error};
    }
}

pub use tatami_recur as recur;
