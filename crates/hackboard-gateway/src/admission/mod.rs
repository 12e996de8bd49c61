//! Admission control for connection events
//!
//! Adapts the shared rate limiter to discrete events on a persistent
//! connection.

mod gate;

pub use gate::{AdmissionDenied, AdmissionGate};
