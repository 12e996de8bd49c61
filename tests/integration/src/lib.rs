//! Integration test utilities for the hackboard real-time layer
//!
//! Builds the registry/broadcaster/gate graph in-process and attaches test
//! connections whose sockets are plain mpsc receivers.

pub mod helpers;

pub use helpers::*;
