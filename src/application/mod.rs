//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Errors: Domain-specific errors
//! - Messaging: Message parsing
//! - Dispatcher: Maps chat events to replies

pub mod errors;
pub mod messaging;
pub mod dispatcher;
