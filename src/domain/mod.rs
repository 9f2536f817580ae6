//! Domain layer - Core business logic with no external dependencies
//!
//! This layer contains:
//! - Entities: Core business objects (User, Message, UserSession)
//! - Traits: Abstractions for infrastructure (Bot, SessionStore, PaymentChecker)

pub mod entities;
pub mod traits;
