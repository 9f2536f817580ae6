//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Session: In-memory session store
//! - Payment: On-chain payment verification
//! - Adapters: Platform integrations (Telegram, console)

pub mod config;
pub mod session;
pub mod payment;
pub mod adapters;
