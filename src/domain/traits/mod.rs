//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod session;
pub mod payment;

pub use bot::{Bot, BotInfo, KeyboardButton};
pub use session::SessionStore;
pub use payment::PaymentChecker;
