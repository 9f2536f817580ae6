//! Domain entities - Core business objects with no external dependencies

pub mod user;
pub mod message;
pub mod session;

pub use user::User;
pub use message::{Message, MessageType, Content};
pub use session::UserSession;
