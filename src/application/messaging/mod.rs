//! Message handling - Turns raw platform events into structured messages

pub mod parser;

pub use parser::MessageParser;
