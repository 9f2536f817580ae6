//! Message parser - Parses raw messages into structured messages

use crate::domain::entities::{Message, Content, MessageType, User};

/// Parses incoming text and callback events into structured Message objects
pub struct MessageParser {
    command_prefix: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    /// Parse a text message
    pub fn parse(&self, chat_id: impl Into<String>, text: impl Into<String>, sender: Option<User>) -> Message {
        let text = text.into();
        let chat_id = chat_id.into();

        if text.starts_with('/') || text.starts_with(&self.command_prefix) {
            return self.parse_command(chat_id, text, sender);
        }

        Message::new(chat_id, Content::Text(text))
            .with_message_type(MessageType::Text)
            .with_sender_opt(sender)
    }

    /// Parse a command message
    fn parse_command(&self, chat_id: String, text: String, sender: Option<User>) -> Message {
        let cmd_text = if text.starts_with('/') {
            text.trim_start_matches('/')
        } else {
            text.trim_start_matches(&self.command_prefix)
        };

        let mut parts = cmd_text.split_whitespace();
        let name = parts.next().unwrap_or_default();
        // Telegram appends "@botname" to commands in groups
        let name = name.split('@').next().unwrap_or(name).to_string();
        let args: Vec<String> = parts.map(|s| s.to_string()).collect();

        Message::new(chat_id, Content::Command { name, args })
            .with_message_type(MessageType::Command)
            .with_sender_opt(sender)
    }

    /// Parse a callback query (inline button press)
    pub fn parse_callback(&self, chat_id: impl Into<String>, data: impl Into<String>, user: User) -> Message {
        Message::new(chat_id, Content::CallbackData(data.into()))
            .with_message_type(MessageType::Callback)
            .with_sender(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_with_args() {
        let parser = MessageParser::new("/");
        let msg = parser.parse("42", "/wallet 0xabc", None);
        assert_eq!(msg.message_type, MessageType::Command);
        assert_eq!(
            msg.content,
            Content::Command {
                name: "wallet".to_string(),
                args: vec!["0xabc".to_string()],
            }
        );
    }

    #[test]
    fn strips_bot_mention_from_group_commands() {
        let parser = MessageParser::new("/");
        let msg = parser.parse("42", "/buy@goodmarket_bot", None);
        assert_eq!(
            msg.content,
            Content::Command {
                name: "buy".to_string(),
                args: vec![],
            }
        );
    }

    #[test]
    fn plain_text_stays_text() {
        let parser = MessageParser::new("/");
        let msg = parser.parse("42", "hello there", None);
        assert_eq!(msg.message_type, MessageType::Text);
        assert_eq!(msg.content.text(), Some("hello there"));
    }

    #[test]
    fn callback_carries_sender() {
        let parser = MessageParser::new("/");
        let user = User::new("7").with_username("alice");
        let msg = parser.parse_callback("42", "check_payment", user);
        assert_eq!(msg.message_type, MessageType::Callback);
        assert_eq!(msg.session_key(), "7");
    }
}
