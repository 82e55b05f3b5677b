//! Simulated document chat.
//!
//! No document is actually read: replies are picked from a fixed set after a
//! short delay so the conversation flow can be exercised end to end.

use std::time::Duration;

use chrono::Local;
use rand::seq::SliceRandom;
use rand::Rng;

/// Time the assistant "types" before replying.
pub const REPLY_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Local wall-clock time, `HH:MM`
    pub timestamp: String,
}

impl Message {
    fn now(role: Role, content: String) -> Self {
        Self {
            role,
            content,
            timestamp: Local::now().format("%H:%M").to_string(),
        }
    }
}

/// The document a conversation is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatDocument {
    pub id: String,
    pub name: String,
}

pub fn greeting(document_name: &str) -> String {
    format!(
        "Hello! I've analyzed \"{}\". Feel free to ask me anything about this document.",
        document_name
    )
}

/// One of the canned replies, chosen at random.
pub fn simulated_reply<R: Rng + ?Sized>(prompt: &str, rng: &mut R) -> String {
    let responses = [
        format!(
            "That's an interesting question about \"{}\". Based on the document analysis, I can provide you with detailed insights.",
            prompt
        ),
        "Let me break that down for you. The key points from the document suggest several important considerations.".to_string(),
        "Great question! According to the information in the document, here are the relevant details you should know.".to_string(),
        "I've searched through the document content. Here's what I found that relates to your query.".to_string(),
    ];
    responses
        .choose(rng)
        .cloned()
        .unwrap_or_default()
}

/// Wait out the typing delay, then produce a reply for `prompt`.
pub async fn reply_after_delay(prompt: String) -> String {
    tokio::time::sleep(REPLY_DELAY).await;
    simulated_reply(&prompt, &mut rand::thread_rng())
}

#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    messages: Vec<Message>,
    document: Option<ChatDocument>,
    typing: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn document(&self) -> Option<&ChatDocument> {
        self.document.as_ref()
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    /// Start a fresh conversation about `document`, opened by the greeting.
    pub fn select_document(&mut self, id: &str, name: &str) {
        self.document = Some(ChatDocument {
            id: id.to_string(),
            name: name.to_string(),
        });
        self.messages = vec![Message::now(Role::Assistant, greeting(name))];
        self.typing = false;
    }

    /// Clear the conversation and the selected document.
    pub fn new_chat(&mut self) {
        self.messages.clear();
        self.document = None;
        self.typing = false;
    }

    /// Append the user's message and mark the assistant as typing. Returns the
    /// prompt to answer, or `None` for blank input.
    pub fn send(&mut self, input: &str) -> Option<String> {
        let content = input.trim();
        if content.is_empty() {
            return None;
        }
        self.messages.push(Message::now(Role::User, content.to_string()));
        self.typing = true;
        Some(content.to_string())
    }

    pub fn receive_reply(&mut self, content: String) {
        self.messages.push(Message::now(Role::Assistant, content));
        self.typing = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_select_document_greets() {
        let mut chat = ChatSession::new();
        chat.select_document("1", "Annual Report 2024.pdf");
        assert_eq!(chat.messages().len(), 1);
        assert_eq!(chat.messages()[0].role, Role::Assistant);
        assert_eq!(
            chat.messages()[0].content,
            "Hello! I've analyzed \"Annual Report 2024.pdf\". Feel free to ask me anything about this document."
        );
        assert_eq!(chat.messages()[0].timestamp.len(), 5);
    }

    #[test]
    fn test_blank_input_ignored() {
        let mut chat = ChatSession::new();
        assert_eq!(chat.send("   "), None);
        assert!(chat.messages().is_empty());
        assert!(!chat.is_typing());
    }

    #[test]
    fn test_send_and_reply() {
        let mut chat = ChatSession::new();
        chat.select_document("1", "Notes.txt");
        let prompt = chat.send("  what is in it? ").unwrap();
        assert_eq!(prompt, "what is in it?");
        assert!(chat.is_typing());

        chat.receive_reply("Answer".to_string());
        assert!(!chat.is_typing());
        let roles: Vec<Role> = chat.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
    }

    #[test]
    fn test_new_chat_clears() {
        let mut chat = ChatSession::new();
        chat.select_document("1", "Notes.txt");
        chat.send("hi");
        chat.new_chat();
        assert!(chat.messages().is_empty());
        assert!(chat.document().is_none());
        assert!(!chat.is_typing());
    }

    #[test]
    fn test_simulated_reply_is_canned() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let reply = simulated_reply("budget", &mut rng);
            assert!(
                reply.contains("\"budget\"")
                    || reply.starts_with("Let me break")
                    || reply.starts_with("Great question!")
                    || reply.starts_with("I've searched")
            );
        }
    }
}
