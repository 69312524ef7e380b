//! Bounded conversation memory for multi-turn dialogues.

use crate::types::Message;

/// Ordered message log with an optional system directive and an optional
/// length bound.
///
/// The directive is never stored inside the sequence and never counts toward
/// the bound; it only appears in the [`Memory::context`] view. When the
/// bound is exceeded, the oldest messages are dropped first: plain
/// recency-based truncation with no role-aware retention.
///
/// # Examples
///
/// ```
/// # use switchboard::memory::Memory;
/// let mut memory = Memory::new(Some(2), Some("Be terse.".to_string()));
/// memory.add_user("one");
/// memory.add_assistant("two");
/// memory.add_user("three");
/// assert_eq!(memory.len(), 2);
/// assert_eq!(memory.context().len(), 3); // directive + 2 retained messages
/// ```
#[derive(Debug, Clone, Default)]
pub struct Memory {
    messages: Vec<Message>,
    max_messages: Option<usize>,
    system_prompt: Option<String>,
}

impl Memory {
    pub fn new(max_messages: Option<usize>, system_prompt: Option<String>) -> Self {
        Self {
            messages: Vec::new(),
            max_messages,
            system_prompt,
        }
    }

    /// Appends a user message and returns the created message.
    pub fn add_user(&mut self, content: impl Into<String>) -> Message {
        self.add(Message::user(content))
    }

    /// Appends an assistant message and returns the created message.
    pub fn add_assistant(&mut self, content: impl Into<String>) -> Message {
        self.add(Message::assistant(content))
    }

    /// Appends a system message and returns the created message.
    ///
    /// This is distinct from the directive: a system message lives inside
    /// the sequence and is subject to eviction like any other message.
    pub fn add_system(&mut self, content: impl Into<String>) -> Message {
        self.add(Message::system(content))
    }

    fn add(&mut self, message: Message) -> Message {
        let created = message.clone();
        self.messages.push(message);
        self.enforce_limit();
        created
    }

    fn enforce_limit(&mut self) {
        if let Some(max) = self.max_messages {
            if self.messages.len() > max {
                let excess = self.messages.len() - max;
                self.messages.drain(..excess);
            }
        }
    }

    /// Defensive copy of the current message sequence.
    pub fn messages(&self) -> Vec<Message> {
        self.messages.clone()
    }

    /// Full request context: the directive (if set) as a synthetic leading
    /// system message, followed by the message sequence.
    pub fn context(&self) -> Vec<Message> {
        let mut result = Vec::with_capacity(self.messages.len() + 1);
        if let Some(prompt) = &self.system_prompt {
            result.push(Message::system(prompt.clone()));
        }
        result.extend(self.messages.iter().cloned());
        result
    }

    /// Removes all messages. The directive is retained.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Removes and returns the most recently added message.
    pub fn pop_last(&mut self) -> Option<Message> {
        self.messages.pop()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn set_system_prompt(&mut self, prompt: Option<String>) {
        self.system_prompt = prompt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn bounded_memory_keeps_last_k_in_order() {
        let mut memory = Memory::new(Some(3), None);
        for i in 0..7 {
            memory.add_user(format!("msg-{i}"));
        }
        let retained = memory.messages();
        assert_eq!(retained.len(), 3);
        let contents: Vec<&str> = retained.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["msg-4", "msg-5", "msg-6"]);
    }

    #[test]
    fn eviction_ignores_roles() {
        let mut memory = Memory::new(Some(2), None);
        memory.add_system("pinned?");
        memory.add_user("question");
        memory.add_assistant("answer");
        let roles: Vec<Role> = memory.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
    }

    #[test]
    fn context_places_directive_first_and_outside_the_bound() {
        let mut memory = Memory::new(Some(2), Some("directive".to_string()));
        memory.add_user("a");
        memory.add_assistant("b");
        memory.add_user("c");

        assert_eq!(memory.len(), 2);
        let context = memory.context();
        assert_eq!(context.len(), 3);
        assert_eq!(context[0].role, Role::System);
        assert_eq!(context[0].content, "directive");
        assert_eq!(context[1].content, "b");
        assert_eq!(context[2].content, "c");
    }

    #[test]
    fn context_without_directive_is_just_the_messages() {
        let mut memory = Memory::new(None, None);
        memory.add_user("only");
        assert_eq!(memory.context(), memory.messages());
    }

    #[test]
    fn clear_keeps_directive() {
        let mut memory = Memory::new(None, Some("keep me".to_string()));
        memory.add_user("gone");
        memory.clear();
        assert!(memory.is_empty());
        assert_eq!(memory.system_prompt(), Some("keep me"));
        assert_eq!(memory.context().len(), 1);
    }

    #[test]
    fn pop_last_returns_most_recent_then_none() {
        let mut memory = Memory::new(None, None);
        memory.add_user("first");
        memory.add_assistant("second");
        assert_eq!(memory.pop_last().map(|m| m.content), Some("second".to_string()));
        assert_eq!(memory.pop_last().map(|m| m.content), Some("first".to_string()));
        assert!(memory.pop_last().is_none());
    }

    #[test]
    fn empty_content_is_accepted() {
        let mut memory = Memory::new(None, None);
        let msg = memory.add_user("");
        assert_eq!(msg.content, "");
        assert_eq!(memory.len(), 1);
    }
}
