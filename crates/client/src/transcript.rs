use proto::{Message, Role};

use crate::render::{DisplayNode, render};

/// Prompt shown after loading a conversation with no displayable history.
pub const EMPTY_HISTORY_PROMPT: &str = "Chat loaded. Ask me anything.";

/// The visible chat window: rendered messages in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    nodes: Vec<DisplayNode>,
}

impl Transcript {
    /// A transcript showing only the greeting.
    pub fn with_greeting() -> Self {
        Self {
            nodes: vec![DisplayNode::greeting()],
        }
    }

    pub fn nodes(&self) -> &[DisplayNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn last(&self) -> Option<&DisplayNode> {
        self.nodes.last()
    }

    pub fn reset_to_greeting(&mut self) {
        self.nodes = vec![DisplayNode::greeting()];
    }

    /// Replaces everything with a single error node.
    pub fn reset_with_error(&mut self, text: &str) {
        self.nodes = vec![render(Role::Assistant, text, true)];
    }

    /// Appends a rendered message. System messages are dropped.
    pub fn append(&mut self, role: Role, text: &str, is_error: bool) {
        if role.is_displayed() {
            self.nodes.push(render(role, text, is_error));
        }
    }

    /// Replaces the transcript with a loaded history.
    pub fn replace_with_history(&mut self, history: &[Message]) {
        self.nodes = history
            .iter()
            .filter(|m| m.role.is_displayed())
            .map(|m| render(m.role, &m.content, m.is_error && m.role == Role::Assistant))
            .collect();
        if self.nodes.is_empty() {
            self.nodes
                .push(render(Role::Assistant, EMPTY_HISTORY_PROMPT, false));
        }
    }

    /// Whole transcript as HTML, one message `<div>` per node.
    pub fn to_html(&self) -> String {
        self.nodes.iter().map(DisplayNode::to_html).collect()
    }
}
