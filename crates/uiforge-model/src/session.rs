//! Chat session state.

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

/// One piece of a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    /// Base64-encoded inline image
    Image { mime_type: String, data: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Role::User,
            parts,
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::Text(text.into())],
        }
    }

    /// Concatenated text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|part| match part {
                Part::Text(text) => Some(text.as_str()),
                Part::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Conversation history for iterative refinement.
///
/// Follow-up prompts are sent with every earlier turn, so "make the header
/// blue" refers to the last generated component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSession {
    system_instruction: String,
    turns: Vec<Turn>,
}

impl ChatSession {
    pub fn new(system_instruction: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            turns: Vec::new(),
        }
    }

    pub fn system_instruction(&self) -> &str {
        &self.system_instruction
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Record a completed exchange.
    pub fn record(&mut self, user: Turn, reply: Turn) {
        self.turns.push(user);
        self.turns.push(reply);
    }

    /// Forget all turns. The system instruction is kept.
    pub fn reset(&mut self) {
        self.turns.clear();
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(crate::prompt::SYSTEM_INSTRUCTION)
    }
}
