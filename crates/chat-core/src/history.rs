//! Projected history shapes consumed by vendor adapters.

use serde::{Deserialize, Serialize};

/// A single text fragment inside a parts-structured message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPart {
    pub text: String,
}

/// One history entry projected into a target vendor's vocabulary.
///
/// Most vendors consume flat `{role, content}` pairs; Gemini consumes
/// `{role, parts: [{text}]}`. The untagged representation serializes each
/// variant directly into its wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProjectedMessage {
    Flat { role: String, content: String },
    Parts { role: String, parts: Vec<TextPart> },
}

impl ProjectedMessage {
    /// A flat `{role, content}` entry.
    pub fn flat(role: impl Into<String>, content: impl Into<String>) -> Self {
        ProjectedMessage::Flat {
            role: role.into(),
            content: content.into(),
        }
    }

    /// A `{role, parts}` entry wrapping the content in a single text part.
    pub fn parts(role: impl Into<String>, content: impl Into<String>) -> Self {
        ProjectedMessage::Parts {
            role: role.into(),
            parts: vec![TextPart {
                text: content.into(),
            }],
        }
    }

    /// The wire role string.
    pub fn role(&self) -> &str {
        match self {
            ProjectedMessage::Flat { role, .. } => role,
            ProjectedMessage::Parts { role, .. } => role,
        }
    }

    /// The text body, joining parts when there are several.
    pub fn text(&self) -> String {
        match self {
            ProjectedMessage::Flat { content, .. } => content.clone(),
            ProjectedMessage::Parts { parts, .. } => parts
                .iter()
                .map(|part| part.text.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_entry_serializes_to_role_content_pair() {
        let entry = ProjectedMessage::flat("user", "hello");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "hello"}));
    }

    #[test]
    fn parts_entry_serializes_to_gemini_shape() {
        let entry = ProjectedMessage::parts("model", "hi there");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"role": "model", "parts": [{"text": "hi there"}]})
        );
    }

    #[test]
    fn accessors_read_both_shapes() {
        let flat = ProjectedMessage::flat("assistant", "a");
        assert_eq!(flat.role(), "assistant");
        assert_eq!(flat.text(), "a");

        let parts = ProjectedMessage::parts("model", "b");
        assert_eq!(parts.role(), "model");
        assert_eq!(parts.text(), "b");
    }
}
