//! Inline markdown for short UI text.
//!
//! Understands `**bold**`, `[text](contents)` and backslash escapes, and
//! turns them into styled runs a text renderer can attribute.

mod attributes;
mod element;
mod escape;
mod inline;

pub use attributes::MarkdownAttributes;
pub use element::{LinkAttribute, RunStyle, StyledRun, StyledText, TextAlignment};
pub use escape::{escaped_plaintext_for_markdown, is_control_character, CONTROL_CHARACTERS};
pub use inline::parse_markdown;
