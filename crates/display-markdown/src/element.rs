//! Styled text - the output of parsing.

/// Paragraph alignment carried alongside the parsed runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlignment {
    #[default]
    Natural,
    Left,
    Center,
    Right,
    Justified,
}

/// An attribute attached to link runs by the caller's resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkAttribute {
    pub name: String,
    pub value: String,
}

impl LinkAttribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The style of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStyle {
    /// Unstyled text between constructs
    Body,

    /// `**text**`
    Bold,

    /// `[text](contents)`
    Link {
        contents: String,
        attribute: Option<LinkAttribute>,
    },
}

impl RunStyle {
    pub fn link(contents: impl Into<String>) -> Self {
        RunStyle::Link {
            contents: contents.into(),
            attribute: None,
        }
    }

    pub fn is_body(&self) -> bool {
        matches!(self, RunStyle::Body)
    }
}

/// A piece of text with one style and the caller's attributes for that style.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledRun<S> {
    pub text: String,
    pub style: RunStyle,
    pub attributes: S,
}

/// Ordered styled runs produced by [`crate::parse_markdown`].
#[derive(Debug, Clone, PartialEq)]
pub struct StyledText<S> {
    runs: Vec<StyledRun<S>>,
    alignment: TextAlignment,
}

impl<S> StyledText<S> {
    pub fn new(alignment: TextAlignment) -> Self {
        Self {
            runs: Vec::new(),
            alignment,
        }
    }

    /// Appends a run. Empty text is dropped.
    pub fn push(&mut self, text: impl Into<String>, style: RunStyle, attributes: S) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.runs.push(StyledRun {
            text,
            style,
            attributes,
        });
    }

    pub fn runs(&self) -> &[StyledRun<S>] {
        &self.runs
    }

    pub fn into_runs(self) -> Vec<StyledRun<S>> {
        self.runs
    }

    pub fn alignment(&self) -> TextAlignment {
        self.alignment
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// The text of every run concatenated, ignoring style.
    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|run| run.text.as_str()).collect()
    }

    /// `(text, style)` pairs, handy when the attributes don't matter.
    pub fn spans(&self) -> Vec<(&str, &RunStyle)> {
        self.runs
            .iter()
            .map(|run| (run.text.as_str(), &run.style))
            .collect()
    }
}
