//! Caller-supplied styling for each kind of run.

use crate::element::{LinkAttribute, TextAlignment};

type LinkAttributeFn = dyn Fn(&str) -> Option<LinkAttribute> + Send + Sync;

/// Attributes applied to body, bold and link runs.
///
/// `S` is whatever the renderer wants to attach to a run (fonts, colors, ...).
/// The parser only clones it onto the runs it produces.
pub struct MarkdownAttributes<S> {
    pub body: S,
    pub bold: S,
    pub link: S,
    pub alignment: TextAlignment,
    link_attribute: Option<Box<LinkAttributeFn>>,
}

impl<S> MarkdownAttributes<S> {
    pub fn new(body: S, bold: S, link: S) -> Self {
        Self {
            body,
            bold,
            link,
            alignment: TextAlignment::Natural,
            link_attribute: None,
        }
    }

    pub fn with_alignment(mut self, alignment: TextAlignment) -> Self {
        self.alignment = alignment;
        self
    }

    /// Maps link contents to an extra attribute on the link run.
    pub fn with_link_attribute(
        mut self,
        resolve: impl Fn(&str) -> Option<LinkAttribute> + Send + Sync + 'static,
    ) -> Self {
        self.link_attribute = Some(Box::new(resolve));
        self
    }

    pub(crate) fn resolve_link(&self, contents: &str) -> Option<LinkAttribute> {
        self.link_attribute
            .as_ref()
            .and_then(|resolve| resolve(contents))
    }
}

impl MarkdownAttributes<()> {
    /// No attributes at all; only the run styles matter.
    pub fn plain() -> Self {
        Self::new((), (), ())
    }
}

impl<S: Clone> MarkdownAttributes<S> {
    /// Same attributes for every style.
    pub fn uniform(attributes: S) -> Self {
        Self::new(attributes.clone(), attributes.clone(), attributes)
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for MarkdownAttributes<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkdownAttributes")
            .field("body", &self.body)
            .field("bold", &self.bold)
            .field("link", &self.link)
            .field("alignment", &self.alignment)
            .field("link_attribute", &self.link_attribute.is_some())
            .finish()
    }
}
