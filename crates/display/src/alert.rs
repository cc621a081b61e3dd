//! Text alert content: title, markdown body and actions.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use display_markdown::{parse_markdown, MarkdownAttributes, RunStyle, StyledText, TextAlignment};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::geometry::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Semibold,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Font {
    pub weight: FontWeight,
    pub size: f32,
}

impl Font {
    pub fn regular(size: f32) -> Self {
        Self {
            weight: FontWeight::Regular,
            size,
        }
    }

    pub fn semibold(size: f32) -> Self {
        Self {
            weight: FontWeight::Semibold,
            size,
        }
    }

    pub fn bold(size: f32) -> Self {
        Self {
            weight: FontWeight::Bold,
            size,
        }
    }
}

/// Attributes attached to every run of alert text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextAttributes {
    pub font: Font,
    pub color: Color,
}

impl TextAttributes {
    pub fn new(font: Font, color: Color) -> Self {
        Self { font, color }
    }
}

pub type AlertText = StyledText<TextAttributes>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertTheme {
    pub primary_color: Color,
    pub accent_color: Color,
    pub destructive_color: Color,
    pub disabled_color: Color,
    pub base_font_size: f32,
}

impl Default for AlertTheme {
    fn default() -> Self {
        Self {
            primary_color: Color::BLACK,
            accent_color: Color::from_rgb(0, 122, 255),
            destructive_color: Color::from_rgb(255, 59, 48),
            disabled_color: Color::from_rgb(142, 142, 147),
            base_font_size: 17.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlertActionType {
    Generic,
    Default,
    Destructive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextAlertContentActionLayout {
    #[default]
    Horizontal,
    Vertical,
}

type ActionFn = dyn Fn() + Send + Sync;

#[derive(Clone)]
pub struct TextAlertAction {
    pub kind: TextAlertActionType,
    pub title: String,
    action: Arc<ActionFn>,
}

impl TextAlertAction {
    pub fn new(
        kind: TextAlertActionType,
        title: impl Into<String>,
        action: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            action: Arc::new(action),
        }
    }

    pub fn perform(&self) {
        (self.action)();
    }
}

impl fmt::Debug for TextAlertAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextAlertAction")
            .field("kind", &self.kind)
            .field("title", &self.title)
            .finish()
    }
}

/// How an action's title is drawn.
pub fn action_title_style(
    kind: TextAlertActionType,
    enabled: bool,
    theme: &AlertTheme,
) -> TextAttributes {
    let color = match (kind, enabled) {
        (_, false) => theme.disabled_color,
        (TextAlertActionType::Destructive, true) => theme.destructive_color,
        (TextAlertActionType::Default | TextAlertActionType::Generic, true) => theme.accent_color,
    };

    let font = match kind {
        TextAlertActionType::Default => Font::semibold(theme.base_font_size),
        TextAlertActionType::Destructive | TextAlertActionType::Generic => {
            Font::regular(theme.base_font_size)
        }
    };

    TextAttributes::new(font, color)
}

type DismissFn = dyn Fn() + Send + Sync;

#[derive(Default)]
struct Dismissal {
    dismissed: AtomicBool,
    handler: Mutex<Option<Box<DismissFn>>>,
}

impl Dismissal {
    fn dismiss(&self) {
        if self.dismissed.swap(true, Ordering::AcqRel) {
            return;
        }

        match self.handler.lock() {
            Ok(handler) => {
                if let Some(handler) = handler.as_ref() {
                    handler();
                }
            }
            Err(e) => tracing::error!("alert dismiss handler poisoned: {e}"),
        }
    }
}

/// A text alert ready to be presented.
pub struct TextAlert {
    pub title: Option<AlertText>,
    pub text: AlertText,
    pub actions: Vec<TextAlertAction>,
    pub action_layout: TextAlertContentActionLayout,
    pub allow_input_inset: bool,
    dismissal: Arc<Dismissal>,
}

impl TextAlert {
    /// Called once, the first time the alert is dismissed.
    pub fn set_dismiss_handler(&self, handler: impl Fn() + Send + Sync + 'static) {
        match self.dismissal.handler.lock() {
            Ok(mut slot) => *slot = Some(Box::new(handler)),
            Err(e) => tracing::error!("alert dismiss handler poisoned: {e}"),
        }
    }

    pub fn dismiss(&self) {
        self.dismissal.dismiss();
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissal.dismissed.load(Ordering::Acquire)
    }

    /// Press the action at `index`. Returns false if there is none.
    pub fn perform(&self, index: usize) -> bool {
        let Some(action) = self.actions.get(index) else {
            return false;
        };
        action.perform();
        true
    }
}

/// Body text size relative to the theme's base size.
fn secondary_font_size(theme: &AlertTheme) -> f32 {
    theme.base_font_size * 13.0 / 17.0
}

/// The standard alert: optional title, body text and actions that dismiss
/// the alert before running their own handler.
///
/// With `parse_markdown` the body may use `**bold**` and `[text](link)`; links
/// are drawn like body text.
pub fn standard_text_alert(
    theme: &AlertTheme,
    title: Option<&str>,
    text: &str,
    actions: Vec<TextAlertAction>,
    action_layout: TextAlertContentActionLayout,
    allow_input_inset: bool,
    parse_markdown_text: bool,
) -> TextAlert {
    let has_title = title.is_some();

    let text = if parse_markdown_text {
        let size = secondary_font_size(theme);
        let (font, bold_font) = if has_title {
            (Font::regular(size.floor()), Font::semibold(size.floor()))
        } else {
            (Font::semibold(size), Font::bold(size))
        };

        let body = TextAttributes::new(font, theme.primary_color);
        let bold = TextAttributes::new(bold_font, theme.primary_color);
        let attributes =
            MarkdownAttributes::new(body, bold, body).with_alignment(TextAlignment::Center);
        parse_markdown(text, &attributes)
    } else {
        let font = if has_title {
            Font::regular(secondary_font_size(theme).floor())
        } else {
            Font::semibold(theme.base_font_size)
        };
        plain_text(text, TextAttributes::new(font, theme.primary_color))
    };

    let title = title.map(|title| {
        plain_text(
            title,
            TextAttributes::new(Font::semibold(theme.base_font_size), theme.primary_color),
        )
    });

    let dismissal = Arc::new(Dismissal::default());
    let actions = actions
        .into_iter()
        .map(|action| {
            let dismissal = dismissal.clone();
            let inner = action.clone();
            TextAlertAction::new(action.kind, action.title, move || {
                dismissal.dismiss();
                inner.perform();
            })
        })
        .collect();

    TextAlert {
        title,
        text,
        actions,
        action_layout,
        allow_input_inset,
        dismissal,
    }
}

fn plain_text(text: &str, attributes: TextAttributes) -> AlertText {
    let mut styled = StyledText::new(TextAlignment::Natural);
    styled.push(text, RunStyle::Body, attributes);
    styled
}

static MULTIPLE_LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(([\n\r]\s*){2,})+").unwrap());

/// Collapse every run of two or more line breaks (and the whitespace between
/// them) into exactly one blank line.
pub fn fold_multiple_line_breaks(text: &str) -> String {
    MULTIPLE_LINE_BREAKS.replace_all(text, "\n\n").into_owned()
}
