//! Presentation-neutral styled text.
//!
//! Renderers produce [`StyledLine`]s; the TUI maps them onto terminal styles and
//! text mode flattens them with [`StyledLine::plain_text`].

/// Card accent colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Blue,
    Cyan,
    Indigo,
    Purple,
    Green,
    Emerald,
    Pink,
    Teal,
    Yellow,
    Orange,
    Rose,
    Red,
    Lime,
    Amber,
    Fuchsia,
    Sky,
    Gray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStyle {
    Plain,
    /// Section titles ("Meta Review", "Agent Reactions").
    Title,
    Heading,
    Label,
    Muted,
    Strong,
    Emphasis,
    Strike,
    Code,
    Link,
    Error,
    Accent(Tone),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub style: SpanStyle,
}

impl StyledSpan {
    pub fn new(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, SpanStyle::Plain)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledLine {
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::styled(text, SpanStyle::Plain)
    }

    pub fn styled(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            spans: vec![StyledSpan::new(text, style)],
        }
    }

    pub fn with(mut self, text: impl Into<String>, style: SpanStyle) -> Self {
        self.spans.push(StyledSpan::new(text, style));
        self
    }

    pub fn is_blank(&self) -> bool {
        self.spans.iter().all(|s| s.text.trim().is_empty())
    }

    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }
}

impl From<Vec<StyledSpan>> for StyledLine {
    fn from(spans: Vec<StyledSpan>) -> Self {
        Self { spans }
    }
}

/// Push `line` unless it would make a second blank line in a row.
pub(crate) fn push_separated(out: &mut Vec<StyledLine>, line: StyledLine) {
    if line.is_blank() && out.last().map_or(true, StyledLine::is_blank) {
        return;
    }
    out.push(line);
}
