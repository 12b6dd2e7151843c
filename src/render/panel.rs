//! Projection of a [`PanelResult`] into a display representation.

use super::markdown::render_markdown;
use super::meta::{render_structured, MetaReviewContent, MetaReviewDecoder};
use super::personality::{known_style, FALLBACK_STYLE};
use super::styled::{push_separated, SpanStyle, StyledLine, Tone};
use crate::model::{PanelResult, Reaction};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Nesting depth after which structured dumps are elided.
    pub max_depth: usize,
    pub report_parse_failures: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            max_depth: 8,
            report_parse_failures: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetaReviewPanel {
    pub content: MetaReviewContent,
    pub body: Vec<StyledLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionCard {
    pub personality_id: String,
    pub icon: &'static str,
    pub tone: Tone,
    /// False when the id is not one of the known personalities.
    pub known: bool,
    pub text: String,
}

impl ReactionCard {
    fn new(reaction: &Reaction) -> Self {
        let (style, known) = match known_style(&reaction.personality_id) {
            Some(style) => (style, true),
            None => (FALLBACK_STYLE, false),
        };
        Self {
            personality_id: reaction.personality_id.clone(),
            icon: style.icon,
            tone: style.tone,
            known,
            text: reaction.reaction_text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub meta_review: Option<MetaReviewPanel>,
    /// One card per distinct personality id; a repeated id replaces the earlier card.
    pub cards: Vec<ReactionCard>,
    /// `"<personality_id>: <message>"` entries.
    pub errors: Vec<String>,
}

impl PanelView {
    pub fn project(result: &PanelResult, options: &RenderOptions) -> Self {
        let decoder = MetaReviewDecoder::new(options.report_parse_failures);
        let meta_review = decoder
            .decode(result.meta_review.as_deref())
            .map(|content| {
                let body = match &content {
                    MetaReviewContent::Structured(_) => {
                        render_structured(&content, options.max_depth)
                    }
                    MetaReviewContent::Narrative(source) => render_markdown(source),
                };
                MetaReviewPanel { content, body }
            });

        let mut cards: Vec<ReactionCard> = Vec::with_capacity(result.reactions.len());
        for reaction in &result.reactions {
            let card = ReactionCard::new(reaction);
            match cards
                .iter_mut()
                .find(|c| c.personality_id == card.personality_id)
            {
                Some(slot) => {
                    debug!(
                        personality = %card.personality_id,
                        "duplicate reaction id; keeping the last one"
                    );
                    *slot = card;
                }
                None => cards.push(card),
            }
        }

        let errors: Vec<String> = result
            .per_item_errors
            .iter()
            .map(|e| format!("{}: {}", e.personality_id, e.message))
            .collect();
        if !errors.is_empty() {
            debug!(count = errors.len(), "response carried per-item errors");
        }

        Self {
            meta_review,
            cards,
            errors,
        }
    }

    /// Flatten the whole panel into display lines, top to bottom.
    pub fn lines(&self) -> Vec<StyledLine> {
        let mut out = Vec::new();

        if let Some(meta) = &self.meta_review {
            let mode = if meta.content.is_structured() {
                "structured"
            } else {
                "narrative"
            };
            out.push(
                StyledLine::styled("🧭 Meta Review", SpanStyle::Title)
                    .with(format!("  ({mode})"), SpanStyle::Muted),
            );
            out.push(StyledLine::blank());
            out.extend(meta.body.iter().cloned());
            push_separated(&mut out, StyledLine::blank());
        }

        out.push(StyledLine::styled("Agent Reactions", SpanStyle::Title));
        out.push(StyledLine::blank());
        if self.cards.is_empty() {
            out.push(StyledLine::styled("No reactions returned.", SpanStyle::Muted));
            out.push(StyledLine::blank());
        }
        for card in &self.cards {
            out.push(
                StyledLine::styled(format!("{} ", card.icon), SpanStyle::Accent(card.tone))
                    .with(card.personality_id.clone(), SpanStyle::Accent(card.tone)),
            );
            for line in card.text.lines() {
                out.push(StyledLine::plain(format!("  {line}")));
            }
            push_separated(&mut out, StyledLine::blank());
        }

        if !self.errors.is_empty() {
            out.push(StyledLine::styled("Errors", SpanStyle::Title));
            for entry in &self.errors {
                out.push(
                    StyledLine::styled("  • ", SpanStyle::Muted)
                        .with(entry.clone(), SpanStyle::Error),
                );
            }
        }

        while out.last().is_some_and(StyledLine::is_blank) {
            out.pop();
        }
        out
    }
}
