//! Text summary builder for CLI output.
//!
//! Projects a result through the same renderer the TUI uses and flattens it to plain lines.

use crate::model::PanelResult;
use crate::render::{PanelView, RenderOptions, StyledLine};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

pub(crate) fn build_text_summary(result: &PanelResult, options: &RenderOptions) -> TextSummary {
    let view = PanelView::project(result, options);
    TextSummary {
        lines: plain_lines(&result.source_text, &view.lines()),
    }
}

/// News header followed by the rendered panel.
pub(crate) fn plain_lines(source_text: &str, rendered: &[StyledLine]) -> Vec<String> {
    let mut lines = Vec::with_capacity(rendered.len() + 4);
    if !source_text.trim().is_empty() {
        lines.push("News:".to_string());
        lines.extend(source_text.trim().lines().map(|l| format!("  {l}")));
        lines.push(String::new());
    }
    lines.extend(rendered.iter().map(StyledLine::plain_text));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemError, Reaction};

    #[test]
    fn test_summary_lists_news_reactions_and_errors() {
        let result = PanelResult {
            source_text: "Company X raises prices.".to_string(),
            reactions: vec![Reaction {
                personality_id: "ISTJ".to_string(),
                reaction_text: "Check the numbers.".to_string(),
            }],
            meta_review: Some("**Mixed** response.".to_string()),
            per_item_errors: vec![ItemError {
                personality_id: "INTJ".to_string(),
                message: "timeout".to_string(),
            }],
        };
        let summary = build_text_summary(&result, &RenderOptions::default());

        assert_eq!(summary.lines[0], "News:");
        assert_eq!(summary.lines[1], "  Company X raises prices.");
        assert!(summary.lines.contains(&"Mixed response.".to_string()));
        assert!(summary.lines.contains(&"📘 ISTJ".to_string()));
        assert_eq!(summary.lines.last().unwrap(), "  • INTJ: timeout");
    }

    #[test]
    fn test_empty_source_text_has_no_header() {
        let result = PanelResult {
            source_text: String::new(),
            reactions: Vec::new(),
            meta_review: None,
            per_item_errors: Vec::new(),
        };
        let summary = build_text_summary(&result, &RenderOptions::default());
        assert_eq!(summary.lines[0], "Agent Reactions");
    }
}
