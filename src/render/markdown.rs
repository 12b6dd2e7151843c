//! Narrative meta review rendering.
//!
//! Markdown is parsed with pulldown-cmark (tables and strikethrough on) and
//! flattened into styled lines. Raw HTML is shown as literal text.

use super::styled::{push_separated, SpanStyle, StyledLine, StyledSpan};
use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const TABLE_MAX_COL_WIDTH: usize = 40;
const RULE_WIDTH: usize = 24;

pub fn render_markdown(source: &str) -> Vec<StyledLine> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut writer = NarrativeWriter::default();
    for event in Parser::new_ext(source, options) {
        writer.event(event);
    }
    writer.finish()
}

#[derive(Default)]
struct NarrativeWriter {
    lines: Vec<StyledLine>,
    current: Vec<StyledSpan>,
    styles: Vec<SpanStyle>,
    quote_depth: usize,
    // One entry per open list: next ordinal for ordered lists.
    lists: Vec<Option<u64>>,
    pending_marker: Option<String>,
    in_code_block: bool,
    links: Vec<String>,
    table: Option<TableBuilder>,
}

impl NarrativeWriter {
    fn event(&mut self, event: Event<'_>) {
        if let Some(table) = self.table.as_mut() {
            match event {
                Event::End(TagEnd::Table) => {
                    let table = self.table.take().unwrap_or_default();
                    self.flush();
                    for line in table.render() {
                        self.push_line(line);
                    }
                    self.separate();
                }
                other => table.event(other),
            }
            return;
        }

        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    for line in text.lines() {
                        self.current
                            .push(StyledSpan::new(format!("  {line}"), SpanStyle::Code));
                        self.flush();
                    }
                } else {
                    let style = self.style();
                    self.current.push(StyledSpan::new(text.to_string(), style));
                }
            }
            Event::Code(code) => self
                .current
                .push(StyledSpan::new(code.to_string(), SpanStyle::Code)),
            Event::InlineMath(math) | Event::DisplayMath(math) => self
                .current
                .push(StyledSpan::new(math.to_string(), SpanStyle::Code)),
            // Untrusted source: HTML is displayed, never interpreted.
            Event::Html(html) => {
                for line in html.lines() {
                    self.current.push(StyledSpan::plain(line.to_string()));
                    self.flush();
                }
            }
            Event::InlineHtml(html) => self.current.push(StyledSpan::plain(html.to_string())),
            Event::FootnoteReference(label) => self
                .current
                .push(StyledSpan::new(format!("[^{label}]"), SpanStyle::Muted)),
            Event::SoftBreak => self.current.push(StyledSpan::plain(" ")),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.push_line(StyledLine::styled("─".repeat(RULE_WIDTH), SpanStyle::Muted));
                self.separate();
            }
            Event::TaskListMarker(checked) => self.current.push(StyledSpan::new(
                if checked { "[x] " } else { "[ ] " },
                SpanStyle::Muted,
            )),
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.flush(),
            Tag::Heading { .. } => {
                self.flush();
                self.styles.push(SpanStyle::Heading);
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        self.push_line(StyledLine::styled(format!("  [{lang}]"), SpanStyle::Muted));
                    }
                }
                self.in_code_block = true;
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.pending_marker = Some(marker);
            }
            Tag::Emphasis => self.styles.push(SpanStyle::Emphasis),
            Tag::Strong => self.styles.push(SpanStyle::Strong),
            Tag::Strikethrough => self.styles.push(SpanStyle::Strike),
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.styles.push(SpanStyle::Link);
                self.links.push(dest_url.to_string());
            }
            Tag::Table(alignments) => {
                self.flush();
                self.table = Some(TableBuilder::new(alignments));
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                if self.lists.is_empty() {
                    self.separate();
                }
            }
            TagEnd::Heading(_) => {
                self.flush();
                self.styles.pop();
                self.separate();
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.separate();
            }
            TagEnd::CodeBlock => {
                self.flush();
                self.in_code_block = false;
                self.separate();
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.separate();
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.styles.pop();
            }
            TagEnd::Link | TagEnd::Image => {
                self.styles.pop();
                if let Some(dest) = self.links.pop() {
                    let shown = self.current.last().is_some_and(|s| s.text == dest);
                    if !dest.is_empty() && !shown {
                        self.current
                            .push(StyledSpan::new(format!(" ({dest})"), SpanStyle::Muted));
                    }
                }
            }
            _ => {}
        }
    }

    fn style(&self) -> SpanStyle {
        self.styles.last().copied().unwrap_or(SpanStyle::Plain)
    }

    fn prefix(&mut self) -> Vec<StyledSpan> {
        let mut spans = Vec::new();
        if self.quote_depth > 0 {
            spans.push(StyledSpan::new("│ ".repeat(self.quote_depth), SpanStyle::Muted));
        }
        if !self.lists.is_empty() {
            let indent = "  ".repeat(self.lists.len() - 1);
            match self.pending_marker.take() {
                Some(marker) => {
                    spans.push(StyledSpan::new(format!("{indent}{marker}"), SpanStyle::Muted))
                }
                None => spans.push(StyledSpan::plain(format!("{indent}  "))),
            }
        }
        spans
    }

    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let mut spans = self.prefix();
        spans.append(&mut self.current);
        self.lines.push(StyledLine::from(spans));
    }

    fn push_line(&mut self, line: StyledLine) {
        let mut spans = self.prefix();
        spans.extend(line.spans);
        self.lines.push(StyledLine::from(spans));
    }

    fn separate(&mut self) {
        push_separated(&mut self.lines, StyledLine::blank());
    }

    fn finish(mut self) -> Vec<StyledLine> {
        self.flush();
        while self.lines.last().is_some_and(StyledLine::is_blank) {
            self.lines.pop();
        }
        self.lines
    }
}

#[derive(Default)]
struct TableBuilder {
    alignments: Vec<Alignment>,
    header: Option<Vec<String>>,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: String,
}

impl TableBuilder {
    fn new(alignments: Vec<Alignment>) -> Self {
        Self {
            alignments,
            ..Default::default()
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::TableCell) => self.cell.clear(),
            Event::End(TagEnd::TableCell) => self.row.push(self.cell.trim().to_string()),
            Event::End(TagEnd::TableHead) => self.header = Some(std::mem::take(&mut self.row)),
            Event::End(TagEnd::TableRow) => self.rows.push(std::mem::take(&mut self.row)),
            Event::Text(t) | Event::Code(t) | Event::InlineHtml(t) => self.cell.push_str(&t),
            Event::SoftBreak | Event::HardBreak => self.cell.push(' '),
            _ => {}
        }
    }

    fn render(self) -> Vec<StyledLine> {
        let cols = self
            .header
            .iter()
            .chain(self.rows.iter())
            .map(Vec::len)
            .max()
            .unwrap_or(0);
        if cols == 0 {
            return Vec::new();
        }

        let mut widths = vec![1usize; cols];
        for row in self.header.iter().chain(self.rows.iter()) {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.width().min(TABLE_MAX_COL_WIDTH));
            }
        }

        let border = |left: char, mid: char, right: char, fill: char| {
            let mut s = String::new();
            s.push(left);
            for (i, w) in widths.iter().enumerate() {
                s.extend(std::iter::repeat(fill).take(w + 2));
                s.push(if i + 1 < cols { mid } else { right });
            }
            StyledLine::styled(s, SpanStyle::Muted)
        };

        let row_line = |row: &[String], style: SpanStyle| {
            let mut line = StyledLine::styled("│", SpanStyle::Muted);
            for (i, width) in widths.iter().enumerate() {
                let cell = row.get(i).map(String::as_str).unwrap_or("");
                let align = self.alignments.get(i).copied().unwrap_or(Alignment::None);
                line = line
                    .with(format!(" {} ", pad_cell(cell, *width, align)), style)
                    .with("│", SpanStyle::Muted);
            }
            line
        };

        let mut out = vec![border('┌', '┬', '┐', '─')];
        if let Some(header) = &self.header {
            out.push(row_line(header, SpanStyle::Strong));
            out.push(border('╞', '╪', '╡', '═'));
        }
        for row in &self.rows {
            out.push(row_line(row, SpanStyle::Plain));
        }
        out.push(border('└', '┴', '┘', '─'));
        out
    }
}

fn pad_cell(cell: &str, width: usize, align: Alignment) -> String {
    let cell = truncate_to(cell, width);
    let pad = width.saturating_sub(cell.width());
    match align {
        Alignment::Right => format!("{}{cell}", " ".repeat(pad)),
        Alignment::Center => {
            let left = pad / 2;
            format!("{}{cell}{}", " ".repeat(left), " ".repeat(pad - left))
        }
        Alignment::Left | Alignment::None => format!("{cell}{}", " ".repeat(pad)),
    }
}

fn truncate_to(s: &str, width: usize) -> String {
    if s.width() <= width {
        return s.to_string();
    }
    let target = width.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > target {
            break;
        }
        used += w;
        out.push(ch);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(source: &str) -> Vec<String> {
        render_markdown(source)
            .iter()
            .map(StyledLine::plain_text)
            .collect()
    }

    #[test]
    fn test_plain_text_is_verbatim() {
        assert_eq!(plain("{not valid json"), ["{not valid json"]);
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let lines = render_markdown("## Consensus\n\nAgents agree.\nMostly.");
        let text: Vec<String> = lines.iter().map(StyledLine::plain_text).collect();
        assert_eq!(text, ["Consensus", "", "Agents agree. Mostly."]);
        assert_eq!(lines[0].spans[0].style, SpanStyle::Heading);
    }

    #[test]
    fn test_lists_nest_and_number() {
        let text = plain("1. first\n2. second\n   - inner\n\nafter");
        assert_eq!(text, ["1. first", "2. second", "  • inner", "", "after"]);
    }

    #[test]
    fn test_emphasis_styles() {
        let lines = render_markdown("a **bold** and *soft* ~~gone~~");
        let styles: Vec<_> = lines[0].spans.iter().map(|s| s.style).collect();
        assert!(styles.contains(&SpanStyle::Strong));
        assert!(styles.contains(&SpanStyle::Emphasis));
        assert!(styles.contains(&SpanStyle::Strike));
    }

    #[test]
    fn test_html_is_literal() {
        let text = plain("<script>alert(1)</script>\n\nok <b>x</b>");
        assert_eq!(text[0], "<script>alert(1)</script>");
        assert!(text.iter().any(|l| l == "ok <b>x</b>"));
    }

    #[test]
    fn test_links_show_destination() {
        let text = plain("see [docs](https://example.com/a)");
        assert_eq!(text, ["see docs (https://example.com/a)"]);
        let text = plain("<https://example.com/b>");
        assert_eq!(text, ["https://example.com/b"]);
    }

    #[test]
    fn test_code_block_lines_are_kept() {
        let text = plain("```rust\nlet a = 1;\nlet b = 2;\n```");
        assert_eq!(text, ["  [rust]", "  let a = 1;", "  let b = 2;"]);
    }

    #[test]
    fn test_table_renders_grid() {
        let text = plain("| Area | Risk |\n|:-----|-----:|\n| Trust | high |\n| Economy | low |");
        assert_eq!(
            text,
            [
                "┌─────────┬──────┐",
                "│ Area    │ Risk │",
                "╞═════════╪══════╡",
                "│ Trust   │ high │",
                "│ Economy │  low │",
                "└─────────┴──────┘",
            ]
        );
    }

    #[test]
    fn test_blockquote_is_prefixed() {
        let text = plain("> careful now");
        assert_eq!(text, ["│ careful now"]);
    }

    #[test]
    fn test_truncate_long_cells() {
        assert_eq!(truncate_to("abcdef", 4), "abc…");
        assert_eq!(truncate_to("abc", 4), "abc");
    }
}
