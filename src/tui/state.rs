use crate::model::{PanelEvent, RunState};
use crate::orchestrator::{Completion, PanelController, Ticket};
use crate::render::{PanelView, RenderOptions, StyledLine};
use tracing::debug;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Panel,
    Help,
}

impl Tab {
    pub fn index(self) -> usize {
        match self {
            Tab::Panel => 0,
            Tab::Help => 1,
        }
    }

    pub fn next(self) -> Self {
        match self {
            Tab::Panel => Tab::Help,
            Tab::Help => Tab::Panel,
        }
    }
}

/// Everything the UI thread draws from. Owned by the UI thread only.
pub struct UiState {
    pub tab: Tab,
    pub controller: PanelController,
    pub render: RenderOptions,
    /// Byte offset of the input cursor in the controller's text.
    pub cursor: usize,
    /// Rendered lines of the last applied result.
    pub results: Vec<StyledLine>,
    /// Wrapped row count of `results` at the last draw.
    pub results_rows: u16,
    /// Visible rows of the results pane at the last draw.
    pub results_view: u16,
    pub scroll: u16,
    pub info: String,
    pub footer_year: i32,
    /// Animation frame counter, advanced on every draw tick.
    pub tick: usize,
}

impl UiState {
    pub fn new(max_output_tokens: u32, render: RenderOptions, footer_year: i32) -> Self {
        Self {
            tab: Tab::default(),
            controller: PanelController::new(max_output_tokens),
            render,
            cursor: 0,
            results: Vec::new(),
            results_rows: 0,
            results_view: 0,
            scroll: 0,
            info: String::new(),
            footer_year,
            tick: 0,
        }
    }

    pub fn submit(&mut self) -> Option<Ticket> {
        let ticket = self.controller.submit()?;
        self.results.clear();
        self.scroll = 0;
        self.info.clear();
        Some(ticket)
    }

    pub fn clear(&mut self) {
        self.controller.clear();
        self.cursor = 0;
        self.results.clear();
        self.scroll = 0;
        self.info = "Cleared".into();
    }

    pub fn load_example(&mut self) {
        self.controller.reset_to_example();
        self.cursor = self.controller.text().len();
        self.info = "Loaded example news".into();
    }

    pub fn apply_event(&mut self, ev: PanelEvent) {
        match ev {
            PanelEvent::Completed { seq, outcome } => {
                if self.controller.complete(seq, outcome) == Completion::Stale {
                    return;
                }
                self.scroll = 0;
                self.results = match self.controller.result() {
                    Some(result) => PanelView::project(result, &self.render).lines(),
                    None => Vec::new(),
                };
                debug!(lines = self.results.len(), "results rendered");
            }
            PanelEvent::Info(message) => self.info = message,
        }
    }

    /// Short status text for the line under the input.
    pub fn status_text(&self) -> String {
        match self.controller.state() {
            RunState::Idle if !self.controller.can_submit() => {
                "Type or paste a news item, or press Ctrl-E for an example.".into()
            }
            RunState::Idle => "Ready. Press Ctrl-R to analyze.".into(),
            RunState::Running => format!("{} Analyzing…", spinner(self.tick)),
            RunState::Succeeded(result) => format!(
                "Done: {} reaction(s), {} error(s)",
                result.reactions.len(),
                result.per_item_errors.len()
            ),
            RunState::Failed(message) => format!("Error: {message}"),
        }
    }

    /// Results as plain text, for the clipboard.
    pub fn results_plain_text(&self) -> Option<String> {
        let result = self.controller.result()?;
        let lines = crate::text_summary::plain_lines(&result.source_text, &self.results);
        Some(lines.join("\n"))
    }

    /// Record the results pane geometry from a draw and keep the scroll in range.
    pub fn set_results_layout(&mut self, rows: usize, view: u16) {
        self.results_rows = rows.min(u16::MAX as usize) as u16;
        self.results_view = view;
        self.scroll = self.scroll.min(self.max_scroll());
    }

    /// Last scroll offset that still fills the pane, in wrapped rows.
    pub fn max_scroll(&self) -> u16 {
        self.results_rows.saturating_sub(self.results_view)
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let next = (self.scroll as i32 + delta).clamp(0, self.max_scroll() as i32);
        self.scroll = next as u16;
    }

    // Input editing. The cursor always sits on a char boundary.

    pub fn insert_char(&mut self, c: char) {
        self.controller.text_mut().insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn insert_str(&mut self, s: &str) {
        self.controller.text_mut().insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.controller.text_mut().replace_range(prev..self.cursor, "");
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.controller.text_mut().replace_range(self.cursor..next, "");
        }
    }

    pub fn move_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.cursor = prev;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(next) = self.next_boundary() {
            self.cursor = next;
        }
    }

    pub fn move_line_start(&mut self) {
        let text = self.controller.text();
        self.cursor = text[..self.cursor].rfind('\n').map_or(0, |i| i + 1);
    }

    pub fn move_line_end(&mut self) {
        let text = self.controller.text();
        self.cursor = text[self.cursor..]
            .find('\n')
            .map_or(text.len(), |i| self.cursor + i);
    }

    /// (row, display column) of the cursor within the input.
    pub fn cursor_row_col(&self) -> (usize, usize) {
        let before = &self.controller.text()[..self.cursor];
        let row = before.matches('\n').count();
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        (row, before[line_start..].width())
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.controller.text()[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.controller.text()[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
    }
}

pub fn spinner(tick: usize) -> &'static str {
    const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    FRAMES[tick % FRAMES.len()]
}
