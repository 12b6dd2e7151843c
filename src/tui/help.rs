use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const KEYS: &[(&str, &str)] = &[
    ("Ctrl-R / F5", "Analyze the news text"),
    ("Ctrl-E", "Load the example news item"),
    ("Ctrl-L", "Clear input and results"),
    ("PgUp / PgDn", "Scroll results"),
    ("Ctrl-↑ / Ctrl-↓", "Scroll results by one line"),
    ("Ctrl-Y", "Copy results to the clipboard"),
    ("Tab", "Switch tabs"),
    ("Esc / Ctrl-C", "Quit"),
];

const EDIT_KEYS: &[(&str, &str)] = &[
    ("Enter", "New line"),
    ("←/→ Home/End", "Move the cursor"),
    ("Backspace / Del", "Delete"),
];

fn key_line(key: &'static str, action: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{key:<18}"), Style::default().fg(Color::Magenta)),
        Span::raw(action),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let mut lines = vec![Line::from("Keybinds:")];
    lines.extend(KEYS.iter().map(|&(k, a)| key_line(k, a)));
    lines.push(Line::from(""));
    lines.push(Line::from("Editing the news:"));
    lines.extend(EDIT_KEYS.iter().map(|&(k, a)| key_line(k, a)));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("Structured meta reviews show one section per field; "),
        Span::raw("anything else is rendered as markdown."),
    ]));

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
