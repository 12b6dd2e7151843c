mod clipboard;
mod help;
mod state;
mod theme;

use crate::config::PanelConfig;
use crate::engine::PipelineClient;
use crate::error::PanelError;
use crate::model::{PanelEvent, RunState};
use crate::orchestrator::{self, Ticket, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent,
        KeyEventKind, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{Tab, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

const PAGE: i32 = 10;
const MAX_INPUT_ROWS: usize = 6;

pub async fn run(cfg: PanelConfig) -> Result<()> {
    let client = PipelineClient::new(&cfg)?;
    tracing::info!(url = %client.url(), "starting panel UI");

    let (event_tx, event_rx) = mpsc::unbounded_channel::<PanelEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let state = UiState::new(cfg.max_tokens, cfg.render_options(), current_year());

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(state, event_rx, cmd_tx));

    orchestrator::run_dispatcher(Arc::new(client), event_tx, cmd_rx).await;

    let joined = tokio::task::spawn_blocking(move || ui_handle.join())
        .await
        .context("failed to join UI thread")?;
    match joined {
        Ok(res) => res,
        Err(_) => Err(anyhow::anyhow!("TUI thread panicked")),
    }
}

/// Current calendar year for the footer, local time when the offset is known.
fn current_year() -> i32 {
    time::OffsetDateTime::now_local()
        .unwrap_or_else(|_| time::OffsetDateTime::now_utc())
        .year()
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    mut state: UiState,
    mut event_rx: UnboundedReceiver<PanelEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain completions without blocking to keep the UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            state.tick = state.tick.wrapping_add(1);
            terminal.draw(|f| draw(f.area(), f, &mut state)).ok();
            last_tick = Instant::now();
        }

        if !event::poll(Duration::from_millis(10)).unwrap_or(false) {
            continue;
        }
        let action = match event::read() {
            Ok(Event::Key(k)) if k.kind == KeyEventKind::Press => handle_key(&mut state, k),
            Ok(Event::Paste(text)) if state.tab == Tab::Panel => {
                state.insert_str(&text.replace("\r\n", "\n").replace('\r', "\n"));
                KeyAction::None
            }
            _ => KeyAction::None,
        };

        match action {
            KeyAction::None => {}
            KeyAction::Submit(ticket) => dispatch(&mut state, &cmd_tx, ticket),
            KeyAction::Copy(text) => {
                state.info = match clipboard::copy_to_clipboard(&text) {
                    Ok(()) => "Copied results to clipboard".into(),
                    Err(e) => format!("Copy failed: {e:#}"),
                };
            }
            KeyAction::Quit => {
                let _ = cmd_tx.send(UiCommand::Quit);
                break Ok(());
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, DisableBracketedPaste, LeaveAlternateScreen).ok();
    res
}

/// Hand a ticket to the dispatcher; a dead dispatcher fails the run in place.
fn dispatch(state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>, ticket: Ticket) {
    let seq = ticket.seq;
    if cmd_tx.send(UiCommand::Submit(ticket)).is_err() {
        state.apply_event(PanelEvent::Completed {
            seq,
            outcome: Err(PanelError::DispatcherClosed),
        });
    }
}

#[derive(Debug)]
enum KeyAction {
    None,
    Submit(Ticket),
    Copy(String),
    Quit,
}

fn handle_key(state: &mut UiState, k: KeyEvent) -> KeyAction {
    let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
    match k.code {
        KeyCode::Esc => return KeyAction::Quit,
        KeyCode::Char('c') if ctrl => return KeyAction::Quit,
        KeyCode::Tab => {
            state.tab = state.tab.next();
            return KeyAction::None;
        }
        KeyCode::F(5) => return submit(state),
        KeyCode::Char('r') if ctrl => return submit(state),
        KeyCode::Char('l') if ctrl => {
            state.clear();
            return KeyAction::None;
        }
        KeyCode::Char('e') if ctrl => {
            state.load_example();
            return KeyAction::None;
        }
        KeyCode::Char('y') if ctrl => {
            return match state.results_plain_text() {
                Some(text) => KeyAction::Copy(text),
                None => {
                    state.info = "No results to copy".into();
                    KeyAction::None
                }
            };
        }
        KeyCode::PageUp => state.scroll_by(-PAGE),
        KeyCode::PageDown => state.scroll_by(PAGE),
        KeyCode::Up if ctrl => state.scroll_by(-1),
        KeyCode::Down if ctrl => state.scroll_by(1),
        _ if state.tab == Tab::Panel => edit_input(state, k),
        _ => {}
    }
    KeyAction::None
}

fn submit(state: &mut UiState) -> KeyAction {
    match state.submit() {
        Some(ticket) => KeyAction::Submit(ticket),
        None => {
            state.info = if state.controller.state().is_running() {
                "A request is already running".into()
            } else {
                "Nothing to analyze".into()
            };
            KeyAction::None
        }
    }
}

fn edit_input(state: &mut UiState, k: KeyEvent) {
    if k.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) {
        return;
    }
    match k.code {
        KeyCode::Char(c) => state.insert_char(c),
        KeyCode::Enter => state.insert_char('\n'),
        KeyCode::Backspace => state.backspace(),
        KeyCode::Delete => state.delete(),
        KeyCode::Left => state.move_left(),
        KeyCode::Right => state.move_right(),
        KeyCode::Home => state.move_line_start(),
        KeyCode::End => state.move_line_end(),
        _ => {}
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &mut UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Panel"), Line::from("Help")])
        .select(state.tab.index())
        .block(Block::default().borders(Borders::ALL).title("MBTIverse Panel"))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        Tab::Panel => draw_panel(chunks[1], f, state),
        Tab::Help => help::draw_help(chunks[1], f),
    }

    let footer = Paragraph::new(
        Line::from(format!(
            "© {} MBTIverse · Tab: help · Esc: quit",
            state.footer_year
        ))
        .centered(),
    )
    .style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, chunks[2]);
}

fn draw_panel(area: Rect, f: &mut ratatui::Frame, state: &mut UiState) {
    let text = state.controller.text();
    let input_rows = text.split('\n').count().clamp(1, MAX_INPUT_ROWS);
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(input_rows as u16 + 2),
            Constraint::Length(1),
            Constraint::Min(3),
        ])
        .split(area);

    // Input, scrolled so the cursor row stays visible.
    let (row, col) = state.cursor_row_col();
    let top = row.saturating_sub(input_rows - 1);
    let input = Paragraph::new(text)
        .scroll((top as u16, 0))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("News  (Ctrl-R analyze · Ctrl-E example · Ctrl-L clear)"),
        );
    f.render_widget(input, main[0]);
    let inner = main[0].inner(ratatui::layout::Margin::new(1, 1));
    if inner.width > 0 {
        let x = inner.x + (col as u16).min(inner.width - 1);
        let y = inner.y + (row - top) as u16;
        f.set_cursor_position((x, y));
    }

    let status_style = match state.controller.state() {
        RunState::Idle => Style::default().fg(Color::Gray),
        RunState::Running => Style::default().fg(Color::Yellow),
        RunState::Succeeded(_) => Style::default().fg(Color::Green),
        RunState::Failed(_) => Style::default().fg(Color::Red),
    };
    let mut status = vec![Span::styled(state.status_text(), status_style)];
    if !state.info.is_empty() {
        status.push(Span::styled(
            format!("  · {}", state.info),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(status)), main[1]);

    let lines: Vec<Line> = if state.results.is_empty() {
        let placeholder = match state.controller.state() {
            RunState::Running => "Waiting for the panel…",
            RunState::Failed(_) => "No results.",
            _ => "Results will appear here.",
        };
        vec![Line::styled(placeholder, Style::default().fg(Color::DarkGray))]
    } else {
        state.results.iter().map(theme::to_line).collect()
    };
    // Scrolling counts wrapped rows, so measure without the block at the inner width.
    let results = Paragraph::new(lines).wrap(Wrap { trim: false });
    let inner = main[2].inner(ratatui::layout::Margin::new(1, 1));
    state.set_results_layout(results.line_count(inner.width), inner.height);

    let title = if state.results.is_empty() {
        "Results".to_string()
    } else {
        format!(
            "Results  (row {}/{} · PgUp/PgDn scroll · Ctrl-Y copy)",
            state.scroll as usize + 1,
            state.results_rows.max(1)
        )
    };
    let results = results
        .scroll((state.scroll, 0))
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(results, main[2]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemError, PanelResult, Reaction, EXAMPLE_NEWS};
    use crate::render::RenderOptions;
    use ratatui::backend::TestBackend;

    fn state() -> UiState {
        UiState::new(512, RenderOptions::default(), 2026)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_typing_edits_input() {
        let mut s = state();
        for c in "hi".chars() {
            handle_key(&mut s, key(KeyCode::Char(c)));
        }
        handle_key(&mut s, key(KeyCode::Enter));
        handle_key(&mut s, KeyEvent::new(KeyCode::Char('X'), KeyModifiers::SHIFT));
        handle_key(&mut s, key(KeyCode::Backspace));
        handle_key(&mut s, key(KeyCode::Char('!')));
        assert_eq!(s.controller.text(), "hi\n!");
    }

    #[test]
    fn test_submit_keys() {
        let mut s = state();
        assert!(matches!(handle_key(&mut s, ctrl('r')), KeyAction::None));
        assert_eq!(s.info, "Nothing to analyze");

        handle_key(&mut s, ctrl('e'));
        assert!(matches!(
            handle_key(&mut s, key(KeyCode::F(5))),
            KeyAction::Submit(Ticket { seq: 1, .. })
        ));
        assert!(matches!(handle_key(&mut s, ctrl('r')), KeyAction::None));
        assert_eq!(s.info, "A request is already running");
    }

    #[test]
    fn test_clear_and_quit_keys() {
        let mut s = state();
        handle_key(&mut s, ctrl('e'));
        handle_key(&mut s, ctrl('l'));
        assert!(s.controller.text().is_empty());
        assert!(matches!(handle_key(&mut s, key(KeyCode::Esc)), KeyAction::Quit));
        assert!(matches!(handle_key(&mut s, ctrl('c')), KeyAction::Quit));
    }

    #[test]
    fn test_help_tab_ignores_typing() {
        let mut s = state();
        handle_key(&mut s, key(KeyCode::Tab));
        assert_eq!(s.tab, Tab::Help);
        handle_key(&mut s, key(KeyCode::Char('a')));
        assert!(s.controller.text().is_empty());
    }

    #[test]
    fn test_copy_without_results() {
        let mut s = state();
        assert!(matches!(handle_key(&mut s, ctrl('y')), KeyAction::None));
        assert_eq!(s.info, "No results to copy");
    }

    #[test]
    fn test_dead_dispatcher_fails_the_run() {
        let mut s = state();
        s.load_example();
        let ticket = s.submit().unwrap();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        drop(cmd_rx);
        dispatch(&mut s, &cmd_tx, ticket);
        assert_eq!(
            s.controller.state(),
            &RunState::Failed("request dispatcher is not running".into())
        );
    }

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_scrolling_reaches_the_end_of_wrapped_results() {
        let mut s = state();
        s.load_example();
        let ticket = s.submit().unwrap();
        let long = "the panel has a lot to say about this ".repeat(16);
        let reactions = ["ISTJ", "ENFP", "INTJ", "ESTP", "INFJ", "ENTP"]
            .into_iter()
            .map(|id| Reaction {
                personality_id: id.to_string(),
                reaction_text: long.clone(),
            })
            .collect();
        s.apply_event(PanelEvent::Completed {
            seq: ticket.seq,
            outcome: Ok(PanelResult {
                source_text: EXAMPLE_NEWS.to_string(),
                reactions,
                meta_review: None,
                per_item_errors: vec![ItemError {
                    personality_id: "ISFJ".to_string(),
                    message: "timeout".to_string(),
                }],
            }),
        });

        let mut terminal = Terminal::new(TestBackend::new(60, 30)).unwrap();
        terminal.draw(|f| draw(f.area(), f, &mut s)).unwrap();
        assert!(!screen_text(&terminal).contains("ISFJ: timeout"));
        assert!(s.results_rows as usize > s.results.len());

        s.scroll_by(100_000);
        assert_eq!(s.scroll, s.max_scroll());
        terminal.draw(|f| draw(f.area(), f, &mut s)).unwrap();
        assert!(screen_text(&terminal).contains("ISFJ: timeout"));
    }
}
