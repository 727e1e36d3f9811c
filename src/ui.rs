use std::io::{
    Stdout,
    stdout,
};

use chrono::{
    DateTime,
    Local,
};
use color_eyre::eyre::{
    Result,
    eyre,
};
use crossterm::{
    event::{
        Event,
        EventStream,
        KeyCode,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use futures::StreamExt;
use itertools::Itertools;
use ratatui::{
    prelude::*,
    widgets::*,
};
use unicode_width::{
    UnicodeWidthChar,
    UnicodeWidthStr,
};

use crate::{
    client::{
        ProfileSnapshot,
        ReconciliationState,
    },
    platform::ToastKind,
    profile::{
        BetCategory,
        UserProfile,
    },
};

const MAX_TOASTS: usize = 4;

pub enum UserEvent {
    Quit,
    NextTab,
    PrevTab,
    NextBet,
    PrevBet,
    OpenBet,
    CheckFailedTasks,
    Redraw,
}

#[derive(Debug)]
struct Toast {
    kind: ToastKind,
    at: DateTime<Local>,
    message: String,
}

#[derive(Debug, Default)]
pub struct UiState {
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
    toasts: Vec<Toast>,
    route_hint: Option<String>,
}

impl UiState {
    pub fn push_toast(&mut self, kind: ToastKind, message: String) {
        self.toasts.push(Toast {
            kind,
            at: Local::now(),
            message,
        });
        if self.toasts.len() > MAX_TOASTS {
            let overflow = self.toasts.len() - MAX_TOASTS;
            self.toasts.drain(..overflow);
        }
    }

    pub fn set_route_hint(&mut self, path: String) {
        self.route_hint = Some(path);
    }

    /// Clears everything the reload replaces. The terminal handle survives.
    pub fn reset_session(&mut self) {
        self.toasts.clear();
        self.route_hint = None;
    }
}

pub type InputEventReceiver = EventStream;

pub fn input_event_stream() -> InputEventReceiver {
    EventStream::new()
}

pub async fn next_raw_event(events: &mut InputEventReceiver) -> Result<Event> {
    match events.next().await {
        Some(event) => Ok(event?),
        None => Err(eyre!("input event stream closed")),
    }
}

pub fn interpret_event(event: Event) -> Option<UserEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(UserEvent::Quit),
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
                Some(UserEvent::NextTab)
            }
            KeyCode::Left | KeyCode::Char('h') | KeyCode::BackTab => {
                Some(UserEvent::PrevTab)
            }
            KeyCode::Down | KeyCode::Char('j') => Some(UserEvent::NextBet),
            KeyCode::Up | KeyCode::Char('k') => Some(UserEvent::PrevBet),
            KeyCode::Enter => Some(UserEvent::OpenBet),
            KeyCode::Char('f') => Some(UserEvent::CheckFailedTasks),
            _ => None,
        },
        Event::Resize(_, _) => Some(UserEvent::Redraw),
        _ => None,
    }
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(stdout(), crossterm::terminal::EnterAlternateScreen)?;
    // one persistent Terminal so buffers survive across draws
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

pub fn draw(state: &mut UiState, snap: &ProfileSnapshot) -> Result<()> {
    // headless (tests) until terminal_enter has run
    let Some(mut terminal) = state.terminal.take() else {
        return Ok(());
    };
    let result = terminal.draw(|f| ui(f, state, snap)).map(|_| ());
    state.terminal = Some(terminal);
    result?;
    Ok(())
}

fn ui(f: &mut Frame, state: &UiState, snap: &ProfileSnapshot) {
    let Some(profile) = &snap.profile else {
        draw_loading(f, state);
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(5),
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(4),
        Constraint::Length(1),
    ])
    .split(f.area());

    draw_header(f, chunks[0], profile, snap.reconciliation);
    draw_tabs(f, chunks[1], snap);
    draw_bets(f, chunks[2], snap);
    draw_toasts(f, chunks[3], state);
    draw_footer(f, chunks[4], state);
}

fn draw_loading(f: &mut Frame, state: &UiState) {
    let area = centered_rect(50, 20, f.area());
    let placeholder = Paragraph::new("Loading profile...")
        .style(Style::default().fg(Color::DarkGray).italic())
        .alignment(Alignment::Center)
        .block(Block::bordered());
    f.render_widget(placeholder, area);

    // a failed fetch parks the view here; its toast still has to show
    let bottom = Layout::vertical([Constraint::Min(0), Constraint::Length(4)])
        .split(f.area())[1];
    draw_toasts(f, bottom, state);
}

fn draw_header(
    f: &mut Frame,
    area: Rect,
    profile: &UserProfile,
    reconciliation: ReconciliationState,
) {
    let halves =
        Layout::horizontal([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(area);

    let identity = Paragraph::new(vec![
        Line::from(Span::styled(
            profile.username.clone(),
            Style::default().fg(Color::Magenta).bold(),
        )),
        Line::from(format!("Email: {}", profile.email)),
        Line::from(Span::styled(
            format!("Balance: ₹{}", amount_formatted(profile.balance)),
            Style::default().fg(Color::Yellow),
        )),
    ])
    .block(Block::bordered().title("Profile"));
    f.render_widget(identity, halves[0]);

    let (label, style) = match reconciliation {
        ReconciliationState::InFlight => (
            "Checking...",
            Style::default().fg(Color::DarkGray),
        ),
        ReconciliationState::Succeeded => (
            "Reloading...",
            Style::default().fg(Color::Green),
        ),
        ReconciliationState::Idle | ReconciliationState::Failed => (
            "[f] Failed Tasks",
            Style::default().fg(Color::Red).bold(),
        ),
    };
    let button = Paragraph::new(Line::from(Span::styled(label, style)))
        .alignment(Alignment::Center)
        .block(Block::bordered().title("Tasks"));
    f.render_widget(button, halves[1]);
}

fn draw_tabs(f: &mut Frame, area: Rect, snap: &ProfileSnapshot) {
    let titles: Vec<Line> = BetCategory::ALL
        .iter()
        .map(|category| {
            let count = snap
                .profile
                .as_ref()
                .map(|profile| profile.bets_for(*category).len())
                .unwrap_or_default();
            Line::from(format!("{} ({})", category.label(), count))
        })
        .collect();
    let tabs = Tabs::new(titles)
        .select(snap.active_tab.index())
        .highlight_style(Style::default().fg(Color::Cyan).bold())
        .block(Block::bordered().title("Bets"));
    f.render_widget(tabs, area);
}

fn draw_bets(f: &mut Frame, area: Rect, snap: &ProfileSnapshot) {
    let block = Block::bordered().title(snap.active_tab.label());
    if snap.bets.is_empty() {
        let empty = Paragraph::new("No bets found in this category.")
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let title_width = (area.width as usize).saturating_sub(30).max(8);
    let items: Vec<ListItem> = snap
        .bets
        .iter()
        .map(|bet| {
            let line = Line::from(vec![
                Span::styled(
                    fit_width(&bet.title, title_width),
                    Style::default().bold(),
                ),
                Span::raw(format!("  ₹{}", amount_formatted(bet.amount))),
                Span::styled(
                    format!("  {}", bet.status),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();
    let list = List::new(items)
        .highlight_symbol(">> ")
        .highlight_style(Style::default().fg(Color::Cyan))
        .block(block);
    let mut list_state = ListState::default();
    list_state.select(Some(snap.selected_bet));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_toasts(f: &mut Frame, area: Rect, state: &UiState) {
    let lines: Vec<Line> = state
        .toasts
        .iter()
        .map(|toast| {
            let (mark, color) = match toast.kind {
                ToastKind::Success => ("✓", Color::Green),
                ToastKind::Error => ("✗", Color::Red),
            };
            Line::from(vec![
                Span::styled(
                    format!("{} {} ", toast.at.format("%H:%M:%S"), mark),
                    Style::default().fg(color),
                ),
                Span::raw(toast.message.clone()),
            ])
        })
        .collect();
    let panel = Paragraph::new(lines).block(Block::bordered().title("Notifications"));
    f.render_widget(panel, area);
}

fn draw_footer(f: &mut Frame, area: Rect, state: &UiState) {
    let mut hints = vec![
        "q quit",
        "←/→ tab",
        "↑/↓ select",
        "⏎ open",
        "f failed tasks",
    ]
    .iter()
    .join("  ·  ");
    if let Some(path) = &state.route_hint {
        hints.push_str(&format!("  ·  viewing {path}"));
    }
    let footer =
        Paragraph::new(hints).style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, area);
}

fn amount_formatted(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{amount:.0}")
    } else {
        format!("{amount:.2}")
    }
}

fn fit_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    let mut out = String::new();
    for c in text.chars() {
        // reserve one cell for the ellipsis
        if out.width() + c.width().unwrap_or(0) + 1 > max_width {
            break;
        }
        out.push(c);
    }
    out.push('…');
    out
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let vertical = Layout::vertical([
        Constraint::Percentage((100 - h_percent) / 2),
        Constraint::Percentage(h_percent),
        Constraint::Percentage((100 - h_percent) / 2),
    ])
    .split(r);
    Layout::horizontal([
        Constraint::Percentage((100 - w_percent) / 2),
        Constraint::Percentage(w_percent),
        Constraint::Percentage((100 - w_percent) / 2),
    ])
    .split(vertical[1])[1]
}
