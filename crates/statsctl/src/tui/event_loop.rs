//! Dashboard event loop: terminal setup, input handling, and the
//! bridge between transport events and the orchestrator.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use stats_common::StatsFilter;

use crate::cli::Cli;
use crate::export::export_all;
use crate::orchestrator::Dashboard;
use crate::theme::{Theme, ThemeBus};
use crate::transport::{
    self, FilterHandle, TransportEvent, POLL_INTERVAL, RECONNECT_BACKOFF,
};

use super::render::draw_ui;

/// Which date field the filter bar is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateField {
    Start,
    End,
}

/// Full TUI state: the orchestrator plus input-bar editing state.
pub struct App {
    pub dashboard: Dashboard,
    pub theme: Theme,
    pub start_input: String,
    pub end_input: String,
    pub focus: DateField,
    pub polling: bool,
    pub export_on_exit: bool,
    should_quit: bool,
}

impl App {
    fn handle_key(&mut self, code: KeyCode, now: Instant, today: NaiveDate) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    DateField::Start => DateField::End,
                    DateField::End => DateField::Start,
                };
            }
            KeyCode::Char('a') => self.apply_inputs(now),
            KeyCode::Char('r') => {
                self.dashboard.reset_filter(today);
                let filter = self.dashboard.confirmed_filter();
                self.start_input = filter.start_date.to_string();
                self.end_input.clear();
            }
            KeyCode::Char('s') => self.dashboard.cycle_sla_category(),
            KeyCode::Char('e') => self.export_on_exit = !self.export_on_exit,
            KeyCode::Backspace => {
                self.focused_input().pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
                let input = self.focused_input();
                if input.len() < 10 {
                    input.push(c);
                }
            }
            _ => {}
        }
    }

    fn focused_input(&mut self) -> &mut String {
        match self.focus {
            DateField::Start => &mut self.start_input,
            DateField::End => &mut self.end_input,
        }
    }

    /// Parses the input fields and confirms the filter. Parse failures
    /// and inverted ranges surface as notices; nothing is sent.
    fn apply_inputs(&mut self, now: Instant) {
        let start: NaiveDate = match self.start_input.parse() {
            Ok(date) => date,
            Err(_) => {
                self.dashboard
                    .push_notice(format!("invalid start date: {}", self.start_input), now);
                return;
            }
        };
        let end = if self.end_input.is_empty() {
            None
        } else {
            match self.end_input.parse() {
                Ok(date) => Some(date),
                Err(_) => {
                    self.dashboard
                        .push_notice(format!("invalid end date: {}", self.end_input), now);
                    return;
                }
            }
        };
        self.dashboard.apply_filter(start, end, now);
    }
}

/// Run the dashboard TUI.
pub async fn run(cli: Cli, theme_bus: &ThemeBus) -> Result<()> {
    let today = Local::now().date_naive();
    let initial = match cli.start_date {
        Some(start) => StatsFilter::new(start, cli.end_date),
        None => StatsFilter::default_range(today),
    };
    initial.validate().context("initial date range")?;

    let (filters, filter_rx) = FilterHandle::new(initial.clone());
    let (events_tx, mut events_rx) = mpsc::channel::<TransportEvent>(32);

    // Exactly one transport per dashboard instance.
    let transport = if cli.poll {
        tokio::spawn(transport::run_polling(
            cli.server.clone(),
            filter_rx,
            events_tx,
            POLL_INTERVAL,
        ))
    } else {
        tokio::spawn(transport::run_websocket(
            transport::websocket_url(&cli.server),
            filter_rx,
            events_tx,
            RECONNECT_BACKOFF,
        ))
    };

    let mut app = App {
        dashboard: Dashboard::new(filters, today),
        theme: theme_bus.current(),
        start_input: initial.start_date.to_string(),
        end_input: initial
            .end_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
        focus: DateField::Start,
        polling: cli.poll,
        export_on_exit: false,
        should_quit: false,
    };
    let mut theme_rx = theme_bus.subscribe();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(
        &mut terminal,
        &mut app,
        &mut events_rx,
        &mut theme_rx,
        theme_bus,
        today,
    )
    .await;

    transport.abort();

    // Restore terminal (always attempt cleanup)
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if app.export_on_exit {
        println!(
            "{}",
            export_all(&app.dashboard.trend, &app.dashboard.bars, &app.dashboard.donuts)
        );
    }

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events_rx: &mut mpsc::Receiver<TransportEvent>,
    theme_rx: &mut tokio::sync::watch::Receiver<Theme>,
    theme_bus: &ThemeBus,
    today: NaiveDate,
) -> Result<()> {
    let tick_rate = Duration::from_millis(100);

    loop {
        // Drain pending transport events before drawing; only the last
        // payload needs to be reflected in this frame.
        let now = Instant::now();
        while let Ok(event) = events_rx.try_recv() {
            app.dashboard.handle_event(event, now);
        }

        // Theme changes restyle only; chart data is untouched.
        if theme_rx.has_changed().unwrap_or(false) {
            app.theme = *theme_rx.borrow_and_update();
        }

        terminal.draw(|frame| draw_ui(frame, app, now))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if key.code == KeyCode::Char('t') {
                        theme_bus.toggle();
                    } else {
                        app.handle_key(key.code, Instant::now(), today);
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let today: NaiveDate = "2026-08-30".parse().unwrap();
        let initial = StatsFilter::default_range(today);
        let (filters, _rx) = FilterHandle::new(initial.clone());
        App {
            dashboard: Dashboard::new(filters, today),
            theme: Theme::dark(),
            start_input: initial.start_date.to_string(),
            end_input: String::new(),
            focus: DateField::Start,
            polling: false,
            export_on_exit: false,
            should_quit: false,
        }
    }

    #[test]
    fn typing_edits_the_focused_field_only() {
        let mut app = app();
        let today = "2026-08-30".parse().unwrap();
        app.start_input.clear();
        for c in "2026-08-01".chars() {
            app.handle_key(KeyCode::Char(c), Instant::now(), today);
        }
        assert_eq!(app.start_input, "2026-08-01");
        assert!(app.end_input.is_empty());

        app.handle_key(KeyCode::Tab, Instant::now(), today);
        app.handle_key(KeyCode::Char('9'), Instant::now(), today);
        assert_eq!(app.end_input, "9");
        app.handle_key(KeyCode::Backspace, Instant::now(), today);
        assert!(app.end_input.is_empty());
    }

    #[test]
    fn unparsable_date_raises_a_notice_instead_of_applying() {
        let mut app = app();
        let now = Instant::now();
        app.start_input = "garbage".into();
        app.apply_inputs(now);
        assert_eq!(app.dashboard.notices(now).len(), 1);
        assert_eq!(app.dashboard.confirmed_filter().start_date, "2026-07-01".parse().unwrap());
    }

    #[test]
    fn reset_key_restores_default_inputs() {
        let mut app = app();
        let today: NaiveDate = "2026-08-30".parse().unwrap();
        app.start_input = "2026-01-01".into();
        app.end_input = "2026-02-01".into();
        app.handle_key(KeyCode::Char('r'), Instant::now(), today);
        assert_eq!(app.start_input, "2026-07-01");
        assert!(app.end_input.is_empty());
    }
}
