//! Main application logic for the terminal user interface.
//!
//! The `App` shows one user's open tasks as an Eisenhower matrix: four
//! quadrant panes plus a pane with the ranker's suggestions. Completion
//! toggles go through the recurrence engine, so completing a recurring task
//! here schedules its successor exactly as `prio toggle` does.

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use tracing::debug;

use crate::cmd::Context;
use crate::db::{format_due_relative, format_frequency, FileStore};
use crate::error::Result;
use crate::priority::{rank, Ranking, ScoredTask};
use crate::recurrence::toggle_completion;
use crate::store::TaskStore;
use crate::tui::{
    colors::{quadrant_color, text_on, DARK_RED, STEEL_BLUE},
    enums::{AppState, Pane},
    utils::centered_rect,
};

/// Rows shown in `pane`, in rank order.
fn pane_rows(ranking: &Ranking, pane: Pane) -> Vec<&ScoredTask> {
    match pane {
        Pane::Suggested => ranking.suggested.iter().collect(),
        Pane::Quadrant(q) => ranking.ranked.iter().filter(|s| s.task.quadrant() == q).collect(),
    }
}

/// Main application state for the terminal user interface.
pub struct App<'a> {
    ctx: &'a Context,
    user_id: String,
    store: FileStore,
    ranking: Ranking,
    state: AppState,
    focus: Pane,
    pane_states: [TableState; 5],
    pending_delete: Option<u64>,
    status_message: String,
}

impl<'a> App<'a> {
    /// Load `user_id`'s tasks from the context's database.
    pub fn new(ctx: &'a Context, user_id: &str) -> Result<Self> {
        let mut app = App {
            ctx,
            user_id: user_id.to_string(),
            store: ctx.open_store()?,
            ranking: Ranking::default(),
            state: AppState::Matrix,
            focus: Pane::Suggested,
            pane_states: Default::default(),
            pending_delete: None,
            status_message: String::new(),
        };
        app.rerank()?;
        Ok(app)
    }

    fn rerank(&mut self) -> Result<()> {
        let today = self.ctx.clock.today();
        let open = self.store.load_open_tasks(&self.user_id, today, self.ctx.clock.offset())?;
        self.ranking = rank(open, today, &self.ctx.config.ranking);
        for pane in Pane::ALL {
            let len = pane_rows(&self.ranking, pane).len();
            let state = &mut self.pane_states[pane.index()];
            match state.selected() {
                _ if len == 0 => state.select(None),
                Some(i) if i >= len => state.select(Some(len - 1)),
                None => state.select(Some(0)),
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Re-read the database file and rank again.
    fn reload(&mut self) -> Result<()> {
        self.store.reload()?;
        self.rerank()
    }

    /// Id of the highlighted task in the focused pane.
    pub fn selected_task_id(&self) -> Option<u64> {
        let rows = pane_rows(&self.ranking, self.focus);
        let i = self.pane_states[self.focus.index()].selected()?;
        rows.get(i).map(|s| s.task.id)
    }

    fn move_selection(&mut self, down: bool) {
        let len = pane_rows(&self.ranking, self.focus).len();
        if len == 0 {
            return;
        }
        let state = &mut self.pane_states[self.focus.index()];
        let i = state.selected().unwrap_or(0);
        let next = if down { (i + 1) % len } else { (i + len - 1) % len };
        state.select(Some(next));
    }

    fn toggle_selected(&mut self) -> Result<()> {
        let Some(id) = self.selected_task_id() else {
            return Ok(());
        };
        let outcome = toggle_completion(
            &mut self.store,
            self.ctx.clock.as_ref(),
            &self.ctx.config.recurrence.policy,
            &self.user_id,
            id,
        )?;
        self.status_message = match outcome {
            Some(o) => match o.successor {
                Some(next) => format!(
                    "Completed #{id}; next occurrence #{} due {}",
                    next.id,
                    next.due_date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
                ),
                None if o.completed => format!("Completed #{id}"),
                None => format!("Reopened #{id}"),
            },
            None => format!("Task #{id} no longer exists"),
        };
        self.rerank()
    }

    fn delete_pending(&mut self) -> Result<()> {
        if let Some(id) = self.pending_delete.take() {
            let user_id = self.user_id.clone();
            let removed = self.store.write(|db| db.delete_task(id, &user_id))?;
            self.status_message = if removed == 0 {
                format!("Task #{id} no longer exists")
            } else {
                format!("Deleted #{id}")
            };
            self.rerank()?;
        }
        Ok(())
    }

    fn handle_matrix_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Down | KeyCode::Char('j') => self.move_selection(true),
            KeyCode::Up | KeyCode::Char('k') => self.move_selection(false),
            KeyCode::Char(' ') => self.toggle_selected()?,
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_task_id() {
                    self.pending_delete = Some(id);
                    self.state = AppState::Confirm;
                }
            }
            KeyCode::Char('r') => {
                self.reload()?;
                self.status_message = "Reloaded".into();
            }
            KeyCode::Char('?') | KeyCode::F(1) => self.state = AppState::Help,
            _ => {}
        }
        Ok(false)
    }

    fn handle_confirm_key(&mut self, key: KeyCode) -> Result<bool> {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                self.state = AppState::Matrix;
                self.delete_pending()?;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.state = AppState::Matrix;
                self.pending_delete = None;
            }
            _ => {}
        }
        Ok(false)
    }

    /// Apply one key press. Returns true if the application should quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Result<bool> {
        self.status_message.clear();
        let result = match self.state {
            AppState::Matrix => self.handle_matrix_key(key, modifiers),
            AppState::Confirm => self.handle_confirm_key(key),
            AppState::Help => {
                self.state = AppState::Matrix;
                Ok(false)
            }
        };
        // Storage failures are shown, not fatal.
        match result {
            Ok(quit) => Ok(quit),
            Err(e) => {
                debug!(error = %e, "tui action failed");
                self.status_message = format!("Error: {e}");
                Ok(false)
            }
        }
    }

    /// Poll for and handle keyboard events.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return self.handle_key(key.code, key.modifiers);
                }
            }
        }
        Ok(false)
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let open = self.ranking.ranked.len();
        let header = Paragraph::new(Line::from(vec![
            Span::styled("PRIORITY MATRIX", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!("{}  |  {open} open, {} suggested", self.user_id, self.ranking.suggested.len()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ]))
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center);
        f.render_widget(header, area);
    }

    fn render_pane(&mut self, f: &mut Frame, area: Rect, pane: Pane) {
        let today = self.ctx.clock.today();
        let color = match pane {
            Pane::Suggested => STEEL_BLUE,
            Pane::Quadrant(q) => quadrant_color(q),
        };
        let focused = pane == self.focus;

        let rows: Vec<Row> = pane_rows(&self.ranking, pane)
            .into_iter()
            .map(|s| {
                let star = if matches!(pane, Pane::Quadrant(_)) && self.ranking.is_suggested(s.task.id) {
                    "*"
                } else {
                    ""
                };
                let style = if s.task.is_overdue(today) {
                    Style::default().fg(Color::LightRed)
                } else {
                    Style::default().fg(Color::White)
                };
                Row::new(vec![
                    Cell::from(format!("{}{star}", s.task.id)),
                    Cell::from(format!("{:.2}", s.priority)),
                    Cell::from(format_due_relative(s.task.due_date, today)),
                    Cell::from(format_frequency(s.task.frequency)),
                    Cell::from(s.task.title.clone()),
                ])
                .style(style)
            })
            .collect();

        let header = Row::new(["ID", "Score", "Due", "Repeat", "Title"].map(|h| {
            Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(color).fg(text_on(color)));

        let border_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let count = rows.len();
        let mut table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Length(7),
                Constraint::Length(10),
                Constraint::Length(8),
                Constraint::Min(10),
            ],
        )
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(format!("{} ({count})", pane.title())),
        );
        if focused {
            table = table
                .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
                .highlight_symbol(">> ");
        }

        f.render_stateful_widget(table, area, &mut self.pane_states[pane.index()]);
    }

    fn render_matrix(&mut self, f: &mut Frame, area: Rect) {
        let suggested_height = (self.ranking.suggested.len() as u16 + 3).clamp(4, 10);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(suggested_height),
                Constraint::Min(0),
            ])
            .split(area);

        self.render_header(f, chunks[0]);
        self.render_pane(f, chunks[1], Pane::Suggested);

        let grid_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);
        for (r, row_area) in grid_rows.iter().enumerate() {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(*row_area);
            for (c, cell_area) in cols.iter().enumerate() {
                let pane = Pane::ALL[1 + r * 2 + c];
                self.render_pane(f, *cell_area, pane);
            }
        }
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled("Priority Matrix Help", bold)),
            Line::from(""),
            Line::from("  Tab / Shift+Tab  Move between panes"),
            Line::from("  Up/Down, k/j     Select task"),
            Line::from("  Space            Toggle completion (recurring tasks schedule the next one)"),
            Line::from("  d                Delete selected task"),
            Line::from("  r                Reload from disk"),
            Line::from("  ?/F1             Show this help"),
            Line::from("  q/Esc/Ctrl+C     Quit"),
            Line::from(""),
            Line::from(Span::styled("Scores", bold)),
            Line::from("  impact x importance weight / days until due"),
            Line::from("  * marks suggested tasks in the quadrant panes"),
        ];
        let paragraph = Paragraph::new(help_text)
            .block(Block::default().borders(Borders::ALL).title("Help - Press any key to return"))
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_confirm(&self, f: &mut Frame, area: Rect) {
        let area = centered_rect(50, 20, area);
        f.render_widget(Clear, area);

        let target = self
            .pending_delete
            .and_then(|id| self.ranking.ranked.iter().find(|s| s.task.id == id))
            .map(|s| format!("delete #{} {}", s.task.id, s.task.title))
            .unwrap_or_default();
        let text = vec![
            Line::from(""),
            Line::from(Span::styled("Are you sure you want to:", Style::default().add_modifier(Modifier::BOLD))),
            Line::from(target),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];
        let paragraph = Paragraph::new(text)
            .block(
                Block::default()
                    .title("Confirm Delete")
                    .borders(Borders::ALL)
                    .style(Style::default().bg(DARK_RED)),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let text = if self.status_message.is_empty() {
            match self.state {
                AppState::Matrix => format!("{} | Space toggle  d delete  ? help  q quit", self.focus.title()),
                AppState::Help => "Help".to_string(),
                AppState::Confirm => "Confirm Delete".to_string(),
            }
        } else {
            self.status_message.clone()
        };
        let bg = match self.focus {
            Pane::Suggested => STEEL_BLUE,
            Pane::Quadrant(q) => quadrant_color(q),
        };
        f.render_widget(Paragraph::new(text).style(Style::default().bg(bg).fg(text_on(bg))), area);
    }

    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        match self.state {
            AppState::Matrix => self.render_matrix(f, chunks[0]),
            AppState::Help => self.render_help(f, chunks[0]),
            AppState::Confirm => {
                self.render_matrix(f, chunks[0]);
                self.render_confirm(f, chunks[0]);
            }
        }
        self.render_status_bar(f, chunks[1]);
    }

    /// Main event loop: draw, then handle input, until the user quits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;
            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::Arc;

    use chrono::NaiveDate;
    use ratatui::backend::TestBackend;

    use crate::auth::register;
    use crate::clock::FixedClock;
    use crate::config::Config;
    use crate::db::Database;
    use crate::fields::{Frequency, Importance, Quadrant, Urgency};
    use crate::task::TaskDraft;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn draft(title: &str, urgency: Urgency, due: Option<NaiveDate>, frequency: Frequency) -> TaskDraft {
        TaskDraft {
            user_id: "alice".into(),
            title: title.into(),
            urgency,
            importance: Importance::Important,
            due_date: due,
            impact: 5,
            frequency,
            recurrence_source_id: None,
            created_at_utc: 0,
        }
    }

    fn context(dir: &Path) -> Context {
        let path = dir.join("tasks.json");
        let mut db = Database::default();
        register(&mut db, "alice", "Alice", "pw").unwrap();
        db.insert(draft("Stand-up", Urgency::Urgent, Some(d(2025, 4, 7)), Frequency::Daily));
        db.insert(draft("Plan quarter", Urgency::NotUrgent, Some(d(2025, 4, 30)), Frequency::None));
        db.save(&path).unwrap();
        Context::new(path, Config::default(), Arc::new(FixedClock::on(d(2025, 4, 7))))
    }

    #[test]
    fn space_in_do_pane_completes_and_schedules_successor() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut app = App::new(&ctx, "alice").unwrap();

        app.handle_key(KeyCode::Tab, KeyModifiers::NONE).unwrap();
        assert_eq!(app.focus, Pane::Quadrant(Quadrant::Do));
        assert_eq!(app.selected_task_id(), Some(1));

        app.handle_key(KeyCode::Char(' '), KeyModifiers::NONE).unwrap();
        assert!(app.status_message.contains("next occurrence #3"));
        assert_eq!(app.selected_task_id(), Some(3));

        let db = Database::load(&ctx.db_path).unwrap();
        assert!(db.get(1).unwrap().completed);
        assert_eq!(db.get(3).unwrap().due_date, Some(d(2025, 4, 8)));
    }

    #[test]
    fn delete_asks_for_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut app = App::new(&ctx, "alice").unwrap();
        app.focus = Pane::Quadrant(Quadrant::Schedule);

        app.handle_key(KeyCode::Char('d'), KeyModifiers::NONE).unwrap();
        assert_eq!(app.state, AppState::Confirm);
        app.handle_key(KeyCode::Char('n'), KeyModifiers::NONE).unwrap();
        assert_eq!(app.state, AppState::Matrix);
        assert_eq!(app.ranking.ranked.len(), 2);

        app.handle_key(KeyCode::Char('d'), KeyModifiers::NONE).unwrap();
        app.handle_key(KeyCode::Char('y'), KeyModifiers::NONE).unwrap();
        assert_eq!(app.ranking.ranked.len(), 1);
        assert!(Database::load(&ctx.db_path).unwrap().get(2).is_none());
    }

    #[test]
    fn quit_keys_and_help() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut app = App::new(&ctx, "alice").unwrap();

        assert!(!app.handle_key(KeyCode::Char('?'), KeyModifiers::NONE).unwrap());
        assert_eq!(app.state, AppState::Help);
        assert!(!app.handle_key(KeyCode::Char('x'), KeyModifiers::NONE).unwrap());
        assert_eq!(app.state, AppState::Matrix);
        assert!(app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL).unwrap());
        assert!(app.handle_key(KeyCode::Char('q'), KeyModifiers::NONE).unwrap());
    }

    #[test]
    fn renders_every_pane() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let mut app = App::new(&ctx, "alice").unwrap();
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|c| c.symbol()).collect();
        for pane in Pane::ALL {
            assert!(screen.contains(pane.title()), "missing pane {}", pane.title());
        }
        assert!(screen.contains("Stand-up"));
    }
}
