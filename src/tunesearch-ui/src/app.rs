use std::io::stdout;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use thiserror::Error;
use tunesearch_core::SearchResultItem;
use tunesearch_player::{
    PlayOutcome, PreviewPlayer, SearchController, SearchPhase, SearchState, SearchStatus,
};

use crate::help::HelpContent;
use crate::theme::Theme;

const MIN_WIDTH: u16 = 40;
const MIN_HEIGHT: u16 = 10;
const HELP_WIDTH: u16 = 70;
const HELP_HEIGHT: u16 = 80;
const TICK_RATE: Duration = Duration::from_millis(50);

pub struct UiContext {
    pub controller: SearchController,
    pub player: PreviewPlayer,
    pub theme: Theme,
}

#[derive(Debug, Error)]
pub enum UiError {
    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self, UiError> {
        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), LeaveAlternateScreen);
    }
}

/// Runs the search screen until the user quits.
///
/// Must be called from inside a tokio runtime context, since searches are
/// spawned as tasks. The preview player is disposed before this returns,
/// whichever way the loop ends.
pub fn run_ui(context: UiContext) -> Result<(), UiError> {
    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let mut screen = SearchScreen::new(context.controller, context.player, context.theme);
    let result = event_loop(&mut terminal, &mut screen);
    screen.dispose();
    tracing::info!("search screen closed");
    result
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    screen: &mut SearchScreen,
) -> Result<(), UiError> {
    loop {
        screen.tick();
        terminal.draw(|frame| screen.render(frame))?;

        if event::poll(TICK_RATE)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && screen.handle_key(key) {
                    return Ok(());
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Editing,
    Browsing,
}

/// The one screen of the app: a query box over a result list.
///
/// Renders the controller's latest snapshot and forwards user actions to the
/// controller (search) and the preview player (play/stop). Owns the player,
/// so dropping the screen releases any playing preview.
pub struct SearchScreen {
    controller: SearchController,
    player: PreviewPlayer,
    theme: Theme,
    help: HelpContent,
    state: SearchState,
    input: String,
    mode: Mode,
    selected: usize,
    notice: Option<String>,
    show_help: bool,
}

impl SearchScreen {
    pub fn new(controller: SearchController, player: PreviewPlayer, theme: Theme) -> Self {
        let state = controller.snapshot();
        Self {
            controller,
            player,
            help: HelpContent::new(&theme),
            theme,
            state,
            input: String::new(),
            mode: Mode::Editing,
            selected: 0,
            notice: None,
            show_help: false,
        }
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn active_preview(&self) -> Option<&str> {
        self.player.active_url()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Pulls the latest controller snapshot and releases finished previews.
    pub fn tick(&mut self) {
        let state = self.controller.snapshot();
        if state.status() == SearchStatus::Loading || state.query() != self.state.query() {
            self.selected = 0;
        }
        self.selected = self
            .selected
            .min(state.items().len().saturating_sub(1));
        self.state = state;

        if self.player.reap_finished() {
            tracing::debug!("preview finished");
        }
    }

    pub fn dispose(&mut self) {
        self.player.dispose();
    }

    /// Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        if self.show_help {
            if matches!(
                key.code,
                KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc
            ) {
                self.show_help = false;
            }
            return false;
        }

        match self.mode {
            Mode::Editing => {
                self.handle_editing_key(key);
                false
            }
            Mode::Browsing => self.handle_browsing_key(key),
        }
    }

    fn handle_editing_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.submit(),
            KeyCode::Esc | KeyCode::Tab => self.mode = Mode::Browsing,
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn handle_browsing_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Char('/') | KeyCode::Char('i') | KeyCode::Tab => self.mode = Mode::Editing,
            KeyCode::Char('j') | KeyCode::Down => self.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.select_previous(),
            KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Enter => self.toggle_selected(),
            KeyCode::Char('s') => {
                self.player.stop();
                self.notice = None;
            }
            _ => {}
        }
        false
    }

    fn submit(&mut self) {
        // blank input stays in the box; the controller ignores it
        if self.controller.submit(&self.input).is_none() {
            return;
        }
        self.mode = Mode::Browsing;
        self.notice = None;
        self.tick();
    }

    fn select_next(&mut self) {
        let len = self.state.items().len();
        if len > 0 {
            self.selected = (self.selected + 1) % len;
        }
    }

    fn select_previous(&mut self) {
        let len = self.state.items().len();
        if len > 0 {
            self.selected = (self.selected + len - 1) % len;
        }
    }

    fn toggle_selected(&mut self) {
        let Some(item) = self.state.items().get(self.selected) else {
            return;
        };
        if !item.has_preview() {
            self.notice = Some(format!("No preview for \"{}\"", item.track_name()));
            return;
        }

        self.notice = match self.player.play(item.preview_url()) {
            PlayOutcome::Started | PlayOutcome::Stopped => None,
            PlayOutcome::Failed(err) => Some(err.to_string()),
        };
    }

    fn now_playing(&self) -> Option<String> {
        let url = self.player.active_url()?;
        let title = self
            .state
            .items()
            .iter()
            .find(|item| item.preview_url() == url)
            .map(|item| format!("{} - {}", item.artist_name(), item.track_name()))
            .unwrap_or_else(|| url.to_string());
        Some(title)
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.size();
        if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
            let message = format!(
                "Resize terminal to at least {MIN_WIDTH}x{MIN_HEIGHT} (current: {}x{})",
                area.width, area.height
            );
            let paragraph = Paragraph::new(message)
                .wrap(Wrap { trim: true })
                .block(Block::default().title("Tunesearch").borders(Borders::ALL));
            frame.render_widget(paragraph, area);
            return;
        }

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_input(frame, layout[0]);
        self.render_results(frame, layout[1]);
        self.render_footer(frame, layout[2]);

        if self.show_help {
            self.render_help(frame, area);
        }
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let editing = self.mode == Mode::Editing;
        let (title, border) = if editing {
            ("Search (Enter to submit)", self.theme.accent())
        } else {
            ("Search (/ to edit)", Style::default())
        };
        let input = Paragraph::new(self.input.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(border),
        );
        frame.render_widget(input, area);

        if editing {
            let max_x = area.x + area.width.saturating_sub(2);
            let x = (area.x + 1).saturating_add(self.input.chars().count() as u16);
            frame.set_cursor(x.min(max_x), area.y + 1);
        }
    }

    fn render_results(&self, frame: &mut Frame, area: Rect) {
        let title = match self.state.phase() {
            SearchPhase::Idle => "Results".to_string(),
            SearchPhase::Success { items } => {
                format!("Results for \"{}\" ({})", self.state.query(), items.len())
            }
            _ => format!("Results for \"{}\"", self.state.query()),
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        let message = match self.state.phase() {
            SearchPhase::Idle => Paragraph::new(Line::styled(
                "Type a query and press Enter to search the catalog.",
                self.theme.muted(),
            )),
            SearchPhase::Loading => Paragraph::new("Loading..."),
            SearchPhase::Error { message } => {
                Paragraph::new(Line::styled(message.clone(), self.theme.error()))
            }
            SearchPhase::Success { items } if items.is_empty() => {
                Paragraph::new("No results found")
            }
            SearchPhase::Success { items } => {
                let rows: Vec<ListItem> = items
                    .iter()
                    .map(|item| {
                        result_row(item, self.player.is_playing(item.preview_url()), &self.theme)
                    })
                    .collect();
                let list = List::new(rows)
                    .block(block)
                    .highlight_style(self.theme.highlight())
                    .highlight_symbol("▸");
                let mut state = ListState::default();
                if self.mode == Mode::Browsing {
                    state.select(Some(self.selected));
                }
                frame.render_stateful_widget(list, area, &mut state);
                return;
            }
        };
        frame.render_widget(message.block(block).wrap(Wrap { trim: true }), area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let line = if let Some(notice) = &self.notice {
            Line::styled(notice.clone(), self.theme.error())
        } else if let Some(title) = self.now_playing() {
            Line::from(vec![
                Span::styled("■ ", self.theme.playing()),
                Span::raw(title),
            ])
        } else {
            let hints = match self.mode {
                Mode::Editing => "Enter search  Esc results  Ctrl+C quit",
                Mode::Browsing => "Space play/stop  / edit  ? help  q quit",
            };
            Line::styled(hints, self.theme.muted())
        };

        let footer =
            Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Preview"));
        frame.render_widget(footer, area);
    }

    fn render_help(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(HELP_WIDTH, HELP_HEIGHT, area);
        let help = Paragraph::new(self.help.text())
            .block(
                Block::default()
                    .title("Help (press ? to close)")
                    .borders(Borders::ALL),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(Clear, popup_area);
        frame.render_widget(help, popup_area);
    }
}

impl Drop for SearchScreen {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn result_row(item: &SearchResultItem, playing: bool, theme: &Theme) -> ListItem<'static> {
    let marker = if !item.has_preview() {
        Span::styled(" · ", theme.muted())
    } else if playing {
        Span::styled(" ■ ", theme.playing())
    } else {
        Span::raw(" ▶ ")
    };
    let header = Line::from(vec![
        marker,
        Span::styled(
            item.artist_name().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  [{}]", item.kind()), theme.muted()),
    ]);
    let detail = Line::from(vec![
        Span::raw("   "),
        Span::raw(item.track_name().to_string()),
        Span::styled(format!(" · {}", item.genre_name()), theme.muted()),
    ]);
    ListItem::new(vec![header, detail])
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1])[1]
}
