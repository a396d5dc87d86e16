use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use league_table::config::AppConfig;
use league_table::fixture;
use league_table::match_edit::MAX_SCORE;
use league_table::state::{
    AddMatchField, AppState, Delta, Form, MatchResult, ScoreSide, Screen, SortField,
    TeamField, apply_delta, sort_direction_label, sort_field_label,
};

struct App {
    state: AppState,
    should_quit: bool,
}

impl App {
    fn new(config: &AppConfig) -> Self {
        Self {
            state: AppState::with_config(config),
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.form.is_some() {
            self.on_form_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('a') => {
                if !self.state.loading {
                    self.state.start_add_match();
                }
            }
            KeyCode::Char('f') => {
                if let Some(id) = self.state.selected_team_id() {
                    apply_delta(&mut self.state, Delta::ToggleFavorite(id));
                }
            }
            _ => match self.state.screen {
                Screen::Table => self.on_table_key(key),
                Screen::TeamDetail { .. } => self.on_detail_key(key),
            },
        }
    }

    fn on_table_key(&mut self, key: KeyEvent) {
        let field = match key.code {
            KeyCode::Enter | KeyCode::Char('d') => {
                if let Some(id) = self.state.selected_team_id() {
                    self.state.open_team_detail(id);
                }
                return;
            }
            KeyCode::Char('1') => SortField::Position,
            KeyCode::Char('2') => SortField::Name,
            KeyCode::Char('3') => SortField::Points,
            KeyCode::Char('4') => SortField::Wins,
            KeyCode::Char('5') => SortField::Draws,
            KeyCode::Char('6') => SortField::Losses,
            KeyCode::Char('7') => SortField::GoalsFor,
            KeyCode::Char('8') => SortField::GoalsAgainst,
            _ => return,
        };
        self.state.toggle_sort(field);
    }

    fn on_detail_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('b') | KeyCode::Esc => self.state.back_to_table(),
            KeyCode::Char('e') | KeyCode::Enter => self.state.start_edit_result(),
            KeyCode::Char('c') => self.state.start_edit_team(),
            _ => {}
        }
    }

    fn on_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.state.cancel_form(),
            KeyCode::Enter => {
                if let Some(delta) = self.state.submit_form() {
                    apply_delta(&mut self.state, delta);
                }
            }
            KeyCode::Tab | KeyCode::Down => self.state.form_next_field(),
            KeyCode::Left => self.state.form_cycle_team(false),
            KeyCode::Right => self.state.form_cycle_team(true),
            KeyCode::Backspace => self.state.form_backspace(),
            KeyCode::Char(c) => self.state.form_input_char(c),
            _ => {}
        }
    }
}

fn init_tracing(config: &AppConfig) -> Result<()> {
    let log_file = std::fs::File::create(&config.log_file)
        .with_context(|| format!("failed to create log file {}", config.log_file.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(config.log_filter.as_str())
        .with_ansi(false)
        .with_writer(log_file)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    AppConfig::load_env_files();
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = AppConfig::from_env().with_args(&args);
    init_tracing(&config)?;
    tracing::info!(fixture = %config.fixture, "starting league table");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let mut app = App::new(&config);
    let event_tx = tx.clone();
    app.state.league.subscribe(move |event| {
        let _ = event_tx.send(Delta::Log(format!("[INFO] {event}")));
    });
    fixture::spawn_fixture_loader(config.fixture.clone(), tx);

    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "ui loop failed");
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        app.state.maybe_clear_notices(Instant::now());

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    if app.state.loading {
        let loading = Paragraph::new("Loading league data...")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(loading, chunks[1]);
    } else {
        match app.state.screen {
            Screen::Table => render_table(frame, chunks[1], &app.state),
            Screen::TeamDetail { .. } => render_team_detail(frame, chunks[1], &app.state),
        }
    }

    let console = Paragraph::new(console_text(&app.state, chunks[2].height.saturating_sub(2)))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state));
    frame.render_widget(footer, chunks[3]);

    if let Some(form) = &app.state.form {
        render_form(frame, frame.size(), &app.state, form);
    }
    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let title = match &state.screen {
        Screen::Table => format!(
            "LEAGUE TABLE | Sort: {} {}",
            sort_field_label(state.sort_field),
            sort_direction_label(state.sort_direction)
        ),
        Screen::TeamDetail { .. } => match state.selected_team() {
            Some(team) => format!("{} | #{}", team.profile.name, team.position),
            None => "TEAM".to_string(),
        },
    };
    let favorite = state
        .favorite_team()
        .map(|t| format!("★ {}", t.profile.name))
        .unwrap_or_default();
    let notice = if state.is_success_visible() {
        "Saved"
    } else {
        ""
    };
    format!("  {title}\n  {favorite}  {notice}")
}

fn footer_text(state: &AppState) -> String {
    if state.form.is_some() {
        return "Tab Next field | ←/→ Team | 0-9 Score | Enter Save | Esc Cancel".to_string();
    }
    match state.screen {
        Screen::Table => {
            "Enter/d Team | j/k Move | 1-8 Sort | f Favorite | a Add match | ? Help | q Quit"
                .to_string()
        }
        Screen::TeamDetail { .. } => {
            "b/Esc Back | j/k Move | e Edit result | c Edit team | f Favorite | a Add match | q Quit"
                .to_string()
        }
    }
}

fn table_columns() -> [Constraint; 11] {
    [
        Constraint::Length(4),
        Constraint::Min(18),
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(4),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(11),
    ]
}

fn render_table(frame: &mut Frame, area: Rect, state: &AppState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let widths = table_columns();
    let header_style = Style::default().add_modifier(Modifier::BOLD);
    let header_cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(sections[0]);
    let labels = ["#", "Team", "P", "W", "D", "L", "GF", "GA", "GD", "Pts", "Form"];
    for (col, label) in header_cols.iter().zip(labels) {
        render_cell_text(frame, *col, label, header_style);
    }

    let list_area = sections[1];
    let rows = state.sorted_teams();
    if rows.is_empty() {
        let empty =
            Paragraph::new("No teams loaded").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }

    let visible = list_area.height as usize;
    let (start, end) = visible_range(state.selected, rows.len(), visible);
    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let team = rows[idx];
        let selected = idx == state.selected;
        let mut style = if selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        if state.favorite_team_id == Some(team.profile.id) {
            style = style.fg(Color::Yellow);
        }
        if selected {
            frame.render_widget(Block::default().style(style), row_area);
        }

        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);
        let cells = [
            team.position.to_string(),
            team.profile.name.clone(),
            team.played().to_string(),
            team.stats.wins.to_string(),
            team.stats.draws.to_string(),
            team.stats.losses.to_string(),
            team.stats.goals_for.to_string(),
            team.stats.goals_against.to_string(),
            format!("{:+}", team.goal_difference()),
            team.stats.points.to_string(),
            form_text(&team.stats.recent_form),
        ];
        for (col, text) in cols.iter().zip(cells.iter()) {
            render_cell_text(frame, *col, text, style);
        }
    }
}

fn form_text(form: &[MatchResult]) -> String {
    form.iter()
        .map(|r| r.symbol())
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_team_detail(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(team) = state.selected_team() else {
        let empty = Paragraph::new("Team not found").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(30)])
        .split(area);

    let mut lines = vec![
        format!("Founded: {}", team.profile.founded),
        format!("Stadium: {}", team.profile.stadium),
        format!("Coach:   {}", team.profile.coach),
        String::new(),
        format!("Position: {}", team.position),
        format!("Points:   {}", team.stats.points),
        format!(
            "W-D-L:    {}-{}-{}",
            team.stats.wins, team.stats.draws, team.stats.losses
        ),
        format!(
            "Goals:    {}:{} ({:+})",
            team.stats.goals_for,
            team.stats.goals_against,
            team.goal_difference()
        ),
        format!("Form:     {}", form_text(&team.stats.recent_form)),
        String::new(),
        "Key players:".to_string(),
    ];
    lines.extend(team.profile.key_players.iter().map(|p| format!("  {p}")));
    let profile = Paragraph::new(lines.join("\n"))
        .block(Block::default().title("Team").borders(Borders::ALL));
    frame.render_widget(profile, columns[0]);

    let block = Block::default().title("Matches").borders(Borders::ALL);
    let inner = block.inner(columns[1]);
    frame.render_widget(block, columns[1]);
    if state.team_matches.is_empty() {
        frame.render_widget(Paragraph::new("No matches played"), inner);
        return;
    }

    let visible = inner.height as usize;
    let (start, end) = visible_range(state.match_selected, state.team_matches.len(), visible);
    for (i, idx) in (start..end).enumerate() {
        let m = &state.team_matches[idx];
        let row_area = Rect {
            x: inner.x,
            y: inner.y + i as u16,
            width: inner.width,
            height: 1,
        };
        let color = match m.result {
            MatchResult::Win => Color::Green,
            MatchResult::Draw => Color::Gray,
            MatchResult::Loss => Color::Red,
        };
        let mut style = Style::default().fg(color);
        if idx == state.match_selected {
            style = style.bg(Color::DarkGray);
        }
        let venue = if m.is_home { "H" } else { "A" };
        let text = format!(
            "{} {} {} {}-{} {} [{}]",
            m.date,
            venue,
            m.home_team,
            m.home_score,
            m.away_score,
            m.away_team,
            m.result.symbol()
        );
        frame.render_widget(Paragraph::new(text).style(style), row_area);
    }
}

fn render_form(frame: &mut Frame, area: Rect, state: &AppState, form: &Form) {
    let popup_area = centered_rect(50, 40, area);
    frame.render_widget(Clear, popup_area);

    let marker = |focused: bool| if focused { ">" } else { " " };
    let (title, lines) = match form {
        Form::EditResult(f) => {
            let home = state
                .league
                .match_by_id(f.match_id)
                .and_then(|m| state.league.team(m.home_team_id))
                .map(|t| t.profile.name.clone())
                .unwrap_or_default();
            let away = state
                .league
                .match_by_id(f.match_id)
                .and_then(|m| state.league.team(m.away_team_id))
                .map(|t| t.profile.name.clone())
                .unwrap_or_default();
            (
                "Edit result",
                vec![
                    format!("{} {home}: {}", marker(f.focus == ScoreSide::Home), f.home_score),
                    format!("{} {away}: {}", marker(f.focus == ScoreSide::Away), f.away_score),
                    format!("Scores 0-{MAX_SCORE}"),
                ],
            )
        }
        Form::AddMatch(f) => {
            let name = |id: Option<u32>| {
                id.and_then(|id| state.league.team(id))
                    .map(|t| t.profile.name.clone())
                    .unwrap_or_else(|| "(select)".to_string())
            };
            (
                "Add match",
                vec![
                    format!(
                        "{} Home:  {}",
                        marker(f.focus == AddMatchField::HomeTeam),
                        name(f.home_team_id)
                    ),
                    format!(
                        "{} Away:  {}",
                        marker(f.focus == AddMatchField::AwayTeam),
                        name(f.away_team_id)
                    ),
                    format!(
                        "{} Home score: {}",
                        marker(f.focus == AddMatchField::HomeScore),
                        f.home_score
                    ),
                    format!(
                        "{} Away score: {}",
                        marker(f.focus == AddMatchField::AwayScore),
                        f.away_score
                    ),
                    format!("{} Date:  {}", marker(f.focus == AddMatchField::Date), f.date),
                ],
            )
        }
        Form::EditTeam(f) => (
            "Edit team",
            vec![
                format!("{} Coach:   {}", marker(f.focus == TeamField::Coach), f.coach),
                format!("{} Stadium: {}", marker(f.focus == TeamField::Stadium), f.stadium),
            ],
        ),
    };

    let border = if state.is_form_error_visible() {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    let popup = Paragraph::new(lines.join("\n")).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border),
    );
    frame.render_widget(popup, popup_area);
}

fn console_text(state: &AppState, lines: u16) -> String {
    let take = lines as usize;
    let skip = state.logs.len().saturating_sub(take);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    if area.width == 0 || area.height == 0 {
        return;
    }
    frame.render_widget(Paragraph::new(text.to_string()).style(style), area);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 || visible == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }
    let half = visible / 2;
    let start = selected.saturating_sub(half).min(total - visible);
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "League Table - Help",
        "",
        "Table:",
        "  j/k or ↑/↓   Move",
        "  Enter / d    Team details",
        "  1-8          Sort by #, team, pts, W, D, L, GF, GA",
        "               (again to flip direction)",
        "  f            Toggle favorite",
        "  a            Add match",
        "",
        "Team:",
        "  e / Enter    Edit selected result",
        "  c            Edit coach / stadium",
        "  b / Esc      Back",
        "",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
