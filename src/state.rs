use std::cmp::Ordering;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::AppConfig;
use crate::fixture::Fixture;
use crate::league::League;
use crate::match_edit::{self, DEFAULT_MATCH_DATE, EditError, MAX_SCORE};
use crate::persist;
use crate::standings::{self, TieBreak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "L")]
    Loss,
}

impl MatchResult {
    pub fn symbol(self) -> &'static str {
        match self {
            MatchResult::Win => "W",
            MatchResult::Draw => "D",
            MatchResult::Loss => "L",
        }
    }
}

/// Fields owned by the fixture and the edit forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamProfile {
    pub id: u32,
    pub name: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub founded: String,
    #[serde(default)]
    pub stadium: String,
    #[serde(default)]
    pub coach: String,
    #[serde(default)]
    pub key_players: Vec<String>,
}

/// Fields produced by aggregation; replaced wholesale on every recompute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStats {
    pub points: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    /// Oldest to newest, at most five entries.
    pub recent_form: Vec<MatchResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    #[serde(flatten)]
    pub profile: TeamProfile,
    pub position: u32,
    #[serde(flatten)]
    pub stats: TeamStats,
}

impl Team {
    pub fn played(&self) -> u32 {
        self.stats.wins + self.stats.draws + self.stats.losses
    }

    pub fn goal_difference(&self) -> i64 {
        i64::from(self.stats.goals_for) - i64::from(self.stats.goals_against)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: u32,
    pub date: String,
    pub home_team_id: u32,
    pub away_team_id: u32,
    pub home_score: u8,
    pub away_score: u8,
}

/// A submitted add-match form. Teams are optional until chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMatch {
    pub date: String,
    pub home_team_id: Option<u32>,
    pub away_team_id: Option<u32>,
    pub home_score: u8,
    pub away_score: u8,
}

/// A match as seen from one team, for detail screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedMatch {
    pub id: u32,
    pub date: String,
    pub home_team: String,
    pub away_team: String,
    pub home_score: u8,
    pub away_score: u8,
    pub result: MatchResult,
    pub is_home: bool,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Table,
    TeamDetail { team_id: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Position,
    Name,
    Points,
    Wins,
    Draws,
    Losses,
    GoalsFor,
    GoalsAgainst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreSide {
    Home,
    Away,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreForm {
    pub match_id: u32,
    pub home_score: u8,
    pub away_score: u8,
    pub focus: ScoreSide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddMatchField {
    HomeTeam,
    AwayTeam,
    HomeScore,
    AwayScore,
    Date,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddMatchForm {
    pub home_team_id: Option<u32>,
    pub away_team_id: Option<u32>,
    pub home_score: u8,
    pub away_score: u8,
    pub date: String,
    pub focus: AddMatchField,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamField {
    Coach,
    Stadium,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamDetailsForm {
    pub team_id: u32,
    pub coach: String,
    pub stadium: String,
    pub focus: TeamField,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Form {
    EditResult(ScoreForm),
    AddMatch(AddMatchForm),
    EditTeam(TeamDetailsForm),
}

#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub league: League,
    pub loading: bool,
    pub initial_tie_break: TieBreak,
    pub selected: usize,
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub team_matches: Vec<FormattedMatch>,
    pub match_selected: usize,
    pub form: Option<Form>,
    pub notice_duration: Duration,
    pub success_until: Option<Instant>,
    pub form_error_until: Option<Instant>,
    pub favorite_team_id: Option<u32>,
    pub favorite_path: Option<PathBuf>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

const FORM_ERROR_FLASH: Duration = Duration::from_millis(500);

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Table,
            league: League::new(),
            loading: true,
            initial_tie_break: TieBreak::Full,
            selected: 0,
            sort_field: SortField::Position,
            sort_direction: SortDirection::Asc,
            team_matches: Vec::new(),
            match_selected: 0,
            form: None,
            notice_duration: Duration::from_secs(3),
            success_until: None,
            form_error_until: None,
            favorite_team_id: None,
            favorite_path: None,
            logs: VecDeque::with_capacity(200),
            help_overlay: false,
        }
    }

    pub fn with_config(config: &AppConfig) -> Self {
        let favorite_path = persist::favorite_path();
        let favorite_team_id = favorite_path
            .as_deref()
            .and_then(persist::load_favorite_from);
        Self {
            initial_tie_break: config.initial_tie_break,
            notice_duration: config.notice,
            favorite_team_id,
            favorite_path,
            ..Self::new()
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn teams(&self) -> &[Team] {
        self.league.teams()
    }

    /// Ranked teams re-ordered by the user's column sort.
    pub fn sorted_teams(&self) -> Vec<&Team> {
        sort_table(self.league.teams(), self.sort_field, self.sort_direction)
    }

    pub fn toggle_sort(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_direction = match self.sort_direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
        } else {
            self.sort_field = field;
            self.sort_direction = SortDirection::Asc;
        }
    }

    pub fn selected_team(&self) -> Option<&Team> {
        match &self.screen {
            Screen::TeamDetail { team_id } => self.league.team(*team_id),
            Screen::Table => self.sorted_teams().get(self.selected).copied(),
        }
    }

    pub fn selected_team_id(&self) -> Option<u32> {
        self.selected_team().map(|t| t.profile.id)
    }

    pub fn route_team_id(&self) -> Option<u32> {
        match &self.screen {
            Screen::TeamDetail { team_id } => Some(*team_id),
            Screen::Table => None,
        }
    }

    pub fn select_next(&mut self) {
        match self.screen {
            Screen::Table => {
                let total = self.league.teams().len();
                if total > 0 {
                    self.selected = (self.selected + 1).min(total - 1);
                }
            }
            Screen::TeamDetail { .. } => {
                let total = self.team_matches.len();
                if total > 0 {
                    self.match_selected = (self.match_selected + 1).min(total - 1);
                }
            }
        }
    }

    pub fn select_prev(&mut self) {
        match self.screen {
            Screen::Table => self.selected = self.selected.saturating_sub(1),
            Screen::TeamDetail { .. } => {
                self.match_selected = self.match_selected.saturating_sub(1)
            }
        }
    }

    pub fn open_team_detail(&mut self, team_id: u32) {
        if self.league.team(team_id).is_none() {
            self.push_log(format!("[WARN] No team with id {team_id}"));
            return;
        }
        self.screen = Screen::TeamDetail { team_id };
        self.refresh_team_matches();
        self.match_selected = 0;
    }

    pub fn back_to_table(&mut self) {
        self.screen = Screen::Table;
        self.team_matches.clear();
        self.match_selected = 0;
        self.form = None;
    }

    pub fn refresh_team_matches(&mut self) {
        self.team_matches = match self.route_team_id() {
            Some(team_id) => self.league.team_matches(team_id, None),
            None => Vec::new(),
        };
        if self.match_selected >= self.team_matches.len() {
            self.match_selected = self.team_matches.len().saturating_sub(1);
        }
    }

    pub fn selected_formatted_match(&self) -> Option<&FormattedMatch> {
        self.team_matches.get(self.match_selected)
    }

    pub fn favorite_team(&self) -> Option<&Team> {
        self.favorite_team_id.and_then(|id| self.league.team(id))
    }

    pub fn toggle_favorite(&mut self, team_id: u32) {
        self.favorite_team_id = if self.favorite_team_id == Some(team_id) {
            None
        } else {
            Some(team_id)
        };
        if let Some(path) = self.favorite_path.clone()
            && let Err(err) = persist::save_favorite_to(&path, self.favorite_team_id)
        {
            tracing::warn!(error = %err, "failed to save favorite team");
            self.push_log(format!("[WARN] Favorite not saved: {err:#}"));
        }
    }

    pub fn start_edit_result(&mut self) {
        let form = self.selected_formatted_match().map(|m| ScoreForm {
            match_id: m.id,
            home_score: m.home_score,
            away_score: m.away_score,
            focus: ScoreSide::Home,
        });
        match form {
            Some(form) => self.form = Some(Form::EditResult(form)),
            None => self.push_log("[INFO] No match selected"),
        }
    }

    pub fn start_add_match(&mut self) {
        let date = self
            .league
            .last_match_date()
            .unwrap_or(DEFAULT_MATCH_DATE)
            .to_string();
        // Opened from a team page, that team is preselected as home.
        let home_team_id = self.route_team_id();
        self.form = Some(Form::AddMatch(AddMatchForm {
            home_team_id,
            away_team_id: None,
            home_score: 0,
            away_score: 0,
            date,
            focus: AddMatchField::HomeTeam,
        }));
    }

    pub fn start_edit_team(&mut self) {
        let form = self
            .route_team_id()
            .and_then(|id| self.league.team(id))
            .map(|team| TeamDetailsForm {
                team_id: team.profile.id,
                coach: team.profile.coach.clone(),
                stadium: team.profile.stadium.clone(),
                focus: TeamField::Coach,
            });
        if let Some(form) = form {
            self.form = Some(Form::EditTeam(form));
        }
    }

    pub fn cancel_form(&mut self) {
        self.form = None;
        self.form_error_until = None;
    }

    pub fn form_next_field(&mut self) {
        match &mut self.form {
            Some(Form::EditResult(f)) => {
                f.focus = match f.focus {
                    ScoreSide::Home => ScoreSide::Away,
                    ScoreSide::Away => ScoreSide::Home,
                }
            }
            Some(Form::AddMatch(f)) => {
                f.focus = match f.focus {
                    AddMatchField::HomeTeam => AddMatchField::AwayTeam,
                    AddMatchField::AwayTeam => AddMatchField::HomeScore,
                    AddMatchField::HomeScore => AddMatchField::AwayScore,
                    AddMatchField::AwayScore => AddMatchField::Date,
                    AddMatchField::Date => AddMatchField::HomeTeam,
                }
            }
            Some(Form::EditTeam(f)) => {
                f.focus = match f.focus {
                    TeamField::Coach => TeamField::Stadium,
                    TeamField::Stadium => TeamField::Coach,
                }
            }
            None => {}
        }
    }

    /// Typed character into the focused field. Score fields take one digit.
    pub fn form_input_char(&mut self, c: char) {
        match &mut self.form {
            Some(Form::EditResult(f)) => {
                if let Some(d) = c.to_digit(10) {
                    let score = d as u8;
                    match f.focus {
                        ScoreSide::Home => f.home_score = score,
                        ScoreSide::Away => f.away_score = score,
                    }
                }
            }
            Some(Form::AddMatch(f)) => match f.focus {
                AddMatchField::HomeScore | AddMatchField::AwayScore => {
                    if let Some(d) = c.to_digit(10) {
                        let score = (d as u8).min(MAX_SCORE);
                        if f.focus == AddMatchField::HomeScore {
                            f.home_score = score;
                        } else {
                            f.away_score = score;
                        }
                    }
                }
                AddMatchField::Date => {
                    if c.is_ascii_digit() || c == '-' {
                        f.date.push(c);
                    }
                }
                AddMatchField::HomeTeam | AddMatchField::AwayTeam => {}
            },
            Some(Form::EditTeam(f)) => match f.focus {
                TeamField::Coach => f.coach.push(c),
                TeamField::Stadium => f.stadium.push(c),
            },
            None => {}
        }
    }

    pub fn form_backspace(&mut self) {
        match &mut self.form {
            Some(Form::AddMatch(f)) if f.focus == AddMatchField::Date => {
                f.date.pop();
            }
            Some(Form::EditTeam(f)) => {
                match f.focus {
                    TeamField::Coach => f.coach.pop(),
                    TeamField::Stadium => f.stadium.pop(),
                };
            }
            _ => {}
        }
    }

    /// Step the focused team picker through the table order.
    pub fn form_cycle_team(&mut self, forward: bool) {
        let ids: Vec<u32> = self.league.teams().iter().map(|t| t.profile.id).collect();
        let Some(Form::AddMatch(f)) = &mut self.form else {
            return;
        };
        let slot = match f.focus {
            AddMatchField::HomeTeam => &mut f.home_team_id,
            AddMatchField::AwayTeam => &mut f.away_team_id,
            _ => return,
        };
        *slot = cycle_id(&ids, *slot, forward);
    }

    /// Turn the open form into the delta that applies it.
    pub fn submit_form(&self) -> Option<Delta> {
        match self.form.as_ref()? {
            Form::EditResult(f) => Some(Delta::EditMatchResult {
                match_id: f.match_id,
                home_score: f.home_score,
                away_score: f.away_score,
            }),
            Form::AddMatch(f) => Some(Delta::AddMatch(NewMatch {
                date: f.date.trim().to_string(),
                home_team_id: f.home_team_id,
                away_team_id: f.away_team_id,
                home_score: f.home_score,
                away_score: f.away_score,
            })),
            Form::EditTeam(f) => Some(Delta::EditTeamDetails {
                team_id: f.team_id,
                coach: f.coach.clone(),
                stadium: f.stadium.clone(),
            }),
        }
    }

    fn notify_success(&mut self) {
        self.success_until = Some(Instant::now() + self.notice_duration);
    }

    fn flash_form_error(&mut self) {
        self.form_error_until = Some(Instant::now() + FORM_ERROR_FLASH);
    }

    pub fn is_success_visible(&self) -> bool {
        self.success_until.is_some()
    }

    pub fn is_form_error_visible(&self) -> bool {
        self.form_error_until.is_some()
    }

    pub fn maybe_clear_notices(&mut self, now: Instant) {
        if self.success_until.is_some_and(|until| now >= until) {
            self.success_until = None;
        }
        if self.form_error_until.is_some_and(|until| now >= until) {
            self.form_error_until = None;
        }
    }

    fn clamp_selection(&mut self) {
        let total = self.league.teams().len();
        self.selected = self.selected.min(total.saturating_sub(1));
    }

    fn reject_form(&mut self, err: EditError) {
        tracing::warn!(error = %err, "edit rejected");
        self.push_log(format!("[WARN] {err}"));
        self.flash_form_error();
        if !err.is_recoverable() {
            self.form = None;
        }
    }
}

fn cycle_id(ids: &[u32], current: Option<u32>, forward: bool) -> Option<u32> {
    if ids.is_empty() {
        return None;
    }
    let pos = current.and_then(|id| ids.iter().position(|x| *x == id));
    let next = match (pos, forward) {
        (None, true) => 0,
        (None, false) => ids.len() - 1,
        (Some(i), true) => (i + 1) % ids.len(),
        (Some(i), false) => (i + ids.len() - 1) % ids.len(),
    };
    ids.get(next).copied()
}

/// Stable column sort for display. Descending flips the comparison, so ties
/// keep their ranked order either way.
pub fn sort_table(teams: &[Team], field: SortField, direction: SortDirection) -> Vec<&Team> {
    let mut rows: Vec<&Team> = teams.iter().collect();
    rows.sort_by(|a, b| {
        let ord = compare_field(a, b, field);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    rows
}

fn compare_field(a: &Team, b: &Team, field: SortField) -> Ordering {
    match field {
        SortField::Position => a.position.cmp(&b.position),
        SortField::Name => standings::compare_names(&a.profile.name, &b.profile.name),
        SortField::Points => a.stats.points.cmp(&b.stats.points),
        SortField::Wins => a.stats.wins.cmp(&b.stats.wins),
        SortField::Draws => a.stats.draws.cmp(&b.stats.draws),
        SortField::Losses => a.stats.losses.cmp(&b.stats.losses),
        SortField::GoalsFor => a.stats.goals_for.cmp(&b.stats.goals_for),
        SortField::GoalsAgainst => a.stats.goals_against.cmp(&b.stats.goals_against),
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetFixture(Fixture),
    FixtureFailed(String),
    EditMatchResult {
        match_id: u32,
        home_score: u8,
        away_score: u8,
    },
    AddMatch(NewMatch),
    EditTeamDetails {
        team_id: u32,
        coach: String,
        stadium: String,
    },
    ToggleFavorite(u32),
    Log(String),
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetFixture(fixture) => {
            let Fixture { teams, matches } = fixture;
            state.league.load(teams, matches, state.initial_tie_break);
            state.loading = false;
            state.clamp_selection();
            if state.route_team_id().is_some() {
                state.refresh_team_matches();
            }
            let teams = state.league.teams().len();
            let matches = state.league.matches().len();
            state.push_log(format!("[INFO] Loaded {teams} teams, {matches} matches"));
        }
        Delta::FixtureFailed(err) => {
            tracing::warn!(error = %err, "fixture load failed");
            state.league.load(Vec::new(), Vec::new(), state.initial_tie_break);
            state.loading = false;
            state.selected = 0;
            state.push_log(format!("[WARN] Fixture load failed: {err}"));
        }
        Delta::EditMatchResult {
            match_id,
            home_score,
            away_score,
        } => match state.league.edit_match_result(match_id, home_score, away_score) {
            Ok(true) => {
                match_edit::reconcile_formatted(
                    &mut state.team_matches,
                    match_id,
                    home_score,
                    away_score,
                );
                state.clamp_selection();
                state.notify_success();
                state.form = None;
            }
            Ok(false) => {
                state.push_log(format!("[INFO] Match #{match_id} not found"));
                state.form = None;
            }
            Err(err) => state.reject_form(err),
        },
        Delta::AddMatch(new) => match state.league.add_match(new) {
            Ok(id) => {
                state.refresh_team_matches();
                state.clamp_selection();
                state.form = None;
                state.push_log(format!("[INFO] Match #{id} added"));
            }
            Err(err) => state.reject_form(err),
        },
        Delta::EditTeamDetails {
            team_id,
            coach,
            stadium,
        } => {
            if state.league.edit_team_details(team_id, &coach, &stadium) {
                state.notify_success();
            } else {
                state.push_log(format!("[WARN] No team with id {team_id}"));
            }
            state.form = None;
        }
        Delta::ToggleFavorite(team_id) => state.toggle_favorite(team_id),
        Delta::Log(msg) => state.push_log(msg),
    }
}

pub fn sort_field_label(field: SortField) -> &'static str {
    match field {
        SortField::Position => "POS",
        SortField::Name => "TEAM",
        SortField::Points => "PTS",
        SortField::Wins => "W",
        SortField::Draws => "D",
        SortField::Losses => "L",
        SortField::GoalsFor => "GF",
        SortField::GoalsAgainst => "GA",
    }
}

pub fn sort_direction_label(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    }
}
