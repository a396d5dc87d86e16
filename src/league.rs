use std::fmt;

use crate::match_edit::{self, EditError};
use crate::match_format::format_team_matches;
use crate::standings::{self, TieBreak};
use crate::state::{FormattedMatch, Match, NewMatch, Team, TeamProfile};

/// Published after every change to the authoritative lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeagueEvent {
    Loaded {
        teams: usize,
        matches: usize,
    },
    MatchResultEdited {
        match_id: u32,
        home_score: u8,
        away_score: u8,
    },
    MatchAdded {
        match_id: u32,
    },
    TeamDetailsEdited {
        team_id: u32,
    },
}

impl fmt::Display for LeagueEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeagueEvent::Loaded { teams, matches } => {
                write!(f, "Loaded {teams} teams / {matches} matches")
            }
            LeagueEvent::MatchResultEdited {
                match_id,
                home_score,
                away_score,
            } => write!(f, "Match #{match_id} result set to {home_score}-{away_score}"),
            LeagueEvent::MatchAdded { match_id } => write!(f, "Match #{match_id} added"),
            LeagueEvent::TeamDetailsEdited { team_id } => {
                write!(f, "Team #{team_id} details updated")
            }
        }
    }
}

type Subscriber = Box<dyn FnMut(&LeagueEvent) + Send>;

/// Authoritative team and match lists.
///
/// Team derived fields are only ever produced by the standings pipeline; every
/// mutation re-runs it over the full match list and swaps the team list whole.
#[derive(Default)]
pub struct League {
    teams: Vec<Team>,
    matches: Vec<Match>,
    subscribers: Vec<Subscriber>,
}

impl fmt::Debug for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("League")
            .field("teams", &self.teams.len())
            .field("matches", &self.matches.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl League {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a freshly loaded fixture and rank it.
    pub fn load(&mut self, teams: Vec<TeamProfile>, matches: Vec<Match>, tie_break: TieBreak) {
        self.teams = standings::compute_standings(&teams, &matches, tie_break);
        self.matches = matches;
        tracing::info!(
            teams = self.teams.len(),
            matches = self.matches.len(),
            ?tie_break,
            "league loaded"
        );
        self.publish(LeagueEvent::Loaded {
            teams: self.teams.len(),
            matches: self.matches.len(),
        });
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&LeagueEvent) + Send + 'static) {
        self.subscribers.push(Box::new(callback));
    }

    fn publish(&mut self, event: LeagueEvent) {
        for sub in &mut self.subscribers {
            sub(&event);
        }
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, team_id: u32) -> Option<&Team> {
        self.teams.iter().find(|t| t.profile.id == team_id)
    }

    pub fn replace_teams(&mut self, teams: Vec<Team>) {
        self.teams = teams;
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn match_by_id(&self, match_id: u32) -> Option<&Match> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    pub fn append_match(&mut self, m: Match) {
        self.matches.push(m);
    }

    /// Swap in a whole match record by id. False when no match has that id.
    pub fn replace_match(&mut self, m: Match) -> bool {
        match self.matches.iter_mut().find(|existing| existing.id == m.id) {
            Some(slot) => {
                *slot = m;
                true
            }
            None => false,
        }
    }

    pub fn next_match_id(&self) -> u32 {
        self.matches.iter().map(|m| m.id).max().unwrap_or(0) + 1
    }

    pub fn last_match_date(&self) -> Option<&str> {
        self.matches.last().map(|m| m.date.as_str())
    }

    /// Re-run the pipeline from the current static fields and match list.
    pub fn recompute(&mut self, tie_break: TieBreak) {
        let profiles: Vec<TeamProfile> = self.teams.iter().map(|t| t.profile.clone()).collect();
        let ranked = standings::compute_standings(&profiles, &self.matches, tie_break);
        self.replace_teams(ranked);
    }

    /// Correct the score of an existing match and re-rank.
    ///
    /// `Ok(false)` when no match has `match_id`; nothing is touched on `Err`.
    pub fn edit_match_result(
        &mut self,
        match_id: u32,
        home_score: u8,
        away_score: u8,
    ) -> Result<bool, EditError> {
        match_edit::validate_scores(home_score, away_score)?;

        let Some(existing) = self.match_by_id(match_id) else {
            return Ok(false);
        };
        let updated = Match {
            home_score,
            away_score,
            ..existing.clone()
        };
        self.replace_match(updated);
        self.recompute(TieBreak::Full);

        tracing::info!(match_id, home_score, away_score, "match result edited");
        self.publish(LeagueEvent::MatchResultEdited {
            match_id,
            home_score,
            away_score,
        });
        Ok(true)
    }

    /// Append a new match with the next id and re-rank. Returns the new id.
    pub fn add_match(&mut self, new: NewMatch) -> Result<u32, EditError> {
        let (home_team_id, away_team_id) = match_edit::validate_new_match(&self.teams, &new)?;
        let id = self.next_match_id();
        self.append_match(Match {
            id,
            date: new.date,
            home_team_id,
            away_team_id,
            home_score: new.home_score,
            away_score: new.away_score,
        });
        self.recompute(TieBreak::Full);

        tracing::info!(match_id = id, home_team_id, away_team_id, "match added");
        self.publish(LeagueEvent::MatchAdded { match_id: id });
        Ok(id)
    }

    /// Replace coach and stadium. Standings do not depend on them, so no re-rank.
    pub fn edit_team_details(&mut self, team_id: u32, coach: &str, stadium: &str) -> bool {
        let Some(team) = self.teams.iter_mut().find(|t| t.profile.id == team_id) else {
            return false;
        };
        team.profile.coach = coach.trim().to_string();
        team.profile.stadium = stadium.trim().to_string();

        tracing::info!(team_id, "team details edited");
        self.publish(LeagueEvent::TeamDetailsEdited { team_id });
        true
    }

    pub fn team_matches(&self, team_id: u32, limit: Option<usize>) -> Vec<FormattedMatch> {
        format_team_matches(team_id, &self.matches, &self.teams, limit)
    }
}
