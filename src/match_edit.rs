use thiserror::Error;

use crate::match_format::parse_match_date;
use crate::standings::outcome_for;
use crate::state::{FormattedMatch, NewMatch, Team};

/// Highest score accepted by the edit and add forms.
pub const MAX_SCORE: u8 = 7;

pub const DEFAULT_MATCH_DATE: &str = "2023-08-05";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Scores must be between 0 and 7 (got {home}-{away})")]
    ScoreOutOfRange { home: u8, away: u8 },

    #[error("Both home and away team must be selected")]
    TeamNotSelected,

    #[error("Unknown team id: {0}")]
    UnknownTeam(u32),

    #[error("A team cannot play itself (team id {0})")]
    SameTeam(u32),

    #[error("Invalid match date: {0:?}")]
    InvalidDate(String),
}

impl EditError {
    /// Errors the user can fix from the open form without starting over.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, EditError::UnknownTeam(_))
    }
}

pub fn validate_scores(home: u8, away: u8) -> Result<(), EditError> {
    if home > MAX_SCORE || away > MAX_SCORE {
        return Err(EditError::ScoreOutOfRange { home, away });
    }
    Ok(())
}

/// Check a submitted new match against the current team list.
/// Returns the resolved (home, away) ids.
pub fn validate_new_match(teams: &[Team], new: &NewMatch) -> Result<(u32, u32), EditError> {
    let (Some(home), Some(away)) = (new.home_team_id, new.away_team_id) else {
        return Err(EditError::TeamNotSelected);
    };
    if home == away {
        return Err(EditError::SameTeam(home));
    }
    for id in [home, away] {
        if !teams.iter().any(|t| t.profile.id == id) {
            return Err(EditError::UnknownTeam(id));
        }
    }
    validate_scores(new.home_score, new.away_score)?;
    if parse_match_date(&new.date).is_none() {
        return Err(EditError::InvalidDate(new.date.clone()));
    }
    Ok((home, away))
}

/// Rewrite the displayed projection of `match_id` after its score changed.
///
/// The entry keeps its slot in `view`; returns false when the match is not shown.
pub fn reconcile_formatted(
    view: &mut [FormattedMatch],
    match_id: u32,
    home_score: u8,
    away_score: u8,
) -> bool {
    let Some(slot) = view.iter_mut().find(|m| m.id == match_id) else {
        return false;
    };
    let result = if slot.is_home {
        outcome_for(home_score, away_score)
    } else {
        outcome_for(away_score, home_score)
    };
    *slot = FormattedMatch {
        home_score,
        away_score,
        result,
        ..slot.clone()
    };
    true
}
