use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::standings::outcome_for;
use crate::state::{FormattedMatch, Match, Team};

pub const UNKNOWN_TEAM: &str = "Unknown Team";

/// Matches involving `team_id`, newest first, from that team's point of view.
pub fn format_team_matches(
    team_id: u32,
    matches: &[Match],
    teams: &[Team],
    limit: Option<usize>,
) -> Vec<FormattedMatch> {
    if team_id == 0 || matches.is_empty() {
        return Vec::new();
    }

    let names: HashMap<u32, &str> = teams
        .iter()
        .map(|t| (t.profile.id, t.profile.name.as_str()))
        .collect();

    let mut played: Vec<(&Match, Option<NaiveDate>)> = matches
        .iter()
        .filter(|m| m.home_team_id == team_id || m.away_team_id == team_id)
        .map(|m| (m, parse_match_date(&m.date)))
        .collect();

    // Stable: same-day matches keep list order. Unparseable dates sink to the end.
    played.sort_by(|(_, a), (_, b)| match (a, b) {
        (Some(a), Some(b)) => b.cmp(a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    // Zero means no limit.
    if let Some(limit) = limit.filter(|&l| l > 0) {
        played.truncate(limit);
    }

    played
        .into_iter()
        .map(|(m, _)| format_for_team(team_id, m, &names))
        .collect()
}

fn format_for_team(team_id: u32, m: &Match, names: &HashMap<u32, &str>) -> FormattedMatch {
    let is_home = m.home_team_id == team_id;
    let result = if is_home {
        outcome_for(m.home_score, m.away_score)
    } else {
        outcome_for(m.away_score, m.home_score)
    };
    let name_of = |id: u32| names.get(&id).copied().unwrap_or(UNKNOWN_TEAM).to_string();
    FormattedMatch {
        id: m.id,
        date: m.date.clone(),
        home_team: name_of(m.home_team_id),
        away_team: name_of(m.away_team_id),
        home_score: m.home_score,
        away_score: m.away_score,
        result,
        is_home,
    }
}

/// Calendar date of a fixture date string. Accepts ISO dates with or without a time part.
pub fn parse_match_date(raw: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d.%m.%Y", "%d/%m/%Y"];
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];

    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(cleaned, fmt) {
            return Some(d);
        }
    }
    // Drop fractional seconds and zone suffixes, e.g. "2023-08-05T15:00:00.000Z".
    let trimmed = cleaned
        .split(['.', 'Z', '+'])
        .next()
        .unwrap_or(cleaned);
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.date());
        }
    }
    None
}
