use std::cmp::Ordering;
use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::state::{Match, MatchResult, Team, TeamProfile, TeamStats};

pub const RECENT_FORM_LEN: usize = 5;
pub const POINTS_PER_WIN: u32 = 3;
pub const POINTS_PER_DRAW: u32 = 1;

/// Ordering used when turning aggregated teams into standings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Points only; teams level on points keep their encounter order.
    PointsOnly,
    /// Points, goal difference, goals for, then name.
    #[default]
    Full,
}

impl TieBreak {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "full" | "default" => Some(TieBreak::Full),
            "points" | "points_only" | "points-only" => Some(TieBreak::PointsOnly),
            _ => None,
        }
    }
}

/// Outcome of a match from the side that scored `own`.
pub fn outcome_for(own: u8, other: u8) -> MatchResult {
    match own.cmp(&other) {
        Ordering::Greater => MatchResult::Win,
        Ordering::Less => MatchResult::Loss,
        Ordering::Equal => MatchResult::Draw,
    }
}

/// Fold `matches` into per-team statistics.
///
/// Output keeps the input team order and leaves every `position` at 0. Matches
/// that reference an unknown team id are skipped without error.
pub fn aggregate(teams: &[TeamProfile], matches: &[Match]) -> Vec<Team> {
    let mut out: Vec<Team> = Vec::with_capacity(teams.len());
    let mut index: HashMap<u32, usize> = HashMap::with_capacity(teams.len());
    for profile in teams {
        if index.contains_key(&profile.id) {
            continue;
        }
        index.insert(profile.id, out.len());
        out.push(Team {
            profile: profile.clone(),
            position: 0,
            stats: TeamStats::default(),
        });
    }

    for m in matches {
        let (Some(&home), Some(&away)) = (index.get(&m.home_team_id), index.get(&m.away_team_id))
        else {
            tracing::debug!(
                match_id = m.id,
                home = m.home_team_id,
                away = m.away_team_id,
                "skipping match with unknown team"
            );
            continue;
        };

        record_side(&mut out[home].stats, m.home_score, m.away_score);
        record_side(&mut out[away].stats, m.away_score, m.home_score);
    }

    for team in &mut out {
        let stats = &mut team.stats;
        let keep_from = stats.recent_form.len().saturating_sub(RECENT_FORM_LEN);
        stats.recent_form.drain(..keep_from);
        // Authoritative; nothing above touches points.
        stats.points = stats.wins * POINTS_PER_WIN + stats.draws * POINTS_PER_DRAW;
    }

    out
}

fn record_side(stats: &mut TeamStats, scored: u8, conceded: u8) {
    stats.goals_for += u32::from(scored);
    stats.goals_against += u32::from(conceded);
    let result = outcome_for(scored, conceded);
    match result {
        MatchResult::Win => stats.wins += 1,
        MatchResult::Draw => stats.draws += 1,
        MatchResult::Loss => stats.losses += 1,
    }
    // Chronological: newest last.
    stats.recent_form.push(result);
}

/// Order teams into standings and assign dense 1-based positions.
pub fn rank(teams: &[Team], tie_break: TieBreak) -> Vec<Team> {
    let mut sorted = teams.to_vec();
    match tie_break {
        TieBreak::PointsOnly => sorted.sort_by(|a, b| b.stats.points.cmp(&a.stats.points)),
        TieBreak::Full => sorted.sort_by(compare_full),
    }
    for (idx, team) in sorted.iter_mut().enumerate() {
        team.position = idx as u32 + 1;
    }
    sorted
}

/// Full tie-break chain: points desc, goal difference desc, goals for desc, name asc.
pub fn compare_full(a: &Team, b: &Team) -> Ordering {
    b.stats
        .points
        .cmp(&a.stats.points)
        .then_with(|| b.goal_difference().cmp(&a.goal_difference()))
        .then_with(|| b.stats.goals_for.cmp(&a.stats.goals_for))
        .then_with(|| compare_names(&a.profile.name, &b.profile.name))
        .then_with(|| a.profile.id.cmp(&b.profile.id))
}

/// Accents and case are ignored first, so "Österreich" sorts with the O's and
/// "arsenal" before "Aston Villa". Ties fall back to lowercase, then raw bytes.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    name_sort_key(a)
        .cmp(&name_sort_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// NFD-decomposed, combining marks dropped, lowercased.
pub fn name_sort_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Aggregate then rank in one call. Used on load and after every mutation.
pub fn compute_standings(teams: &[TeamProfile], matches: &[Match], tie_break: TieBreak) -> Vec<Team> {
    rank(&aggregate(teams, matches), tie_break)
}
