use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use league_table::fixture::{Fixture, parse_fixture_json};
use league_table::persist::load_favorite_from;
use league_table::standings::TieBreak;
use league_table::state::{
    AddMatchField, AppState, Delta, Form, MatchResult, NewMatch, Screen, SortDirection, SortField,
    apply_delta, sort_table,
};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn small_fixture() -> Fixture {
    parse_fixture_json(&read_fixture("league_small.json")).expect("fixture should parse")
}

fn loaded_state() -> AppState {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::SetFixture(small_fixture()));
    state
}

#[test]
fn set_fixture_ranks_and_stops_loading() {
    let state = loaded_state();
    assert!(!state.loading);
    assert_eq!(state.teams().len(), 4);
    assert_eq!(state.teams()[0].profile.name, "Alpha FC");
    assert_eq!(state.league.matches().len(), 6);
    assert!(
        state
            .logs
            .back()
            .is_some_and(|l| l == "[INFO] Loaded 4 teams, 6 matches")
    );
}

#[test]
fn initial_load_can_rank_by_points_only() {
    let mut state = AppState::new();
    state.initial_tie_break = TieBreak::PointsOnly;
    apply_delta(&mut state, Delta::SetFixture(small_fixture()));
    let names: Vec<&str> = state
        .teams()
        .iter()
        .map(|t| t.profile.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["Alpha FC", "Charlie Town", "Bravo United", "Delta Rovers"]
    );
}

#[test]
fn failed_load_leaves_empty_lists() {
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::FixtureFailed("boom".to_string()));
    assert!(!state.loading);
    assert!(state.teams().is_empty());
    assert!(state.league.matches().is_empty());
    assert!(state.logs.back().is_some_and(|l| l.contains("boom")));
    assert!(state.selected_team().is_none());
}

#[test]
fn edit_result_updates_detail_view_and_closes_form() {
    let mut state = loaded_state();
    state.open_team_detail(1);
    assert_eq!(state.screen, Screen::TeamDetail { team_id: 1 });
    let order: Vec<u32> = state.team_matches.iter().map(|m| m.id).collect();
    assert_eq!(order, vec![5, 6, 4, 1]);

    state.match_selected = 3;
    state.start_edit_result();
    assert!(matches!(state.form, Some(Form::EditResult(ref f)) if f.match_id == 1));
    state.form_input_char('0');
    state.form_next_field();
    state.form_input_char('2');

    let delta = state.submit_form().expect("form should submit");
    apply_delta(&mut state, delta);

    assert!(state.form.is_none());
    assert!(state.is_success_visible());
    let m1 = &state.team_matches[3];
    assert_eq!(m1.id, 1);
    assert_eq!((m1.home_score, m1.away_score), (0, 2));
    assert_eq!(m1.result, MatchResult::Loss);

    let alpha = state.league.team(1).expect("alpha should exist");
    assert_eq!(alpha.stats.points, 3);
    assert_eq!(alpha.stats.recent_form[0], MatchResult::Loss);
}

#[test]
fn invalid_score_keeps_form_open_and_flashes() {
    let mut state = loaded_state();
    state.open_team_detail(1);
    state.start_edit_result();
    state.form_input_char('8');

    let delta = state.submit_form().expect("form should submit");
    apply_delta(&mut state, delta);

    assert!(state.form.is_some());
    assert!(state.is_form_error_visible());
    assert!(!state.is_success_visible());
    assert_eq!(state.league.team(1).expect("alpha").stats.points, 6);
    assert!(state.logs.back().is_some_and(|l| l.starts_with("[WARN]")));

    state.maybe_clear_notices(Instant::now() + Duration::from_secs(1));
    assert!(!state.is_form_error_visible());
}

#[test]
fn success_notice_expires() {
    let mut state = loaded_state();
    apply_delta(
        &mut state,
        Delta::EditMatchResult {
            match_id: 2,
            home_score: 1,
            away_score: 0,
        },
    );
    assert!(state.is_success_visible());
    state.maybe_clear_notices(Instant::now());
    assert!(state.is_success_visible());
    state.maybe_clear_notices(Instant::now() + state.notice_duration);
    assert!(!state.is_success_visible());
}

#[test]
fn edit_of_missing_match_only_logs() {
    let mut state = loaded_state();
    apply_delta(
        &mut state,
        Delta::EditMatchResult {
            match_id: 404,
            home_score: 1,
            away_score: 1,
        },
    );
    assert!(!state.is_success_visible());
    assert!(
        state
            .logs
            .back()
            .is_some_and(|l| l == "[INFO] Match #404 not found")
    );
}

#[test]
fn add_match_form_defaults_and_submit() {
    let mut state = loaded_state();
    state.open_team_detail(2);
    state.start_add_match();

    let Some(Form::AddMatch(form)) = &state.form else {
        panic!("add form should be open");
    };
    assert_eq!(form.home_team_id, Some(2));
    assert_eq!(form.away_team_id, None);
    assert_eq!(form.date, "2023-08-19");
    assert_eq!(form.focus, AddMatchField::HomeTeam);

    state.form_next_field();
    state.form_cycle_team(true);
    state.form_next_field();
    state.form_input_char('9');

    let Some(Form::AddMatch(form)) = &state.form else {
        panic!("add form should be open");
    };
    // Table order: Alpha is first.
    assert_eq!(form.away_team_id, Some(1));
    assert_eq!(form.home_score, 7);

    let delta = state.submit_form().expect("form should submit");
    apply_delta(&mut state, delta);

    assert!(state.form.is_none());
    assert_eq!(state.league.matches().len(), 7);
    assert_eq!(state.team_matches.len(), 3);
    assert!(state.team_matches.iter().any(|m| m.id == 7 && m.is_home));
}

#[test]
fn add_match_with_missing_team_stays_open() {
    let mut state = loaded_state();
    state.start_add_match();
    let delta = state.submit_form().expect("form should submit");
    apply_delta(&mut state, delta);
    assert!(state.form.is_some());
    assert!(state.is_form_error_visible());
    assert_eq!(state.league.matches().len(), 6);
}

#[test]
fn add_match_with_vanished_team_closes_form() {
    let mut state = loaded_state();
    apply_delta(
        &mut state,
        Delta::AddMatch(NewMatch {
            date: "2023-08-26".to_string(),
            home_team_id: Some(1),
            away_team_id: Some(50),
            home_score: 0,
            away_score: 0,
        }),
    );
    assert!(state.form.is_none());
    assert!(state.is_form_error_visible());
}

#[test]
fn team_details_edit_through_form() {
    let mut state = loaded_state();
    state.open_team_detail(4);
    state.start_edit_team();
    for _ in 0.."D. Coach".len() {
        state.form_backspace();
    }
    for c in "New Boss".chars() {
        state.form_input_char(c);
    }
    let delta = state.submit_form().expect("form should submit");
    apply_delta(&mut state, delta);

    let delta_rovers = state.league.team(4).expect("team should exist");
    assert_eq!(delta_rovers.profile.coach, "New Boss");
    assert_eq!(delta_rovers.profile.stadium, "Delta Ground");
    assert!(state.form.is_none());
    assert!(state.is_success_visible());
}

#[test]
fn column_sort_toggles_direction() {
    let mut state = loaded_state();
    assert_eq!(state.sort_field, SortField::Position);

    state.toggle_sort(SortField::Name);
    assert_eq!(state.sort_direction, SortDirection::Asc);
    let names: Vec<&str> = state
        .sorted_teams()
        .iter()
        .map(|t| t.profile.name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["Alpha FC", "Bravo United", "Charlie Town", "Delta Rovers"]
    );

    state.toggle_sort(SortField::Name);
    assert_eq!(state.sort_direction, SortDirection::Desc);
    assert_eq!(state.sorted_teams()[0].profile.name, "Delta Rovers");
    assert_eq!(state.selected_team_id(), Some(4));
}

#[test]
fn descending_sort_keeps_ranked_order_for_ties() {
    let state = loaded_state();
    let rows = sort_table(state.teams(), SortField::Points, SortDirection::Desc);
    let ids: Vec<u32> = rows.iter().map(|t| t.profile.id).collect();
    // Bravo and Delta are level on one point; Delta is ranked higher.
    assert_eq!(ids, vec![1, 3, 4, 2]);

    let rows = sort_table(state.teams(), SortField::Points, SortDirection::Asc);
    let ids: Vec<u32> = rows.iter().map(|t| t.profile.id).collect();
    assert_eq!(ids, vec![4, 2, 3, 1]);
}

#[test]
fn selection_is_clamped() {
    let mut state = loaded_state();
    for _ in 0..10 {
        state.select_next();
    }
    assert_eq!(state.selected, 3);
    for _ in 0..10 {
        state.select_prev();
    }
    assert_eq!(state.selected, 0);
}

#[test]
fn open_unknown_team_stays_on_table() {
    let mut state = loaded_state();
    state.open_team_detail(99);
    assert_eq!(state.screen, Screen::Table);
    state.open_team_detail(3);
    state.back_to_table();
    assert_eq!(state.screen, Screen::Table);
    assert!(state.team_matches.is_empty());
}

#[test]
fn favorite_toggle_persists() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("nested").join("favorite.json");

    let mut state = loaded_state();
    state.favorite_path = Some(path.clone());

    apply_delta(&mut state, Delta::ToggleFavorite(3));
    assert_eq!(state.favorite_team_id, Some(3));
    assert_eq!(
        state.favorite_team().map(|t| t.profile.name.as_str()),
        Some("Charlie Town")
    );
    assert_eq!(load_favorite_from(&path), Some(3));

    apply_delta(&mut state, Delta::ToggleFavorite(3));
    assert_eq!(state.favorite_team_id, None);
    assert_eq!(load_favorite_from(&path), None);
}

#[test]
fn log_buffer_is_bounded() {
    let mut state = AppState::new();
    for i in 0..250 {
        apply_delta(&mut state, Delta::Log(format!("line {i}")));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("line 50"));
}

#[test]
fn team_column_sort_places_accented_names_by_base_letter() {
    let mut fixture = small_fixture();
    fixture.teams[0].name = "Ávila FC".to_string();
    let mut state = AppState::new();
    apply_delta(&mut state, Delta::SetFixture(fixture));

    let rows = sort_table(state.teams(), SortField::Name, SortDirection::Asc);
    let names: Vec<&str> = rows.iter().map(|t| t.profile.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["Ávila FC", "Bravo United", "Charlie Town", "Delta Rovers"]
    );
}
