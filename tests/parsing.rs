use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use league_table::config::{AppConfig, parse_fixture_arg};
use league_table::fixture::{DEFAULT_FIXTURE, FixtureSource, load_fixture, parse_fixture_json};
use league_table::persist::{load_favorite_from, save_favorite_to};
use league_table::standings::TieBreak;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn fixture_parses_profiles_and_matches() {
    let fixture =
        parse_fixture_json(&read_fixture("league_small.json")).expect("fixture should parse");
    assert_eq!(fixture.teams.len(), 4);
    assert_eq!(fixture.matches.len(), 6);

    let alpha = &fixture.teams[0];
    assert_eq!(alpha.founded, "1899");
    assert_eq!(alpha.key_players, vec!["A. One", "A. Two"]);
    assert!(fixture.teams[1].key_players.is_empty());

    let m4 = &fixture.matches[3];
    assert_eq!((m4.home_team_id, m4.away_team_id), (4, 1));
    assert_eq!((m4.home_score, m4.away_score), (1, 2));
}

#[test]
fn empty_or_partial_documents_parse() {
    assert!(parse_fixture_json("").expect("empty is fine").teams.is_empty());
    assert!(parse_fixture_json("null").expect("null is fine").matches.is_empty());

    let only_teams = parse_fixture_json(r#"{"teams":[{"id":1,"name":"Solo"}]}"#)
        .expect("missing matches should default");
    assert_eq!(only_teams.teams.len(), 1);
    assert!(only_teams.matches.is_empty());
    assert_eq!(only_teams.teams[0].founded, "");
}

#[test]
fn malformed_documents_are_errors() {
    assert!(parse_fixture_json("{not json").is_err());
    let negative = r#"{"matches":[{"id":1,"date":"2023-08-05","homeTeamId":1,"awayTeamId":2,"homeScore":-1,"awayScore":0}]}"#;
    assert!(parse_fixture_json(negative).is_err());
}

#[test]
fn bundled_fixture_loads() {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push(DEFAULT_FIXTURE);
    let fixture = load_fixture(&FixtureSource::Path(path)).expect("bundled fixture should load");
    assert!(fixture.teams.len() >= 2);
    assert!(!fixture.matches.is_empty());
}

#[test]
fn missing_fixture_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = load_fixture(&FixtureSource::Path(dir.path().join("absent.json")))
        .expect_err("missing file should fail");
    assert!(format!("{err:#}").contains("absent.json"));
}

#[test]
fn fixture_source_detects_urls() {
    assert_eq!(
        FixtureSource::parse(" https://example.com/league.json "),
        FixtureSource::Url("https://example.com/league.json".to_string())
    );
    assert_eq!(
        FixtureSource::parse("data/other.json"),
        FixtureSource::Path(PathBuf::from("data/other.json"))
    );
    assert_eq!(FixtureSource::default().to_string(), DEFAULT_FIXTURE);
}

#[test]
fn config_defaults() {
    let cfg = AppConfig::from_lookup(|_| None);
    assert_eq!(cfg.fixture, FixtureSource::default());
    assert_eq!(cfg.initial_tie_break, TieBreak::Full);
    assert_eq!(cfg.notice, Duration::from_secs(3));
    assert_eq!(cfg.log_filter, "league_table=info");
}

#[test]
fn config_reads_environment() {
    let cfg = AppConfig::from_lookup(lookup_from(&[
        ("LEAGUE_FIXTURE", "http://localhost:8080/teams.json"),
        ("LEAGUE_INITIAL_TIE_BREAK", "Points"),
        ("LEAGUE_NOTICE_SECS", "600"),
        ("LEAGUE_LOG", "league_table=debug"),
        ("LEAGUE_LOG_FILE", "/tmp/league.log"),
    ]));
    assert_eq!(
        cfg.fixture,
        FixtureSource::Url("http://localhost:8080/teams.json".to_string())
    );
    assert_eq!(cfg.initial_tie_break, TieBreak::PointsOnly);
    assert_eq!(cfg.notice, Duration::from_secs(30));
    assert_eq!(cfg.log_filter, "league_table=debug");
    assert_eq!(cfg.log_file, PathBuf::from("/tmp/league.log"));
}

#[test]
fn config_ignores_junk_values() {
    let cfg = AppConfig::from_lookup(lookup_from(&[
        ("LEAGUE_FIXTURE", "   "),
        ("LEAGUE_INITIAL_TIE_BREAK", "coin-toss"),
        ("LEAGUE_NOTICE_SECS", "soon"),
    ]));
    assert_eq!(cfg.fixture, FixtureSource::default());
    assert_eq!(cfg.initial_tie_break, TieBreak::Full);
    assert_eq!(cfg.notice, Duration::from_secs(3));
}

#[test]
fn fixture_arg_overrides_environment() {
    let args: Vec<String> = vec!["--fixture".into(), "season.json".into()];
    assert_eq!(parse_fixture_arg(&args), Some("season.json".to_string()));

    let args: Vec<String> = vec!["--fixture=https://x.test/a.json".into()];
    let cfg = AppConfig::from_lookup(lookup_from(&[("LEAGUE_FIXTURE", "env.json")])).with_args(&args);
    assert_eq!(cfg.fixture, FixtureSource::Url("https://x.test/a.json".to_string()));

    let args: Vec<String> = vec!["--fixture".into()];
    assert_eq!(parse_fixture_arg(&args), None);
}

#[test]
fn favorite_file_round_trip_and_stale_versions() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("favorite.json");

    assert_eq!(load_favorite_from(&path), None);
    save_favorite_to(&path, Some(12)).expect("save should work");
    assert_eq!(load_favorite_from(&path), Some(12));

    fs::write(&path, r#"{"version":0,"team_id":12}"#).expect("write stale file");
    assert_eq!(load_favorite_from(&path), None);

    fs::write(&path, "garbage").expect("write junk");
    assert_eq!(load_favorite_from(&path), None);
}
