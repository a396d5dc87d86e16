use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{Duration as ChronoDuration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use league_table::fixture::Fixture;
use league_table::match_edit::{DEFAULT_MATCH_DATE, MAX_SCORE};
use league_table::state::{Match, TeamProfile};

const TEAM_NAMES: &[(&str, &str, &str)] = &[
    ("Northbridge United", "Harbour Park", "1892"),
    ("Eastvale Rovers", "The Mill", "1901"),
    ("Kingsford Athletic", "Crown Lane", "1885"),
    ("Westmere City", "Riverside Stadium", "1910"),
    ("Ashby Town", "Ashby Road", "1879"),
    ("Redhill Wanderers", "Summit Ground", "1920"),
    ("Lowfield Albion", "Marsh End", "1898"),
    ("Carrow Forest", "Pine Street", "1903"),
    ("Halton Villa", "The Dell", "1888"),
    ("Stonebury FC", "Quarry Field", "1925"),
    ("Millbrook Olympic", "Canal Side", "1912"),
    ("Fairhaven Rangers", "Seafront Park", "1907"),
    ("Oakridge Sporting", "Acorn Arena", "1931"),
    ("Brightwater FC", "Lighthouse Lane", "1899"),
    ("Greystone County", "Castle Meadow", "1883"),
    ("Elmstead Harriers", "Elm Park", "1915"),
    ("Dunmore Athletic", "Moor Road", "1894"),
    ("Sandport Town", "Dockyard Ground", "1908"),
    ("Thornbury United", "Hawthorn Park", "1919"),
    ("Wyecliffe Rovers", "Cliff Top", "1927"),
];

// Roughly the shape of league scorelines: mostly 0-2, rarely above 4.
const GOAL_WEIGHTS: [u32; 8] = [26, 34, 22, 10, 5, 2, 1, 0];

fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let team_count = parse_arg(&args, "--teams")
        .map(|raw| raw.parse::<usize>())
        .transpose()
        .context("--teams must be a number")?
        .unwrap_or(10);
    if !(2..=TEAM_NAMES.len()).contains(&team_count) {
        return Err(anyhow!("--teams must be between 2 and {}", TEAM_NAMES.len()));
    }
    let seed = parse_arg(&args, "--seed")
        .map(|raw| raw.parse::<u64>())
        .transpose()
        .context("--seed must be a number")?;
    let start = parse_arg(&args, "--start")
        .unwrap_or_else(|| DEFAULT_MATCH_DATE.to_string());
    let start = NaiveDate::parse_from_str(&start, "%Y-%m-%d")
        .with_context(|| format!("--start must be YYYY-MM-DD, got {start}"))?;

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let fixture = generate_season(team_count, start, &mut rng);
    let json = serde_json::to_string_pretty(&fixture).context("serialize fixture")?;

    match parse_arg(&args, "--out").map(PathBuf::from) {
        Some(path) => {
            if let Some(dir) = path.parent() {
                fs::create_dir_all(dir).ok();
            }
            fs::write(&path, json)
                .with_context(|| format!("failed writing {}", path.display()))?;
            println!(
                "Wrote {} teams / {} matches to {}",
                fixture.teams.len(),
                fixture.matches.len(),
                path.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn generate_season(team_count: usize, start: NaiveDate, rng: &mut impl Rng) -> Fixture {
    let teams: Vec<TeamProfile> = TEAM_NAMES
        .iter()
        .take(team_count)
        .enumerate()
        .map(|(idx, (name, stadium, founded))| TeamProfile {
            id: idx as u32 + 1,
            name: name.to_string(),
            founded: founded.to_string(),
            stadium: stadium.to_string(),
            coach: format!("Coach {}", idx + 1),
            key_players: (1..=3).map(|n| format!("{name} Player {n}")).collect(),
        })
        .collect();

    let ids: Vec<u32> = teams.iter().map(|t| t.id).collect();
    let mut matches = Vec::new();
    for (round, pairs) in double_round_robin(&ids).into_iter().enumerate() {
        let date = start + ChronoDuration::weeks(round as i64);
        for (home, away) in pairs {
            matches.push(Match {
                id: matches.len() as u32 + 1,
                date: date.format("%Y-%m-%d").to_string(),
                home_team_id: home,
                away_team_id: away,
                home_score: random_goals(rng),
                away_score: random_goals(rng),
            });
        }
    }

    Fixture { teams, matches }
}

/// Circle method; the second half mirrors the first with venues swapped.
fn double_round_robin(ids: &[u32]) -> Vec<Vec<(u32, u32)>> {
    let mut slots: Vec<Option<u32>> = ids.iter().copied().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    let n = slots.len();
    let mut first_half = Vec::with_capacity(n - 1);
    for round in 0..n - 1 {
        let mut pairs = Vec::with_capacity(n / 2);
        for i in 0..n / 2 {
            if let (Some(a), Some(b)) = (slots[i], slots[n - 1 - i]) {
                // Alternate venues so nobody is always at home.
                if (round + i) % 2 == 0 {
                    pairs.push((a, b));
                } else {
                    pairs.push((b, a));
                }
            }
        }
        first_half.push(pairs);
        slots[1..].rotate_right(1);
    }
    let second_half: Vec<Vec<(u32, u32)>> = first_half
        .iter()
        .map(|pairs| pairs.iter().map(|(h, a)| (*a, *h)).collect())
        .collect();
    first_half.into_iter().chain(second_half).collect()
}

fn random_goals(rng: &mut impl Rng) -> u8 {
    let total: u32 = GOAL_WEIGHTS.iter().sum();
    let mut roll = rng.gen_range(0..total);
    for (goals, weight) in GOAL_WEIGHTS.iter().enumerate() {
        if roll < *weight {
            return (goals as u8).min(MAX_SCORE);
        }
        roll -= weight;
    }
    0
}

fn parse_arg(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(val) = arg.strip_prefix(&prefix) {
            let trimmed = val.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
