use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};

use crate::state::{Delta, Match, TeamProfile};

pub const DEFAULT_FIXTURE: &str = "data/teams.json";

const REQUEST_TIMEOUT_SECS: u64 = 10;

static CLIENT: OnceCell<Client> = OnceCell::new();

/// The league document: static team records plus every played match.
///
/// Derived team fields (points, position, form...) may be present in the JSON;
/// they are ignored on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub teams: Vec<TeamProfile>,
    #[serde(default)]
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureSource {
    Path(PathBuf),
    Url(String),
}

impl FixtureSource {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            FixtureSource::Url(trimmed.to_string())
        } else {
            FixtureSource::Path(PathBuf::from(trimmed))
        }
    }
}

impl Default for FixtureSource {
    fn default() -> Self {
        FixtureSource::Path(PathBuf::from(DEFAULT_FIXTURE))
    }
}

impl fmt::Display for FixtureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureSource::Path(path) => write!(f, "{}", path.display()),
            FixtureSource::Url(url) => f.write_str(url),
        }
    }
}

pub fn parse_fixture_json(raw: &str) -> Result<Fixture> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Fixture::default());
    }
    serde_json::from_str(trimmed).context("invalid fixture json")
}

pub fn load_fixture(source: &FixtureSource) -> Result<Fixture> {
    let body = match source {
        FixtureSource::Path(path) => fs::read_to_string(path)
            .with_context(|| format!("failed reading fixture {}", path.display()))?,
        FixtureSource::Url(url) => fetch_fixture_body(url)?,
    };
    parse_fixture_json(&body)
}

fn fixture_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

fn fetch_fixture_body(url: &str) -> Result<String> {
    let client = fixture_client()?;
    let resp = client
        .get(url)
        .header(USER_AGENT, concat!("league_table/", env!("CARGO_PKG_VERSION")))
        .send()
        .context("fixture request failed")?;
    let status = resp.status();
    let body = resp.text().context("failed reading fixture body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {status} for {url}"));
    }
    Ok(body)
}

/// One-shot background load. Exactly one of `SetFixture` / `FixtureFailed` is sent.
pub fn spawn_fixture_loader(source: FixtureSource, tx: Sender<Delta>) {
    thread::spawn(move || {
        let _ = tx.send(Delta::Log(format!("[INFO] Loading fixture from {source}")));
        let delta = match load_fixture(&source) {
            Ok(fixture) => {
                tracing::info!(
                    %source,
                    teams = fixture.teams.len(),
                    matches = fixture.matches.len(),
                    "fixture loaded"
                );
                Delta::SetFixture(fixture)
            }
            Err(err) => Delta::FixtureFailed(format!("{err:#}")),
        };
        let _ = tx.send(delta);
    });
}
