use std::path::PathBuf;
use std::time::Duration;

use crate::fixture::FixtureSource;
use crate::standings::TieBreak;

const DEFAULT_LOG_FILTER: &str = "league_table=info";
const DEFAULT_LOG_FILE: &str = "league_table.log";
const DEFAULT_NOTICE_SECS: u64 = 3;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub fixture: FixtureSource,
    pub initial_tie_break: TieBreak,
    pub notice: Duration,
    pub log_filter: String,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fixture: FixtureSource::default(),
            initial_tie_break: TieBreak::Full,
            notice: Duration::from_secs(DEFAULT_NOTICE_SECS),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl AppConfig {
    /// `.env.local` then `.env`; real environment variables win.
    pub fn load_env_files() {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(raw) = non_empty(lookup("LEAGUE_FIXTURE")) {
            cfg.fixture = FixtureSource::parse(&raw);
        }
        if let Some(tb) = non_empty(lookup("LEAGUE_INITIAL_TIE_BREAK"))
            .and_then(|raw| TieBreak::parse(&raw))
        {
            cfg.initial_tie_break = tb;
        }
        let notice_secs = lookup("LEAGUE_NOTICE_SECS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_NOTICE_SECS)
            .clamp(1, 30);
        cfg.notice = Duration::from_secs(notice_secs);
        if let Some(filter) = non_empty(lookup("LEAGUE_LOG")) {
            cfg.log_filter = filter;
        }
        if let Some(path) = non_empty(lookup("LEAGUE_LOG_FILE")) {
            cfg.log_file = PathBuf::from(path);
        }
        cfg
    }

    /// `--fixture <src>` / `--fixture=<src>` overrides the environment.
    pub fn with_args(mut self, args: &[String]) -> Self {
        if let Some(raw) = parse_fixture_arg(args) {
            self.fixture = FixtureSource::parse(&raw);
        }
        self
    }
}

fn non_empty(val: Option<String>) -> Option<String> {
    val.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn parse_fixture_arg(args: &[String]) -> Option<String> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(src) = arg.strip_prefix("--fixture=") {
            let trimmed = src.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == "--fixture" {
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
