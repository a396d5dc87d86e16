pub mod config;
pub mod fixture;
pub mod league;
pub mod match_edit;
pub mod match_format;
pub mod persist;
pub mod standings;
pub mod state;
