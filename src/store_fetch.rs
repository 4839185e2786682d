use anyhow::{Context, Result};
use serde::Deserialize;

use crate::http::{get_json, StoreConfig};
use crate::model::{sort_chronological, Match, MatchStat, MatchStatus, Player, Team};

/// Full roster, alphabetical, mirroring the order the store serves the
/// UI.
pub fn fetch_players(cfg: &StoreConfig) -> Result<Vec<Player>> {
    let body = get_json(cfg, "players?select=*&order=name.asc")?;
    parse_players_json(&body)
}

/// Every match with its embedded stat lines and denormalized player
/// names. The engine re-sorts chronologically, so the store-side order
/// is only a convenience.
pub fn fetch_matches(cfg: &StoreConfig) -> Result<Vec<Match>> {
    let body = get_json(
        cfg,
        "matches?select=*,match_stats(*,players(name))&order=date.desc",
    )?;
    parse_matches_json(&body)
}

pub fn parse_players_json(raw: &str) -> Result<Vec<Player>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str(trimmed).context("invalid players json")
}

pub fn parse_matches_json(raw: &str) -> Result<Vec<Match>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let rows: Vec<MatchRow> = serde_json::from_str(trimmed).context("invalid matches json")?;
    let mut matches: Vec<Match> = rows.into_iter().map(Match::from).collect();
    sort_chronological(&mut matches);
    Ok(matches)
}

// Nullable columns arrive as explicit `null`, not as missing keys, so
// every count is an Option here and collapses to zero in the
// conversion below.
#[derive(Debug, Deserialize)]
struct MatchRow {
    id: i64,
    date: chrono::DateTime<chrono::Utc>,
    status: MatchStatus,
    #[serde(default)]
    team_a_score: Option<u32>,
    #[serde(default)]
    team_b_score: Option<u32>,
    #[serde(default)]
    match_stats: Vec<MatchStatRow>,
}

#[derive(Debug, Deserialize)]
struct MatchStatRow {
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    match_id: Option<i64>,
    player_id: i64,
    team: Team,
    #[serde(default)]
    goals: Option<u32>,
    #[serde(default)]
    assists: Option<u32>,
    #[serde(default)]
    gk_turns: Option<u32>,
    #[serde(default)]
    gk_conceded: Option<u32>,
    #[serde(default)]
    is_mvp: Option<bool>,
    #[serde(default)]
    is_candidate: Option<bool>,
    /// Embedded `players(name)` relation.
    #[serde(default)]
    players: Option<EmbeddedPlayer>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedPlayer {
    #[serde(default)]
    name: Option<String>,
}

impl From<MatchRow> for Match {
    fn from(row: MatchRow) -> Self {
        Match {
            id: row.id,
            date: row.date,
            status: row.status,
            team_a_score: row.team_a_score.unwrap_or(0),
            team_b_score: row.team_b_score.unwrap_or(0),
            stats: row.match_stats.into_iter().map(MatchStat::from).collect(),
        }
    }
}

impl From<MatchStatRow> for MatchStat {
    fn from(row: MatchStatRow) -> Self {
        MatchStat {
            id: row.id.unwrap_or(0),
            match_id: row.match_id.unwrap_or(0),
            player_id: row.player_id,
            team: row.team,
            goals: row.goals.unwrap_or(0),
            assists: row.assists.unwrap_or(0),
            gk_turns: row.gk_turns.unwrap_or(0),
            gk_conceded: row.gk_conceded.unwrap_or(0),
            is_mvp: row.is_mvp.unwrap_or(false),
            is_candidate: row.is_candidate.unwrap_or(false),
            player_name: row.players.and_then(|p| p.name),
        }
    }
}
