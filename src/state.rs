use std::collections::{HashMap, HashSet, VecDeque};
use std::time::SystemTime;

use crate::highlights::{find_highlights, HighlightSet};
use crate::model::{sort_chronological, Match, Player, PlayerId};
use crate::rank::{build_rows, leaderboard, rank_all, Metric, MetricRow};
use crate::ratios::{compute_all_ratios, Ratios};
use crate::season_stats::{
    compute_player_stats, recent_form, total_finished_matches, FormEntry, PlayerSeasonStats,
};
use crate::validate::{match_issues, ConsistencyIssue};

const LOG_CAPACITY: usize = 200;
const FORM_LEN: usize = 5;

/// Metrics the leaderboard screen cycles through.
pub const LEADERBOARD_METRICS: [Metric; 10] = [
    Metric::Goals,
    Metric::Assists,
    Metric::GoalAssists,
    Metric::CleanSheets,
    Metric::GkConceded,
    Metric::Wins,
    Metric::Mvps,
    Metric::Points,
    Metric::Matches,
    Metric::GoalRatio,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Leaderboard,
    Players,
    Matches,
    Audit,
}

/// Messages from the provider thread.
#[derive(Debug, Clone)]
pub enum Delta {
    SetSnapshot {
        players: Vec<Player>,
        matches: Vec<Match>,
        from_cache: bool,
    },
    Log(String),
}

/// Requests to the provider thread.
#[derive(Debug, Clone)]
pub enum ProviderCommand {
    Refresh,
}

/// Everything derived for one player, ready to render on a player card.
#[derive(Debug, Clone)]
pub struct PlayerView {
    pub player: Player,
    pub stats: PlayerSeasonStats,
    pub ratios: Ratios,
    pub form: Vec<FormEntry>,
    pub highlights: HighlightSet,
}

/// A match the validator flagged, with its issues spelled out.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub match_id: i64,
    pub issues: Vec<ConsistencyIssue>,
}

pub struct AppState {
    // Raw snapshot, matches kept chronological.
    pub players: Vec<Player>,
    pub matches: Vec<Match>,

    // Derived, rebuilt wholesale by `recompute`.
    pub total_matches: u32,
    pub rows: Vec<MetricRow>,
    pub ranks: HashMap<Metric, HashMap<PlayerId, u32>>,
    pub views: Vec<PlayerView>,
    pub audit: Vec<AuditEntry>,

    // UI state.
    pub screen: Screen,
    pub metric_index: usize,
    pub selected_player: usize,
    pub selected_match: usize,
    pub help_overlay: bool,
    pub loading: bool,
    pub snapshot_at: Option<SystemTime>,
    pub logs: VecDeque<String>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            matches: Vec::new(),
            total_matches: 0,
            rows: Vec::new(),
            ranks: HashMap::new(),
            views: Vec::new(),
            audit: Vec::new(),
            screen: Screen::Leaderboard,
            metric_index: 0,
            selected_player: 0,
            selected_match: 0,
            help_overlay: false,
            loading: true,
            snapshot_at: None,
            logs: VecDeque::new(),
        }
    }

    pub fn push_log(&mut self, line: impl Into<String>) {
        if self.logs.len() >= LOG_CAPACITY {
            self.logs.pop_front();
        }
        self.logs.push_back(line.into());
    }

    pub fn set_snapshot(&mut self, players: Vec<Player>, mut matches: Vec<Match>) {
        sort_chronological(&mut matches);
        self.players = players;
        self.matches = matches;
        self.loading = false;
        self.recompute();
    }

    /// Rebuild every derived structure from the raw snapshot. Derived
    /// data is never patched in place; a refresh recomputes the lot.
    pub fn recompute(&mut self) {
        self.total_matches = total_finished_matches(&self.matches);

        // Orphaned stat lines are skipped by the aggregator; echo them
        // on the console so whoever curates the store notices.
        let known: HashSet<PlayerId> = self.players.iter().map(|p| p.id).collect();
        let orphan_warnings: Vec<String> = self
            .matches
            .iter()
            .filter(|m| m.is_finished())
            .flat_map(|m| {
                m.stats
                    .iter()
                    .filter(|line| !known.contains(&line.player_id))
                    .map(|line| {
                        format!(
                            "[WARN] Partita {}: riga {} di giocatore sconosciuto {}",
                            m.id, line.id, line.player_id
                        )
                    })
            })
            .collect();
        for warning in orphan_warnings {
            self.push_log(warning);
        }

        let stats = compute_player_stats(&self.players, &self.matches);
        let ratios = compute_all_ratios(&stats, self.total_matches);
        let roster: Vec<PlayerId> = self.players.iter().map(|p| p.id).collect();
        self.rows = build_rows(&roster, &stats, &ratios);
        self.ranks = rank_all(&self.rows);

        self.views = self
            .players
            .iter()
            .map(|p| PlayerView {
                player: p.clone(),
                stats: stats.get(&p.id).copied().unwrap_or_default(),
                ratios: ratios.get(&p.id).copied().unwrap_or_default(),
                form: recent_form(p.id, &self.matches, FORM_LEN),
                highlights: find_highlights(p.id, &self.matches),
            })
            .collect();

        self.audit = self
            .matches
            .iter()
            .filter_map(|m| {
                let issues = match_issues(m);
                if issues.is_empty() {
                    None
                } else {
                    Some(AuditEntry {
                        match_id: m.id,
                        issues,
                    })
                }
            })
            .collect();

        self.clamp_selection();
    }

    pub fn metric(&self) -> Metric {
        LEADERBOARD_METRICS[self.metric_index % LEADERBOARD_METRICS.len()]
    }

    pub fn cycle_metric(&mut self) {
        self.metric_index = (self.metric_index + 1) % LEADERBOARD_METRICS.len();
    }

    /// Tie-broken presentation order for the current leaderboard metric.
    pub fn leaderboard_order(&self) -> Vec<PlayerId> {
        leaderboard(&self.rows, self.metric())
    }

    pub fn rank_of(&self, metric: Metric, player_id: PlayerId) -> Option<u32> {
        self.ranks.get(&metric)?.get(&player_id).copied()
    }

    pub fn view_for(&self, player_id: PlayerId) -> Option<&PlayerView> {
        self.views.iter().find(|v| v.player.id == player_id)
    }

    pub fn current_match(&self) -> Option<&Match> {
        // Matches screen lists newest first.
        let newest_first: Vec<&Match> = self.matches.iter().rev().collect();
        newest_first.get(self.selected_match).copied()
    }

    pub fn select_next(&mut self) {
        match self.screen {
            Screen::Players | Screen::Leaderboard => {
                if self.selected_player + 1 < self.players.len() {
                    self.selected_player += 1;
                }
            }
            Screen::Matches => {
                if self.selected_match + 1 < self.matches.len() {
                    self.selected_match += 1;
                }
            }
            Screen::Audit => {}
        }
    }

    pub fn select_prev(&mut self) {
        match self.screen {
            Screen::Players | Screen::Leaderboard => {
                self.selected_player = self.selected_player.saturating_sub(1);
            }
            Screen::Matches => {
                self.selected_match = self.selected_match.saturating_sub(1);
            }
            Screen::Audit => {}
        }
    }

    fn clamp_selection(&mut self) {
        if self.selected_player >= self.players.len() {
            self.selected_player = self.players.len().saturating_sub(1);
        }
        if self.selected_match >= self.matches.len() {
            self.selected_match = self.matches.len().saturating_sub(1);
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchStat, MatchStatus, Team};
    use chrono::{TimeZone, Utc};

    fn roster() -> Vec<Player> {
        vec![Player {
            id: 1,
            name: "Marco".to_string(),
            avatar_url: None,
        }]
    }

    fn one_match(stats: Vec<MatchStat>) -> Match {
        Match {
            id: 10,
            date: Utc.with_ymd_and_hms(2025, 2, 3, 21, 0, 0).unwrap(),
            status: MatchStatus::Finished,
            team_a_score: 1,
            team_b_score: 0,
            stats,
        }
    }

    fn line(player_id: PlayerId) -> MatchStat {
        MatchStat {
            id: player_id * 10,
            match_id: 10,
            player_id,
            team: Team::A,
            goals: 1,
            assists: 0,
            gk_turns: 0,
            gk_conceded: 0,
            is_mvp: false,
            is_candidate: false,
            player_name: None,
        }
    }

    #[test]
    fn orphan_stat_lines_land_on_the_console() {
        let mut state = AppState::new();
        state.set_snapshot(roster(), vec![one_match(vec![line(1), line(99)])]);
        assert!(state
            .logs
            .iter()
            .any(|entry| entry.contains("sconosciuto 99")));
        // The known player still aggregates normally.
        assert_eq!(state.views[0].stats.goals, 1);
    }

    #[test]
    fn clean_snapshot_logs_no_orphan_warnings() {
        let mut state = AppState::new();
        state.set_snapshot(roster(), vec![one_match(vec![line(1)])]);
        assert!(!state.logs.iter().any(|entry| entry.contains("sconosciuto")));
    }

    #[test]
    fn snapshot_delta_stamps_the_refresh_time() {
        let mut state = AppState::new();
        assert!(state.snapshot_at.is_none());
        apply_delta(
            &mut state,
            Delta::SetSnapshot {
                players: roster(),
                matches: Vec::new(),
                from_cache: false,
            },
        );
        assert!(state.snapshot_at.is_some());
        assert!(!state.loading);
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetSnapshot {
            players,
            matches,
            from_cache,
        } => {
            state.set_snapshot(players, matches);
            state.snapshot_at = Some(SystemTime::now());
            if from_cache {
                state.push_log("[INFO] Snapshot loaded from cache");
            } else {
                state.push_log(format!(
                    "[INFO] Snapshot refreshed: {} players, {} matches",
                    state.players.len(),
                    state.matches.len()
                ));
            }
        }
        Delta::Log(line) => state.push_log(line),
    }
}
