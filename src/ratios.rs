use std::collections::HashMap;

use crate::model::PlayerId;
use crate::season_stats::PlayerSeasonStats;

/// Per-match and per-goalkeeping-turn rates derived from season totals.
/// Never stored; rebuilt alongside the totals on every refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Ratios {
    pub goal_ratio: f64,
    pub assist_ratio: f64,
    pub ga_ratio: f64,
    pub conceded_ratio: f64,
    pub gk_rate: f64,
    pub presence_pct: f64,
    pub win_pct: f64,
    pub draw_pct: f64,
    pub loss_pct: f64,
    pub mvp_pct: f64,
    pub points: u32,
}

/// Derive all ratios for one player.
///
/// A zero denominator (no matches played, no goalkeeping turns) is
/// substituted with 1 so that every ratio stays a plain number: a
/// zero-appearance player reports 0.0 across the board rather than
/// NaN or infinity.
pub fn compute_ratios(stats: &PlayerSeasonStats, total_global_matches: u32) -> Ratios {
    let mp = f64::from(stats.matches.max(1));
    let gk = f64::from(stats.gk_turns.max(1));
    let global = f64::from(total_global_matches.max(1));

    Ratios {
        goal_ratio: round2(f64::from(stats.goals) / mp),
        assist_ratio: round2(f64::from(stats.assists) / mp),
        ga_ratio: round2(f64::from(stats.ga()) / mp),
        conceded_ratio: round2(f64::from(stats.gk_conceded) / gk),
        gk_rate: round2(f64::from(stats.gk_turns) / mp),
        presence_pct: (f64::from(stats.matches) / global * 100.0).round(),
        win_pct: f64::from(stats.wins) / mp * 100.0,
        draw_pct: f64::from(stats.draws) / mp * 100.0,
        loss_pct: f64::from(stats.losses) / mp * 100.0,
        mvp_pct: f64::from(stats.mvps) / mp * 100.0,
        points: stats.wins * 3 + stats.draws,
    }
}

pub fn compute_all_ratios(
    stats: &HashMap<PlayerId, PlayerSeasonStats>,
    total_global_matches: u32,
) -> HashMap<PlayerId, Ratios> {
    stats
        .iter()
        .map(|(id, s)| (*id, compute_ratios(s, total_global_matches)))
        .collect()
}

// Display ratios are kept at two decimals, matching how they are shown
// and ranked.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
