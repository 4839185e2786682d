use std::cmp::Ordering;
use std::collections::HashMap;

use rayon::prelude::*;

use crate::model::PlayerId;
use crate::ratios::Ratios;
use crate::season_stats::PlayerSeasonStats;

/// Every key the leaderboard can rank, totals and ratios alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Matches,
    Goals,
    Assists,
    GoalAssists,
    Wins,
    Draws,
    Losses,
    Mvps,
    Candidates,
    CleanSheets,
    MiniCleanSheets,
    GkTurns,
    GkConceded,
    Points,
    GoalRatio,
    AssistRatio,
    GaRatio,
    ConcededRatio,
    GkRate,
    PresencePct,
    WinPct,
    MvpPct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherBetter,
    LowerBetter,
}

impl Metric {
    pub const ALL: [Metric; 22] = [
        Metric::Matches,
        Metric::Goals,
        Metric::Assists,
        Metric::GoalAssists,
        Metric::Wins,
        Metric::Draws,
        Metric::Losses,
        Metric::Mvps,
        Metric::Candidates,
        Metric::CleanSheets,
        Metric::MiniCleanSheets,
        Metric::GkTurns,
        Metric::GkConceded,
        Metric::Points,
        Metric::GoalRatio,
        Metric::AssistRatio,
        Metric::GaRatio,
        Metric::ConcededRatio,
        Metric::GkRate,
        Metric::PresencePct,
        Metric::WinPct,
        Metric::MvpPct,
    ];

    pub fn direction(&self) -> Direction {
        match self {
            Metric::GkConceded | Metric::ConcededRatio => Direction::LowerBetter,
            _ => Direction::HigherBetter,
        }
    }

    /// Secondary key used to order players whose primary metric ties in
    /// a presented table. Rank numbers are unaffected.
    pub fn tie_break(&self) -> Option<Metric> {
        match self {
            Metric::Goals => Some(Metric::GoalRatio),
            Metric::Assists => Some(Metric::AssistRatio),
            Metric::GoalAssists => Some(Metric::GaRatio),
            Metric::CleanSheets => Some(Metric::MiniCleanSheets),
            Metric::GkConceded => Some(Metric::ConcededRatio),
            Metric::Wins => Some(Metric::WinPct),
            Metric::Mvps => Some(Metric::MvpPct),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Matches => "Presenze",
            Metric::Goals => "Gol",
            Metric::Assists => "Assist",
            Metric::GoalAssists => "G+A",
            Metric::Wins => "Vittorie",
            Metric::Draws => "Pareggi",
            Metric::Losses => "Sconfitte",
            Metric::Mvps => "MVP",
            Metric::Candidates => "Candidature",
            Metric::CleanSheets => "Clean Sheet",
            Metric::MiniCleanSheets => "Mini CS",
            Metric::GkTurns => "Turni Porta",
            Metric::GkConceded => "Gol Subiti",
            Metric::Points => "Punti",
            Metric::GoalRatio => "Rateo Gol",
            Metric::AssistRatio => "Rateo Assist",
            Metric::GaRatio => "Rateo G+A",
            Metric::ConcededRatio => "Rateo Subiti",
            Metric::GkRate => "Rateo Porta",
            Metric::PresencePct => "% Presenza",
            Metric::WinPct => "Win Rate",
            Metric::MvpPct => "MVP Rate",
        }
    }
}

/// One player's derived values, the unit the rank passes consume.
#[derive(Debug, Clone, Copy)]
pub struct MetricRow {
    pub player_id: PlayerId,
    pub stats: PlayerSeasonStats,
    pub ratios: Ratios,
}

pub fn metric_value(row: &MetricRow, metric: Metric) -> f64 {
    match metric {
        Metric::Matches => f64::from(row.stats.matches),
        Metric::Goals => f64::from(row.stats.goals),
        Metric::Assists => f64::from(row.stats.assists),
        Metric::GoalAssists => f64::from(row.stats.ga()),
        Metric::Wins => f64::from(row.stats.wins),
        Metric::Draws => f64::from(row.stats.draws),
        Metric::Losses => f64::from(row.stats.losses),
        Metric::Mvps => f64::from(row.stats.mvps),
        Metric::Candidates => f64::from(row.stats.candidates),
        Metric::CleanSheets => f64::from(row.stats.clean_sheets),
        Metric::MiniCleanSheets => f64::from(row.stats.mini_clean_sheets),
        Metric::GkTurns => f64::from(row.stats.gk_turns),
        Metric::GkConceded => f64::from(row.stats.gk_conceded),
        Metric::Points => f64::from(row.ratios.points),
        Metric::GoalRatio => row.ratios.goal_ratio,
        Metric::AssistRatio => row.ratios.assist_ratio,
        Metric::GaRatio => row.ratios.ga_ratio,
        Metric::ConcededRatio => row.ratios.conceded_ratio,
        Metric::GkRate => row.ratios.gk_rate,
        Metric::PresencePct => row.ratios.presence_pct,
        Metric::WinPct => row.ratios.win_pct,
        Metric::MvpPct => row.ratios.mvp_pct,
    }
}

fn compare(a: f64, b: f64, direction: Direction) -> Ordering {
    match direction {
        Direction::HigherBetter => b.total_cmp(&a),
        Direction::LowerBetter => a.total_cmp(&b),
    }
}

/// Standard competition ranking: sort by the metric in its natural
/// direction, give the first player rank 1, give every exact tie the
/// previous player's rank, and give the next distinct value its 1-based
/// position. Ties leave a gap ("1, 2, 2, 4"), never compress.
pub fn rank_metric(rows: &[MetricRow], metric: Metric) -> HashMap<PlayerId, u32> {
    let direction = metric.direction();
    let mut sorted: Vec<&MetricRow> = rows.iter().collect();
    sorted.sort_by(|a, b| compare(metric_value(a, metric), metric_value(b, metric), direction));

    let mut ranks: HashMap<PlayerId, u32> = HashMap::with_capacity(sorted.len());
    let mut prev: Option<(f64, u32)> = None;
    for (index, row) in sorted.iter().enumerate() {
        let value = metric_value(row, metric);
        let rank = match prev {
            Some((prev_value, prev_rank)) if prev_value == value => prev_rank,
            _ => index as u32 + 1,
        };
        ranks.insert(row.player_id, rank);
        prev = Some((value, rank));
    }
    ranks
}

/// One rank table per metric. Each pass is independent, so they run in
/// parallel across metrics.
pub fn rank_all(rows: &[MetricRow]) -> HashMap<Metric, HashMap<PlayerId, u32>> {
    Metric::ALL
        .par_iter()
        .map(|metric| (*metric, rank_metric(rows, *metric)))
        .collect()
}

/// Presentation order for a leaderboard: primary metric in its natural
/// direction, ties broken by the metric-specific secondary key, further
/// ties kept in insertion order (the sort is stable).
pub fn leaderboard(rows: &[MetricRow], metric: Metric) -> Vec<PlayerId> {
    let secondary = metric.tie_break();
    let mut sorted: Vec<&MetricRow> = rows.iter().collect();
    sorted.sort_by(|a, b| {
        let primary = compare(
            metric_value(a, metric),
            metric_value(b, metric),
            metric.direction(),
        );
        match (primary, secondary) {
            (Ordering::Equal, Some(key)) => compare(
                metric_value(a, key),
                metric_value(b, key),
                key.direction(),
            ),
            _ => primary,
        }
    });
    sorted.iter().map(|row| row.player_id).collect()
}

/// Assemble the rank-engine input from the two derived maps, in roster
/// order so that stable tie-breaking stays deterministic.
pub fn build_rows(
    roster: &[PlayerId],
    stats: &HashMap<PlayerId, PlayerSeasonStats>,
    ratios: &HashMap<PlayerId, Ratios>,
) -> Vec<MetricRow> {
    roster
        .iter()
        .filter_map(|id| {
            let stats = stats.get(id)?;
            let ratios = ratios.get(id)?;
            Some(MetricRow {
                player_id: *id,
                stats: *stats,
                ratios: *ratios,
            })
        })
        .collect()
}
