use std::collections::HashMap;

use crate::model::{finished_chronological, Match, MatchOutcome, Player, PlayerId};

/// Accumulated season totals for one player. Built only from finished
/// matches; recomputed from scratch on every snapshot refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlayerSeasonStats {
    pub matches: u32,
    pub goals: u32,
    pub assists: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub mvps: u32,
    pub candidates: u32,
    pub gk_turns: u32,
    pub gk_conceded: u32,
    pub clean_sheets: u32,
    pub mini_clean_sheets: u32,
}

impl PlayerSeasonStats {
    pub fn ga(&self) -> u32 {
        self.goals + self.assists
    }
}

/// Personal result of one finished match, newest first, for the form
/// strip on a player card. `Absent` means the match was played without
/// this player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEntry {
    Win,
    Draw,
    Loss,
    Absent,
}

/// Fold the raw snapshot into per-player season totals.
///
/// Stat lines referencing a player missing from the roster are skipped:
/// they are orphaned data (usually a deleted player), not a reason to
/// fail the whole aggregation.
pub fn compute_player_stats(
    players: &[Player],
    matches: &[Match],
) -> HashMap<PlayerId, PlayerSeasonStats> {
    let mut totals: HashMap<PlayerId, PlayerSeasonStats> = players
        .iter()
        .map(|p| (p.id, PlayerSeasonStats::default()))
        .collect();

    for m in matches.iter().filter(|m| m.is_finished()) {
        let outcome = m.outcome();
        for line in &m.stats {
            let Some(s) = totals.get_mut(&line.player_id) else {
                log::warn!(
                    "match {}: stat line {} references unknown player {}",
                    m.id,
                    line.id,
                    line.player_id
                );
                continue;
            };

            s.matches += 1;
            s.goals += line.goals;
            s.assists += line.assists;
            if line.is_mvp {
                s.mvps += 1;
            }
            if line.is_candidate {
                s.candidates += 1;
            }
            match outcome {
                MatchOutcome::Draw => s.draws += 1,
                _ if outcome.won_by(line.team) => s.wins += 1,
                _ => s.losses += 1,
            }
            if line.played_in_goal() {
                s.gk_turns += line.gk_turns;
                s.gk_conceded += line.gk_conceded;
                s.mini_clean_sheets += line.mini_clean_sheets();
                if line.kept_clean_sheet() {
                    s.clean_sheets += 1;
                }
            }
        }
    }

    totals
}

/// Count of finished matches in the snapshot; the denominator for
/// presence percentage.
pub fn total_finished_matches(matches: &[Match]) -> u32 {
    matches.iter().filter(|m| m.is_finished()).count() as u32
}

/// Walk finished matches newest first and classify each from the
/// player's point of view, up to `limit` entries.
pub fn recent_form(player_id: PlayerId, matches: &[Match], limit: usize) -> Vec<FormEntry> {
    let chronological = finished_chronological(matches);
    chronological
        .iter()
        .rev()
        .take(limit)
        .map(|m| match m.stat_for(player_id) {
            None => FormEntry::Absent,
            Some(line) => {
                let (own, opp) = m.score_for(line.team);
                if own > opp {
                    FormEntry::Win
                } else if own == opp {
                    FormEntry::Draw
                } else {
                    FormEntry::Loss
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchStat, MatchStatus, Team};
    use chrono::{TimeZone, Utc};

    fn player(id: PlayerId, name: &str) -> Player {
        Player {
            id,
            name: name.to_string(),
            avatar_url: None,
        }
    }

    fn line(player_id: PlayerId, team: Team, goals: u32, assists: u32) -> MatchStat {
        MatchStat {
            id: player_id * 100,
            match_id: 0,
            player_id,
            team,
            goals,
            assists,
            gk_turns: 0,
            gk_conceded: 0,
            is_mvp: false,
            is_candidate: false,
            player_name: None,
        }
    }

    fn finished(id: i64, day: u32, a: u32, b: u32, stats: Vec<MatchStat>) -> Match {
        Match {
            id,
            date: Utc.with_ymd_and_hms(2025, 2, day, 21, 0, 0).unwrap(),
            status: MatchStatus::Finished,
            team_a_score: a,
            team_b_score: b,
            stats,
        }
    }

    #[test]
    fn exactly_one_result_counter_per_appearance() {
        let players = vec![player(1, "Marco"), player(2, "Luca")];
        let matches = vec![
            finished(10, 3, 4, 2, vec![line(1, Team::A, 2, 0), line(2, Team::B, 1, 1)]),
            finished(11, 10, 3, 3, vec![line(1, Team::A, 1, 0), line(2, Team::B, 2, 0)]),
        ];

        let totals = compute_player_stats(&players, &matches);
        let marco = totals[&1];
        assert_eq!(marco.matches, 2);
        assert_eq!(marco.wins + marco.draws + marco.losses, marco.matches);
        assert_eq!((marco.wins, marco.draws, marco.losses), (1, 1, 0));
        let luca = totals[&2];
        assert_eq!((luca.wins, luca.draws, luca.losses), (0, 1, 1));
    }

    #[test]
    fn scheduled_matches_are_ignored() {
        let players = vec![player(1, "Marco")];
        let mut m = finished(10, 3, 0, 0, vec![line(1, Team::A, 3, 0)]);
        m.status = MatchStatus::Scheduled;
        let totals = compute_player_stats(&players, &[m]);
        assert_eq!(totals[&1], PlayerSeasonStats::default());
    }

    #[test]
    fn orphan_stat_line_is_skipped() {
        let players = vec![player(1, "Marco")];
        let matches = vec![finished(
            10,
            3,
            2,
            0,
            vec![line(1, Team::A, 2, 0), line(99, Team::B, 5, 5)],
        )];
        let totals = compute_player_stats(&players, &matches);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[&1].goals, 2);
    }

    #[test]
    fn goalkeeping_counters() {
        let players = vec![player(1, "Gigi")];
        let mut keeper = line(1, Team::A, 0, 0);
        keeper.gk_turns = 3;
        keeper.gk_conceded = 1;
        let mut clean = line(1, Team::A, 0, 0);
        clean.gk_turns = 2;
        clean.gk_conceded = 0;
        let matches = vec![
            finished(10, 3, 1, 1, vec![keeper]),
            finished(11, 10, 1, 0, vec![clean]),
        ];

        let totals = compute_player_stats(&players, &matches);
        let gigi = totals[&1];
        assert_eq!(gigi.gk_turns, 5);
        assert_eq!(gigi.gk_conceded, 1);
        assert_eq!(gigi.mini_clean_sheets, 4);
        assert_eq!(gigi.clean_sheets, 1);
    }

    #[test]
    fn form_is_newest_first_with_absences() {
        let matches = vec![
            finished(10, 3, 2, 0, vec![line(1, Team::A, 1, 0)]),
            finished(11, 10, 0, 1, vec![line(1, Team::A, 0, 0)]),
            finished(12, 17, 1, 1, vec![]),
        ];
        let form = recent_form(1, &matches, 5);
        assert_eq!(form, vec![FormEntry::Absent, FormEntry::Loss, FormEntry::Win]);
    }
}
