use chrono::{DateTime, Utc};

use crate::model::{finished_chronological, Match, MatchStat, PlayerId};

/// One best-ever single-match performance: the value that set the
/// record plus the match and stat line it came from.
#[derive(Debug, Clone)]
pub struct HighlightRecord {
    pub value: u32,
    pub match_id: i64,
    pub date: DateTime<Utc>,
    pub stat: MatchStat,
}

/// Per-category records for one player. Categories a player never
/// qualified for stay `None`.
#[derive(Debug, Clone, Default)]
pub struct HighlightSet {
    pub goals: Option<HighlightRecord>,
    pub assists: Option<HighlightRecord>,
    pub goal_assists: Option<HighlightRecord>,
    pub mvp: Option<HighlightRecord>,
    pub mini_clean_sheet: Option<HighlightRecord>,
    pub wall: Option<HighlightRecord>,
}

impl HighlightSet {
    pub fn is_empty(&self) -> bool {
        self.goals.is_none()
            && self.assists.is_none()
            && self.goal_assists.is_none()
            && self.mvp.is_none()
            && self.mini_clean_sheet.is_none()
            && self.wall.is_none()
    }
}

/// Scan the player's finished matches in chronological order and keep
/// the best single-match performance per category.
///
/// Count categories require a strictly greater value to replace the
/// record, so the earliest of equal performances stays. The MVP record
/// is simply the first MVP match. The wall record has its own
/// precedence: a clean sheet always beats a non-clean performance, and
/// among performances of equal cleanliness the one with strictly more
/// turns survives.
pub fn find_highlights(player_id: PlayerId, matches: &[Match]) -> HighlightSet {
    let mut set = HighlightSet::default();

    for m in finished_chronological(matches) {
        let Some(line) = m.stat_for(player_id) else {
            continue;
        };

        track_count(&mut set.goals, line.goals, m, line);
        track_count(&mut set.assists, line.assists, m, line);
        track_count(&mut set.goal_assists, line.goal_assists(), m, line);

        if line.is_mvp && set.mvp.is_none() {
            set.mvp = Some(record(0, m, line));
        }

        if line.played_in_goal() {
            track_count(&mut set.mini_clean_sheet, line.mini_clean_sheets(), m, line);
            track_wall(&mut set.wall, m, line);
        }
    }

    set
}

fn record(value: u32, m: &Match, line: &MatchStat) -> HighlightRecord {
    HighlightRecord {
        value,
        match_id: m.id,
        date: m.date,
        stat: line.clone(),
    }
}

fn track_count(slot: &mut Option<HighlightRecord>, value: u32, m: &Match, line: &MatchStat) {
    if value == 0 {
        return;
    }
    let beats = match slot {
        None => true,
        Some(current) => value > current.value,
    };
    if beats {
        *slot = Some(record(value, m, line));
    }
}

fn track_wall(slot: &mut Option<HighlightRecord>, m: &Match, line: &MatchStat) {
    let candidate_clean = line.kept_clean_sheet();
    let replaces = match slot {
        None => true,
        Some(current) => {
            let current_clean = current.stat.kept_clean_sheet();
            if candidate_clean != current_clean {
                // A clean sheet displaces an unclean record; never the
                // other way around.
                candidate_clean
            } else {
                line.gk_turns > current.stat.gk_turns
            }
        }
    };
    if replaces {
        *slot = Some(record(line.gk_turns, m, line));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MatchStatus, Team};
    use chrono::TimeZone;

    fn keeper_match(id: i64, day: u32, gk_turns: u32, gk_conceded: u32) -> Match {
        Match {
            id,
            date: Utc.with_ymd_and_hms(2025, 4, day, 21, 0, 0).unwrap(),
            status: MatchStatus::Finished,
            team_a_score: 0,
            team_b_score: gk_conceded,
            stats: vec![MatchStat {
                id,
                match_id: id,
                player_id: 1,
                team: Team::A,
                goals: 0,
                assists: 0,
                gk_turns,
                gk_conceded,
                is_mvp: false,
                is_candidate: false,
                player_name: None,
            }],
        }
    }

    #[test]
    fn wall_never_regresses_from_clean_to_unclean() {
        // (3 turns clean) -> (10 turns, 1 conceded) -> (5 turns clean)
        let matches = vec![
            keeper_match(1, 1, 3, 0),
            keeper_match(2, 8, 10, 1),
            keeper_match(3, 15, 5, 0),
        ];

        let after_one = find_highlights(1, &matches[..1]);
        assert_eq!(after_one.wall.as_ref().map(|r| r.match_id), Some(1));

        let after_two = find_highlights(1, &matches[..2]);
        assert_eq!(after_two.wall.as_ref().map(|r| r.match_id), Some(1));

        let after_three = find_highlights(1, &matches);
        let wall = after_three.wall.expect("wall record");
        assert_eq!(wall.match_id, 3);
        assert_eq!(wall.stat.gk_turns, 5);
        assert_eq!(wall.stat.gk_conceded, 0);
    }

    #[test]
    fn wall_among_unclean_goes_to_more_turns() {
        let matches = vec![keeper_match(1, 1, 4, 2), keeper_match(2, 8, 6, 3)];
        let set = find_highlights(1, &matches);
        assert_eq!(set.wall.map(|r| r.match_id), Some(2));
    }

    #[test]
    fn equal_count_keeps_the_first_match() {
        let mut first = keeper_match(1, 1, 0, 0);
        first.stats[0].goals = 3;
        let mut second = keeper_match(2, 8, 0, 0);
        second.stats[0].goals = 3;
        let set = find_highlights(1, &[first, second]);
        assert_eq!(set.goals.map(|r| r.match_id), Some(1));
    }

    #[test]
    fn zero_values_never_qualify() {
        let matches = vec![keeper_match(1, 1, 2, 2)];
        let set = find_highlights(1, &matches);
        assert!(set.goals.is_none());
        assert!(set.assists.is_none());
        assert!(set.goal_assists.is_none());
        // Two turns, two conceded: no positive mini clean sheet.
        assert!(set.mini_clean_sheet.is_none());
        // But the wall record still exists, it just is not clean.
        assert!(set.wall.is_some());
    }

    #[test]
    fn mvp_keeps_the_first_award() {
        let mut first = keeper_match(1, 1, 0, 0);
        first.stats[0].is_mvp = true;
        let mut second = keeper_match(2, 8, 0, 0);
        second.stats[0].is_mvp = true;
        let set = find_highlights(1, &[second, first.clone()]);
        // Input order does not matter; chronological order does.
        assert_eq!(set.mvp.map(|r| r.match_id), Some(1));
    }
}
