use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw record types mirroring the `players`, `matches` and `match_stats`
/// tables of the remote store. The engine never mutates these; every
/// derived structure is recomputed from a full snapshot.
pub type PlayerId = i64;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    Scheduled,
    Finished,
}

/// One player's participation line within one match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchStat {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub match_id: i64,
    pub player_id: PlayerId,
    pub team: Team,
    #[serde(default)]
    pub goals: u32,
    #[serde(default)]
    pub assists: u32,
    #[serde(default)]
    pub gk_turns: u32,
    #[serde(default)]
    pub gk_conceded: u32,
    #[serde(default)]
    pub is_mvp: bool,
    #[serde(default)]
    pub is_candidate: bool,
    /// Denormalized display name embedded by the store; not used by any
    /// computation.
    #[serde(default)]
    pub player_name: Option<String>,
}

impl MatchStat {
    pub fn goal_assists(&self) -> u32 {
        self.goals + self.assists
    }

    /// Goalkeeping turns survived without conceding in this match.
    pub fn mini_clean_sheets(&self) -> u32 {
        self.gk_turns.saturating_sub(self.gk_conceded)
    }

    pub fn played_in_goal(&self) -> bool {
        self.gk_turns > 0
    }

    pub fn kept_clean_sheet(&self) -> bool {
        self.gk_turns > 0 && self.gk_conceded == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub status: MatchStatus,
    #[serde(default)]
    pub team_a_score: u32,
    #[serde(default)]
    pub team_b_score: u32,
    #[serde(default)]
    pub stats: Vec<MatchStat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    TeamA,
    TeamB,
    Draw,
}

impl Match {
    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    pub fn outcome(&self) -> MatchOutcome {
        if self.team_a_score > self.team_b_score {
            MatchOutcome::TeamA
        } else if self.team_b_score > self.team_a_score {
            MatchOutcome::TeamB
        } else {
            MatchOutcome::Draw
        }
    }

    pub fn stat_for(&self, player_id: PlayerId) -> Option<&MatchStat> {
        self.stats.iter().find(|s| s.player_id == player_id)
    }

    /// Final score from one team's point of view.
    pub fn score_for(&self, team: Team) -> (u32, u32) {
        match team {
            Team::A => (self.team_a_score, self.team_b_score),
            Team::B => (self.team_b_score, self.team_a_score),
        }
    }
}

impl MatchOutcome {
    pub fn won_by(&self, team: Team) -> bool {
        matches!(
            (self, team),
            (MatchOutcome::TeamA, Team::A) | (MatchOutcome::TeamB, Team::B)
        )
    }
}

/// Chronological order: date first, id as a deterministic fallback for
/// matches recorded with the same timestamp.
pub fn sort_chronological(matches: &mut [Match]) {
    matches.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
}

/// Finished matches in chronological order; the shape every derivation
/// pass consumes.
pub fn finished_chronological(matches: &[Match]) -> Vec<&Match> {
    let mut finished: Vec<&Match> = matches.iter().filter(|m| m.is_finished()).collect();
    finished.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
    finished
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bare_match(id: i64, a: u32, b: u32) -> Match {
        Match {
            id,
            date: Utc.with_ymd_and_hms(2025, 3, 10, 21, 0, 0).unwrap(),
            status: MatchStatus::Finished,
            team_a_score: a,
            team_b_score: b,
            stats: Vec::new(),
        }
    }

    #[test]
    fn outcome_follows_scoreline() {
        assert_eq!(bare_match(1, 5, 3).outcome(), MatchOutcome::TeamA);
        assert_eq!(bare_match(2, 2, 6).outcome(), MatchOutcome::TeamB);
        assert_eq!(bare_match(3, 4, 4).outcome(), MatchOutcome::Draw);
    }

    #[test]
    fn same_day_matches_order_by_id() {
        let mut matches = vec![bare_match(7, 1, 0), bare_match(3, 0, 1)];
        sort_chronological(&mut matches);
        assert_eq!(matches[0].id, 3);
        assert_eq!(matches[1].id, 7);
    }

    #[test]
    fn clean_sheet_needs_turns_and_zero_conceded() {
        let mut line = MatchStat {
            id: 1,
            match_id: 1,
            player_id: 1,
            team: Team::A,
            goals: 0,
            assists: 0,
            gk_turns: 0,
            gk_conceded: 0,
            is_mvp: false,
            is_candidate: false,
            player_name: None,
        };
        // Never went in goal: no clean sheet to speak of.
        assert!(!line.played_in_goal());
        assert!(!line.kept_clean_sheet());

        line.gk_turns = 2;
        assert!(line.kept_clean_sheet());
        assert_eq!(line.mini_clean_sheets(), 2);

        line.gk_conceded = 1;
        assert!(!line.kept_clean_sheet());
        assert_eq!(line.mini_clean_sheets(), 1);
    }

    #[test]
    fn team_serde_uses_store_letters() {
        assert_eq!(serde_json::to_string(&Team::A).unwrap(), "\"A\"");
        let team: Team = serde_json::from_str("\"B\"").unwrap();
        assert_eq!(team, Team::B);
    }
}
