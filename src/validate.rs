use std::fmt;

use crate::model::{Match, PlayerId, Team};

/// One internally contradictory fact inside a recorded match. Advisory
/// only: issues are shown on the audit screen, never block anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyIssue {
    /// Sum of a team's conceded goals disagrees with the opponents'
    /// recorded score.
    ConcededMismatch {
        team: Team,
        summed_conceded: u32,
        opponent_score: u32,
    },
    /// A team recorded more assists than goals.
    AssistsExceedGoals {
        team: Team,
        assists: u32,
        goals: u32,
    },
    /// A stat line conceded more goals than goalkeeping turns taken.
    ConcededExceedsTurns {
        player_id: PlayerId,
        gk_conceded: u32,
        gk_turns: u32,
    },
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyIssue::ConcededMismatch {
                team,
                summed_conceded,
                opponent_score,
            } => write!(
                f,
                "team {team:?} conceded sum {summed_conceded} != opponents' score {opponent_score}"
            ),
            ConsistencyIssue::AssistsExceedGoals { team, assists, goals } => {
                write!(f, "team {team:?} has {assists} assists for {goals} goals")
            }
            ConsistencyIssue::ConcededExceedsTurns {
                player_id,
                gk_conceded,
                gk_turns,
            } => write!(
                f,
                "player {player_id} conceded {gk_conceded} in {gk_turns} goalkeeping turns"
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TeamSums {
    goals: u32,
    assists: u32,
    conceded: u32,
}

/// Cross-check a match's stat lines against its scoreline. Scheduled
/// matches carry no meaningful statistics and are exempt.
pub fn match_issues(m: &Match) -> Vec<ConsistencyIssue> {
    if !m.is_finished() {
        return Vec::new();
    }

    let mut a = TeamSums::default();
    let mut b = TeamSums::default();
    let mut issues = Vec::new();

    for line in &m.stats {
        let sums = match line.team {
            Team::A => &mut a,
            Team::B => &mut b,
        };
        sums.goals += line.goals;
        sums.assists += line.assists;
        sums.conceded += line.gk_conceded;

        if line.gk_conceded > line.gk_turns {
            issues.push(ConsistencyIssue::ConcededExceedsTurns {
                player_id: line.player_id,
                gk_conceded: line.gk_conceded,
                gk_turns: line.gk_turns,
            });
        }
    }

    // What team A let in must equal what team B scored, and vice versa.
    if a.conceded != m.team_b_score {
        issues.push(ConsistencyIssue::ConcededMismatch {
            team: Team::A,
            summed_conceded: a.conceded,
            opponent_score: m.team_b_score,
        });
    }
    if b.conceded != m.team_a_score {
        issues.push(ConsistencyIssue::ConcededMismatch {
            team: Team::B,
            summed_conceded: b.conceded,
            opponent_score: m.team_a_score,
        });
    }
    if a.assists > a.goals {
        issues.push(ConsistencyIssue::AssistsExceedGoals {
            team: Team::A,
            assists: a.assists,
            goals: a.goals,
        });
    }
    if b.assists > b.goals {
        issues.push(ConsistencyIssue::AssistsExceedGoals {
            team: Team::B,
            assists: b.assists,
            goals: b.goals,
        });
    }

    issues
}

pub fn match_has_issues(m: &Match) -> bool {
    !match_issues(m).is_empty()
}
