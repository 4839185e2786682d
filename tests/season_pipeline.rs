use std::fs;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};

use calcetto_terminal::highlights::find_highlights;
use calcetto_terminal::model::{Match, MatchStat, MatchStatus, Team};
use calcetto_terminal::rank::{build_rows, leaderboard, rank_metric, Metric};
use calcetto_terminal::ratios::{compute_all_ratios, compute_ratios};
use calcetto_terminal::season_stats::{compute_player_stats, total_finished_matches};
use calcetto_terminal::store_fetch::{parse_matches_json, parse_players_json};
use calcetto_terminal::validate::{match_has_issues, match_issues};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn fixture_season_aggregates_end_to_end() {
    let players = parse_players_json(&read_fixture("players.json")).expect("players");
    let matches = parse_matches_json(&read_fixture("matches.json")).expect("matches");

    let total = total_finished_matches(&matches);
    assert_eq!(total, 2);

    let stats = compute_player_stats(&players, &matches);

    let marco = stats[&1];
    assert_eq!(marco.matches, 1);
    assert_eq!(marco.goals, 2);
    assert_eq!(marco.assists, 1);
    assert_eq!((marco.wins, marco.draws, marco.losses), (1, 0, 0));
    assert_eq!(marco.mvps, 1);

    let luca = stats[&2];
    assert_eq!(luca.matches, 2);
    assert_eq!(luca.goals, 2);
    assert_eq!((luca.wins, luca.draws, luca.losses), (0, 1, 1));
    assert_eq!(luca.gk_turns, 4);
    assert_eq!(luca.gk_conceded, 3);
    assert_eq!(luca.mini_clean_sheets, 1);
    assert_eq!(luca.clean_sheets, 0);
    assert_eq!(luca.candidates, 2);

    let ratios = compute_all_ratios(&stats, total);
    assert_eq!(ratios[&1].goal_ratio, 2.0);
    assert_eq!(ratios[&2].conceded_ratio, 0.75);
    assert_eq!(ratios[&2].presence_pct, 100.0);
    assert_eq!(ratios[&1].presence_pct, 50.0);

    // Goals leaderboard: Marco and Luca tie on 2 but Marco's ratio is
    // better; Gigi never scored.
    let roster: Vec<i64> = players.iter().map(|p| p.id).collect();
    let rows = build_rows(&roster, &stats, &ratios);
    let ranks = rank_metric(&rows, Metric::Goals);
    assert_eq!(ranks[&1], 1);
    assert_eq!(ranks[&2], 1);
    assert_eq!(ranks[&4], 3);
    assert_eq!(ranks[&3], 4);
    let order = leaderboard(&rows, Metric::Goals);
    assert_eq!(&order[..2], &[1, 2]);

    // Luca's wall: both keeper outings are unclean, the one with more
    // turns survives.
    let highlights = find_highlights(2, &matches);
    let wall = highlights.wall.expect("luca has a wall record");
    assert_eq!(wall.match_id, 101);
    assert_eq!(wall.stat.gk_turns, 3);

    // Fixture 102 was built with a conceded shortfall on team A.
    let flagged: Vec<i64> = matches
        .iter()
        .filter(|m| match_has_issues(m))
        .map(|m| m.id)
        .collect();
    assert_eq!(flagged, vec![102]);
}

fn synthetic_match(team_b_keeper_conceded: u32, team_a_score: u32) -> Match {
    Match {
        id: 1,
        date: Utc.with_ymd_and_hms(2025, 3, 3, 21, 0, 0).unwrap(),
        status: MatchStatus::Finished,
        team_a_score,
        team_b_score: 1,
        stats: vec![
            MatchStat {
                id: 1,
                match_id: 1,
                player_id: 1,
                team: Team::A,
                goals: 2,
                assists: 1,
                gk_turns: 1,
                gk_conceded: 1,
                is_mvp: false,
                is_candidate: false,
                player_name: None,
            },
            MatchStat {
                id: 2,
                match_id: 1,
                player_id: 2,
                team: Team::B,
                goals: 1,
                assists: 0,
                gk_turns: 1,
                gk_conceded: team_b_keeper_conceded,
                is_mvp: false,
                is_candidate: false,
                player_name: None,
            },
        ],
    }
}

/// The single-match round trip: aggregate one synthetic match, check
/// the derived ratios, and check the validator on both the mismatching
/// and the reconciling variant.
#[test]
fn single_match_round_trip() {
    let players = parse_players_json(&read_fixture("players.json")).expect("players");

    // Player 2 concedes twice in one turn while team A only scored 2:
    // the ratios still come out, and the validator complains.
    let mismatching = synthetic_match(2, 2);
    let stats = compute_player_stats(&players, &[mismatching.clone()]);
    assert_eq!(compute_ratios(&stats[&1], 1).goal_ratio, 2.0);
    assert_eq!(compute_ratios(&stats[&2], 1).conceded_ratio, 2.0);

    let issues = match_issues(&mismatching);
    assert!(match_has_issues(&mismatching));
    // Both the per-line overrun (2 conceded in 1 turn) and, with team A
    // scoring 2 against 2 recorded conceded, no score mismatch for B.
    assert!(!issues.is_empty());

    // Reconciling variant: one conceded goal per side's keeper, scores
    // 1-1, everything sums.
    let mut reconciling = synthetic_match(1, 1);
    reconciling.stats[0].goals = 1;
    reconciling.stats[0].assists = 0;
    assert!(!match_has_issues(&reconciling));
}
