use std::env;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::http::StoreConfig;
use crate::model::{Match, MatchStat, MatchStatus, Player, Team};
use crate::persist::{self, Snapshot};
use crate::state::{Delta, ProviderCommand};
use crate::store_fetch::{fetch_matches, fetch_players};

/// Background provider: pushes the cached snapshot immediately, then
/// polls the record store, persisting every successful fetch. Without a
/// configured store (and with no cache) it serves a synthetic demo
/// season so the dashboard is explorable offline.
pub fn spawn_store_provider(tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let poll = Duration::from_secs(
            env::var("SNAPSHOT_POLL_SECS")
                .ok()
                .and_then(|val| val.parse::<u64>().ok())
                .unwrap_or(300)
                .max(30),
        );

        let mut have_data = false;
        if let Some(snapshot) = persist::load_snapshot() {
            have_data = !snapshot.matches.is_empty();
            if let Some(at) = snapshot.fetched_at_time() {
                let mins = at.elapsed().map(|d| d.as_secs() / 60).unwrap_or(0);
                let _ = tx.send(Delta::Log(format!("[INFO] Cache di {mins} min fa")));
            }
            let _ = tx.send(Delta::SetSnapshot {
                players: snapshot.players,
                matches: snapshot.matches,
                from_cache: true,
            });
        }

        let cfg = match StoreConfig::from_env() {
            Ok(cfg) => Some(cfg),
            Err(err) => {
                let _ = tx.send(Delta::Log(format!("[WARN] Store not configured: {err}")));
                if !have_data {
                    let (players, matches) = demo_season();
                    let _ = tx.send(Delta::Log(
                        "[INFO] Serving demo season (set SUPABASE_URL to go live)".to_string(),
                    ));
                    let _ = tx.send(Delta::SetSnapshot {
                        players,
                        matches,
                        from_cache: false,
                    });
                }
                None
            }
        };

        let mut last_fetch = Instant::now()
            .checked_sub(poll)
            .unwrap_or_else(Instant::now);

        loop {
            thread::sleep(Duration::from_millis(400));

            if let Some(cfg) = &cfg {
                if last_fetch.elapsed() >= poll {
                    if let Err(err) = refresh_snapshot(cfg, &tx) {
                        let _ = tx.send(Delta::Log(format!("[WARN] Snapshot fetch error: {err}")));
                    }
                    last_fetch = Instant::now();
                }
            }

            while let Ok(cmd) = cmd_rx.try_recv() {
                match cmd {
                    ProviderCommand::Refresh => {
                        let Some(cfg) = &cfg else {
                            let _ = tx.send(Delta::Log(
                                "[INFO] Refresh ignored: store not configured".to_string(),
                            ));
                            continue;
                        };
                        if let Err(err) = refresh_snapshot(cfg, &tx) {
                            let _ =
                                tx.send(Delta::Log(format!("[WARN] Snapshot fetch error: {err}")));
                        }
                        last_fetch = Instant::now();
                    }
                }
            }
        }
    });
}

fn refresh_snapshot(cfg: &StoreConfig, tx: &Sender<Delta>) -> anyhow::Result<()> {
    let players = fetch_players(cfg)?;
    let matches = fetch_matches(cfg)?;
    persist::save_snapshot(&Snapshot::new(players.clone(), matches.clone()));
    let _ = tx.send(Delta::SetSnapshot {
        players,
        matches,
        from_cache: false,
    });
    Ok(())
}

const DEMO_ROSTER: [&str; 10] = [
    "Marco", "Luca", "Gigi", "Andrea", "Paolo", "Davide", "Simone", "Matteo", "Fabio", "Stefano",
];

/// A plausible season: ten players, fourteen finished Monday fixtures
/// and one scheduled, with reconciling stat lines except for one match
/// left deliberately inconsistent so the audit screen has something to
/// show.
pub fn demo_season() -> (Vec<Player>, Vec<Match>) {
    let mut rng = rand::thread_rng();

    let players: Vec<Player> = DEMO_ROSTER
        .iter()
        .enumerate()
        .map(|(idx, name)| Player {
            id: idx as i64 + 1,
            name: (*name).to_string(),
            avatar_url: None,
        })
        .collect();

    let season_start = Utc.with_ymd_and_hms(2025, 1, 6, 21, 0, 0).single();
    let Some(season_start) = season_start else {
        return (players, Vec::new());
    };

    let mut matches = Vec::new();
    for week in 0..14 {
        let date = season_start + ChronoDuration::weeks(week);
        matches.push(demo_match(week + 1, date, &players, &mut rng));
    }

    // One match with a conceded total off by one, for the validator.
    if let Some(m) = matches.get_mut(4) {
        if let Some(line) = m.stats.iter_mut().find(|s| s.gk_conceded > 0) {
            line.gk_conceded -= 1;
        } else {
            m.team_a_score += 1;
        }
    }

    matches.push(Match {
        id: 15,
        date: season_start + ChronoDuration::weeks(15),
        status: MatchStatus::Scheduled,
        team_a_score: 0,
        team_b_score: 0,
        stats: Vec::new(),
    });

    (players, matches)
}

fn demo_match(
    id: i64,
    date: chrono::DateTime<Utc>,
    players: &[Player],
    rng: &mut impl Rng,
) -> Match {
    let mut ids: Vec<i64> = players.iter().map(|p| p.id).collect();
    ids.shuffle(rng);
    let (side_a, side_b) = ids.split_at(5);

    let score_a = rng.gen_range(0..=7u32);
    let score_b = rng.gen_range(0..=7u32);

    let mut stats = Vec::new();
    stats.extend(demo_team_lines(id, side_a, Team::A, score_a, score_b, rng));
    stats.extend(demo_team_lines(id, side_b, Team::B, score_b, score_a, rng));

    // MVP from the winning side, or anyone in a draw.
    let mvp_pool: Vec<usize> = stats
        .iter()
        .enumerate()
        .filter(|(_, s)| match score_a.cmp(&score_b) {
            std::cmp::Ordering::Greater => s.team == Team::A,
            std::cmp::Ordering::Less => s.team == Team::B,
            std::cmp::Ordering::Equal => true,
        })
        .map(|(idx, _)| idx)
        .collect();
    if let Some(idx) = mvp_pool.choose(rng) {
        stats[*idx].is_mvp = true;
    }
    for _ in 0..2 {
        let idx = rng.gen_range(0..stats.len());
        if !stats[idx].is_mvp {
            stats[idx].is_candidate = true;
        }
    }

    Match {
        id,
        date,
        status: MatchStatus::Finished,
        team_a_score: score_a,
        team_b_score: score_b,
        stats,
    }
}

/// Stat lines for one side: `scored` distributed as goals (with assists
/// never exceeding them) and `conceded` distributed over the keepers so
/// the totals reconcile with the scoreline.
fn demo_team_lines(
    match_id: i64,
    side: &[i64],
    team: Team,
    scored: u32,
    conceded: u32,
    rng: &mut impl Rng,
) -> Vec<MatchStat> {
    let mut lines: Vec<MatchStat> = side
        .iter()
        .map(|player_id| MatchStat {
            id: match_id * 100 + player_id,
            match_id,
            player_id: *player_id,
            team,
            goals: 0,
            assists: 0,
            gk_turns: 0,
            gk_conceded: 0,
            is_mvp: false,
            is_candidate: false,
            player_name: None,
        })
        .collect();

    for _ in 0..scored {
        let idx = rng.gen_range(0..lines.len());
        lines[idx].goals += 1;
        if rng.gen_bool(0.6) {
            let helper = rng.gen_range(0..lines.len());
            lines[helper].assists += 1;
        }
    }
    // Keep the team invariant: assists never exceed goals.
    let goals: u32 = lines.iter().map(|l| l.goals).sum();
    let mut assists: u32 = lines.iter().map(|l| l.assists).sum();
    while assists > goals {
        if let Some(line) = lines.iter_mut().find(|l| l.assists > 0) {
            line.assists -= 1;
            assists -= 1;
        } else {
            break;
        }
    }

    // Two keepers split the goalkeeping turns and the conceded goals.
    let keeper_a = rng.gen_range(0..lines.len());
    let keeper_b = (keeper_a + 1) % lines.len();
    lines[keeper_a].gk_turns = 1;
    lines[keeper_b].gk_turns = 1;
    for i in 0..conceded {
        let keeper = if i % 2 == 0 { keeper_a } else { keeper_b };
        lines[keeper].gk_conceded += 1;
    }
    // A keeper cannot concede more than the turns they took; stretch the
    // turn count to cover what was let in.
    for line in &mut lines {
        if line.gk_conceded > line.gk_turns {
            line.gk_turns = line.gk_conceded;
        }
    }

    lines
}
