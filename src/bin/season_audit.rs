use std::process::ExitCode;

use anyhow::Result;

use calcetto_terminal::http::StoreConfig;
use calcetto_terminal::model::Match;
use calcetto_terminal::persist;
use calcetto_terminal::store_fetch::fetch_matches;
use calcetto_terminal::validate::match_issues;

/// One-shot data audit: fetch the season (or fall back to the cached
/// snapshot), print every match the validator flags, exit non-zero if
/// anything is off. Meant for a cron mail or a quick check before
/// match night.
fn main() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let matches = match load_matches() {
        Ok(matches) => matches,
        Err(err) => {
            eprintln!("season_audit: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let mut flagged = 0usize;
    for m in &matches {
        let issues = match_issues(m);
        if issues.is_empty() {
            continue;
        }
        flagged += 1;
        println!(
            "match {} ({}) — {} issue(s):",
            m.id,
            m.date.format("%Y-%m-%d"),
            issues.len()
        );
        for issue in issues {
            println!("  - {issue}");
        }
    }

    if flagged == 0 {
        println!("all {} matches reconcile", matches.len());
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn load_matches() -> Result<Vec<Match>> {
    match StoreConfig::from_env() {
        Ok(cfg) => fetch_matches(&cfg),
        Err(env_err) => {
            if let Some(snapshot) = persist::load_snapshot() {
                eprintln!("season_audit: store not configured, using cached snapshot");
                return Ok(snapshot.matches);
            }
            Err(env_err.context("no store configured and no cached snapshot"))
        }
    }
}
