use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use calcetto_terminal::highlights::find_highlights;
use calcetto_terminal::rank::{build_rows, rank_all};
use calcetto_terminal::ratios::compute_all_ratios;
use calcetto_terminal::season_stats::{compute_player_stats, total_finished_matches};
use calcetto_terminal::store_feed::demo_season;
use calcetto_terminal::store_fetch::parse_matches_json;

fn bench_matches_parse(c: &mut Criterion) {
    c.bench_function("matches_parse", |b| {
        b.iter(|| {
            let matches = parse_matches_json(black_box(MATCHES_JSON)).unwrap();
            black_box(matches.len());
        })
    });
}

fn bench_season_aggregate(c: &mut Criterion) {
    let (players, matches) = demo_season();
    c.bench_function("season_aggregate", |b| {
        b.iter(|| {
            let stats = compute_player_stats(black_box(&players), black_box(&matches));
            black_box(stats.len());
        })
    });
}

fn bench_rank_all(c: &mut Criterion) {
    let (players, matches) = demo_season();
    let total = total_finished_matches(&matches);
    let stats = compute_player_stats(&players, &matches);
    let ratios = compute_all_ratios(&stats, total);
    let roster: Vec<i64> = players.iter().map(|p| p.id).collect();
    let rows = build_rows(&roster, &stats, &ratios);

    c.bench_function("rank_all", |b| {
        b.iter(|| {
            let tables = rank_all(black_box(&rows));
            black_box(tables.len());
        })
    });
}

fn bench_highlights_scan(c: &mut Criterion) {
    let (players, matches) = demo_season();
    c.bench_function("highlights_scan", |b| {
        b.iter(|| {
            for player in &players {
                let set = find_highlights(black_box(player.id), black_box(&matches));
                black_box(set.is_empty());
            }
        })
    });
}

criterion_group!(
    perf,
    bench_matches_parse,
    bench_season_aggregate,
    bench_rank_all,
    bench_highlights_scan
);
criterion_main!(perf);

static MATCHES_JSON: &str = include_str!("../tests/fixtures/matches.json");
