// Criterion benchmarks for Nestmate Algo

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::collections::HashSet;

use nestmate_algo::core::{bounding_box, haversine_km, recompute_overall, score_pair, CandidateSelector};
use nestmate_algo::models::{CandidateProfile, FactorScores, MatchPreferences, ScoringWeights};

fn create_candidate(id: usize, lat: f64, lon: f64) -> CandidateProfile {
    CandidateProfile {
        user_id: format!("u{}", id),
        name: format!("User {}", id),
        age: 22 + (id % 15) as u8,
        gender: if id % 2 == 0 { "female" } else { "male" }.to_string(),
        occupation: ["engineer", "nurse", "teacher", "trader"][id % 4].to_string(),
        education: "bachelor".to_string(),
        religion: None,
        languages: vec!["english".to_string()],
        interests: vec!["cooking".to_string(), "football".to_string()],
        lifestyle_tags: vec![],
        has_children: id % 7 == 0,
        latitude: lat,
        longitude: lon,
        state: "Lagos".to_string(),
        city: "Ikeja".to_string(),
        area: None,
        is_active: true,
    }
}

fn create_prefs(id: &str) -> MatchPreferences {
    MatchPreferences::default_for(id, Utc::now())
}

fn bench_haversine(c: &mut Criterion) {
    c.bench_function("haversine_km", |b| {
        b.iter(|| {
            haversine_km(
                black_box(6.5244),
                black_box(3.3792),
                black_box(6.6018),
                black_box(3.3515),
            )
        });
    });
}

fn bench_bounding_box(c: &mut Criterion) {
    c.bench_function("bounding_box_calculation", |b| {
        b.iter(|| bounding_box(black_box(6.5244), black_box(3.3792), black_box(25.0)));
    });
}

fn bench_score_pair(c: &mut Criterion) {
    let requester = create_candidate(0, 6.5244, 3.3792);
    let candidate = create_candidate(1, 6.6018, 3.3515);
    let requester_prefs = create_prefs("u0");
    let candidate_prefs = create_prefs("u1");
    let weights = ScoringWeights::default();

    c.bench_function("score_pair", |b| {
        b.iter(|| {
            score_pair(
                black_box(&requester),
                black_box(&candidate),
                black_box(&requester_prefs),
                black_box(&candidate_prefs),
                black_box(&weights),
            )
        });
    });
}

fn bench_recompute_overall(c: &mut Criterion) {
    let factors = FactorScores {
        location: 85,
        budget: 72,
        lifestyle: 90,
        preferences: 60,
        schedule: 75,
        cleanliness: 88,
        social: 65,
    };
    let weights = ScoringWeights::default();

    c.bench_function("recompute_overall", |b| {
        b.iter(|| recompute_overall(black_box(&factors), black_box(&weights)));
    });
}

fn bench_selection(c: &mut Criterion) {
    let selector = CandidateSelector::with_default_weights();
    let requester = create_candidate(0, 6.5244, 3.3792);
    let requester_prefs = create_prefs("u0");

    let mut group = c.benchmark_group("selection");

    for candidate_count in [10, 50, 100, 500, 1000].iter() {
        let pool: Vec<(CandidateProfile, MatchPreferences)> = (1..=*candidate_count)
            .map(|i| {
                let lat_offset = (i as f64 * 0.001) % 0.2;
                let lon_offset = (i as f64 * 0.001) % 0.2;
                (
                    create_candidate(i, 6.5244 + lat_offset, 3.3792 + lon_offset),
                    create_prefs(&format!("u{}", i)),
                )
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::new("select_roommates", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| {
                    selector.select_roommates(
                        black_box(&requester),
                        black_box(&requester_prefs),
                        black_box(pool.clone()),
                        black_box(&HashSet::new()),
                        black_box(&HashSet::new()),
                        black_box(50),
                        black_box(20),
                    )
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_haversine,
    bench_bounding_box,
    bench_score_pair,
    bench_recompute_overall,
    bench_selection
);

criterion_main!(benches);
