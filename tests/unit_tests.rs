// Unit tests for Nestmate Algo

use chrono::{Duration, Utc};
use uuid::Uuid;

use nestmate_algo::core::{
    decide_swipe, haversine_km, is_expired, recompute_overall, score_pair, validate_pair,
    LifecycleError, MatchPolicy, Side,
};
use nestmate_algo::models::{
    CandidateProfile, FactorScores, Match, MatchPreferences, MatchStatus, MatchType,
    ScoringWeights, SwipeAction, TargetType,
};

fn profile(id: &str, lat: f64, lon: f64) -> CandidateProfile {
    CandidateProfile {
        user_id: id.to_string(),
        name: format!("User {}", id),
        age: 27,
        gender: "female".to_string(),
        occupation: "engineer".to_string(),
        education: "bachelor".to_string(),
        religion: None,
        languages: vec!["english".to_string()],
        interests: vec!["cooking".to_string(), "cycling".to_string()],
        lifestyle_tags: vec![],
        has_children: false,
        latitude: lat,
        longitude: lon,
        state: "Lagos".to_string(),
        city: "Ikeja".to_string(),
        area: None,
        is_active: true,
    }
}

fn prefs(id: &str) -> MatchPreferences {
    MatchPreferences::default_for(id, Utc::now())
}

fn pending_match(user_action: SwipeAction, target_action: SwipeAction) -> Match {
    let now = Utc::now();
    Match {
        id: Uuid::new_v4(),
        user_id: "a".to_string(),
        target_id: "b".to_string(),
        target_type: TargetType::User,
        match_type: MatchType::Roommate,
        status: MatchStatus::Pending,
        user_action,
        target_action,
        compatibility_score: 70,
        factors: FactorScores {
            location: 70,
            budget: 70,
            lifestyle: 70,
            preferences: 70,
            schedule: 70,
            cleanliness: 70,
            social: 70,
        },
        match_reasons: vec![],
        common_interests: vec![],
        shared_preferences: vec![],
        distance_km: Some(4.0),
        budget_overlap_pct: Some(70),
        same_state: true,
        expires_at: now + Duration::days(14),
        last_interaction_at: now,
        matched_at: None,
        view_count: 0,
        first_viewed_at: None,
        response_latency_secs: None,
        created_at: now,
    }
}

#[test]
fn test_haversine_zero_distance() {
    let d = haversine_km(6.5244, 3.3792, 6.5244, 3.3792);
    assert!(d < 0.01);
}

#[test]
fn test_scoring_is_deterministic() {
    let a = profile("a", 6.6018, 3.3515);
    let b = profile("b", 6.6100, 3.3600);
    let pa = prefs("a");
    let pb = prefs("b");
    let weights = ScoringWeights::default();

    let runs: Vec<_> = (0..5)
        .map(|_| score_pair(&a, &b, &pa, &pb, &weights))
        .collect();

    for r in &runs[1..] {
        assert_eq!(r.overall, runs[0].overall);
        assert_eq!(r.factors, runs[0].factors);
        assert_eq!(r.distance_km, runs[0].distance_km);
    }
}

#[test]
fn test_scores_are_bounded_integers_across_inputs() {
    let weights = ScoringWeights::default();
    // Sweep a grid of profile positions and preference extremes
    for i in 0..20u32 {
        let a = profile("a", 6.5, 3.3);
        let b = profile("b", 6.5 + i as f64 * 0.01, 3.3 + i as f64 * 0.005);
        let mut pa = prefs("a");
        let mut pb = prefs("b");
        pa.budget_min = 10_000 * i;
        pa.budget_max = 10_000 * i + 50_000;
        pb.budget_flexibility_pct = (i * 5).min(100) as u8;
        pa.lifestyle.cleanliness_level = (1 + i % 10) as u8;
        pb.schedule.social_level = (1 + (i * 3) % 10) as u8;

        let r = score_pair(&a, &b, &pa, &pb, &weights);
        assert!(r.overall <= 100);
        for f in r.factors.all() {
            assert!(f <= 100);
        }
    }
}

#[test]
fn test_overall_recomputation_is_stable() {
    let a = profile("a", 6.6018, 3.3515);
    let b = profile("b", 6.6100, 3.3600);
    let weights = ScoringWeights::default();

    let r = score_pair(&a, &b, &prefs("a"), &prefs("b"), &weights);

    // Recomputing from the stored factors must reproduce the stored overall
    assert_eq!(recompute_overall(&r.factors, &weights), r.overall);
}

#[test]
fn test_mutual_match_from_either_order() {
    // A's row after B already liked: A's like settles it
    let row = pending_match(SwipeAction::None, SwipeAction::Liked);
    let outcome = decide_swipe(&row, Side::User, SwipeAction::Liked).unwrap();
    assert_eq!(outcome.status, MatchStatus::Matched);
    assert!(outcome.mutual);

    // Same pair, other side acting second
    let row = pending_match(SwipeAction::SuperLiked, SwipeAction::None);
    let outcome = decide_swipe(&row, Side::Target, SwipeAction::Liked).unwrap();
    assert!(outcome.mutual);
}

#[test]
fn test_pass_is_terminal_rejection() {
    let row = pending_match(SwipeAction::None, SwipeAction::Liked);
    let outcome = decide_swipe(&row, Side::User, SwipeAction::Passed).unwrap();
    assert_eq!(outcome.status, MatchStatus::Rejected);
    assert!(!outcome.mutual);
}

#[test]
fn test_settled_rows_reject_further_swipes() {
    for status in [
        MatchStatus::Matched,
        MatchStatus::Rejected,
        MatchStatus::Expired,
        MatchStatus::Blocked,
    ] {
        let mut row = pending_match(SwipeAction::Liked, SwipeAction::None);
        row.status = status;
        let err = decide_swipe(&row, Side::User, SwipeAction::Liked).unwrap_err();
        assert_eq!(err, LifecycleError::NotPending(status));
    }
}

#[test]
fn test_self_pair_is_invalid() {
    assert!(matches!(
        validate_pair("u1", "u1"),
        Err(LifecycleError::SelfTarget(_))
    ));
}

#[test]
fn test_expiry_is_monotonic() {
    let mut row = pending_match(SwipeAction::None, SwipeAction::None);
    row.expires_at = Utc::now() - Duration::days(1);

    assert!(is_expired(&row, Utc::now()));

    // Once expired, the row is terminal: no swipe can reopen it
    row.status = MatchStatus::Expired;
    assert!(!is_expired(&row, Utc::now()));
    assert!(decide_swipe(&row, Side::User, SwipeAction::Liked).is_err());
}

#[test]
fn test_offer_window_policy() {
    let policy = MatchPolicy::default();
    let now = Utc::now();
    let deadline = policy.offer_deadline(now);
    assert_eq!(deadline - now, Duration::days(14));
}

#[test]
fn test_budget_flexibility_example_scenarios() {
    // [50k,150k] at 10% flexibility stretches to [45k,165k]
    let mut flexible = prefs("a");
    flexible.budget_min = 50_000;
    flexible.budget_max = 150_000;
    flexible.budget_flexibility_pct = 10;
    let (min, max) = flexible.effective_budget();
    assert_eq!(min, 45_000.0);
    assert_eq!(max, 165_000.0);
    assert!(160_000.0 <= max);

    // [50k,100k] at 0% admits nothing past 100k
    let mut rigid = prefs("b");
    rigid.budget_min = 50_000;
    rigid.budget_max = 100_000;
    rigid.budget_flexibility_pct = 0;
    let (_, max) = rigid.effective_budget();
    assert!(160_000.0 > max);
}
