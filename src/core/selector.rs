use std::collections::HashSet;

use crate::core::geo::haversine_km;
use crate::core::scoring::{score_pair, score_property, ScoreBreakdown};
use crate::core::filters::{hits_deal_breaker, listing_passes_hard_filters, passes_hard_filters};
use crate::models::{
    CandidateProfile, MatchPreferences, MatchType, PropertyListing, ScoringWeights, TargetType,
};

/// A candidate that survived filtering, with its full score breakdown
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub target_id: String,
    pub target_type: TargetType,
    pub match_type: MatchType,
    pub display_name: String,
    pub breakdown: ScoreBreakdown,
    /// Whether a pending offer for this target already exists (re-shown
    /// candidates are free with respect to the daily quota)
    pub already_surfaced: bool,
}

/// Result of one selection run
#[derive(Debug)]
pub struct SelectionResult {
    pub candidates: Vec<ScoredCandidate>,
    pub total_considered: usize,
    /// Candidates that qualified but fell over the daily quota
    pub quota_deferred: usize,
}

/// Candidate selection pipeline
///
/// Filter order: self-exclusion, settled pairs, deal-breakers, hard
/// filters, then scoring and the compatibility threshold. Survivors are
/// ranked by score descending, distance ascending, and the daily quota
/// caps how many *new* candidates surface.
#[derive(Debug, Clone)]
pub struct CandidateSelector {
    weights: ScoringWeights,
}

impl CandidateSelector {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn with_default_weights() -> Self {
        Self::new(ScoringWeights::default())
    }

    /// Select roommate candidates for a requester
    ///
    /// `settled` holds target ids with a matched/rejected/blocked record,
    /// `pending` holds target ids with a live pending offer, and
    /// `remaining_quota` is today's unused daily allowance.
    pub fn select_roommates(
        &self,
        requester: &CandidateProfile,
        requester_prefs: &MatchPreferences,
        pool: Vec<(CandidateProfile, MatchPreferences)>,
        settled: &HashSet<String>,
        pending: &HashSet<String>,
        remaining_quota: usize,
        limit: usize,
    ) -> SelectionResult {
        let total_considered = pool.len();
        let threshold = requester_prefs.settings.compatibility_threshold;

        let mut scored: Vec<ScoredCandidate> = pool
            .into_iter()
            .filter(|(c, _)| c.user_id != requester.user_id)
            .filter(|(c, _)| !settled.contains(&c.user_id))
            .filter(|(c, _)| !hits_deal_breaker(c, &requester_prefs.deal_breakers))
            .filter_map(|(c, c_prefs)| {
                let distance_km = haversine_km(
                    requester.latitude,
                    requester.longitude,
                    c.latitude,
                    c.longitude,
                );
                if !passes_hard_filters(&c, &c_prefs, requester_prefs, distance_km) {
                    return None;
                }

                let breakdown = score_pair(requester, &c, requester_prefs, &c_prefs, &self.weights);
                if breakdown.overall < threshold {
                    return None;
                }

                Some(ScoredCandidate {
                    already_surfaced: pending.contains(&c.user_id),
                    target_id: c.user_id,
                    target_type: TargetType::User,
                    match_type: MatchType::Roommate,
                    display_name: c.name,
                    breakdown,
                })
            })
            .collect();

        rank(&mut scored);
        let quota_deferred = apply_quota(&mut scored, remaining_quota);
        scored.truncate(limit);

        SelectionResult {
            candidates: scored,
            total_considered,
            quota_deferred,
        }
    }

    /// Select property candidates for a requester
    pub fn select_properties(
        &self,
        requester: &CandidateProfile,
        requester_prefs: &MatchPreferences,
        pool: Vec<PropertyListing>,
        settled: &HashSet<String>,
        pending: &HashSet<String>,
        remaining_quota: usize,
        limit: usize,
    ) -> SelectionResult {
        let total_considered = pool.len();
        let threshold = requester_prefs.settings.compatibility_threshold;

        let mut scored: Vec<ScoredCandidate> = pool
            .into_iter()
            .filter(|l| !settled.contains(&l.property_id))
            .filter_map(|l| {
                let distance_km = haversine_km(
                    requester.latitude,
                    requester.longitude,
                    l.latitude,
                    l.longitude,
                );
                if !listing_passes_hard_filters(&l, requester_prefs, distance_km) {
                    return None;
                }

                let breakdown = score_property(requester, &l, requester_prefs, &self.weights);
                if breakdown.overall < threshold {
                    return None;
                }

                Some(ScoredCandidate {
                    already_surfaced: pending.contains(&l.property_id),
                    target_id: l.property_id,
                    target_type: TargetType::Property,
                    match_type: MatchType::Housing,
                    display_name: l.title,
                    breakdown,
                })
            })
            .collect();

        rank(&mut scored);
        let quota_deferred = apply_quota(&mut scored, remaining_quota);
        scored.truncate(limit);

        SelectionResult {
            candidates: scored,
            total_considered,
            quota_deferred,
        }
    }
}

impl Default for CandidateSelector {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

/// Score descending, distance ascending on ties
fn rank(scored: &mut [ScoredCandidate]) {
    scored.sort_by(|a, b| {
        b.breakdown
            .overall
            .cmp(&a.breakdown.overall)
            .then_with(|| {
                a.breakdown
                    .distance_km
                    .partial_cmp(&b.breakdown.distance_km)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });
}

/// Drop new candidates over the daily quota; re-shown pendings are free
///
/// Returns how many qualified candidates were deferred.
fn apply_quota(scored: &mut Vec<ScoredCandidate>, remaining_quota: usize) -> usize {
    let mut new_kept = 0usize;
    let before = scored.len();
    scored.retain(|c| {
        if c.already_surfaced {
            true
        } else if new_kept < remaining_quota {
            new_kept += 1;
            true
        } else {
            false
        }
    });
    before - scored.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile(id: &str, age: u8, lat: f64, lon: f64) -> CandidateProfile {
        CandidateProfile {
            user_id: id.to_string(),
            name: format!("User {}", id),
            age,
            gender: "female".to_string(),
            occupation: "teacher".to_string(),
            education: "bachelor".to_string(),
            religion: None,
            languages: vec!["english".to_string()],
            interests: vec!["cooking".to_string()],
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

    fn pool(ids: &[&str]) -> Vec<(CandidateProfile, MatchPreferences)> {
        ids.iter()
            .enumerate()
            .map(|(i, id)| {
                (
                    profile(id, 25 + (i % 5) as u8, 6.60 + i as f64 * 0.002, 3.35),
                    prefs(id),
                )
            })
            .collect()
    }

    #[test]
    fn test_excludes_self_and_settled() {
        let selector = CandidateSelector::with_default_weights();
        let requester = profile("me", 27, 6.6, 3.35);
        let settled: HashSet<String> = ["b".to_string()].into();

        let result = selector.select_roommates(
            &requester,
            &prefs("me"),
            pool(&["me", "a", "b"]),
            &settled,
            &HashSet::new(),
            20,
            10,
        );

        let ids: Vec<&str> = result.candidates.iter().map(|c| c.target_id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn test_deal_breaker_never_surfaces() {
        let selector = CandidateSelector::with_default_weights();
        let requester = profile("me", 27, 6.6, 3.35);
        let mut my_prefs = prefs("me");
        my_prefs.deal_breakers = vec!["teacher".to_string()];

        let result = selector.select_roommates(
            &requester,
            &my_prefs,
            pool(&["a", "b"]),
            &HashSet::new(),
            &HashSet::new(),
            20,
            10,
        );

        assert!(result.candidates.is_empty());
    }

    #[test]
    fn test_ordering_score_then_distance() {
        let selector = CandidateSelector::with_default_weights();
        let requester = profile("me", 27, 6.6, 3.35);

        // Identical prefs, increasing distance: ties broken nearest-first
        let result = selector.select_roommates(
            &requester,
            &prefs("me"),
            pool(&["a", "b", "c"]),
            &HashSet::new(),
            &HashSet::new(),
            20,
            10,
        );

        for pair in result.candidates.windows(2) {
            let (x, y) = (&pair[0], &pair[1]);
            assert!(
                x.breakdown.overall > y.breakdown.overall
                    || (x.breakdown.overall == y.breakdown.overall
                        && x.breakdown.distance_km <= y.breakdown.distance_km)
            );
        }
    }

    #[test]
    fn test_quota_caps_new_but_not_reshown() {
        let selector = CandidateSelector::with_default_weights();
        let requester = profile("me", 27, 6.6, 3.35);
        let pending: HashSet<String> = ["a".to_string(), "b".to_string()].into();

        let result = selector.select_roommates(
            &requester,
            &prefs("me"),
            pool(&["a", "b", "c", "d", "e"]),
            &HashSet::new(),
            &pending,
            1,
            10,
        );

        let reshown = result.candidates.iter().filter(|c| c.already_surfaced).count();
        let fresh = result.candidates.iter().filter(|c| !c.already_surfaced).count();
        assert_eq!(reshown, 2);
        assert_eq!(fresh, 1);
        assert_eq!(result.quota_deferred, 2);
    }

    #[test]
    fn test_threshold_cuts_low_scores() {
        let selector = CandidateSelector::with_default_weights();
        let requester = profile("me", 27, 6.6, 3.35);
        let mut my_prefs = prefs("me");
        my_prefs.settings.compatibility_threshold = 100;

        let result = selector.select_roommates(
            &requester,
            &my_prefs,
            pool(&["a", "b"]),
            &HashSet::new(),
            &HashSet::new(),
            20,
            10,
        );

        for c in &result.candidates {
            assert_eq!(c.breakdown.overall, 100);
        }
    }

    #[test]
    fn test_respects_limit() {
        let selector = CandidateSelector::with_default_weights();
        let requester = profile("me", 27, 6.6, 3.35);

        let ids: Vec<String> = (0..30).map(|i| format!("u{}", i)).collect();
        let id_refs: Vec<&str> = ids.iter().map(|s| s.as_str()).collect();

        let result = selector.select_roommates(
            &requester,
            &prefs("me"),
            pool(&id_refs),
            &HashSet::new(),
            &HashSet::new(),
            100,
            5,
        );

        assert!(result.candidates.len() <= 5);
        assert_eq!(result.total_considered, 30);
    }
}
