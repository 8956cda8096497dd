use crate::core::geo::haversine_km;
use crate::models::{
    CandidateProfile, FactorScores, MatchPreferences, PropertyListing, ScoringWeights,
    SleepPattern, WorkShift,
};

/// Everything the scorer derives about one (requester, candidate) pair
///
/// All scores are integers in 0-100. The same inputs always produce the
/// same output: no clock, no randomness, no hidden state.
#[derive(Debug, Clone)]
pub struct ScoreBreakdown {
    pub factors: FactorScores,
    pub overall: u8,
    pub distance_km: f64,
    pub budget_overlap_pct: u8,
    pub same_state: bool,
    pub match_reasons: Vec<String>,
    pub common_interests: Vec<String>,
    pub shared_preferences: Vec<String>,
}

/// Recombine stored factor scores into the overall score
///
/// Used at scoring time and again whenever factors are rewritten, so the
/// persisted overall can never drift from the persisted factors.
pub fn recompute_overall(factors: &FactorScores, weights: &ScoringWeights) -> u8 {
    let total = factors.location as f64 * weights.location
        + factors.budget as f64 * weights.budget
        + factors.lifestyle as f64 * weights.lifestyle
        + factors.preferences as f64 * weights.preferences
        + factors.schedule as f64 * weights.schedule
        + factors.cleanliness as f64 * weights.cleanliness
        + factors.social as f64 * weights.social;
    total.round().clamp(0.0, 100.0) as u8
}

/// Score a (requester, roommate-candidate) pair
pub fn score_pair(
    requester: &CandidateProfile,
    candidate: &CandidateProfile,
    requester_prefs: &MatchPreferences,
    candidate_prefs: &MatchPreferences,
    weights: &ScoringWeights,
) -> ScoreBreakdown {
    let distance_km = haversine_km(
        requester.latitude,
        requester.longitude,
        candidate.latitude,
        candidate.longitude,
    );

    let location = location_score(distance_km, requester_prefs.effective_max_distance_km());
    let (budget, budget_overlap_pct) = budget_range_score(requester_prefs, candidate_prefs);
    let lifestyle = lifestyle_score(requester_prefs, candidate_prefs);
    let (preferences, shared_preferences) = roommate_preference_score(candidate, requester_prefs);
    let schedule = schedule_score(requester_prefs, candidate_prefs);
    let cleanliness = level_closeness(
        requester_prefs.lifestyle.cleanliness_level,
        candidate_prefs.lifestyle.cleanliness_level,
    );
    let social = level_closeness(
        requester_prefs.schedule.social_level,
        candidate_prefs.schedule.social_level,
    );

    let factors = FactorScores {
        location,
        budget,
        lifestyle,
        preferences,
        schedule,
        cleanliness,
        social,
    };
    let overall = recompute_overall(&factors, weights);

    let common_interests = intersect_ci(&requester.interests, &candidate.interests);
    let same_state = requester.state.eq_ignore_ascii_case(&candidate.state);

    ScoreBreakdown {
        match_reasons: describe_factors(&factors, &common_interests),
        factors,
        overall,
        distance_km,
        budget_overlap_pct,
        same_state,
        common_interests,
        shared_preferences,
    }
}

/// Score a (requester, property-listing) pair
///
/// People-only axes are scored from the house rules where they are
/// expressible (smoking, pets) and pinned to the neutral midpoint where
/// they are not (schedule, cleanliness, social).
pub fn score_property(
    requester: &CandidateProfile,
    listing: &PropertyListing,
    requester_prefs: &MatchPreferences,
    weights: &ScoringWeights,
) -> ScoreBreakdown {
    let distance_km = haversine_km(
        requester.latitude,
        requester.longitude,
        listing.latitude,
        listing.longitude,
    );

    let location = location_score(distance_km, requester_prefs.effective_max_distance_km());
    let (budget, budget_overlap_pct) = rent_score(listing.rent, requester_prefs);
    let lifestyle = house_rules_score(listing, requester_prefs);
    let (preferences, shared_preferences) = housing_preference_score(listing, requester_prefs);

    let factors = FactorScores {
        location,
        budget,
        lifestyle,
        preferences,
        schedule: 50,
        cleanliness: 50,
        social: 50,
    };
    let overall = recompute_overall(&factors, weights);

    let same_state = requester.state.eq_ignore_ascii_case(&listing.state);

    ScoreBreakdown {
        match_reasons: describe_factors(&factors, &[]),
        factors,
        overall,
        distance_km,
        budget_overlap_pct,
        same_state,
        common_interests: vec![],
        shared_preferences,
    }
}

/// Inverse-distance decay, zero at or beyond the effective max
fn location_score(distance_km: f64, effective_max_km: f64) -> u8 {
    if effective_max_km <= 0.0 || distance_km >= effective_max_km {
        return 0;
    }
    // Exponential decay, nearby candidates score much higher
    let score = (-distance_km / (effective_max_km * 0.5)).exp() * 100.0;
    score.round().clamp(0.0, 100.0) as u8
}

/// Overlap ratio of the two widened budget ranges
///
/// Returns (score, overlap percentage). The overlap is measured against
/// the narrower of the two ranges so a broad seeker never dilutes a
/// precise one.
fn budget_range_score(a: &MatchPreferences, b: &MatchPreferences) -> (u8, u8) {
    let (a_min, a_max) = a.effective_budget();
    let (b_min, b_max) = b.effective_budget();

    let overlap = (a_max.min(b_max) - a_min.max(b_min)).max(0.0);
    let narrower = (a_max - a_min).min(b_max - b_min);
    if narrower <= 0.0 {
        // Degenerate range: treat exact containment as full overlap
        let contained = a_min.max(b_min) <= a_max.min(b_max);
        let pct = if contained { 100 } else { 0 };
        return (pct, pct);
    }

    let ratio = (overlap / narrower).clamp(0.0, 1.0);
    let pct = (ratio * 100.0).round() as u8;
    (pct, pct)
}

/// Rent position against the requester's widened budget
///
/// Full marks inside the unwidened range; linear decay across the
/// flexibility margin; zero beyond it.
fn rent_score(rent: u32, prefs: &MatchPreferences) -> (u8, u8) {
    let rent = rent as f64;
    let (eff_min, eff_max) = prefs.effective_budget();
    let (hard_min, hard_max) = (prefs.budget_min as f64, prefs.budget_max as f64);

    if rent >= hard_min && rent <= hard_max {
        return (100, 100);
    }
    if rent > hard_max && rent <= eff_max {
        let margin = eff_max - hard_max;
        let over = rent - hard_max;
        let score = (100.0 * (1.0 - over / margin)).round().clamp(0.0, 100.0) as u8;
        return (score, score);
    }
    if rent < hard_min && rent >= eff_min {
        let margin = hard_min - eff_min;
        let under = hard_min - rent;
        let score = (100.0 * (1.0 - under / margin)).round().clamp(0.0, 100.0) as u8;
        return (score, score);
    }
    (0, 0)
}

const LIFESTYLE_AXES: usize = 6;

/// Proportion of lifestyle axes where both sides' tolerances line up
fn lifestyle_score(a: &MatchPreferences, b: &MatchPreferences) -> u8 {
    let la = &a.lifestyle;
    let lb = &b.lifestyle;

    let mut compatible = 0usize;
    if la.smoking.compatible_with(lb.smoking) {
        compatible += 1;
    }
    if la.drinking.compatible_with(lb.drinking) {
        compatible += 1;
    }
    if la.pets.compatible_with(lb.pets) {
        compatible += 1;
    }
    if la.parties.compatible_with(lb.parties) {
        compatible += 1;
    }
    if la.guests.compatible_with(lb.guests) {
        compatible += 1;
    }
    if la.noise_level.abs_diff(lb.noise_level) <= 2 {
        compatible += 1;
    }

    ((compatible * 100) / LIFESTYLE_AXES) as u8
}

/// House rules screened against the requester's own habits
fn house_rules_score(listing: &PropertyListing, prefs: &MatchPreferences) -> u8 {
    use crate::models::Tolerance;

    let mut compatible = 0usize;
    let mut axes = 0usize;

    axes += 1;
    if listing.smoking_allowed || prefs.lifestyle.smoking == Tolerance::No {
        compatible += 1;
    }
    axes += 1;
    if listing.pets_allowed || prefs.lifestyle.pets == Tolerance::No {
        compatible += 1;
    }

    ((compatible * 100) / axes) as u8
}

/// Roommate sub-preference alignment for user targets
///
/// An empty preference list is an open preference and counts as a hit.
/// Returns the score and the matched axes as display strings.
fn roommate_preference_score(
    candidate: &CandidateProfile,
    requester_prefs: &MatchPreferences,
) -> (u8, Vec<String>) {
    let rp = &requester_prefs.roommate;
    let mut hits = 0usize;
    let mut axes = 0usize;
    let mut shared = Vec::new();

    axes += 1;
    if rp.occupations.is_empty() || contains_ci(&rp.occupations, &candidate.occupation) {
        hits += 1;
        if !candidate.occupation.is_empty() {
            shared.push(format!("occupation: {}", candidate.occupation.to_lowercase()));
        }
    }

    axes += 1;
    if rp.education_levels.is_empty() || contains_ci(&rp.education_levels, &candidate.education) {
        hits += 1;
        if !candidate.education.is_empty() {
            shared.push(format!("education: {}", candidate.education.to_lowercase()));
        }
    }

    axes += 1;
    let religion_ok = rp.religions.is_empty()
        || candidate
            .religion
            .as_deref()
            .map(|r| contains_ci(&rp.religions, r))
            .unwrap_or(false);
    if religion_ok {
        hits += 1;
    }

    axes += 1;
    let language_overlap = rp.languages.is_empty()
        || candidate.languages.iter().any(|l| contains_ci(&rp.languages, l));
    if language_overlap {
        hits += 1;
        for l in &candidate.languages {
            if contains_ci(&rp.languages, l) {
                shared.push(format!("language: {}", l.to_lowercase()));
            }
        }
    }

    axes += 1;
    if !candidate.has_children || rp.accepts_children {
        hits += 1;
    }

    (((hits * 100) / axes) as u8, shared)
}

/// Housing sub-preference alignment for property targets
fn housing_preference_score(
    listing: &PropertyListing,
    prefs: &MatchPreferences,
) -> (u8, Vec<String>) {
    let hp = &prefs.housing;
    let mut hits = 0usize;
    let mut axes = 0usize;
    let mut shared = Vec::new();

    axes += 1;
    if hp.property_types.is_empty() || contains_ci(&hp.property_types, &listing.property_type) {
        hits += 1;
        shared.push(format!("property type: {}", listing.property_type.to_lowercase()));
    }

    axes += 1;
    if listing.rooms >= hp.min_rooms {
        hits += 1;
    }

    axes += 1;
    if !hp.furnished_required || listing.furnished {
        hits += 1;
        if listing.furnished {
            shared.push("furnished".to_string());
        }
    }

    axes += 1;
    if !hp.parking_required || listing.parking {
        hits += 1;
    }

    axes += 1;
    if !hp.security_required || listing.security {
        hits += 1;
    }

    // Amenity coverage counts as one axis, scaled by how much is covered
    if !hp.required_amenities.is_empty() {
        axes += 1;
        let covered = hp
            .required_amenities
            .iter()
            .filter(|a| contains_ci(&listing.amenities, a))
            .count();
        if covered == hp.required_amenities.len() {
            hits += 1;
        }
        for a in &hp.required_amenities {
            if contains_ci(&listing.amenities, a) {
                shared.push(format!("amenity: {}", a.to_lowercase()));
            }
        }
    }

    (((hits * 100) / axes) as u8, shared)
}

/// Work-shift and sleep-pattern compatibility, averaged
fn schedule_score(a: &MatchPreferences, b: &MatchPreferences) -> u8 {
    let shift = match (a.schedule.work_shift, b.schedule.work_shift) {
        (x, y) if x == y => 100u32,
        (WorkShift::Remote, _) | (_, WorkShift::Remote) => 70,
        (WorkShift::Rotating, _) | (_, WorkShift::Rotating) => 70,
        (WorkShift::Day, WorkShift::Night) | (WorkShift::Night, WorkShift::Day) => 40,
        _ => 70,
    };

    let sleep = match (a.schedule.sleep_pattern, b.schedule.sleep_pattern) {
        (x, y) if x == y => 100u32,
        (SleepPattern::Flexible, _) | (_, SleepPattern::Flexible) => 80,
        _ => 30,
    };

    ((shift + sleep) / 2) as u8
}

/// 0-100 closeness of two 1-10 levels
fn level_closeness(a: u8, b: u8) -> u8 {
    let diff = a.abs_diff(b) as u32;
    (100u32.saturating_sub(diff * 100 / 9)) as u8
}

fn contains_ci(haystack: &[String], needle: &str) -> bool {
    haystack.iter().any(|h| h.eq_ignore_ascii_case(needle))
}

fn intersect_ci(a: &[String], b: &[String]) -> Vec<String> {
    a.iter()
        .filter(|x| contains_ci(b, x))
        .map(|x| x.to_lowercase())
        .collect()
}

/// Human-readable reasons for the strongest factors
fn describe_factors(factors: &FactorScores, common_interests: &[String]) -> Vec<String> {
    let mut reasons = Vec::new();
    if factors.location >= 80 {
        reasons.push("Lives nearby".to_string());
    }
    if factors.budget >= 80 {
        reasons.push("Budgets align closely".to_string());
    }
    if factors.lifestyle >= 80 {
        reasons.push("Compatible lifestyle habits".to_string());
    }
    if factors.cleanliness >= 80 {
        reasons.push("Similar cleanliness standards".to_string());
    }
    if factors.schedule >= 80 {
        reasons.push("Daily schedules fit together".to_string());
    }
    if factors.social >= 80 {
        reasons.push("Similar social energy".to_string());
    }
    if !common_interests.is_empty() {
        reasons.push(format!("{} shared interests", common_interests.len()));
    }
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

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

    #[test]
    fn test_score_pair_deterministic() {
        let a = profile("a", 6.6018, 3.3515);
        let b = profile("b", 6.6100, 3.3600);
        let pa = prefs("a");
        let pb = prefs("b");
        let w = ScoringWeights::default();

        let first = score_pair(&a, &b, &pa, &pb, &w);
        let second = score_pair(&a, &b, &pa, &pb, &w);

        assert_eq!(first.overall, second.overall);
        assert_eq!(first.factors, second.factors);
    }

    #[test]
    fn test_all_scores_within_bounds() {
        let a = profile("a", 6.6018, 3.3515);
        let b = profile("b", 6.4281, 3.4219);
        let w = ScoringWeights::default();

        let breakdown = score_pair(&a, &b, &prefs("a"), &prefs("b"), &w);

        assert!(breakdown.overall <= 100);
        for f in breakdown.factors.all() {
            assert!(f <= 100);
        }
    }

    #[test]
    fn test_location_score_decays_with_distance() {
        let near = location_score(1.0, 25.0);
        let mid = location_score(12.0, 25.0);
        let edge = location_score(25.0, 25.0);

        assert!(near > mid);
        assert!(mid > edge);
        assert_eq!(edge, 0);
    }

    #[test]
    fn test_rent_within_range_scores_full() {
        let mut p = prefs("a");
        p.budget_min = 50_000;
        p.budget_max = 150_000;
        p.budget_flexibility_pct = 10;

        let (score, _) = rent_score(100_000, &p);
        assert_eq!(score, 100);
    }

    #[test]
    fn test_rent_in_flexibility_margin_reduced() {
        // 160k against [50k,150k] with 10% stretch: inside the margin,
        // scored down but not out
        let mut p = prefs("a");
        p.budget_min = 50_000;
        p.budget_max = 150_000;
        p.budget_flexibility_pct = 10;

        let (score, _) = rent_score(160_000, &p);
        assert!(score > 0 && score < 100, "got {}", score);
    }

    #[test]
    fn test_rent_beyond_rigid_budget_scores_zero() {
        let mut p = prefs("a");
        p.budget_min = 50_000;
        p.budget_max = 100_000;
        p.budget_flexibility_pct = 0;

        let (score, _) = rent_score(160_000, &p);
        assert_eq!(score, 0);
    }

    #[test]
    fn test_budget_overlap_full_for_identical_ranges() {
        let a = prefs("a");
        let b = prefs("b");
        let (score, pct) = budget_range_score(&a, &b);
        assert_eq!(score, 100);
        assert_eq!(pct, 100);
    }

    #[test]
    fn test_budget_overlap_zero_for_disjoint_ranges() {
        let mut a = prefs("a");
        a.budget_min = 10_000;
        a.budget_max = 20_000;
        a.budget_flexibility_pct = 0;
        let mut b = prefs("b");
        b.budget_min = 200_000;
        b.budget_max = 300_000;
        b.budget_flexibility_pct = 0;

        let (score, pct) = budget_range_score(&a, &b);
        assert_eq!(score, 0);
        assert_eq!(pct, 0);
    }

    #[test]
    fn test_lifestyle_all_axes_compatible_for_identical_prefs() {
        let a = prefs("a");
        let b = prefs("b");
        assert_eq!(lifestyle_score(&a, &b), 100);
    }

    #[test]
    fn test_lifestyle_extreme_smoking_mismatch_drops_axis() {
        use crate::models::Tolerance;
        let mut a = prefs("a");
        a.lifestyle.smoking = Tolerance::No;
        let mut b = prefs("b");
        b.lifestyle.smoking = Tolerance::Yes;

        assert!(lifestyle_score(&a, &b) < 100);
    }

    #[test]
    fn test_level_closeness_endpoints() {
        assert_eq!(level_closeness(5, 5), 100);
        assert_eq!(level_closeness(1, 10), 0);
        assert!(level_closeness(4, 6) > 70);
    }

    #[test]
    fn test_recompute_overall_matches_weighted_sum() {
        let factors = FactorScores {
            location: 100,
            budget: 100,
            lifestyle: 100,
            preferences: 100,
            schedule: 100,
            cleanliness: 100,
            social: 100,
        };
        assert_eq!(recompute_overall(&factors, &ScoringWeights::default()), 100);

        let zeros = FactorScores {
            location: 0,
            budget: 0,
            lifestyle: 0,
            preferences: 0,
            schedule: 0,
            cleanliness: 0,
            social: 0,
        };
        assert_eq!(recompute_overall(&zeros, &ScoringWeights::default()), 0);
    }

    #[test]
    fn test_property_scoring_uses_house_rules() {
        let requester = profile("a", 6.6018, 3.3515);
        let mut p = prefs("a");
        p.budget_min = 50_000;
        p.budget_max = 150_000;

        let listing = PropertyListing {
            property_id: "prop1".to_string(),
            title: "2-bed flat".to_string(),
            property_type: "apartment".to_string(),
            rent: 120_000,
            rooms: 2,
            furnished: true,
            parking: true,
            security: true,
            amenities: vec!["wifi".to_string()],
            latitude: 6.6050,
            longitude: 3.3550,
            state: "Lagos".to_string(),
            city: "Ikeja".to_string(),
            area: None,
            smoking_allowed: false,
            pets_allowed: true,
            is_active: true,
        };

        let breakdown = score_property(&requester, &listing, &p, &ScoringWeights::default());

        assert_eq!(breakdown.factors.budget, 100);
        // Non-smoker against a no-smoking listing: rules fully compatible
        assert_eq!(breakdown.factors.lifestyle, 100);
        assert!(breakdown.overall > 0);
    }

    #[test]
    fn test_common_interests_case_insensitive() {
        let mut a = profile("a", 6.6018, 3.3515);
        let mut b = profile("b", 6.6018, 3.3515);
        a.interests = vec!["Cooking".to_string(), "cycling".to_string()];
        b.interests = vec!["cooking".to_string(), "gaming".to_string()];

        let breakdown = score_pair(&a, &b, &prefs("a"), &prefs("b"), &ScoringWeights::default());
        assert_eq!(breakdown.common_interests, vec!["cooking"]);
    }
}
