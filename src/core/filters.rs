use crate::models::{CandidateProfile, MatchPreferences, PropertyListing};

/// Check a roommate candidate against the requester's hard filters
///
/// Flexibility percentages relax the budget and location bounds; age and
/// gender are strict. Deal-breakers are checked separately because they
/// apply to free text, not bounds.
pub fn passes_hard_filters(
    candidate: &CandidateProfile,
    candidate_prefs: &MatchPreferences,
    requester_prefs: &MatchPreferences,
    distance_km: f64,
) -> bool {
    // Inactive or hidden candidates never surface
    if !candidate.is_active
        || !candidate_prefs.is_active
        || !candidate_prefs.settings.visible_in_search
    {
        return false;
    }

    if candidate.age < requester_prefs.min_age || candidate.age > requester_prefs.max_age {
        return false;
    }

    if !requester_prefs.gender_preference.is_empty()
        && !contains_ci(&requester_prefs.gender_preference, &candidate.gender)
    {
        return false;
    }

    if distance_km > requester_prefs.effective_max_distance_km() {
        return false;
    }

    if !budget_ranges_overlap(requester_prefs, candidate_prefs) {
        return false;
    }

    if !in_preferred_locations(
        &candidate.state,
        &candidate.city,
        candidate.area.as_deref(),
        requester_prefs,
    ) {
        return false;
    }

    true
}

/// Check a property listing against the requester's hard filters
pub fn listing_passes_hard_filters(
    listing: &PropertyListing,
    requester_prefs: &MatchPreferences,
    distance_km: f64,
) -> bool {
    if !listing.is_active {
        return false;
    }

    if distance_km > requester_prefs.effective_max_distance_km() {
        return false;
    }

    let (eff_min, eff_max) = requester_prefs.effective_budget();
    let rent = listing.rent as f64;
    if rent < eff_min || rent > eff_max {
        return false;
    }

    in_preferred_locations(
        &listing.state,
        &listing.city,
        listing.area.as_deref(),
        requester_prefs,
    )
}

/// Deal-breaker screen: case-insensitive substring match against the
/// candidate's occupation, interests and lifestyle labels
pub fn hits_deal_breaker(candidate: &CandidateProfile, deal_breakers: &[String]) -> bool {
    if deal_breakers.is_empty() {
        return false;
    }

    let mut haystacks: Vec<String> = Vec::with_capacity(
        1 + candidate.interests.len() + candidate.lifestyle_tags.len(),
    );
    haystacks.push(candidate.occupation.to_lowercase());
    haystacks.extend(candidate.interests.iter().map(|s| s.to_lowercase()));
    haystacks.extend(candidate.lifestyle_tags.iter().map(|s| s.to_lowercase()));

    deal_breakers.iter().any(|term| {
        let term = term.trim().to_lowercase();
        !term.is_empty() && haystacks.iter().any(|h| h.contains(&term))
    })
}

/// Widened budget ranges must intersect for the pair to be viable at all
fn budget_ranges_overlap(a: &MatchPreferences, b: &MatchPreferences) -> bool {
    let (a_min, a_max) = a.effective_budget();
    let (b_min, b_max) = b.effective_budget();
    a_min.max(b_min) <= a_max.min(b_max)
}

/// Preferred-location containment
///
/// Empty preference lists are open. A non-zero location flexibility lets
/// out-of-area candidates through (the distance decay still penalizes
/// them in scoring).
fn in_preferred_locations(
    state: &str,
    city: &str,
    area: Option<&str>,
    prefs: &MatchPreferences,
) -> bool {
    if prefs.location_flexibility_pct > 0 {
        return true;
    }

    if !prefs.preferred_states.is_empty() && !contains_ci(&prefs.preferred_states, state) {
        return false;
    }
    if !prefs.preferred_cities.is_empty() && !contains_ci(&prefs.preferred_cities, city) {
        return false;
    }
    if !prefs.preferred_areas.is_empty() {
        match area {
            Some(a) if contains_ci(&prefs.preferred_areas, a) => {}
            _ => return false,
        }
    }

    true
}

fn contains_ci(haystack: &[String], needle: &str) -> bool {
    haystack.iter().any(|h| h.eq_ignore_ascii_case(needle))
}
