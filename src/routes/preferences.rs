use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::models::{
    DealBreakerRequest, ErrorResponse, HousingPreferences, LifestylePreferences, MatchPreferences,
    MatchingSettings, RoommatePreferences, SchedulePreferences,
};
use crate::routes::matches::AppState;
use crate::services::CacheKey;

/// Configure preference routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/preferences/{userId}", web::get().to(get_preferences))
        .route("/preferences/{userId}", web::put().to(put_preferences))
        .route(
            "/preferences/{userId}/deal-breakers",
            web::post().to(add_deal_breaker),
        )
        .route(
            "/preferences/{userId}/deal-breakers",
            web::delete().to(remove_deal_breaker),
        )
        .route(
            "/preferences/{userId}/{section}",
            web::patch().to(patch_section),
        );
}

fn acting_user(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
}

fn unauthenticated() -> HttpResponse {
    HttpResponse::Unauthorized().json(ErrorResponse {
        error: "not_authenticated".to_string(),
        message: "Missing or empty X-User-Id header".to_string(),
        status_code: 401,
    })
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "invalid_argument".to_string(),
        message,
        status_code: 400,
    })
}

fn store_failure(e: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: "store_error".to_string(),
        message: e.to_string(),
        status_code: 500,
    })
}

async fn invalidate_prefs_cache(state: &AppState, user_id: &str) {
    if let Err(e) = state.cache.delete(&CacheKey::preferences(user_id)).await {
        tracing::warn!("Failed to invalidate preferences cache for {}: {}", user_id, e);
    }
}

/// GET /api/v1/preferences/{userId}
///
/// Missing records materialize with system defaults rather than 404.
async fn get_preferences(
    state: web::Data<AppState>,
    path: web::Path<String>,
    http_req: HttpRequest,
) -> impl Responder {
    if acting_user(&http_req).is_none() {
        return unauthenticated();
    }
    let user_id = path.into_inner();

    let key = CacheKey::preferences(&user_id);
    if let Ok(prefs) = state.cache.get::<MatchPreferences>(&key).await {
        return HttpResponse::Ok().json(prefs);
    }

    match state.store.ensure_preferences(&user_id, Utc::now()).await {
        Ok(prefs) => {
            if let Err(e) = state.cache.set(&key, &prefs).await {
                tracing::warn!("Failed to cache preferences for {}: {}", user_id, e);
            }
            HttpResponse::Ok().json(prefs)
        }
        Err(e) => store_failure(e),
    }
}

/// PUT /api/v1/preferences/{userId}
async fn put_preferences(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<MatchPreferences>,
    http_req: HttpRequest,
) -> impl Responder {
    if acting_user(&http_req).is_none() {
        return unauthenticated();
    }

    let user_id = path.into_inner();
    let mut prefs = body.into_inner();
    prefs.user_id = user_id.clone();
    prefs.updated_at = Utc::now();

    if let Err(msg) = validate_preferences(&prefs) {
        return bad_request(msg);
    }

    match state.store.put_preferences(&prefs).await {
        Ok(()) => {
            invalidate_prefs_cache(&state, &user_id).await;
            tracing::info!("Updated preferences for user {}", user_id);
            HttpResponse::Ok().json(prefs)
        }
        Err(e) => store_failure(e),
    }
}

/// PATCH /api/v1/preferences/{userId}/{section}
///
/// Known sections: budget, location, lifestyle, schedule, housing,
/// roommate, settings. Unknown sections are rejected.
async fn patch_section(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<Value>,
    http_req: HttpRequest,
) -> impl Responder {
    if acting_user(&http_req).is_none() {
        return unauthenticated();
    }

    let (user_id, section) = path.into_inner();
    let now = Utc::now();

    let mut prefs = match state.store.ensure_preferences(&user_id, now).await {
        Ok(p) => p,
        Err(e) => return store_failure(e),
    };

    if let Err(msg) = apply_section(&mut prefs, &section, body.into_inner()) {
        return bad_request(msg);
    }
    prefs.updated_at = now;

    if let Err(msg) = validate_preferences(&prefs) {
        return bad_request(msg);
    }

    match state.store.put_preferences(&prefs).await {
        Ok(()) => {
            invalidate_prefs_cache(&state, &user_id).await;
            tracing::info!("Patched {} preferences for user {}", section, user_id);
            HttpResponse::Ok().json(prefs)
        }
        Err(e) => store_failure(e),
    }
}

/// POST /api/v1/preferences/{userId}/deal-breakers
async fn add_deal_breaker(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<DealBreakerRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    if acting_user(&http_req).is_none() {
        return unauthenticated();
    }
    if let Err(errors) = body.validate() {
        return bad_request(errors.to_string());
    }

    let user_id = path.into_inner();
    let term = body.text.trim().to_lowercase();
    if term.is_empty() {
        return bad_request("Deal-breaker text cannot be blank".to_string());
    }

    let now = Utc::now();
    if let Err(e) = state.store.ensure_preferences(&user_id, now).await {
        return store_failure(e);
    }

    match state.store.add_deal_breaker(&user_id, &term, now).await {
        Ok(prefs) => {
            invalidate_prefs_cache(&state, &user_id).await;
            HttpResponse::Ok().json(prefs)
        }
        Err(e) => store_failure(e),
    }
}

/// DELETE /api/v1/preferences/{userId}/deal-breakers
async fn remove_deal_breaker(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<DealBreakerRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    if acting_user(&http_req).is_none() {
        return unauthenticated();
    }

    let user_id = path.into_inner();
    let term = body.text.trim().to_lowercase();
    let now = Utc::now();

    if let Err(e) = state.store.ensure_preferences(&user_id, now).await {
        return store_failure(e);
    }

    match state.store.remove_deal_breaker(&user_id, &term, now).await {
        Ok(prefs) => {
            invalidate_prefs_cache(&state, &user_id).await;
            HttpResponse::Ok().json(prefs)
        }
        Err(e) => store_failure(e),
    }
}

#[derive(Debug, Deserialize)]
struct BudgetPatch {
    #[serde(rename = "budgetMin")]
    budget_min: Option<u32>,
    #[serde(rename = "budgetMax")]
    budget_max: Option<u32>,
    #[serde(rename = "budgetFlexibilityPct")]
    budget_flexibility_pct: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct LocationPatch {
    #[serde(rename = "maxDistanceKm")]
    max_distance_km: Option<u16>,
    #[serde(rename = "preferredStates")]
    preferred_states: Option<Vec<String>>,
    #[serde(rename = "preferredCities")]
    preferred_cities: Option<Vec<String>>,
    #[serde(rename = "preferredAreas")]
    preferred_areas: Option<Vec<String>>,
    #[serde(rename = "locationFlexibilityPct")]
    location_flexibility_pct: Option<u8>,
}

/// Merge a section body onto the stored preferences
///
/// Budget and location accept partial bodies; the structured sections
/// (lifestyle, schedule, housing, roommate, settings) replace wholesale.
fn apply_section(
    prefs: &mut MatchPreferences,
    section: &str,
    body: Value,
) -> Result<(), String> {
    match section {
        "budget" => {
            let patch: BudgetPatch =
                serde_json::from_value(body).map_err(|e| format!("Invalid budget patch: {}", e))?;
            if let Some(v) = patch.budget_min {
                prefs.budget_min = v;
            }
            if let Some(v) = patch.budget_max {
                prefs.budget_max = v;
            }
            if let Some(v) = patch.budget_flexibility_pct {
                prefs.budget_flexibility_pct = v;
            }
        }
        "location" => {
            let patch: LocationPatch = serde_json::from_value(body)
                .map_err(|e| format!("Invalid location patch: {}", e))?;
            if let Some(v) = patch.max_distance_km {
                prefs.max_distance_km = v;
            }
            if let Some(v) = patch.preferred_states {
                prefs.preferred_states = v;
            }
            if let Some(v) = patch.preferred_cities {
                prefs.preferred_cities = v;
            }
            if let Some(v) = patch.preferred_areas {
                prefs.preferred_areas = v;
            }
            if let Some(v) = patch.location_flexibility_pct {
                prefs.location_flexibility_pct = v;
            }
        }
        "lifestyle" => {
            let lifestyle: LifestylePreferences = serde_json::from_value(body)
                .map_err(|e| format!("Invalid lifestyle section: {}", e))?;
            prefs.lifestyle = lifestyle;
        }
        "schedule" => {
            let schedule: SchedulePreferences = serde_json::from_value(body)
                .map_err(|e| format!("Invalid schedule section: {}", e))?;
            prefs.schedule = schedule;
        }
        "housing" => {
            let housing: HousingPreferences =
                serde_json::from_value(body).map_err(|e| format!("Invalid housing section: {}", e))?;
            prefs.housing = housing;
        }
        "roommate" => {
            let roommate: RoommatePreferences = serde_json::from_value(body)
                .map_err(|e| format!("Invalid roommate section: {}", e))?;
            prefs.roommate = roommate;
        }
        "settings" => {
            let settings: MatchingSettings = serde_json::from_value(body)
                .map_err(|e| format!("Invalid settings section: {}", e))?;
            prefs.settings = settings;
        }
        unknown => return Err(format!("Unknown preferences section: {}", unknown)),
    }
    Ok(())
}

/// Range checks the wire layer cannot express
fn validate_preferences(prefs: &MatchPreferences) -> Result<(), String> {
    if prefs.min_age < 18 {
        return Err("min_age must be at least 18".to_string());
    }
    if prefs.min_age > prefs.max_age {
        return Err("min_age cannot exceed max_age".to_string());
    }
    if prefs.budget_min > prefs.budget_max {
        return Err("budget_min cannot exceed budget_max".to_string());
    }
    if prefs.budget_flexibility_pct > 100 || prefs.location_flexibility_pct > 100 {
        return Err("flexibility percentages must be 0-100".to_string());
    }
    if prefs.max_distance_km == 0 {
        return Err("max_distance_km must be positive".to_string());
    }
    for (name, level) in [
        ("cleanlinessLevel", prefs.lifestyle.cleanliness_level),
        ("noiseLevel", prefs.lifestyle.noise_level),
        ("socialLevel", prefs.schedule.social_level),
    ] {
        if !(1..=10).contains(&level) {
            return Err(format!("{} must be between 1 and 10", name));
        }
    }
    if prefs.settings.compatibility_threshold > 100
        || prefs.settings.auto_accept_threshold > 100
    {
        return Err("thresholds must be 0-100".to_string());
    }
    if prefs.settings.daily_match_limit == 0 {
        return Err("daily_match_limit must be positive".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prefs() -> MatchPreferences {
        MatchPreferences::default_for("u1", Utc::now())
    }

    #[test]
    fn test_budget_patch_is_partial() {
        let mut p = prefs();
        let before_max = p.budget_max;

        apply_section(&mut p, "budget", json!({ "budgetMin": 40000 })).unwrap();

        assert_eq!(p.budget_min, 40_000);
        assert_eq!(p.budget_max, before_max);
    }

    #[test]
    fn test_lifestyle_section_replaces() {
        let mut p = prefs();
        apply_section(
            &mut p,
            "lifestyle",
            json!({
                "smoking": "yes",
                "drinking": "yes",
                "pets": "no",
                "parties": "occasionally",
                "guests": "occasionally",
                "cleanlinessLevel": 3,
                "noiseLevel": 8
            }),
        )
        .unwrap();

        assert_eq!(p.lifestyle.cleanliness_level, 3);
        assert_eq!(p.lifestyle.noise_level, 8);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let mut p = prefs();
        let err = apply_section(&mut p, "astrology", json!({})).unwrap_err();
        assert!(err.contains("Unknown preferences section"));
    }

    #[test]
    fn test_malformed_section_body_rejected() {
        let mut p = prefs();
        assert!(apply_section(&mut p, "schedule", json!({ "workShift": "lunar" })).is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_ranges() {
        let mut p = prefs();
        p.min_age = 40;
        p.max_age = 30;
        assert!(validate_preferences(&p).is_err());

        let mut p = prefs();
        p.budget_min = 200_000;
        p.budget_max = 100_000;
        assert!(validate_preferences(&p).is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_levels() {
        let mut p = prefs();
        p.lifestyle.cleanliness_level = 0;
        assert!(validate_preferences(&p).is_err());

        let mut p = prefs();
        p.schedule.social_level = 11;
        assert!(validate_preferences(&p).is_err());
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(validate_preferences(&prefs()).is_ok());
    }
}
