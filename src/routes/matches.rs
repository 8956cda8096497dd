use std::collections::HashSet;
use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use validator::Validate;

use crate::core::{
    bounding_box, decide_swipe, validate_pair, CandidateSelector, LifecycleError, MatchPolicy,
    Side,
};
use crate::models::{
    CandidateProfile, CandidatesQuery, CandidatesResponse, ErrorResponse, ExtendRequest,
    HealthResponse, Match, MatchEvent, MatchEventKind, MatchPreferences, MatchStatus,
    ScoringWeights, SwipeAction, SwipeRequest, SwipeResponse, TargetType,
};
use crate::services::{
    CacheKey, CacheManager, DirectoryClient, DirectoryError, EventPublisher, NewMatch,
    PostgresStore,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<DirectoryClient>,
    pub cache: Arc<CacheManager>,
    pub store: Arc<PostgresStore>,
    pub events: Arc<EventPublisher>,
    pub selector: CandidateSelector,
    pub weights: ScoringWeights,
    pub policy: MatchPolicy,
    /// How many raw directory rows to pull per requested candidate
    pub pool_multiplier: usize,
    pub max_limit: u16,
}

/// Configure match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/matches/candidates", web::get().to(get_candidates))
        .route("/matches/swipe", web::post().to(swipe))
        .route("/matches/{id}/extend", web::post().to(extend_match));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.store.health_check().await.unwrap_or(false);
    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// The acting user, from the gateway-injected identity header
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

fn conflict(message: String) -> HttpResponse {
    HttpResponse::Conflict().json(ErrorResponse {
        error: "invalid_state".to_string(),
        message,
        status_code: 409,
    })
}

fn not_found(message: String) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse {
        error: "not_found".to_string(),
        message,
        status_code: 404,
    })
}

fn store_failure(e: impl std::fmt::Display) -> HttpResponse {
    HttpResponse::InternalServerError().json(ErrorResponse {
        error: "store_error".to_string(),
        message: e.to_string(),
        status_code: 500,
    })
}

/// Directory failures fail closed: no candidate math on partial data
fn directory_failure(e: DirectoryError) -> HttpResponse {
    match e {
        DirectoryError::NotFound(id) => not_found(format!("No directory record for {}", id)),
        other => HttpResponse::BadGateway().json(ErrorResponse {
            error: "directory_error".to_string(),
            message: other.to_string(),
            status_code: 502,
        }),
    }
}

/// Requester profile lookup with cache in front of the directory
async fn cached_profile(
    state: &AppState,
    user_id: &str,
) -> Result<CandidateProfile, DirectoryError> {
    let key = CacheKey::profile(user_id);
    if let Ok(profile) = state.cache.get::<CandidateProfile>(&key).await {
        return Ok(profile);
    }

    let profile = state.directory.get_profile(user_id).await?;
    if let Err(e) = state.cache.set(&key, &profile).await {
        tracing::warn!("Failed to cache profile {}: {}", user_id, e);
    }
    Ok(profile)
}

/// Find candidates endpoint
///
/// GET /api/v1/matches/candidates?userId={id}&limit={n}&targetType={user|property}
async fn get_candidates(
    state: web::Data<AppState>,
    query: web::Query<CandidatesQuery>,
    http_req: HttpRequest,
) -> impl Responder {
    if acting_user(&http_req).is_none() {
        return unauthenticated();
    }
    if let Err(errors) = query.validate() {
        return bad_request(errors.to_string());
    }

    let user_id = &query.user_id;
    let limit = query.limit.min(state.max_limit) as usize;
    let target_type = query.target_type.unwrap_or(TargetType::User);
    let now = Utc::now();

    tracing::info!("Selecting candidates for user: {}, limit: {}", user_id, limit);

    // Preferences are materialized with defaults on first access
    let prefs = match state.store.ensure_preferences(user_id, now).await {
        Ok(p) => p,
        Err(e) => return store_failure(e),
    };
    if !prefs.is_active {
        return conflict("Matching is deactivated for this user".to_string());
    }

    let requester = match cached_profile(&state, user_id).await {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Failed to fetch profile for {}: {}", user_id, e);
            return directory_failure(e);
        }
    };

    let settled: HashSet<String> = match state.store.settled_target_ids(user_id).await {
        Ok(ids) => ids.into_iter().collect(),
        Err(e) => return store_failure(e),
    };
    let pending: HashSet<String> = match state.store.pending_target_ids(user_id, now).await {
        Ok(ids) => ids.into_iter().collect(),
        Err(e) => return store_failure(e),
    };

    // Daily quota counts only newly surfaced offers
    let today_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc();
    let surfaced_today = match state.store.count_surfaced_since(user_id, today_start).await {
        Ok(n) => n,
        Err(e) => return store_failure(e),
    };
    let remaining_quota =
        (prefs.settings.daily_match_limit as i64 - surfaced_today).max(0) as usize;

    let bbox = bounding_box(
        requester.latitude,
        requester.longitude,
        prefs.effective_max_distance_km(),
    );
    let exclude: Vec<String> = settled.iter().cloned().collect();
    let pool_size = limit * state.pool_multiplier;

    let result = match target_type {
        TargetType::User => {
            let profiles = match state
                .directory
                .query_profiles(user_id, &bbox, &exclude, pool_size)
                .await
            {
                Ok(p) => p,
                Err(e) => {
                    tracing::error!("Candidate query failed for {}: {}", user_id, e);
                    return directory_failure(e);
                }
            };

            let ids: Vec<String> = profiles.iter().map(|p| p.user_id.clone()).collect();
            let mut prefs_by_user: std::collections::HashMap<String, MatchPreferences> =
                match state.store.preferences_for(&ids).await {
                    Ok(all) => all.into_iter().map(|p| (p.user_id.clone(), p)).collect(),
                    Err(e) => return store_failure(e),
                };

            let pool: Vec<(CandidateProfile, MatchPreferences)> = profiles
                .into_iter()
                .map(|p| {
                    let cp = prefs_by_user
                        .remove(&p.user_id)
                        .unwrap_or_else(|| MatchPreferences::default_for(&p.user_id, now));
                    (p, cp)
                })
                .collect();

            state.selector.select_roommates(
                &requester,
                &prefs,
                pool,
                &settled,
                &pending,
                remaining_quota,
                limit,
            )
        }
        TargetType::Property => {
            let listings = match state
                .directory
                .query_properties(&bbox, &exclude, pool_size)
                .await
            {
                Ok(l) => l,
                Err(e) => {
                    tracing::error!("Listing query failed for {}: {}", user_id, e);
                    return directory_failure(e);
                }
            };

            state.selector.select_properties(
                &requester,
                &prefs,
                listings,
                &settled,
                &pending,
                remaining_quota,
                limit,
            )
        }
    };

    // Persist newly surfaced candidates as pending offers
    let expires_at = state.policy.offer_deadline(now);
    for candidate in result.candidates.iter().filter(|c| !c.already_surfaced) {
        let new = NewMatch::from_candidate(user_id, candidate, expires_at);
        match state.store.create_or_get_match(&new, now).await {
            Ok((row, true)) => {
                let event = MatchEvent::for_match(MatchEventKind::Created, &row, now);
                if let Err(e) = state.events.publish(&event).await {
                    tracing::warn!("Failed to publish created event for {}: {}", row.id, e);
                }
            }
            Ok((_, false)) => {}
            Err(e) => return store_failure(e),
        }
    }

    // Surfacing counts as a view on every returned offer
    let surfaced_ids: Vec<String> = result.candidates.iter().map(|c| c.target_id.clone()).collect();
    if let Err(e) = state
        .store
        .record_views(user_id, &surfaced_ids, target_type, now)
        .await
    {
        tracing::warn!("Failed to record views for {}: {}", user_id, e);
    }

    tracing::info!(
        "Returning {} candidates for user {} (from {} considered, {} quota-deferred)",
        result.candidates.len(),
        user_id,
        result.total_considered,
        result.quota_deferred
    );

    HttpResponse::Ok().json(CandidatesResponse {
        candidates: result.candidates.into_iter().map(Into::into).collect(),
        total_considered: result.total_considered,
        quota_deferred: result.quota_deferred,
    })
}

/// Swipe endpoint
///
/// POST /api/v1/matches/swipe
///
/// A first-time swipe on an unseen target synthesizes the pending match
/// before applying the action, so a pass never requires a prior view.
async fn swipe(
    state: web::Data<AppState>,
    req: web::Json<SwipeRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    if acting_user(&http_req).is_none() {
        return unauthenticated();
    }
    if let Err(errors) = req.validate() {
        return bad_request(errors.to_string());
    }
    if let Err(e) = validate_pair(&req.user_id, &req.target_id) {
        return bad_request(e.to_string());
    }
    if req.action == SwipeAction::None {
        return bad_request("Swipe action cannot be 'none'".to_string());
    }

    let now = Utc::now();

    // Find or synthesize the match row for this directed pair
    let existing = match state
        .store
        .get_match(&req.user_id, &req.target_id, req.target_type)
        .await
    {
        Ok(m) => m,
        Err(e) => return store_failure(e),
    };

    let row = match existing {
        Some(row) => row,
        None => match synthesize_match(&state, &req, now).await {
            Ok(row) => row,
            Err(resp) => return *resp,
        },
    };

    // Decide and CAS-apply the transition
    let outcome = match decide_swipe(&row, Side::User, req.action) {
        Ok(o) => o,
        Err(LifecycleError::NotPending(status)) => {
            return conflict(format!("Match is already {:?}", status).to_lowercase())
        }
        Err(e) => return bad_request(e.to_string()),
    };

    let updated = match state
        .store
        .apply_swipe(row.id, Side::User, req.action, outcome.status, now)
        .await
    {
        Ok(Some(m)) => m,
        Ok(None) => {
            // Lost the race against a concurrent transition: surface the
            // winning state instead of erroring
            match state.store.get_match_by_id(row.id).await {
                Ok(Some(m)) => {
                    tracing::debug!("Swipe on {} lost CAS race, returning {:?}", row.id, m.status);
                    return HttpResponse::Ok().json(SwipeResponse {
                        is_mutual_match: m.status == MatchStatus::Matched,
                        match_record: m,
                    });
                }
                Ok(None) => return not_found(format!("Match {} not found", row.id)),
                Err(e) => return store_failure(e),
            }
        }
        Err(e) => return store_failure(e),
    };

    // Keep the mirror row's view of our action in sync. The returned
    // mirror also closes the concurrent-swipe window: if the other side's
    // like landed after we read our row, we see it here and still settle.
    let mirror = match state
        .store
        .sync_mirror_action(&req.user_id, &req.target_id, req.target_type, req.action, now)
        .await
    {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!("Failed to sync mirror action for {}: {}", updated.id, e);
            None
        }
    };

    let mut is_mutual = outcome.mutual;
    if !is_mutual && req.action.is_like() {
        if let Some(m) = &mirror {
            if m.user_action.is_like() {
                tracing::debug!("Late mutual detection for pair ({}, {})", req.user_id, req.target_id);
                is_mutual = true;
            }
        }
    }

    let mut final_row = updated;
    if is_mutual {
        final_row = finalize_mutual(&state, &req, final_row, now).await;
    }

    HttpResponse::Ok().json(SwipeResponse {
        is_mutual_match: is_mutual,
        match_record: final_row,
    })
}

/// Create the pending row a first-time swipe acts on
async fn synthesize_match(
    state: &AppState,
    req: &SwipeRequest,
    now: chrono::DateTime<Utc>,
) -> Result<Match, Box<HttpResponse>> {
    let requester_prefs = state
        .store
        .ensure_preferences(&req.user_id, now)
        .await
        .map_err(|e| Box::new(store_failure(e)))?;
    let requester = cached_profile(state, &req.user_id)
        .await
        .map_err(|e| Box::new(directory_failure(e)))?;

    let breakdown = match req.target_type {
        TargetType::User => {
            let target = state
                .directory
                .get_profile(&req.target_id)
                .await
                .map_err(|e| Box::new(directory_failure(e)))?;
            let target_prefs = state
                .store
                .ensure_preferences(&req.target_id, now)
                .await
                .map_err(|e| Box::new(store_failure(e)))?;
            crate::core::score_pair(
                &requester,
                &target,
                &requester_prefs,
                &target_prefs,
                &state.weights,
            )
        }
        TargetType::Property => {
            let listing = state
                .directory
                .get_property(&req.target_id)
                .await
                .map_err(|e| Box::new(directory_failure(e)))?;
            crate::core::score_property(&requester, &listing, &requester_prefs, &state.weights)
        }
    };

    let match_type = match req.target_type {
        TargetType::User => crate::models::MatchType::Roommate,
        TargetType::Property => crate::models::MatchType::Housing,
    };

    let new = NewMatch {
        user_id: req.user_id.clone(),
        target_id: req.target_id.clone(),
        target_type: req.target_type,
        match_type,
        compatibility_score: breakdown.overall,
        factors: breakdown.factors,
        match_reasons: breakdown.match_reasons,
        common_interests: breakdown.common_interests,
        shared_preferences: breakdown.shared_preferences,
        distance_km: Some(breakdown.distance_km),
        budget_overlap_pct: Some(breakdown.budget_overlap_pct),
        same_state: breakdown.same_state,
        expires_at: state.policy.offer_deadline(now),
    };

    let (mut row, created) = state
        .store
        .create_or_get_match(&new, now)
        .await
        .map_err(|e| Box::new(store_failure(e)))?;

    if created {
        let event = MatchEvent::for_match(MatchEventKind::Created, &row, now);
        if let Err(e) = state.events.publish(&event).await {
            tracing::warn!("Failed to publish created event for {}: {}", row.id, e);
        }

        // A pre-existing mirror row means the target already acted; pull
        // their like/pass onto our side before the swipe is decided
        if req.target_type == TargetType::User {
            let mirror = state
                .store
                .get_match(&req.target_id, &req.user_id, req.target_type)
                .await
                .map_err(|e| Box::new(store_failure(e)))?;
            if let Some(mirror) = mirror {
                if mirror.user_action != SwipeAction::None {
                    if let Some(synced) = state
                        .store
                        .apply_swipe(row.id, Side::Target, mirror.user_action, row.status, now)
                        .await
                        .map_err(|e| Box::new(store_failure(e)))?
                    {
                        row = synced;
                    }
                }
            }
        }
    }

    Ok(row)
}

/// Mutual like: settle both directions of the pair and emit the
/// idempotent event. Returns the acting user's settled row.
///
/// Every settle is a CAS on 'pending', so whichever of the two racing
/// swipes runs this second just observes the already-settled rows.
async fn finalize_mutual(
    state: &AppState,
    req: &SwipeRequest,
    updated: Match,
    now: chrono::DateTime<Utc>,
) -> Match {
    let mut own_row = updated;
    if own_row.status != MatchStatus::Matched {
        match state
            .store
            .settle_mutual(&req.user_id, &req.target_id, req.target_type, now)
            .await
        {
            Ok(Some(settled)) => own_row = settled,
            Ok(None) => match state.store.get_match_by_id(own_row.id).await {
                Ok(Some(row)) => own_row = row,
                Ok(None) => {}
                Err(e) => tracing::warn!("Failed to re-read match {}: {}", own_row.id, e),
            },
            Err(e) => tracing::warn!("Failed to settle match {}: {}", own_row.id, e),
        }
    }

    match state
        .store
        .settle_mutual(&req.target_id, &req.user_id, req.target_type, now)
        .await
    {
        Ok(Some(mirror)) => {
            tracing::debug!("Mirror match {} settled as mutual", mirror.id);
        }
        Ok(None) => {
            // Already settled by the concurrent swipe; nothing to do
        }
        Err(e) => {
            tracing::warn!("Failed to settle mirror of {}: {}", own_row.id, e);
        }
    }

    // Only the first claimant for the pair emits the mutual event, so
    // conversation creation tolerates both swipes racing
    match state
        .store
        .claim_conversation_intent(&req.user_id, &req.target_id)
        .await
    {
        Ok(true) => {
            let event = MatchEvent::for_match(MatchEventKind::Mutual, &own_row, now);
            if let Err(e) = state.events.publish(&event).await {
                tracing::warn!("Failed to publish mutual event for {}: {}", own_row.id, e);
            }
        }
        Ok(false) => {
            tracing::debug!(
                "Mutual event for pair ({}, {}) already claimed",
                req.user_id,
                req.target_id
            );
        }
        Err(e) => {
            tracing::warn!("Failed to claim conversation intent: {}", e);
        }
    }

    own_row
}

/// Extend a pending offer's deadline
///
/// POST /api/v1/matches/{id}/extend
async fn extend_match(
    state: web::Data<AppState>,
    path: web::Path<uuid::Uuid>,
    req: web::Json<ExtendRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    if acting_user(&http_req).is_none() {
        return unauthenticated();
    }
    if let Err(errors) = req.validate() {
        return bad_request(errors.to_string());
    }

    let id = path.into_inner();
    let days = match state.policy.extension(req.days) {
        Ok(_) => req.days,
        Err(e) => return bad_request(e.to_string()),
    };

    match state.store.extend_match(id, days, Utc::now()).await {
        Ok(Some(m)) => {
            tracing::info!("Extended match {} by {} days", id, days);
            HttpResponse::Ok().json(m)
        }
        Ok(None) => match state.store.get_match_by_id(id).await {
            Ok(Some(m)) => conflict(format!("Match is already {:?}", m.status).to_lowercase()),
            Ok(None) => not_found(format!("Match {} not found", id)),
            Err(e) => store_failure(e),
        },
        Err(e) => store_failure(e),
    }
}
