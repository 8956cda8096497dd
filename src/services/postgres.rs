use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::time::Duration as StdDuration;
use thiserror::Error;
use uuid::Uuid;

use crate::core::{ScoredCandidate, Side};
use crate::models::{
    FactorScores, HousingPreferences, LifestylePreferences, Match, MatchPreferences, MatchStatus,
    MatchType, MatchingSettings, RoommatePreferences, SchedulePreferences, SwipeAction, TargetType,
};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Everything needed to persist a freshly surfaced pending match
#[derive(Debug, Clone)]
pub struct NewMatch {
    pub user_id: String,
    pub target_id: String,
    pub target_type: TargetType,
    pub match_type: MatchType,
    pub compatibility_score: u8,
    pub factors: FactorScores,
    pub match_reasons: Vec<String>,
    pub common_interests: Vec<String>,
    pub shared_preferences: Vec<String>,
    pub distance_km: Option<f64>,
    pub budget_overlap_pct: Option<u8>,
    pub same_state: bool,
    pub expires_at: DateTime<Utc>,
}

impl NewMatch {
    pub fn from_candidate(user_id: &str, c: &ScoredCandidate, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            target_id: c.target_id.clone(),
            target_type: c.target_type,
            match_type: c.match_type,
            compatibility_score: c.breakdown.overall,
            factors: c.breakdown.factors,
            match_reasons: c.breakdown.match_reasons.clone(),
            common_interests: c.breakdown.common_interests.clone(),
            shared_preferences: c.breakdown.shared_preferences.clone(),
            distance_km: Some(c.breakdown.distance_km),
            budget_overlap_pct: Some(c.breakdown.budget_overlap_pct),
            same_state: c.breakdown.same_state,
            expires_at,
        }
    }
}

/// PostgreSQL store for match records and preferences
///
/// All status transitions are compare-and-set against 'pending' so a
/// request-path swipe and the background expiry sweep can never clobber
/// each other's terminal state.
pub struct PostgresStore {
    pool: PgPool,
}

const MATCH_COLUMNS: &str = r#"
    id, user_id, target_id, target_type, match_type, status,
    user_action, target_action, compatibility_score, factors,
    match_reasons, common_interests, shared_preferences,
    distance_km, budget_overlap_pct, same_state,
    expires_at, last_interaction_at, matched_at,
    view_count, first_viewed_at, response_latency_secs, created_at
"#;

impl PostgresStore {
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(StdDuration::from_secs(5))
            .idle_timeout(StdDuration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, StoreError> {
        Self::new(url, max_connections.unwrap_or(10), min_connections.unwrap_or(1)).await
    }

    // ---- match records ----------------------------------------------------

    /// Insert a pending match, or return the existing row for the pair
    ///
    /// The unique (user_id, target_id, target_type) index makes the insert
    /// race-safe; the loser of a concurrent insert gets the winner's row.
    /// Returns (row, created).
    pub async fn create_or_get_match(
        &self,
        new: &NewMatch,
        now: DateTime<Utc>,
    ) -> Result<(Match, bool), StoreError> {
        let insert = format!(
            r#"
            INSERT INTO matches (
                id, user_id, target_id, target_type, match_type, status,
                user_action, target_action, compatibility_score, factors,
                match_reasons, common_interests, shared_preferences,
                distance_km, budget_overlap_pct, same_state,
                expires_at, last_interaction_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, 'pending', 'none', 'none', $6, $7,
                    $8, $9, $10, $11, $12, $13, $14, $15, $15)
            ON CONFLICT (user_id, target_id, target_type) DO NOTHING
            RETURNING {MATCH_COLUMNS}
            "#
        );

        let inserted = sqlx::query(&insert)
            .bind(Uuid::new_v4())
            .bind(&new.user_id)
            .bind(&new.target_id)
            .bind(new.target_type)
            .bind(new.match_type)
            .bind(new.compatibility_score as i16)
            .bind(Json(&new.factors))
            .bind(&new.match_reasons)
            .bind(&new.common_interests)
            .bind(&new.shared_preferences)
            .bind(new.distance_km)
            .bind(new.budget_overlap_pct.map(|p| p as i16))
            .bind(new.same_state)
            .bind(new.expires_at)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = inserted {
            return Ok((match_from_row(&row)?, true));
        }

        let existing = self
            .get_match(&new.user_id, &new.target_id, new.target_type)
            .await?
            .ok_or_else(|| {
                StoreError::NotFound(format!(
                    "match {} -> {} vanished during upsert",
                    new.user_id, new.target_id
                ))
            })?;
        Ok((existing, false))
    }

    pub async fn get_match(
        &self,
        user_id: &str,
        target_id: &str,
        target_type: TargetType,
    ) -> Result<Option<Match>, StoreError> {
        let query = format!(
            "SELECT {MATCH_COLUMNS} FROM matches
             WHERE user_id = $1 AND target_id = $2 AND target_type = $3"
        );

        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(target_id)
            .bind(target_type)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| match_from_row(&r)).transpose()
    }

    pub async fn get_match_by_id(&self, id: Uuid) -> Result<Option<Match>, StoreError> {
        let query = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1");
        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;
        row.map(|r| match_from_row(&r)).transpose()
    }

    /// Compare-and-set swipe application
    ///
    /// Writes the acting side's action and the decided status; stamps
    /// matched_at and the responder latency on the mutual transition.
    /// Returns None when the row was no longer pending (the caller should
    /// re-read and surface the winning state).
    pub async fn apply_swipe(
        &self,
        id: Uuid,
        side: Side,
        action: SwipeAction,
        new_status: MatchStatus,
        now: DateTime<Utc>,
    ) -> Result<Option<Match>, StoreError> {
        let action_column = match side {
            Side::User => "user_action",
            Side::Target => "target_action",
        };

        let query = format!(
            r#"
            UPDATE matches SET
                {action_column} = $2,
                status = $3,
                matched_at = CASE
                    WHEN $3 = 'matched'::match_status THEN $4
                    ELSE matched_at
                END,
                response_latency_secs = CASE
                    WHEN $3 = 'matched'::match_status
                    THEN EXTRACT(EPOCH FROM ($4 - created_at))::BIGINT
                    ELSE response_latency_secs
                END,
                last_interaction_at = $4
            WHERE id = $1 AND status = 'pending'
            RETURNING {MATCH_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(action)
            .bind(new_status)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| match_from_row(&r)).transpose()
    }

    /// Propagate an action onto the mirror row's target side
    ///
    /// Only pending mirrors are touched; settled mirrors keep their state.
    pub async fn sync_mirror_action(
        &self,
        acting_user: &str,
        target: &str,
        target_type: TargetType,
        action: SwipeAction,
        now: DateTime<Utc>,
    ) -> Result<Option<Match>, StoreError> {
        let query = format!(
            r#"
            UPDATE matches SET target_action = $4, last_interaction_at = $5
            WHERE user_id = $1 AND target_id = $2 AND target_type = $3
              AND status = 'pending'
            RETURNING {MATCH_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(target)
            .bind(acting_user)
            .bind(target_type)
            .bind(action)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| match_from_row(&r)).transpose()
    }

    /// CAS a still-pending row to matched after a mutual like
    ///
    /// Used for the (user_id -> target_id) direction given; callers settle
    /// both directions of a pair with two calls. A CAS miss means the row
    /// was already settled, which is exactly the idempotence the
    /// concurrent-swipe race needs.
    pub async fn settle_mutual(
        &self,
        user_id: &str,
        target_id: &str,
        target_type: TargetType,
        now: DateTime<Utc>,
    ) -> Result<Option<Match>, StoreError> {
        let query = format!(
            r#"
            UPDATE matches SET
                status = 'matched',
                matched_at = $4,
                response_latency_secs = EXTRACT(EPOCH FROM ($4 - created_at))::BIGINT,
                last_interaction_at = $4
            WHERE user_id = $1 AND target_id = $2 AND target_type = $3
              AND status = 'pending'
            RETURNING {MATCH_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(user_id)
            .bind(target_id)
            .bind(target_type)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| match_from_row(&r)).transpose()
    }

    /// Expiry sweep: move due pending offers to expired, in batches
    ///
    /// CAS on 'pending' means a concurrent swipe that just matched a row
    /// wins; re-running the sweep is always safe.
    pub async fn expire_due(
        &self,
        now: DateTime<Utc>,
        batch: i64,
    ) -> Result<Vec<Match>, StoreError> {
        let query = format!(
            r#"
            UPDATE matches SET status = 'expired', last_interaction_at = $1
            WHERE id IN (
                SELECT id FROM matches
                WHERE status = 'pending' AND expires_at <= $1
                ORDER BY expires_at
                LIMIT $2
            ) AND status = 'pending'
            RETURNING {MATCH_COLUMNS}
            "#
        );

        let rows = sqlx::query(&query)
            .bind(now)
            .bind(batch)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(match_from_row).collect()
    }

    /// Push a pending offer's deadline forward without touching its state
    pub async fn extend_match(
        &self,
        id: Uuid,
        days: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<Match>, StoreError> {
        let query = format!(
            r#"
            UPDATE matches SET
                expires_at = expires_at + make_interval(days => $2),
                last_interaction_at = $3
            WHERE id = $1 AND status = 'pending'
            RETURNING {MATCH_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(days as i32)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| match_from_row(&r)).transpose()
    }

    /// Rewrite factor scores; the overall is recomputed by the caller
    /// from the same factors so the two can never disagree
    pub async fn update_scores(
        &self,
        id: Uuid,
        factors: &FactorScores,
        overall: u8,
    ) -> Result<Option<Match>, StoreError> {
        let query = format!(
            r#"
            UPDATE matches SET factors = $2, compatibility_score = $3
            WHERE id = $1
            RETURNING {MATCH_COLUMNS}
            "#
        );

        let row = sqlx::query(&query)
            .bind(id)
            .bind(Json(factors))
            .bind(overall as i16)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| match_from_row(&r)).transpose()
    }

    /// Count a surfacing as a view on each row, stamping the first one
    pub async fn record_views(
        &self,
        user_id: &str,
        target_ids: &[String],
        target_type: TargetType,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if target_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            UPDATE matches SET
                view_count = view_count + 1,
                first_viewed_at = COALESCE(first_viewed_at, $4)
            WHERE user_id = $1 AND target_id = ANY($2) AND target_type = $3
            "#,
        )
        .bind(user_id)
        .bind(target_ids)
        .bind(target_type)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Target ids this user can no longer be offered (matched, rejected
    /// or blocked pairs)
    pub async fn settled_target_ids(&self, user_id: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT target_id FROM matches
            WHERE user_id = $1 AND status IN ('matched', 'rejected', 'blocked')
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| r.get("target_id")).collect())
    }

    /// Target ids with a live pending offer (re-shown quota-free)
    pub async fn pending_target_ids(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT target_id FROM matches
            WHERE user_id = $1 AND status = 'pending' AND expires_at > $2
            "#,
        )
        .bind(user_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|r| r.get("target_id")).collect())
    }

    /// How many offers were newly surfaced for this user since `since`
    pub async fn count_surfaced_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS surfaced FROM matches WHERE user_id = $1 AND created_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("surfaced"))
    }

    // ---- preferences ------------------------------------------------------

    pub async fn get_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<MatchPreferences>, StoreError> {
        let row = sqlx::query("SELECT * FROM match_preferences WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| prefs_from_row(&r)).transpose()
    }

    /// Lazy materialization: insert defaults if absent, then read back
    pub async fn ensure_preferences(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<MatchPreferences, StoreError> {
        if let Some(prefs) = self.get_preferences(user_id).await? {
            return Ok(prefs);
        }

        let defaults = MatchPreferences::default_for(user_id, now);
        self.insert_preferences_if_absent(&defaults).await?;

        self.get_preferences(user_id).await?.ok_or_else(|| {
            StoreError::NotFound(format!("preferences for {} vanished after insert", user_id))
        })
    }

    async fn insert_preferences_if_absent(
        &self,
        prefs: &MatchPreferences,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO match_preferences (
                user_id, is_active, max_distance_km, min_age, max_age,
                gender_preference, budget_min, budget_max, budget_flexibility_pct,
                preferred_states, preferred_cities, preferred_areas,
                location_flexibility_pct, lifestyle, schedule, housing, roommate,
                deal_breakers, settings, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(&prefs.user_id)
        .bind(prefs.is_active)
        .bind(prefs.max_distance_km as i16)
        .bind(prefs.min_age as i16)
        .bind(prefs.max_age as i16)
        .bind(&prefs.gender_preference)
        .bind(prefs.budget_min as i32)
        .bind(prefs.budget_max as i32)
        .bind(prefs.budget_flexibility_pct as i16)
        .bind(&prefs.preferred_states)
        .bind(&prefs.preferred_cities)
        .bind(&prefs.preferred_areas)
        .bind(prefs.location_flexibility_pct as i16)
        .bind(Json(&prefs.lifestyle))
        .bind(Json(&prefs.schedule))
        .bind(Json(&prefs.housing))
        .bind(Json(&prefs.roommate))
        .bind(&prefs.deal_breakers)
        .bind(Json(&prefs.settings))
        .bind(prefs.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Full upsert, used by PUT and by section patches after merge
    pub async fn put_preferences(&self, prefs: &MatchPreferences) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO match_preferences (
                user_id, is_active, max_distance_km, min_age, max_age,
                gender_preference, budget_min, budget_max, budget_flexibility_pct,
                preferred_states, preferred_cities, preferred_areas,
                location_flexibility_pct, lifestyle, schedule, housing, roommate,
                deal_breakers, settings, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18, $19, $20)
            ON CONFLICT (user_id) DO UPDATE SET
                is_active = EXCLUDED.is_active,
                max_distance_km = EXCLUDED.max_distance_km,
                min_age = EXCLUDED.min_age,
                max_age = EXCLUDED.max_age,
                gender_preference = EXCLUDED.gender_preference,
                budget_min = EXCLUDED.budget_min,
                budget_max = EXCLUDED.budget_max,
                budget_flexibility_pct = EXCLUDED.budget_flexibility_pct,
                preferred_states = EXCLUDED.preferred_states,
                preferred_cities = EXCLUDED.preferred_cities,
                preferred_areas = EXCLUDED.preferred_areas,
                location_flexibility_pct = EXCLUDED.location_flexibility_pct,
                lifestyle = EXCLUDED.lifestyle,
                schedule = EXCLUDED.schedule,
                housing = EXCLUDED.housing,
                roommate = EXCLUDED.roommate,
                deal_breakers = EXCLUDED.deal_breakers,
                settings = EXCLUDED.settings,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&prefs.user_id)
        .bind(prefs.is_active)
        .bind(prefs.max_distance_km as i16)
        .bind(prefs.min_age as i16)
        .bind(prefs.max_age as i16)
        .bind(&prefs.gender_preference)
        .bind(prefs.budget_min as i32)
        .bind(prefs.budget_max as i32)
        .bind(prefs.budget_flexibility_pct as i16)
        .bind(&prefs.preferred_states)
        .bind(&prefs.preferred_cities)
        .bind(&prefs.preferred_areas)
        .bind(prefs.location_flexibility_pct as i16)
        .bind(Json(&prefs.lifestyle))
        .bind(Json(&prefs.schedule))
        .bind(Json(&prefs.housing))
        .bind(Json(&prefs.roommate))
        .bind(&prefs.deal_breakers)
        .bind(Json(&prefs.settings))
        .bind(prefs.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn add_deal_breaker(
        &self,
        user_id: &str,
        term: &str,
        now: DateTime<Utc>,
    ) -> Result<MatchPreferences, StoreError> {
        sqlx::query(
            r#"
            UPDATE match_preferences
            SET deal_breakers = array_append(deal_breakers, $2), updated_at = $3
            WHERE user_id = $1 AND NOT ($2 = ANY(deal_breakers))
            "#,
        )
        .bind(user_id)
        .bind(term)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_preferences(user_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("preferences for {}", user_id)))
    }

    pub async fn remove_deal_breaker(
        &self,
        user_id: &str,
        term: &str,
        now: DateTime<Utc>,
    ) -> Result<MatchPreferences, StoreError> {
        sqlx::query(
            r#"
            UPDATE match_preferences
            SET deal_breakers = array_remove(deal_breakers, $2), updated_at = $3
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .bind(term)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_preferences(user_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("preferences for {}", user_id)))
    }

    /// Batch preference fetch for the selection pool
    pub async fn preferences_for(
        &self,
        user_ids: &[String],
    ) -> Result<Vec<MatchPreferences>, StoreError> {
        let rows = sqlx::query("SELECT * FROM match_preferences WHERE user_id = ANY($1)")
            .bind(user_ids)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(prefs_from_row).collect()
    }

    // ---- mutual-match idempotency guard ----------------------------------

    /// Claim the right to emit the mutual-match side effect for a pair
    ///
    /// The pair key is order-independent; only the first claimant gets
    /// true, so conversation creation fires once no matter how the two
    /// swipes race.
    pub async fn claim_conversation_intent(
        &self,
        a: &str,
        b: &str,
    ) -> Result<bool, StoreError> {
        let pair_key = if a <= b {
            format!("{}:{}", a, b)
        } else {
            format!("{}:{}", b, a)
        };

        let result = sqlx::query(
            "INSERT INTO conversation_intents (pair_key) VALUES ($1) ON CONFLICT DO NOTHING",
        )
        .bind(&pair_key)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Health check for the database connection
    pub async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}

fn match_from_row(row: &PgRow) -> Result<Match, StoreError> {
    let factors: Json<FactorScores> = row.try_get("factors")?;
    Ok(Match {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        target_id: row.try_get("target_id")?,
        target_type: row.try_get("target_type")?,
        match_type: row.try_get("match_type")?,
        status: row.try_get("status")?,
        user_action: row.try_get("user_action")?,
        target_action: row.try_get("target_action")?,
        compatibility_score: row.try_get::<i16, _>("compatibility_score")? as u8,
        factors: factors.0,
        match_reasons: row.try_get("match_reasons")?,
        common_interests: row.try_get("common_interests")?,
        shared_preferences: row.try_get("shared_preferences")?,
        distance_km: row.try_get("distance_km")?,
        budget_overlap_pct: row
            .try_get::<Option<i16>, _>("budget_overlap_pct")?
            .map(|p| p as u8),
        same_state: row.try_get("same_state")?,
        expires_at: row.try_get("expires_at")?,
        last_interaction_at: row.try_get("last_interaction_at")?,
        matched_at: row.try_get("matched_at")?,
        view_count: row.try_get::<i32, _>("view_count")? as u32,
        first_viewed_at: row.try_get("first_viewed_at")?,
        response_latency_secs: row.try_get("response_latency_secs")?,
        created_at: row.try_get("created_at")?,
    })
}

fn prefs_from_row(row: &PgRow) -> Result<MatchPreferences, StoreError> {
    let lifestyle: Json<LifestylePreferences> = row.try_get("lifestyle")?;
    let schedule: Json<SchedulePreferences> = row.try_get("schedule")?;
    let housing: Json<HousingPreferences> = row.try_get("housing")?;
    let roommate: Json<RoommatePreferences> = row.try_get("roommate")?;
    let settings: Json<MatchingSettings> = row.try_get("settings")?;

    Ok(MatchPreferences {
        user_id: row.try_get("user_id")?,
        is_active: row.try_get("is_active")?,
        max_distance_km: row.try_get::<i16, _>("max_distance_km")? as u16,
        min_age: row.try_get::<i16, _>("min_age")? as u8,
        max_age: row.try_get::<i16, _>("max_age")? as u8,
        gender_preference: row.try_get("gender_preference")?,
        budget_min: row.try_get::<i32, _>("budget_min")? as u32,
        budget_max: row.try_get::<i32, _>("budget_max")? as u32,
        budget_flexibility_pct: row.try_get::<i16, _>("budget_flexibility_pct")? as u8,
        preferred_states: row.try_get("preferred_states")?,
        preferred_cities: row.try_get("preferred_cities")?,
        preferred_areas: row.try_get("preferred_areas")?,
        location_flexibility_pct: row.try_get::<i16, _>("location_flexibility_pct")? as u8,
        lifestyle: lifestyle.0,
        schedule: schedule.0,
        housing: housing.0,
        roommate: roommate.0,
        deal_breakers: row.try_get("deal_breakers")?,
        settings: settings.0,
        updated_at: row.try_get("updated_at")?,
    })
}
