use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of entity a match points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "target_type", rename_all = "lowercase")]
pub enum TargetType {
    User,
    Property,
}

/// Flavor of a match record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "match_type", rename_all = "lowercase")]
pub enum MatchType {
    Roommate,
    Housing,
    Mutual,
}

/// Match lifecycle states
///
/// `Pending` is the only non-terminal state; `Matched`, `Rejected`,
/// `Expired` and `Blocked` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "match_status", rename_all = "lowercase")]
pub enum MatchStatus {
    Pending,
    Matched,
    Rejected,
    Expired,
    Blocked,
}

impl MatchStatus {
    /// Terminal statuses that exclude the pair from future candidate selection
    pub fn excludes_reselection(&self) -> bool {
        matches!(self, Self::Matched | Self::Rejected | Self::Blocked)
    }
}

/// One side's decision on a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "swipe_action", rename_all = "snake_case")]
pub enum SwipeAction {
    None,
    Liked,
    Passed,
    SuperLiked,
}

impl SwipeAction {
    /// Super-likes count as likes for mutuality
    pub fn is_like(&self) -> bool {
        matches!(self, Self::Liked | Self::SuperLiked)
    }
}

/// Per-factor compatibility scores, each an integer 0-100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorScores {
    pub location: u8,
    pub budget: u8,
    pub lifestyle: u8,
    pub preferences: u8,
    pub schedule: u8,
    pub cleanliness: u8,
    pub social: u8,
}

impl FactorScores {
    pub fn all(&self) -> [u8; 7] {
        [
            self.location,
            self.budget,
            self.lifestyle,
            self.preferences,
            self.schedule,
            self.cleanliness,
            self.social,
        ]
    }
}

/// A directed match record: one row per (user_id, target_id, target_type)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "targetId")]
    pub target_id: String,
    #[serde(rename = "targetType")]
    pub target_type: TargetType,
    #[serde(rename = "matchType")]
    pub match_type: MatchType,
    pub status: MatchStatus,
    #[serde(rename = "userAction")]
    pub user_action: SwipeAction,
    #[serde(rename = "targetAction")]
    pub target_action: SwipeAction,
    #[serde(rename = "compatibilityScore")]
    pub compatibility_score: u8,
    pub factors: FactorScores,
    #[serde(rename = "matchReasons")]
    pub match_reasons: Vec<String>,
    #[serde(rename = "commonInterests")]
    pub common_interests: Vec<String>,
    #[serde(rename = "sharedPreferences")]
    pub shared_preferences: Vec<String>,
    #[serde(rename = "distanceKm")]
    pub distance_km: Option<f64>,
    #[serde(rename = "budgetOverlapPct")]
    pub budget_overlap_pct: Option<u8>,
    #[serde(rename = "sameState")]
    pub same_state: bool,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "lastInteractionAt")]
    pub last_interaction_at: DateTime<Utc>,
    #[serde(rename = "matchedAt")]
    pub matched_at: Option<DateTime<Utc>>,
    #[serde(rename = "viewCount")]
    pub view_count: u32,
    #[serde(rename = "firstViewedAt")]
    pub first_viewed_at: Option<DateTime<Utc>>,
    #[serde(rename = "responseLatencySecs")]
    pub response_latency_secs: Option<i64>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// Tolerance for a lifestyle habit
///
/// Adjacent levels are compatible (no/occasionally, occasionally/yes);
/// the extremes are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tolerance {
    No,
    Occasionally,
    Yes,
}

impl Tolerance {
    fn rank(&self) -> i8 {
        match self {
            Self::No => 0,
            Self::Occasionally => 1,
            Self::Yes => 2,
        }
    }

    pub fn compatible_with(&self, other: Tolerance) -> bool {
        (self.rank() - other.rank()).abs() <= 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkShift {
    Day,
    Night,
    Rotating,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepPattern {
    EarlyBird,
    NightOwl,
    Flexible,
}

/// Lifestyle axes compared between both sides
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifestylePreferences {
    pub smoking: Tolerance,
    pub drinking: Tolerance,
    pub pets: Tolerance,
    pub parties: Tolerance,
    pub guests: Tolerance,
    /// 1-10, higher = tidier
    #[serde(rename = "cleanlinessLevel")]
    pub cleanliness_level: u8,
    /// 1-10, higher = louder
    #[serde(rename = "noiseLevel")]
    pub noise_level: u8,
}

impl Default for LifestylePreferences {
    fn default() -> Self {
        Self {
            smoking: Tolerance::No,
            drinking: Tolerance::Occasionally,
            pets: Tolerance::Occasionally,
            parties: Tolerance::Occasionally,
            guests: Tolerance::Occasionally,
            cleanliness_level: 7,
            noise_level: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulePreferences {
    #[serde(rename = "workShift")]
    pub work_shift: WorkShift,
    #[serde(rename = "sleepPattern")]
    pub sleep_pattern: SleepPattern,
    /// 1-10, higher = more social
    #[serde(rename = "socialLevel")]
    pub social_level: u8,
}

impl Default for SchedulePreferences {
    fn default() -> Self {
        Self {
            work_shift: WorkShift::Day,
            sleep_pattern: SleepPattern::Flexible,
            social_level: 5,
        }
    }
}

/// Housing-specific requirements, applied to property targets
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HousingPreferences {
    #[serde(rename = "propertyTypes")]
    pub property_types: Vec<String>,
    #[serde(rename = "requiredAmenities")]
    pub required_amenities: Vec<String>,
    #[serde(rename = "minRooms")]
    pub min_rooms: u8,
    #[serde(rename = "furnishedRequired")]
    pub furnished_required: bool,
    #[serde(rename = "parkingRequired")]
    pub parking_required: bool,
    #[serde(rename = "securityRequired")]
    pub security_required: bool,
}

/// Roommate-specific requirements, applied to user targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoommatePreferences {
    pub occupations: Vec<String>,
    #[serde(rename = "educationLevels")]
    pub education_levels: Vec<String>,
    pub religions: Vec<String>,
    pub languages: Vec<String>,
    #[serde(rename = "acceptsChildren")]
    pub accepts_children: bool,
}

impl Default for RoommatePreferences {
    fn default() -> Self {
        Self {
            occupations: vec![],
            education_levels: vec![],
            religions: vec![],
            languages: vec![],
            accepts_children: true,
        }
    }
}

/// Per-user matching knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingSettings {
    /// Score at or above which a pending offer is flagged for auto-accept
    #[serde(rename = "autoAcceptThreshold")]
    pub auto_accept_threshold: u8,
    /// Minimum score for a candidate to be surfaced at all
    #[serde(rename = "compatibilityThreshold")]
    pub compatibility_threshold: u8,
    /// Cap on newly surfaced candidates per day
    #[serde(rename = "dailyMatchLimit")]
    pub daily_match_limit: u8,
    #[serde(rename = "superLikeBypassesQuota")]
    pub super_like_bypasses_quota: bool,
    #[serde(rename = "visibleInSearch")]
    pub visible_in_search: bool,
    #[serde(rename = "showOnlineStatus")]
    pub show_online_status: bool,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            auto_accept_threshold: 90,
            compatibility_threshold: 40,
            daily_match_limit: 20,
            super_like_bypasses_quota: true,
            visible_in_search: true,
            show_online_status: true,
        }
    }
}

/// Per-user matching configuration, one record per user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchPreferences {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "maxDistanceKm")]
    pub max_distance_km: u16,
    #[serde(rename = "minAge")]
    pub min_age: u8,
    #[serde(rename = "maxAge")]
    pub max_age: u8,
    #[serde(rename = "genderPreference", default)]
    pub gender_preference: Vec<String>,
    #[serde(rename = "budgetMin")]
    pub budget_min: u32,
    #[serde(rename = "budgetMax")]
    pub budget_max: u32,
    /// Percentage by which the budget bounds may be stretched
    #[serde(rename = "budgetFlexibilityPct")]
    pub budget_flexibility_pct: u8,
    #[serde(rename = "preferredStates", default)]
    pub preferred_states: Vec<String>,
    #[serde(rename = "preferredCities", default)]
    pub preferred_cities: Vec<String>,
    #[serde(rename = "preferredAreas", default)]
    pub preferred_areas: Vec<String>,
    /// Percentage by which the distance bound and preferred-location
    /// containment relax
    #[serde(rename = "locationFlexibilityPct")]
    pub location_flexibility_pct: u8,
    pub lifestyle: LifestylePreferences,
    pub schedule: SchedulePreferences,
    pub housing: HousingPreferences,
    pub roommate: RoommatePreferences,
    /// Free-text terms that unconditionally exclude a candidate
    #[serde(rename = "dealBreakers", default)]
    pub deal_breakers: Vec<String>,
    pub settings: MatchingSettings,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl MatchPreferences {
    /// System-wide defaults, materialized lazily on first access
    pub fn default_for(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            is_active: true,
            max_distance_km: 25,
            min_age: 18,
            max_age: 65,
            gender_preference: vec![],
            budget_min: 30_000,
            budget_max: 120_000,
            budget_flexibility_pct: 10,
            preferred_states: vec![],
            preferred_cities: vec![],
            preferred_areas: vec![],
            location_flexibility_pct: 0,
            lifestyle: LifestylePreferences::default(),
            schedule: SchedulePreferences::default(),
            housing: HousingPreferences::default(),
            roommate: RoommatePreferences::default(),
            deal_breakers: vec![],
            settings: MatchingSettings::default(),
            updated_at: now,
        }
    }

    /// Budget range widened by this user's flexibility percentage
    pub fn effective_budget(&self) -> (f64, f64) {
        let stretch = self.budget_flexibility_pct as f64 / 100.0;
        let min = self.budget_min as f64 * (1.0 - stretch);
        let max = self.budget_max as f64 * (1.0 + stretch);
        (min, max)
    }

    /// Max distance widened by the location flexibility percentage
    pub fn effective_max_distance_km(&self) -> f64 {
        let stretch = self.location_flexibility_pct as f64 / 100.0;
        self.max_distance_km as f64 * (1.0 + stretch)
    }
}

/// Candidate profile as the platform directory returns it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateProfile {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub name: String,
    pub age: u8,
    pub gender: String,
    #[serde(default)]
    pub occupation: String,
    #[serde(default)]
    pub education: String,
    #[serde(default)]
    pub religion: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(rename = "lifestyleTags", default)]
    pub lifestyle_tags: Vec<String>,
    #[serde(rename = "hasChildren", default)]
    pub has_children: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub state: String,
    pub city: String,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Property listing as the platform directory returns it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyListing {
    #[serde(rename = "propertyId")]
    pub property_id: String,
    pub title: String,
    #[serde(rename = "propertyType")]
    pub property_type: String,
    pub rent: u32,
    pub rooms: u8,
    #[serde(default)]
    pub furnished: bool,
    #[serde(default)]
    pub parking: bool,
    #[serde(default)]
    pub security: bool,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub state: String,
    pub city: String,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(rename = "smokingAllowed", default)]
    pub smoking_allowed: bool,
    #[serde(rename = "petsAllowed", default)]
    pub pets_allowed: bool,
    #[serde(rename = "isActive", default = "default_true")]
    pub is_active: bool,
}

/// Geospatial bounding box used by the candidate pre-filter
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Lifecycle events emitted for the notification/messaging collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEventKind {
    #[serde(rename = "match.created")]
    Created,
    #[serde(rename = "match.mutual")]
    Mutual,
    #[serde(rename = "match.expired")]
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEvent {
    pub event: MatchEventKind,
    #[serde(rename = "matchId")]
    pub match_id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "targetId")]
    pub target_id: String,
    #[serde(rename = "targetType")]
    pub target_type: TargetType,
    #[serde(rename = "occurredAt")]
    pub occurred_at: DateTime<Utc>,
}

impl MatchEvent {
    pub fn for_match(kind: MatchEventKind, m: &Match, occurred_at: DateTime<Utc>) -> Self {
        Self {
            event: kind,
            match_id: m.id,
            user_id: m.user_id.clone(),
            target_id: m.target_id.clone(),
            target_type: m.target_type,
            occurred_at,
        }
    }
}

/// Scoring weights for the seven compatibility factors
///
/// Deployment-time constants, never per-user data. Must sum to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct ScoringWeights {
    pub location: f64,
    pub budget: f64,
    pub lifestyle: f64,
    pub preferences: f64,
    pub schedule: f64,
    pub cleanliness: f64,
    pub social: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            location: 0.20,
            budget: 0.20,
            lifestyle: 0.15,
            preferences: 0.15,
            schedule: 0.10,
            cleanliness: 0.10,
            social: 0.10,
        }
    }
}
