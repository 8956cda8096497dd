use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ScoredCandidate;
use crate::models::{FactorScores, Match, MatchType, TargetType};

/// One surfaced candidate with its score breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSummary {
    #[serde(rename = "targetId")]
    pub target_id: String,
    #[serde(rename = "targetType")]
    pub target_type: TargetType,
    #[serde(rename = "matchType")]
    pub match_type: MatchType,
    pub name: String,
    #[serde(rename = "compatibilityScore")]
    pub compatibility_score: u8,
    pub factors: FactorScores,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
    #[serde(rename = "budgetOverlapPct")]
    pub budget_overlap_pct: u8,
    #[serde(rename = "sameState")]
    pub same_state: bool,
    #[serde(rename = "matchReasons")]
    pub match_reasons: Vec<String>,
    #[serde(rename = "commonInterests")]
    pub common_interests: Vec<String>,
    #[serde(rename = "alreadySurfaced")]
    pub already_surfaced: bool,
}

impl From<ScoredCandidate> for CandidateSummary {
    fn from(c: ScoredCandidate) -> Self {
        Self {
            target_id: c.target_id,
            target_type: c.target_type,
            match_type: c.match_type,
            name: c.display_name,
            compatibility_score: c.breakdown.overall,
            factors: c.breakdown.factors,
            distance_km: c.breakdown.distance_km,
            budget_overlap_pct: c.breakdown.budget_overlap_pct,
            same_state: c.breakdown.same_state,
            match_reasons: c.breakdown.match_reasons,
            common_interests: c.breakdown.common_interests,
            already_surfaced: c.already_surfaced,
        }
    }
}

/// Response for the candidates endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatesResponse {
    pub candidates: Vec<CandidateSummary>,
    #[serde(rename = "totalConsidered")]
    pub total_considered: usize,
    #[serde(rename = "quotaDeferred")]
    pub quota_deferred: usize,
}

/// Response for the swipe endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeResponse {
    #[serde(rename = "match")]
    pub match_record: Match,
    #[serde(rename = "isMutualMatch")]
    pub is_mutual_match: bool,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
