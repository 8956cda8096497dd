use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{SwipeAction, TargetType};

fn default_limit() -> u16 {
    20
}

/// Query for the candidates endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CandidatesQuery {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[serde(default = "default_limit")]
    pub limit: u16,
    /// Which kind of candidates to surface; defaults to roommates
    #[serde(rename = "targetType", default)]
    pub target_type: Option<TargetType>,
}

/// Body for the swipe endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SwipeRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "user_id", rename = "userId")]
    pub user_id: String,
    #[validate(length(min = 1))]
    #[serde(alias = "target_id", rename = "targetId")]
    pub target_id: String,
    #[serde(rename = "targetType")]
    pub target_type: TargetType,
    pub action: SwipeAction,
}

/// Body for the extend endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ExtendRequest {
    #[validate(range(min = 1, max = 365))]
    pub days: i64,
}

/// Body for adding or removing a deal-breaker term
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DealBreakerRequest {
    #[validate(length(min = 1, max = 120))]
    pub text: String,
}
