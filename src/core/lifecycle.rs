use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::models::{Match, MatchStatus, SwipeAction};

/// Violations of the match state machine
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("swipe action cannot be 'none'")]
    ActionRequired,

    #[error("requester and target are the same entity: {0}")]
    SelfTarget(String),

    #[error("match is {0:?}, only pending matches accept swipes")]
    NotPending(MatchStatus),

    #[error("extension days must be between 1 and {max}, got {requested}")]
    BadExtension { requested: i64, max: i64 },
}

/// Which field of the row the acting user occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    User,
    Target,
}

/// The state transition a swipe produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwipeOutcome {
    pub status: MatchStatus,
    /// Both sides have liked; the caller must stamp matched_at and emit
    /// the mutual event exactly once
    pub mutual: bool,
}

/// Deployment-time lifecycle constants
#[derive(Debug, Clone, Copy)]
pub struct MatchPolicy {
    /// How long a pending offer stays open
    pub offer_window_days: i64,
    /// Upper bound a single extend call may add
    pub extend_max_days: i64,
    /// Rows transitioned per expiry sweep pass
    pub sweep_batch: i64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            offer_window_days: 14,
            extend_max_days: 30,
            sweep_batch: 500,
        }
    }
}

impl MatchPolicy {
    /// Expiry timestamp for an offer created now
    pub fn offer_deadline(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + Duration::days(self.offer_window_days)
    }

    /// Validate and convert an extend request to a duration
    pub fn extension(&self, days: i64) -> Result<Duration, LifecycleError> {
        if days < 1 || days > self.extend_max_days {
            return Err(LifecycleError::BadExtension {
                requested: days,
                max: self.extend_max_days,
            });
        }
        Ok(Duration::days(days))
    }
}

/// Creation-time identity check: a match may never point at its own
/// requester
pub fn validate_pair(user_id: &str, target_id: &str) -> Result<(), LifecycleError> {
    if user_id == target_id {
        return Err(LifecycleError::SelfTarget(user_id.to_string()));
    }
    Ok(())
}

/// Decide the transition a swipe causes, without touching storage
///
/// The caller persists the outcome with a compare-and-set on the pending
/// status; a CAS miss means a concurrent transition won and the caller
/// returns the winning row instead.
pub fn decide_swipe(
    current: &Match,
    side: Side,
    action: SwipeAction,
) -> Result<SwipeOutcome, LifecycleError> {
    if action == SwipeAction::None {
        return Err(LifecycleError::ActionRequired);
    }
    if current.status != MatchStatus::Pending {
        return Err(LifecycleError::NotPending(current.status));
    }

    if action == SwipeAction::Passed {
        return Ok(SwipeOutcome {
            status: MatchStatus::Rejected,
            mutual: false,
        });
    }

    // Like or super-like: mutual once the opposite side has liked too;
    // a pass on either side kills the pair
    let other = match side {
        Side::User => current.target_action,
        Side::Target => current.user_action,
    };

    match other {
        a if a.is_like() => Ok(SwipeOutcome {
            status: MatchStatus::Matched,
            mutual: true,
        }),
        SwipeAction::Passed => Ok(SwipeOutcome {
            status: MatchStatus::Rejected,
            mutual: false,
        }),
        _ => Ok(SwipeOutcome {
            status: MatchStatus::Pending,
            mutual: false,
        }),
    }
}

/// Whether a pending offer is due for the expiry sweep
pub fn is_expired(m: &Match, now: DateTime<Utc>) -> bool {
    m.status == MatchStatus::Pending && m.expires_at <= now
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FactorScores, MatchType, TargetType};
    use uuid::Uuid;

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
            compatibility_score: 75,
            factors: FactorScores {
                location: 80,
                budget: 70,
                lifestyle: 75,
                preferences: 80,
                schedule: 70,
                cleanliness: 75,
                social: 70,
            },
            match_reasons: vec![],
            common_interests: vec![],
            shared_preferences: vec![],
            distance_km: Some(3.2),
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
    fn test_like_without_mirror_stays_pending() {
        let m = pending_match(SwipeAction::None, SwipeAction::None);
        let outcome = decide_swipe(&m, Side::User, SwipeAction::Liked).unwrap();
        assert_eq!(outcome.status, MatchStatus::Pending);
        assert!(!outcome.mutual);
    }

    #[test]
    fn test_like_after_target_liked_goes_mutual() {
        let m = pending_match(SwipeAction::None, SwipeAction::Liked);
        let outcome = decide_swipe(&m, Side::User, SwipeAction::Liked).unwrap();
        assert_eq!(outcome.status, MatchStatus::Matched);
        assert!(outcome.mutual);
    }

    #[test]
    fn test_super_like_counts_for_mutuality() {
        let m = pending_match(SwipeAction::None, SwipeAction::SuperLiked);
        let outcome = decide_swipe(&m, Side::User, SwipeAction::Liked).unwrap();
        assert!(outcome.mutual);

        let m = pending_match(SwipeAction::Liked, SwipeAction::None);
        let outcome = decide_swipe(&m, Side::Target, SwipeAction::SuperLiked).unwrap();
        assert!(outcome.mutual);
    }

    #[test]
    fn test_like_after_pass_still_rejects() {
        // The other side already passed: a like cannot resurrect the pair
        let m = pending_match(SwipeAction::None, SwipeAction::Passed);
        let outcome = decide_swipe(&m, Side::User, SwipeAction::Liked).unwrap();
        assert_eq!(outcome.status, MatchStatus::Rejected);
        assert!(!outcome.mutual);
    }

    #[test]
    fn test_pass_rejects() {
        let m = pending_match(SwipeAction::None, SwipeAction::Liked);
        let outcome = decide_swipe(&m, Side::User, SwipeAction::Passed).unwrap();
        assert_eq!(outcome.status, MatchStatus::Rejected);
        assert!(!outcome.mutual);
    }

    #[test]
    fn test_swipe_on_settled_match_is_invalid_state() {
        let mut m = pending_match(SwipeAction::Liked, SwipeAction::Liked);
        m.status = MatchStatus::Matched;

        let err = decide_swipe(&m, Side::User, SwipeAction::Liked).unwrap_err();
        assert_eq!(err, LifecycleError::NotPending(MatchStatus::Matched));
    }

    #[test]
    fn test_swipe_on_expired_match_is_invalid_state() {
        let mut m = pending_match(SwipeAction::None, SwipeAction::None);
        m.status = MatchStatus::Expired;

        assert!(decide_swipe(&m, Side::User, SwipeAction::Liked).is_err());
    }

    #[test]
    fn test_none_action_rejected() {
        let m = pending_match(SwipeAction::None, SwipeAction::None);
        let err = decide_swipe(&m, Side::User, SwipeAction::None).unwrap_err();
        assert_eq!(err, LifecycleError::ActionRequired);
    }

    #[test]
    fn test_self_target_rejected() {
        assert!(validate_pair("a", "a").is_err());
        assert!(validate_pair("a", "b").is_ok());
    }

    #[test]
    fn test_expiry_check() {
        let mut m = pending_match(SwipeAction::None, SwipeAction::None);
        assert!(!is_expired(&m, Utc::now()));

        m.expires_at = Utc::now() - Duration::hours(1);
        assert!(is_expired(&m, Utc::now()));

        // Terminal rows are never re-expired
        m.status = MatchStatus::Matched;
        assert!(!is_expired(&m, Utc::now()));
    }

    #[test]
    fn test_extension_bounds() {
        let policy = MatchPolicy::default();
        assert!(policy.extension(7).is_ok());
        assert!(policy.extension(0).is_err());
        assert!(policy.extension(31).is_err());
    }

    #[test]
    fn test_offer_deadline_uses_window() {
        let policy = MatchPolicy::default();
        let now = Utc::now();
        assert_eq!(policy.offer_deadline(now), now + Duration::days(14));
    }
}
