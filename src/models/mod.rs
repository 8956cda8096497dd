// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BoundingBox, CandidateProfile, FactorScores, HousingPreferences, LifestylePreferences, Match,
    MatchEvent, MatchEventKind, MatchPreferences, MatchStatus, MatchType, MatchingSettings,
    PropertyListing, RoommatePreferences, SchedulePreferences, ScoringWeights, SleepPattern,
    SwipeAction, TargetType, Tolerance, WorkShift,
};
pub use requests::{CandidatesQuery, DealBreakerRequest, ExtendRequest, SwipeRequest};
pub use responses::{
    CandidateSummary, CandidatesResponse, ErrorResponse, HealthResponse, SwipeResponse,
};
