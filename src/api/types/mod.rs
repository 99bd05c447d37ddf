//! API request, response and error types

pub mod error;
pub mod json;
pub mod research;

pub use error::{ApiError, ApiErrorResponse, ApiErrorType};
pub use json::Json;
pub use research::{
    DocumentAnalysisRequest, FollowUpRequest, PlanInfo, ResearchRequest, ResearchResponse,
    SessionResponse, SessionsListResponse, SourceInfo, TurnInfo,
};
