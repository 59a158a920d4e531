//! crates/course_summary_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Course, CourseSummary, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Rate limited: {0}")]
    RateLimited(String),
    #[error("Upstream service failure: {0}")]
    Upstream(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Management ---
    async fn create_user(&self, email: &str, hashed_password: &str) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    // --- Course Management ---
    async fn create_course(
        &self,
        owner_id: Uuid,
        course_title: &str,
        course_description: &str,
    ) -> PortResult<Course>;

    /// Loads a course together with its summary, if one exists.
    /// Returns `Ok(None)` when no such course exists at all.
    async fn get_course_with_summary(
        &self,
        course_id: Uuid,
    ) -> PortResult<Option<(Course, Option<CourseSummary>)>>;

    async fn get_courses_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Course>>;

    // --- Summary Management ---
    /// Counts summaries belonging to the user's courses created at or after `since`.
    async fn count_summaries_since(
        &self,
        owner_id: Uuid,
        since: DateTime<Utc>,
    ) -> PortResult<i64>;

    /// Marks the course completed and stores its summary as one atomic unit.
    ///
    /// Implementations must guard against two racing callers: if the course
    /// was completed by someone else in the meantime, the already-stored
    /// summary is returned instead of inserting a second one.
    async fn complete_with_summary(
        &self,
        course_id: Uuid,
        ai_summary: &str,
    ) -> PortResult<CourseSummary>;
}

#[async_trait]
pub trait SummaryGenerationService: Send + Sync {
    /// Produces a summary of the given course description.
    ///
    /// Implementations are responsible for vetting the raw model output
    /// (see [`crate::validation::vet_summary_text`]) and must surface any
    /// transport error, empty result, or refusal as `PortError::Upstream`.
    async fn summarize(&self, course_description: &str) -> PortResult<String>;
}
