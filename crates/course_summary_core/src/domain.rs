//! crates/course_summary_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// The lifecycle state of a course with respect to summary generation.
///
/// The only transition the summary flow performs is `Pending` -> `Completed`.
/// `Rejected` is a valid stored value but nothing in the current flow assigns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseStatus {
    Pending,
    Completed,
    Rejected,
}

impl CourseStatus {
    /// The canonical string form used in the database and in API responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::Pending => "pending",
            CourseStatus::Completed => "completed",
            CourseStatus::Rejected => "rejected",
        }
    }

    /// Parses a stored status string back into the enum.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(CourseStatus::Pending),
            "completed" => Some(CourseStatus::Completed),
            "rejected" => Some(CourseStatus::Rejected),
            _ => None,
        }
    }
}

// Represents a user - used throughout the app
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_superuser: bool,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub is_active: bool,
}

/// Represents an online course registered by a user for summarization.
#[derive(Debug, Clone)]
pub struct Course {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub course_title: String,
    pub course_description: String,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
}

/// The AI-generated summary attached to exactly one course.
#[derive(Debug, Clone)]
pub struct CourseSummary {
    pub id: Uuid,
    pub course_id: Uuid,
    pub ai_summary: String,
    pub created_at: DateTime<Utc>,
}
