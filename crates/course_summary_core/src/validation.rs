//! crates/course_summary_core/src/validation.rs
//!
//! Pure validation checks used by the generate-summary flow: the ownership
//! check, the sliding-window quota check, and the vetting of raw model output.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::Course;
use crate::ports::{DatabaseService, PortError, PortResult};

/// Markers that disqualify a model response as a usable summary.
/// Matched as case-sensitive substrings anywhere in the text.
const REFUSAL_MARKERS: [&str; 2] = ["I'm sorry", "As an AI"];

/// Verifies that the course exists and that `user_id` owns it.
///
/// Fails with `NotFound` when no course was located and with `Forbidden`
/// when the requester is not the owner. Has no side effects and must run
/// before the quota check and before any external call.
pub fn check_course_owner(course: Option<&Course>, user_id: Uuid) -> PortResult<()> {
    let course = course.ok_or_else(|| PortError::NotFound("Course not found".to_string()))?;
    if course.owner_id != user_id {
        return Err(PortError::Forbidden(
            "Only the author of the course can create a summary".to_string(),
        ));
    }
    Ok(())
}

/// Enforces the per-user summary quota over the trailing hour.
///
/// The window slides: it is recomputed as `now - 1h` on every call, with an
/// inclusive lower bound. A count at or above `threshold` fails the check.
pub async fn check_summary_quota(
    db: &dyn DatabaseService,
    user_id: Uuid,
    threshold: u32,
    now: DateTime<Utc>,
) -> PortResult<()> {
    let one_hour_ago = now - Duration::hours(1);
    let count = db.count_summaries_since(user_id, one_hour_ago).await?;
    if count >= i64::from(threshold) {
        return Err(PortError::RateLimited(format!(
            "You have reached the limit of {} summaries per hour",
            threshold
        )));
    }
    Ok(())
}

/// Vets the raw text returned by the summarization model.
///
/// Trims surrounding whitespace and rejects the result if it is empty or
/// contains a refusal marker. Returns the trimmed text on success and a
/// human-readable cause on failure.
pub fn vet_summary_text(raw: &str) -> Result<String, String> {
    let summary = raw.trim();
    if summary.is_empty() {
        return Err("Summary is empty".to_string());
    }
    for marker in REFUSAL_MARKERS {
        if summary.contains(marker) {
            return Err("Unusable summary content".to_string());
        }
    }
    Ok(summary.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CourseStatus;

    fn course_owned_by(owner_id: Uuid) -> Course {
        Course {
            id: Uuid::new_v4(),
            owner_id,
            course_title: "Intro".to_string(),
            course_description: "Learn X".to_string(),
            status: CourseStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn missing_course_is_not_found() {
        let err = check_course_owner(None, Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }

    #[test]
    fn non_owner_is_forbidden() {
        let course = course_owned_by(Uuid::new_v4());
        let err = check_course_owner(Some(&course), Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, PortError::Forbidden(_)));
    }

    #[test]
    fn owner_passes() {
        let owner = Uuid::new_v4();
        let course = course_owned_by(owner);
        assert!(check_course_owner(Some(&course), owner).is_ok());
    }

    #[test]
    fn vetting_trims_surrounding_whitespace() {
        assert_eq!(
            vet_summary_text("  A short overview of X.\n"),
            Ok("A short overview of X.".to_string())
        );
    }

    #[test]
    fn vetting_rejects_empty_output() {
        assert!(vet_summary_text("").is_err());
        assert!(vet_summary_text("   \n\t ").is_err());
    }

    #[test]
    fn vetting_rejects_refusal_markers() {
        assert!(vet_summary_text("I'm sorry, I cannot do that.").is_err());
        assert!(vet_summary_text("As an AI, I do not summarize courses.").is_err());
        assert!(vet_summary_text("The course covers As an AI topics").is_err());
    }

    #[test]
    fn vetting_markers_are_case_sensitive() {
        // Lower-case variants are not disqualifying as written.
        assert!(vet_summary_text("as an ai model this is fine").is_ok());
        assert!(vet_summary_text("i'm sorry to say the course is short").is_ok());
    }
}
