//! crates/course_summary_core/src/summary_flow.rs
//!
//! The generate-summary use case, expressed purely against the service ports
//! so it can be exercised with in-memory fakes.

use chrono::Utc;
use uuid::Uuid;

use crate::domain::{CourseStatus, CourseSummary};
use crate::ports::{DatabaseService, PortError, PortResult, SummaryGenerationService};
use crate::validation::{check_course_owner, check_summary_quota};

/// Generates (or returns the cached) summary for `course_id` on behalf of `user_id`.
///
/// Sequence: load course with summary, ownership check, idempotent
/// short-circuit for already-completed courses, sliding-window quota check,
/// external summarization call, then a single atomic persist of the status
/// flip and the new summary row.
pub async fn generate_course_summary(
    db: &dyn DatabaseService,
    summarizer: &dyn SummaryGenerationService,
    user_id: Uuid,
    course_id: Uuid,
    hourly_quota: u32,
) -> PortResult<CourseSummary> {
    let loaded = db.get_course_with_summary(course_id).await?;
    check_course_owner(loaded.as_ref().map(|(course, _)| course), user_id)?;

    // The ownership check already rejected absence.
    let (course, existing) = loaded
        .ok_or_else(|| PortError::NotFound(format!("Course {} not found", course_id)))?;

    if course.status == CourseStatus::Completed {
        // Idempotent short-circuit: no quota check, no external call.
        return existing.ok_or_else(|| {
            PortError::Unexpected(format!(
                "Course {} is completed but has no stored summary",
                course.id
            ))
        });
    }

    check_summary_quota(db, user_id, hourly_quota, Utc::now()).await?;

    let ai_summary = summarizer.summarize(&course.course_description).await?;

    db.complete_with_summary(course.id, &ai_summary).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Course, User, UserCredentials};
    use crate::validation::vet_summary_text;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    //=====================================================================================
    // In-memory fakes
    //=====================================================================================

    #[derive(Default)]
    struct FakeDb {
        courses: Mutex<Vec<Course>>,
        summaries: Mutex<Vec<CourseSummary>>,
        complete_calls: AtomicUsize,
    }

    impl FakeDb {
        fn insert_course(&self, owner_id: Uuid, status: CourseStatus) -> Course {
            let course = Course {
                id: Uuid::new_v4(),
                owner_id,
                course_title: "Intro".to_string(),
                course_description: "Learn X".to_string(),
                status,
                created_at: Utc::now(),
            };
            self.courses.lock().unwrap().push(course.clone());
            course
        }

        fn insert_summary(&self, course_id: Uuid, created_at: DateTime<Utc>) -> CourseSummary {
            let summary = CourseSummary {
                id: Uuid::new_v4(),
                course_id,
                ai_summary: "stored summary".to_string(),
                created_at,
            };
            self.summaries.lock().unwrap().push(summary.clone());
            summary
        }

        fn course_status(&self, course_id: Uuid) -> CourseStatus {
            self.courses
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == course_id)
                .map(|c| c.status)
                .unwrap()
        }

        fn summary_count(&self) -> usize {
            self.summaries.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl DatabaseService for FakeDb {
        async fn create_user(&self, _email: &str, _hashed_password: &str) -> PortResult<User> {
            Err(PortError::Unexpected("not used in these tests".to_string()))
        }

        async fn get_user_by_email(&self, _email: &str) -> PortResult<UserCredentials> {
            Err(PortError::Unexpected("not used in these tests".to_string()))
        }

        async fn get_user_by_id(&self, _user_id: Uuid) -> PortResult<User> {
            Err(PortError::Unexpected("not used in these tests".to_string()))
        }

        async fn create_course(
            &self,
            owner_id: Uuid,
            course_title: &str,
            course_description: &str,
        ) -> PortResult<Course> {
            let course = Course {
                id: Uuid::new_v4(),
                owner_id,
                course_title: course_title.to_string(),
                course_description: course_description.to_string(),
                status: CourseStatus::Pending,
                created_at: Utc::now(),
            };
            self.courses.lock().unwrap().push(course.clone());
            Ok(course)
        }

        async fn get_course_with_summary(
            &self,
            course_id: Uuid,
        ) -> PortResult<Option<(Course, Option<CourseSummary>)>> {
            let course = self
                .courses
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == course_id)
                .cloned();
            Ok(course.map(|c| {
                let summary = self
                    .summaries
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|s| s.course_id == c.id)
                    .cloned();
                (c, summary)
            }))
        }

        async fn get_courses_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Course>> {
            Ok(self
                .courses
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.owner_id == owner_id)
                .cloned()
                .collect())
        }

        async fn count_summaries_since(
            &self,
            owner_id: Uuid,
            since: DateTime<Utc>,
        ) -> PortResult<i64> {
            let courses = self.courses.lock().unwrap();
            let owned: Vec<Uuid> = courses
                .iter()
                .filter(|c| c.owner_id == owner_id)
                .map(|c| c.id)
                .collect();
            let count = self
                .summaries
                .lock()
                .unwrap()
                .iter()
                .filter(|s| owned.contains(&s.course_id) && s.created_at >= since)
                .count();
            Ok(count as i64)
        }

        async fn complete_with_summary(
            &self,
            course_id: Uuid,
            ai_summary: &str,
        ) -> PortResult<CourseSummary> {
            self.complete_calls.fetch_add(1, Ordering::SeqCst);
            let mut courses = self.courses.lock().unwrap();
            let course = courses
                .iter_mut()
                .find(|c| c.id == course_id)
                .ok_or_else(|| PortError::NotFound(format!("Course {} not found", course_id)))?;
            if course.status == CourseStatus::Completed {
                return self
                    .summaries
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|s| s.course_id == course_id)
                    .cloned()
                    .ok_or_else(|| PortError::Unexpected("completed without summary".to_string()));
            }
            course.status = CourseStatus::Completed;
            let summary = CourseSummary {
                id: Uuid::new_v4(),
                course_id,
                ai_summary: ai_summary.to_string(),
                created_at: Utc::now(),
            };
            self.summaries.lock().unwrap().push(summary.clone());
            Ok(summary)
        }
    }

    /// A fake summarizer that vets its canned response the way the real
    /// adapter does, and counts how often it was invoked.
    struct FakeSummarizer {
        response: String,
        calls: AtomicUsize,
    }

    impl FakeSummarizer {
        fn returning(response: &str) -> Self {
            Self {
                response: response.to_string(),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SummaryGenerationService for FakeSummarizer {
        async fn summarize(&self, _course_description: &str) -> PortResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            vet_summary_text(&self.response).map_err(PortError::Upstream)
        }
    }

    //=====================================================================================
    // Tests
    //=====================================================================================

    const QUOTA: u32 = 3;

    #[tokio::test]
    async fn missing_course_fails_with_not_found() {
        let db = FakeDb::default();
        let summarizer = FakeSummarizer::returning("A short overview of X.");

        let err = generate_course_summary(&db, &summarizer, Uuid::new_v4(), Uuid::new_v4(), QUOTA)
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::NotFound(_)));
        assert_eq!(summarizer.call_count(), 0);
    }

    #[tokio::test]
    async fn non_owner_fails_with_forbidden_and_mutates_nothing() {
        let db = FakeDb::default();
        let owner = Uuid::new_v4();
        let course = db.insert_course(owner, CourseStatus::Pending);
        let summarizer = FakeSummarizer::returning("A short overview of X.");

        let err = generate_course_summary(&db, &summarizer, Uuid::new_v4(), course.id, QUOTA)
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::Forbidden(_)));
        assert_eq!(summarizer.call_count(), 0);
        assert_eq!(db.complete_calls.load(Ordering::SeqCst), 0);
        assert_eq!(db.course_status(course.id), CourseStatus::Pending);
        assert_eq!(db.summary_count(), 0);
    }

    #[tokio::test]
    async fn completed_course_short_circuits_without_external_call() {
        let db = FakeDb::default();
        let owner = Uuid::new_v4();
        let course = db.insert_course(owner, CourseStatus::Completed);
        let stored = db.insert_summary(course.id, Utc::now());
        let summarizer = FakeSummarizer::returning("A different summary.");

        let returned = generate_course_summary(&db, &summarizer, owner, course.id, QUOTA)
            .await
            .unwrap();

        assert_eq!(returned.id, stored.id);
        assert_eq!(returned.ai_summary, stored.ai_summary);
        assert_eq!(summarizer.call_count(), 0);
        assert_eq!(db.summary_count(), 1);
    }

    #[tokio::test]
    async fn quota_reached_fails_with_rate_limited() {
        let db = FakeDb::default();
        let owner = Uuid::new_v4();
        for _ in 0..QUOTA {
            let done = db.insert_course(owner, CourseStatus::Completed);
            db.insert_summary(done.id, Utc::now() - Duration::minutes(5));
        }
        let pending = db.insert_course(owner, CourseStatus::Pending);
        let summarizer = FakeSummarizer::returning("A short overview of X.");

        let err = generate_course_summary(&db, &summarizer, owner, pending.id, QUOTA)
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::RateLimited(_)));
        assert_eq!(summarizer.call_count(), 0);
        assert_eq!(db.course_status(pending.id), CourseStatus::Pending);
    }

    #[tokio::test]
    async fn summaries_older_than_the_window_do_not_count() {
        let db = FakeDb::default();
        let owner = Uuid::new_v4();
        // Two recent summaries plus one from 61 minutes ago: under the quota of 3.
        for minutes in [5, 10, 61] {
            let done = db.insert_course(owner, CourseStatus::Completed);
            db.insert_summary(done.id, Utc::now() - Duration::minutes(minutes));
        }
        let pending = db.insert_course(owner, CourseStatus::Pending);
        let summarizer = FakeSummarizer::returning("A short overview of X.");

        let summary = generate_course_summary(&db, &summarizer, owner, pending.id, QUOTA)
            .await
            .unwrap();

        assert_eq!(summary.ai_summary, "A short overview of X.");
        assert_eq!(summarizer.call_count(), 1);
    }

    #[tokio::test]
    async fn window_lower_bound_is_inclusive() {
        let db = FakeDb::default();
        let owner = Uuid::new_v4();
        let now = Utc::now();
        let done = db.insert_course(owner, CourseStatus::Completed);
        // Created exactly at now - 1h: it must be counted.
        db.insert_summary(done.id, now - Duration::hours(1));

        let err = check_summary_quota(&db, owner, 1, now).await.unwrap_err();
        assert!(matches!(err, PortError::RateLimited(_)));
    }

    #[tokio::test]
    async fn empty_model_output_fails_upstream_and_leaves_course_pending() {
        let db = FakeDb::default();
        let owner = Uuid::new_v4();
        let course = db.insert_course(owner, CourseStatus::Pending);
        let summarizer = FakeSummarizer::returning("   ");

        let err = generate_course_summary(&db, &summarizer, owner, course.id, QUOTA)
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::Upstream(_)));
        assert_eq!(db.course_status(course.id), CourseStatus::Pending);
        assert_eq!(db.summary_count(), 0);
    }

    #[tokio::test]
    async fn refusal_output_fails_upstream_and_leaves_course_pending() {
        let db = FakeDb::default();
        let owner = Uuid::new_v4();
        let course = db.insert_course(owner, CourseStatus::Pending);
        let summarizer = FakeSummarizer::returning("As an AI, I cannot summarize this.");

        let err = generate_course_summary(&db, &summarizer, owner, course.id, QUOTA)
            .await
            .unwrap_err();

        assert!(matches!(err, PortError::Upstream(_)));
        assert_eq!(db.course_status(course.id), CourseStatus::Pending);
        assert_eq!(db.summary_count(), 0);
    }

    #[tokio::test]
    async fn create_then_list_round_trips() {
        let db = FakeDb::default();
        let owner = Uuid::new_v4();

        db.create_course(owner, "T", "D").await.unwrap();

        let courses = db.get_courses_by_owner(owner).await.unwrap();
        assert_eq!(courses.len(), 1);
        assert_eq!(courses[0].course_title, "T");
        assert_eq!(courses[0].course_description, "D");
        assert_eq!(courses[0].status, CourseStatus::Pending);
    }

    #[tokio::test]
    async fn happy_path_then_idempotent_repeat() {
        let db = FakeDb::default();
        let owner = Uuid::new_v4();
        let course = db.create_course(owner, "Intro", "Learn X").await.unwrap();
        let summarizer = FakeSummarizer::returning("A short overview of X.");

        let first = generate_course_summary(&db, &summarizer, owner, course.id, QUOTA)
            .await
            .unwrap();
        assert_eq!(first.ai_summary, "A short overview of X.");
        assert_eq!(db.course_status(course.id), CourseStatus::Completed);

        let second = generate_course_summary(&db, &summarizer, owner, course.id, QUOTA)
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(summarizer.call_count(), 1);
    }
}
