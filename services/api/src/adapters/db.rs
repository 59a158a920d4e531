//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use course_summary_core::domain::{Course, CourseStatus, CourseSummary, User, UserCredentials};
use course_summary_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    is_active: bool,
    is_verified: bool,
    is_superuser: bool,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            email: self.email,
            is_active: self.is_active,
            is_verified: self.is_verified,
            is_superuser: self.is_superuser,
        }
    }
}

#[derive(FromRow)]
struct UserCredentialsRecord {
    id: Uuid,
    email: String,
    hashed_password: String,
    is_active: bool,
}
impl UserCredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            id: self.id,
            email: self.email,
            hashed_password: self.hashed_password,
            is_active: self.is_active,
        }
    }
}

#[derive(FromRow)]
struct CourseRecord {
    id: Uuid,
    owner_id: Uuid,
    course_title: String,
    course_description: String,
    status: String,
    created_at: DateTime<Utc>,
}
impl CourseRecord {
    fn to_domain(self) -> PortResult<Course> {
        let status = CourseStatus::parse(&self.status).ok_or_else(|| {
            PortError::Unexpected(format!("Unknown course status '{}' stored", self.status))
        })?;
        Ok(Course {
            id: self.id,
            owner_id: self.owner_id,
            course_title: self.course_title,
            course_description: self.course_description,
            status,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct SummaryRecord {
    id: Uuid,
    course_id: Uuid,
    ai_summary: String,
    created_at: DateTime<Utc>,
}
impl SummaryRecord {
    fn to_domain(self) -> CourseSummary {
        CourseSummary {
            id: self.id,
            course_id: self.course_id,
            ai_summary: self.ai_summary,
            created_at: self.created_at,
        }
    }
}

/// A course joined with its (optional) summary in one row.
#[derive(FromRow)]
struct CourseWithSummaryRecord {
    id: Uuid,
    owner_id: Uuid,
    course_title: String,
    course_description: String,
    status: String,
    created_at: DateTime<Utc>,
    summary_id: Option<Uuid>,
    ai_summary: Option<String>,
    summary_created_at: Option<DateTime<Utc>>,
}
impl CourseWithSummaryRecord {
    fn to_domain(self) -> PortResult<(Course, Option<CourseSummary>)> {
        let summary = match (self.summary_id, self.ai_summary, self.summary_created_at) {
            (Some(id), Some(ai_summary), Some(created_at)) => Some(CourseSummary {
                id,
                course_id: self.id,
                ai_summary,
                created_at,
            }),
            _ => None,
        };
        let course = CourseRecord {
            id: self.id,
            owner_id: self.owner_id,
            course_title: self.course_title,
            course_description: self.course_description,
            status: self.status,
            created_at: self.created_at,
        }
        .to_domain()?;
        Ok((course, summary))
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, email: &str, hashed_password: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, email, hashed_password) VALUES ($1, $2, $3) \
             RETURNING id, email, is_active, is_verified, is_superuser",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(dbe) if dbe.is_unique_violation() => {
                PortError::Conflict(format!("A user with email {} already exists", email))
            }
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserCredentialsRecord>(
            "SELECT id, email, hashed_password, is_active FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, email, is_active, is_verified, is_superuser FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn create_course(
        &self,
        owner_id: Uuid,
        course_title: &str,
        course_description: &str,
    ) -> PortResult<Course> {
        let record = sqlx::query_as::<_, CourseRecord>(
            "INSERT INTO courses (id, owner_id, course_title, course_description) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, owner_id, course_title, course_description, status, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(course_title)
        .bind(course_description)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_course_with_summary(
        &self,
        course_id: Uuid,
    ) -> PortResult<Option<(Course, Option<CourseSummary>)>> {
        let record = sqlx::query_as::<_, CourseWithSummaryRecord>(
            "SELECT c.id, c.owner_id, c.course_title, c.course_description, c.status, \
                    c.created_at, \
                    s.id AS summary_id, s.ai_summary, s.created_at AS summary_created_at \
             FROM courses c \
             LEFT JOIN course_summaries s ON s.course_id = c.id \
             WHERE c.id = $1",
        )
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        record.map(|r| r.to_domain()).transpose()
    }

    async fn get_courses_by_owner(&self, owner_id: Uuid) -> PortResult<Vec<Course>> {
        let records = sqlx::query_as::<_, CourseRecord>(
            "SELECT id, owner_id, course_title, course_description, status, created_at \
             FROM courses WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn count_summaries_since(
        &self,
        owner_id: Uuid,
        since: DateTime<Utc>,
    ) -> PortResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(s.id) \
             FROM course_summaries s \
             JOIN courses c ON c.id = s.course_id \
             WHERE c.owner_id = $1 AND s.created_at >= $2",
        )
        .bind(owner_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(count)
    }

    async fn complete_with_summary(
        &self,
        course_id: Uuid,
        ai_summary: &str,
    ) -> PortResult<CourseSummary> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // Lock the course row so two racing generate calls serialize here.
        let course = sqlx::query_as::<_, CourseRecord>(
            "SELECT id, owner_id, course_title, course_description, status, created_at \
             FROM courses WHERE id = $1 FOR UPDATE",
        )
        .bind(course_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Course {} not found", course_id))
            }
            _ => unexpected(e),
        })?
        .to_domain()?;

        if course.status == CourseStatus::Completed {
            // Someone else completed the course first; hand back their summary.
            let existing = sqlx::query_as::<_, SummaryRecord>(
                "SELECT id, course_id, ai_summary, created_at \
                 FROM course_summaries WHERE course_id = $1",
            )
            .bind(course_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;
            tx.commit().await.map_err(unexpected)?;
            return Ok(existing.to_domain());
        }

        let summary = sqlx::query_as::<_, SummaryRecord>(
            "INSERT INTO course_summaries (id, course_id, ai_summary) VALUES ($1, $2, $3) \
             RETURNING id, course_id, ai_summary, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(ai_summary)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        sqlx::query("UPDATE courses SET status = 'completed' WHERE id = $1")
            .bind(course_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(summary.to_domain())
    }
}
