//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::auth;
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use course_summary_core::domain::{Course, CourseSummary};
use course_summary_core::ports::PortError;
use course_summary_core::summary_flow::generate_course_summary;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_course_handler,
        generate_summary_handler,
        my_courses_handler,
        auth::register_handler,
        auth::login_handler,
    ),
    components(
        schemas(
            CourseCreate,
            CourseOut,
            CourseSummaryOut,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::UserOut,
            auth::TokenResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Courses", description = "Course registration and AI summary generation."),
        (name = "Auth", description = "User registration and JWT login.")
    )
)]
pub struct ApiDoc;

/// Registers the bearer-token security scheme referenced by the protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The payload for registering a course. Unknown fields are rejected.
#[derive(Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct CourseCreate {
    pub course_title: String,
    pub course_description: String,
}

/// A course as returned to its owner.
#[derive(Serialize, ToSchema)]
pub struct CourseOut {
    pub id: Uuid,
    pub course_title: String,
    pub course_description: String,
    pub status: String,
}

impl CourseOut {
    fn from_domain(course: Course) -> Self {
        Self {
            id: course.id,
            course_title: course.course_title,
            course_description: course.course_description,
            status: course.status.as_str().to_string(),
        }
    }
}

/// A stored AI summary as returned to the course owner.
#[derive(Serialize, ToSchema)]
pub struct CourseSummaryOut {
    pub id: Uuid,
    pub course_id: Uuid,
    pub ai_summary: String,
}

impl CourseSummaryOut {
    fn from_domain(summary: CourseSummary) -> Self {
        Self {
            id: summary.id,
            course_id: summary.course_id,
            ai_summary: summary.ai_summary,
        }
    }
}

/// Maps a core port error onto the HTTP status code it is surfaced as.
fn port_error_response(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
        PortError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        PortError::RateLimited(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
        PortError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        PortError::Unexpected(msg) => {
            error!("Unexpected port error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Register a new course owned by the caller.
///
/// The course starts out in the `pending` state. No duplicate-title check is
/// performed.
#[utoipa::path(
    post,
    path = "/course",
    request_body = CourseCreate,
    responses(
        (status = 201, description = "Course created successfully", body = CourseOut),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 422, description = "Malformed request body"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_token" = [])),
    tag = "Courses"
)]
pub async fn create_course_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Json(payload): Json<CourseCreate>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let course = state
        .db
        .create_course(user_id, &payload.course_title, &payload.course_description)
        .await
        .map_err(port_error_response)?;
    Ok((StatusCode::CREATED, Json(CourseOut::from_domain(course))))
}

/// Generate (or return the cached) AI summary for a course.
#[utoipa::path(
    post,
    path = "/generate_summary/{course_id}",
    params(
        ("course_id" = Uuid, Path, description = "The id of the course to summarize.")
    ),
    responses(
        (status = 201, description = "Summary generated or returned from cache", body = CourseSummaryOut),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Caller is not the course owner"),
        (status = 404, description = "No such course"),
        (status = 429, description = "Hourly summary quota reached"),
        (status = 502, description = "Summary generation failed upstream")
    ),
    security(("bearer_token" = [])),
    tag = "Courses"
)]
pub async fn generate_summary_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(course_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let summary = generate_course_summary(
        state.db.as_ref(),
        state.summarizer.as_ref(),
        user_id,
        course_id,
        state.config.number_of_requests,
    )
    .await
    .map_err(port_error_response)?;
    Ok((
        StatusCode::CREATED,
        Json(CourseSummaryOut::from_domain(summary)),
    ))
}

/// List the caller's courses.
///
/// The path parameter is accepted but ignored; the endpoint returns the
/// caller's full course list, matching the original surface.
#[utoipa::path(
    get,
    path = "/course/{course_id}",
    params(
        ("course_id" = Uuid, Path, description = "Ignored; the caller's full course list is returned.")
    ),
    responses(
        (status = 200, description = "The caller's courses", body = [CourseOut]),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer_token" = [])),
    tag = "Courses"
)]
pub async fn my_courses_handler(
    State(state): State<Arc<AppState>>,
    Extension(user_id): Extension<Uuid>,
    Path(_course_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let courses = state
        .db
        .get_courses_by_owner(user_id)
        .await
        .map_err(port_error_response)?;
    let out: Vec<CourseOut> = courses.into_iter().map(CourseOut::from_domain).collect();
    Ok(Json(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn course_create_rejects_unknown_fields() {
        let result: Result<CourseCreate, _> = serde_json::from_str(
            r#"{"course_title": "T", "course_description": "D", "price": 10}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn course_create_accepts_exact_fields() {
        let payload: CourseCreate =
            serde_json::from_str(r#"{"course_title": "T", "course_description": "D"}"#).unwrap();
        assert_eq!(payload.course_title, "T");
        assert_eq!(payload.course_description, "D");
    }

    #[test]
    fn rate_limit_maps_to_429_and_upstream_to_502() {
        let (status, _) = port_error_response(PortError::RateLimited("quota".to_string()));
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        let (status, _) = port_error_response(PortError::Upstream("boom".to_string()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
