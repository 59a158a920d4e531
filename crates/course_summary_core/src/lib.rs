pub mod domain;
pub mod ports;
pub mod summary_flow;
pub mod validation;

pub use domain::{Course, CourseStatus, CourseSummary, User, UserCredentials};
pub use ports::{DatabaseService, PortError, PortResult, SummaryGenerationService};
pub use summary_flow::generate_course_summary;
