//! Data models for ClassCharts entities.
//!
//! These are generic decoded payloads, not a full domain model:
//!
//! - `Student`: the student record embedded in login/ping responses
//! - `SessionInfo`, `SessionMeta`: envelope payload/metadata for the
//!   session endpoints
//! - `Announcement`, `Detention`: resource list entries

pub mod announcement;
pub mod detention;
pub mod session;
pub mod student;

pub use announcement::Announcement;
pub use detention::Detention;
pub use session::{SessionInfo, SessionMeta};
pub use student::Student;
