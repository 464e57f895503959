pub mod project;
pub mod user;

pub use project::{Project, ProjectStatus, ProjectSummary};
pub use user::User;
