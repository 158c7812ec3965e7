mod project;

pub use project::{ProjectList, ProjectRecord, ProjectsDocument};
