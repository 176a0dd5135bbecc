//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument. Methods that must take part in a caller's
//! transaction accept any `PgExecutor` instead.

pub mod budget_repo;
pub mod member_repo;
pub mod project_member_repo;
pub mod project_repo;
pub mod task_repo;
pub mod time_entry_repo;

pub use budget_repo::BudgetRepo;
pub use member_repo::MemberRepo;
pub use project_member_repo::ProjectMemberRepo;
pub use project_repo::ProjectRepo;
pub use task_repo::TaskRepo;
pub use time_entry_repo::TimeEntryRepo;
