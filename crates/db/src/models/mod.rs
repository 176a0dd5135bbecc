//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A `Deserialize` create DTO with a `validate` method producing the typed
//!   insert input
//! - A `Deserialize` update DTO (all `Option` fields) validated into a patch
//! - The `Serialize` view returned by the API where it differs from the row

pub mod budget;
pub mod member;
pub mod project;
pub mod project_member;
pub mod task;
pub mod time_entry;
