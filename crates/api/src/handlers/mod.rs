//! HTTP handlers, one module per resource.

pub mod assignment;
pub mod budget;
pub mod member;
pub mod project;
pub mod task;
pub mod time_entry;
