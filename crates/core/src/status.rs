//! Status enums mapping to SMALLINT lookup tables.
//!
//! Each variant's discriminant matches the seed order (1-based) of the
//! corresponding `*_statuses` table; the wire name is the snake_case string
//! used in request and response bodies.

use serde::{Deserialize, Serialize};

/// Status ID type matching SMALLINT in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Every variant in seed order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Wire name, e.g. `"in_progress"`.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }

            /// Resolve a database status ID.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Resolve a wire name.
            pub fn parse(name: &str) -> Option<Self> {
                match name {
                    $( $wire => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// Comma-separated list of accepted wire names, for error messages.
            pub fn allowed() -> String {
                Self::ALL
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

define_status_enum! {
    /// Project lifecycle status.
    ProjectStatus {
        Planning = 1 => "planning",
        InProgress = 2 => "in_progress",
        Completed = 3 => "completed",
        OnHold = 4 => "on_hold",
    }
}

define_status_enum! {
    /// Task workflow status.
    TaskStatus {
        Todo = 1 => "todo",
        InProgress = 2 => "in_progress",
        Completed = 3 => "completed",
        Blocked = 4 => "blocked",
    }
}

impl Default for ProjectStatus {
    fn default() -> Self {
        Self::Planning
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Todo
    }
}
