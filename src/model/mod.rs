//! Typed metadata objects and their wire (JSON) representation.
//!
//! Field names follow the catalog's camelCase wire contract; renaming any of
//! them breaks files written by earlier versions.

/// Declares an enum that is stored and serialized as a plain integer code.
macro_rules! integer_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $value:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(into = "i64", try_from = "i64")]
        pub enum $name {
            $($variant),+
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> i64 {
                match value {
                    $($name::$variant => $value),+
                }
            }
        }

        impl TryFrom<i64> for $name {
            type Error = String;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                match value {
                    $(v if v == $value => Ok($name::$variant),)+
                    other => Err(format!("invalid {} code {other}", stringify!($name))),
                }
            }
        }
    };
}

pub mod constraint;
pub mod datatype;
pub mod index;
pub mod role;
pub mod statistic;
pub mod table;

pub use constraint::{ActionType, Constraint, ConstraintType, MatchType};
pub use datatype::{DataType, BUILTIN_DATA_TYPES};
pub use index::{AccessMethod, Index, IndexDirection};
pub use role::Role;
pub use statistic::{ColumnStatistic, TableStatistic};
pub use table::{Column, DataLength, Direction, Table, TableAcls};

pub type ObjectId = i64;

pub const FORMAT_VERSION: i64 = 1;
pub const GENERATION: i64 = 1;

pub(crate) fn default_format_version() -> i64 {
    FORMAT_VERSION
}

pub(crate) fn default_generation() -> i64 {
    GENERATION
}
