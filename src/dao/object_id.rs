use std::fmt::Debug;

use async_trait::async_trait;
use strum_macros::{AsRefStr, Display};

use crate::error::Result;
use crate::model::ObjectId;

/// Object classes that draw ids from a generator. The string form is the
/// counter/sequence key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ObjectClass {
    Tables,
    Columns,
    Constraints,
    Indexes,
    ColumnStatistics,
}

/// Monotonic id source, one counter per object class.
///
/// `generate` hands out a value strictly greater than any earlier one for the
/// same class and has persisted it before returning. `current` never mutates
/// and is 0 when nothing has been generated yet.
#[async_trait]
pub trait ObjectIdGenerator: Send + Sync + Debug {
    async fn current(&self, class: ObjectClass) -> Result<ObjectId>;

    async fn generate(&self, class: ObjectClass) -> Result<ObjectId>;
}
