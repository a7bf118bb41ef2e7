//! Backend-agnostic orchestration on top of the DAOs. Providers fetch the
//! DAOs they need from the session on every call and bracket multi-step
//! mutations in a transaction.

use std::future::Future;

use tracing::warn;

use crate::dao::DbSessionManager;
use crate::error::Result;

mod constraints;
mod datatypes;
mod indexes;
mod roles;
mod statistics;
mod tables;

pub use constraints::ConstraintsProvider;
pub use datatypes::DataTypesProvider;
pub use indexes::IndexesProvider;
pub use roles::RolesProvider;
pub use statistics::StatisticsProvider;
pub use tables::TablesProvider;

/// Runs `work` between `start_transaction` and `commit`, rolling back if it
/// fails. A failed rollback is reported instead of the original error. A
/// failed commit is rolled back too and its own error returned.
pub(crate) async fn in_transaction<T, Fut>(
    session: &dyn DbSessionManager,
    work: impl FnOnce() -> Fut,
) -> Result<T>
where
    Fut: Future<Output = Result<T>>,
{
    session.start_transaction().await?;

    match work().await {
        Ok(value) => match session.commit().await {
            Ok(()) => Ok(value),
            Err(error) => {
                warn!("Commit failed with {error}, rolling back");
                if let Err(rollback_error) = session.rollback().await {
                    warn!("Rollback after a failed commit failed with {rollback_error}");
                }
                Err(error)
            }
        },
        Err(error) => {
            warn!("Rolling back after {error}");
            session.rollback().await?;
            Err(error)
        }
    }
}
