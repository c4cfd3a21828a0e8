//! Browser scenarios
//!
//! Each scenario drives the UI through page objects and then checks the
//! persisted state through the REST client, or seeds through REST and checks
//! the UI. All suites share one backing store.

mod pipeline_crud;
mod series_crud;
mod smoke;

use std::fmt::Debug;

use crate::error::{E2eError, E2eResult};
use crate::runner::Suite;

/// Every suite, in run order
pub fn all_suites() -> Vec<Suite> {
    vec![smoke::suite(), pipeline_crud::suite(), series_crud::suite()]
}

/// Succeed only when the fetch came back 404
pub(crate) fn expect_gone<T>(result: E2eResult<T>, what: &str) -> E2eResult<()> {
    match result {
        Ok(_) => Err(E2eError::Assertion(format!("{} still exists", what))),
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}

/// Succeed only when a cancelled edit left the record and its collection as they were
pub(crate) fn expect_untouched<T: PartialEq + Debug>(
    what: &str,
    before: &T,
    after: &T,
    count_before: usize,
    count_after: usize,
) -> E2eResult<()> {
    if count_before != count_after {
        return Err(E2eError::Assertion(format!(
            "{} count changed from {} to {}",
            what, count_before, count_after
        )));
    }
    if before != after {
        return Err(E2eError::Assertion(format!(
            "{} changed: {:?} became {:?}",
            what, before, after
        )));
    }
    Ok(())
}
