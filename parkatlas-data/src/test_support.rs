//! Helpers shared across this crate's test suites.

use std::future::Future;

/// Run `future` to completion on a fresh runtime, for tests and doctests
/// that exercise async entry points.
pub fn block_on_for_tests<F: Future>(future: F) -> F::Output {
    tokio::runtime::Runtime::new()
        .expect("failed to create Tokio runtime for tests")
        .block_on(future)
}
