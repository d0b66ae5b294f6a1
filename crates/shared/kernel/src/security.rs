//! The actor on whose behalf the current task runs.
//!
//! The actor is task-scoped: it is bound with [`with_actor`] around a future and
//! visible to everything that future awaits, without being passed explicitly.

use std::future::Future;
use wf_domain::constants::ANONYMOUS_ACTOR;

tokio::task_local! {
    static CURRENT_ACTOR: String;
}

/// Runs `future` with `actor` as the current actor.
///
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use wf_kernel::security::{current_actor, with_actor};
///
/// let seen = with_actor("admin", async { current_actor() }).await;
/// assert_eq!(seen.as_deref(), Some("admin"));
/// assert_eq!(current_actor(), None);
/// # }
/// ```
pub async fn with_actor<F>(actor: impl Into<String>, future: F) -> F::Output
where
    F: Future,
{
    CURRENT_ACTOR.scope(actor.into(), future).await
}

/// The authenticated actor of the current task, if any.
///
/// Blank names and the anonymous login count as "no actor".
#[must_use]
pub fn current_actor() -> Option<String> {
    CURRENT_ACTOR
        .try_with(Clone::clone)
        .ok()
        .filter(|actor| !actor.trim().is_empty() && actor != ANONYMOUS_ACTOR)
}
