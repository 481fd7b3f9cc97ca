//! Evict diagnostics whose line was edited since they were recorded.
//!
//! The check is deliberately coarse: any change to the anchored line evicts,
//! even one outside the highlighted span. Edits that move lines around
//! without touching the anchored line's content keep the entry at its old
//! index.

use webvalidator_types::TextDocument;

use crate::tracker::IssueTracker;

/// Reconcile `tracker` with the current text of `document`.
///
/// Returns `true` when no diagnostics remain to be shown. A document the
/// tracker is not bound to leaves the list untouched.
pub fn refresh(tracker: &mut IssueTracker, document: &TextDocument) -> bool {
    if !tracker.is_bound_to(document.uri()) {
        return tracker.is_empty();
    }

    let before = tracker.len();
    tracker.retain(|entry| entry.anchor().holds_in(document));
    let evicted = before - tracker.len();
    if evicted > 0 {
        tracing::debug!(
            uri = document.uri(),
            evicted,
            remaining = tracker.len(),
            "Evicted stale diagnostics"
        );
    }

    tracker.is_empty()
}
