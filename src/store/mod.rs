pub mod sqlite;

use crate::app::Result;
use crate::domain::{ArchivedPage, RenderJob};

pub use sqlite::SqliteStore;

/// Storage contract consumed by both pipelines.
///
/// Implementations must be safe for concurrent use; the unique
/// (cve_id, url) constraint backing [`insert_if_absent`](Store::insert_if_absent)
/// is the idempotency guarantee across re-runs.
pub trait Store {
    /// Insert a page; a unique-key conflict on (cve_id, url) is silently
    /// absorbed, leaving the existing row untouched.
    fn insert_if_absent(&self, page: &ArchivedPage) -> Result<()>;

    /// Dedup check: has this (cve_id, url) pair already been archived?
    fn exists(&self, cve_id: &str, url: &str) -> Result<bool>;

    /// Pages with `js_required` set that have not been completed yet.
    fn find_pages_needing_render(&self) -> Result<Vec<RenderJob>>;

    /// Replace the stored HTML after a headless render.
    fn update_rendered_html(&self, id: i64, html: &str) -> Result<()>;

    /// Completion re-check for a render job. A missing row reads as
    /// not completed.
    fn is_completed(&self, id: i64, url: &str) -> Result<bool>;

    /// Mark a page as finalized. Monotonic; never unset.
    fn mark_completed(&self, id: i64) -> Result<()>;
}
