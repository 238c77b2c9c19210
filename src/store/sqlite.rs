use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use rusqlite_migration::{Migrations, M};

use crate::app::{CveVaultError, Result};
use crate::domain::{ArchivedPage, Headers, RenderJob};
use crate::store::Store;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|_| CveVaultError::Database(rusqlite::Error::InvalidQuery))?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            CveVaultError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    /// Read back a stored page by its (cve_id, url) key.
    pub fn get_page(&self, cve_id: &str, url: &str) -> Result<Option<ArchivedPage>> {
        let conn = self.lock()?;
        let page = conn
            .query_row(
                "SELECT cve_id, url, wayback_url, html, js_required, completed,
                        status_code, headers, created_at
                 FROM cve_pages WHERE cve_id = ?1 AND url = ?2",
                params![cve_id, url],
                |row| {
                    Ok(ArchivedPage {
                        cve_id: row.get(0)?,
                        url: row.get(1)?,
                        wayback_url: row.get(2)?,
                        html: row.get(3)?,
                        js_required: row.get(4)?,
                        completed: row.get(5)?,
                        status_code: row.get(6)?,
                        headers: serde_json::from_str::<Headers>(
                            &row.get::<_, String>(7)?,
                        )
                        .unwrap_or_default(),
                        created_at: row
                            .get::<_, String>(8)?
                            .parse()
                            .unwrap_or_else(|_| chrono::Utc::now()),
                    })
                },
            )
            .optional()?;

        Ok(page)
    }
}

impl Store for SqliteStore {
    fn insert_if_absent(&self, page: &ArchivedPage) -> Result<()> {
        let headers_json = serde_json::to_string(&page.headers)
            .map_err(|e| CveVaultError::Other(e.to_string()))?;

        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO cve_pages
                 (cve_id, url, wayback_url, html, js_required, completed,
                  status_code, headers, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                page.cve_id,
                page.url,
                page.wayback_url,
                page.html,
                page.js_required,
                page.completed,
                page.status_code,
                headers_json,
                page.created_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    fn exists(&self, cve_id: &str, url: &str) -> Result<bool> {
        let conn = self.lock()?;
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM cve_pages WHERE cve_id = ?1 AND url = ?2)",
            params![cve_id, url],
            |row| row.get(0),
        )?;

        Ok(exists)
    }

    fn find_pages_needing_render(&self) -> Result<Vec<RenderJob>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, url FROM cve_pages WHERE js_required = 1 AND completed = 0")?;

        let jobs = stmt
            .query_map([], |row| {
                Ok(RenderJob {
                    id: row.get(0)?,
                    url: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(jobs)
    }

    fn update_rendered_html(&self, id: i64, html: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE cve_pages SET html = ?1 WHERE id = ?2",
            params![html, id],
        )?;

        Ok(())
    }

    fn is_completed(&self, id: i64, url: &str) -> Result<bool> {
        let conn = self.lock()?;
        let completed = conn
            .query_row(
                "SELECT completed FROM cve_pages WHERE id = ?1 AND url = ?2",
                params![id, url],
                |row| row.get(0),
            )
            .optional()?;

        Ok(completed.unwrap_or(false))
    }

    fn mark_completed(&self, id: i64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("UPDATE cve_pages SET completed = 1 WHERE id = ?1", params![id])?;

        Ok(())
    }
}
