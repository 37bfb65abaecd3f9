//! Shared test utilities for tally-db unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use tally_core::directive::NewStudent;
    use tally_core::entities::Student;
    use tempfile::TempDir;

    use crate::TallyDb;

    /// Open a ledger file in a fresh temp dir without creating tables.
    ///
    /// The `TempDir` must outlive the `TallyDb`.
    pub async fn fresh_db() -> (TempDir, TallyDb) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.db");
        let db = TallyDb::open_local(&path.to_string_lossy()).await.unwrap();
        (dir, db)
    }

    /// Open a ledger file in a fresh temp dir with the schema in place.
    pub async fn test_db() -> (TempDir, TallyDb) {
        let (dir, db) = fresh_db().await;
        db.ensure_schema().await.unwrap();
        (dir, db)
    }

    /// Insert a student and return it.
    pub async fn add_test_student(db: &TallyDb, name: &str, rate: f64) -> Student {
        db.add_student(&NewStudent {
            name: name.to_string(),
            per_hour_rate: rate,
            subject: "Math".to_string(),
        })
        .await
        .unwrap()
    }
}
