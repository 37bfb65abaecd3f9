//! Student repository and name resolver.
//!
//! Names and subjects are case-folded on insert. Resolution is a literal,
//! case-insensitive substring match over all stored names, in id order.

use tally_core::directive::NewStudent;
use tally_core::entities::Student;
use tally_core::resolution::Resolution;

use crate::TallyDb;
use crate::error::DatabaseError;
use crate::helpers::{is_unique_violation, parse_datetime};

const STUDENT_COLUMNS: &str = "id, name, per_hour_rate, subject, created_at";

pub(crate) fn row_to_student(row: &libsql::Row) -> Result<Student, DatabaseError> {
    Ok(Student {
        id: row.get::<i64>(0)?,
        name: row.get::<String>(1)?,
        per_hour_rate: row.get::<f64>(2)?,
        subject: row.get::<String>(3)?,
        created_at: parse_datetime(&row.get::<String>(4)?)?,
    })
}

/// Case-fold a name or subject the way it is stored.
#[must_use]
pub fn fold(text: &str) -> String {
    text.trim().to_lowercase()
}

impl TallyDb {
    /// Insert a student.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::DuplicateStudent` if the case-folded name is
    /// already taken; the table is left unchanged.
    pub async fn add_student(&self, new: &NewStudent) -> Result<Student, DatabaseError> {
        let name = fold(&new.name);
        let subject = fold(&new.subject);
        let conn = self.connect().await?;

        conn.execute(
            "INSERT INTO students (name, per_hour_rate, subject) VALUES (?1, ?2, ?3)",
            libsql::params![name.as_str(), new.per_hour_rate, subject.as_str()],
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DatabaseError::DuplicateStudent(name.clone())
            } else {
                DatabaseError::LibSql(e)
            }
        })?;

        let student = get_student_on(&conn, conn.last_insert_rowid()).await?;
        tracing::info!(
            name = %student.name,
            rate = student.per_hour_rate,
            subject = %student.subject,
            "student added"
        );
        Ok(student)
    }

    /// All students whose name contains `fragment`, case-insensitively, in id
    /// order.
    ///
    /// Folding happens here rather than in SQL, whose `lower()` only knows
    /// ASCII, so names written by free-form SQL still resolve.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn find_students(&self, fragment: &str) -> Result<Vec<Student>, DatabaseError> {
        let needle = fold(fragment);
        let mut students = self.all_students().await?;
        students.retain(|student| fold(&student.name).contains(&needle));
        Ok(students)
    }

    /// Resolve a free-text reference to zero, one, or several students.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn resolve_student(&self, fragment: &str) -> Result<Resolution, DatabaseError> {
        let matches = self.find_students(fragment).await?;
        tracing::debug!(fragment, matches = matches.len(), "resolved student reference");
        Ok(Resolution::from_matches(matches))
    }

    /// Number of stored students.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn count_students(&self) -> Result<i64, DatabaseError> {
        self.count("students").await
    }

    async fn all_students(&self) -> Result<Vec<Student>, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(
                &format!("SELECT {STUDENT_COLUMNS} FROM students ORDER BY id"),
                (),
            )
            .await?;

        let mut students = Vec::new();
        while let Some(row) = rows.next().await? {
            students.push(row_to_student(&row)?);
        }
        Ok(students)
    }

    pub(crate) async fn count(&self, table: &str) -> Result<i64, DatabaseError> {
        let conn = self.connect().await?;
        let mut rows = conn
            .query(&format!("SELECT COUNT(*) FROM {table}"), ())
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        Ok(row.get::<i64>(0)?)
    }
}

async fn get_student_on(conn: &libsql::Connection, id: i64) -> Result<Student, DatabaseError> {
    let mut rows = conn
        .query(
            &format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?1"),
            [id],
        )
        .await?;
    let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
    row_to_student(&row)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tally_core::directive::NewStudent;
    use tally_core::resolution::Resolution;

    use crate::error::DatabaseError;
    use crate::test_support::helpers::{add_test_student, test_db};

    #[tokio::test]
    async fn add_student_case_folds() {
        let (_dir, db) = test_db().await;
        let student = db
            .add_student(&NewStudent {
                name: "  Jane Doe ".into(),
                per_hour_rate: 20.0,
                subject: "MATH".into(),
            })
            .await
            .unwrap();

        assert_eq!(student.name, "jane doe");
        assert_eq!(student.subject, "math");
        assert_eq!(
            db.resolve_student("JANE DOE").await.unwrap(),
            Resolution::Unique(student)
        );
    }

    #[tokio::test]
    async fn duplicate_name_leaves_table_unchanged() {
        let (_dir, db) = test_db().await;
        add_test_student(&db, "anna", 20.0).await;

        let err = db
            .add_student(&NewStudent {
                name: "ANNA".into(),
                per_hour_rate: 35.0,
                subject: "physics".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, DatabaseError::DuplicateStudent(ref name) if name == "anna"));
        assert_eq!(db.count_students().await.unwrap(), 1);
        let students = db.find_students("anna").await.unwrap();
        assert!((students[0].per_hour_rate - 20.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn resolve_exact_name_is_unique() {
        let (_dir, db) = test_db().await;
        let jane = add_test_student(&db, "jane", 20.0).await;
        add_test_student(&db, "bob", 20.0).await;

        assert_eq!(
            db.resolve_student("Jane").await.unwrap(),
            Resolution::Unique(jane)
        );
    }

    #[tokio::test]
    async fn resolve_partial_name_lists_candidates_in_order() {
        let (_dir, db) = test_db().await;
        let anna = add_test_student(&db, "anna", 20.0).await;
        add_test_student(&db, "bob", 20.0).await;
        let annie = add_test_student(&db, "annie", 25.0).await;

        assert_eq!(
            db.resolve_student("ann").await.unwrap(),
            Resolution::Ambiguous(vec![anna, annie])
        );
    }

    #[tokio::test]
    async fn resolve_unknown_is_not_found() {
        let (_dir, db) = test_db().await;
        add_test_student(&db, "anna", 20.0).await;
        assert_eq!(
            db.resolve_student("zoe").await.unwrap(),
            Resolution::NotFound
        );
    }

    #[tokio::test]
    async fn like_wildcards_are_literal() {
        let (_dir, db) = test_db().await;
        add_test_student(&db, "anna", 20.0).await;
        assert_eq!(db.resolve_student("%").await.unwrap(), Resolution::NotFound);
        assert_eq!(db.resolve_student("a_na").await.unwrap(), Resolution::NotFound);
    }

    #[tokio::test]
    async fn names_written_outside_add_student_resolve_by_any_case() {
        let (_dir, db) = test_db().await;
        let conn = db.connect().await.unwrap();
        conn.execute(
            "INSERT INTO students (name, per_hour_rate, subject) VALUES ('ZOË', 30.0, 'art')",
            (),
        )
        .await
        .unwrap();
        drop(conn);

        for fragment in ["ZOË", "zoë", "Zo", "oË"] {
            match db.resolve_student(fragment).await.unwrap() {
                Resolution::Unique(student) => assert_eq!(student.name, "ZOË"),
                other => panic!("{fragment}: expected unique, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn non_ascii_fragment_matches_folded_name() {
        let (_dir, db) = test_db().await;
        let student = add_test_student(&db, "Élodie", 20.0).await;
        assert_eq!(student.name, "élodie");
        assert_eq!(
            db.resolve_student("ÉLO").await.unwrap(),
            Resolution::Unique(student)
        );
    }
}
