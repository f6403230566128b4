use crate::Database;
use crate::models::RegistrationRow;
use anyhow::Result;
use pharmathon_types::models::{Milestone, NewRegistration};
use rusqlite::Connection;
use thiserror::Error;

/// Insert failure split out so the API layer can answer 409 on a duplicate
/// (email, event_choice) pair instead of a generic server error.
#[derive(Debug, Error)]
pub enum InsertError {
    #[error("email already registered for this event choice")]
    Duplicate,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

const COLUMNS: &str = "id, full_name, dob, sex, phone, email, affiliation, \
     student_origin, student_origin_other, event_choice, confirmed, \
     confirm_token, checkin_code, checkin_at, reminded7, reminded3, \
     reminded1, created_at";

impl Database {
    /// Insert a validated registration. Uniqueness of (email, event_choice)
    /// is enforced by the table constraint; the race between concurrent
    /// submissions is settled by SQLite, not by a pre-check.
    pub fn insert_registration(
        &self,
        new: &NewRegistration,
        confirm_token: &str,
        checkin_code: &str,
    ) -> Result<i64, InsertError> {
        let res = self.with_conn(|conn| {
            match conn.execute(
                "INSERT INTO registrations
                     (full_name, dob, sex, phone, email, affiliation,
                      student_origin, student_origin_other, event_choice,
                      confirm_token, checkin_code)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    new.full_name,
                    new.dob,
                    new.sex.as_str(),
                    new.phone,
                    new.email,
                    new.affiliation.as_str(),
                    new.student_origin.map(|o| o.as_str()),
                    new.student_origin_other,
                    new.event_choice.as_str(),
                    confirm_token,
                    checkin_code,
                ],
            ) {
                Ok(_) => Ok(Ok(conn.last_insert_rowid())),
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
                {
                    Ok(Err(InsertError::Duplicate))
                }
                Err(e) => Err(e.into()),
            }
        });

        match res {
            Ok(inner) => inner,
            Err(e) => Err(InsertError::Other(e)),
        }
    }

    pub fn get_registration(&self, id: i64) -> Result<Option<RegistrationRow>> {
        self.with_conn(|conn| query_one(conn, "id = ?1", rusqlite::params![id]))
    }

    pub fn find_by_confirm_token(&self, token: &str) -> Result<Option<RegistrationRow>> {
        self.with_conn(|conn| query_one(conn, "confirm_token = ?1", rusqlite::params![token]))
    }

    pub fn find_by_checkin_code(&self, code: &str) -> Result<Option<RegistrationRow>> {
        self.with_conn(|conn| query_one(conn, "checkin_code = ?1", rusqlite::params![code]))
    }

    /// Idempotent: confirming an already-confirmed registration is a no-op.
    pub fn mark_confirmed(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE registrations SET confirmed = 1 WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }

    /// Stamp the check-in time. Re-check-in overwrites the previous stamp,
    /// never clears it.
    pub fn record_checkin(&self, id: i64) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "UPDATE registrations SET checkin_at = datetime('now') WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }

    /// Atomically claim one reminder flag: flips it to true only if it was
    /// still false, and reports whether this caller won the claim. Concurrent
    /// runs of the reminder job therefore send at most once per milestone.
    pub fn claim_reminder(&self, id: i64, milestone: Milestone) -> Result<bool> {
        let flag = milestone.flag_column();
        self.with_conn(|conn| {
            let affected = conn.execute(
                &format!("UPDATE registrations SET {flag} = 1 WHERE id = ?1 AND {flag} = 0"),
                [id],
            )?;
            Ok(affected == 1)
        })
    }

    /// All registrations, newest first.
    pub fn list_registrations(&self) -> Result<Vec<RegistrationRow>> {
        self.with_conn(|conn| {
            query_many(
                conn,
                &format!(
                    "SELECT {COLUMNS} FROM registrations
                     ORDER BY created_at DESC, id DESC"
                ),
                rusqlite::params![],
            )
        })
    }

    pub fn list_confirmed(&self) -> Result<Vec<RegistrationRow>> {
        self.with_conn(|conn| {
            query_many(
                conn,
                &format!(
                    "SELECT {COLUMNS} FROM registrations
                     WHERE confirmed = 1
                     ORDER BY created_at DESC, id DESC"
                ),
                rusqlite::params![],
            )
        })
    }

    /// Listing for the CSV export; `affiliation` narrows to one category.
    pub fn list_by_affiliation(&self, affiliation: Option<&str>) -> Result<Vec<RegistrationRow>> {
        self.with_conn(|conn| match affiliation {
            Some(a) => query_many(
                conn,
                &format!(
                    "SELECT {COLUMNS} FROM registrations
                     WHERE affiliation = ?1
                     ORDER BY created_at DESC, id DESC"
                ),
                rusqlite::params![a],
            ),
            None => query_many(
                conn,
                &format!(
                    "SELECT {COLUMNS} FROM registrations
                     ORDER BY created_at DESC, id DESC"
                ),
                rusqlite::params![],
            ),
        })
    }
}

fn query_one<P: rusqlite::Params>(
    conn: &Connection,
    predicate: &str,
    params: P,
) -> Result<Option<RegistrationRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM registrations WHERE {predicate}"
    ))?;
    let row = stmt.query_row(params, read_row).optional()?;
    Ok(row)
}

fn query_many<P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
) -> Result<Vec<RegistrationRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, read_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn read_row(row: &rusqlite::Row) -> rusqlite::Result<RegistrationRow> {
    Ok(RegistrationRow {
        id: row.get(0)?,
        full_name: row.get(1)?,
        dob: row.get(2)?,
        sex: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        affiliation: row.get(6)?,
        student_origin: row.get(7)?,
        student_origin_other: row.get(8)?,
        event_choice: row.get(9)?,
        confirmed: row.get(10)?,
        confirm_token: row.get(11)?,
        checkin_code: row.get(12)?,
        checkin_at: row.get(13)?,
        reminded7: row.get(14)?,
        reminded3: row.get(15)?,
        reminded1: row.get(16)?,
        created_at: row.get(17)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
