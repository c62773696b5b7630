//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Map each entity operation onto exactly one unit of work.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Every operation opens its own transaction, commits on success and rolls
//!   back on failure before returning the error unchanged.
//! - No transaction outlives the call that opened it; the guard rolls back on
//!   drop if neither commit nor rollback ran.
//! - "Row not found" on reads and deletes is a value, not an error.

use crate::db::DbError;
use crate::model::user::{User, UserId};
use log::{debug, error, info};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const USER_SELECT_SQL: &str = "SELECT
    id,
    name,
    email,
    age
FROM users";

const USER_COLUMNS: [&str; 4] = ["id", "name", "email", "age"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for user persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// `update` targeted a row that no longer exists.
    NotFound(UserId),
    /// `update` was called on a user that was never saved.
    NotPersisted,
    /// `save` was called on a user that already has an id.
    AlreadyPersisted(UserId),
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "user not found: {id}"),
            Self::NotPersisted => write!(f, "user has no id; save it before updating"),
            Self::AlreadyPersisted(id) => write!(f, "user already persisted with id {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted user data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract for users. One call, one transaction.
pub trait UserRepository {
    /// Inserts a transient user and writes the generated id back onto it.
    fn save(&self, user: &mut User) -> RepoResult<()>;
    fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>>;
    /// All rows in store order (`id` ascending).
    fn find_all(&self) -> RepoResult<Vec<User>>;
    /// Writes the in-memory field values to the row with `user.id`.
    fn update(&self, user: &User) -> RepoResult<()>;
    /// Removes the row if present. Absent ids are a no-op.
    fn delete_by_id(&self, id: UserId) -> RepoResult<()>;
}

/// SQLite-backed user repository borrowing a caller-owned connection.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// Fails when the `users` schema is not in place.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn in_unit_of_work<T>(
        &self,
        operation: &'static str,
        work: impl FnOnce(&Transaction<'_>) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let started_at = Instant::now();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(|err| {
                error!(
                    "event={operation} module=repo status=error error_code=tx_begin_failed error={err}"
                );
                RepoError::from(err)
            })?;

        match work(&tx) {
            Ok(value) => {
                tx.commit().map_err(|err| {
                    error!(
                        "event={operation} module=repo status=error error_code=tx_commit_failed error={err}"
                    );
                    RepoError::from(err)
                })?;
                debug!(
                    "event={operation} module=repo status=ok duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                Ok(value)
            }
            Err(err) => {
                match tx.rollback() {
                    Ok(()) => info!("event={operation} module=repo status=rollback"),
                    Err(rollback_err) => error!(
                        "event={operation} module=repo status=error error_code=tx_rollback_failed error={rollback_err}"
                    ),
                }
                error!(
                    "event={operation} module=repo status=error duration_ms={} error={err}",
                    started_at.elapsed().as_millis()
                );
                Err(err)
            }
        }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn save(&self, user: &mut User) -> RepoResult<()> {
        if let Some(id) = user.id {
            return Err(RepoError::AlreadyPersisted(id));
        }

        let id = self.in_unit_of_work("user_save", |tx| {
            tx.execute(
                "INSERT INTO users (name, email, age) VALUES (?1, ?2, ?3);",
                params![user.name.as_str(), user.email.as_str(), user.age],
            )?;
            Ok(tx.last_insert_rowid())
        })?;

        user.id = Some(id);
        info!("event=user_save module=repo status=ok id={id}");
        Ok(())
    }

    fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        let found = self.in_unit_of_work("user_find_by_id", |tx| {
            let mut stmt = tx.prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;
            let mut rows = stmt.query([id])?;
            if let Some(row) = rows.next()? {
                return Ok(Some(parse_user_row(row)?));
            }
            Ok(None)
        })?;

        debug!(
            "event=user_find_by_id module=repo status=ok id={id} found={}",
            found.is_some()
        );
        Ok(found)
    }

    fn find_all(&self) -> RepoResult<Vec<User>> {
        let users = self.in_unit_of_work("user_find_all", |tx| {
            let mut stmt = tx.prepare(&format!("{USER_SELECT_SQL} ORDER BY id ASC;"))?;
            let mut rows = stmt.query([])?;
            let mut users = Vec::new();
            while let Some(row) = rows.next()? {
                users.push(parse_user_row(row)?);
            }
            Ok(users)
        })?;

        debug!(
            "event=user_find_all module=repo status=ok count={}",
            users.len()
        );
        Ok(users)
    }

    fn update(&self, user: &User) -> RepoResult<()> {
        let id = user.id.ok_or(RepoError::NotPersisted)?;

        self.in_unit_of_work("user_update", |tx| {
            let changed = tx.execute(
                "UPDATE users
                 SET
                    name = ?1,
                    email = ?2,
                    age = ?3
                 WHERE id = ?4;",
                params![user.name.as_str(), user.email.as_str(), user.age, id],
            )?;
            if changed == 0 {
                return Err(RepoError::NotFound(id));
            }
            Ok(())
        })?;

        info!("event=user_update module=repo status=ok id={id}");
        Ok(())
    }

    fn delete_by_id(&self, id: UserId) -> RepoResult<()> {
        let removed = self.in_unit_of_work("user_delete", |tx| {
            let exists: i64 = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1);",
                [id],
                |row| row.get(0),
            )?;
            if exists == 0 {
                return Ok(false);
            }
            tx.execute("DELETE FROM users WHERE id = ?1;", [id])?;
            Ok(true)
        })?;

        info!("event=user_delete module=repo status=ok id={id} removed={removed}");
        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let age_raw: i64 = row.get("age")?;
    let age = i32::try_from(age_raw).map_err(|_| {
        RepoError::InvalidData(format!("age value `{age_raw}` out of range in users.age"))
    })?;

    Ok(User {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        email: row.get("email")?,
        age,
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, "users")? {
        return Err(RepoError::MissingRequiredTable("users"));
    }
    for column in USER_COLUMNS {
        if !table_has_column(conn, "users", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "users",
                column,
            });
        }
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM pragma_table_info(?1)
            WHERE name = ?2
        );",
        [table, column],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
