use super::InsertOutcome;
use crate::policy::{ResolvedUser, SocialIdentity, collision_prefix, is_candidate_of};
use anyhow::{Context, Result};
use sqlx::{Connection, PgPool, Row};
use std::collections::HashSet;
use tracing::{Instrument, error, info_span};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

pub(super) async fn ensure_schema(pool: &PgPool) -> Result<()> {
    let span = info_span!("db.query", db.system = "postgresql", db.operation = "DDL");
    sqlx::raw_sql(SCHEMA_SQL)
        .execute(pool)
        .instrument(span)
        .await?;
    Ok(())
}

pub(super) async fn username_exists(pool: &PgPool, username: &str) -> Result<bool> {
    let query = "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1) AS exists";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(username)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to check username")?;
    Ok(row.get("exists"))
}

/// Escape `%`, `_` and `\` so `value` matches literally inside a `LIKE` pattern.
fn like_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

pub(super) async fn usernames_sharing(pool: &PgPool, base: &str) -> Result<HashSet<String>> {
    let query = r"SELECT username FROM users WHERE username = $1 OR username LIKE $2 ESCAPE '\'";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let pattern = format!("{}\\_%", like_literal(&collision_prefix(base)));
    let rows = sqlx::query(query)
        .bind(base)
        .bind(pattern)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list username candidates")?;

    Ok(rows
        .iter()
        .map(|row| row.get::<String, _>("username"))
        .filter(|username| is_candidate_of(base, username))
        .collect())
}

pub(super) async fn email_exists(pool: &PgPool, email: &str) -> Result<bool> {
    let query = "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1) AS exists";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_one(pool)
        .instrument(span)
        .await
        .context("failed to check email")?;
    Ok(row.get("exists"))
}

pub(super) async fn insert_user(
    pool: &PgPool,
    user: &ResolvedUser,
    social: Option<&SocialIdentity>,
) -> Result<InsertOutcome> {
    let query = "INSERT INTO users (username, email, provider, external_id) VALUES ($1, $2, $3, $4)";
    let span = info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(&user.username)
        .bind(&user.email)
        .bind(social.map(|social| social.provider.as_str()))
        .bind(social.map(|social| social.external_id.as_str()))
        .execute(pool)
        .instrument(span)
        .await;

    match result {
        Ok(_) => Ok(InsertOutcome::Created),
        Err(err) if is_unique_violation(&err) => Ok(InsertOutcome::Conflict),
        Err(err) => {
            error!("Error inserting user: {err}");
            Err(err).context("failed to insert user")
        }
    }
}

pub(super) async fn ping(pool: &PgPool) -> Result<()> {
    let acquire_span = info_span!(
        "db.acquire",
        db.system = "postgresql",
        db.operation = "ACQUIRE"
    );
    let mut conn = pool
        .acquire()
        .instrument(acquire_span)
        .await
        .context("failed to acquire database connection")?;

    let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
    conn.ping()
        .instrument(ping_span)
        .await
        .context("failed to ping database")
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn unique_violation_is_detected_by_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23503"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError { code: None }));
        assert!(!is_unique_violation(&err));

        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
    }

    #[test]
    fn like_literal_escapes_wildcards() {
        assert_eq!(like_literal("first_last@vit.edu"), r"first\_last@vit.edu");
        assert_eq!(like_literal("100%@vit.edu"), r"100\%@vit.edu");
        assert_eq!(like_literal(r"a\b"), r"a\\b");
        assert_eq!(like_literal("plain@vit.edu"), "plain@vit.edu");
    }

    #[test]
    fn schema_declares_unique_columns() {
        assert!(SCHEMA_SQL.contains("username TEXT NOT NULL UNIQUE"));
        assert!(SCHEMA_SQL.contains("email TEXT NOT NULL UNIQUE"));
    }
}
