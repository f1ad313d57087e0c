//! Database connection utilities.

use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;

use crate::migration::Migrator;

/// Pragmas applied to every SQLite connection.
///
/// WAL keeps readers from blocking the pipeline's writes, the busy timeout
/// rides out short lock contention instead of surfacing it as an error, and
/// NORMAL synchronous is the usual durability trade-off once WAL is on.
const SQLITE_PRAGMAS: [&str; 3] = [
    "PRAGMA journal_mode=WAL",
    "PRAGMA busy_timeout=5000",
    "PRAGMA synchronous=NORMAL",
];

async fn configure_sqlite(db: &DatabaseConnection) -> Result<(), DbErr> {
    use sea_orm::{ConnectionTrait, Statement};

    let backend = db.get_database_backend();
    for pragma in SQLITE_PRAGMAS {
        db.execute(Statement::from_string(backend, pragma.to_string()))
            .await?;
    }

    Ok(())
}

/// Establish a connection to the database.
///
/// SQLite URLs additionally get the `SQLITE_PRAGMAS` set applied, so test
/// databases behave sanely under the concurrent pipeline stages.
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    if database_url.starts_with("sqlite:") {
        configure_sqlite(&db).await?;
    }

    Ok(db)
}

/// Connect and bring the schema up to date in one step.
///
/// The service boots through this so no store operation can ever observe a
/// stale schema; tests use it against `sqlite::memory:`.
///
/// # Errors
/// Returns `DbErr` if the connection cannot be established or migrations fail.
///
/// # Example
/// ```ignore
/// let db = gitpulse::connect_and_migrate("postgres://localhost/gitpulse").await?;
/// ```
pub async fn connect_and_migrate(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = connect(database_url).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}
