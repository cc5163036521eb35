use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Error, Pool, Sqlite};
use std::str::FromStr;

/// Create a SQLite connection pool
///
/// # Parameters
/// - `database_url`: SQLite connection string, e.g. `sqlite://jobs.db` or `sqlite::memory:`
/// - `max_connections`: pool size
///
/// The database file is created if it does not exist yet.
pub async fn get_connection(database_url: &str, max_connections: u32) -> Result<Pool<Sqlite>, Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}
