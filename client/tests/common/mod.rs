use std::str::FromStr;

use sqlite_client::{Client, ClientConfig, IntMode};
use tempfile::TempDir;
use tracing::Level;

// Initialize tracing for tests
#[ctor::ctor]
fn init_tracing() {
    // if LOG_LEVEL env var is set, use it
    if let Ok(level) = std::env::var("LOG_LEVEL") {
        tracing_subscriber::fmt().with_max_level(Level::from_str(&level).unwrap()).with_test_writer().init();
    } else {
        tracing_subscriber::fmt().with_max_level(Level::INFO).with_test_writer().init();
    }
}

/// A client on a fresh database file. The file is removed when the returned directory is dropped.
#[allow(unused)]
pub async fn client_with(int_mode: IntMode) -> anyhow::Result<(Client, TempDir)> {
    let dir = tempfile::tempdir()?;
    let client = Client::open(ClientConfig::file(dir.path().join("test.db")).int_mode(int_mode)).await?;
    Ok((client, dir))
}

#[allow(unused)]
pub async fn client() -> anyhow::Result<(Client, TempDir)> { client_with(IntMode::Number).await }

/// A client with a `users` table whose ids autoincrement and whose names are unique
#[allow(unused)]
pub async fn client_with_users() -> anyhow::Result<(Client, TempDir)> {
    let (client, dir) = client().await?;
    client.execute("CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE)").await?;
    Ok((client, dir))
}

#[allow(unused)]
pub async fn user_count(client: &Client) -> anyhow::Result<f64> {
    let rs = client.execute("SELECT count(*) AS c FROM users").await?;
    rs.rows[0]["c"].as_f64().ok_or_else(|| anyhow::anyhow!("count was not a number"))
}
