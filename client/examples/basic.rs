//! Basic client usage: schema setup, a batch, and an interactive transaction

use sqlite_client::{args, Client, ClientConfig, IntMode, Statement, TransactionMode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let client = Client::open(ClientConfig::file(dir.path().join("myapp.db")).int_mode(IntMode::BigInt)).await?;

    client.migrate(["CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, joined INTEGER)"]).await?;

    client
        .batch(
            [
                Statement::with_args("INSERT INTO users (name, joined) VALUES (?, ?)", args!["alice", chrono::Utc::now()]),
                Statement::named("INSERT INTO users (name) VALUES (:name)", [("name", "bob")]),
            ],
            TransactionMode::Write,
        )
        .await?;

    let mut trx = client.transaction(TransactionMode::Write).await?;
    trx.execute(("UPDATE users SET name = upper(name) WHERE id = ?", args![1])).await?;
    trx.commit().await?;

    let rs = client.execute("SELECT * FROM users ORDER BY id").await?;
    println!("{}", serde_json::to_string_pretty(&rs)?);

    client.close();
    Ok(())
}
