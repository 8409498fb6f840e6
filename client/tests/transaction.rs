mod common;

use anyhow::Result;
use sqlite_client::{args, Client, ErrorKind, TransactionMode, TransactionState, Value};

#[tokio::test]
async fn test_commit_persists_and_closes() -> Result<()> {
    let (client, _dir) = common::client_with_users().await?;

    let mut trx = client.transaction(TransactionMode::Write).await?;
    let rs = trx.execute(("INSERT INTO users (name) VALUES (?)", args!["alice"])).await?;
    assert_eq!(rs.last_insert_rowid, Some(1));

    // work done inside the transaction is visible to it, but not to the client yet
    let rs = trx.execute("SELECT count(*) FROM users").await?;
    assert_eq!(rs.rows[0][0], Value::Number(1.0));
    assert_eq!(common::user_count(&client).await?, 0.0);

    trx.commit().await?;
    assert_eq!(trx.state(), TransactionState::Committed);
    assert!(trx.is_closed());
    assert_eq!(common::user_count(&client).await?, 1.0);

    let err = trx.execute("SELECT 1").await.unwrap_err();
    assert_eq!(err.code(), Some("TRANSACTION_CLOSED"));
    assert_eq!(err.kind(), ErrorKind::Lifecycle);
    assert_eq!(trx.commit().await.unwrap_err().code(), Some("TRANSACTION_CLOSED"));
    assert_eq!(trx.batch(["SELECT 1"]).await.unwrap_err().code(), Some("TRANSACTION_CLOSED"));
    assert_eq!(trx.execute_multiple("SELECT 1;").await.unwrap_err().code(), Some("TRANSACTION_CLOSED"));

    // rolling back a finished transaction does nothing
    trx.rollback().await?;
    assert_eq!(trx.state(), TransactionState::Committed);

    Ok(())
}

#[tokio::test]
async fn test_rollback_discards() -> Result<()> {
    let (client, _dir) = common::client_with_users().await?;

    let mut trx = client.transaction(TransactionMode::Deferred).await?;
    trx.execute_multiple("INSERT INTO users (name) VALUES ('alice'); INSERT INTO users (name) VALUES ('bob');").await?;
    trx.rollback().await?;
    assert_eq!(trx.state(), TransactionState::RolledBack);
    trx.rollback().await?;

    assert_eq!(common::user_count(&client).await?, 0.0);
    Ok(())
}

#[tokio::test]
async fn test_failed_statement_keeps_transaction_open() -> Result<()> {
    let (client, _dir) = common::client_with_users().await?;

    let mut trx = client.transaction(TransactionMode::Write).await?;
    trx.execute("INSERT INTO users (name) VALUES ('alice')").await?;
    let err = trx.execute("INSERT INTO users (name) VALUES ('alice')").await.unwrap_err();
    assert_eq!(err.code(), Some("SQLITE_CONSTRAINT_UNIQUE"));
    let err = trx.execute(("INSERT INTO users (name) VALUES (?)", vec![Value::Undefined])).await.unwrap_err();
    assert!(err.is_type_error());

    trx.execute("INSERT INTO users (name) VALUES ('bob')").await?;
    trx.commit().await?;

    assert_eq!(common::user_count(&client).await?, 2.0);
    Ok(())
}

#[tokio::test]
async fn test_batch_stops_at_first_failure() -> Result<()> {
    let (client, _dir) = common::client_with_users().await?;

    let mut trx = client.transaction(TransactionMode::Write).await?;
    let err = trx
        .batch(["INSERT INTO users (name) VALUES ('alice')", "INSERT INTO users (name) VALUES ('alice')", "INSERT INTO users (name) VALUES ('bob')"])
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some("SQLITE_CONSTRAINT_UNIQUE"));

    // the first insert is still part of the transaction, the third never ran
    let rs = trx.execute("SELECT name FROM users").await?;
    assert_eq!(rs.rows.len(), 1);
    assert_eq!(rs.rows[0]["name"], Value::Text("alice".into()));
    trx.commit().await?;

    assert_eq!(common::user_count(&client).await?, 1.0);
    Ok(())
}

#[tokio::test]
async fn test_engine_rollback_ends_transaction() -> Result<()> {
    let (client, _dir) = common::client_with_users().await?;

    let mut trx = client.transaction(TransactionMode::Write).await?;
    let err = trx.batch(["INSERT INTO users (name) VALUES ('alice')", "INSERT OR ROLLBACK INTO users (name) VALUES ('alice')"]).await.unwrap_err();
    assert_eq!(err.code(), Some("SQLITE_CONSTRAINT_UNIQUE"));

    assert_eq!(trx.execute("SELECT 1").await.unwrap_err().code(), Some("TRANSACTION_CLOSED"));
    assert_eq!(trx.commit().await.unwrap_err().code(), Some("TRANSACTION_CLOSED"));
    assert_eq!(trx.state(), TransactionState::Open);

    trx.rollback().await?;
    assert!(trx.is_closed());
    assert_eq!(common::user_count(&client).await?, 0.0);
    Ok(())
}

#[tokio::test]
async fn test_read_transaction_rejects_writes() -> Result<()> {
    let (client, _dir) = common::client_with_users().await?;
    client.execute("INSERT INTO users (name) VALUES ('alice')").await?;

    let mut trx = client.transaction(TransactionMode::Read).await?;
    let rs = trx.execute("SELECT name FROM users").await?;
    assert_eq!(rs.rows.len(), 1);

    let err = trx.execute("DELETE FROM users").await.unwrap_err();
    assert_eq!(err.code(), Some("SQLITE_READONLY"));
    assert_eq!(err.kind(), ErrorKind::Engine);
    trx.commit().await?;

    assert_eq!(common::user_count(&client).await?, 1.0);
    Ok(())
}

#[tokio::test]
async fn test_close_and_drop_discard_work() -> Result<()> {
    let (client, _dir) = common::client_with_users().await?;

    let mut trx = client.transaction(TransactionMode::Write).await?;
    trx.execute("INSERT INTO users (name) VALUES ('alice')").await?;
    trx.close();
    trx.close();
    assert_eq!(trx.state(), TransactionState::Closed);
    assert_eq!(trx.execute("SELECT 1").await.unwrap_err().code(), Some("TRANSACTION_CLOSED"));
    assert_eq!(common::user_count(&client).await?, 0.0);

    {
        let mut trx = client.transaction(TransactionMode::Write).await?;
        trx.execute("INSERT INTO users (name) VALUES ('bob')").await?;
    }
    assert_eq!(common::user_count(&client).await?, 0.0);

    // the write lock went with the dropped handles
    let mut trx = client.transaction(TransactionMode::Write).await?;
    trx.execute("INSERT INTO users (name) VALUES ('carol')").await?;
    trx.commit().await?;
    assert_eq!(common::user_count(&client).await?, 1.0);

    Ok(())
}

#[tokio::test]
async fn test_transaction_outlives_client() -> Result<()> {
    let (client, dir) = common::client_with_users().await?;

    let mut trx = client.transaction(TransactionMode::Write).await?;
    client.close();
    assert_eq!(client.execute("SELECT 1").await.unwrap_err().code(), Some("CLIENT_CLOSED"));

    trx.execute("INSERT INTO users (name) VALUES ('alice')").await?;
    trx.commit().await?;

    let reopened = Client::open_file(dir.path().join("test.db")).await?;
    assert_eq!(common::user_count(&reopened).await?, 1.0);
    Ok(())
}
