use anyhow::{Context, Result};
use sqlx::{Executor, MySqlPool, mysql::MySqlPoolOptions};

pub async fn init_db(database_url: &str) -> Result<MySqlPool> {
    MySqlPoolOptions::new()
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET SESSION TRANSACTION ISOLATION LEVEL READ COMMITTED")
                    .await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
        .context("Failed to connect to database")
}
