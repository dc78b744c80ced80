use crate::{core::repo::Atomic, error::CumulusError, map_err};
use sqlx::{sqlite::SqliteConnectOptions, Sqlite, SqlitePool, Transaction};
use std::str::FromStr;
use tracing::info;

pub mod file;
pub mod folder;
pub mod quota;

pub async fn init(url: &str) -> SqlitePool {
    info!("Connecting to sqlite at {url}");
    let pool = create_pool(url).await;
    migrate(&pool).await;
    pool
}

async fn create_pool(url: &str) -> SqlitePool {
    let options = SqliteConnectOptions::from_str(url)
        .expect("invalid database url")
        .create_if_missing(true)
        .foreign_keys(true);

    SqlitePool::connect_with(options)
        .await
        .expect("error while connecting to db")
}

async fn migrate(pool: &SqlitePool) {
    sqlx::migrate!()
        .run(pool)
        .await
        .expect("error in migrations")
}

impl Atomic for SqlitePool {
    type Tx = Transaction<'static, Sqlite>;

    async fn start_tx(&self) -> Result<Self::Tx, CumulusError> {
        let tx = map_err!(self.begin().await);
        Ok(tx)
    }

    async fn commit_tx(&self, tx: Self::Tx) -> Result<(), CumulusError> {
        map_err!(tx.commit().await);
        Ok(())
    }

    async fn abort_tx(&self, tx: Self::Tx) -> Result<(), CumulusError> {
        map_err!(tx.rollback().await);
        Ok(())
    }
}

/// A comma separated `?` list for dynamic `IN` clauses.
fn placeholders(len: usize) -> String {
    vec!["?"; len].join(", ")
}
