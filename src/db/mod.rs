//! Storage client and the serializable transaction combinator.
//!
//! Every multi-statement operation goes through [`Store::with_transaction`],
//! which runs the unit at SERIALIZABLE isolation, commits on `Ok`, rolls back
//! on `Err`, and re-runs the whole unit when Postgres reports a
//! serialization failure.

use crate::config::database::DatabaseConfig;
use crate::config::transaction::TransactionConfig;
use crate::error::{AppError, AppResult};
use futures_util::future::BoxFuture;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbErr, IsolationLevel,
    Statement, TransactionTrait,
};

/// Injectable handle to the connection pool. Cloning is cheap; every clone
/// shares the same pool.
#[derive(Clone)]
pub struct Store {
    db: DatabaseConnection,
    tx: TransactionConfig,
}

enum AttemptError {
    Retryable(String),
    Fatal(AppError),
}

impl Store {
    pub async fn connect(config: &DatabaseConfig, tx: TransactionConfig) -> Result<Self, DbErr> {
        let db = Database::connect(config.connect_options()).await?;
        Ok(Self::new(db, tx))
    }

    pub fn new(db: DatabaseConnection, tx: TransactionConfig) -> Self {
        Self { db, tx }
    }

    /// Pool handle for single-statement reads and writes.
    pub fn conn(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn ping(&self) -> bool {
        self.db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                "SELECT 1".to_string(),
            ))
            .await
            .is_ok()
    }

    /// Drains the pool. Outstanding clones fail fast afterwards.
    pub async fn close(self) -> Result<(), DbErr> {
        self.db.close().await
    }

    /// Runs `op` as one serializable unit, retrying it from scratch on
    /// serialization failures and attempt timeouts.
    ///
    /// `op` may be invoked several times, so it must not have side effects
    /// outside the transaction it is handed. After `max_attempts` retryable
    /// failures the caller gets [`AppError::Conflict`]; any other error is
    /// returned on the first occurrence. The timeout covers `op` only. A
    /// commit that fails for any reason other than a serialization failure
    /// is reported as [`AppError::Internal`] and not retried.
    pub async fn with_transaction<T, F>(&self, name: &'static str, op: F) -> AppResult<T>
    where
        T: Send,
        F: for<'c> Fn(&'c DatabaseTransaction) -> BoxFuture<'c, AppResult<T>> + Send + Sync,
    {
        let max_attempts = self.tx.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.attempt(&op).await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::debug!(operation = name, attempt, "Transaction succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(AttemptError::Fatal(err)) => return Err(err),
                Err(AttemptError::Retryable(reason)) => {
                    if attempt >= max_attempts {
                        tracing::warn!(
                            operation = name,
                            attempts = attempt,
                            "Giving up after repeated transaction conflicts: {}",
                            reason
                        );
                        return Err(AppError::Conflict(
                            "Concurrent update conflict, please retry".to_string(),
                        ));
                    }

                    let wait = self.tx.backoff(attempt);
                    tracing::warn!(
                        operation = name,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        "Retrying transaction: {}",
                        reason
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt<T, F>(&self, op: &F) -> Result<T, AttemptError>
    where
        T: Send,
        F: for<'c> Fn(&'c DatabaseTransaction) -> BoxFuture<'c, AppResult<T>> + Send + Sync,
    {
        let txn = self
            .db
            .begin_with_config(Some(IsolationLevel::Serializable), None)
            .await
            .map_err(|err| classify(AppError::from(err)))?;

        // Only the unit of work is bounded. Dropping the transaction after a
        // timeout rolls it back.
        let outcome = tokio::time::timeout(self.tx.attempt_timeout, op(&txn)).await;
        let value = match outcome {
            Ok(Ok(value)) => value,
            Ok(Err(err)) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::warn!("Rollback failed: {}", rollback_err);
                }
                return Err(classify(err));
            }
            Err(_) => {
                return Err(AttemptError::Retryable(format!(
                    "attempt exceeded {:?}",
                    self.tx.attempt_timeout
                )))
            }
        };

        // COMMIT runs unbounded and is replayed only on a serialization failure.
        match txn.commit().await.map_err(AppError::from) {
            Ok(()) => Ok(value),
            Err(err) if err.is_serialization_failure() => {
                Err(AttemptError::Retryable(err.to_string()))
            }
            Err(err) => Err(AttemptError::Fatal(AppError::Internal(anyhow::anyhow!(
                "Transaction commit failed: {}",
                err
            )))),
        }
    }
}

fn classify(err: AppError) -> AttemptError {
    if err.is_serialization_failure() {
        AttemptError::Retryable(err.to_string())
    } else {
        AttemptError::Fatal(err)
    }
}
