use super::DbPool;
use crate::errors::StorageError;
use cowchips_core::errors::{DatabaseError, Error, Result};
use diesel::SqliteConnection;
use log::error;
use std::any::Any;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

// A write job runs against the actor's connection and returns a core Result.
type Job<T> = Box<dyn FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static>;

type ErasedJob = (
    Job<Box<dyn Any + Send + 'static>>,
    oneshot::Sender<Result<Box<dyn Any + Send + 'static>>>,
);

/// Handle for sending jobs to the writer actor.
#[derive(Clone)]
pub struct WriteHandle {
    tx: mpsc::Sender<ErasedJob>,
}

impl WriteHandle {
    /// Executes a database job on the writer actor's dedicated connection.
    ///
    /// Jobs run one at a time, each inside an immediate transaction. An error
    /// returned by the job rolls the transaction back and is handed to the
    /// caller unchanged.
    pub async fn exec<F, T>(&self, job: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T> + Send + 'static,
        T: Send + 'static + Any,
    {
        let (ret_tx, ret_rx) = oneshot::channel();

        self.tx
            .send((
                Box::new(move |c| job(c).map(|v| Box::new(v) as Box<dyn Any + Send>)),
                ret_tx,
            ))
            .await
            .map_err(|_| writer_unavailable("the writer actor has stopped"))?;

        let boxed = ret_rx
            .await
            .map_err(|_| writer_unavailable("the writer actor dropped the reply"))??;
        boxed
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| Error::Unexpected("writer actor returned an unexpected type".to_string()))
    }
}

fn writer_unavailable(reason: &str) -> Error {
    Error::Database(DatabaseError::WriterUnavailable(reason.to_string()))
}

/// Spawns a background Tokio task that acts as the single writer to the database.
///
/// The actor owns one pooled connection for its whole life and processes
/// jobs serially. It stops when every [`WriteHandle`] has been dropped.
pub fn spawn_writer(pool: Arc<DbPool>) -> WriteHandle {
    let (tx, mut rx) = mpsc::channel::<ErasedJob>(1024);

    tokio::spawn(async move {
        let mut conn = match pool.get() {
            Ok(conn) => conn,
            Err(e) => {
                error!("Writer actor could not get a database connection: {}", e);
                // Dropping the receiver fails every pending and future job.
                return;
            }
        };

        while let Some((job, reply_tx)) = rx.recv().await {
            let result: Result<Box<dyn Any + Send + 'static>> = conn
                .immediate_transaction::<_, StorageError, _>(|c| job(c).map_err(StorageError::from))
                .map_err(|e: StorageError| e.into());

            // The requester may have gone away; nothing to do then.
            let _ = reply_tx.send(result);
        }
    });

    WriteHandle { tx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, init, run_migrations};
    use crate::errors::IntoCore;
    use diesel::prelude::*;

    fn pool() -> (tempfile::TempDir, Arc<DbPool>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("writer.db");
        let path = path.to_str().unwrap();
        init(path).unwrap();
        let pool = create_pool(path).unwrap();
        run_migrations(&pool).unwrap();
        (dir, pool)
    }

    #[tokio::test]
    async fn test_failed_job_rolls_back_and_keeps_its_error() {
        let (_dir, pool) = pool();
        let writer = spawn_writer(pool.clone());

        let result: Result<()> = writer
            .exec(|conn| {
                diesel::sql_query(
                    "INSERT INTO users (id, name, email) VALUES ('u1', 'Ann', 'ann@example.org')",
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Err(Error::NotFound("Game g1".to_string()))
            })
            .await;
        assert!(matches!(result, Err(Error::NotFound(_))));

        let count: i64 = writer
            .exec(|conn| {
                crate::schema::users::table
                    .count()
                    .get_result(conn)
                    .into_core()
            })
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_job_result_is_returned() {
        let (_dir, pool) = pool();
        let writer = spawn_writer(pool);
        let value = writer.exec(|_conn| Ok(41 + 1)).await.unwrap();
        assert_eq!(value, 42);
    }
}
