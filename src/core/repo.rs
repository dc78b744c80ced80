use crate::error::CumulusError;
use std::future::Future;

pub mod file;
pub mod folder;
pub mod quota;

/// Bound for repositories that support atomic operations.
pub trait Atomic {
    /// Transaction type.
    type Tx;

    /// Start a database transaction.
    fn start_tx(&self) -> impl Future<Output = Result<Self::Tx, CumulusError>>;

    /// Commit a database transaction.
    fn commit_tx(&self, tx: Self::Tx) -> impl Future<Output = Result<(), CumulusError>>;

    /// Abort a database transaction.
    fn abort_tx(&self, tx: Self::Tx) -> impl Future<Output = Result<(), CumulusError>>;
}

/// Uses `$repo` to start a transaction, binding a mutable reference to it
/// to `$tx` for the duration of `$body`. The body must evaluate to a
/// future outputting a result. Aborts the transaction on error and commits
/// on success.
///
/// `$tx` is a plain `let` binding rather than a closure parameter so its
/// type is known at every use site and reborrows apply; the body can pass
/// it to any number of repository calls.
#[macro_export]
macro_rules! transaction {
    ($repo:expr, |$tx:ident| $body:expr) => {{
        let mut tx = $repo.start_tx().await?;
        let result = {
            let $tx = &mut tx;
            $body
        }
        .await;
        match result {
            Ok(out) => {
                $repo.commit_tx(tx).await?;
                Result::<_, CumulusError>::Ok(out)
            }
            Err(err) => {
                $repo.abort_tx(tx).await?;
                return Err(err);
            }
        }
    }};
}
