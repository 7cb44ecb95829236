//! @acp:module "Execution Context"
//! @acp:summary "Cancellation-bearing token passed down to every command"
//! @acp:domain cli
//! @acp:layer model

use std::sync::Arc;

use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Execution context handed to commands that declare it.
///
/// Cloning is cheap; clones share the same cancellation state. The context
/// is cancelled when the [`run`](crate::run) call that created it returns.
#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    path: Arc<[String]>,
}

impl Context {
    pub(crate) fn new(token: CancellationToken) -> Self {
        Self {
            token,
            path: Arc::from(Vec::new()),
        }
    }

    /// Same token, path extended by one command name
    pub(crate) fn scoped(&self, name: &str) -> Self {
        let mut path = self.path.to_vec();
        path.push(name.to_string());
        Self {
            token: self.token.clone(),
            path: Arc::from(path),
        }
    }

    /// Names of the commands resolved so far, root first
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the context is cancelled
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Cancel this context (and every clone of it)
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The underlying token, for handing to async tasks
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}
