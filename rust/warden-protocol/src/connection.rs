//! Lazily established, shared client handles.

use crate::ProtocolError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Establishes a client for a remote system.
#[async_trait]
pub trait Connector<C>: Send + Sync {
    /// Open a new client. Called at most once per successful [`Connection`].
    async fn connect(&self) -> Result<C, ProtocolError>;
}

/// A handle to a client that is established on first use and then shared.
///
/// Clones refer to the same client. When several callers race to use a
/// fresh handle, exactly one runs the [`Connector`] while the rest wait for
/// its result. A failed attempt is not remembered: the next caller tries
/// again.
///
/// # Example
///
/// ```rust
/// use warden_protocol::Connection;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let connection = Connection::ready(String::from("client"));
/// let client = connection.get().await?;
/// assert_eq!(client.as_str(), "client");
/// # Ok(())
/// # }
/// ```
pub struct Connection<C> {
    connector: Option<Arc<dyn Connector<C>>>,
    client: Arc<OnceCell<Arc<C>>>,
}

impl<C> Clone for Connection<C> {
    fn clone(&self) -> Self {
        Self {
            connector: self.connector.clone(),
            client: self.client.clone(),
        }
    }
}

impl<C> fmt::Debug for Connection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.client.initialized())
            .finish()
    }
}

impl<C> Connection<C>
where
    C: Send + Sync + 'static,
{
    /// A handle that connects through `connector` on first use.
    pub fn new(connector: impl Connector<C> + 'static) -> Self {
        Self {
            connector: Some(Arc::new(connector)),
            client: Arc::new(OnceCell::new()),
        }
    }

    /// A handle around an already established client.
    pub fn ready(client: C) -> Self {
        Self {
            connector: None,
            client: Arc::new(OnceCell::new_with(Some(Arc::new(client)))),
        }
    }

    /// Whether the client has been established.
    pub fn is_connected(&self) -> bool {
        self.client.initialized()
    }

    /// The shared client, establishing it if needed.
    pub async fn get(&self) -> Result<Arc<C>, ProtocolError> {
        self.client
            .get_or_try_init(|| async {
                let connector = self.connector.as_ref().ok_or_else(|| {
                    ProtocolError::Configuration("connection has no connector".into())
                })?;
                debug!("Establishing connection");
                connector.connect().await.map(Arc::new)
            })
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use testresult::TestResult;

    #[derive(Clone, Default)]
    struct CountingConnector {
        attempts: Arc<AtomicUsize>,
        fail_first: bool,
    }

    #[async_trait]
    impl Connector<usize> for CountingConnector {
        async fn connect(&self) -> Result<usize, ProtocolError> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            if self.fail_first && attempt == 0 {
                return Err(ProtocolError::Configuration("unreachable".into()));
            }
            Ok(attempt)
        }
    }

    #[tokio::test]
    async fn it_connects_once_for_concurrent_callers() -> TestResult {
        let connector = CountingConnector::default();
        let connection = Connection::new(connector.clone());
        let shared = connection.clone();
        let (a, b, c) = tokio::join!(connection.get(), shared.get(), connection.get());

        assert_eq!((*a?, *b?, *c?), (0, 0, 0));
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn it_retries_after_a_failed_connect() -> TestResult {
        let connector = CountingConnector {
            fail_first: true,
            ..Default::default()
        };
        let connection = Connection::new(connector.clone());

        assert!(connection.get().await.is_err());
        assert!(!connection.is_connected());
        assert_eq!(*connection.get().await?, 1);
        assert!(connection.is_connected());
        assert_eq!(*connection.get().await?, 1);
        assert_eq!(connector.attempts.load(Ordering::SeqCst), 2);
        Ok(())
    }
}
