//! Session pool keyed by name-server address.
//!
//! Connecting a TFS session is expensive, so adapters reuse one session
//! per name server across many short transfers. The pool is an explicit
//! object owned by the caller; there is no process-wide instance.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::{ClientError, Connector};

/// Lazily connected sessions, one per name-server address.
pub struct SessionPool<C: Connector> {
    connector: C,
    sessions: RwLock<HashMap<String, Arc<C::Session>>>,
}

impl<C: Connector> SessionPool<C> {
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the session for `addr`, connecting on first use.
    pub fn get(&self, addr: &str) -> Result<Arc<C::Session>, ClientError> {
        {
            let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(session) = sessions.get(addr) {
                return Ok(Arc::clone(session));
            }
        }

        // Connect without holding the lock; a racing caller may win.
        let session = Arc::new(self.connector.connect(addr)?);

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let entry = sessions.entry(addr.to_owned()).or_insert_with(|| {
            info!(%addr, "name server session established");
            session
        });
        Ok(Arc::clone(entry))
    }

    /// Drops the pooled session for `addr`. Returns `true` if one existed.
    ///
    /// Transfers already holding the session keep it alive until they finish.
    pub fn evict(&self, addr: &str) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let removed = sessions.remove(addr).is_some();
        if removed {
            debug!(%addr, "session evicted");
        }
        removed
    }

    /// Number of pooled sessions.
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
