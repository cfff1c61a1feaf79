//! Round-robin proxy pool with transient failure marks
//!
//! The sequence is fixed at construction. Selection walks it from a cursor,
//! skipping proxies marked failed. When every proxy is marked failed the
//! marks are cleared and the first proxy is offered again, so the pool never
//! locks itself out. Marks are advisory, not bans.
//!
//! All operations are synchronous, in-memory and infallible. The mutable
//! state sits behind one mutex because callers run on a multi-threaded
//! runtime.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use super::types::Proxy;

#[derive(Debug, Default)]
struct PoolState {
    cursor: usize,
    failed: HashSet<String>,
}

/// Proxy rotation pool shared by all extraction calls
pub struct ProxyPool {
    proxies: Vec<Proxy>,
    identities: HashSet<String>,
    state: Mutex<PoolState>,
}

impl ProxyPool {
    /// Create a pool over a fixed, ordered proxy sequence
    pub fn new(proxies: Vec<Proxy>) -> Self {
        let identities = proxies.iter().map(Proxy::key).collect();
        Self {
            proxies,
            identities,
            state: Mutex::new(PoolState::default()),
        }
    }

    /// Pool with no proxies (direct-connection mode)
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    fn state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// True iff any proxy is configured; failure marks are not considered
    pub fn has_proxies(&self) -> bool {
        !self.proxies.is_empty()
    }

    /// Next candidate in round-robin order, skipping proxies marked failed.
    ///
    /// Every examined position advances the cursor, including the one
    /// returned. If all proxies are marked failed, the marks are cleared,
    /// the cursor goes back to 0 and the first proxy is returned.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> Option<Proxy> {
        let len = self.proxies.len();
        if len == 0 {
            return None;
        }

        let mut state = self.state();
        for _ in 0..len {
            let index = state.cursor % len;
            state.cursor = (index + 1) % len;
            let candidate = &self.proxies[index];
            if !state.failed.contains(&candidate.key()) {
                log::debug!("Selected proxy {}", candidate);
                return Some(candidate.clone());
            }
        }

        log::warn!("⚠️ All {} proxies are marked as failed. Resetting...", len);
        state.failed.clear();
        state.cursor = 0;
        self.proxies.first().cloned()
    }

    /// Clears the failure mark of a proxy. No-op if unmarked or unknown.
    pub fn report_success(&self, proxy: &Proxy) {
        let key = proxy.key();
        if self.state().failed.remove(&key) {
            log::info!("Proxy {} recovered", key);
        }
    }

    /// Marks a proxy as failed until a success or a pool reset.
    /// No-op for proxies that are not part of this pool.
    pub fn report_failure(&self, proxy: &Proxy) {
        let key = proxy.key();
        if !self.identities.contains(&key) {
            return;
        }
        if self.state().failed.insert(key) {
            log::warn!("⚠️ Proxy marked as failed: {}", proxy.key());
        }
    }

    /// `protocol://[user:pass@]host:port` for use as the HTTP client proxy
    pub fn to_connection_url(&self, proxy: &Proxy) -> String {
        proxy.to_url()
    }

    /// Number of configured proxies
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Configured proxies in rotation order
    pub fn proxies(&self) -> &[Proxy] {
        &self.proxies
    }

    /// Number of proxies currently marked failed
    pub fn failed_count(&self) -> usize {
        self.state().failed.len()
    }

    pub fn is_marked_failed(&self, proxy: &Proxy) -> bool {
        self.state().failed.contains(&proxy.key())
    }
}

impl fmt::Debug for ProxyPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyPool")
            .field("proxies", &self.proxies.len())
            .field("failed", &self.failed_count())
            .finish()
    }
}

impl fmt::Display for ProxyPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ProxyPool ({} proxies, {} marked failed)",
            self.proxies.len(),
            self.failed_count()
        )?;
        for proxy in &self.proxies {
            let status = if self.is_marked_failed(proxy) { "✗" } else { "✓" };
            writeln!(f, "  {} {}", status, proxy)?;
        }
        Ok(())
    }
}
