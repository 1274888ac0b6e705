//! Least-loaded selection across upstream clients.
//!
//! Every upstream client has a load counter equal to the number of requests
//! it is currently serving. Selection is a linear scan for the minimum; ties
//! go to the client registered first. Selection is a fairness signal, not a
//! reservation: the same client may be picked again before its previous
//! request finishes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mediarelay_common::{ClientId, Error, Result};

use crate::source::ObjectSource;

/// Shared per-client load counters.
#[derive(Debug)]
pub struct LoadTracker {
    loads: Vec<AtomicUsize>,
}

impl LoadTracker {
    /// Create a tracker for `clients` clients, all at zero load.
    pub fn new(clients: usize) -> Self {
        Self {
            loads: (0..clients).map(|_| AtomicUsize::new(0)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.loads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loads.is_empty()
    }

    /// The client with the lowest current load, or `None` if no client is
    /// registered.
    pub fn select(&self) -> Option<ClientId> {
        let mut best: Option<(usize, usize)> = None;
        for (index, load) in self.loads.iter().enumerate() {
            let load = load.load(Ordering::Acquire);
            // Strict comparison keeps the earliest client on ties.
            if best.map_or(true, |(_, min)| load < min) {
                best = Some((index, load));
            }
        }
        best.map(|(index, _)| ClientId::new(index))
    }

    pub fn increment(&self, client: ClientId) {
        if let Some(load) = self.loads.get(client.index()) {
            load.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Decrease the load of `client`, never going below zero.
    pub fn decrement(&self, client: ClientId) {
        if let Some(load) = self.loads.get(client.index()) {
            let _ = load.fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| v.checked_sub(1));
        }
    }

    pub fn load(&self, client: ClientId) -> usize {
        self.loads
            .get(client.index())
            .map_or(0, |l| l.load(Ordering::Acquire))
    }

    /// Current load of every client, in registration order.
    pub fn snapshot(&self) -> Vec<usize> {
        self.loads.iter().map(|l| l.load(Ordering::Acquire)).collect()
    }

    /// Count a request against `client` until the returned guard is dropped.
    pub fn acquire(self: &Arc<Self>, client: ClientId) -> LoadGuard {
        self.increment(client);
        LoadGuard {
            tracker: Arc::clone(self),
            client,
        }
    }
}

/// Holds one unit of load on a client; releases it on drop.
#[derive(Debug)]
pub struct LoadGuard {
    tracker: Arc<LoadTracker>,
    client: ClientId,
}

impl LoadGuard {
    pub fn client(&self) -> ClientId {
        self.client
    }
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        self.tracker.decrement(self.client);
    }
}

/// Upstream clients plus their load counters, indexed by [`ClientId`].
pub struct UpstreamPool {
    clients: Vec<Arc<dyn ObjectSource>>,
    loads: Arc<LoadTracker>,
}

impl UpstreamPool {
    pub fn new(clients: Vec<Arc<dyn ObjectSource>>) -> Result<Self> {
        if clients.is_empty() {
            return Err(Error::internal("upstream pool needs at least one client"));
        }
        let loads = Arc::new(LoadTracker::new(clients.len()));
        Ok(Self { clients, loads })
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn loads(&self) -> &Arc<LoadTracker> {
        &self.loads
    }

    pub fn client(&self, id: ClientId) -> Option<&Arc<dyn ObjectSource>> {
        self.clients.get(id.index())
    }

    /// Pick the least-loaded client.
    pub fn select(&self) -> (ClientId, Arc<dyn ObjectSource>) {
        // The pool is never empty, so the tracker always yields a client.
        let id = self.loads.select().unwrap_or(ClientId::new(0));
        (id, Arc::clone(&self.clients[id.index()]))
    }
}
