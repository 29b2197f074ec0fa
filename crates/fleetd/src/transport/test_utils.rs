//! Test helpers for the transport module.

use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use super::{ConnectionHandler, ConnectionStream};

/// Handler that records the peer of every accepted stream, then drops it.
#[derive(Default)]
pub(crate) struct PeerRecorder {
    peers: Mutex<Vec<String>>,
    arrived: Condvar,
}

impl PeerRecorder {
    pub(crate) fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Blocks until `expected` sessions were served or `timeout` elapses, and
    /// returns the peers seen so far.
    pub(crate) fn wait_for(&self, expected: usize, timeout: Duration) -> Vec<String> {
        let peers = self.peers.lock().expect("peer list poisoned");
        let (peers, _) = self
            .arrived
            .wait_timeout_while(peers, timeout, |peers| peers.len() < expected)
            .expect("peer list poisoned");
        peers.clone()
    }
}

impl ConnectionHandler for PeerRecorder {
    fn handle(&self, stream: ConnectionStream) {
        let mut peers = self.peers.lock().expect("peer list poisoned");
        peers.push(stream.peer());
        self.arrived.notify_all();
    }
}
