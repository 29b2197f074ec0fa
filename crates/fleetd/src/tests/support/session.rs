//! A daemon served on an ephemeral port and a line-oriented client for it.

use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use crate::bootstrap::{Daemon, bootstrap_with};
use crate::health::StructuredHealthReporter;
use crate::transport::{ListenerHandle, SocketListener};

use super::config_loader::TestConfigLoader;

/// Time allowed for the first line of a response.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(2);
/// Silence that marks the end of a multi-line response.
const SETTLE_TIMEOUT: Duration = Duration::from_millis(150);

/// Bootstrapped daemon with a running listener.
pub struct RunningDaemon {
    handle: Option<ListenerHandle>,
    address: SocketAddr,
    daemon: Daemon,
    _loader: Arc<TestConfigLoader>,
}

impl RunningDaemon {
    /// Bootstraps a daemon over a temporary database and starts serving.
    pub fn start() -> Self {
        Self::start_with(Arc::new(TestConfigLoader::new()))
    }

    /// Starts a daemon over the database `loader` points at.
    pub fn start_with(loader: Arc<TestConfigLoader>) -> Self {
        let daemon = bootstrap_with(&*loader, Arc::new(StructuredHealthReporter::new()))
            .expect("bootstrap should succeed");
        let listener =
            SocketListener::bind(daemon.config().listen_socket()).expect("bind listener");
        let address = listener.local_addr().expect("TCP listener has an address");
        let handle = listener
            .start(Arc::new(daemon.connection_handler()))
            .expect("start listener");
        Self {
            handle: Some(handle),
            address,
            daemon,
            _loader: loader,
        }
    }

    /// Address clients should dial.
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// The bootstrapped daemon, for inspecting shared state.
    pub fn daemon(&self) -> &Daemon {
        &self.daemon
    }

    /// Opens a new client session.
    pub fn connect(&self) -> FleetClient {
        FleetClient::connect(self.address)
    }
}

impl Drop for RunningDaemon {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.shutdown();
            let _ = handle.join();
        }
    }
}

/// Blocking client that exchanges one command for one response.
pub struct FleetClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl FleetClient {
    /// Connects to `address`.
    pub fn connect(address: SocketAddr) -> Self {
        let writer = TcpStream::connect(address).expect("connect to daemon");
        let reader = BufReader::new(writer.try_clone().expect("clone client stream"));
        Self { reader, writer }
    }

    /// Sends `line` and returns the lines of its response.
    ///
    /// The response is considered complete once the daemon stays silent for
    /// a short settle period after the first line.
    pub fn request(&mut self, line: &str) -> Vec<String> {
        self.writer.write_all(line.as_bytes()).expect("write command");
        self.writer.write_all(b"\n").expect("write newline");
        self.writer.flush().expect("flush command");
        self.read_response()
    }

    fn read_response(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        self.set_timeout(RESPONSE_TIMEOUT);
        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => {
                    lines.push(line.trim_end_matches('\n').to_owned());
                    self.set_timeout(SETTLE_TIMEOUT);
                }
                Err(error)
                    if matches!(
                        error.kind(),
                        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
                    ) =>
                {
                    break;
                }
                Err(error) => panic!("failed to read response: {error}"),
            }
        }
        lines
    }

    fn set_timeout(&self, timeout: Duration) {
        self.writer
            .set_read_timeout(Some(timeout))
            .expect("set read timeout");
    }
}
