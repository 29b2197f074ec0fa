//! Fake daemon serving scripted replies to one client connection.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::{Context, Result, anyhow};

use fleet_config::SocketEndpoint;

/// What the fake daemon does with one received line.
pub(in crate::tests) enum Reply {
    /// Writes the text verbatim.
    Text(&'static str),
    /// Closes the connection without answering.
    Hangup,
}

/// A mock daemon that accepts a single connection and answers each line
/// through a script.
pub(in crate::tests) struct FakeDaemon {
    port: u16,
    requests: Arc<Mutex<Vec<String>>>,
    handle: Option<thread::JoinHandle<Result<()>>>,
}

impl FakeDaemon {
    /// Spawns a fake daemon on an ephemeral loopback port.
    pub fn spawn<F>(script: F) -> Result<Self>
    where
        F: Fn(&str) -> Reply + Send + 'static,
    {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind fake daemon")?;
        let port = listener.local_addr().context("local addr")?.port();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().context("accept connection")?;
            Self::serve(stream, &script, &recorded)
        });
        Ok(Self {
            port,
            requests,
            handle: Some(handle),
        })
    }

    pub fn endpoint(&self) -> SocketEndpoint {
        SocketEndpoint::tcp("127.0.0.1", self.port)
    }

    /// Waits for the connection to finish and returns every received line.
    pub fn take_requests(&mut self) -> Result<Vec<String>> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| anyhow!("fake daemon thread panicked"))??;
        }
        let requests = self
            .requests
            .lock()
            .map_err(|error| anyhow!("lock requests: {error}"))?;
        Ok(requests.clone())
    }

    fn serve<F>(stream: TcpStream, script: &F, requests: &Mutex<Vec<String>>) -> Result<()>
    where
        F: Fn(&str) -> Reply,
    {
        let mut writer = stream.try_clone().context("clone stream")?;
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            let line = line.context("read command")?;
            requests
                .lock()
                .map_err(|error| anyhow!("lock requests: {error}"))?
                .push(line.clone());
            match script(&line) {
                Reply::Text(text) => {
                    writer.write_all(text.as_bytes()).context("write reply")?;
                    writer.flush().context("flush reply")?;
                }
                Reply::Hangup => return Ok(()),
            }
        }
        Ok(())
    }
}
