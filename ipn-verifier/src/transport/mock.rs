//! Scripted in-memory connectors for network-free tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::sync::Notify;

use super::{ConnectError, Connector};
use crate::ipn::VALIDATE_COMMAND;

const BUFFER_SIZE: usize = 64 * 1024;

/// Plays the provider: reads the validation request, answers with a canned
/// response, closes its write side, then waits for the client to drop its end.
#[derive(Clone, Default)]
pub struct ScriptedConnector {
    response: String,
    hold_open: bool,
    connects: Arc<AtomicUsize>,
    hosts: Arc<Mutex<Vec<String>>>,
    requests: Arc<Mutex<Vec<String>>>,
    released: Arc<AtomicUsize>,
    release_signal: Arc<Notify>,
}

impl ScriptedConnector {
    pub fn replying(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            ..Default::default()
        }
    }

    /// Answer but never close the stream, so the reader waits for end-of-stream.
    pub fn replying_without_eof(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            hold_open: true,
            ..Default::default()
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn hosts(&self) -> Vec<String> {
        self.hosts.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of client streams that have been dropped so far.
    pub fn released_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Wait until the client has dropped a stream, giving up after one second.
    pub async fn wait_for_release(&self) -> bool {
        if self.released_count() > 0 {
            return true;
        }
        tokio::time::timeout(Duration::from_secs(1), self.release_signal.notified())
            .await
            .is_ok()
    }
}

impl Connector for ScriptedConnector {
    type Stream = DuplexStream;

    async fn open(
        &self,
        host: &str,
        _port: u16,
        _timeout: Duration,
    ) -> Result<Self::Stream, ConnectError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.hosts.lock().unwrap().push(host.to_string());

        let (client, mut server) = duplex(BUFFER_SIZE);
        let response = self.response.clone();
        let hold_open = self.hold_open;
        let requests = Arc::clone(&self.requests);
        let released = Arc::clone(&self.released);
        let release_signal = Arc::clone(&self.release_signal);

        tokio::spawn(async move {
            let mut received = Vec::new();
            let mut chunk = [0u8; 1024];

            while !received.ends_with(VALIDATE_COMMAND.as_bytes()) {
                match server.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => received.extend_from_slice(&chunk[..n]),
                }
            }

            requests
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(&received).into_owned());

            let _ = server.write_all(response.as_bytes()).await;

            if !hold_open {
                let _ = server.shutdown().await;
            }

            // A read of zero bytes means the client dropped its half.
            loop {
                match server.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
            }

            released.fetch_add(1, Ordering::SeqCst);
            release_signal.notify_one();
        });

        Ok(client)
    }
}

/// Fails every connection attempt, counting how many were made.
#[derive(Clone, Default)]
pub struct UnreachableConnector {
    connects: Arc<AtomicUsize>,
}

impl UnreachableConnector {
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Connector for UnreachableConnector {
    type Stream = DuplexStream;

    async fn open(
        &self,
        _host: &str,
        _port: u16,
        timeout: Duration,
    ) -> Result<Self::Stream, ConnectError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Err(ConnectError::TimedOut(timeout))
    }
}
