#![allow(missing_docs)]

use crate::{
    error::CacheResult,
    fetch::Fetch,
    player::{PlayRequest, PlayerCommand, PlayerContext},
    source::Source,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    net::SocketAddr,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    sync::watch,
};
use uuid::Uuid;

/// Wraps a fetcher, counting calls and optionally holding them until released.
#[derive(Clone)]
pub struct CountingFetch {
    inner: Arc<dyn Fetch>,
    calls: Arc<AtomicUsize>,
    sources: Arc<Mutex<Vec<String>>>,
    held: Arc<watch::Sender<bool>>,
}

impl CountingFetch {
    pub fn new<F: Fetch + 'static>(inner: F) -> Self {
        let (held, _) = watch::channel(false);

        Self {
            inner: Arc::new(inner),
            calls: Arc::default(),
            sources: Arc::default(),
            held: Arc::new(held),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().clone()
    }

    pub fn hold(&self) {
        self.held.send_replace(true);
    }

    pub fn release(&self) {
        self.held.send_replace(false);
    }
}

#[async_trait]
impl Fetch for CountingFetch {
    async fn fetch(&self, source: &Source) -> CacheResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.sources.lock().push(source.to_string());

        let mut held = self.held.subscribe();
        while *held.borrow_and_update() {
            if held.changed().await.is_err() {
                break;
            }
        }

        self.inner.fetch(source).await
    }
}

type PlayRecord = (Uuid, PathBuf, f32, bool);

#[derive(Default)]
struct EngineState {
    plays: Mutex<Vec<PlayRecord>>,
    commands: Mutex<Vec<String>>,
    contexts: Mutex<Vec<PlayerContext>>,
    stalled_requests: Mutex<Vec<PlayRequest>>,
    stalled: AtomicBool,
}

/// A stand-in audio engine which records every command it receives.
#[derive(Clone)]
pub struct RecordingEngine {
    state: Arc<EngineState>,
}

impl RecordingEngine {
    pub fn spawn(contexts: flume::Receiver<PlayerContext>) -> Self {
        let state = Arc::new(EngineState::default());

        let engine_state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Ok(ctx) = contexts.recv_async().await {
                let uuid = ctx.handle.uuid();
                let commands = ctx.receiver.clone();
                engine_state.contexts.lock().push(ctx);

                let state = Arc::clone(&engine_state);
                tokio::spawn(async move {
                    while let Ok(cmd) = commands.recv_async().await {
                        state.record(uuid, cmd);
                    }
                });
            }
        });

        Self { state }
    }

    /// Stops answering play requests, without dropping them.
    pub fn stall(&self) {
        self.state.stalled.store(true, Ordering::SeqCst);
    }

    pub fn plays(&self) -> Vec<PlayRecord> {
        self.state.plays.lock().clone()
    }

    pub async fn wait_for_plays(&self, count: usize) -> Vec<PlayRecord> {
        loop {
            let plays = self.plays();
            if plays.len() >= count {
                return plays;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// Commands seen so far, formatted without their `PlayerCommand::` prefix.
    pub fn commands(&self) -> Vec<String> {
        self.state.commands.lock().clone()
    }

    pub async fn logging_enabled(&self) -> bool {
        loop {
            if let Some(ctx) = self.state.contexts.lock().last() {
                return ctx.logging_enabled();
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl EngineState {
    fn record(&self, uuid: Uuid, cmd: PlayerCommand) {
        let text = format!("{cmd:?}");
        self.commands
            .lock()
            .push(text.trim_start_matches("PlayerCommand::").to_string());

        if let PlayerCommand::Play(req) = cmd {
            self.plays
                .lock()
                .push((uuid, req.path.clone(), req.volume, req.is_local));

            if self.stalled.load(Ordering::SeqCst) {
                self.stalled_requests.lock().push(req);
            } else {
                req.respond(Ok(()));
            }
        }
    }
}

/// A minimal HTTP/1.1 server answering GETs from a fixed set of routes.
///
/// Unknown paths receive a `404`.
pub struct HttpResponder {
    addr: SocketAddr,
    routes: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    hits: Arc<Mutex<HashMap<String, usize>>>,
}

impl HttpResponder {
    pub async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test HTTP listener");
        let addr = listener.local_addr().expect("read test listener address");

        let routes: Arc<Mutex<HashMap<String, Vec<u8>>>> = Arc::default();
        let hits: Arc<Mutex<HashMap<String, usize>>> = Arc::default();

        let (task_routes, task_hits) = (Arc::clone(&routes), Arc::clone(&hits));
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = Arc::clone(&task_routes);
                let hits = Arc::clone(&task_hits);
                tokio::spawn(async move {
                    drop(respond(stream, &routes, &hits).await);
                });
            }
        });

        Self { addr, routes, hits }
    }

    /// An address on which nothing is listening.
    pub async fn unused_url(path: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind throwaway listener");
        let addr = listener.local_addr().expect("read throwaway address");
        drop(listener);

        format!("http://{addr}{path}")
    }

    #[must_use]
    pub fn route(self, path: &str, body: Vec<u8>) -> Self {
        self.routes.lock().insert(path.to_string(), body);
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().get(path).copied().unwrap_or_default()
    }
}

async fn respond(
    mut stream: TcpStream,
    routes: &Mutex<HashMap<String, Vec<u8>>>,
    hits: &Mutex<HashMap<String, usize>>,
) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buf = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buf[..n]);
    }

    let head = String::from_utf8_lossy(&request);
    let path = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    *hits.lock().entry(path.clone()).or_default() += 1;
    let body = routes.lock().get(&path).cloned();

    let (status, body) = match body {
        Some(body) => ("200 OK", body),
        None => ("404 Not Found", b"not found".to_vec()),
    };

    let header = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(header.as_bytes()).await?;
    stream.write_all(&body).await?;
    stream.shutdown().await
}
