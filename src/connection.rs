//! A single IRC server connection.
//!
//! [`Connection`] owns the socket and two pump tasks running on the client's
//! [`TaskPool`]: the read pump turns incoming bytes into lines and hands each
//! one to a [`ConnectionHandler`], and the write pump drains an unbounded FIFO
//! of framed lines in the order they were sent.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{lookup_host, TcpSocket, TcpStream};
use tokio::sync::mpsc;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{self, RootCertStore};
use tokio_rustls::TlsConnector;
use tokio_util::codec::Decoder;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::error::{ClientError, Result};
use crate::line::{LineCodec, DEFAULT_MAX_LINE_LEN};
use crate::pool::TaskPool;

/// Default read size of the read pump.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Default timeout for connecting, becoming writable and the TLS handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifecycle of a [`Connection`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Closed,
}

/// Receiver of connection lifecycle notifications.
///
/// `line_received` is called from its own task for every line, so calls may
/// overlap.
pub trait ConnectionHandler: Send + Sync + 'static {
    fn connected(&self);
    fn line_received(&self, line: String);
    /// The peer closed the connection or the socket failed. Not called for a
    /// connection closed through [`Connection::terminate`].
    fn disconnected(&self);
}

/// TLS settings for [`ConnectOptions`].
#[derive(Clone, Default)]
pub struct TlsOptions {
    /// Name to verify the certificate against; defaults to the host.
    pub server_name: Option<String>,
    /// Custom rustls configuration; defaults to the platform's trust roots.
    pub config: Option<Arc<rustls::ClientConfig>>,
}

impl fmt::Debug for TlsOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsOptions")
            .field("server_name", &self.server_name)
            .field("custom_config", &self.config.is_some())
            .finish()
    }
}

/// Per-attempt connection settings.
#[derive(Clone, Debug)]
pub struct ConnectOptions {
    pub timeout: Duration,
    /// Local address to bind before connecting.
    pub source: Option<SocketAddr>,
    pub tls: Option<TlsOptions>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        ConnectOptions {
            timeout: DEFAULT_CONNECT_TIMEOUT,
            source: None,
            tls: None,
        }
    }
}

impl ConnectOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_source(mut self, source: SocketAddr) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_tls(mut self, tls: TlsOptions) -> Self {
        self.tls = Some(tls);
        self
    }
}

/// Build a rustls client configuration trusting the platform's root store.
pub fn native_roots_config() -> Arc<rustls::ClientConfig> {
    let mut roots = RootCertStore::empty();
    let certs = rustls_native_certs::load_native_certs();
    for cert in certs.certs {
        if let Err(e) = roots.add(cert) {
            warn!("failed to add root cert: {}", e);
        }
    }
    for e in &certs.errors {
        warn!("error loading native certs: {}", e);
    }

    Arc::new(
        rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth(),
    )
}

fn enable_keepalive(stream: &TcpStream) -> io::Result<()> {
    use socket2::{SockRef, TcpKeepalive};

    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(120))
        .with_interval(Duration::from_secs(30));
    SockRef::from(stream).set_tcp_keepalive(&keepalive)
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

/// A connection to one `host:port`.
///
/// A connection is used once: after it reaches [`ConnectionState::Closed`]
/// it cannot be reopened.
pub struct Connection {
    host: String,
    port: u16,
    chunk_size: usize,
    max_line_len: usize,
    pool: TaskPool,
    state: Mutex<ConnectionState>,
    outgoing: mpsc::UnboundedSender<Bytes>,
    pending: Mutex<Option<mpsc::UnboundedReceiver<Bytes>>>,
    tls: Mutex<bool>,
    close: CancellationToken,
    writer_done: CancellationToken,
}

impl Connection {
    pub fn new(host: impl Into<String>, port: u16, pool: TaskPool) -> Self {
        let (outgoing, pending) = mpsc::unbounded_channel();
        Connection {
            host: host.into(),
            port,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            pool,
            state: Mutex::new(ConnectionState::Idle),
            outgoing,
            pending: Mutex::new(Some(pending)),
            tls: Mutex::new(false),
            close: CancellationToken::new(),
            writer_done: CancellationToken::new(),
        }
    }

    /// Set the read size of the read pump (at least one byte).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the longest inbound line, in bytes, before it is dropped.
    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len.max(1);
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    pub fn is_tls(&self) -> bool {
        *self.tls.lock()
    }

    fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Open the socket, then start the pumps and notify `handler`.
    ///
    /// On failure the connection returns to [`ConnectionState::Idle`] and
    /// may be retried.
    pub async fn connect(
        self: &Arc<Self>,
        options: ConnectOptions,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<()> {
        {
            let mut state = self.state.lock();
            match *state {
                ConnectionState::Idle => *state = ConnectionState::Connecting,
                ConnectionState::Closed => return Err(ClientError::Closed),
                _ => return Err(ClientError::AlreadyConnected),
            }
        }

        info!(addr = %self.target(), tls = options.tls.is_some(), "connecting");
        let result = self.establish(&options, handler).await;
        if let Err(ref e) = result {
            warn!(addr = %self.target(), "connect failed: {}", e);
            let mut state = self.state.lock();
            if *state == ConnectionState::Connecting {
                *state = ConnectionState::Idle;
            }
        }
        result
    }

    async fn establish(
        self: &Arc<Self>,
        options: &ConnectOptions,
        handler: Arc<dyn ConnectionHandler>,
    ) -> Result<()> {
        let stream = self.open_tcp(options).await?;
        if let Err(e) = enable_keepalive(&stream) {
            warn!("failed to enable TCP keepalive: {}", e);
        }

        match &options.tls {
            None => self.attach(stream, handler),
            Some(tls) => {
                let stream = self.handshake(stream, tls, options.timeout).await?;
                *self.tls.lock() = true;
                self.attach(stream, handler)
            }
        }
    }

    async fn open_tcp(&self, options: &ConnectOptions) -> Result<TcpStream> {
        let target = self.target();
        let timed_out = || ClientError::ConnectTimeout {
            addr: target.clone(),
            timeout: options.timeout,
        };

        let addrs: Vec<SocketAddr> = tokio::time::timeout(options.timeout, lookup_host(&target))
            .await
            .map_err(|_| timed_out())?
            .map_err(|e| ClientError::Resolve(format!("{}: {}", target, e)))?
            .filter(|addr| match options.source {
                Some(source) => source.is_ipv4() == addr.is_ipv4(),
                None => true,
            })
            .collect();

        let mut last_err = None;
        for addr in addrs {
            debug!(%addr, "trying address");
            let attempt = async {
                let socket = if addr.is_ipv4() {
                    TcpSocket::new_v4()?
                } else {
                    TcpSocket::new_v6()?
                };
                if let Some(source) = options.source {
                    socket.bind(source)?;
                }
                let stream = tokio::time::timeout(options.timeout, socket.connect(addr))
                    .await
                    .map_err(|_| timed_out())??;
                tokio::time::timeout(options.timeout, stream.writable())
                    .await
                    .map_err(|_| timed_out())??;
                Ok::<_, ClientError>(stream)
            };
            match attempt.await {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err.unwrap_or_else(|| ClientError::Resolve(format!("{}: no address", target))))
    }

    async fn handshake(
        &self,
        stream: TcpStream,
        tls: &TlsOptions,
        timeout: Duration,
    ) -> Result<tokio_rustls::client::TlsStream<TcpStream>> {
        let config = match &tls.config {
            Some(config) => config.clone(),
            None => native_roots_config(),
        };
        let name = tls.server_name.clone().unwrap_or_else(|| self.host.clone());
        let server_name =
            ServerName::try_from(name.clone()).map_err(|_| ClientError::InvalidServerName(name))?;

        let connector = TlsConnector::from(config);
        let stream = tokio::time::timeout(timeout, connector.connect(server_name, stream))
            .await
            .map_err(|_| ClientError::ConnectTimeout {
                addr: self.target(),
                timeout,
            })??;
        Ok(stream)
    }

    /// Run the pumps over an already open stream and notify `handler`.
    pub fn attach<S>(self: &Arc<Self>, stream: S, handler: Arc<dyn ConnectionHandler>) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        {
            let mut state = self.state.lock();
            match *state {
                ConnectionState::Idle | ConnectionState::Connecting => {}
                ConnectionState::Connected => return Err(ClientError::AlreadyConnected),
                ConnectionState::Closed => return Err(ClientError::Closed),
            }
            *state = ConnectionState::Connected;
        }
        let pending = self.pending.lock().take().ok_or(ClientError::Closed)?;

        info!(addr = %self.target(), "connected");
        let (reader, writer) = tokio::io::split(stream);
        self.pool
            .spawn(self.clone().read_pump(reader, handler.clone()));
        self.pool
            .spawn(self.clone().write_pump(writer, pending, handler.clone()));

        handler.connected();
        Ok(())
    }

    /// Queue `text` for sending. Sends before the connection is up are
    /// delivered once it is.
    pub fn send(&self, text: &str) {
        trace!(line = text, "send");
        let payload = Bytes::from(LineCodec::frame(text));
        if self.outgoing.send(payload).is_err() {
            debug!("dropping line on closed connection");
        }
    }

    /// Close the connection. The write pump still flushes what is queued.
    ///
    /// This does not wait for the flush. A peer that stops reading can hold
    /// the write pump, and with it the socket, open until the pool is
    /// killed; bound the wait with [`Connection::wait_closed`] first.
    pub fn terminate(&self) {
        let prev = std::mem::replace(&mut *self.state.lock(), ConnectionState::Closed);
        if prev != ConnectionState::Closed {
            debug!(addr = %self.target(), "terminating");
        }
        self.close.cancel();
    }

    /// Wait up to `grace` for the write pump to finish. Returns false on
    /// timeout.
    pub async fn wait_closed(&self, grace: Duration) -> bool {
        if self.pending.lock().is_some() {
            return true;
        }
        tokio::time::timeout(grace, self.writer_done.cancelled())
            .await
            .is_ok()
    }

    fn lost(&self, handler: &Arc<dyn ConnectionHandler>) {
        let prev = std::mem::replace(&mut *self.state.lock(), ConnectionState::Closed);
        self.close.cancel();
        if prev == ConnectionState::Connected {
            info!(addr = %self.target(), "connection lost");
            handler.disconnected();
        }
    }

    async fn read_pump<R>(self: Arc<Self>, mut reader: R, handler: Arc<dyn ConnectionHandler>)
    where
        R: AsyncRead + Unpin,
    {
        let mut codec = LineCodec::with_max_len(self.max_line_len);
        let mut buffer = BytesMut::new();
        let mut chunk = vec![0u8; self.chunk_size];

        loop {
            let read = tokio::select! {
                _ = self.close.cancelled() => return,
                read = reader.read(&mut chunk) => read,
            };

            match read {
                Ok(0) => {
                    debug!("peer closed the connection");
                    break;
                }
                Ok(n) => {
                    buffer.extend_from_slice(&chunk[..n]);
                    while let Ok(Some(line)) = codec.decode(&mut buffer) {
                        let handler = handler.clone();
                        self.pool.spawn(async move { handler.line_received(line) });
                    }
                }
                Err(e) if is_transient(&e) => {
                    trace!("transient read error: {}", e);
                }
                Err(e) => {
                    warn!("read error: {}", e);
                    break;
                }
            }
        }

        self.lost(&handler);
    }

    async fn write_pump<W>(
        self: Arc<Self>,
        mut writer: W,
        mut pending: mpsc::UnboundedReceiver<Bytes>,
        handler: Arc<dyn ConnectionHandler>,
    ) where
        W: AsyncWrite + Unpin,
    {
        loop {
            let payload = tokio::select! {
                biased;
                payload = pending.recv() => match payload {
                    Some(payload) => payload,
                    None => break,
                },
                _ = self.close.cancelled() => break,
            };

            if let Err(e) = write_payload(&mut writer, &payload).await {
                warn!("write error: {}", e);
                self.writer_done.cancel();
                self.lost(&handler);
                return;
            }
        }

        while let Ok(payload) = pending.try_recv() {
            if let Err(e) = write_payload(&mut writer, &payload).await {
                debug!("write error while draining: {}", e);
                break;
            }
        }
        if let Err(e) = writer.shutdown().await {
            trace!("shutdown: {}", e);
        }
        self.writer_done.cancel();
    }
}

async fn write_payload<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    writer.write_all(payload).await?;
    writer.flush().await
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("state", &self.state())
            .field("tls", &self.is_tls())
            .finish()
    }
}
