//! The IRC client.
//!
//! [`Client`] drives one [`Connection`], turns every received line into
//! events on its [`EventBus`], and keeps the little session state an IRC
//! client needs: its nickname, the server name and the server's ISUPPORT
//! parameters.
//!
//! ```no_run
//! use slirc_client::{handler, Client, ClientConfig, Commands, ConnectOptions};
//!
//! # async fn demo() -> slirc_client::Result<()> {
//! let client = Client::new(ClientConfig::new("ferris", "irc.libera.chat", 6697).with_tls(true));
//!
//! let c = client.clone();
//! client.bind("001", handler(move |_| {
//!     let c = c.clone();
//!     async move { c.join_channel("rust", None) }
//! }));
//! client.bind("pubmsg", handler(|event| async move {
//!     println!("{:?}: {:?}", event.source, event.data.text());
//! }));
//!
//! client.connect(ConnectOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::casemap::irc_eq;
use crate::chan::is_channel;
use crate::command::{build_cmd, Commands};
use crate::connection::{
    Connection, ConnectionHandler, ConnectionState, ConnectOptions, TlsOptions, DEFAULT_CHUNK_SIZE,
};
use crate::ctcp::{extract_ctcp, X_DELIM};
use crate::error::Result;
use crate::event::{handler, Event, EventBus, EventData, EventHandler};
use crate::isupport::Isupport;
use crate::line::DEFAULT_MAX_LINE_LEN;
use crate::message::parse_line;
use crate::pool::TaskPool;
use crate::prefix::Prefix;
use crate::quote::low_dequote;
use crate::util::DEFAULT_LINE_BUDGET;

/// Default time [`Client::disconnect`] waits for queued lines to be written.
pub const DEFAULT_LINGER: Duration = Duration::from_secs(5);

/// Client configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ClientConfig {
    pub nickname: String,
    pub host: String,
    pub port: u16,
    /// Connect with TLS unless [`ConnectOptions::tls`] says otherwise.
    pub tls: bool,
    /// Defaults to the nickname.
    pub username: Option<String>,
    /// Defaults to the nickname.
    pub realname: Option<String>,
    /// Sent with PASS before registration, once.
    pub password: Option<String>,
    pub line_budget: usize,
    pub chunk_size: usize,
    /// Inbound lines longer than this many bytes are dropped.
    pub max_line_len: usize,
    pub linger: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            nickname: String::new(),
            host: String::new(),
            port: 6667,
            tls: false,
            username: None,
            realname: None,
            password: None,
            line_budget: DEFAULT_LINE_BUDGET,
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_line_len: DEFAULT_MAX_LINE_LEN,
            linger: DEFAULT_LINGER,
        }
    }
}

impl ClientConfig {
    pub fn new(nickname: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        ClientConfig {
            nickname: nickname.into(),
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_realname(mut self, realname: impl Into<String>) -> Self {
        self.realname = Some(realname.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_line_budget(mut self, line_budget: usize) -> Self {
        self.line_budget = line_budget.max(1);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len.max(1);
        self
    }

    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }

    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.nickname)
    }

    pub fn realname(&self) -> &str {
        self.realname.as_deref().unwrap_or(&self.nickname)
    }
}

#[derive(Debug, Default)]
struct SessionState {
    nickname: String,
    server_name: Option<String>,
    isupport: Isupport,
    password: Option<String>,
}

struct Inner {
    config: ClientConfig,
    connection: Arc<Connection>,
    bus: EventBus,
    pool: TaskPool,
    state: RwLock<SessionState>,
}

/// An IRC client session. Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        let pool = TaskPool::new();
        let connection = Connection::new(config.host.clone(), config.port, pool.clone())
            .with_chunk_size(config.chunk_size)
            .with_max_line_len(config.max_line_len);
        let state = SessionState {
            nickname: config.nickname.clone(),
            password: config.password.clone(),
            ..Default::default()
        };

        let client = Client {
            inner: Arc::new(Inner {
                connection: Arc::new(connection),
                bus: EventBus::new(pool.clone()),
                pool,
                state: RwLock::new(state),
                config,
            }),
        };
        client.bind_intern_handlers();
        client
    }

    fn bind_intern_handlers(&self) {
        let intern: [(&str, fn(&Client, &Event)); 3] = [
            ("001", Client::on_welcome),
            ("005", Client::on_isupport),
            ("PING", Client::on_ping),
        ];
        for (name, callback) in intern {
            let weak: Weak<Inner> = Arc::downgrade(&self.inner);
            self.bind(
                name,
                handler(move |event| {
                    let weak = weak.clone();
                    async move {
                        if let Some(inner) = weak.upgrade() {
                            callback(&Client { inner }, &event);
                        }
                    }
                }),
            );
        }
    }

    fn on_welcome(&self, event: &Event) {
        if let Some(nick) = event.data.args().first() {
            debug!(nick = %nick, "registered");
            self.inner.state.write().nickname = nick.clone();
        }
    }

    fn on_isupport(&self, event: &Event) {
        let parsed = Isupport::from_reply_args(event.data.args());
        self.inner.state.write().isupport.merge(parsed);
    }

    fn on_ping(&self, event: &Event) {
        let args = event.data.args();
        if let Some(first) = args.first() {
            self.pong(first, args.get(1).map(String::as_str));
        }
    }

    /// Connect and register. TLS is used when `options.tls` is set or the
    /// configuration asks for it.
    pub async fn connect(&self, mut options: ConnectOptions) -> Result<()> {
        if self.inner.config.tls && options.tls.is_none() {
            options.tls = Some(TlsOptions::default());
        }
        let handler: Arc<dyn ConnectionHandler> = Arc::new(self.clone());
        self.inner.connection.connect(options, handler).await
    }

    /// Send QUIT, close the connection once queued lines are written (or
    /// the linger time ran out), then cancel all remaining tasks.
    pub async fn disconnect(&self, message: Option<&str>) {
        self.quit(message);
        self.inner.connection.terminate();
        if !self.inner.connection.wait_closed(self.inner.config.linger).await {
            debug!("linger elapsed before the write queue drained");
        }
        self.inner.pool.kill();
    }

    /// Subscribe `handler` to event names matching the glob `pattern`.
    pub fn bind(&self, pattern: &str, handler: EventHandler) {
        self.inner.bus.bind(pattern, handler);
    }

    pub fn unbind(&self, pattern: &str, handler: Option<&EventHandler>) {
        self.inner.bus.unbind(pattern, handler);
    }

    /// Dispatch an event of your own through the client's bus.
    pub fn dispatch(&self, event: Event) {
        self.inner.bus.dispatch(event);
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn nickname(&self) -> String {
        self.inner.state.read().nickname.clone()
    }

    /// Name of the server, taken from the first prefixed line received.
    pub fn server_name(&self) -> Option<String> {
        self.inner.state.read().server_name.clone()
    }

    /// Snapshot of the ISUPPORT parameters received so far.
    pub fn isupport(&self) -> Isupport {
        self.inner.state.read().isupport.clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.inner.connection.state()
    }

    pub fn pool(&self) -> &TaskPool {
        &self.inner.pool
    }

    fn server_prefix(&self) -> Option<Prefix> {
        self.server_name().map(|name| Prefix::new_from_str(&name))
    }

    fn emit(&self, name: &str, source: Option<Prefix>, target: Option<String>, data: EventData) {
        self.dispatch(Event::new(name, source, target, data));
    }

    /// Turn one received line into events.
    pub fn handle_line(&self, line: &str) {
        self.emit(
            "RAW_MESSAGE",
            self.server_prefix(),
            None,
            EventData::Raw(line.to_owned()),
        );

        let mut msg = parse_line(&low_dequote(line.trim_end()));
        if msg.command.is_empty() {
            trace!("ignoring line without a command");
            return;
        }

        let (chantypes, nickname) = {
            let mut state = self.inner.state.write();
            if state.server_name.is_none() && !msg.prefix.is_empty() {
                state.server_name = Some(msg.prefix.to_string());
            }
            (state.isupport.channel_prefixes(), state.nickname.clone())
        };

        let is_chan = msg
            .args
            .first()
            .is_some_and(|target| is_channel(target, &chantypes));

        if msg.command == "NICK" {
            if let (Some(old), Some(new)) = (msg.prefix.nick.as_deref(), msg.args.first()) {
                if irc_eq(old, &nickname) {
                    self.inner.state.write().nickname = new.clone();
                }
            }
        }

        let source = (!msg.prefix.is_empty()).then(|| msg.prefix.clone());
        match msg.command.as_str() {
            "PRIVMSG" | "NOTICE" if !msg.args.is_empty() => {
                let is_priv = msg.command == "PRIVMSG";
                let target = msg.args[0].clone();
                let mut text = msg.args.get(1).cloned().unwrap_or_default();

                if text.contains(X_DELIM) {
                    let (normal, frames) = extract_ctcp(&text);
                    let kind = if is_priv { "CTCP_" } else { "CTCPREPLY_" };
                    for frame in frames {
                        self.emit(
                            &format!("{}{}", kind, frame.tag),
                            source.clone(),
                            Some(target.clone()),
                            EventData::Ctcp(frame.data),
                        );
                    }
                    if normal.is_empty() {
                        return;
                    }
                    text = normal.join(" ");
                }

                let name = match (is_chan, is_priv) {
                    (true, true) => "PUBMSG",
                    (true, false) => "PUBNOTICE",
                    (false, true) => "PRIVMSG",
                    (false, false) => "PRIVNOTICE",
                };
                self.emit(name, source, Some(target), EventData::Text(text));
            }
            "KICK" | "BAN" | "MODE" | "JOIN" | "PART" if !msg.args.is_empty() => {
                let target = msg.args.remove(0);
                self.emit(&msg.command, source, Some(target), EventData::Args(msg.args));
            }
            _ => self.emit(&msg.command, source, None, EventData::Args(msg.args)),
        }
    }
}

impl Commands for Client {
    fn send(&self, line: &str) {
        self.inner.connection.send(line);
    }

    fn channel_prefixes(&self) -> String {
        self.inner.state.read().isupport.channel_prefixes()
    }

    fn line_budget(&self) -> usize {
        self.inner.config.line_budget
    }

    /// Send NICK and start tracking `nickname` as ours.
    fn nick(&self, nickname: &str) {
        self.send(&build_cmd("NICK", &[nickname]));
        self.inner.state.write().nickname = nickname.to_owned();
    }
}

impl ConnectionHandler for Client {
    fn connected(&self) {
        if let Some(password) = self.inner.state.write().password.take() {
            self.pass(&password);
        }
        let nickname = self.nickname();
        self.nick(&nickname);
        self.user(self.inner.config.username(), self.inner.config.realname());

        self.emit("CONNECT", self.server_prefix(), None, EventData::None);
    }

    fn line_received(&self, line: String) {
        self.handle_line(&line);
    }

    fn disconnected(&self) {
        self.emit("DISCONNECT", self.server_prefix(), None, EventData::None);
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("nickname", &self.nickname())
            .field("server_name", &self.server_name())
            .field("connection", &self.inner.connection)
            .field("bus", &self.inner.bus)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn client() -> Client {
        Client::new(ClientConfig::new("alice", "irc.example.net", 6667))
    }

    fn capture(client: &Client, pattern: &str) -> mpsc::UnboundedReceiver<Arc<Event>> {
        let (tx, rx) = mpsc::unbounded_channel();
        client.bind(
            pattern,
            handler(move |event| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(event);
                }
            }),
        );
        rx
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<Arc<Event>>) -> Arc<Event> {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("event within timeout")
            .expect("channel open")
    }

    async fn eventually(mut check: impl FnMut() -> bool) {
        for _ in 0..100 {
            if check() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition never became true");
    }

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::new("alice", "irc.example.net", 6697)
            .with_tls(true)
            .with_realname("Alice Liddell");
        assert_eq!(config.username(), "alice");
        assert_eq!(config.realname(), "Alice Liddell");
        assert_eq!(config.line_budget, DEFAULT_LINE_BUDGET);
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.max_line_len, DEFAULT_MAX_LINE_LEN);
        assert_eq!(config.linger, DEFAULT_LINGER);
    }

    #[tokio::test]
    async fn test_raw_message_and_server_name() {
        let client = client();
        let mut raw = capture(&client, "RAW_MESSAGE");

        client.handle_line(":irc.example.net NOTICE * :*** Looking up your hostname");
        client.handle_line(":other.example.net 002 alice :Your host");

        let event = next(&mut raw).await;
        assert_eq!(
            event.data,
            EventData::Raw(":irc.example.net NOTICE * :*** Looking up your hostname".to_string())
        );
        assert_eq!(client.server_name().as_deref(), Some("irc.example.net"));
    }

    #[tokio::test]
    async fn test_pubmsg_and_privmsg() {
        let client = client();
        let mut public = capture(&client, "PUBMSG");
        let mut private = capture(&client, "PRIVMSG");

        client.handle_line(":bob!b@h PRIVMSG #rust :hello all");
        let event = next(&mut public).await;
        assert_eq!(event.target.as_deref(), Some("#rust"));
        assert_eq!(event.data, EventData::Text("hello all".to_string()));
        assert_eq!(event.source.as_ref().and_then(|p| p.nick.as_deref()), Some("bob"));

        client.handle_line(":bob!b@h PRIVMSG alice :psst");
        let event = next(&mut private).await;
        assert_eq!(event.target.as_deref(), Some("alice"));
        assert_eq!(event.data.text(), Some("psst"));
    }

    #[tokio::test]
    async fn test_notices() {
        let client = client();
        let mut notices = capture(&client, "*NOTICE");

        client.handle_line(":bob!b@h NOTICE #rust :channel notice");
        assert_eq!(next(&mut notices).await.name, "PUBNOTICE");
        client.handle_line(":bob!b@h NOTICE alice :direct notice");
        assert_eq!(next(&mut notices).await.name, "PRIVNOTICE");
    }

    #[tokio::test]
    async fn test_ctcp_only_message_emits_no_text_event() {
        let client = client();
        let mut ctcp = capture(&client, "CTCP*");
        let mut privmsg = capture(&client, "PRIVMSG");

        client.handle_line(":bob!b@h PRIVMSG alice :\x01VERSION\x01");
        let event = next(&mut ctcp).await;
        assert_eq!(event.name, "CTCP_VERSION");
        assert_eq!(event.data, EventData::Ctcp(None));

        client.handle_line(":bob!b@h NOTICE alice :\x01PING 123\x01");
        let event = next(&mut ctcp).await;
        assert_eq!(event.name, "CTCPREPLY_PING");
        assert_eq!(event.data, EventData::Ctcp(Some("123".to_string())));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(privmsg.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_ctcp_with_text_emits_both() {
        let client = client();
        let mut action = capture(&client, "CTCP_ACTION");
        let mut public = capture(&client, "PUBMSG");

        client.handle_line(":bob!b@h PRIVMSG #rust :hi \x01ACTION waves\x01 there");
        assert_eq!(next(&mut action).await.data, EventData::Ctcp(Some("waves".to_string())));
        assert_eq!(next(&mut public).await.data, EventData::Text("hi   there".to_string()));
    }

    #[tokio::test]
    async fn test_targeted_commands() {
        let client = client();
        let mut kick = capture(&client, "KICK");
        let mut quit = capture(&client, "QUIT");

        client.handle_line(":op!o@h KICK #rust bob :behave");
        let event = next(&mut kick).await;
        assert_eq!(event.target.as_deref(), Some("#rust"));
        assert_eq!(event.data.args(), ["bob", "behave"]);

        client.handle_line(":bob!b@h QUIT :gone");
        let event = next(&mut quit).await;
        assert_eq!(event.target, None);
        assert_eq!(event.data.args(), ["gone"]);
    }

    #[tokio::test]
    async fn test_nick_tracking() {
        let client = client();

        client.handle_line(":irc.example.net 001 alice_ :Welcome");
        eventually(|| client.nickname() == "alice_").await;

        client.handle_line(":ALICE_!a@h NICK :alice2");
        assert_eq!(client.nickname(), "alice2");

        client.handle_line(":bob!b@h NICK :carol");
        assert_eq!(client.nickname(), "alice2");
    }

    #[tokio::test]
    async fn test_isupport_changes_channel_detection() {
        let client = client();
        let mut public = capture(&client, "PUBMSG");
        let mut private = capture(&client, "PRIVMSG");

        client.handle_line(":irc.example.net 005 alice CHANTYPES=# NICKLEN=30 :are supported");
        eventually(|| client.isupport().nicklen() == Some(30)).await;
        assert_eq!(client.channel_prefixes(), "#");

        client.handle_line(":bob!b@h PRIVMSG &local :hi");
        assert_eq!(next(&mut private).await.target.as_deref(), Some("&local"));
        client.handle_line(":bob!b@h PRIVMSG #rust :hi");
        assert_eq!(next(&mut public).await.target.as_deref(), Some("#rust"));
    }

    #[tokio::test]
    async fn test_short_privmsg_is_tolerated() {
        let client = client();
        let mut private = capture(&client, "PRIVMSG");

        client.handle_line(":bob!b@h PRIVMSG alice");
        assert_eq!(next(&mut private).await.data, EventData::Text(String::new()));

        client.handle_line("PRIVMSG");
        assert_eq!(next(&mut private).await.data, EventData::Args(vec![]));
    }
}
