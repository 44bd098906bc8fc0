//! # slirc-client
//!
//! An asynchronous IRC client core.
//!
//! ## Features
//!
//! - IRC line parsing and serialization
//! - Low-level (M-QUOTE) and CTCP quoting, CTCP frame extraction
//! - RPL_ISUPPORT (005) parsing into typed values
//! - Glob-pattern event subscriptions (`CTCP_*`, `*NOTICE`, `[0-9]*`)
//! - Tokio connection with ordered writes, optional TLS, and a cancellable
//!   task pool
//! - A client that registers, answers PING and tracks its nickname

//! ## Quick Start
//!
//! ### Parsing lines
//!
//! ```rust
//! use slirc_client::parse_line;
//!
//! let msg = parse_line(":nick!user@host PRIVMSG #channel :Hello there");
//! assert_eq!(msg.command, "PRIVMSG");
//! assert_eq!(msg.prefix.nick.as_deref(), Some("nick"));
//! assert_eq!(msg.args, vec!["#channel", "Hello there"]);
//! ```
//!
//! ### CTCP
//!
//! ```rust
//! use slirc_client::ctcp::{build_ctcp_string, extract_ctcp, CtcpFrame};
//!
//! let text = build_ctcp_string(&[CtcpFrame::new("ACTION", Some("waves"))]);
//! assert_eq!(text, "\x01ACTION waves\x01");
//!
//! let (normal, frames) = extract_ctcp(&text);
//! assert!(normal.is_empty());
//! assert_eq!(frames[0].data.as_deref(), Some("waves"));
//! ```

#![deny(clippy::all)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod casemap;
pub mod chan;
pub mod command;
pub mod ctcp;
pub mod error;
pub mod isupport;
pub mod message;
pub mod prefix;
pub mod quote;
pub mod util;

#[cfg(feature = "tokio")]
pub mod client;
#[cfg(feature = "tokio")]
pub mod connection;
#[cfg(feature = "tokio")]
pub mod event;
#[cfg(feature = "tokio")]
pub mod line;
#[cfg(feature = "tokio")]
pub mod pool;

pub use self::casemap::{irc_eq, irc_to_lower};
pub use self::chan::{is_channel, ChannelExt};
pub use self::command::Commands;
pub use self::ctcp::{build_ctcp_string, extract_ctcp, CtcpFrame};
pub use self::error::{ClientError, Result};
pub use self::isupport::{Isupport, IsupportValue, Scalar};
pub use self::message::{parse_line, Message};
pub use self::prefix::Prefix;
pub use self::quote::{low_dequote, low_quote};

#[cfg(feature = "tokio")]
pub use self::client::{Client, ClientConfig};
#[cfg(feature = "tokio")]
pub use self::connection::{
    Connection, ConnectionHandler, ConnectionState, ConnectOptions, TlsOptions,
};
#[cfg(feature = "tokio")]
pub use self::event::{handler, Event, EventBus, EventData, EventHandler};
#[cfg(feature = "tokio")]
pub use self::line::LineCodec;
#[cfg(feature = "tokio")]
pub use self::pool::TaskPool;
