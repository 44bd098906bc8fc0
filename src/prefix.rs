//! IRC message prefix (source) types.
//!
//! A prefix identifies the origin of a message: either a user's
//! `nick!user@host` mask or a bare server host name.
//!
//! # Reference
//! - RFC 1459 Section 2.3.1: Message format

use std::fmt;

/// Origin of a message.
///
/// For a server prefix only `host` is set. A message without a prefix
/// carries an empty one (see [`Prefix::is_empty`]).
#[derive(Clone, Default, Eq, PartialEq, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Prefix {
    /// Nickname, when the prefix is a nickmask.
    pub nick: Option<String>,
    /// Username (ident), when the prefix is a nickmask.
    pub user: Option<String>,
    /// Host name, or the server name for server prefixes.
    pub host: String,
}

impl Prefix {
    /// Parse a prefix string (without the leading `:`).
    ///
    /// This is lenient: a nickmask with no `@` keeps everything after `!`
    /// as the user and leaves the host empty.
    pub fn new_from_str(s: &str) -> Self {
        match nick_from_nickmask(s) {
            Some(nick) => Prefix {
                nick: Some(nick.to_owned()),
                user: user_from_nickmask(s).map(str::to_owned),
                host: host_from_nickmask(s).unwrap_or_default().to_owned(),
            },
            None => Prefix {
                nick: None,
                user: None,
                host: s.to_owned(),
            },
        }
    }

    /// Build a user prefix from its components.
    pub fn new(nick: &str, user: &str, host: &str) -> Self {
        Prefix {
            nick: Some(nick.to_owned()),
            user: Some(user.to_owned()),
            host: host.to_owned(),
        }
    }

    /// True when the message carried no prefix at all.
    pub fn is_empty(&self) -> bool {
        self.nick.is_none() && self.user.is_none() && self.host.is_empty()
    }
}

impl From<&str> for Prefix {
    fn from(s: &str) -> Self {
        Prefix::new_from_str(s)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.nick, &self.user) {
            (Some(nick), Some(user)) => write!(f, "{}!{}@{}", nick, user, self.host),
            _ => f.write_str(&self.host),
        }
    }
}

/// Nick part of a `nick!user@host` mask.
pub fn nick_from_nickmask(mask: &str) -> Option<&str> {
    mask.split_once('!').map(|(nick, _)| nick)
}

/// `user@host` part of a nickmask.
pub fn userhost_from_nickmask(mask: &str) -> Option<&str> {
    mask.split_once('!').map(|(_, userhost)| userhost)
}

/// User part of a nickmask.
pub fn user_from_nickmask(mask: &str) -> Option<&str> {
    userhost_from_nickmask(mask).map(|uh| uh.split_once('@').map_or(uh, |(user, _)| user))
}

/// Host part of a nickmask.
pub fn host_from_nickmask(mask: &str) -> Option<&str> {
    userhost_from_nickmask(mask)
        .and_then(|uh| uh.split_once('@'))
        .map(|(_, host)| host)
}
