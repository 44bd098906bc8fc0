//! ISUPPORT (`RPL_ISUPPORT`, numeric 005) parsing.
//!
//! Servers advertise their limits and features over one or more 005
//! replies. Each token is either a bare flag (`EXCEPTS`) or `KEY=value`;
//! well-known keys get a typed value, anything else keeps its raw string.
//! Replies accumulate into one [`Isupport`] via [`Isupport::merge`].
//!
//! ```
//! use slirc_client::isupport::{Isupport, Scalar};
//!
//! let caps = Isupport::parse_tokens(["PREFIX=(ov)@+", "CHANLIMIT=#:25,&:10", "EXCEPTS"]);
//! assert_eq!(caps.prefix(), Some(&[('o', '@'), ('v', '+')][..]));
//! assert_eq!(caps.map("CHANLIMIT").and_then(|m| m.get("#")), Some(&Scalar::Int(25)));
//! assert!(caps.has_flag("EXCEPTS"));
//! ```

use std::collections::{BTreeMap, HashMap};

use crate::chan::DEFAULT_CHANTYPES;

const CHAR_KEYS: &[&str] = &["CHANTYPES", "STATUSMSG"];
const LIST_KEYS: &[&str] = &["CHANMODES", "CMDS", "STD"];
const INTEGER_KEYS: &[&str] = &[
    "MODES",
    "MAXCHANNELS",
    "NICKLEN",
    "MAXBANS",
    "TOPICLEN",
    "KICKLEN",
    "CHANNELLEN",
    "CHIDLEN",
    "SILENCE",
    "AWAYLEN",
    "WATCH",
];
const MAP_KEYS: &[&str] = &["CHANLIMIT", "MAXLIST", "IDCHAN", "TARGMAX"];

/// A loosely typed sub-value: the first of integer, float or string that
/// the text parses as.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    pub fn coerce(s: &str) -> Self {
        if let Ok(n) = s.parse::<i64>() {
            Scalar::Int(n)
        } else if let Ok(x) = s.parse::<f64>() {
            Scalar::Float(x)
        } else {
            Scalar::Str(s.to_owned())
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(n) => Some(*n),
            _ => None,
        }
    }
}

/// Decoded value of a `KEY=value` token.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IsupportValue {
    /// Numeric limits such as `NICKLEN`.
    Integer(i64),
    /// `CHANTYPES` and `STATUSMSG`.
    Chars(Vec<char>),
    /// `PREFIX`: (mode letter, status symbol) pairs, highest rank first.
    Prefix(Vec<(char, char)>),
    /// `CHANMODES`, `CMDS`, `STD`.
    List(Vec<Scalar>),
    /// `CHANLIMIT`, `MAXLIST`, `IDCHAN`, `TARGMAX`.
    Map(BTreeMap<String, Scalar>),
    /// Unknown keys, and known keys whose value did not fit their shape.
    Raw(String),
}

impl IsupportValue {
    /// Decode `value` according to the rule for `key` (already upper-cased).
    pub fn decode(key: &str, value: &str) -> Self {
        if key == "PREFIX" {
            let chars: Vec<char> = value.chars().filter(|c| *c != '(' && *c != ')').collect();
            let half = chars.len() / 2;
            IsupportValue::Prefix((0..half).map(|i| (chars[i], chars[i + half])).collect())
        } else if CHAR_KEYS.contains(&key) {
            IsupportValue::Chars(value.chars().collect())
        } else if LIST_KEYS.contains(&key) {
            IsupportValue::List(value.split(',').map(Scalar::coerce).collect())
        } else if INTEGER_KEYS.contains(&key) {
            match value.parse() {
                Ok(n) => IsupportValue::Integer(n),
                Err(_) => IsupportValue::Raw(value.to_owned()),
            }
        } else if MAP_KEYS.contains(&key) {
            IsupportValue::Map(
                value
                    .split(',')
                    .map(|part| {
                        let (sub_key, sub_value) = part.split_once(':').unwrap_or((part, ""));
                        (sub_key.to_owned(), Scalar::coerce(sub_value))
                    })
                    .collect(),
            )
        } else {
            IsupportValue::Raw(value.to_owned())
        }
    }
}

/// Accumulated server capabilities.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Isupport {
    flags: Vec<String>,
    entries: HashMap<String, IsupportValue>,
}

impl Isupport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse bare tokens, e.g. `["NICKLEN=30", "EXCEPTS"]`.
    pub fn parse_tokens<'a, I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut isupport = Isupport::new();
        for token in tokens {
            match token.split_once('=') {
                Some((key, value)) => {
                    let key = key.to_uppercase();
                    let value = IsupportValue::decode(&key, value);
                    isupport.entries.insert(key, value);
                }
                None => isupport.flags.push(token.to_owned()),
            }
        }
        isupport
    }

    /// Parse the arguments of a 005 reply.
    ///
    /// The first argument (our nickname) and the last (`are supported by
    /// this server`) are not tokens and are skipped.
    pub fn from_reply_args<S: AsRef<str>>(args: &[S]) -> Self {
        if args.len() < 3 {
            return Isupport::new();
        }
        Self::parse_tokens(args[1..args.len() - 1].iter().map(AsRef::as_ref))
    }

    /// Fold another reply into this one; its values win.
    pub fn merge(&mut self, other: Isupport) {
        self.flags.extend(other.flags);
        self.entries.extend(other.entries);
    }

    pub fn get(&self, key: &str) -> Option<&IsupportValue> {
        self.entries.get(&key.to_uppercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &IsupportValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f.eq_ignore_ascii_case(flag))
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty() && self.entries.is_empty()
    }

    pub fn integer(&self, key: &str) -> Option<i64> {
        match self.get(key)? {
            IsupportValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            IsupportValue::Raw(s) => Some(s),
            _ => None,
        }
    }

    pub fn chars(&self, key: &str) -> Option<&[char]> {
        match self.get(key)? {
            IsupportValue::Chars(c) => Some(c),
            _ => None,
        }
    }

    pub fn list(&self, key: &str) -> Option<&[Scalar]> {
        match self.get(key)? {
            IsupportValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn map(&self, key: &str) -> Option<&BTreeMap<String, Scalar>> {
        match self.get(key)? {
            IsupportValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn prefix(&self) -> Option<&[(char, char)]> {
        match self.get("PREFIX")? {
            IsupportValue::Prefix(p) => Some(p),
            _ => None,
        }
    }

    pub fn chantypes(&self) -> Option<&[char]> {
        self.chars("CHANTYPES")
    }

    pub fn statusmsg(&self) -> Option<&[char]> {
        self.chars("STATUSMSG")
    }

    pub fn nicklen(&self) -> Option<i64> {
        self.integer("NICKLEN")
    }

    pub fn network(&self) -> Option<&str> {
        self.raw("NETWORK")
    }

    pub fn casemapping(&self) -> Option<&str> {
        self.raw("CASEMAPPING")
    }

    /// Channel type prefixes: `CHANTYPES` once known, the RFC default before.
    pub fn channel_prefixes(&self) -> String {
        match self.chantypes() {
            Some(types) => types.iter().collect(),
            None => DEFAULT_CHANTYPES.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix() {
        let caps = Isupport::parse_tokens(["PREFIX=(ov)@+"]);
        assert_eq!(caps.prefix(), Some(&[('o', '@'), ('v', '+')][..]));

        let caps = Isupport::parse_tokens(["PREFIX=(qaohv)~&@%+"]);
        let prefix = caps.prefix().unwrap();
        assert_eq!(prefix.len(), 5);
        assert_eq!(prefix[0], ('q', '~'));
        assert_eq!(prefix[4], ('v', '+'));
    }

    #[test]
    fn test_prefix_odd_and_empty() {
        let caps = Isupport::parse_tokens(["PREFIX=(ov)@"]);
        assert_eq!(caps.prefix(), Some(&[('o', 'v')][..]));

        let caps = Isupport::parse_tokens(["PREFIX="]);
        assert_eq!(caps.prefix(), Some(&[][..]));
    }

    #[test]
    fn test_chantypes_and_statusmsg() {
        let caps = Isupport::parse_tokens(["CHANTYPES=#&", "STATUSMSG=@+"]);
        assert_eq!(caps.chantypes(), Some(&['#', '&'][..]));
        assert_eq!(caps.statusmsg(), Some(&['@', '+'][..]));
        assert_eq!(caps.channel_prefixes(), "#&");
        assert_eq!(Isupport::new().channel_prefixes(), "!&#+");
    }

    #[test]
    fn test_list_coercion() {
        let caps = Isupport::parse_tokens(["CHANMODES=eIbq,k,flj,CFLMPQcgimnprstz", "STD=1.5,i-d"]);
        assert_eq!(
            caps.list("CHANMODES").unwrap()[0],
            Scalar::Str("eIbq".to_string())
        );
        assert_eq!(caps.list("CHANMODES").unwrap().len(), 4);
        assert_eq!(
            caps.list("STD"),
            Some(&[Scalar::Float(1.5), Scalar::Str("i-d".to_string())][..])
        );
    }

    #[test]
    fn test_integer_keys() {
        let caps = Isupport::parse_tokens(["NICKLEN=30", "modes=4", "TOPICLEN=lots"]);
        assert_eq!(caps.nicklen(), Some(30));
        assert_eq!(caps.integer("MODES"), Some(4));
        assert_eq!(caps.get("TOPICLEN"), Some(&IsupportValue::Raw("lots".to_string())));
    }

    #[test]
    fn test_compound_keys() {
        let caps = Isupport::parse_tokens(["CHANLIMIT=#:25,&:10"]);
        let chanlimit = caps.map("CHANLIMIT").unwrap();
        assert_eq!(chanlimit.get("#"), Some(&Scalar::Int(25)));
        assert_eq!(chanlimit.get("&"), Some(&Scalar::Int(10)));

        let caps = Isupport::parse_tokens(["TARGMAX=NAMES:1,LIST:,KICK"]);
        let targmax = caps.map("TARGMAX").unwrap();
        assert_eq!(targmax.get("NAMES"), Some(&Scalar::Int(1)));
        assert_eq!(targmax.get("LIST"), Some(&Scalar::Str(String::new())));
        assert_eq!(targmax.get("KICK"), Some(&Scalar::Str(String::new())));
    }

    #[test]
    fn test_unknown_keys_and_flags() {
        let caps = Isupport::parse_tokens(["NETWORK=Libera.Chat", "EXCEPTS", "INVEX", "EXCEPTS"]);
        assert_eq!(caps.network(), Some("Libera.Chat"));
        assert_eq!(caps.flags(), &["EXCEPTS", "INVEX", "EXCEPTS"]);
        assert!(caps.has_flag("invex"));
    }

    #[test]
    fn test_from_reply_args_strips_echo_and_text() {
        let args = vec![
            "mynick".to_string(),
            "CHANTYPES=#".to_string(),
            "SAFELIST".to_string(),
            "are supported by this server".to_string(),
        ];
        let caps = Isupport::from_reply_args(&args);
        assert_eq!(caps.chantypes(), Some(&['#'][..]));
        assert_eq!(caps.flags(), &["SAFELIST"]);

        assert!(Isupport::from_reply_args(&["nick", "text"]).is_empty());
    }

    #[test]
    fn test_merge_accumulates() {
        let mut caps = Isupport::parse_tokens(["NICKLEN=9", "EXCEPTS"]);
        caps.merge(Isupport::parse_tokens(["NICKLEN=30", "CHANTYPES=#", "EXCEPTS"]));
        assert_eq!(caps.nicklen(), Some(30));
        assert_eq!(caps.chantypes(), Some(&['#'][..]));
        assert_eq!(caps.flags().len(), 2);
    }
}
