//! Channel name utilities.
//!
//! Whether a target names a channel depends only on its first character
//! and the server's `CHANTYPES`, which defaults to [`DEFAULT_CHANTYPES`].

/// Channel type prefixes assumed before the server advertises `CHANTYPES`.
pub const DEFAULT_CHANTYPES: &str = "!&#+";

/// Returns true if `target` starts with one of `chantypes`.
///
/// # Example
///
/// ```
/// use slirc_client::chan::{is_channel, DEFAULT_CHANTYPES};
///
/// assert!(is_channel("#rust", DEFAULT_CHANTYPES));
/// assert!(!is_channel("nick", DEFAULT_CHANTYPES));
/// assert!(!is_channel("&local", "#"));
/// ```
pub fn is_channel(target: &str, chantypes: &str) -> bool {
    target.chars().next().is_some_and(|c| chantypes.contains(c))
}

/// Extension trait for checking channel names against the default prefixes.
pub trait ChannelExt {
    /// Check if this string starts with a default channel type prefix.
    fn is_channel_name(&self) -> bool;
}

impl ChannelExt for &str {
    fn is_channel_name(&self) -> bool {
        is_channel(self, DEFAULT_CHANTYPES)
    }
}

impl ChannelExt for String {
    fn is_channel_name(&self) -> bool {
        self.as_str().is_channel_name()
    }
}
