//! Outgoing IRC commands.
//!
//! [`Commands`] turns method calls into protocol lines. Implementors supply
//! [`Commands::send`]; everything else is provided. Optional parameters that
//! are `None` or empty are left out of the line.

use crate::chan::{is_channel, DEFAULT_CHANTYPES};
use crate::ctcp::{build_ctcp_string, CtcpFrame};
use crate::util::{wrap_text, DEFAULT_LINE_BUDGET};

/// Join `cmd` and `args`; the last argument gets a `:` only if it needs one.
pub fn build_cmd(cmd: &str, args: &[&str]) -> String {
    let mut line = String::from(cmd);
    let Some((trailing, middle)) = args.split_last() else {
        return line;
    };

    for param in middle {
        line.push(' ');
        line.push_str(param);
    }

    line.push(' ');
    if trailing.is_empty() || trailing.contains(' ') || trailing.starts_with(':') {
        line.push(':');
    }
    line.push_str(trailing);
    line
}

/// Join `cmd` and `args`, always sending the last argument as trailing.
pub fn build_cmd_freeform(cmd: &str, args: &[&str]) -> String {
    match args.split_last() {
        Some((suffix, middle)) => {
            let mut line = String::from(cmd);
            for arg in middle {
                line.push(' ');
                line.push_str(arg);
            }
            line.push_str(" :");
            line.push_str(suffix);
            line
        }
        None => cmd.to_owned(),
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Append positional optional parameters up to the first absent one.
fn with_optional<'a>(mut args: Vec<&'a str>, optional: &[Option<&'a str>]) -> Vec<&'a str> {
    args.extend(optional.iter().map_while(|v| present(*v)));
    args
}

/// Command vocabulary of an IRC client.
pub trait Commands {
    /// Send one raw line. The line must not carry its CRLF.
    fn send(&self, line: &str);

    /// Channel type characters used by [`Commands::join_channel`].
    fn channel_prefixes(&self) -> String {
        DEFAULT_CHANTYPES.to_owned()
    }

    /// Maximum characters of one PRIVMSG or NOTICE body.
    fn line_budget(&self) -> usize {
        DEFAULT_LINE_BUDGET
    }

    /// CTCP `ACTION` (`/me`).
    fn action(&self, target: &str, action: &str) {
        self.ctcp(target, &[CtcpFrame::new("ACTION", Some(action))]);
    }

    fn admin(&self, server: Option<&str>) {
        self.send(&build_cmd("ADMIN", &with_optional(vec![], &[server])));
    }

    /// Send CTCP requests to `target` in one PRIVMSG.
    fn ctcp(&self, target: &str, frames: &[CtcpFrame]) {
        self.privmsg(target, &build_ctcp_string(frames));
    }

    /// Send CTCP replies to `target` in one NOTICE.
    fn ctcp_reply(&self, target: &str, frames: &[CtcpFrame]) {
        self.notice(target, &build_ctcp_string(frames));
    }

    fn globops(&self, text: &str) {
        self.send(&build_cmd_freeform("GLOBOPS", &[text]));
    }

    fn info(&self, server: Option<&str>) {
        self.send(&build_cmd("INFO", &with_optional(vec![], &[server])));
    }

    fn invite(&self, nick: &str, channel: &str) {
        self.send(&build_cmd("INVITE", &[nick, channel]));
    }

    fn ison(&self, nicks: &[&str]) {
        self.send(&build_cmd("ISON", nicks));
    }

    /// Join each comma-separated channel of `channels`, adding `#` to names
    /// that do not start with a channel type.
    fn join_channel(&self, channels: &str, key: Option<&str>) {
        let prefixes = self.channel_prefixes();
        for chan in channels.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            let chan = if is_channel(chan, &prefixes) {
                chan.to_owned()
            } else {
                format!("#{}", chan)
            };
            self.send(&build_cmd("JOIN", &with_optional(vec![chan.as_str()], &[key])));
        }
    }

    fn kick(&self, channel: &str, nick: &str, comment: Option<&str>) {
        match present(comment) {
            Some(comment) => self.send(&build_cmd_freeform("KICK", &[channel, nick, comment])),
            None => self.send(&build_cmd("KICK", &[channel, nick])),
        }
    }

    fn links(&self, server_mask: &str, remote_server: Option<&str>) {
        let mut args = with_optional(vec![], &[remote_server]);
        args.push(server_mask);
        self.send(&build_cmd("LINKS", &args));
    }

    fn list(&self, channels: Option<&[&str]>, server: Option<&str>) {
        let joined = channels.map(|c| c.join(","));
        self.send(&build_cmd(
            "LIST",
            &with_optional(vec![], &[joined.as_deref(), server]),
        ));
    }

    fn lusers(&self, server: Option<&str>) {
        self.send(&build_cmd("LUSERS", &with_optional(vec![], &[server])));
    }

    fn mode(&self, target: &str, modes: &str, user: Option<&str>) {
        self.send(&build_cmd("MODE", &with_optional(vec![target, modes], &[user])));
    }

    fn motd(&self, server: Option<&str>) {
        self.send(&build_cmd("MOTD", &with_optional(vec![], &[server])));
    }

    fn names(&self, channel: Option<&str>) {
        self.send(&build_cmd("NAMES", &with_optional(vec![], &[channel])));
    }

    fn nick(&self, nickname: &str) {
        self.send(&build_cmd("NICK", &[nickname]));
    }

    /// Send `text` as NOTICEs, one per wrapped segment.
    fn notice(&self, target: &str, text: &str) {
        for part in wrap_text(text, self.line_budget()) {
            self.send(&build_cmd_freeform("NOTICE", &[target, &part]));
        }
    }

    fn oper(&self, name: &str, password: &str) {
        self.send(&build_cmd("OPER", &[name, password]));
    }

    fn part(&self, channel: &str, message: Option<&str>) {
        match present(message) {
            Some(message) => self.send(&build_cmd_freeform("PART", &[channel, message])),
            None => self.send(&build_cmd("PART", &[channel])),
        }
    }

    fn pass(&self, password: &str) {
        self.send(&build_cmd("PASS", &[password]));
    }

    fn ping(&self, target: &str, target2: Option<&str>) {
        self.send(&build_cmd("PING", &with_optional(vec![target], &[target2])));
    }

    fn pong(&self, target: &str, target2: Option<&str>) {
        self.send(&build_cmd("PONG", &with_optional(vec![target], &[target2])));
    }

    /// Send `text` as PRIVMSGs, one per wrapped segment.
    fn privmsg(&self, target: &str, text: &str) {
        for part in wrap_text(text, self.line_budget()) {
            self.send(&build_cmd_freeform("PRIVMSG", &[target, &part]));
        }
    }

    /// Send `text` to several targets at once.
    fn privmsg_many(&self, targets: &[&str], text: &str) {
        let targets = targets.join(",");
        self.privmsg(&targets, text);
    }

    fn quit(&self, message: Option<&str>) {
        match present(message) {
            Some(message) => self.send(&build_cmd_freeform("QUIT", &[message])),
            None => self.send("QUIT"),
        }
    }

    fn squit(&self, server: &str, comment: Option<&str>) {
        match present(comment) {
            Some(comment) => self.send(&build_cmd_freeform("SQUIT", &[server, comment])),
            None => self.send(&build_cmd("SQUIT", &[server])),
        }
    }

    fn stats(&self, query: &str, server: Option<&str>) {
        self.send(&build_cmd("STATS", &with_optional(vec![query], &[server])));
    }

    fn time(&self, server: Option<&str>) {
        self.send(&build_cmd("TIME", &with_optional(vec![], &[server])));
    }

    /// Query the topic of `channel`, or set it when `topic` is given. An
    /// empty topic clears it.
    fn topic(&self, channel: &str, topic: Option<&str>) {
        match topic {
            Some(topic) => self.send(&build_cmd_freeform("TOPIC", &[channel, topic])),
            None => self.send(&build_cmd("TOPIC", &[channel])),
        }
    }

    fn trace(&self, target: Option<&str>) {
        self.send(&build_cmd("TRACE", &with_optional(vec![], &[target])));
    }

    fn user(&self, username: &str, realname: &str) {
        self.send(&build_cmd_freeform("USER", &[username, "0", "*", realname]));
    }

    fn userhost(&self, nick: &str) {
        self.send(&build_cmd("USERHOST", &[nick]));
    }

    fn users(&self, server: Option<&str>) {
        self.send(&build_cmd("USERS", &with_optional(vec![], &[server])));
    }

    fn version(&self, server: Option<&str>) {
        self.send(&build_cmd("VERSION", &with_optional(vec![], &[server])));
    }

    fn wallops(&self, text: &str) {
        self.send(&build_cmd_freeform("WALLOPS", &[text]));
    }

    fn who(&self, target: &str, op: Option<&str>) {
        self.send(&build_cmd("WHO", &with_optional(vec![target], &[op])));
    }

    fn whois(&self, target: &str) {
        self.send(&build_cmd("WHOIS", &[target]));
    }

    fn whowas(&self, nick: &str, count: Option<&str>, server: Option<&str>) {
        self.send(&build_cmd("WHOWAS", &with_optional(vec![nick], &[count, server])));
    }
}
