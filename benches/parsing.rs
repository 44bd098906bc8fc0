//! Benchmarks for line parsing, quoting and ISUPPORT decoding.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use slirc_client::ctcp::{build_ctcp_string, extract_ctcp, CtcpFrame};
use slirc_client::{low_dequote, low_quote, parse_line, Isupport, Message};

/// Simple PING message
const SIMPLE_MESSAGE: &str = "PING :irc.example.com";

/// Message with prefix
const PREFIX_MESSAGE: &str = ":nick!user@host PRIVMSG #channel :Hello, world!";

/// Numeric response
const NUMERIC_RESPONSE: &str = ":irc.server.net 001 nickname :Welcome to the IRC Network nickname!user@host";

/// Message carrying CTCP frames between plain text
const CTCP_MESSAGE: &str = ":nick!user@host PRIVMSG #channel :hi \x01ACTION waves\x01 and \x01PING 1700000000\x01";

/// Typical RPL_ISUPPORT line
const ISUPPORT_LINE: &str = ":irc.server.net 005 nickname CHANTYPES=# EXCEPTS INVEX CHANMODES=eIbq,k,flj,CFLMPQScgimnprstuz CHANLIMIT=#:250 PREFIX=(ov)@+ MAXLIST=bqeI:100 MODES=4 NETWORK=Libera.Chat STATUSMSG=@+ CASEMAPPING=rfc1459 NICKLEN=16 :are supported by this server";

fn benchmark_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Line Parsing");

    for (name, line) in [
        ("simple_ping", SIMPLE_MESSAGE),
        ("with_prefix", PREFIX_MESSAGE),
        ("numeric_response", NUMERIC_RESPONSE),
        ("ctcp", CTCP_MESSAGE),
    ] {
        group.bench_with_input(BenchmarkId::new("parse_line", name), line, |b, s| {
            b.iter(|| {
                let msg = parse_line(black_box(s));
                black_box(msg)
            })
        });
    }

    group.finish();
}

fn benchmark_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("Line Serialization");

    let with_prefix: Message = PREFIX_MESSAGE.parse().unwrap();
    let numeric: Message = NUMERIC_RESPONSE.parse().unwrap();

    group.bench_function("with_prefix", |b| {
        b.iter(|| {
            let s = black_box(&with_prefix).to_string();
            black_box(s)
        })
    });

    group.bench_function("numeric_response", |b| {
        b.iter(|| {
            let s = black_box(&numeric).to_string();
            black_box(s)
        })
    });

    group.finish();
}

fn benchmark_quoting(c: &mut Criterion) {
    let mut group = c.benchmark_group("Quoting");

    let text = "line one\nline two\r\0 and a \x10 marker";
    let quoted = low_quote(text);

    group.bench_function("low_quote", |b| b.iter(|| black_box(low_quote(black_box(text)))));
    group.bench_function("low_dequote", |b| {
        b.iter(|| black_box(low_dequote(black_box(&quoted))))
    });
    group.bench_function("low_dequote_plain", |b| {
        b.iter(|| black_box(low_dequote(black_box(PREFIX_MESSAGE))))
    });

    group.finish();
}

fn benchmark_ctcp(c: &mut Criterion) {
    let mut group = c.benchmark_group("CTCP");

    let text = parse_line(CTCP_MESSAGE).args[1].clone();
    let frames = vec![
        CtcpFrame::new("ACTION", Some("waves")),
        CtcpFrame::new("VERSION", None),
    ];

    group.bench_function("extract", |b| b.iter(|| black_box(extract_ctcp(black_box(&text)))));
    group.bench_function("build", |b| {
        b.iter(|| black_box(build_ctcp_string(black_box(&frames))))
    });

    group.finish();
}

fn benchmark_isupport(c: &mut Criterion) {
    let mut group = c.benchmark_group("ISUPPORT");

    let args = parse_line(ISUPPORT_LINE).args;

    group.bench_function("from_reply_args", |b| {
        b.iter(|| black_box(Isupport::from_reply_args(black_box(&args))))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_parsing,
    benchmark_serialization,
    benchmark_quoting,
    benchmark_ctcp,
    benchmark_isupport,
);

criterion_main!(benches);
