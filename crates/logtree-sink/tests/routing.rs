//! Logger trees writing through channel routes.
//!
//! These tests verify:
//! 1. Raw and formatted channel routes receive fully merged records
//! 2. Levels and selector rules decide which lines reach the channel
//! 3. Bound context and per-level routes combine across a tree

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{Receiver, bounded};
use logtree::{CallSite, FixedClock, Level, Logger, MemoryRoute, SiteInfo, Value, record};
use logtree_sink::{BackgroundWriter, channel_route, log_to, slog_to};

static SLOG_SITE: SiteInfo = SiteInfo::new("github.com::zenazn::slog", Some("TestCase"));

const PREFIX: &str = "$level=\"INFO\" $time=\"now\" ";

// ============================================================================
// Helper functions
// ============================================================================

fn root() -> Logger {
    Logger::root(FixedClock::new("now"), Arc::new(MemoryRoute::new()))
}

fn site() -> CallSite {
    CallSite::from_static(&SLOG_SITE)
}

fn expect_lines(receiver: &Receiver<String>, lines: &[String]) {
    for expected in lines {
        let actual = receiver.try_recv().expect("line was queued");
        assert_eq!(&actual, expected);
    }
    assert!(receiver.try_recv().is_err(), "unexpected extra line");
}

fn level_line(level: &str) -> String {
    format!("$level=\"{level}\" $time=\"now\"\n")
}

fn info_line(rest: &str) -> String {
    format!("{PREFIX}{rest}\n")
}

// ============================================================================
// Channel Route Tests
// ============================================================================

/// Verifies a raw route receives the merged record unformatted.
#[test]
fn raw_route_receives_merged_record() {
    let root = root();
    let (sender, receiver) = bounded(1);
    slog_to(&root, sender, &[]);

    root.info(site(), &record! { "hello" => "world" });

    let record = receiver.try_recv().unwrap();
    assert_eq!(record.level(), Some(Level::INFO));
    assert_eq!(record.get("$time"), Some(&Value::from("now")));
    assert_eq!(record.get("hello"), Some(&Value::from("world")));
    assert_eq!(record.len(), 3);
}

/// Verifies a formatted route receives one sorted, quoted line.
#[test]
fn formatted_route_receives_line() {
    let root = root();
    let (sender, receiver) = bounded(1);
    log_to(&root, sender, &[]);

    root.info(site(), &record! { "hello" => "world" });
    expect_lines(&receiver, &[info_line("hello=\"world\"")]);
}

/// Verifies a producer thread can fill the channel while the test drains it.
#[test]
fn many_lines_from_another_thread() {
    let root = root();
    let (route, receiver) = channel_route(100);
    root.set_default_route(Arc::new(route));

    let producer = {
        let root = root.clone();
        thread::spawn(move || {
            for _ in 0..100 {
                root.info(site(), &record! { "hello" => "world" });
            }
        })
    };

    let expected = info_line("hello=\"world\"");
    for _ in 0..100 {
        assert_eq!(receiver.recv().unwrap(), expected);
    }
    producer.join().expect("producer panicked");
}

/// Verifies a full channel blocks the logger until the consumer catches up.
#[test]
fn full_channel_applies_backpressure() {
    let root = root();
    let (route, receiver) = channel_route(1);
    root.set_default_route(Arc::new(route));

    let producer = {
        let root = root.clone();
        thread::spawn(move || {
            for seq in 0..20 {
                root.info(site(), &record! { "seq" => seq });
            }
        })
    };

    let received: Vec<String> = receiver.iter().take(20).collect();
    producer.join().expect("producer panicked");
    assert_eq!(received.len(), 20);
    assert_eq!(received[19], info_line("seq=\"19\""));
}

/// Verifies records logged after the receiver is gone are dropped quietly.
#[test]
fn disconnected_route_does_not_fail_logging() {
    let root = root();
    let (route, receiver) = channel_route(1);
    root.set_default_route(Arc::new(route));
    drop(receiver);

    assert!(root.info(site(), &record! {}));
}

// ============================================================================
// Level and Rule Tests
// ============================================================================

/// Verifies the default threshold drops debug lines.
#[test]
fn default_threshold_filters_debug() {
    let root = root();
    let (sender, receiver) = bounded(4);
    log_to(&root, sender, &[]);

    root.debug(site(), &record! {});
    root.info(site(), &record! {});
    root.warn(site(), &record! {});
    root.error(site(), &record! {});

    expect_lines(&receiver, &[level_line("INFO"), level_line("WARN"), level_line("ERROR")]);
}

/// Verifies package and package-function selectors change what is logged.
#[test]
fn selector_rules_change_threshold() {
    let root = root();
    let (sender, receiver) = bounded(4);
    log_to(&root, sender, &[]);
    root.set_level("example.com/not/a/real/thing", Level::ERROR);
    root.set_level("github.com/zenazn/slog", Level::WARN);

    root.debug(site(), &record! {});
    root.info(site(), &record! {});
    root.warn(site(), &record! {});
    root.error(site(), &record! {});
    expect_lines(&receiver, &[level_line("WARN"), level_line("ERROR")]);

    root.set_level("github.com/zenazn/slog.", Level::DEBUG);

    root.debug(site(), &record! {});
    root.info(site(), &record! {});
    root.warn(site(), &record! {});
    root.error(site(), &record! {});
    expect_lines(
        &receiver,
        &[level_line("DEBUG"), level_line("INFO"), level_line("WARN"), level_line("ERROR")],
    );
}

// ============================================================================
// Binding Tests
// ============================================================================

/// Verifies bound fields appear in every line and call fields override them.
#[test]
fn bound_fields_are_formatted() {
    let root = root();
    let (sender, receiver) = bounded(2);
    log_to(&root, sender, &[]);

    let sub = root.bind(record! { "hello" => "world" });
    sub.info(site(), &record! { "foo" => "bar" });
    sub.info(site(), &record! { "hello" => "universe", "color" => "red" });

    expect_lines(
        &receiver,
        &[
            info_line("foo=\"bar\" hello=\"world\""),
            info_line("color=\"red\" hello=\"universe\""),
        ],
    );
}

/// Verifies routes and rules set at different depths combine as expected.
#[test]
fn routes_and_rules_across_a_tree() {
    let root = root();
    let (sender, target) = bounded(7);
    let (sender2, target2) = bounded(3);
    log_to(&root, sender.clone(), &[]);

    let sub = root.bind(record! { "hello" => "world" });
    let subsub = sub.bind(record! { "foo" => "bar" });
    let ship = || record! { "space" => "ship" };

    root.info(site(), &ship());
    sub.info(site(), &ship());
    subsub.info(site(), &ship());

    log_to(&sub, sender2, &[Level::INFO]);
    root.info(site(), &ship());
    sub.info(site(), &ship());
    subsub.info(site(), &ship());

    sub.set_level("github.com", Level::WARN);
    root.info(site(), &ship());
    sub.info(site(), &ship());
    subsub.info(site(), &ship());

    root.set_level("github.com/zenazn/slog", Level::DEBUG);
    log_to(&subsub, sender, &[Level::INFO]);
    root.info(site(), &ship());
    subsub.info(site(), &ship());
    sub.info(site(), &ship());

    expect_lines(
        &target,
        &[
            info_line("space=\"ship\""),
            info_line("hello=\"world\" space=\"ship\""),
            info_line("foo=\"bar\" hello=\"world\" space=\"ship\""),
            info_line("space=\"ship\""),
            info_line("space=\"ship\""),
            info_line("space=\"ship\""),
            info_line("foo=\"bar\" hello=\"world\" space=\"ship\""),
        ],
    );
    expect_lines(
        &target2,
        &[
            info_line("hello=\"world\" space=\"ship\""),
            info_line("foo=\"bar\" hello=\"world\" space=\"ship\""),
            info_line("hello=\"world\" space=\"ship\""),
        ],
    );
}

// ============================================================================
// Background Writer Tests
// ============================================================================

/// Verifies a background writer produces the same bytes the route formatted.
#[test]
fn background_writer_collects_formatted_lines() {
    let (route, lines) = channel_route(8);
    let writer = BackgroundWriter::spawn("routing-test", lines, Vec::new()).unwrap();

    let root = Logger::root(FixedClock::new("now"), Arc::new(route));
    let child = root.bind(record! { "req_id" => "abc" });
    child.warn(site(), &record! { "msg" => "slow \"backend\"" });
    drop(child);
    drop(root);

    let output = String::from_utf8(writer.join().unwrap().into_inner()).unwrap();
    assert_eq!(
        output,
        "$level=\"WARN\" $time=\"now\" msg=\"slow \\\"backend\\\"\" req_id=\"abc\"\n"
    );
}
