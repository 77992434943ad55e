//! Shared fixtures for the integration tests

#![allow(dead_code)]

use upslink_core::config::LinkConfig;
use upslink_core::protocol::mock::{EventLog, MockDelay, MockTransport};
use upslink_core::protocol::UpsLink;

pub type MockLink = UpsLink<MockTransport, MockDelay>;

/// Open link whose UPS answers successive commands with `replies`.
/// An empty reply means the UPS stays silent.
pub fn open_link(replies: &[&[u8]]) -> (MockLink, EventLog) {
    let log = EventLog::default();
    let mut transport = MockTransport::with_log(log.clone());
    for reply in replies {
        transport.push_reply(reply);
    }
    let mut ups = UpsLink::new(
        transport,
        MockDelay::with_log(log.clone()),
        LinkConfig::for_port("mock"),
    );
    ups.open().expect("mock transport opens");
    (ups, log)
}

/// Same reply for `n` consecutive commands
pub fn repeated(reply: &[u8], n: usize) -> Vec<&[u8]> {
    vec![reply; n]
}
