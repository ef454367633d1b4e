//! Fixed pauses between external calls.
//!
//! Both the fetcher and the writer pace themselves to stay under the remote
//! services' rate limits. The pause is behind a trait so tests can observe it
//! without sleeping.

use std::time::Duration;

pub trait Pacer {
    fn pause(&mut self, delay: Duration);
}

/// Blocks the current thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, delay: Duration) {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

/// Records requested pauses instead of sleeping.
#[derive(Debug, Default, Clone)]
pub struct RecordingPacer {
    pub pauses: Vec<Duration>,
}

impl Pacer for RecordingPacer {
    fn pause(&mut self, delay: Duration) {
        self.pauses.push(delay);
    }
}
