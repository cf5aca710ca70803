//! Mock frame source for testing and demos.

use super::{FrameDescriptor, FrameSource, Poll, SourceError};
use std::collections::VecDeque;
use std::time::Duration;

/// Mock source that replays a script of poll outcomes.
///
/// Once the script is exhausted it repeats a fixed outcome, so a mock
/// can model a steady stream, a source that never delivers, or a
/// source that flaps and recovers.
#[derive(Debug, Default)]
pub struct MockSource {
    script: VecDeque<Result<Poll, SourceError>>,
    repeating: Option<Poll>,
    last_size: u64,
    fail_size_query: bool,
    polls: u64,
}

impl MockSource {
    /// A source that delivers a steady 1080p30 UYVY stream.
    pub fn new() -> Self {
        Self::repeating(Poll::Frame(FrameDescriptor {
            width: 1920,
            height: 1080,
            frame_rate_n: 30,
            frame_rate_d: 1,
            fourcc: FrameDescriptor::fourcc_tag(b"UYVY"),
            data_size: 100_000,
        }))
    }

    /// A source that repeats the given outcome after the script runs out.
    pub fn repeating(poll: Poll) -> Self {
        Self {
            repeating: Some(poll),
            ..Self::default()
        }
    }

    /// A source that never delivers a frame.
    pub fn pending() -> Self {
        Self::repeating(Poll::Pending)
    }

    /// Queues one scripted poll outcome ahead of the repeating one.
    pub fn push(&mut self, outcome: Result<Poll, SourceError>) {
        self.script.push_back(outcome);
    }

    /// Sets the byte size reported for text-form frames.
    pub fn with_frame_size(mut self, size: u64) -> Self {
        self.last_size = size;
        self
    }

    /// Makes `last_frame_size` fail, modeling a source without the query.
    pub fn with_size_query_error(mut self) -> Self {
        self.fail_size_query = true;
        self
    }

    /// Number of polls served so far.
    pub fn poll_count(&self) -> u64 {
        self.polls
    }
}

impl FrameSource for MockSource {
    fn poll(&mut self, _timeout: Duration) -> Result<Poll, SourceError> {
        self.polls += 1;
        let outcome = match self.script.pop_front() {
            Some(outcome) => outcome,
            None => Ok(self.repeating.clone().unwrap_or(Poll::Pending)),
        };
        if let Ok(Poll::Frame(descriptor)) = &outcome {
            self.last_size = descriptor.data_size;
        }
        outcome
    }

    fn last_frame_size(&mut self) -> Result<u64, SourceError> {
        if self.fail_size_query {
            return Err(SourceError::SizeUnavailable(
                "mock source has no size query".into(),
            ));
        }
        Ok(self.last_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_polls_run_before_repeating() {
        let mut source = MockSource::pending();
        source.push(Ok(Poll::Status("Waiting for video...".into())));

        assert_eq!(
            source.poll(Duration::from_millis(1)).unwrap(),
            Poll::Status("Waiting for video...".into())
        );
        assert_eq!(source.poll(Duration::from_millis(1)).unwrap(), Poll::Pending);
        assert_eq!(source.poll_count(), 2);
    }

    #[test]
    fn test_frame_polls_update_last_size() {
        let mut source = MockSource::new();
        source.poll(Duration::from_millis(1)).unwrap();
        assert_eq!(source.last_frame_size().unwrap(), 100_000);
    }

    #[test]
    fn test_size_query_error() {
        let mut source = MockSource::pending().with_size_query_error();
        assert!(matches!(
            source.last_frame_size(),
            Err(SourceError::SizeUnavailable(_))
        ));
    }
}
