//! The sampling loop: lifecycle, pacing, and history ownership.
//!
//! A [`SamplingLoop`] drives one monitoring session on a background
//! thread so the caller stays responsive. The thread polls the frame
//! source with a bounded timeout, normalizes each poll into a sample,
//! feeds the window aggregator, and appends completed records to the
//! shared history. `stop` signals the thread through a channel, waits
//! a bounded grace period, then runs the report emitter exactly once
//! over whatever the session accumulated.

use crate::aggregate::{AggregatedRecord, WindowAggregator};
use crate::config::{LabelMode, ReportConfig, SamplingConfig};
use crate::extract::sample_poll;
use crate::report::{self, ReportError, ReportPaths};
use crate::source::{FrameSource, Poll};
use chrono::{DateTime, Local};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Errors surfaced by the sampling-loop lifecycle.
#[derive(Debug, Error)]
pub enum SamplerError {
    /// The loop already ran; a session cannot be restarted.
    #[error("sampling session already finished; create a new loop to run again")]
    SessionFinished,
    /// The background thread could not be spawned.
    #[error("failed to spawn sampling thread: {0}")]
    Spawn(String),
    /// Report emission failed after the session stopped.
    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Lifecycle states of a sampling loop. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerState {
    /// Constructed, not yet started.
    Idle,
    /// Background thread is polling.
    Running,
    /// Session over; the loop cannot run again.
    Stopped,
}

/// Outcome of a `stop` call.
#[derive(Debug)]
pub struct StopSummary {
    /// False when the sampling thread missed the grace period and was
    /// left to finish on its own.
    pub clean_shutdown: bool,
    /// Artifacts from the emission pass, `None` when no session ran.
    pub report: Option<ReportPaths>,
}

/// Drives one start/stop monitoring session over a frame source.
///
/// The history is appended to only by the background thread while
/// running; the report emitter reads it only after the stop signal and
/// grace-period wait. One instance serves one session.
pub struct SamplingLoop<S> {
    source: Option<S>,
    sampling: SamplingConfig,
    report: ReportConfig,
    state: SamplerState,
    history: Arc<Mutex<Vec<AggregatedRecord>>>,
    worker: Option<JoinHandle<()>>,
    stop_tx: Option<mpsc::Sender<()>>,
    session_start: Option<DateTime<Local>>,
}

impl<S: FrameSource + Send + 'static> SamplingLoop<S> {
    /// Creates an idle loop over the given source.
    pub fn new(source: S, sampling: SamplingConfig, report: ReportConfig) -> Self {
        Self {
            source: Some(source),
            sampling,
            report,
            state: SamplerState::Idle,
            history: Arc::new(Mutex::new(Vec::new())),
            worker: None,
            stop_tx: None,
            session_start: None,
        }
    }

    /// Starts the background sampling thread.
    ///
    /// A no-op while already running; an error once stopped.
    pub fn start(&mut self) -> Result<(), SamplerError> {
        match self.state {
            SamplerState::Running => Ok(()),
            SamplerState::Stopped => Err(SamplerError::SessionFinished),
            SamplerState::Idle => {
                let Some(source) = self.source.take() else {
                    return Err(SamplerError::SessionFinished);
                };
                let (stop_tx, stop_rx) = mpsc::channel();
                let history = Arc::clone(&self.history);
                let config = self.sampling.clone();
                let started_at = Instant::now();
                self.session_start = Some(Local::now());

                let worker = thread::Builder::new()
                    .name("ndi-sampler".into())
                    .spawn(move || run_worker(source, config, history, stop_rx, started_at))
                    .map_err(|e| SamplerError::Spawn(e.to_string()))?;

                self.worker = Some(worker);
                self.stop_tx = Some(stop_tx);
                self.state = SamplerState::Running;
                tracing::info!("sampling session started");
                Ok(())
            }
        }
    }

    /// Stops the session and emits the report.
    ///
    /// Signals the background thread, waits up to the configured grace
    /// period, then runs one report-emission pass over the history.
    /// Never blocks past the grace period: a thread that fails to exit
    /// in time is surfaced as `clean_shutdown = false` and left to
    /// finish on its own. Idempotent; a second call (or a call before
    /// `start`) emits nothing.
    pub fn stop(&mut self) -> Result<StopSummary, SamplerError> {
        match self.state {
            SamplerState::Idle | SamplerState::Stopped => {
                self.state = SamplerState::Stopped;
                Ok(StopSummary {
                    clean_shutdown: true,
                    report: None,
                })
            }
            SamplerState::Running => {
                self.state = SamplerState::Stopped;
                // Dropping the sender disconnects the channel, which
                // wakes the worker out of its inter-sample sleep.
                drop(self.stop_tx.take());

                let clean_shutdown = self.join_worker();
                if !clean_shutdown {
                    tracing::warn!(
                        grace_ms = self.sampling.stop_grace_ms,
                        "sampling thread did not stop within the grace period; proceeding with report"
                    );
                }

                let history = self.history();
                let session_start = self.session_start.unwrap_or_else(Local::now);
                let paths = report::emit(&history, session_start, &self.report.output_dir)?;
                tracing::info!(records = history.len(), "sampling session stopped");
                Ok(StopSummary {
                    clean_shutdown,
                    report: Some(paths),
                })
            }
        }
    }

    /// Whether the background thread is currently sampling.
    pub fn is_running(&self) -> bool {
        self.state == SamplerState::Running
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SamplerState {
        self.state
    }

    /// Snapshot of the aggregated history.
    ///
    /// Complete and final only after `stop` has returned; while the
    /// session runs this may race with an in-flight window.
    pub fn history(&self) -> Vec<AggregatedRecord> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Waits up to the grace period for the worker to finish.
    fn join_worker(&mut self) -> bool {
        let Some(worker) = self.worker.take() else {
            return true;
        };
        let deadline = Instant::now() + self.sampling.stop_grace();
        while !worker.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        if worker.is_finished() {
            let _ = worker.join();
            true
        } else {
            false
        }
    }
}

fn run_worker<S: FrameSource>(
    mut source: S,
    config: SamplingConfig,
    history: Arc<Mutex<Vec<AggregatedRecord>>>,
    stop_rx: Receiver<()>,
    started_at: Instant,
) {
    let mut aggregator = WindowAggregator::new(config.window_size);
    let poll_timeout = config.poll_timeout();
    let sample_interval = config.sample_interval();

    loop {
        // Cancellation is checked between polls, never mid-poll.
        match stop_rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => break,
            Err(TryRecvError::Empty) => {}
        }

        let poll = match source.poll(poll_timeout) {
            Ok(poll) => poll,
            Err(e) => {
                // The source may flap and recover; keep polling.
                tracing::warn!(error = %e, "frame source poll failed; retrying");
                Poll::Pending
            }
        };
        let sample = sample_poll(poll, &mut source);
        let label = time_label(config.label_mode, started_at);

        if let Some(record) = aggregator.add_sample(&sample, &label) {
            tracing::info!(
                label = %record.time_label,
                fps = record.frame_rate_fps,
                codec = %record.codec,
                bitrate_mbps = record.bitrate_mbps,
                "window aggregated"
            );
            history
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(record);
        }

        match stop_rx.recv_timeout(sample_interval) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
}

fn time_label(mode: LabelMode, started_at: Instant) -> String {
    match mode {
        LabelMode::WallClock => Local::now().format("%H:%M:%S").to_string(),
        LabelMode::Elapsed => {
            let secs = started_at.elapsed().as_secs();
            format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{MockSource, SourceError};

    fn fast_config(window_size: usize) -> SamplingConfig {
        SamplingConfig {
            window_size,
            poll_timeout_ms: 10,
            sample_interval_ms: 100,
            stop_grace_ms: 2000,
            label_mode: LabelMode::Elapsed,
        }
    }

    fn report_into(dir: &tempfile::TempDir) -> ReportConfig {
        ReportConfig {
            output_dir: dir.path().to_path_buf(),
        }
    }

    fn wait_for_records<S: FrameSource + Send + 'static>(
        sampler: &SamplingLoop<S>,
        count: usize,
    ) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while sampler.history().len() < count {
            assert!(Instant::now() < deadline, "timed out waiting for records");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_stop_before_start_emits_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut sampler = SamplingLoop::new(MockSource::new(), fast_config(10), report_into(&dir));

        let summary = sampler.stop().unwrap();
        assert!(summary.clean_shutdown);
        assert!(summary.report.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_start_while_running_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut sampler = SamplingLoop::new(MockSource::new(), fast_config(10), report_into(&dir));

        sampler.start().unwrap();
        assert!(sampler.is_running());
        sampler.start().unwrap();
        assert!(sampler.is_running());
        sampler.stop().unwrap();
    }

    #[test]
    fn test_start_after_stop_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut sampler = SamplingLoop::new(MockSource::new(), fast_config(10), report_into(&dir));

        sampler.start().unwrap();
        sampler.stop().unwrap();
        assert_eq!(sampler.state(), SamplerState::Stopped);
        assert!(matches!(sampler.start(), Err(SamplerError::SessionFinished)));
    }

    #[test]
    fn test_session_records_and_emits_once() {
        let dir = tempfile::tempdir().unwrap();
        // Window of one: the first poll completes a window immediately,
        // and the long interval keeps a second record from forming
        // before stop.
        let config = SamplingConfig {
            sample_interval_ms: 60_000,
            ..fast_config(1)
        };
        let mut sampler = SamplingLoop::new(MockSource::new(), config, report_into(&dir));

        sampler.start().unwrap();
        wait_for_records(&sampler, 1);
        let summary = sampler.stop().unwrap();

        assert!(summary.clean_shutdown);
        let history = sampler.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].frame_rate_fps, 30.0);
        assert_eq!(history[0].codec, "UYVY");
        // 100_000 bytes * 8 / 10_000_000
        assert_eq!(history[0].bitrate_mbps, 0.08);

        let report = summary.report.expect("running session emits a report");
        assert!(report.chart.is_none(), "single record must not chart");
        let content = std::fs::read_to_string(&report.log).unwrap();
        assert!(content.contains("30.00 fps, Codec: UYVY, Bitrate: 0.08 Mbps"));

        // Second stop is a no-op: no second emission.
        let files_before = std::fs::read_dir(dir.path()).unwrap().count();
        let again = sampler.stop().unwrap();
        assert!(again.report.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), files_before);
    }

    #[test]
    fn test_source_failures_keep_the_session_alive() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = MockSource::new();
        source.push(Err(SourceError::CaptureFailed("dropped".into())));
        source.push(Err(SourceError::CaptureFailed("dropped".into())));

        // Interval long enough that stop lands before a second window.
        let config = SamplingConfig {
            sample_interval_ms: 200,
            ..fast_config(3)
        };
        let mut sampler = SamplingLoop::new(source, config, report_into(&dir));
        sampler.start().unwrap();
        wait_for_records(&sampler, 1);
        sampler.stop().unwrap();

        // Two failed polls degrade to pending samples; the third sample
        // is a real frame and wins the window.
        let history = sampler.history();
        assert_eq!(history[0].codec, "UYVY");
        assert_eq!(history[0].frame_rate_fps, 30.0);
    }

    #[test]
    fn test_status_text_source_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let source = MockSource::repeating(Poll::Status("1920x1080 @ 29.97fps [NV12]".into()))
            .with_frame_size(50_000);

        // Interval long enough that stop lands before a second window.
        let config = SamplingConfig {
            sample_interval_ms: 200,
            ..fast_config(2)
        };
        let mut sampler = SamplingLoop::new(source, config, report_into(&dir));
        sampler.start().unwrap();
        wait_for_records(&sampler, 1);
        sampler.stop().unwrap();

        let history = sampler.history();
        assert_eq!(history[0].frame_rate_fps, 29.97);
        assert_eq!(history[0].codec, "NV12");
        // 2 * 50_000 bytes * 8 / 10_000_000
        assert_eq!(history[0].bitrate_mbps, 0.08);
    }

    #[test]
    fn test_stop_survives_a_stuck_source() {
        struct StuckSource;
        impl FrameSource for StuckSource {
            fn poll(&mut self, _timeout: Duration) -> Result<Poll, SourceError> {
                // Ignores its timeout, like a misbehaving native call.
                thread::sleep(Duration::from_secs(30));
                Ok(Poll::Pending)
            }
            fn last_frame_size(&mut self) -> Result<u64, SourceError> {
                Ok(0)
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let config = SamplingConfig {
            stop_grace_ms: 50,
            ..fast_config(10)
        };
        let mut sampler = SamplingLoop::new(StuckSource, config, report_into(&dir));
        sampler.start().unwrap();
        thread::sleep(Duration::from_millis(20));

        let started = Instant::now();
        let summary = sampler.stop().unwrap();
        assert!(!summary.clean_shutdown);
        assert!(started.elapsed() < Duration::from_secs(5), "stop must not hang");
        assert!(summary.report.is_some(), "report still emitted after timeout");
    }
}
