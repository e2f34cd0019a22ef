use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// How often timed phases refresh and check for expiry.
pub const TICK_INTERVAL: Duration = Duration::from_millis(250);

/// Everything the event loop reacts to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// The input source is gone; no further keys will arrive.
    InputClosed,
}

/// Source of terminal input.
pub trait EventSource: Send + 'static {
    /// Waits at most `timeout` for the next input event.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;
}

/// Reads crossterm events on a background thread. Only key presses are
/// forwarded; release and repeat events are dropped.
pub struct CrosstermEventSource {
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let ev = match event::read() {
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => AppEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "terminal input failed");
                    break;
                }
            };
            if tx.send(ev).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-fed source for headless runs.
pub struct TestEventSource {
    rx: Receiver<AppEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(TICK_INTERVAL)
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Turns input plus silence into a stream of events: whatever arrives within
/// one tick interval, otherwise [`AppEvent::Tick`].
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn step(&self) -> AppEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) => AppEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => AppEvent::InputClosed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn idle_step_yields_tick() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(1)));
        assert_eq!(runner.step(), AppEvent::Tick);
    }

    #[test]
    fn queued_events_come_out_in_order() {
        let (tx, rx) = mpsc::channel();
        let key = KeyEvent::new(KeyCode::Char('b'), KeyModifiers::NONE);
        tx.send(AppEvent::Key(key)).unwrap();
        tx.send(AppEvent::Resize).unwrap();
        let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(10)));

        assert_eq!(runner.step(), AppEvent::Key(key));
        assert_eq!(runner.step(), AppEvent::Resize);
        assert_eq!(runner.step(), AppEvent::Tick);
    }

    #[test]
    fn disconnected_source_reports_closed_input() {
        let (tx, rx) = mpsc::channel::<AppEvent>();
        tx.send(AppEvent::Resize).unwrap();
        drop(tx);
        let runner = Runner::new(TestEventSource::new(rx), FixedTicker::default());
        assert_eq!(runner.step(), AppEvent::Resize);
        assert_eq!(runner.step(), AppEvent::InputClosed);
        assert_eq!(runner.step(), AppEvent::InputClosed);
    }
}
