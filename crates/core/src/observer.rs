use std::fmt;

use log::Level;

pub const LOG_TARGET: &str = "cichecker";

/// Receives diagnostic events from a running check.
///
/// Handed to each check invocation explicitly; nothing is process-wide.
pub trait CheckObserver {
    fn record(&self, level: Level, message: fmt::Arguments<'_>);

    fn debug(&self, message: fmt::Arguments<'_>) {
        self.record(Level::Debug, message);
    }

    fn error(&self, message: fmt::Arguments<'_>) {
        self.record(Level::Error, message);
    }
}

/// Forwards events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl CheckObserver for LogObserver {
    fn record(&self, level: Level, message: fmt::Arguments<'_>) {
        log::log!(target: LOG_TARGET, level, "{}", message);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl CheckObserver for NullObserver {
    fn record(&self, _level: Level, _message: fmt::Arguments<'_>) {}
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    pub struct RecordingObserver {
        pub events: RefCell<Vec<(Level, String)>>,
    }

    impl RecordingObserver {
        pub fn count(&self, level: Level) -> usize {
            self.events
                .borrow()
                .iter()
                .filter(|(l, _)| *l == level)
                .count()
        }
    }

    impl CheckObserver for RecordingObserver {
        fn record(&self, level: Level, message: fmt::Arguments<'_>) {
            self.events.borrow_mut().push((level, message.to_string()));
        }
    }
}
