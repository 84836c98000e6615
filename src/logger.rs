//! A [Subscriber] which logs every state accepted by a
//! [Store](crate::Store) using the [log] crate.

use crate::{Change, Subscriber, Watcher};
use std::{fmt::Debug, rc::Rc};

/// The level a [SimpleLogger] writes at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Debug
    }
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Info => log::Level::Info,
            LogLevel::Warn => log::Level::Warn,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct SimpleLogger {
    log_level: LogLevel,
    name: Option<String>,
}

impl SimpleLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    /// Prefix each message with `name`, to tell several stores apart.
    pub fn name<N: Into<String>>(mut self, name: N) -> Self {
        self.name = Some(name.into());
        self
    }

    fn prefix(&self) -> String {
        match &self.name {
            Some(name) => format!("[{}] ", name),
            None => String::new(),
        }
    }

    /// A subscriber logging each new state.
    pub fn subscriber<S: Debug + 'static>(self) -> Subscriber<S> {
        let level = log::Level::from(self.log_level);
        let prefix = self.prefix();
        Subscriber::new(move |state: Rc<S>| {
            log::log!(level, "{}next state: {:?}", prefix, state);
        })
    }

    /// A watcher logging each new state along with the store version.
    pub fn watcher<S: Debug + 'static>(self) -> Watcher<S> {
        let level = log::Level::from(self.log_level);
        let prefix = self.prefix();
        Watcher::new(move |change: Change<S>| {
            log::log!(level, "{}version {}: {:?}", prefix, change.version, change.state);
        })
    }
}
