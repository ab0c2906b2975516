//! The `Logger`/`LogLevel`/`LogEvent` filtering contract of §6
//! (`enableLogging`, `logLevel`). Log *transport* — where events actually
//! go — is an external collaborator's concern per §1, so the sink here is a
//! pluggable closure; this module commits only to level/tag filtering and
//! to guarding the mutable enable/level/tag state behind a single `Mutex`
//! with a short critical section, never held across a stage.

use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Off = 5,
}

#[derive(Debug, Clone)]
pub struct LogEvent {
    pub level: LogLevel,
    pub tag: String,
    pub message: String,
}

type Sink = Box<dyn Fn(&LogEvent) + Send + Sync>;

struct LoggerState {
    enabled: bool,
    level: LogLevel,
    tags: HashSet<String>,
    sink: Option<Sink>,
}

pub struct Logger {
    state: Mutex<LoggerState>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(LoggerState {
                enabled: false,
                level: LogLevel::Warn,
                tags: HashSet::new(),
                sink: None,
            }),
        }
    }

    pub fn set_level(&self, level: LogLevel) {
        self.state.lock().unwrap().level = level;
    }

    pub fn enable(&self) {
        self.state.lock().unwrap().enabled = true;
    }

    pub fn disable(&self) {
        self.state.lock().unwrap().enabled = false;
    }

    pub fn set_sink(&self, sink: impl Fn(&LogEvent) + Send + Sync + 'static) {
        self.state.lock().unwrap().sink = Some(Box::new(sink));
    }

    pub fn allow_tag(&self, tag: impl Into<String>) {
        self.state.lock().unwrap().tags.insert(tag.into());
    }

    pub fn clear_tags(&self) {
        self.state.lock().unwrap().tags.clear();
    }

    pub fn enabled(&self, level: LogLevel, tag: &str) -> bool {
        let state = self.state.lock().unwrap();
        Self::enabled_locked(&state, level, tag)
    }

    fn enabled_locked(state: &LoggerState, level: LogLevel, tag: &str) -> bool {
        if !state.enabled || state.level == LogLevel::Off {
            return false;
        }
        if level < state.level {
            return false;
        }
        if !state.tags.is_empty() && !state.tags.contains(tag) {
            return false;
        }
        true
    }

    pub fn log(&self, level: LogLevel, tag: &str, message: impl Into<String>) {
        let state = self.state.lock().unwrap();
        if !Self::enabled_locked(&state, level, tag) {
            return;
        }
        if let Some(sink) = &state.sink {
            sink(&LogEvent {
                level,
                tag: tag.to_string(),
                message: message.into(),
            });
        }
    }
}
