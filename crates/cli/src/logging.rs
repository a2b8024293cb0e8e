use chrono::{DateTime, Utc};
use log::{Level, LevelFilter, Log, Metadata, Record};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct Style {
    pub bold: &'static str,
    pub dim: &'static str,
    pub red: &'static str,
    pub yellow: &'static str,
    pub green: &'static str,
    pub reset: &'static str,
}

const COLOR: Style = Style {
    bold: "\x1b[1m",
    dim: "\x1b[2m",
    red: "\x1b[31m",
    yellow: "\x1b[33m",
    green: "\x1b[32m",
    reset: "\x1b[0m",
};

const PLAIN: Style = Style {
    bold: "",
    dim: "",
    red: "",
    yellow: "",
    green: "",
    reset: "",
};

pub fn style() -> &'static Style {
    if std::env::var_os("NO_COLOR").is_some() {
        &PLAIN
    } else {
        &COLOR
    }
}

pub fn level_color(level: Level) -> &'static str {
    let s = style();
    match level {
        Level::Error => s.red,
        Level::Warn => s.yellow,
        Level::Info => s.green,
        Level::Debug | Level::Trace => s.dim,
    }
}

/// `timestamp|target|LEVEL|message`
pub fn format_line(at: DateTime<Utc>, target: &str, level: Level, message: &str) -> String {
    format!(
        "{}|{}|{}{}{}|{}",
        at.format(TIMESTAMP_FORMAT),
        target,
        level_color(level),
        level,
        style().reset,
        message
    )
}

// stdout carries the plugin line, so diagnostics go to stderr.
struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        eprintln!(
            "{}",
            format_line(
                Utc::now(),
                record.target(),
                record.level(),
                &record.args().to_string()
            )
        );
    }

    fn flush(&self) {}
}

pub fn init(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(StderrLogger { level }))
        .map(|()| log::set_max_level(level))
}
