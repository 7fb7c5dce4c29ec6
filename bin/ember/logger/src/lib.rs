// Copyright 2015-2020 Parity Technologies (UK) Ltd.
// This file is part of Ember.

// Ember is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// Ember is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with Ember.  If not, see <http://www.gnu.org/licenses/>.

//! Logger for Ember executables: `env_logger`-style filtering, coloured
//! stderr output, and a rotating in-memory tail for diagnostics.

use std::{collections::VecDeque, env, sync::Arc};

use ansi_term::Colour;
use log::{Level, LevelFilter, Log, Metadata, Record};
use parking_lot::RwLock;

/// Lines kept in the in-memory tail.
const LOG_TAIL: usize = 128;

/// Logger configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `RUST_LOG`-style directive string.
    pub mode: Option<String>,
    /// Whether colour output is allowed.
    pub color: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mode: None,
            color: true,
        }
    }
}

/// Keeps the most recent log lines for `debug`-style introspection.
pub struct RotatingLogger {
    logs: RwLock<VecDeque<String>>,
}

impl RotatingLogger {
    fn new() -> Self {
        RotatingLogger {
            logs: RwLock::new(VecDeque::with_capacity(LOG_TAIL)),
        }
    }

    fn append(&self, line: String) {
        let mut logs = self.logs.write();
        if logs.len() == LOG_TAIL {
            logs.pop_front();
        }
        logs.push_back(line);
    }

    /// Most recent lines, oldest first.
    pub fn tail(&self) -> Vec<String> {
        self.logs.read().iter().cloned().collect()
    }
}

struct EmberLogger {
    inner: env_logger::Logger,
    tail: Arc<RotatingLogger>,
    color: bool,
}

impl EmberLogger {
    fn paint_level(&self, level: Level) -> String {
        if !self.color {
            return level.to_string();
        }
        let colour = match level {
            Level::Error => Colour::Red,
            Level::Warn => Colour::Yellow,
            Level::Info => Colour::Green,
            Level::Debug => Colour::Cyan,
            Level::Trace => Colour::White,
        };
        colour.paint(level.to_string()).to_string()
    }
}

impl Log for EmberLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let timestamp = time::strftime("%Y-%m-%d %H:%M:%S", &time::now())
            .expect("time is valid; qed");
        let plain = format!(
            "{} {} {}  {}",
            timestamp,
            record.level(),
            record.target(),
            record.args()
        );
        self.tail.append(plain.clone());
        if self.color {
            eprintln!(
                "{} {} {}  {}",
                timestamp,
                self.paint_level(record.level()),
                record.target(),
                record.args()
            );
        } else {
            eprintln!("{}", plain);
        }
    }

    fn flush(&self) {}
}

/// Install the global logger. Directives are taken from `RUST_LOG`, then
/// from the configured mode string.
pub fn setup_log(config: &Config) -> Result<Arc<RotatingLogger>, String> {
    let mut builder = env_logger::Builder::new();
    builder.filter(None, LevelFilter::Info);
    if let Ok(directives) = env::var("RUST_LOG") {
        builder.parse(&directives);
    }
    if let Some(ref mode) = config.mode {
        builder.parse(mode);
    }

    let inner = builder.build();
    let max_level = inner.filter();
    let tail = Arc::new(RotatingLogger::new());
    let logger = EmberLogger {
        inner,
        tail: tail.clone(),
        color: config.color && atty::is(atty::Stream::Stderr),
    };
    log::set_boxed_logger(Box::new(logger)).map_err(|e| format!("{}", e))?;
    log::set_max_level(max_level);
    Ok(tail)
}
