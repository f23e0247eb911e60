//! A `log` backend for kernels that have nothing better than the monitor's console.
//!
//! The kernel registers a sink once with [`set_sink`], usually a function writing to the serial
//! port, and installs a [`ConsoleLogger`] with [`init`].

use core::fmt::{self, Write};

use log::{LevelFilter, Log, Metadata, Record};
use spin::Once;

/// Where formatted records go.
pub type Sink = fn(fmt::Arguments<'_>);

static SINK: Once<Sink> = Once::new();

/// Sets the output of every [`ConsoleLogger`]. Only the first call has an effect; returns false
/// if a sink was already set.
pub fn set_sink(sink: Sink) -> bool {
    let mut installed = false;
    SINK.call_once(|| {
        installed = true;
        sink
    });
    installed
}

/// Installs `logger` as the global logger.
pub fn init(logger: &'static ConsoleLogger) -> Result<(), log::SetLoggerError> {
    log::set_logger(logger)?;
    log::set_max_level(logger.level);
    Ok(())
}

/// Formats records as `[level] target file:line message`.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleLogger {
    level: LevelFilter,
}

impl ConsoleLogger {
    /// Creates a logger that passes records up to `level`.
    pub const fn new(level: LevelFilter) -> Self {
        Self { level }
    }
}

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(sink) = SINK.get() {
            sink(format_args!("{}\n", Formatted(record)));
        }
    }

    fn flush(&self) {}
}

/// The last two `::` segments of a module path.
fn short_target(target: &str) -> &str {
    match target.rmatch_indices("::").nth(1) {
        Some((i, _)) => &target[i + 2..],
        None => target,
    }
}

/// The last two components of a source path.
fn short_file(file: &str) -> &str {
    match file.rmatch_indices('/').nth(1) {
        Some((i, _)) => &file[i + 1..],
        None => file,
    }
}

struct Formatted<'r, 'a>(&'r Record<'a>);

impl fmt::Display for Formatted<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.0;
        write!(
            f,
            "[{}] {} {}:{} ",
            record.level(),
            short_target(record.target()),
            short_file(record.file().unwrap_or("unknown")),
            record.line().unwrap_or(0)
        )?;
        f.write_fmt(*record.args())
    }
}

/// Writes `record` the way [`ConsoleLogger`] does, without the trailing newline.
pub fn write_record<W: Write + ?Sized>(out: &mut W, record: &Record<'_>) -> fmt::Result {
    write!(out, "{}", Formatted(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn shortens_paths() {
        assert_eq!(short_target("kmon::session::call"), "session::call");
        assert_eq!(short_target("kmon::monitor"), "kmon::monitor");
        assert_eq!(short_target("kmon"), "kmon");
        assert_eq!(short_file("kmon/src/session.rs"), "src/session.rs");
        assert_eq!(short_file("session.rs"), "session.rs");
    }

    #[test]
    fn formats_records() {
        let mut out = String::new();
        write_record(
            &mut out,
            &Record::builder()
                .level(Level::Warn)
                .target("kcall::value::parse")
                .file(Some("kcall/src/value.rs"))
                .line(Some(42))
                .args(format_args!("unknown qualifier {}", "%q"))
                .build(),
        )
        .unwrap();
        assert_eq!(out, "[WARN] value::parse src/value.rs:42 unknown qualifier %q");
    }

    #[test]
    fn filters_by_level() {
        let logger = ConsoleLogger::new(LevelFilter::Info);
        let debug = Metadata::builder().level(Level::Debug).build();
        let error = Metadata::builder().level(Level::Error).build();
        assert!(!logger.enabled(&debug));
        assert!(logger.enabled(&error));
    }

    #[test]
    fn sink_is_set_once() {
        fn first(_: fmt::Arguments<'_>) {}
        fn second(_: fmt::Arguments<'_>) {}
        let installed = set_sink(first);
        assert!(!set_sink(second));
        // Only this test sets the sink.
        assert!(installed);
    }
}
