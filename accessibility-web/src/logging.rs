//! `log` records forwarded to the browser console.
use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::JsValue;

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from(format_line(record.level(), record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

pub(crate) fn format_line(level: Level, target: &str, args: &std::fmt::Arguments<'_>) -> String {
    let target = target.split("::").next().unwrap_or(target);
    format!("[{target}] {level}: {args}")
}

/// Install the console logger. Safe to call more than once; only the first
/// call takes effect.
pub fn init(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_carry_crate_and_level() {
        let line = format_line(
            Level::Warn,
            "accessibility_core::engine",
            &format_args!("store wiped"),
        );
        assert_eq!(line, "[accessibility_core] WARN: store wiped");
    }
}
