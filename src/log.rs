#![deny(clippy::mem_forget)]
use ::log::{LevelFilter, Metadata, Record, SetLoggerError};
use acmedns::APP_NAME;

static LOGGER: Logger = Logger;
struct Logger;

impl ::log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= ::log::max_level() && metadata.target().starts_with(APP_NAME)
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{}", format_record(record));
        }
    }

    fn flush(&self) {}
}

/// One JSON object per line.
fn format_record(record: &Record) -> String {
    serde_json::json!({
        "level": record.level().as_str(),
        "target": record.target(),
        "message": record.args().to_string(),
    })
    .to_string()
}

pub fn init(log_level: LevelFilter) -> Result<(), SetLoggerError> {
    ::log::set_logger(&LOGGER)?;
    ::log::set_max_level(log_level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::log::Level;

    #[test]
    fn record_is_single_line_json() {
        let line = format_record(
            &Record::builder()
                .args(format_args!("saved {} account(s)\nto \"{}\"", 2, "a.json"))
                .level(Level::Info)
                .target("acmedns::storage")
                .build(),
        );
        assert!(!line.contains('\n'));

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["level"], "INFO");
        assert_eq!(parsed["target"], "acmedns::storage");
        assert_eq!(parsed["message"], "saved 2 account(s)\nto \"a.json\"");
    }

    #[test]
    fn foreign_targets_are_skipped() {
        let metadata = Metadata::builder()
            .level(Level::Error)
            .target("reqwest::connect")
            .build();
        assert!(!::log::Log::enabled(&LOGGER, &metadata));
    }
}
