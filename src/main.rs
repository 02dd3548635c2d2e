use clap::Parser;
use std::path::PathBuf;

mod cli;

use cli::commands::Cli;
use vtasks::config::VtasksConfig;

fn init_logging(config: &VtasksConfig) {
    // Log to the systemd user journal (`journalctl --user -t vtasks -f`).
    // Wrapper filters: vtasks crate at info/debug (per config), everything else at warn.
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("vtasks") {
                let max = if vtasks::debug_logging() {
                    log::LevelFilter::Debug
                } else {
                    log::LevelFilter::Info
                };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    vtasks::set_debug_logging(config.debug_logging);

    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier("vtasks".to_string()),
        Err(e) => {
            eprintln!("warning: journal logging unavailable: {}", e);
            return;
        }
    };
    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
        // Global max must be Debug so vtasks debug logs can pass through when enabled
        log::set_max_level(log::LevelFilter::Debug);
    }
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(VtasksConfig::default_path);
    let config = VtasksConfig::load(&config_path);
    init_logging(&config);

    if let Err(e) = cli::handlers::dispatch(cli, config) {
        log::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
