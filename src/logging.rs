use std::fs::OpenOptions;
use std::path::Path;

use env_logger::{Builder, Env, Target};

const DEFAULT_FILTER: &str = "warn";
const LOG_FILE: &str = "cashbook.log";

/// Install the global logger. `RUST_LOG` overrides the default level.
///
/// The interactive UI owns the terminal, so in that mode records are appended
/// to `<data_dir>/cashbook.log` instead of stderr. If the file cannot be
/// opened the logger falls back to stderr.
pub fn init(data_dir: &Path, interactive: bool) {
    let mut builder = Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER));
    builder.format_timestamp_secs();

    if interactive {
        let opened = std::fs::create_dir_all(data_dir).and_then(|_| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(data_dir.join(LOG_FILE))
        });
        match opened {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Could not open log file in {}: {e}", data_dir.display()),
        }
    }

    // A second init (tests, re-entry) is harmless.
    let _ = builder.try_init();
}

pub fn log_path(data_dir: &Path) -> std::path::PathBuf {
    data_dir.join(LOG_FILE)
}
