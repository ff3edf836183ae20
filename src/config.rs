use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::instrumentation::LogFormat;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "cividler",
    version,
    about = "A command-line idle game: breed villagers, build camps, found towns."
)]
pub struct Args {
    /// Directory holding the saved civilization.
    #[arg(long, env = "CIVIDLER_DATA_DIR", default_value = "cividler-data")]
    pub data_dir: PathBuf,

    /// Milliseconds between accrual ticks.
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    /// Keep state in memory only; nothing is read from or written to disk.
    #[arg(long)]
    pub ephemeral: bool,
}

impl Args {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["cividler"]).unwrap();

        assert_eq!(args.tick_period(), Duration::from_secs(1));
        assert_eq!(args.log_format, LogFormat::Compact);
        assert!(!args.ephemeral);
    }

    #[test]
    fn test_overrides() {
        let args = Args::try_parse_from([
            "cividler",
            "--data-dir",
            "/tmp/civ",
            "--tick-ms",
            "250",
            "--log-format",
            "json",
            "--ephemeral",
        ])
        .unwrap();

        assert_eq!(args.data_dir, PathBuf::from("/tmp/civ"));
        assert_eq!(args.tick_period(), Duration::from_millis(250));
        assert_eq!(args.log_format, LogFormat::Json);
        assert!(args.ephemeral);
    }

    #[test]
    fn test_zero_tick_rejected() {
        assert!(Args::try_parse_from(["cividler", "--tick-ms", "0"]).is_err());
    }
}
