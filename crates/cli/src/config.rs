use std::path::PathBuf;
use std::str::FromStr;

use roadsim_core::config::DemoConfig;
use roadsim_core::error::CoreError;

/// Default SQLite database, created next to the working directory.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://roadsim.db";

/// Default encoder program, resolved through `PATH`.
pub const DEFAULT_FFMPEG_BIN: &str = "ffmpeg";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Everything the binary needs, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub demo: DemoConfig,
    pub database_url: String,
    pub ffmpeg_bin: PathBuf,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment with defaults.
    ///
    /// | Env Var              | Default               |
    /// |----------------------|-----------------------|
    /// | `DEMO_DAYS`          | `5`                   |
    /// | `DEMO_DURATION_SECS` | `10`                  |
    /// | `DEMO_FPS`           | `30`                  |
    /// | `DEMO_WIDTH`         | `1920`                |
    /// | `DEMO_HEIGHT`        | `1080`                |
    /// | `DEMO_MIN_DEFECTS`   | `2`                   |
    /// | `DEMO_MAX_DEFECTS`   | `10`                  |
    /// | `DEMO_OUTPUT_ROOT`   | `media`               |
    /// | `DEMO_MEDIA_URL`     | `/media/`             |
    /// | `DEMO_SEED`          | random                |
    /// | `DATABASE_URL`       | `sqlite://roadsim.db` |
    /// | `FFMPEG_BIN`         | `ffmpeg`              |
    /// | `LOG_FORMAT`         | `text` (or `json`)    |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its
    /// value. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = DemoConfig::default();

        let min_defects = parse_or(&var, "DEMO_MIN_DEFECTS", *defaults.defects_per_category.start())?;
        let max_defects = parse_or(&var, "DEMO_MAX_DEFECTS", *defaults.defects_per_category.end())?;
        let seed = var("DEMO_SEED").map(|v| parse("DEMO_SEED", &v)).transpose()?;

        let demo = DemoConfig {
            days: parse_or(&var, "DEMO_DAYS", defaults.days)?,
            duration_secs: parse_or(&var, "DEMO_DURATION_SECS", defaults.duration_secs)?,
            fps: parse_or(&var, "DEMO_FPS", defaults.fps)?,
            width: parse_or(&var, "DEMO_WIDTH", defaults.width)?,
            height: parse_or(&var, "DEMO_HEIGHT", defaults.height)?,
            defects_per_category: min_defects..=max_defects,
            output_root: var("DEMO_OUTPUT_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_root),
            run_dir: defaults.run_dir,
            media_url: var("DEMO_MEDIA_URL").unwrap_or(defaults.media_url),
            seed,
        };
        demo.validate()?;

        let log_format = match var("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(CoreError::Configuration(format!(
                    "LOG_FORMAT must be 'text' or 'json', got '{other}'"
                )))
            }
        };

        Ok(Self {
            demo,
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()),
            ffmpeg_bin: var("FFMPEG_BIN")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FFMPEG_BIN)),
            log_format,
        })
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, CoreError> {
    value.trim().parse().map_err(|_| {
        CoreError::Configuration(format!("{key} has an invalid value: '{value}'"))
    })
}

fn parse_or<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, CoreError> {
    match var(key) {
        Some(value) => parse(key, &value),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, CoreError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.demo, DemoConfig::default());
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.ffmpeg_bin, PathBuf::from("ffmpeg"));
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("DEMO_DAYS", "2"),
            ("DEMO_DURATION_SECS", "4"),
            ("DEMO_FPS", "25"),
            ("DEMO_WIDTH", "640"),
            ("DEMO_HEIGHT", "360"),
            ("DEMO_MIN_DEFECTS", "1"),
            ("DEMO_MAX_DEFECTS", " 3 "),
            ("DEMO_OUTPUT_ROOT", "/srv/media"),
            ("DEMO_MEDIA_URL", "https://cdn.example/media/"),
            ("DEMO_SEED", "42"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("FFMPEG_BIN", "/opt/ffmpeg/bin/ffmpeg"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();

        assert_eq!(config.demo.days, 2);
        assert_eq!(config.demo.total_frames(), 100);
        assert_eq!(config.demo.width, 640);
        assert_eq!(config.demo.defects_per_category, 1..=3);
        assert_eq!(config.demo.output_root, PathBuf::from("/srv/media"));
        assert_eq!(
            config.demo.video_link(),
            "https://cdn.example/media/demo/demo_video.mp4"
        );
        assert_eq!(config.demo.seed, Some(42));
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.ffmpeg_bin, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = load(&[("DEMO_SEED", ""), ("DEMO_DAYS", "  ")]).unwrap();
        assert_eq!(config.demo.seed, None);
        assert_eq!(config.demo.days, 5);
    }

    #[test]
    fn unparsable_number_is_a_configuration_error() {
        assert_matches!(
            load(&[("DEMO_FPS", "thirty")]),
            Err(CoreError::Configuration(msg)) if msg.contains("DEMO_FPS")
        );
        assert_matches!(
            load(&[("DEMO_DAYS", "-1")]),
            Err(CoreError::Configuration(_))
        );
    }

    #[test]
    fn invalid_values_are_rejected_after_parsing() {
        assert_matches!(
            load(&[("DEMO_MIN_DEFECTS", "5"), ("DEMO_MAX_DEFECTS", "2")]),
            Err(CoreError::Configuration(msg)) if msg.contains("inverted")
        );
        assert_matches!(
            load(&[("DEMO_DURATION_SECS", "0")]),
            Err(CoreError::Configuration(_))
        );
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        assert_matches!(
            load(&[("LOG_FORMAT", "xml")]),
            Err(CoreError::Configuration(_))
        );
    }
}
