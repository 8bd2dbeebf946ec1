//! Global configuration of where and how statistics are written.

use std::fmt::Debug;
use std::fmt::Display;
use std::io::stdout;
use std::io::Write;
use std::sync::OnceLock;
use std::sync::RwLock;

use convert_case::Case;
use convert_case::Casing;

struct StatisticOptions {
    /// Written before every statistic: `{prefix} {name}={value}`.
    prefix: String,
    /// An optional closing line written by [`log_statistic_postfix`].
    after_statistics: Option<String>,
    casing: Option<Case>,
    writer: Box<dyn Write + Send + Sync>,
}

impl Debug for StatisticOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticOptions")
            .field("prefix", &self.prefix)
            .field("after_statistics", &self.after_statistics)
            .field("casing", &self.casing)
            .field("writer", &"<Writer>")
            .finish()
    }
}

static STATISTIC_OPTIONS: OnceLock<RwLock<StatisticOptions>> = OnceLock::new();

/// Enables statistic logging. Only the first call has an effect.
///
/// Statistics are written as `{prefix} {name}={value}` to `writer`, or to stdout if no writer is
/// given. Names are converted to `casing` if one is provided.
pub fn configure_statistic_logging(
    prefix: impl Into<String>,
    after: Option<String>,
    casing: Option<Case>,
    writer: Option<Box<dyn Write + Send + Sync>>,
) {
    let _ = STATISTIC_OPTIONS.get_or_init(|| {
        RwLock::new(StatisticOptions {
            prefix: prefix.into(),
            after_statistics: after,
            casing,
            writer: writer.unwrap_or_else(|| Box::new(stdout())),
        })
    });
}

fn format_statistic(
    prefix: &str,
    casing: Option<Case>,
    name: impl Display,
    value: impl Display,
) -> String {
    let name = match casing {
        Some(casing) => name.to_string().to_case(casing),
        None => name.to_string(),
    };
    format!("{prefix} {name}={value}")
}

/// Writes a single statistic; does nothing if logging was not configured.
pub fn log_statistic(name: impl Display, value: impl Display) {
    if let Some(lock) = STATISTIC_OPTIONS.get() {
        if let Ok(mut options) = lock.write() {
            let line = format_statistic(&options.prefix, options.casing, name, value);
            let _ = writeln!(options.writer, "{line}");
        }
    }
}

/// Writes the closing line, if one was configured.
pub fn log_statistic_postfix() {
    if let Some(lock) = STATISTIC_OPTIONS.get() {
        if let Ok(mut options) = lock.write() {
            if let Some(after) = options.after_statistics.clone() {
                let _ = writeln!(options.writer, "{after}");
            }
        }
    }
}

pub fn should_log_statistics() -> bool {
    STATISTIC_OPTIONS.get().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statistics_are_formatted_with_prefix_and_casing() {
        assert_eq!(
            format_statistic("%%%mzn-stat:", None, "num_fixpoints", 3),
            "%%%mzn-stat: num_fixpoints=3"
        );
        assert_eq!(
            format_statistic("%%%mzn-stat:", Some(Case::Camel), "num_fixpoints", 3),
            "%%%mzn-stat: numFixpoints=3"
        );
    }
}
