use std::fmt::Display;

use super::log_statistic;

/// Logs statistics under a name prefix, e.g. `solver_num_fixpoints`.
#[derive(Debug, Default, Clone)]
pub struct StatisticLogger {
    name_prefix: String,
}

impl StatisticLogger {
    pub fn new(name_prefix: impl Display) -> Self {
        StatisticLogger {
            name_prefix: name_prefix.to_string(),
        }
    }

    /// A logger for a nested statistic; an empty prefix is not followed by a separator.
    pub fn attach_to_prefix(&self, addition_to_prefix: impl Display) -> Self {
        let name_prefix = if self.name_prefix.is_empty() {
            addition_to_prefix.to_string()
        } else {
            format!("{}_{addition_to_prefix}", self.name_prefix)
        };
        StatisticLogger { name_prefix }
    }

    pub fn name_prefix(&self) -> &str {
        &self.name_prefix
    }
}

impl std::fmt::Write for StatisticLogger {
    fn write_str(&mut self, s: &str) -> std::fmt::Result {
        log_statistic(&self.name_prefix, s);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_are_joined_with_underscores() {
        let logger = StatisticLogger::new("solver").attach_to_prefix("num_fixpoints");
        assert_eq!(logger.name_prefix(), "solver_num_fixpoints");

        let logger = StatisticLogger::default().attach_to_prefix("nodes");
        assert_eq!(logger.name_prefix(), "nodes");
    }
}
