// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::read_to_string;
use std::path::Path;

use chrono::Duration;
use serde::Deserialize;

use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::error::fail;
use crate::policy::DEFAULT_RELEARNING_STEP_MINUTES;
use crate::policy::MAX_RELEARNING_STEP_MINUTES;
use crate::policy::Policy;

/// The name of the configuration file in a collection directory.
pub const CONFIG_FILE: &str = "duecards.toml";

const DEFAULT_DATABASE: &str = "duecards.db";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub scheduler: SchedulerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Minutes before a forgotten card is shown again.
    pub relearning_step_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Database file name, relative to the collection directory.
    pub database: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            relearning_step_minutes: DEFAULT_RELEARNING_STEP_MINUTES,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
        }
    }
}

impl Config {
    pub fn parse(content: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Load the configuration from a collection directory. A missing file
    /// means the defaults.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE);
        if !path.exists() {
            log::debug!("No {CONFIG_FILE} found, using defaults.");
            return Ok(Self::default());
        }
        log::debug!("Loading configuration from {}", path.display());
        let content = read_to_string(&path)?;
        Self::parse(&content)
    }

    /// The grading policy. Out-of-range steps are clamped by [`Policy::new`].
    pub fn policy(&self) -> Policy {
        let minutes = self.scheduler.relearning_step_minutes;
        let step = Duration::try_minutes(minutes).unwrap_or(if minutes < 0 {
            Duration::zero()
        } else {
            Duration::MAX
        });
        Policy::new(step)
    }

    fn check(&self) -> Fallible<()> {
        let minutes = self.scheduler.relearning_step_minutes;
        if minutes < 0 {
            return fail(format!(
                "relearning_step_minutes must not be negative (got {minutes})."
            ));
        }
        if minutes > MAX_RELEARNING_STEP_MINUTES {
            return fail(format!(
                "relearning_step_minutes must be at most {MAX_RELEARNING_STEP_MINUTES} (got {minutes})."
            ));
        }
        if self.storage.database.trim().is_empty() {
            return Err(ErrorReport::new("storage.database must not be empty."));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_empty_config_is_default() -> Fallible<()> {
        assert_eq!(Config::parse("")?, Config::default());
        Ok(())
    }

    #[test]
    fn test_parse() -> Fallible<()> {
        let config = Config::parse(
            "[scheduler]\nrelearning_step_minutes = 30\n\n[storage]\ndatabase = \"reviews.db\"\n",
        )?;
        assert_eq!(config.scheduler.relearning_step_minutes, 30);
        assert_eq!(config.storage.database, "reviews.db");
        assert_eq!(config.policy().relearning_step(), Duration::minutes(30));
        Ok(())
    }

    #[test]
    fn test_partial_config() -> Fallible<()> {
        let config = Config::parse("[scheduler]\nrelearning_step_minutes = 1\n")?;
        assert_eq!(config.storage.database, "duecards.db");
        Ok(())
    }

    #[test]
    fn test_negative_step_rejected() {
        let result = Config::parse("[scheduler]\nrelearning_step_minutes = -1\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_oversized_step_rejected() {
        let result = Config::parse("[scheduler]\nrelearning_step_minutes = 100000000000\n");
        assert!(result.is_err());
        let longest = format!("[scheduler]\nrelearning_step_minutes = {MAX_RELEARNING_STEP_MINUTES}\n");
        assert!(Config::parse(&longest).is_ok());
    }

    #[test]
    fn test_policy_from_unchecked_config() {
        let mut config = Config::default();
        config.scheduler.relearning_step_minutes = i64::MAX;
        assert_eq!(
            config.policy().relearning_step(),
            Duration::minutes(MAX_RELEARNING_STEP_MINUTES)
        );
        config.scheduler.relearning_step_minutes = i64::MIN;
        assert_eq!(config.policy().relearning_step(), Duration::zero());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = Config::parse("[scheduler]\nlearning_steps = [1, 10]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file() -> Fallible<()> {
        let dir = tempdir()?;
        assert_eq!(Config::load(dir.path())?, Config::default());
        Ok(())
    }

    #[test]
    fn test_load_file() -> Fallible<()> {
        let dir = tempdir()?;
        write(
            dir.path().join(CONFIG_FILE),
            "[scheduler]\nrelearning_step_minutes = 5\n",
        )?;
        let config = Config::load(dir.path())?;
        assert_eq!(config.scheduler.relearning_step_minutes, 5);
        Ok(())
    }
}
