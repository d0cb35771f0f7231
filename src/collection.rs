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

use std::env::current_dir;
use std::path::PathBuf;

use duecards::clock::Clock;
use duecards::clock::SystemClock;
use duecards::config::Config;
use duecards::error::ErrorReport;
use duecards::error::Fallible;
use duecards::error::fail;
use duecards::store::sqlite::SqliteStore;

/// A directory holding a configuration file and a review database.
pub struct Collection<C: Clock = SystemClock> {
    pub directory: PathBuf,
    pub config: Config,
    pub store: SqliteStore,
    pub clock: C,
}

impl Collection<SystemClock> {
    pub fn new(directory: Option<String>) -> Fallible<Self> {
        Self::with_clock(directory, SystemClock)
    }
}

impl<C: Clock> Collection<C> {
    pub fn with_clock(directory: Option<String>, clock: C) -> Fallible<Self> {
        let directory: PathBuf = match directory {
            Some(dir) => PathBuf::from(dir),
            None => current_dir()?,
        };
        let directory = if directory.exists() {
            directory.canonicalize()?
        } else {
            return fail("directory does not exist.");
        };

        let config = Config::load(&directory)?;

        let db_path: PathBuf = directory.join(&config.storage.database);
        let db_path: &str = db_path
            .to_str()
            .ok_or_else(|| ErrorReport::new("invalid path"))?;
        let store = SqliteStore::open(db_path)?;

        Ok(Self {
            directory,
            config,
            store,
            clock,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs::write;

    use duecards::config::CONFIG_FILE;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_non_existent_directory() {
        let result = Collection::new(Some("./derpherp".to_string()));
        assert_eq!(
            result.err().map(|e| e.to_string()),
            Some("error: directory does not exist.".to_string())
        );
    }

    #[test]
    fn test_creates_database() -> Fallible<()> {
        let dir = tempdir()?;
        let coll = Collection::new(Some(dir.path().display().to_string()))?;
        assert!(coll.directory.join("duecards.db").exists());
        Ok(())
    }

    #[test]
    fn test_database_name_from_config() -> Fallible<()> {
        let dir = tempdir()?;
        write(
            dir.path().join(CONFIG_FILE),
            "[storage]\ndatabase = \"reviews.sqlite3\"\n",
        )?;
        let coll = Collection::new(Some(dir.path().display().to_string()))?;
        assert!(coll.directory.join("reviews.sqlite3").exists());
        Ok(())
    }
}
