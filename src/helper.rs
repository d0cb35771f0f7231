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

use duecards::clock::FixedClock;
use duecards::error::Fallible;
use duecards::types::timestamp::Timestamp;
use tempfile::TempDir;
use tempfile::tempdir;

use crate::collection::Collection;

/// An empty collection in a temporary directory, with a clock stopped at
/// `now`. The directory is deleted when the returned `TempDir` is dropped.
pub fn create_tmp_collection(now: Timestamp) -> Fallible<(TempDir, Collection<FixedClock>)> {
    let dir = tempdir()?;
    let coll = Collection::with_clock(Some(dir.path().display().to_string()), FixedClock::new(now))?;
    Ok((dir, coll))
}

pub fn at(secs: i64) -> Timestamp {
    Timestamp::from_unix_seconds(secs).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tmp_collection() -> Fallible<()> {
        let (dir, coll) = create_tmp_collection(at(1000))?;
        assert!(dir.path().exists());
        assert!(coll.store.all_cards()?.is_empty());
        Ok(())
    }
}
