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
use duecards::clock::Clock;
use duecards::error::Fallible;
use duecards::error::fail;

use crate::collection::Collection;

/// Validate every stored memory state. Prints `ok` if all of them hold,
/// otherwise lists the broken ones and fails.
pub fn check_collection<C: Clock>(coll: &Collection<C>) -> Fallible<()> {
    let violations = find_violations(coll)?;
    if violations.is_empty() {
        println!("ok");
        return Ok(());
    }
    for line in &violations {
        println!("{line}");
    }
    fail(format!(
        "{} cards have invalid memory states. Use `duecards reset` to repair them.",
        violations.len()
    ))
}

fn find_violations<C: Clock>(coll: &Collection<C>) -> Fallible<Vec<String>> {
    let mut violations = Vec::new();
    for (card_id, stored) in coll.store.all_states()? {
        if let Err(violation) = stored.value.validate() {
            log::debug!("Card {card_id} v{} is invalid: {violation}", stored.version);
            violations.push(format!("{card_id}: {violation}"));
        }
    }
    Ok(violations)
}
