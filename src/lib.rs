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

//! A spaced repetition review scheduler.
//!
//! Cards carry a [`MemoryState`](types::memory_state::MemoryState). A
//! [`Policy`](policy::Policy) turns a state and a rating into the next
//! state, a [`Session`](session::Session) walks a deck's due cards and
//! persists each rating through a [`SchedulerStore`](store::SchedulerStore),
//! and the [`due`] module tells a reminder dispatcher when to fire.

pub mod clock;
pub mod config;
pub mod due;
pub mod error;
pub mod policy;
pub mod session;
pub mod store;
pub mod types;
