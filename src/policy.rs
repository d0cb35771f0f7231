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

//! SM-2 style grading.
//!
//! A rating and the card's current state go in, the next state comes out.
//! Nothing here reads the clock or touches storage.

use chrono::Duration;

use crate::types::card::CardId;
use crate::types::memory_state::CardState;
use crate::types::memory_state::MemoryState;
use crate::types::memory_state::MIN_EASE_FACTOR;
use crate::types::rating::Rating;
use crate::types::review_event::ReviewEvent;
use crate::types::timestamp::Timestamp;

/// How long a forgotten card waits before it is shown again.
pub const DEFAULT_RELEARNING_STEP_MINUTES: i64 = 10;

/// Interval after the first successful review, in days.
const FIRST_INTERVAL: f64 = 1.0;

/// Interval after the second successful review, in days.
const SECOND_INTERVAL: f64 = 6.0;

/// Interval multiplier for a `Hard` rating.
const HARD_MULTIPLIER: f64 = 1.2;

/// The shortest interval a `Hard` rating gives, in days.
const HARD_MIN_INTERVAL: f64 = 1.0;

/// Extra interval multiplier for an `Easy` rating.
const EASY_BONUS: f64 = 1.3;

/// Ease penalty for `Again`.
const AGAIN_EASE_PENALTY: f64 = 0.2;

/// Ease penalty for `Hard`.
const HARD_EASE_PENALTY: f64 = 0.15;

/// Ease reward for `Easy`.
const EASY_EASE_REWARD: f64 = 0.15;

/// The longest interval, in days.
pub const MAX_INTERVAL: f64 = 36_500.0;

/// A relapsed card waits at most as long as the longest interval.
pub const MAX_RELEARNING_STEP_MINUTES: i64 = 36_500 * 24 * 60;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Policy {
    relearning_step: Duration,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            relearning_step: Duration::minutes(DEFAULT_RELEARNING_STEP_MINUTES),
        }
    }
}

impl Policy {
    /// A policy with a custom relearning step, clamped between zero and
    /// [`MAX_RELEARNING_STEP_MINUTES`].
    pub fn new(relearning_step: Duration) -> Self {
        let longest = Duration::minutes(MAX_RELEARNING_STEP_MINUTES);
        Self {
            relearning_step: relearning_step.clamp(Duration::zero(), longest),
        }
    }

    pub fn relearning_step(&self) -> Duration {
        self.relearning_step
    }

    /// Compute a card's next state.
    pub fn grade(&self, state: &MemoryState, rating: Rating, now: Timestamp) -> MemoryState {
        let ease = state.ease_factor;
        let first_review = state.state == CardState::New;
        let mut next = state.clone();
        next.last_reviewed_at = Some(now);
        match rating {
            Rating::Again => {
                next.repetitions = 0;
                next.lapses = state.lapses.saturating_add(1);
                next.state = CardState::Relearning;
                next.interval_days = 0.0;
                next.ease_factor = floor_ease(ease - AGAIN_EASE_PENALTY);
                next.due_at = now.plus(self.relearning_step);
                return next;
            }
            Rating::Hard => {
                next.interval_days = if first_review {
                    FIRST_INTERVAL
                } else {
                    (state.interval_days * HARD_MULTIPLIER).max(HARD_MIN_INTERVAL)
                };
                next.ease_factor = floor_ease(ease - HARD_EASE_PENALTY);
                if first_review {
                    next.state = CardState::Learning;
                }
            }
            Rating::Good | Rating::Easy => {
                next.repetitions = state.repetitions.saturating_add(1);
                let base = match next.repetitions {
                    1 => FIRST_INTERVAL,
                    2 => SECOND_INTERVAL,
                    _ => state.interval_days * ease,
                };
                let interval = if rating == Rating::Easy && !first_review {
                    base * EASY_BONUS
                } else {
                    base
                };
                // Intervals only shrink on a lapse.
                next.interval_days = interval.max(state.interval_days);
                if rating == Rating::Easy {
                    next.ease_factor = ease + EASY_EASE_REWARD;
                }
                next.state = CardState::Review;
            }
        }
        next.interval_days = next.interval_days.min(MAX_INTERVAL);
        next.due_at = now.plus_days(next.interval_days);
        next
    }

    /// Grade a card and record the transition.
    pub fn review(
        &self,
        card_id: &CardId,
        state: &MemoryState,
        rating: Rating,
        now: Timestamp,
    ) -> ReviewEvent {
        let next = self.grade(state, rating, now);
        ReviewEvent::new(card_id.clone(), rating, now, state.clone(), next)
    }
}

/// Grade with the default policy.
pub fn grade(state: &MemoryState, rating: Rating, now: Timestamp) -> MemoryState {
    Policy::default().grade(state, rating, now)
}

fn floor_ease(ease: f64) -> f64 {
    ease.max(MIN_EASE_FACTOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_unix_seconds(secs).unwrap()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < EPSILON, "{a} != {b}");
    }

    fn reviewed(interval_days: f64, ease_factor: f64, repetitions: u32) -> MemoryState {
        MemoryState {
            interval_days,
            ease_factor,
            repetitions,
            lapses: 0,
            due_at: at(1000).plus_days(interval_days),
            last_reviewed_at: Some(at(1000)),
            state: CardState::Review,
        }
    }

    #[test]
    fn test_first_review_good() {
        let t = at(1000);
        let s = grade(&MemoryState::new(at(0)), Rating::Good, t);
        assert_eq!(s.repetitions, 1);
        assert_eq!(s.interval_days, 1.0);
        assert_eq!(s.due_at, t.plus_days(1.0));
        assert_eq!(s.state, CardState::Review);
        assert_eq!(s.last_reviewed_at, Some(t));
        assert_eq!(s.ease_factor, 2.5);
    }

    #[test]
    fn test_good_good_again() {
        let s = grade(&MemoryState::new(at(0)), Rating::Good, at(1000));
        let s = grade(&s, Rating::Good, at(1000).plus_days(1.0));
        assert_eq!(s.repetitions, 2);
        assert_eq!(s.interval_days, 6.0);
        let t = at(1000).plus_days(7.0);
        let s = grade(&s, Rating::Again, t);
        assert_eq!(s.repetitions, 0);
        assert_eq!(s.lapses, 1);
        assert_eq!(s.interval_days, 0.0);
        assert_eq!(s.state, CardState::Relearning);
        assert_close(s.ease_factor, 2.3);
        assert_eq!(s.due_at, t.plus(Duration::minutes(10)));
    }

    #[test]
    fn test_good_growth_uses_ease() {
        let s = grade(&reviewed(6.0, 2.5, 2), Rating::Good, at(2000));
        assert_eq!(s.repetitions, 3);
        assert_close(s.interval_days, 15.0);
        assert_eq!(s.ease_factor, 2.5);
    }

    #[test]
    fn test_easy_growth() {
        let s = grade(&reviewed(6.0, 2.5, 2), Rating::Easy, at(2000));
        assert_eq!(s.repetitions, 3);
        assert_close(s.interval_days, 6.0 * 2.5 * 1.3);
        assert_close(s.ease_factor, 2.65);
    }

    #[test]
    fn test_easy_first_review_has_no_bonus() {
        let s = grade(&MemoryState::new(at(0)), Rating::Easy, at(1000));
        assert_eq!(s.repetitions, 1);
        assert_eq!(s.interval_days, 1.0);
        assert_eq!(s.state, CardState::Review);
        assert_close(s.ease_factor, 2.65);
    }

    #[test]
    fn test_easy_second_review_has_bonus() {
        let s = grade(&reviewed(1.0, 2.5, 1), Rating::Easy, at(2000));
        assert_close(s.interval_days, 6.0 * 1.3);
    }

    #[test]
    fn test_hard_dampens_growth() {
        let s = grade(&reviewed(10.0, 2.5, 3), Rating::Hard, at(2000));
        assert_eq!(s.repetitions, 3);
        assert_close(s.interval_days, 12.0);
        assert_close(s.ease_factor, 2.35);
        assert_eq!(s.state, CardState::Review);
    }

    #[test]
    fn test_hard_first_review() {
        let s = grade(&MemoryState::new(at(0)), Rating::Hard, at(1000));
        assert_eq!(s.repetitions, 0);
        assert_eq!(s.interval_days, 1.0);
        assert_eq!(s.state, CardState::Learning);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_hard_after_lapse_is_at_least_a_day() {
        let s = grade(&reviewed(10.0, 2.5, 3), Rating::Again, at(2000));
        let s = grade(&s, Rating::Hard, at(3000));
        assert_eq!(s.interval_days, 1.0);
        assert_eq!(s.state, CardState::Relearning);
    }

    #[test]
    fn test_again_first_review() {
        let s = grade(&MemoryState::new(at(0)), Rating::Again, at(1000));
        assert_eq!(s.interval_days, 0.0);
        assert_eq!(s.lapses, 1);
        assert_eq!(s.state, CardState::Relearning);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn test_again_ease_property() {
        for ease in [1.3, 1.4, 1.5, 2.0, 2.5, 3.7] {
            let s = reviewed(20.0, ease, 4);
            let next = grade(&s, Rating::Again, at(5000));
            assert_eq!(next.ease_factor, (ease - 0.2).max(1.3));
            assert_eq!(next.repetitions, 0);
        }
    }

    #[test]
    fn test_repeated_again_never_goes_below_floor() {
        let mut s = reviewed(20.0, 2.5, 4);
        let mut t = at(5000);
        for _ in 0..100 {
            s = grade(&s, Rating::Again, t);
            assert!(s.ease_factor >= MIN_EASE_FACTOR);
            t = s.due_at;
        }
        assert_eq!(s.ease_factor, MIN_EASE_FACTOR);
        assert_eq!(s.lapses, 100);
    }

    #[test]
    fn test_repeated_hard_never_goes_below_floor() {
        let mut s = MemoryState::new(at(0));
        let mut t = at(1000);
        for _ in 0..50 {
            s = grade(&s, Rating::Hard, t);
            t = s.due_at;
        }
        assert_eq!(s.ease_factor, MIN_EASE_FACTOR);
    }

    #[test]
    fn test_never_due_in_the_past() {
        let starts = [
            MemoryState::new(at(0)),
            reviewed(0.0, 1.3, 0),
            reviewed(6.0, 2.5, 2),
            reviewed(300.0, 3.0, 9),
        ];
        let t = at(100_000);
        for s in &starts {
            for rating in Rating::ALL {
                let next = grade(s, rating, t);
                assert!(next.due_at >= t);
                assert!(next.validate().is_ok());
            }
        }
    }

    #[test]
    fn test_grade_is_pure() {
        let s = reviewed(6.0, 2.5, 2);
        for rating in Rating::ALL {
            let a = grade(&s, rating, at(9000));
            let b = grade(&s, rating, at(9000));
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_interval_monotonic_without_lapses() {
        let sequences = [
            vec![Rating::Hard, Rating::Good, Rating::Good, Rating::Hard, Rating::Easy],
            vec![Rating::Hard, Rating::Hard, Rating::Good, Rating::Hard, Rating::Good],
            vec![Rating::Easy, Rating::Hard, Rating::Good, Rating::Good, Rating::Good],
        ];
        for ratings in sequences {
            let mut s = MemoryState::new(at(0));
            let mut t = at(1000);
            let mut previous = s.interval_days;
            for &rating in &ratings {
                s = grade(&s, rating, t);
                assert!(s.interval_days >= previous, "{ratings:?}");
                previous = s.interval_days;
                t = s.due_at;
            }
        }
    }

    #[test]
    fn test_interval_is_capped() {
        let s = reviewed(30_000.0, 3.0, 20);
        let next = grade(&s, Rating::Easy, at(1000));
        assert_eq!(next.interval_days, MAX_INTERVAL);
    }

    #[test]
    fn test_relearning_step_is_clamped() {
        let policy = Policy::new(Duration::MAX);
        assert_eq!(
            policy.relearning_step(),
            Duration::minutes(MAX_RELEARNING_STEP_MINUTES)
        );
        let next = policy.grade(&MemoryState::new(at(0)), Rating::Again, at(1000));
        assert_eq!(next.due_at, at(1000).plus_days(MAX_INTERVAL));
        assert!(next.validate().is_ok());
    }

    #[test]
    fn test_custom_relearning_step() {
        let policy = Policy::new(Duration::minutes(30));
        let t = at(1000);
        let s = policy.grade(&reviewed(6.0, 2.5, 2), Rating::Again, t);
        assert_eq!(s.due_at, t.plus(Duration::minutes(30)));
    }

    #[test]
    fn test_negative_relearning_step_is_zero() {
        let policy = Policy::new(Duration::minutes(-5));
        assert_eq!(policy.relearning_step(), Duration::zero());
        let t = at(1000);
        let s = policy.grade(&reviewed(6.0, 2.5, 2), Rating::Again, t);
        assert_eq!(s.due_at, t);
    }

    #[test]
    fn test_review_records_transition() {
        let card_id = CardId::new("c1");
        let s = MemoryState::new(at(0));
        let event = Policy::default().review(&card_id, &s, Rating::Good, at(1000));
        assert_eq!(event.card_id(), &card_id);
        assert_eq!(event.rating(), Rating::Good);
        assert_eq!(event.reviewed_at(), at(1000));
        assert_eq!(event.previous(), &s);
        assert_eq!(event.resulting(), &grade(&s, Rating::Good, at(1000)));
    }
}
