/*
 Copyright (c) 2025 Mark Hughes

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as published by
 the Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

//! Spam protection for the contact form: a client may submit at most three
//! times a minute.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use schnellru::{ByLength, LruMap};

pub const SUBMISSION_WINDOW: Duration = Duration::from_secs(60);
pub const MAX_SUBMISSIONS_PER_WINDOW: usize = 3;

// Per client, older submission times beyond this are forgotten
const HISTORY_LENGTH: usize = 10;
// When exceeded the least recently seen clients are forgotten
const CLIENTS_CAPACITY: u32 = 10_000;

pub struct SubmissionLimiter {
    window: Duration,
    max_per_window: usize,
    history: Mutex<LruMap<String, Vec<Instant>>>,
}

impl Default for SubmissionLimiter {
    fn default() -> Self {
        SubmissionLimiter::new(SUBMISSION_WINDOW, MAX_SUBMISSIONS_PER_WINDOW)
    }
}

impl SubmissionLimiter {
    pub fn new(window: Duration, max_per_window: usize) -> SubmissionLimiter {
        SubmissionLimiter {
            window,
            max_per_window,
            history: Mutex::new(LruMap::new(ByLength::new(CLIENTS_CAPACITY))),
        }
    }

    /// Returns true if this submission should be refused.
    ///
    /// Refused submissions are not recorded, so a client that keeps
    /// retrying is let through again once its earlier submissions age out
    /// of the window.
    pub fn is_spam_attempt(&self, client_id: &str, now: Instant) -> bool {
        let mut history = self.history.lock();
        let Some(times) = history.get_or_insert(client_id.to_string(), Vec::new) else {
            return false;
        };

        let recent = times
            .iter()
            .filter(|time| now.duration_since(**time) < self.window)
            .count();
        if recent >= self.max_per_window {
            return true;
        }

        times.push(now);
        if times.len() > HISTORY_LENGTH {
            let excess = times.len() - HISTORY_LENGTH;
            times.drain(..excess);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fourth_submission_in_a_minute_is_refused() {
        let limiter = SubmissionLimiter::default();
        let start = Instant::now();

        for i in 0..3 {
            assert!(!limiter.is_spam_attempt("client", start + Duration::from_secs(i)));
        }
        assert!(limiter.is_spam_attempt("client", start + Duration::from_secs(10)));
        assert!(!limiter.is_spam_attempt("other", start + Duration::from_secs(10)));
    }

    #[test]
    fn window_slides() {
        let limiter = SubmissionLimiter::default();
        let start = Instant::now();

        for i in 0..3 {
            assert!(!limiter.is_spam_attempt("client", start + Duration::from_secs(i)));
        }
        // The first submission is now more than a minute old
        assert!(!limiter.is_spam_attempt("client", start + Duration::from_secs(60)));
        assert!(limiter.is_spam_attempt("client", start + Duration::from_millis(60_500)));
    }

    #[test]
    fn history_is_trimmed() {
        let limiter = SubmissionLimiter::new(Duration::from_millis(1), 100);
        let start = Instant::now();
        for i in 0..25 {
            assert!(!limiter.is_spam_attempt("client", start + Duration::from_secs(i)));
        }
        let mut history = limiter.history.lock();
        assert_eq!(history.get("client").map(|times| times.len()), Some(HISTORY_LENGTH));
    }
}
