//! Invitation-resend throttling on top of `governor`.
//!
//! Two keyed limiters: one cell per 120 s for each target client, and five
//! per 60 s for each requesting address. State lives in memory and resets
//! on restart.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::middleware::NoOpMiddleware;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{NotUntil, Quota};
use portal_core::error::CoreError;
use uuid::Uuid;

/// Minimum gap between two resends to the same client.
pub const PER_CLIENT_PERIOD: Duration = Duration::from_secs(120);
/// Resends allowed from one address per [`PER_ADDRESS_PERIOD`].
pub const PER_ADDRESS_BURST: u32 = 5;
pub const PER_ADDRESS_PERIOD: Duration = Duration::from_secs(60);

type KeyedLimiter<C> = governor::RateLimiter<
    String,
    DefaultKeyedStateStore<String>,
    C,
    NoOpMiddleware<<C as Clock>::Instant>,
>;

pub struct RateLimiter<C: Clock = DefaultClock> {
    clock: C,
    per_client: KeyedLimiter<C>,
    per_address: KeyedLimiter<C>,
}

impl RateLimiter<DefaultClock> {
    pub fn new() -> Self {
        Self::with_clock(DefaultClock::default())
    }
}

impl Default for RateLimiter<DefaultClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock + Clone> RateLimiter<C> {
    pub fn with_clock(clock: C) -> Self {
        let per_client = Quota::with_period(PER_CLIENT_PERIOD)
            .unwrap_or_else(|| Quota::per_minute(NonZeroU32::MIN));
        let per_address = Quota::with_period(PER_ADDRESS_PERIOD)
            .unwrap_or_else(|| Quota::per_minute(NonZeroU32::MIN))
            .allow_burst(NonZeroU32::new(PER_ADDRESS_BURST).unwrap_or(NonZeroU32::MIN));

        Self {
            per_client: governor::RateLimiter::new(
                per_client,
                DefaultKeyedStateStore::default(),
                clock.clone(),
            ),
            per_address: governor::RateLimiter::new(
                per_address,
                DefaultKeyedStateStore::default(),
                clock.clone(),
            ),
            clock,
        }
    }

    /// Take one resend cell for `client_id` requested from `address`.
    ///
    /// The client limiter is consulted first, so a resend refused for the
    /// client does not spend the address budget.
    pub fn check_resend(&self, client_id: Uuid, address: &str) -> Result<(), CoreError> {
        self.per_client
            .check_key(&client_id.to_string())
            .map_err(|denied| self.limited(&denied))?;

        self.per_address.retain_recent();
        self.per_address
            .check_key(&address.to_string())
            .map_err(|denied| self.limited(&denied))
    }

    fn limited(&self, denied: &NotUntil<C::Instant>) -> CoreError {
        let wait = denied.wait_time_from(self.clock.now());
        // Round up so a client never retries a moment too early.
        let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
        CoreError::RateLimited {
            retry_after_secs: secs.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use governor::clock::FakeRelativeClock;

    fn limiter() -> (RateLimiter<FakeRelativeClock>, FakeRelativeClock) {
        let clock = FakeRelativeClock::default();
        (RateLimiter::with_clock(clock.clone()), clock)
    }

    #[test]
    fn second_resend_to_same_client_is_limited() {
        let (limiter, clock) = limiter();
        let client = Uuid::new_v4();
        limiter.check_resend(client, "10.0.0.1").unwrap();

        clock.advance(Duration::from_secs(20));
        assert_matches!(
            limiter.check_resend(client, "10.0.0.1"),
            Err(CoreError::RateLimited { retry_after_secs: 100 })
        );
    }

    #[test]
    fn client_cell_replenishes_after_period() {
        let (limiter, clock) = limiter();
        let client = Uuid::new_v4();
        limiter.check_resend(client, "10.0.0.1").unwrap();

        clock.advance(PER_CLIENT_PERIOD);
        assert!(limiter.check_resend(client, "10.0.0.1").is_ok());
    }

    #[test]
    fn address_allows_five_resends_per_minute() {
        let (limiter, _clock) = limiter();
        for _ in 0..PER_ADDRESS_BURST {
            limiter.check_resend(Uuid::new_v4(), "10.0.0.1").unwrap();
        }
        assert_matches!(
            limiter.check_resend(Uuid::new_v4(), "10.0.0.1"),
            Err(CoreError::RateLimited { retry_after_secs: 60 })
        );
        assert!(limiter.check_resend(Uuid::new_v4(), "10.0.0.2").is_ok());
    }

    #[test]
    fn refused_client_resend_keeps_address_budget() {
        let (limiter, _clock) = limiter();
        let client = Uuid::new_v4();
        limiter.check_resend(client, "10.0.0.1").unwrap();
        for _ in 0..3 {
            assert!(limiter.check_resend(client, "10.0.0.1").is_err());
        }
        // One cell spent on the first resend, four remain.
        for _ in 0..4 {
            limiter.check_resend(Uuid::new_v4(), "10.0.0.1").unwrap();
        }
        assert!(limiter.check_resend(Uuid::new_v4(), "10.0.0.1").is_err());
    }
}
