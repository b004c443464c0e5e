use std::num::NonZeroU32;

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use tracing::warn;
use uuid::Uuid;

use crate::error::ApiError;

/// Per-user request quota for one named scope.
pub struct Throttle {
    scope: &'static str,
    limiter: DefaultKeyedRateLimiter<Uuid>,
}

impl Throttle {
    pub fn per_minute(scope: &'static str, rate: NonZeroU32) -> Self {
        Self {
            scope,
            limiter: RateLimiter::keyed(Quota::per_minute(rate)),
        }
    }

    pub fn check(&self, user_id: Uuid) -> Result<(), ApiError> {
        self.limiter.check_key(&user_id).map_err(|_| {
            warn!("Throttled {} request from {}", self.scope, user_id);
            ApiError::RateLimited(format!("{} rate limit exceeded", self.scope))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_is_per_user() {
        let throttle = Throttle::per_minute("votes", NonZeroU32::new(2).unwrap());
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        assert!(throttle.check(alice).is_ok());
        assert!(throttle.check(alice).is_ok());
        assert!(matches!(throttle.check(alice), Err(ApiError::RateLimited(_))));
        assert!(throttle.check(bob).is_ok());
    }
}
