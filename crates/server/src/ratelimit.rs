#![forbid(unsafe_code)]

/// Fixed-window request counter, one per connection. The window resets
/// `window_ms` after its first request; a request over the budget is
/// refused with the time left until the window turns over, which the
/// caller surfaces as a backoff hint. `max = 0` disables the limiter.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RateLimiter {
    max: u32,
    window_ms: i64,
    window_start: i64,
    count: u32,
}

impl RateLimiter {
    pub(crate) fn new(max: u32, window_ms: i64) -> Self {
        Self {
            max,
            window_ms: window_ms.max(1),
            window_start: 0,
            count: 0,
        }
    }

    /// `Ok` admits the request; `Err` carries the backoff in milliseconds.
    pub(crate) fn check(&mut self, now_ms: i64) -> Result<(), i64> {
        if self.max == 0 {
            return Ok(());
        }
        if now_ms.saturating_sub(self.window_start) >= self.window_ms {
            self.window_start = now_ms;
            self.count = 0;
        }
        if self.count >= self.max {
            let retry_after = (self.window_start + self.window_ms - now_ms).max(1);
            return Err(retry_after);
        }
        self.count += 1;
        Ok(())
    }
}
