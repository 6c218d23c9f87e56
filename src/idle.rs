//! # Idle pauses.
//!
//! [`idle_for`] pauses the caller without holding a runtime worker, and ends
//! early when the given token is cancelled (for instance on terminate).

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Waits for `duration` or until `token` is cancelled.
///
/// Returns `true` if the full duration elapsed, `false` if cancelled first.
///
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use chaos_safeguards::idle_for;
///
/// let token = CancellationToken::new();
/// token.cancel();
/// assert!(!idle_for(Duration::from_secs(3600), &token).await);
/// # }
/// ```
pub async fn idle_for(duration: Duration, token: &CancellationToken) -> bool {
    if duration.is_zero() {
        return !token.is_cancelled();
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = token.cancelled() => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn elapses_when_not_cancelled() {
        let token = CancellationToken::new();
        let start = tokio::time::Instant::now();
        assert!(idle_for(Duration::from_secs(5), &token).await);
        assert!(start.elapsed() >= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn wakes_up_on_cancel() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });
        let start = tokio::time::Instant::now();
        assert!(!idle_for(Duration::from_secs(60), &token).await);
        assert!(start.elapsed() < Duration::from_secs(60));
    }
}
