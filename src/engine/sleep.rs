//! Cancellable bounded-increment sleep.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Sleep for `total`, waking at most `slice` after cancellation.
///
/// The polling loops sleep in bounded increments instead of one long
/// sleep so a stop request is observed within one slice, not one full
/// poll interval. Returns `true` if the sleep completed, `false` if the
/// token was cancelled first.
pub(crate) async fn sleep_cancellable(
    total: Duration,
    slice: Duration,
    token: &CancellationToken,
) -> bool {
    let slice = slice.max(Duration::from_millis(1));
    let mut remaining = total;

    while remaining > Duration::ZERO {
        let step = remaining.min(slice);
        tokio::select! {
            () = token.cancelled() => return false,
            () = tokio::time::sleep(step) => {}
        }
        remaining = remaining.saturating_sub(step);
    }

    !token.is_cancelled()
}
