//! Scroll speed, shared between a canvas, its driver and anyone steering it.
//!
//! `ScrollSpeed` wraps the sending half of a `watch` channel. The current
//! interval lives in the channel itself, so reading it never blocks and a
//! playing driver sees a change on its next frame. Cloning the handle
//! shares the same speed.
//!
//! ## Rust concepts
//! - `tokio::sync::watch`: single value, many readers, latest write wins
//! - `send_if_modified` to skip waking readers when nothing changed

use crate::matrix::IntervalUpdates;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// How often a follower copies its base's speed.
pub const MATCH_SCROLL_POLL: Duration = Duration::from_millis(500);

#[derive(Clone, Debug)]
pub struct ScrollSpeed {
    tx: Arc<watch::Sender<Duration>>,
}

impl ScrollSpeed {
    pub fn new(interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(interval);
        Self { tx: Arc::new(tx) }
    }

    /// Delay between two frames.
    pub fn get(&self) -> Duration {
        *self.tx.borrow()
    }

    /// Change the delay between frames. Returns false when it was already `interval`.
    pub fn set(&self, interval: Duration) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == interval {
                return false;
            }
            *current = interval;
            true
        });
        if changed {
            tracing::info!("Scroll speed set to {:?}", interval);
        }
        changed
    }

    /// A receiver that only reports changes made after this call.
    pub fn subscribe(&self) -> IntervalUpdates {
        self.tx.subscribe()
    }

    /// True when both handles steer the same speed.
    pub fn same_as(&self, other: &ScrollSpeed) -> bool {
        Arc::ptr_eq(&self.tx, &other.tx)
    }
}

impl Default for ScrollSpeed {
    fn default() -> Self {
        Self::new(super::DEFAULT_SCROLL_DELAY)
    }
}

/// Keep `follower` at the same speed as `base` until `cancel` fires.
///
/// Polls every [`MATCH_SCROLL_POLL`]; the base's speed may be changed by
/// anyone holding its handle while both canvases are playing.
pub async fn match_scroll(follower: ScrollSpeed, base: ScrollSpeed, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(MATCH_SCROLL_POLL);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }
        follower.set(base.get());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn set_reports_whether_anything_changed() {
        let speed = ScrollSpeed::new(ms(50));
        assert!(!speed.set(ms(50)));
        assert!(speed.set(ms(20)));
        assert_eq!(speed.get(), ms(20));
    }

    #[test]
    fn clones_share_the_same_speed() {
        let speed = ScrollSpeed::new(ms(50));
        let other = speed.clone();
        other.set(ms(5));
        assert_eq!(speed.get(), ms(5));
        assert!(speed.same_as(&other));
        assert!(!speed.same_as(&ScrollSpeed::default()));
    }

    #[test]
    fn subscriber_sees_only_later_changes() {
        let speed = ScrollSpeed::new(ms(50));
        let mut rx = speed.subscribe();
        assert!(!rx.has_changed().unwrap());

        speed.set(ms(10));
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), ms(10));
    }

    #[tokio::test(start_paused = true)]
    async fn follower_tracks_base_until_canceled() {
        let base = ScrollSpeed::new(ms(30));
        let follower = ScrollSpeed::new(ms(50));
        let cancel = CancellationToken::new();

        let task = tokio::spawn(match_scroll(follower.clone(), base.clone(), cancel.clone()));

        tokio::time::sleep(ms(10)).await;
        assert_eq!(follower.get(), ms(30));

        base.set(ms(15));
        tokio::time::sleep(MATCH_SCROLL_POLL + ms(10)).await;
        assert_eq!(follower.get(), ms(15));

        cancel.cancel();
        task.await.unwrap();

        base.set(ms(99));
        tokio::time::sleep(MATCH_SCROLL_POLL * 2).await;
        assert_eq!(follower.get(), ms(15));
    }
}
