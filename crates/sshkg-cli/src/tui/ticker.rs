//! Delayed event delivery for animation ticks and the settling pause.
//!
//! Timers only ever post events back to the loop; they never run stage
//! work and never touch session state.

use super::controller::Event;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Posts events into the loop's channel after a delay.
#[derive(Clone)]
pub struct Ticker {
    tx: UnboundedSender<Event>,
}

impl Ticker {
    pub fn new(tx: UnboundedSender<Event>) -> Self {
        Self { tx }
    }

    /// Deliver `event` once `delay` has elapsed.
    pub fn after(&self, delay: Duration, event: Event) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Loop already gone.
            let _ = tx.send(event);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn delivers_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ticker = Ticker::new(tx);
        ticker.after(Duration::from_millis(20), Event::Settled);

        assert!(rx.try_recv().is_err());
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, Event::Settled));
    }

    #[tokio::test]
    async fn closed_channel_is_not_an_error() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        Ticker::new(tx).after(Duration::from_millis(1), Event::Tick);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
