//! One-shot signals shared between the shutdown coordinator and drain loops

use tokio::sync::watch;

/// Sending half of a one-shot signal. Firing is permanent and idempotent.
#[derive(Debug)]
pub struct Signal {
    tx: watch::Sender<bool>,
}

/// Receiving half of a [`Signal`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct SignalListener {
    rx: watch::Receiver<bool>,
}

impl Signal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn fire(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn listener(&self) -> SignalListener {
        SignalListener {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalListener {
    pub fn is_set(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal has fired; immediately if it already has.
    ///
    /// If the [`Signal`] is dropped without firing this never resolves.
    pub async fn fired(&self) {
        let mut rx = self.rx.clone();
        let closed = rx.wait_for(|set| *set).await.is_err();
        if closed {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_fired_resolves_after_fire() {
        let signal = Signal::new();
        let listener = signal.listener();
        assert!(!listener.is_set());

        let waiter = tokio::spawn(async move { listener.fired().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.fire();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("listener did not wake")
            .unwrap();
    }

    #[tokio::test]
    async fn test_fire_is_idempotent_and_sticky() {
        let signal = Signal::new();
        signal.fire();
        signal.fire();

        let late = signal.listener();
        assert!(late.is_set());
        late.fired().await;
        late.fired().await;
    }

    #[tokio::test]
    async fn test_dropped_signal_never_fires() {
        let listener = Signal::new().listener();
        let waited = tokio::time::timeout(Duration::from_millis(20), listener.fired()).await;
        assert!(waited.is_err());
    }
}
