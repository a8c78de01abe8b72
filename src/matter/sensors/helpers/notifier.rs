//! Cluster change notifier for live Matter subscription updates.
//!
//! When the leak state changes the subscription processor is woken so the
//! new value reaches subscribed hubs right away instead of at the next
//! reporting interval.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

/// Signal type shared between the notifier and the Matter thread.
pub type ChangeSignal = Signal<CriticalSectionRawMutex, ()>;

/// Wakes the subscription processor for one cluster.
///
/// `notify()` can be called from any thread; the Matter thread waits on the
/// same static signal.
pub struct ClusterNotifier {
    signal: &'static ChangeSignal,
    endpoint_id: u16,
    cluster_id: u32,
}

impl ClusterNotifier {
    pub fn new(signal: &'static ChangeSignal, endpoint_id: u16, cluster_id: u32) -> Self {
        Self {
            signal,
            endpoint_id,
            cluster_id,
        }
    }

    pub fn endpoint_id(&self) -> u16 {
        self.endpoint_id
    }

    pub fn cluster_id(&self) -> u32 {
        self.cluster_id
    }

    /// Notify that this cluster's data changed. Non-blocking.
    pub fn notify(&self) {
        self.signal.signal(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SIGNAL: ChangeSignal = Signal::new();

    #[test]
    fn test_notify_raises_signal() {
        let notifier = ClusterNotifier::new(&SIGNAL, 1, 0x0045);
        assert_eq!(notifier.endpoint_id(), 1);
        assert_eq!(notifier.cluster_id(), 0x0045);

        assert!(!SIGNAL.signaled());
        notifier.notify();
        assert!(SIGNAL.signaled());
        SIGNAL.reset();
    }
}
