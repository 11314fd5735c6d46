use formwork_types::{DataPath, Locale};

/// Change notification published by a [`ResourceStore`](crate::ResourceStore).
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A value was written. The root path means the whole tree changed.
    DataChanged { path: DataPath },
    LocaleChanged { locale: Option<Locale> },
    LoadingChanged { loading: bool },
    Saved,
    Destroyed,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&StoreEvent)>;

/// Ordered list of observer callbacks.
#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, Callback)>,
}

impl Subscribers {
    pub(crate) fn subscribe(&mut self, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.callbacks.push((id, callback));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.callbacks.len();
        self.callbacks.retain(|(existing, _)| *existing != id);
        self.callbacks.len() != before
    }

    /// Calls every subscriber in subscription order.
    pub(crate) fn notify(&mut self, event: &StoreEvent) {
        for (_, callback) in &mut self.callbacks {
            callback(event);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.callbacks.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.callbacks.len()
    }
}
