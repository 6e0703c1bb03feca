//! Host visibility signal.
//!
//! The host owns a [`VisibilityController`] and flips it when its view is
//! hidden or shown. Stores built with a receiver stop polling while hidden
//! and check for fresh data as soon as they become visible again.

use tokio::sync::watch;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

impl Visibility {
    pub fn is_hidden(self) -> bool {
        self == Self::Hidden
    }
}

/// Sending side of the visibility signal.
#[derive(Debug)]
pub struct VisibilityController {
    sender: watch::Sender<Visibility>,
}

impl VisibilityController {
    pub fn new(initial: Visibility) -> Self {
        let (sender, _receiver) = watch::channel(initial);
        Self { sender }
    }

    pub fn subscribe(&self) -> watch::Receiver<Visibility> {
        self.sender.subscribe()
    }

    pub fn current(&self) -> Visibility {
        *self.sender.borrow()
    }

    /// Publishes `visibility` if it differs from the current value.
    pub fn set(&self, visibility: Visibility) {
        self.sender.send_if_modified(|current| {
            if *current == visibility {
                false
            } else {
                *current = visibility;
                true
            }
        });
    }

    pub fn hide(&self) {
        self.set(Visibility::Hidden);
    }

    pub fn show(&self) {
        self.set(Visibility::Visible);
    }
}

impl Default for VisibilityController {
    fn default() -> Self {
        Self::new(Visibility::Visible)
    }
}
