//! Outbound notifications from the playlist to its host.

use crate::model::PlayMode;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaylistEvent {
    /// `None` means nothing is current any more.
    SelectionChanged(Option<usize>),
    ModeChanged(PlayMode),
    PlaylistChanged,
    PlayRequested,
    NextRequested,
    PreviousRequested,
}

/// Host-side receiver. Every method defaults to a no-op so hosts only
/// implement what they care about.
pub trait PlaylistObserver {
    /// The host should load `entry_at(index)` into playback.
    fn selection_changed(&mut self, index: Option<usize>) {
        let _ = index;
    }

    fn mode_changed(&mut self, mode: PlayMode) {
        let _ = mode;
    }

    /// The list shape changed; refresh any list display.
    fn playlist_changed(&mut self) {}

    fn play_requested(&mut self) {}

    fn next_requested(&mut self) {}

    fn previous_requested(&mut self) {}
}

#[derive(Default)]
pub struct Notifier {
    observers: Vec<Box<dyn PlaylistObserver>>,
}

impl Notifier {
    pub fn subscribe(&mut self, observer: Box<dyn PlaylistObserver>) {
        self.observers.push(observer);
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn emit(&mut self, event: PlaylistEvent) {
        trace!(?event, observers = self.observers.len(), "playlist event");
        for observer in &mut self.observers {
            match event {
                PlaylistEvent::SelectionChanged(index) => observer.selection_changed(index),
                PlaylistEvent::ModeChanged(mode) => observer.mode_changed(mode),
                PlaylistEvent::PlaylistChanged => observer.playlist_changed(),
                PlaylistEvent::PlayRequested => observer.play_requested(),
                PlaylistEvent::NextRequested => observer.next_requested(),
                PlaylistEvent::PreviousRequested => observer.previous_requested(),
            }
        }
    }
}

/// Records every event it receives. Clones share the same log, so keep one
/// clone and subscribe the other.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<PlaylistEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PlaylistEvent> {
        self.events.borrow().clone()
    }

    pub fn take(&self) -> Vec<PlaylistEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    fn push(&self, event: PlaylistEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl PlaylistObserver for EventLog {
    fn selection_changed(&mut self, index: Option<usize>) {
        self.push(PlaylistEvent::SelectionChanged(index));
    }

    fn mode_changed(&mut self, mode: PlayMode) {
        self.push(PlaylistEvent::ModeChanged(mode));
    }

    fn playlist_changed(&mut self) {
        self.push(PlaylistEvent::PlaylistChanged);
    }

    fn play_requested(&mut self) {
        self.push(PlaylistEvent::PlayRequested);
    }

    fn next_requested(&mut self) {
        self.push(PlaylistEvent::NextRequested);
    }

    fn previous_requested(&mut self) {
        self.push(PlaylistEvent::PreviousRequested);
    }
}
