//! Progress channel between a running [`Organizer`](crate::core::Organizer)
//! and whatever renders it.
//!
//! A run emits, in order: `Started`, `FilesDiscovered`, then per file
//! `File::Started`, any number of `Progress` updates and `File::Finished`
//! followed by `OverallProgress`, and finally `Completed` or `Cancelled`.
//! Configuration failures emit a single `Error` instead.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender};

use super::Event;

/// Producer side, held by the organizer and the transfer engine.
///
/// Cloneable; the organizer may run on a worker thread while the shell
/// renders on another.
#[derive(Clone)]
pub struct EventSender {
    inner: Sender<Event>,
}

impl EventSender {
    /// Wrap an existing crossbeam sender
    pub fn new(sender: Sender<Event>) -> Self {
        Self { inner: sender }
    }

    /// Send an event. Blocks only when a bounded channel is full.
    ///
    /// A run never fails because nobody is listening: with the receiver
    /// gone the event is dropped.
    pub fn send(&self, event: Event) {
        let _ = self.inner.send(event);
    }
}

/// Consumer side, held by the shell that draws progress
pub struct EventReceiver {
    inner: Receiver<Event>,
}

impl EventReceiver {
    /// Next event, or `None` once every sender is gone
    pub fn recv(&self) -> Option<Event> {
        self.inner.recv().ok()
    }

    /// Next queued event without waiting
    pub fn try_recv(&self) -> Option<Event> {
        self.inner.try_recv().ok()
    }

    /// Drain every event that is already queued
    pub fn drain(&self) -> Vec<Event> {
        self.inner.try_iter().collect()
    }

    /// Iterate until the run's senders are dropped
    pub fn iter(&self) -> impl Iterator<Item = Event> + '_ {
        self.inner.iter()
    }
}

/// Factory for sender/receiver pairs
pub struct EventChannel;

impl EventChannel {
    /// Unbounded channel; the organizer never waits on the shell
    pub fn new() -> (EventSender, EventReceiver) {
        let (sender, receiver) = unbounded();
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }

    /// Bounded channel: a full queue makes the organizer wait, so chunk
    /// progress is paced by the shell
    pub fn bounded(capacity: usize) -> (EventSender, EventReceiver) {
        let (sender, receiver) = bounded(capacity);
        (
            EventSender { inner: sender },
            EventReceiver { inner: receiver },
        )
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        EventChannel
    }
}

/// Sender whose receiver is already dropped; used by [`Organizer::run`](crate::core::Organizer::run)
pub fn null_sender() -> EventSender {
    let (sender, _receiver) = EventChannel::new();
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{FileEvent, FileProgress, FileStatus, RunEvent};
    use std::thread;

    #[test]
    fn events_can_be_sent_across_threads() {
        let (sender, receiver) = EventChannel::new();

        let handle = thread::spawn(move || {
            sender.send(Event::File(FileEvent::Progress(FileProgress {
                percent: 25.0,
                name: "clip.mov".to_string(),
                status: FileStatus::Copying,
            })));
        });

        handle.join().unwrap();

        match receiver.recv().unwrap() {
            Event::File(FileEvent::Progress(p)) => assert_eq!(p.percent, 25.0),
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn null_sender_does_not_panic() {
        let sender = null_sender();
        sender.send(Event::Run(RunEvent::Cancelled));
    }

    #[test]
    fn bounded_channel_respects_capacity() {
        let (sender, receiver) = EventChannel::bounded(2);

        sender.send(Event::Run(RunEvent::FilesDiscovered { total: 1 }));
        sender.send(Event::Run(RunEvent::FilesDiscovered { total: 2 }));

        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_some());
        assert!(receiver.try_recv().is_none());
    }

    #[test]
    fn drain_returns_queued_events_in_order() {
        let (sender, receiver) = EventChannel::new();
        for processed in 1..=3 {
            sender.send(Event::Run(RunEvent::OverallProgress { processed, total: 3 }));
        }

        let seen: Vec<usize> = receiver
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                Event::Run(RunEvent::OverallProgress { processed, .. }) => Some(processed),
                _ => None,
            })
            .collect();
        assert_eq!(seen, vec![1, 2, 3]);
    }
}
