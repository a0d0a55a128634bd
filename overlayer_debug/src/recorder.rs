// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each starting with a one-byte tag.
//! Layer keys are stored as a `u32` byte length followed by UTF-8 bytes.
//! [`decode`] reads them back as an iterator of [`RecordedEvent`].

use overlayer_core::{LayerKey, ListenerId};
use overlayer_core::trace::{
    LayerAddedEvent, LayersDestroyedEvent, NotifyCause, NotifyEvent, SubscribeEvent, TraceSink,
    UnsubscribeEvent,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_LAYER_ADDED: u8 = 1;
const TAG_LAYERS_DESTROYED: u8 = 2;
const TAG_NOTIFY: u8 = 3;
const TAG_SUBSCRIBE: u8 = 4;
const TAG_UNSUBSCRIBE: u8 = 5;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_count(&mut self, v: usize) {
        self.write_u64(u64::try_from(v).unwrap_or(u64::MAX));
    }

    fn write_key(&mut self, key: &LayerKey) {
        let bytes = key.as_str().as_bytes();
        // Keys longer than u32::MAX bytes are truncated at a char boundary.
        let mut len = bytes.len().min(u32::MAX as usize);
        while !key.as_str().is_char_boundary(len) {
            len -= 1;
        }
        #[expect(
            clippy::cast_possible_truncation,
            reason = "len is capped at u32::MAX above"
        )]
        self.write_u32(len as u32);
        self.buf.extend_from_slice(&bytes[..len]);
    }

    fn write_cause(&mut self, cause: NotifyCause) {
        self.write_u8(match cause {
            NotifyCause::Add => 0,
            NotifyCause::Destroy => 1,
            NotifyCause::Explicit => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_layer_added(&mut self, e: &LayerAddedEvent) {
        self.write_u8(TAG_LAYER_ADDED);
        self.write_u64(e.revision);
        self.write_key(&e.key);
        self.write_count(e.index);
        self.write_count(e.len);
    }

    fn on_layers_destroyed(&mut self, e: &LayersDestroyedEvent) {
        self.write_u8(TAG_LAYERS_DESTROYED);
        self.write_u64(e.revision);
        self.write_key(&e.key);
        self.write_count(e.removed);
        self.write_count(e.len);
    }

    fn on_notify(&mut self, e: &NotifyEvent) {
        self.write_u8(TAG_NOTIFY);
        self.write_u64(e.revision);
        self.write_cause(e.cause);
        self.write_count(e.listeners);
    }

    fn on_subscribe(&mut self, e: &SubscribeEvent) {
        self.write_u8(TAG_SUBSCRIBE);
        self.write_u64(e.listener.0);
        self.write_count(e.listeners);
        self.write_u8(u8::from(e.duplicate));
    }

    fn on_unsubscribe(&mut self, e: &UnsubscribeEvent) {
        self.write_u8(TAG_UNSUBSCRIBE);
        self.write_u64(e.listener.0);
        self.write_count(e.listeners);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`LayerAddedEvent`].
    LayerAdded(LayerAddedEvent),
    /// A [`LayersDestroyedEvent`].
    LayersDestroyed(LayersDestroyedEvent),
    /// A [`NotifyEvent`].
    Notify(NotifyEvent),
    /// A [`SubscribeEvent`].
    Subscribe(SubscribeEvent),
    /// An [`UnsubscribeEvent`].
    Unsubscribe(UnsubscribeEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take(&mut self, n: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        Some(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn read_count(&mut self) -> Option<usize> {
        usize::try_from(self.read_u64()?).ok()
    }

    fn read_key(&mut self) -> Option<LayerKey> {
        let len = usize::try_from(self.read_u32()?).ok()?;
        let bytes = self.take(len)?;
        core::str::from_utf8(bytes).ok().map(LayerKey::new)
    }

    fn read_cause(&mut self) -> Option<NotifyCause> {
        Some(match self.read_u8()? {
            0 => NotifyCause::Add,
            1 => NotifyCause::Destroy,
            2 => NotifyCause::Explicit,
            _ => return None,
        })
    }

    fn decode_layer_added(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LayerAdded(LayerAddedEvent {
            revision: self.read_u64()?,
            key: self.read_key()?,
            index: self.read_count()?,
            len: self.read_count()?,
        }))
    }

    fn decode_layers_destroyed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::LayersDestroyed(LayersDestroyedEvent {
            revision: self.read_u64()?,
            key: self.read_key()?,
            removed: self.read_count()?,
            len: self.read_count()?,
        }))
    }

    fn decode_notify(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Notify(NotifyEvent {
            revision: self.read_u64()?,
            cause: self.read_cause()?,
            listeners: self.read_count()?,
        }))
    }

    fn decode_subscribe(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Subscribe(SubscribeEvent {
            listener: ListenerId(self.read_u64()?),
            listeners: self.read_count()?,
            duplicate: self.read_u8()? != 0,
        }))
    }

    fn decode_unsubscribe(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Unsubscribe(UnsubscribeEvent {
            listener: ListenerId(self.read_u64()?),
            listeners: self.read_count()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_LAYER_ADDED => self.decode_layer_added(),
            TAG_LAYERS_DESTROYED => self.decode_layers_destroyed(),
            TAG_NOTIFY => self.decode_notify(),
            TAG_SUBSCRIBE => self.decode_subscribe(),
            TAG_UNSUBSCRIBE => self.decode_unsubscribe(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use overlayer_core::{Layer, LayerRegistry, Props, RenderError};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn layer_events_keep_their_keys() {
        let mut rec = RecorderSink::new();
        rec.on_layer_added(&LayerAddedEvent {
            revision: 1,
            key: LayerKey::from("toast-0"),
            index: 0,
            len: 1,
        });
        rec.on_layers_destroyed(&LayersDestroyedEvent {
            revision: 2,
            key: LayerKey::from("toast-0"),
            removed: 1,
            len: 0,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::LayerAdded(e) => {
                assert_eq!(e.revision, 1);
                assert_eq!(e.key, "toast-0");
                assert_eq!(e.len, 1);
            }
            other => panic!("expected LayerAdded, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::LayersDestroyed(e) => {
                assert_eq!(e.key, "toast-0");
                assert_eq!(e.removed, 1);
                assert_eq!(e.len, 0);
            }
            other => panic!("expected LayersDestroyed, got {other:?}"),
        }
    }

    #[test]
    fn non_ascii_keys_survive() {
        let mut rec = RecorderSink::new();
        rec.on_layer_added(&LayerAddedEvent {
            revision: 9,
            key: LayerKey::from("модал-✓"),
            index: 3,
            len: 4,
        });
        match decode(rec.as_bytes()).next() {
            Some(RecordedEvent::LayerAdded(e)) => assert_eq!(e.key, "модал-✓"),
            other => panic!("expected LayerAdded, got {other:?}"),
        }
    }

    #[test]
    fn truncated_recording_stops_cleanly() {
        let mut rec = RecorderSink::new();
        rec.on_notify(&NotifyEvent {
            revision: 5,
            cause: NotifyCause::Explicit,
            listeners: 2,
        });
        rec.on_subscribe(&SubscribeEvent {
            listener: ListenerId(1),
            listeners: 1,
            duplicate: false,
        });
        let bytes = rec.into_bytes();
        let cut = &bytes[..bytes.len() - 3];

        let events: Vec<_> = decode(cut).collect();
        assert_eq!(events.len(), 1, "only the complete record decodes");
        assert!(matches!(
            events[0],
            RecordedEvent::Notify(NotifyEvent {
                revision: 5,
                cause: NotifyCause::Explicit,
                listeners: 2,
            })
        ));
    }

    #[test]
    fn unknown_tag_stops_iteration() {
        assert_eq!(decode(&[0xFF, 1, 2, 3]).count(), 0);
    }

    #[test]
    fn unknown_cause_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_notify(&NotifyEvent {
            revision: 4,
            cause: NotifyCause::Explicit,
            listeners: 1,
        });
        let mut bytes = rec.as_bytes().to_vec();
        assert_eq!(decode(&bytes).count(), 1);

        // tag, then an 8-byte revision, then the cause
        bytes[9] = 7;
        assert_eq!(decode(&bytes).count(), 0);
    }

    #[test]
    fn records_a_live_registry() {
        let recorder = Rc::new(RefCell::new(RecorderSink::new()));
        let registry = LayerRegistry::<()>::new();
        registry.set_trace_sink(recorder.clone());

        let sub = registry.subscribe_fn(|| {});
        registry.add(Layer::from_component("m", |_: &Props| Ok::<(), RenderError>(())));
        registry.destroy("m");
        drop(sub);

        let bytes = recorder.borrow().as_bytes().to_vec();
        let tags: Vec<&str> = decode(&bytes)
            .map(|e| match e {
                RecordedEvent::LayerAdded(_) => "add",
                RecordedEvent::LayersDestroyed(_) => "destroy",
                RecordedEvent::Notify(_) => "notify",
                RecordedEvent::Subscribe(_) => "subscribe",
                RecordedEvent::Unsubscribe(_) => "unsubscribe",
            })
            .collect();
        assert_eq!(
            tags,
            ["subscribe", "add", "notify", "destroy", "notify", "unsubscribe"]
        );
    }
}
