// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use overlayer_core::trace::NotifyCause;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of instant events, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
///
/// Registry events carry no wall-clock time, so `ts` is the event's position
/// in the recording (one microsecond apart).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();

    for (ts, recorded) in decode(bytes).enumerate() {
        let (name, cat, args) = match recorded {
            RecordedEvent::LayerAdded(e) => (
                "LayerAdded",
                "Registry",
                json!({
                    "revision": e.revision,
                    "key": e.key.as_str(),
                    "index": e.index,
                    "len": e.len,
                }),
            ),
            RecordedEvent::LayersDestroyed(e) => (
                "LayersDestroyed",
                "Registry",
                json!({
                    "revision": e.revision,
                    "key": e.key.as_str(),
                    "removed": e.removed,
                    "len": e.len,
                }),
            ),
            RecordedEvent::Notify(e) => (
                "Notify",
                "Registry",
                json!({
                    "revision": e.revision,
                    "cause": cause_name(e.cause),
                    "listeners": e.listeners,
                }),
            ),
            RecordedEvent::Subscribe(e) => (
                "Subscribe",
                "Subscription",
                json!({
                    "listener": e.listener.0,
                    "listeners": e.listeners,
                    "duplicate": e.duplicate,
                }),
            ),
            RecordedEvent::Unsubscribe(e) => (
                "Unsubscribe",
                "Subscription",
                json!({
                    "listener": e.listener.0,
                    "listeners": e.listeners,
                }),
            ),
        };
        events.push(json!({
            "ph": "i",
            "name": name,
            "cat": cat,
            "ts": ts,
            "pid": 0,
            "tid": 0,
            "s": "t",
            "args": args,
        }));
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn cause_name(cause: NotifyCause) -> &'static str {
    match cause {
        NotifyCause::Add => "Add",
        NotifyCause::Destroy => "Destroy",
        NotifyCause::Explicit => "Explicit",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use overlayer_core::LayerKey;
    use overlayer_core::trace::{LayerAddedEvent, NotifyEvent, TraceSink};

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_layer_added(&LayerAddedEvent {
            revision: 1,
            key: LayerKey::from("modal"),
            index: 0,
            len: 1,
        });
        rec.on_notify(&NotifyEvent {
            revision: 1,
            cause: NotifyCause::Add,
            listeners: 2,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        // Should parse as a JSON array.
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 2);

        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "LayerAdded");
        assert_eq!(parsed[0]["args"]["key"], "modal");
        assert_eq!(parsed[0]["ts"], 0);

        assert_eq!(parsed[1]["name"], "Notify");
        assert_eq!(parsed[1]["args"]["cause"], "Add");
        assert_eq!(parsed[1]["args"]["listeners"], 2);
        assert_eq!(parsed[1]["ts"], 1);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
