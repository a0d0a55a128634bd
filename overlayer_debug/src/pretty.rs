// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use overlayer_core::trace::{
    LayerAddedEvent, LayersDestroyedEvent, NotifyCause, NotifyEvent, SubscribeEvent, TraceSink,
    UnsubscribeEvent,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn cause_name(cause: NotifyCause) -> &'static str {
    match cause {
        NotifyCause::Add => "add",
        NotifyCause::Destroy => "destroy",
        NotifyCause::Explicit => "explicit",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_layer_added(&mut self, e: &LayerAddedEvent) {
        let _ = writeln!(
            self.writer,
            "[add] rev={} key={} index={} len={}",
            e.revision, e.key, e.index, e.len,
        );
    }

    fn on_layers_destroyed(&mut self, e: &LayersDestroyedEvent) {
        let _ = writeln!(
            self.writer,
            "[destroy] rev={} key={} removed={} len={}",
            e.revision, e.key, e.removed, e.len,
        );
    }

    fn on_notify(&mut self, e: &NotifyEvent) {
        let _ = writeln!(
            self.writer,
            "[notify] rev={} cause={} listeners={}",
            e.revision,
            cause_name(e.cause),
            e.listeners,
        );
    }

    fn on_subscribe(&mut self, e: &SubscribeEvent) {
        let dup = if e.duplicate { " (duplicate)" } else { "" };
        let _ = writeln!(
            self.writer,
            "[subscribe] listener={} listeners={}{dup}",
            e.listener.0, e.listeners,
        );
    }

    fn on_unsubscribe(&mut self, e: &UnsubscribeEvent) {
        let _ = writeln!(
            self.writer,
            "[unsubscribe] listener={} listeners={}",
            e.listener.0, e.listeners,
        );
    }
}
