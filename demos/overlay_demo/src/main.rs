// Copyright 2026 the Overlayer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Headless overlay session that exercises the registry, the portal, and the
//! diagnostics pipeline.
//!
//! Opens a confirmation modal, stacks a few toasts, lets one component fail,
//! and closes everything again, syncing a [`MemorySurface`] after each step.
//! Events go to both a
//! [`PrettyPrintSink`](overlayer_debug::pretty::PrettyPrintSink) (stdout) and
//! a [`RecorderSink`](overlayer_debug::recorder::RecorderSink), which is then
//! exported as a Chrome trace JSON file.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufWriter;
use std::rc::Rc;

use overlayer_core::trace::{
    LayerAddedEvent, LayersDestroyedEvent, NotifyEvent, SubscribeEvent, TraceSink,
    UnsubscribeEvent,
};
use overlayer_core::{Layer, LayerRegistry, Props, RenderError};
use overlayer_render::{DEFAULT_CONTAINER_ID, MemoryDocument, MemorySurface, Portal};

use overlayer_debug::pretty::PrettyPrintSink;
use overlayer_debug::recorder::RecorderSink;

const TOAST_COUNT: usize = 3;

/// Forwards every event to two sinks.
struct Tee<A, B>(A, B);

impl<A: TraceSink, B: TraceSink> TraceSink for Tee<A, B> {
    fn on_layer_added(&mut self, e: &LayerAddedEvent) {
        self.0.on_layer_added(e);
        self.1.on_layer_added(e);
    }

    fn on_layers_destroyed(&mut self, e: &LayersDestroyedEvent) {
        self.0.on_layers_destroyed(e);
        self.1.on_layers_destroyed(e);
    }

    fn on_notify(&mut self, e: &NotifyEvent) {
        self.0.on_notify(e);
        self.1.on_notify(e);
    }

    fn on_subscribe(&mut self, e: &SubscribeEvent) {
        self.0.on_subscribe(e);
        self.1.on_subscribe(e);
    }

    fn on_unsubscribe(&mut self, e: &UnsubscribeEvent) {
        self.0.on_unsubscribe(e);
        self.1.on_unsubscribe(e);
    }
}

fn modal(props: &Props) -> Result<String, RenderError> {
    let title = props.get::<&str>().copied().unwrap_or("Untitled");
    Ok(format!("<dialog>{title}</dialog>"))
}

fn toast(props: &Props) -> Result<String, RenderError> {
    let n = props
        .get::<usize>()
        .ok_or_else(|| RenderError::new("toast needs a number"))?;
    Ok(format!("<output>toast #{n}</output>"))
}

fn main() {
    // -- sinks -------------------------------------------------------------
    let sink = Rc::new(RefCell::new(Tee(
        PrettyPrintSink::new(Box::new(std::io::stdout())),
        RecorderSink::new(),
    )));

    // -- registry and portal -----------------------------------------------
    let registry = LayerRegistry::<String>::new();
    registry.set_trace_sink(sink.clone());

    let document = MemoryDocument::new();
    let mut portal = Portal::mount(
        &registry,
        MemorySurface::attach(&document, DEFAULT_CONTAINER_ID),
    );

    // -- session -----------------------------------------------------------
    let confirm = registry.create_layer_with_key("confirm", modal);
    confirm.render(Props::new("Discard changes?"));
    step(&mut portal, "modal opened");

    for n in 0..TOAST_COUNT {
        registry.add(Layer::from_component("toast", toast).with_props(Props::new(n)));
    }
    // Missing props: this one fails to render and stays unmounted.
    registry.add(Layer::from_component("toast", toast));
    step(&mut portal, "toasts stacked");

    // The modal closes itself through the handle its layer carries.
    if let Some(layer) = registry.snapshot().iter().find(|l| l.key() == "confirm") {
        layer.destroy();
    }
    step(&mut portal, "modal closed");

    registry.destroy("toast");
    step(&mut portal, "toasts cleared");

    drop(portal.unmount());
    registry.clear_trace_sink();

    // -- export Chrome trace -----------------------------------------------
    let path = "overlay_trace.json";
    let file = File::create(path).expect("failed to create overlay_trace.json");
    let mut writer = BufWriter::new(file);
    overlayer_debug::chrome::export(sink.borrow().1.as_bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!("Wrote {path} (revision {})", registry.revision());
}

fn step(portal: &mut Portal<String, MemorySurface<String>>, label: &str) {
    portal.sync();
    println!("-- {label}");
    for view in portal.surface().views() {
        println!("   {view}");
    }
    for failure in portal.failures() {
        println!("   ! {failure}");
    }
}
