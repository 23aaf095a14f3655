//! Live component instances
//!
//! A [`ComponentInstance`] keeps an element's attributes, state, hook slots
//! and most recent output across renders. Updates go through the
//! [`Scheduler`], which batches them per microtask.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::config::RenderConfig;
use crate::element::hooks::{EffectKind, HookSlots, RenderContext};
use crate::element::{Attrs, ElementDefinition};
use crate::log::{self, LogSink};
use crate::resolver::Resolver;
use crate::scheduler::Scheduler;
use crate::RenderError;

pub struct ComponentInstance {
    definition: Rc<ElementDefinition>,
    scheduler: Option<Scheduler>,
    config: RenderConfig,
    sink: Rc<dyn LogSink>,
    this: Weak<ComponentInstance>,
    dirty: Cell<bool>,
    connected: Cell<bool>,
    pub(crate) attrs: RefCell<Attrs>,
    pub(crate) state: RefCell<Attrs>,
    pub(crate) hooks: RefCell<HookSlots>,
    output: RefCell<String>,
    renders: Cell<usize>,
}

impl ComponentInstance {
    /// Create a disconnected instance whose updates run on `scheduler`
    pub fn new(definition: Rc<ElementDefinition>, scheduler: &Scheduler) -> Rc<Self> {
        Self::build(
            definition,
            Some(scheduler.clone()),
            scheduler.config().clone(),
            scheduler.sink(),
            Attrs::new(),
        )
    }

    /// A one-shot instance for server rendering: never scheduled
    pub(crate) fn detached(
        definition: Rc<ElementDefinition>,
        attrs: Attrs,
        config: RenderConfig,
        sink: Rc<dyn LogSink>,
    ) -> Rc<Self> {
        Self::build(definition, None, config, sink, attrs)
    }

    fn build(
        definition: Rc<ElementDefinition>,
        scheduler: Option<Scheduler>,
        config: RenderConfig,
        sink: Rc<dyn LogSink>,
        attrs: Attrs,
    ) -> Rc<Self> {
        let state = definition.initial_state();
        Rc::new_cyclic(|this| Self {
            definition,
            scheduler,
            config,
            sink,
            this: Weak::clone(this),
            dirty: Cell::new(false),
            connected: Cell::new(false),
            attrs: RefCell::new(attrs),
            state: RefCell::new(state),
            hooks: RefCell::new(HookSlots::default()),
            output: RefCell::new(String::new()),
            renders: Cell::new(0),
        })
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &ElementDefinition {
        &self.definition
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    /// HTML produced by the most recent render pass
    pub fn output(&self) -> String {
        self.output.borrow().clone()
    }

    /// Number of render passes so far
    pub fn render_count(&self) -> usize {
        self.renders.get()
    }

    pub fn attrs(&self) -> Attrs {
        self.attrs.borrow().clone()
    }

    pub fn state(&self, name: &str) -> serde_json::Value {
        self.state.borrow().get(name).cloned().unwrap_or_default()
    }

    pub(crate) fn weak(&self) -> Weak<Self> {
        Weak::clone(&self.this)
    }

    fn diagnostics(&self) -> &dyn LogSink {
        log::gate(self.config.dev, &*self.sink)
    }

    /// Attach the element: validate declared attributes it lacks, then render
    pub fn connect(&self) {
        if self.connected.replace(true) {
            return;
        }
        {
            let mut attrs = self.attrs.borrow_mut();
            self.definition.fill_missing_attrs(&mut attrs, self.diagnostics());
        }
        tracing::debug!(element = %self.name(), "connected");
        self.update();
    }

    /// Detach the element and run every registered cleanup now. Renders
    /// already queued become no-ops.
    pub fn disconnect(&self) {
        if !self.connected.replace(false) {
            return;
        }
        let cleanups = self.hooks.borrow_mut().take_all_cleanups();
        tracing::debug!(element = %self.name(), cleanups = cleanups.len(), "disconnected");
        for cleanup in cleanups {
            cleanup();
        }
    }

    /// Set a raw attribute (`None` removes it) and update when connected
    pub fn set_attribute(&self, name: &str, raw: Option<&str>) {
        let (key, value) = self.definition.coerce_attr(name, raw, self.diagnostics());
        self.attrs.borrow_mut().insert(key, value);
        if self.connected.get() {
            self.update();
        }
    }

    pub fn set_state(&self, name: &str, value: impl Into<serde_json::Value>) {
        self.state.borrow_mut().insert(name.to_string(), value.into());
        self.update();
    }

    /// Request a render. Calls made while one is already pending coalesce.
    pub fn update(&self) {
        let Some(scheduler) = &self.scheduler else {
            return;
        };
        if self.dirty.replace(true) {
            return;
        }
        if let Some(this) = self.this.upgrade() {
            scheduler.enqueue_render(this);
        }
    }

    /// Render once and resolve the result
    pub fn render_to_string(&self) -> Result<String, RenderError> {
        let result = {
            let mut cx = RenderContext::new(self);
            self.definition.call_render(&mut cx)
        };
        self.renders.set(self.renders.get() + 1);
        Ok(Resolver::new(&self.config).resolve(&result)?)
    }

    /// Flush a queued render. Returns whether a render pass ran.
    pub(crate) fn perform_update(&self) -> bool {
        if !self.connected.get() {
            self.dirty.set(false);
            tracing::trace!(element = %self.name(), "dropping render of detached element");
            return false;
        }

        match self.render_to_string() {
            Ok(html) => *self.output.borrow_mut() = html,
            Err(err) => {
                tracing::error!(element = %self.name(), error = %err, "render failed");
                self.sink
                    .log_error(&format!("<{}> render failed: {}", self.name(), err));
            }
        }
        self.dirty.set(false);
        true
    }

    /// Run pending effects of one kind: each slot's previous cleanup first,
    /// then the effect, keeping the cleanup it returns
    pub(crate) fn flush_effects(&self, kind: EffectKind) {
        if !self.connected.get() {
            return;
        }
        let effects = self.hooks.borrow_mut().take_effects(kind);
        for (slot, effect) in effects {
            let previous = self.hooks.borrow_mut().take_cleanup(slot);
            if let Some(cleanup) = previous {
                cleanup();
            }
            if let Some(cleanup) = effect() {
                self.hooks.borrow_mut().set_cleanup(slot, cleanup);
            }
        }
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("name", &self.name())
            .field("dirty", &self.dirty.get())
            .field("connected", &self.connected.get())
            .field("renders", &self.renders.get())
            .finish_non_exhaustive()
    }
}
