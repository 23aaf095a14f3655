//! Update scheduling for live component instances
//!
//! Three run-queues sit on top of the [`EventLoop`]:
//!
//! - renders flush on a microtask, oldest first
//! - layout effects flush on a microtask after the renders, newest first
//! - passive effects flush on a later task, newest first
//!
//! Newest-first effect queues run a child's effects before its parent's,
//! since parents render (and enqueue) before the children they connect.

pub mod event_loop;
pub mod queue;

use std::fmt;
use std::rc::Rc;

use crate::config::RenderConfig;
use crate::element::hooks::EffectKind;
use crate::element::instance::ComponentInstance;
use crate::log::{LogSink, TracingSink};

pub use event_loop::EventLoop;
pub use queue::{batch, DequeuePolicy, RunQueue, Runner};

struct Inner {
    event_loop: EventLoop,
    render: RunQueue<Rc<ComponentInstance>>,
    layout_effects: RunQueue<Rc<ComponentInstance>>,
    effects: RunQueue<Rc<ComponentInstance>>,
    config: RenderConfig,
    sink: Rc<dyn LogSink>,
}

#[derive(Clone)]
pub struct Scheduler {
    inner: Rc<Inner>,
}

impl Scheduler {
    pub fn new(event_loop: &EventLoop) -> Self {
        Self::with_config(event_loop, RenderConfig::default(), Rc::new(TracingSink))
    }

    pub fn with_config(event_loop: &EventLoop, config: RenderConfig, sink: Rc<dyn LogSink>) -> Self {
        let layout_effects = batch(
            event_loop,
            Runner::Microtask,
            DequeuePolicy::Filo,
            |instance: Rc<ComponentInstance>| instance.flush_effects(EffectKind::Layout),
        );
        let effects = batch(
            event_loop,
            Runner::Task,
            DequeuePolicy::Filo,
            |instance: Rc<ComponentInstance>| instance.flush_effects(EffectKind::Passive),
        );

        let render = {
            let layout_effects = layout_effects.clone();
            let effects = effects.clone();
            batch(
                event_loop,
                Runner::Microtask,
                DequeuePolicy::Fifo,
                move |instance: Rc<ComponentInstance>| {
                    if instance.perform_update() {
                        tracing::trace!(element = %instance.name(), renders = instance.render_count(), "rendered");
                        layout_effects.push(Rc::clone(&instance));
                        effects.push(instance);
                    }
                },
            )
        };

        Self {
            inner: Rc::new(Inner {
                event_loop: event_loop.clone(),
                render,
                layout_effects,
                effects,
                config,
                sink,
            }),
        }
    }

    pub(crate) fn enqueue_render(&self, instance: Rc<ComponentInstance>) {
        tracing::debug!(element = %instance.name(), "render queued");
        self.inner.render.push(instance);
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.inner.event_loop
    }

    pub fn config(&self) -> &RenderConfig {
        &self.inner.config
    }

    pub fn sink(&self) -> Rc<dyn LogSink> {
        Rc::clone(&self.inner.sink)
    }

    /// Instances waiting to render
    pub fn pending_renders(&self) -> usize {
        self.inner.render.len()
    }

    /// Instances waiting for their passive effects
    pub fn pending_effects(&self) -> usize {
        self.inner.effects.len()
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("event_loop", &self.inner.event_loop)
            .field("renders", &self.inner.render.len())
            .field("layout_effects", &self.inner.layout_effects.len())
            .field("effects", &self.inner.effects.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementDefinition;
    use crate::html;
    use crate::log::RecordingSink;
    use std::cell::RefCell;

    fn scheduler(event_loop: &EventLoop) -> Scheduler {
        Scheduler::with_config(event_loop, RenderConfig::default(), Rc::new(RecordingSink::new()))
    }

    fn effect_logger(name: &'static str, log: Rc<RefCell<Vec<String>>>) -> ElementDefinition {
        ElementDefinition::new(name, move |cx| {
            let l = log.clone();
            cx.use_effect_always(move || {
                l.borrow_mut().push(format!("{name}:effect"));
                None
            });
            let l = log.clone();
            cx.use_layout_effect_always(move || {
                l.borrow_mut().push(format!("{name}:layout"));
                None
            });
            html!(["<p>", "</p>"], name)
        })
    }

    #[test]
    fn test_updates_coalesce_into_one_render() {
        let event_loop = EventLoop::new();
        let scheduler = scheduler(&event_loop);
        let definition = Rc::new(ElementDefinition::new("x-count", |cx| {
            html!(["", ""], cx.state("n"))
        }));
        let instance = ComponentInstance::new(definition, &scheduler);
        instance.connect();
        for n in 0..5 {
            instance.set_state("n", n);
        }
        assert_eq!(scheduler.pending_renders(), 1);

        event_loop.run_until_idle();
        assert_eq!(instance.render_count(), 1);
        assert_eq!(instance.output(), "4");
        assert!(!instance.is_dirty());
    }

    #[test]
    fn test_nothing_renders_before_the_loop_runs() {
        let event_loop = EventLoop::new();
        let scheduler = scheduler(&event_loop);
        let definition = Rc::new(ElementDefinition::new("x-idle", |_| html!(["idle"])));
        let instance = ComponentInstance::new(definition, &scheduler);
        instance.connect();
        assert_eq!(instance.render_count(), 0);
        assert!(instance.is_dirty());
    }

    #[test]
    fn test_disconnect_before_flush_skips_render() {
        let event_loop = EventLoop::new();
        let scheduler = scheduler(&event_loop);
        let definition = Rc::new(ElementDefinition::new("x-gone", |_| html!(["gone"])));
        let instance = ComponentInstance::new(definition, &scheduler);
        instance.connect();
        instance.disconnect();

        event_loop.run_until_idle();
        assert_eq!(instance.render_count(), 0);
        assert!(!instance.is_dirty());
    }

    #[test]
    fn test_effects_run_newest_first_and_layout_before_passive() {
        let event_loop = EventLoop::new();
        let scheduler = scheduler(&event_loop);
        let log = Rc::new(RefCell::new(Vec::new()));

        let parent = ComponentInstance::new(Rc::new(effect_logger("x-parent", log.clone())), &scheduler);
        let child = ComponentInstance::new(Rc::new(effect_logger("x-child", log.clone())), &scheduler);
        parent.connect();
        child.connect();

        event_loop.run_microtasks();
        assert_eq!(*log.borrow(), vec!["x-child:layout", "x-parent:layout"]);
        assert_eq!(scheduler.pending_effects(), 2);

        event_loop.run_until_idle();
        assert_eq!(
            *log.borrow(),
            vec!["x-child:layout", "x-parent:layout", "x-child:effect", "x-parent:effect"]
        );
    }

    #[test]
    fn test_setter_from_effect_triggers_one_more_render() {
        let event_loop = EventLoop::new();
        let scheduler = scheduler(&event_loop);
        let definition = Rc::new(ElementDefinition::new("x-loaded", |cx| {
            let (loaded, set_loaded) = cx.use_state(|| false);
            cx.use_effect((), move || {
                set_loaded.set(true);
                None
            });
            html!(["", ""], loaded)
        }));
        let instance = ComponentInstance::new(definition, &scheduler);
        instance.connect();

        event_loop.run_until_idle();
        assert_eq!(instance.render_count(), 2);
        assert_eq!(instance.output(), "true");
    }
}
