//! Hook slots and the render context
//!
//! Every hook call during a render takes the next slot of its instance, so
//! hooks must be called in the same order on every render. Slots hold
//! type-erased values; a slot read back with a different type than it was
//! written with is treated as uninitialized.

use std::any::Any;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::element::instance::ComponentInstance;
use crate::element::Attrs;
use crate::value::{Callback, Value};

/// Undo work done by an effect
pub type Cleanup = Box<dyn FnOnce()>;

type Effect = Box<dyn FnOnce() -> Option<Cleanup>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    /// Runs in the microtask after the render pass
    Layout,
    /// Runs in a later task
    Passive,
}

fn slot_mut<T>(slots: &mut Vec<Option<T>>, index: usize) -> &mut Option<T> {
    if slots.len() <= index {
        slots.resize_with(index + 1, || None);
    }
    &mut slots[index]
}

#[derive(Default)]
pub(crate) struct HookSlots {
    values: Vec<Option<Box<dyn Any>>>,
    deps: Vec<Option<Box<dyn Any>>>,
    effects: Vec<Option<Effect>>,
    layout_effects: Vec<Option<Effect>>,
    cleanups: Vec<Option<Cleanup>>,
}

impl HookSlots {
    fn value<T: 'static>(&self, slot: usize) -> Option<&T> {
        self.values.get(slot)?.as_ref()?.downcast_ref::<T>()
    }

    fn set_value<T: 'static>(&mut self, slot: usize, value: T) {
        *slot_mut(&mut self.values, slot) = Some(Box::new(value));
    }

    fn deps_match<D: PartialEq + 'static>(&self, slot: usize, deps: &D) -> bool {
        self.deps
            .get(slot)
            .and_then(Option::as_ref)
            .and_then(|stored| stored.downcast_ref::<D>())
            .is_some_and(|stored| stored == deps)
    }

    fn set_deps<D: 'static>(&mut self, slot: usize, deps: D) {
        *slot_mut(&mut self.deps, slot) = Some(Box::new(deps));
    }

    fn queue_effect(&mut self, kind: EffectKind, slot: usize, effect: Effect) {
        let effects = match kind {
            EffectKind::Layout => &mut self.layout_effects,
            EffectKind::Passive => &mut self.effects,
        };
        *slot_mut(effects, slot) = Some(effect);
    }

    /// Remove the pending effects of one kind, in slot order
    pub(crate) fn take_effects(&mut self, kind: EffectKind) -> Vec<(usize, Effect)> {
        let effects = match kind {
            EffectKind::Layout => &mut self.layout_effects,
            EffectKind::Passive => &mut self.effects,
        };
        effects
            .iter_mut()
            .enumerate()
            .filter_map(|(slot, effect)| effect.take().map(|e| (slot, e)))
            .collect()
    }

    pub(crate) fn take_cleanup(&mut self, slot: usize) -> Option<Cleanup> {
        self.cleanups.get_mut(slot).and_then(Option::take)
    }

    pub(crate) fn set_cleanup(&mut self, slot: usize, cleanup: Cleanup) {
        *slot_mut(&mut self.cleanups, slot) = Some(cleanup);
    }

    pub(crate) fn take_all_cleanups(&mut self) -> Vec<Cleanup> {
        self.cleanups.iter_mut().filter_map(Option::take).collect()
    }
}

/// Sets a `use_state` slot and schedules an update when the value changes
pub struct Setter<T> {
    instance: Weak<ComponentInstance>,
    slot: usize,
    _marker: PhantomData<fn(T)>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            instance: Weak::clone(&self.instance),
            slot: self.slot,
            _marker: PhantomData,
        }
    }
}

impl<T: Clone + PartialEq + 'static> Setter<T> {
    pub fn set(&self, next: T) {
        self.set_with(|_| next);
    }

    /// Compute the next value from the current one
    pub fn set_with(&self, f: impl FnOnce(&T) -> T) {
        let Some(instance) = self.instance.upgrade() else {
            return;
        };
        let Some(current) = instance.hooks.borrow().value::<T>(self.slot).cloned() else {
            return;
        };
        let next = f(&current);
        if next != current {
            instance.hooks.borrow_mut().set_value(self.slot, next);
            instance.update();
        }
    }
}

/// Sends actions to a `use_reducer` slot
pub struct Dispatch<S, A> {
    instance: Weak<ComponentInstance>,
    slot: usize,
    reducer: Rc<dyn Fn(&S, A) -> S>,
}

impl<S, A> Clone for Dispatch<S, A> {
    fn clone(&self) -> Self {
        Self {
            instance: Weak::clone(&self.instance),
            slot: self.slot,
            reducer: Rc::clone(&self.reducer),
        }
    }
}

impl<S: Clone + PartialEq + 'static, A> Dispatch<S, A> {
    pub fn dispatch(&self, action: A) {
        let Some(instance) = self.instance.upgrade() else {
            return;
        };
        let Some(current) = instance.hooks.borrow().value::<S>(self.slot).cloned() else {
            return;
        };
        let next = (self.reducer)(&current, action);
        if next != current {
            instance.hooks.borrow_mut().set_value(self.slot, next);
            instance.update();
        }
    }
}

/// Reads and writes one declared state field
#[derive(Clone)]
pub struct StateHandle {
    instance: Weak<ComponentInstance>,
    name: String,
}

impl StateHandle {
    pub fn get(&self) -> serde_json::Value {
        self.instance
            .upgrade()
            .map_or(serde_json::Value::Null, |instance| instance.state(&self.name))
    }

    pub fn set(&self, value: impl Into<serde_json::Value>) {
        if let Some(instance) = self.instance.upgrade() {
            instance.set_state(&self.name, value);
        }
    }
}

/// Handed to an element's render function
pub struct RenderContext<'a> {
    instance: &'a ComponentInstance,
    computed: Attrs,
    cursor: usize,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(instance: &'a ComponentInstance) -> Self {
        let computed = {
            let state = instance.state.borrow();
            instance
                .definition()
                .computed_fields()
                .iter()
                .map(|field| {
                    let inputs: Vec<serde_json::Value> = field
                        .deps
                        .iter()
                        .map(|dep| state.get(dep).cloned().unwrap_or_default())
                        .collect();
                    (field.name.clone(), field.compute(&inputs))
                })
                .collect()
        };
        Self {
            instance,
            computed,
            cursor: 0,
        }
    }

    fn next_slot(&mut self) -> usize {
        let slot = self.cursor;
        self.cursor += 1;
        slot
    }

    /// Tag name of the element being rendered
    pub fn name(&self) -> &str {
        self.instance.name()
    }

    /// A parsed attribute, or null when absent
    pub fn attr(&self, name: &str) -> serde_json::Value {
        self.instance.attrs.borrow().get(name).cloned().unwrap_or_default()
    }

    pub fn attrs(&self) -> Attrs {
        self.instance.attrs()
    }

    /// A declared state field, or null when absent
    pub fn state(&self, name: &str) -> serde_json::Value {
        self.instance.state(name)
    }

    /// Write a declared state field and schedule an update
    pub fn set_state(&self, name: &str, value: impl Into<serde_json::Value>) {
        self.instance.set_state(name, value);
    }

    /// A handle for changing state later, e.g. from an event callback
    pub fn state_handle(&self, name: &str) -> StateHandle {
        StateHandle {
            instance: self.instance.weak(),
            name: name.to_string(),
        }
    }

    /// A computed field, evaluated at the start of this render
    pub fn computed(&self, name: &str) -> serde_json::Value {
        self.computed.get(name).cloned().unwrap_or_default()
    }

    pub fn use_state<T: Clone + PartialEq + 'static>(&mut self, init: impl FnOnce() -> T) -> (T, Setter<T>) {
        let slot = self.next_slot();
        let value = self.slot_value_or_init(slot, init);
        let setter = Setter {
            instance: self.instance.weak(),
            slot,
            _marker: PhantomData,
        };
        (value, setter)
    }

    pub fn use_reducer<S, A>(
        &mut self,
        reducer: impl Fn(&S, A) -> S + 'static,
        init: impl FnOnce() -> S,
    ) -> (S, Dispatch<S, A>)
    where
        S: Clone + PartialEq + 'static,
    {
        let slot = self.next_slot();
        let state = self.slot_value_or_init(slot, init);
        let dispatch = Dispatch {
            instance: self.instance.weak(),
            slot,
            reducer: Rc::new(reducer),
        };
        (state, dispatch)
    }

    /// A mutable cell that survives renders without triggering them
    pub fn use_ref<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
        let slot = self.next_slot();
        self.slot_value_or_init(slot, || Rc::new(RefCell::new(init())))
    }

    /// Recompute only when `deps` differ from the previous render
    pub fn use_memo<T, D>(&mut self, deps: D, compute: impl FnOnce() -> T) -> T
    where
        T: Clone + 'static,
        D: PartialEq + 'static,
    {
        let slot = self.next_slot();
        let cached = {
            let hooks = self.instance.hooks.borrow();
            if hooks.deps_match(slot, &deps) {
                hooks.value::<T>(slot).cloned()
            } else {
                None
            }
        };
        if let Some(value) = cached {
            return value;
        }

        let value = compute();
        let mut hooks = self.instance.hooks.borrow_mut();
        hooks.set_value(slot, value.clone());
        hooks.set_deps(slot, deps);
        value
    }

    /// The same callback on every render until `deps` change
    pub fn use_callback<D: PartialEq + 'static>(
        &mut self,
        deps: D,
        callback: impl Fn(&[Value]) + 'static,
    ) -> Callback {
        self.use_memo(deps, move || Callback::new(callback))
    }

    /// Run `effect` after the render when `deps` changed
    pub fn use_effect<D: PartialEq + 'static>(
        &mut self,
        deps: D,
        effect: impl FnOnce() -> Option<Cleanup> + 'static,
    ) {
        self.effect_hook(EffectKind::Passive, Some(deps), effect);
    }

    /// Run `effect` after every render
    pub fn use_effect_always(&mut self, effect: impl FnOnce() -> Option<Cleanup> + 'static) {
        self.effect_hook(EffectKind::Passive, None::<()>, effect);
    }

    pub fn use_layout_effect<D: PartialEq + 'static>(
        &mut self,
        deps: D,
        effect: impl FnOnce() -> Option<Cleanup> + 'static,
    ) {
        self.effect_hook(EffectKind::Layout, Some(deps), effect);
    }

    pub fn use_layout_effect_always(&mut self, effect: impl FnOnce() -> Option<Cleanup> + 'static) {
        self.effect_hook(EffectKind::Layout, None::<()>, effect);
    }

    fn effect_hook<D: PartialEq + 'static>(
        &mut self,
        kind: EffectKind,
        deps: Option<D>,
        effect: impl FnOnce() -> Option<Cleanup> + 'static,
    ) {
        let slot = self.next_slot();
        let mut hooks = self.instance.hooks.borrow_mut();
        if let Some(deps) = deps {
            if hooks.deps_match(slot, &deps) {
                return;
            }
            hooks.set_deps(slot, deps);
        }
        hooks.queue_effect(kind, slot, Box::new(effect));
    }

    fn slot_value_or_init<T: Clone + 'static>(&self, slot: usize, init: impl FnOnce() -> T) -> T {
        if let Some(value) = self.instance.hooks.borrow().value::<T>(slot) {
            return value.clone();
        }
        let value = init();
        self.instance.hooks.borrow_mut().set_value(slot, value.clone());
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_values_are_typed() {
        let mut slots = HookSlots::default();
        slots.set_value(2, 7_i32);
        assert_eq!(slots.value::<i32>(2), Some(&7));
        assert_eq!(slots.value::<String>(2), None);
        assert_eq!(slots.value::<i32>(0), None);
    }

    #[test]
    fn test_deps_match() {
        let mut slots = HookSlots::default();
        assert!(!slots.deps_match(0, &(1, "a")));
        slots.set_deps(0, (1, "a"));
        assert!(slots.deps_match(0, &(1, "a")));
        assert!(!slots.deps_match(0, &(2, "a")));
    }

    #[test]
    fn test_effects_are_taken_once_in_slot_order() {
        let mut slots = HookSlots::default();
        slots.queue_effect(EffectKind::Passive, 3, Box::new(|| None));
        slots.queue_effect(EffectKind::Passive, 1, Box::new(|| None));
        slots.queue_effect(EffectKind::Layout, 0, Box::new(|| None));

        let taken: Vec<usize> = slots
            .take_effects(EffectKind::Passive)
            .into_iter()
            .map(|(slot, _)| slot)
            .collect();
        assert_eq!(taken, vec![1, 3]);
        assert!(slots.take_effects(EffectKind::Passive).is_empty());
        assert_eq!(slots.take_effects(EffectKind::Layout).len(), 1);
    }

    #[test]
    fn test_cleanups() {
        let mut slots = HookSlots::default();
        slots.set_cleanup(1, Box::new(|| {}));
        assert!(slots.take_cleanup(0).is_none());
        assert!(slots.take_cleanup(1).is_some());
        slots.set_cleanup(2, Box::new(|| {}));
        assert_eq!(slots.take_all_cleanups().len(), 1);
    }
}
