//! Batched run-queues
//!
//! A run-queue collects items and flushes them all in one job on the event
//! loop. Only the push that makes the queue non-empty schedules that job.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::scheduler::event_loop::EventLoop;

/// Which event-loop queue a flush is scheduled on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Runner {
    Microtask,
    Task,
}

/// Order in which a flush takes items
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DequeuePolicy {
    /// Oldest first
    Fifo,
    /// Newest first
    Filo,
}

impl DequeuePolicy {
    fn pick<T>(self, items: &mut VecDeque<T>) -> Option<T> {
        match self {
            DequeuePolicy::Fifo => items.pop_front(),
            DequeuePolicy::Filo => items.pop_back(),
        }
    }
}

struct QueueInner<T> {
    items: RefCell<VecDeque<T>>,
    runner: Runner,
    policy: DequeuePolicy,
    event_loop: EventLoop,
    callback: Box<dyn Fn(T)>,
}

impl<T> QueueInner<T> {
    fn pick(&self) -> Option<T> {
        let mut items = self.items.borrow_mut();
        self.policy.pick(&mut items)
    }

    /// Hand every item to the callback, including items pushed meanwhile
    fn flush(&self) {
        let mut flushed = 0usize;
        while let Some(item) = self.pick() {
            (self.callback)(item);
            flushed += 1;
        }
        tracing::trace!(runner = ?self.runner, policy = ?self.policy, flushed, "run-queue flushed");
    }
}

pub struct RunQueue<T> {
    inner: Rc<QueueInner<T>>,
}

impl<T> Clone for RunQueue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

/// Build a run-queue that flushes on `runner`, taking items per `policy`
pub fn batch<T: 'static>(
    event_loop: &EventLoop,
    runner: Runner,
    policy: DequeuePolicy,
    callback: impl Fn(T) + 'static,
) -> RunQueue<T> {
    RunQueue {
        inner: Rc::new(QueueInner {
            items: RefCell::new(VecDeque::new()),
            runner,
            policy,
            event_loop: event_loop.clone(),
            callback: Box::new(callback),
        }),
    }
}

impl<T: 'static> RunQueue<T> {
    pub fn push(&self, item: T) {
        let len = {
            let mut items = self.inner.items.borrow_mut();
            items.push_back(item);
            items.len()
        };
        if len == 1 {
            self.schedule();
        }
    }

    fn schedule(&self) {
        let inner = Rc::clone(&self.inner);
        let flush = move || inner.flush();
        match self.inner.runner {
            Runner::Microtask => self.inner.event_loop.queue_microtask(flush),
            Runner::Task => self.inner.event_loop.queue_task(flush),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.borrow().is_empty()
    }
}
