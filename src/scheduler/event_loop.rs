//! A single-threaded event loop with microtask and task queues

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type Job = Box<dyn FnOnce()>;

#[derive(Default)]
struct Queues {
    microtasks: RefCell<VecDeque<Job>>,
    tasks: RefCell<VecDeque<Job>>,
}

/// Microtasks run to exhaustion before the next task; each task is followed
/// by a microtask checkpoint. Nothing runs until the host drives the loop.
#[derive(Clone, Default)]
pub struct EventLoop {
    queues: Rc<Queues>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_microtask(&self, job: impl FnOnce() + 'static) {
        self.queues.microtasks.borrow_mut().push_back(Box::new(job));
    }

    pub fn queue_task(&self, job: impl FnOnce() + 'static) {
        self.queues.tasks.borrow_mut().push_back(Box::new(job));
    }

    /// Drain the microtask queue, including microtasks queued while draining.
    /// Returns how many ran.
    pub fn run_microtasks(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.queues.microtasks.borrow_mut().pop_front();
            let Some(job) = next else {
                break;
            };
            job();
            ran += 1;
        }
        ran
    }

    /// Run the oldest task followed by a microtask checkpoint. Returns
    /// whether a task ran.
    pub fn run_task(&self) -> bool {
        let next = self.queues.tasks.borrow_mut().pop_front();
        let Some(job) = next else {
            return false;
        };
        job();
        self.run_microtasks();
        true
    }

    /// Run microtasks and tasks until both queues are empty
    pub fn run_until_idle(&self) {
        self.run_microtasks();
        while self.run_task() {}
    }

    pub fn pending_microtasks(&self) -> usize {
        self.queues.microtasks.borrow().len()
    }

    pub fn pending_tasks(&self) -> usize {
        self.queues.tasks.borrow().len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending_microtasks() == 0 && self.pending_tasks() == 0
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("microtasks", &self.pending_microtasks())
            .field("tasks", &self.pending_tasks())
            .finish()
    }
}
