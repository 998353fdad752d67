use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

type Job = Box<dyn FnOnce()>;

/// Single-threaded FIFO job queue standing in for the UI thread's
/// dispatch queue.
///
/// Deferred work (focus application after a pane opens, restoration
/// retries gated on an element's ready signal, modal close completions)
/// is enqueued here and drained by the host loop between input events.
/// Jobs run in issue order; a job may enqueue further jobs, which run in
/// the same drain.
#[derive(Clone, Default)]
pub struct Dispatcher {
    queue: Rc<RefCell<VecDeque<Job>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a job to run on the next drain.
    pub fn defer(&self, job: impl FnOnce() + 'static) {
        self.queue.borrow_mut().push_back(Box::new(job));
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run queued jobs until the queue is empty, including jobs enqueued
    /// while draining. Returns the number of jobs executed.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        loop {
            // Pop one at a time: the job body may re-borrow the queue.
            let job = self.queue.borrow_mut().pop_front();
            let Some(job) = job else {
                break;
            };
            job();
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(jobs = ran, "dispatcher drained");
        }
        ran
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pending", &self.pending())
            .finish()
    }
}
