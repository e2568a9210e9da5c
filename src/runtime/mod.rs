//! A deliberately single-threaded cooperative coroutine runtime.
//!
//! Coroutines are plain Rust futures. The runtime keeps a FIFO of
//! suspended coroutines, each paired with a resumption predicate and the
//! id of the party owning it; a scheduling pass scans that queue in
//! insertion order and resumes the first coroutine whose owner is not
//! cancelled and whose predicate holds. Nothing ever runs in parallel and
//! nothing is pre-empted: the only suspension points are the awaitables
//! this module exports ([`suspend_until`], [`sleep`], [`Task`], [`batch`]).
//!
//! Predicates must be side-effect-free; the scheduler evaluates them as
//! often as it likes.
//!
//! The executing runtime is exposed through a scoped thread-local, the way
//! async ecosystems expose their runtime context; that is what lets a
//! deeply nested channel implementation suspend its caller without
//! threading a runtime handle through every signature.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

use crate::Result;

/// Glue between the runtime and the simulator.
///
/// The default runtime has no observer: sleeps are real and nobody is
/// cancelled. The simulator installs one to virtualize time and to skip
/// coroutines of cancelled parties.
pub(crate) trait RuntimeObserver {
    /// Called right before resuming a coroutine owned by `party`.
    fn on_resume(&self, party: Option<usize>);

    /// Intercepts an awaited sleep. `None` means "not handled, sleep in
    /// real time"; `Some(result)` means the sleep was virtual and resolves
    /// immediately with `result`.
    fn on_sleep(&self, party: Option<usize>, duration: Duration) -> Option<Result<()>>;

    /// Whether `party`'s coroutines should be skipped.
    fn is_cancelled(&self, party: usize) -> bool;
}

type BoxedFuture = Pin<Box<dyn Future<Output = ()>>>;
type Predicate = Box<dyn Fn() -> bool>;

struct TaskState {
    future: Option<BoxedFuture>,
    done: bool,
    party: Option<usize>,
}

type TaskRef = Rc<RefCell<TaskState>>;

struct Entry {
    task: TaskRef,
    predicate: Predicate,
}

struct Inner {
    queue: RefCell<VecDeque<Entry>>,
    observer: Option<Rc<dyn RuntimeObserver>>,
}

/// The runtime. Cheap to clone; clones share the task queue.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<Inner>,
}

/// A handle to a spawned coroutine.
///
/// Awaiting the handle suspends the caller until the coroutine finishes
/// and yields its result. A task owned by a cancelled party never
/// finishes.
pub struct Task<T> {
    state: TaskRef,
    result: Rc<RefCell<Option<T>>>,
}

impl<T> Task<T> {
    /// Whether the underlying coroutine has run to completion.
    pub fn is_done(&self) -> bool {
        self.state.borrow().done
    }

    fn party(&self) -> Option<usize> {
        self.state.borrow().party
    }

    fn take_result(&self) -> Option<T> {
        self.result.borrow_mut().take()
    }
}

thread_local! {
    static CURRENT: RefCell<Vec<ExecContext>> = const { RefCell::new(Vec::new()) };
}

#[derive(Clone)]
struct ExecContext {
    runtime: Weak<Inner>,
    task: Weak<RefCell<TaskState>>,
    party: Option<usize>,
}

fn current() -> ExecContext {
    CURRENT.with(|stack| {
        stack
            .borrow()
            .last()
            .cloned()
            .expect("not inside a runtime; awaitables only work under Runtime::run")
    })
}

impl Runtime {
    /// A runtime with real-time sleeps and no cancellation.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                queue: RefCell::new(VecDeque::new()),
                observer: None,
            }),
        }
    }

    pub(crate) fn with_observer(observer: Rc<dyn RuntimeObserver>) -> Self {
        Self {
            inner: Rc::new(Inner {
                queue: RefCell::new(VecDeque::new()),
                observer: Some(observer),
            }),
        }
    }

    /// Schedules a coroutine with no owning party.
    pub fn spawn<T: 'static>(&self, future: impl Future<Output = T> + 'static) -> Task<T> {
        self.spawn_for_party(future, None)
    }

    /// Schedules a coroutine owned by `party`.
    pub(crate) fn spawn_for_party<T: 'static>(
        &self,
        future: impl Future<Output = T> + 'static,
        party: Option<usize>,
    ) -> Task<T> {
        let result = Rc::new(RefCell::new(None));
        let slot = result.clone();
        let wrapped = Box::pin(async move {
            let value = future.await;
            *slot.borrow_mut() = Some(value);
        });

        let state = Rc::new(RefCell::new(TaskState {
            future: Some(wrapped),
            done: false,
            party,
        }));

        self.inner.queue.borrow_mut().push_back(Entry {
            task: state.clone(),
            predicate: Box::new(|| true),
        });

        Task { state, result }
    }

    /// Runs `future` to completion, scheduling every coroutine spawned
    /// along the way.
    pub fn run<T: 'static>(&self, future: impl Future<Output = T> + 'static) -> T {
        let main = self.spawn(future);
        loop {
            if main.is_done() {
                return main
                    .take_result()
                    .expect("completed task holds its result");
            }
            if !self.tick() {
                // nothing was ready. Either a real-time sleep has not
                // elapsed yet, or the protocols are waiting on each other;
                // in both cases all there is to do is scan again.
                std::thread::yield_now();
            }
        }
    }

    /// One scheduling pass: resume the first ready coroutine.
    ///
    /// Returns false when no coroutine was ready.
    fn tick(&self) -> bool {
        let ready = {
            let queue = self.inner.queue.borrow();
            queue.iter().position(|entry| {
                let party = entry.task.borrow().party;
                if let (Some(observer), Some(pid)) = (&self.inner.observer, party) {
                    if observer.is_cancelled(pid) {
                        return false;
                    }
                }
                (entry.predicate)()
            })
        };

        let Some(index) = ready else {
            return false;
        };
        let entry = self
            .inner
            .queue
            .borrow_mut()
            .remove(index)
            .expect("index comes from the scan above");

        self.resume(entry.task);
        true
    }

    fn resume(&self, task: TaskRef) {
        // take the future out so the task can be inspected (or this very
        // runtime re-entered) while it runs.
        let (mut future, party) = {
            let mut state = task.borrow_mut();
            (state.future.take(), state.party)
        };
        let Some(fut) = future.as_mut() else {
            return;
        };

        if let Some(observer) = &self.inner.observer {
            // only wall-clock time from here on is the party's own work.
            observer.on_resume(party);
        }

        CURRENT.with(|stack| {
            stack.borrow_mut().push(ExecContext {
                runtime: Rc::downgrade(&self.inner),
                task: Rc::downgrade(&task),
                party,
            })
        });
        let poll = fut.as_mut().poll(&mut Context::from_waker(Waker::noop()));
        CURRENT.with(|stack| {
            stack.borrow_mut().pop();
        });

        let mut state = task.borrow_mut();
        state.future = future;
        if poll.is_ready() {
            state.done = true;
            state.future = None;
        }
    }

}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns a coroutine on the currently executing runtime, owned by the
/// same party as the spawning coroutine.
pub fn spawn<T: 'static>(future: impl Future<Output = T> + 'static) -> Task<T> {
    let ctx = current();
    let runtime = Runtime {
        inner: ctx.runtime.upgrade().expect("runtime outlives its tasks"),
    };
    runtime.spawn_for_party(future, ctx.party)
}

fn register(predicate: Predicate) {
    let ctx = current();
    let inner = ctx.runtime.upgrade().expect("runtime outlives its tasks");
    let task = ctx.task.upgrade().expect("task is alive while polled");
    inner.queue.borrow_mut().push_back(Entry {
        task,
        predicate,
    });
}

/// Suspends the current coroutine until `predicate` returns true on some
/// scheduling pass.
///
/// Always yields at least once, even when the predicate already holds;
/// that is what gives other parties a chance to run between protocol
/// steps.
pub fn suspend_until(predicate: impl Fn() -> bool + 'static) -> SuspendUntil {
    SuspendUntil {
        predicate: Some(Box::new(predicate)),
    }
}

/// Awaitable returned by [`suspend_until`].
pub struct SuspendUntil {
    predicate: Option<Predicate>,
}

impl Future for SuspendUntil {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        match self.predicate.take() {
            Some(predicate) => {
                register(predicate);
                Poll::Pending
            }
            // the scheduler only resumes us once the predicate held.
            None => Poll::Ready(()),
        }
    }
}

/// Suspends the current coroutine for a duration.
///
/// Under a simulator the sleep is purely virtual: it is accounted to the
/// party's virtual clock and resolves on the next scheduling pass. The
/// result is an error when a hook cancelled the sleeping party.
pub fn sleep(duration: Duration) -> Sleep {
    Sleep {
        duration,
        state: SleepState::New,
    }
}

enum SleepState {
    New,
    Suspended(Result<()>),
}

/// Awaitable returned by [`sleep`].
pub struct Sleep {
    duration: Duration,
    state: SleepState,
}

impl Future for Sleep {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<()>> {
        match std::mem::replace(&mut self.state, SleepState::New) {
            SleepState::New => {
                let ctx = current();
                let inner = ctx.runtime.upgrade().expect("runtime outlives its tasks");

                let virtual_result = inner
                    .observer
                    .as_ref()
                    .and_then(|obs| obs.on_sleep(ctx.party, self.duration));

                match virtual_result {
                    Some(result) => {
                        // virtual sleep: already charged to the party's
                        // clock, resume on the next pass.
                        self.state = SleepState::Suspended(result);
                        register(Box::new(|| true));
                    }
                    None => {
                        let deadline = Instant::now() + self.duration;
                        self.state = SleepState::Suspended(Ok(()));
                        register(Box::new(move || Instant::now() >= deadline));
                    }
                }
                Poll::Pending
            }
            SleepState::Suspended(result) => Poll::Ready(result),
        }
    }
}

impl<T: 'static> Future for Task<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<T> {
        if self.is_done() {
            let value = self.take_result().expect("task awaited more than once");
            return Poll::Ready(value);
        }
        let state = self.state.clone();
        register(Box::new(move || state.borrow().done));
        Poll::Pending
    }
}

/// Runs a group of tasks and resumes the caller once every one of them is
/// done, cancelled parties' tasks excepted.
///
/// Results come back in task order; tasks that never finished because
/// their party was cancelled contribute nothing.
pub async fn batch<T: 'static>(tasks: Vec<Task<T>>) -> Vec<T> {
    let ctx = current();
    let inner = ctx.runtime.upgrade().expect("runtime outlives its tasks");

    let states: Vec<(TaskRef, Option<usize>)> = tasks
        .iter()
        .map(|task| (task.state.clone(), task.party()))
        .collect();
    let observer = inner.observer.clone();

    suspend_until(move || {
        states.iter().all(|(state, party)| {
            if state.borrow().done {
                return true;
            }
            match (&observer, party) {
                (Some(obs), Some(pid)) => obs.is_cancelled(*pid),
                _ => false,
            }
        })
    })
    .await;

    tasks.iter().filter_map(Task::take_result).collect()
}

#[cfg(test)]
mod tests;
