//! In-memory platform collaborators for tests and headless hosts.
//!
//! Nothing here runs on its own: spawned tasks sit in a queue until
//! [`QueueSpawner::run_until_stalled`] polls them, and sleeps only finish
//! after [`ManualTimer::fire_all`].

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::future::{self, LocalBoxFuture};
use futures_util::task::noop_waker_ref;

use crate::platform::{Clipboard, LocalSpawner, PathIndex, Platform, PlatformError, Timer};

#[derive(Default)]
pub struct QueueSpawner {
    tasks: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
}

impl LocalSpawner for QueueSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        self.tasks.borrow_mut().push(task);
    }
}

impl QueueSpawner {
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Poll queued tasks until none can make progress. Returns how many
    /// finished.
    pub fn run_until_stalled(&self) -> usize {
        let mut cx = Context::from_waker(noop_waker_ref());
        let mut finished = 0;
        loop {
            let batch = std::mem::take(&mut *self.tasks.borrow_mut());
            if batch.is_empty() {
                return finished;
            }
            let before = finished;
            let mut waiting = Vec::new();
            for mut task in batch {
                match task.as_mut().poll(&mut cx) {
                    Poll::Ready(()) => finished += 1,
                    Poll::Pending => waiting.push(task),
                }
            }
            let mut tasks = self.tasks.borrow_mut();
            let spawned = !tasks.is_empty();
            waiting.append(&mut tasks);
            *tasks = waiting;
            if finished == before && !spawned {
                return finished;
            }
        }
    }
}

#[derive(Default)]
pub struct StaticPaths {
    existing: RefCell<HashSet<PathBuf>>,
    queries: Cell<usize>,
}

impl StaticPaths {
    pub fn add(&self, path: impl Into<PathBuf>) {
        self.existing.borrow_mut().insert(path.into());
    }

    pub fn queries(&self) -> usize {
        self.queries.get()
    }
}

impl PathIndex for StaticPaths {
    fn exists(&self, path: &Path) -> LocalBoxFuture<'static, bool> {
        self.queries.set(self.queries.get() + 1);
        let found = self.existing.borrow().contains(path);
        Box::pin(future::ready(found))
    }
}

#[derive(Default)]
pub struct MemoryClipboard {
    texts: RefCell<Vec<String>>,
    fail: Cell<bool>,
}

impl MemoryClipboard {
    pub fn texts(&self) -> Vec<String> {
        self.texts.borrow().clone()
    }

    pub fn fail_next(&self) {
        self.fail.set(true);
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&self, text: &str) -> Result<(), PlatformError> {
        if self.fail.replace(false) {
            return Err("clipboard unavailable".into());
        }
        self.texts.borrow_mut().push(text.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct ManualTimer {
    sleeps: RefCell<Vec<(Duration, Rc<Cell<bool>>)>>,
}

impl ManualTimer {
    pub fn durations(&self) -> Vec<Duration> {
        self.sleeps.borrow().iter().map(|(d, _)| *d).collect()
    }

    pub fn fire_all(&self) {
        for (_, fired) in self.sleeps.borrow().iter() {
            fired.set(true);
        }
    }
}

impl Timer for ManualTimer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        let fired = Rc::new(Cell::new(false));
        self.sleeps.borrow_mut().push((duration, fired.clone()));
        Box::pin(future::poll_fn(move |_| {
            if fired.get() {
                Poll::Ready(())
            } else {
                Poll::Pending
            }
        }))
    }
}

/// One of each fake, kept around so tests can drive and inspect them.
#[derive(Clone, Default)]
pub struct TestPlatform {
    pub spawner: Rc<QueueSpawner>,
    pub paths: Rc<StaticPaths>,
    pub clipboard: Rc<MemoryClipboard>,
    pub timer: Rc<ManualTimer>,
}

impl TestPlatform {
    pub fn platform(&self) -> Platform {
        Platform {
            spawner: self.spawner.clone(),
            paths: self.paths.clone(),
            clipboard: self.clipboard.clone(),
            timer: self.timer.clone(),
        }
    }
}
