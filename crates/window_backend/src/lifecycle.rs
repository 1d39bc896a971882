use std::marker::PhantomData;
use std::thread::ThreadId;

/// `Uninitialized -> Created -> Running -> Closed`. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    /// native resources acquired, window not shown yet
    Created,
    Running,
    Closed,
}

impl LifecycleState {
    pub fn is_closed(self) -> bool {
        self == Self::Closed
    }
}

/// Release steps for native resources, run last-acquired first.
///
/// Backends push one step right after acquiring each resource. if window creation fails halfway,
/// the half-built `Teardown` is dropped and releases exactly what was acquired so far. a finished
/// window calls [`Teardown::run`] from `close`.
#[derive(Default)]
pub struct Teardown {
    steps: Vec<(&'static str, Box<dyn FnOnce()>)>,
}

impl std::fmt::Debug for Teardown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.steps.iter().map(|(label, _)| label))
            .finish()
    }
}

impl Teardown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, label: &'static str, release: impl FnOnce() + 'static) {
        self.steps.push((label, Box::new(release)));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// runs all pending steps in reverse order. running again does nothing.
    pub fn run(&mut self) {
        while let Some((label, release)) = self.steps.pop() {
            tracing::debug!(step = label, "releasing");
            release();
        }
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        self.run();
    }
}

/// The os thread a window was created on.
///
/// Windows embed this so they are `!Send` and `!Sync`. gl contexts and most native window apis only
/// work from the thread that created them.
#[derive(Debug, Clone, Copy)]
pub struct ThreadAffinity {
    owner: ThreadId,
    _not_send: PhantomData<*const ()>,
}

impl Default for ThreadAffinity {
    fn default() -> Self {
        Self::current()
    }
}

impl ThreadAffinity {
    pub fn current() -> Self {
        Self {
            owner: std::thread::current().id(),
            _not_send: PhantomData,
        }
    }

    pub fn owner(&self) -> ThreadId {
        self.owner
    }

    pub fn is_owner(&self) -> bool {
        std::thread::current().id() == self.owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording(
        log: &Rc<RefCell<Vec<&'static str>>>,
        label: &'static str,
    ) -> impl FnOnce() + 'static {
        let log = log.clone();
        move || log.borrow_mut().push(label)
    }

    #[test]
    fn teardown_runs_in_reverse_acquisition_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut teardown = Teardown::new();
        teardown.push("window", recording(&log, "destroy window"));
        teardown.push("device", recording(&log, "release dc"));
        teardown.push("context", recording(&log, "delete context"));
        teardown.push("current", recording(&log, "clear current"));
        assert_eq!(teardown.len(), 4);
        teardown.run();
        assert_eq!(
            *log.borrow(),
            ["clear current", "delete context", "release dc", "destroy window"]
        );
        // idempotent
        teardown.run();
        assert_eq!(log.borrow().len(), 4);
        assert!(teardown.is_empty());
    }

    #[test]
    fn dropping_a_partial_teardown_releases_what_was_acquired() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let build = || -> Result<Teardown, &'static str> {
            let mut teardown = Teardown::new();
            teardown.push("display", recording(&log, "close display"));
            teardown.push("colormap", recording(&log, "free colormap"));
            Err::<(), _>("window creation failed")?;
            Ok(teardown)
        };
        assert!(build().is_err());
        assert_eq!(*log.borrow(), ["free colormap", "close display"]);
    }

    #[test]
    fn thread_affinity() {
        let affinity = ThreadAffinity::current();
        assert!(affinity.is_owner());
        let owner = affinity.owner();
        let other = std::thread::spawn(move || std::thread::current().id()).join().unwrap();
        assert_ne!(owner, other);
        assert!(!LifecycleState::Running.is_closed());
        assert!(LifecycleState::Closed.is_closed());
    }
}
