use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counting gate bounding how many submitted frames may be unretired at once.
///
/// The producer's `acquire` is the single blocking point of the pipeline;
/// `release` runs on whatever thread delivers the GPU completion. A slot's
/// release happens-before the acquire that reuses it, which is the edge that
/// keeps slot writes and slot reads from racing.
pub struct FrameGate {
    permits: Mutex<usize>,
    freed: Condvar,
}

impl FrameGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            permits: Mutex::new(capacity),
            freed: Condvar::new(),
        }
    }

    /// Take a permit, waiting indefinitely for GPU progress.
    pub fn acquire(&self) {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            self.freed.wait(&mut permits);
        }
        *permits -= 1;
    }

    /// Take a permit, giving up after `timeout`. Returns whether a permit
    /// was taken. A timeout here means the GPU has stopped retiring frames;
    /// callers treat that as fatal rather than retrying.
    pub fn acquire_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut permits = self.permits.lock();
        while *permits == 0 {
            if self.freed.wait_until(&mut permits, deadline).timed_out() && *permits == 0 {
                return false;
            }
        }
        *permits -= 1;
        true
    }

    /// Return a permit and wake one waiter. Safe from any thread.
    pub fn release(&self) {
        let mut permits = self.permits.lock();
        *permits += 1;
        drop(permits);
        self.freed.notify_one();
    }

    pub fn available(&self) -> usize {
        *self.permits.lock()
    }
}

type Callback = Box<dyn FnOnce() + Send>;

struct CompletionInner {
    complete: bool,
    callbacks: Vec<Callback>,
}

struct CompletionShared {
    inner: Mutex<CompletionInner>,
}

impl CompletionShared {
    fn fire(&self) {
        let callbacks = {
            let mut inner = self.inner.lock();
            if inner.complete {
                return;
            }
            inner.complete = true;
            std::mem::take(&mut inner.callbacks)
        };
        // Run outside the lock so a callback may register further callbacks
        // or release the gate without re-entering.
        for callback in callbacks {
            callback();
        }
    }
}

/// Producer-side handle to a submitted frame's completion.
///
/// Models the GPU's completed-handler: callbacks registered before the
/// signal run when it fires, on the signaling thread; callbacks registered
/// after run immediately on the registering thread.
pub struct Completion {
    shared: Arc<CompletionShared>,
}

impl Completion {
    pub fn on_complete(&self, callback: impl FnOnce() + Send + 'static) {
        {
            let mut inner = self.shared.inner.lock();
            if !inner.complete {
                inner.callbacks.push(Box::new(callback));
                return;
            }
        }
        callback();
    }

    pub fn is_complete(&self) -> bool {
        self.shared.inner.lock().complete
    }
}

/// Consumer-side trigger held by the draw-submission collaborator.
///
/// Dropping an unsignaled trigger fires it; a submitter that loses its
/// handle must not leave the gate permit stranded.
pub struct CompletionSignal {
    shared: Arc<CompletionShared>,
}

impl CompletionSignal {
    pub fn signal(self) {
        self.shared.fire();
    }
}

impl Drop for CompletionSignal {
    fn drop(&mut self) {
        self.shared.fire();
    }
}

/// A linked completion/signal pair for one submitted frame.
pub fn completion_pair() -> (Completion, CompletionSignal) {
    let shared = Arc::new(CompletionShared {
        inner: Mutex::new(CompletionInner {
            complete: false,
            callbacks: Vec::new(),
        }),
    });
    (
        Completion {
            shared: shared.clone(),
        },
        CompletionSignal { shared },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    const SHORT: Duration = Duration::from_millis(50);

    #[test]
    fn gate_blocks_once_capacity_is_exhausted() {
        let gate = FrameGate::new(3);

        assert!(gate.acquire_timeout(SHORT));
        assert!(gate.acquire_timeout(SHORT));
        assert!(gate.acquire_timeout(SHORT));

        // Fourth acquire must block until something is released.
        assert!(!gate.acquire_timeout(SHORT));

        gate.release();
        assert!(gate.acquire_timeout(SHORT));
    }

    #[test]
    fn release_unblocks_exactly_one_waiter() {
        let gate = Arc::new(FrameGate::new(1));
        gate.acquire();

        let acquired = Arc::new(AtomicUsize::new(0));
        let waiters: Vec<_> = (0..2)
            .map(|_| {
                let gate = gate.clone();
                let acquired = acquired.clone();
                thread::spawn(move || {
                    if gate.acquire_timeout(Duration::from_secs(5)) {
                        acquired.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(100));
        assert_eq!(acquired.load(Ordering::SeqCst), 0);

        gate.release();
        thread::sleep(Duration::from_millis(200));
        assert_eq!(acquired.load(Ordering::SeqCst), 1);

        gate.release();
        for waiter in waiters {
            waiter.join().unwrap();
        }
        assert_eq!(acquired.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn release_from_another_thread_wakes_a_waiter() {
        let gate = Arc::new(FrameGate::new(1));
        gate.acquire();

        let releaser = {
            let gate = gate.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                gate.release();
            })
        };

        assert!(gate.acquire_timeout(Duration::from_secs(5)));
        releaser.join().unwrap();
    }

    #[test]
    fn callback_registered_before_signal_runs_on_signal() {
        let (completion, signal) = completion_pair();
        let ran = Arc::new(AtomicUsize::new(0));

        let counter = ran.clone();
        completion.on_complete(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(ran.load(Ordering::SeqCst), 0);

        signal.signal();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert!(completion.is_complete());
    }

    #[test]
    fn callback_registered_after_signal_runs_immediately() {
        let (completion, signal) = completion_pair();
        signal.signal();

        let ran = Arc::new(AtomicUsize::new(0));
        let counter = ran.clone();
        completion.on_complete(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropped_signal_still_completes() {
        let (completion, signal) = completion_pair();
        let ran = Arc::new(AtomicUsize::new(0));

        let counter = ran.clone();
        completion.on_complete(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        drop(signal);
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn completion_releases_gate_from_signal_thread() {
        let gate = Arc::new(FrameGate::new(1));
        gate.acquire();

        let (completion, signal) = completion_pair();
        let release_gate = gate.clone();
        completion.on_complete(move || release_gate.release());

        let signaler = thread::spawn(move || signal.signal());
        assert!(gate.acquire_timeout(Duration::from_secs(5)));
        signaler.join().unwrap();
    }
}
