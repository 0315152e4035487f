use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;

/// One-shot timers, as provided by the browser's `setTimeout`.
pub(crate) trait TimerScheduler {
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> Option<i32>;
    fn clear_timeout(&self, handle: i32);
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct WindowTimers;

impl TimerScheduler for WindowTimers {
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> Option<i32> {
        let win = web_sys::window()?;
        let cb = wasm_bindgen::closure::Closure::once_into_js(move || callback());
        win.set_timeout_with_callback_and_timeout_and_arguments_0(
            cb.as_ref().unchecked_ref(),
            i32::try_from(delay_ms).unwrap_or(i32::MAX),
        )
        .ok()
    }

    fn clear_timeout(&self, handle: i32) {
        if let Some(win) = web_sys::window() {
            let _ = win.clear_timeout_with_handle(handle);
        }
    }
}

#[derive(Default)]
struct Slot {
    generation: u64,
    handle: Option<i32>,
    action: Option<Box<dyn FnOnce()>>,
}

fn fire(slot: &Rc<RefCell<Slot>>, generation: u64) {
    let action = {
        let mut s = slot.borrow_mut();
        if s.generation != generation {
            return;
        }
        s.handle = None;
        s.action.take()
    };
    if let Some(action) = action {
        action();
    }
}

/// Trailing-edge debounce owning at most one pending action.
///
/// Scheduling replaces (and cancels) whatever was pending. Dropping the
/// debouncer cancels the pending action without running it.
pub(crate) struct Debouncer<S: TimerScheduler> {
    scheduler: S,
    delay_ms: u32,
    slot: Rc<RefCell<Slot>>,
}

impl<S: TimerScheduler> Debouncer<S> {
    pub fn new(scheduler: S, delay_ms: u32) -> Self {
        Self {
            scheduler,
            delay_ms,
            slot: Rc::new(RefCell::new(Slot::default())),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot.borrow().action.is_some()
    }

    pub fn schedule(&self, action: impl FnOnce() + 'static) {
        self.cancel();

        let generation = {
            let mut slot = self.slot.borrow_mut();
            slot.generation = slot.generation.wrapping_add(1);
            slot.action = Some(Box::new(action));
            slot.generation
        };

        let slot = Rc::clone(&self.slot);
        let handle = self.scheduler.set_timeout(
            self.delay_ms,
            Box::new(move || fire(&slot, generation)),
        );

        match handle {
            Some(h) => self.slot.borrow_mut().handle = Some(h),
            None => {
                // No timer available (no window). Run now rather than never.
                log::debug!("timer unavailable; running debounced action immediately");
                self.flush();
            }
        }
    }

    fn take(&self) -> Option<Box<dyn FnOnce()>> {
        let (handle, action) = {
            let mut s = self.slot.borrow_mut();
            s.generation = s.generation.wrapping_add(1);
            (s.handle.take(), s.action.take())
        };
        if let Some(h) = handle {
            self.scheduler.clear_timeout(h);
        }
        action
    }

    /// Drop the pending action. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        self.take().is_some()
    }

    /// Run the pending action now. Returns whether one was pending.
    pub fn flush(&self) -> bool {
        match self.take() {
            Some(action) => {
                action();
                true
            }
            None => false,
        }
    }
}

impl<S: TimerScheduler> Drop for Debouncer<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::TimerScheduler;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Timer {
        id: i32,
        due_ms: u64,
        callback: Box<dyn FnOnce()>,
    }

    #[derive(Default)]
    struct Clock {
        now_ms: u64,
        next_id: i32,
        timers: Vec<Timer>,
    }

    /// Virtual-time scheduler; timers only fire inside `advance`.
    #[derive(Clone, Default)]
    pub(crate) struct ManualTimers {
        clock: Rc<RefCell<Clock>>,
    }

    impl ManualTimers {
        pub fn now_ms(&self) -> u64 {
            self.clock.borrow().now_ms
        }

        pub fn pending(&self) -> usize {
            self.clock.borrow().timers.len()
        }

        pub fn advance(&self, ms: u64) {
            let target = self.now_ms() + ms;
            loop {
                let next = {
                    let mut clock = self.clock.borrow_mut();
                    let idx = clock
                        .timers
                        .iter()
                        .enumerate()
                        .filter(|(_, t)| t.due_ms <= target)
                        .min_by_key(|(_, t)| (t.due_ms, t.id))
                        .map(|(i, _)| i);
                    idx.map(|i| {
                        let t = clock.timers.remove(i);
                        clock.now_ms = t.due_ms;
                        t.callback
                    })
                };
                match next {
                    Some(cb) => cb(),
                    None => break,
                }
            }
            self.clock.borrow_mut().now_ms = target;
        }
    }

    impl TimerScheduler for ManualTimers {
        fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> Option<i32> {
            let mut clock = self.clock.borrow_mut();
            clock.next_id += 1;
            let id = clock.next_id;
            let due_ms = clock.now_ms + u64::from(delay_ms);
            clock.timers.push(Timer {
                id,
                due_ms,
                callback,
            });
            Some(id)
        }

        fn clear_timeout(&self, handle: i32) {
            self.clock.borrow_mut().timers.retain(|t| t.id != handle);
        }
    }
}
