use super::debounce::{Debouncer, TimerScheduler};
use crate::config::{EnvConfig, IdentitySwitch, DEFAULT_AUTOSAVE_MS};
use crate::models::{Mode, Page};
use std::rc::Rc;

pub(crate) type PageSink = Rc<dyn Fn(Page)>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct AutosavePolicy {
    pub debounce_ms: u32,
    pub identity_switch: IdentitySwitch,
}

impl Default for AutosavePolicy {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_AUTOSAVE_MS,
            identity_switch: IdentitySwitch::Discard,
        }
    }
}

impl AutosavePolicy {
    pub fn from_config(config: &EnvConfig) -> Self {
        Self {
            debounce_ms: config.autosave_ms,
            identity_switch: config.identity_switch,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Field {
    Title,
    Body,
}

/// Editable copy of one page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct EditBufferState {
    pub number: u32,
    pub title: String,
    pub body: String,
}

impl EditBufferState {
    fn from_page(page: &Page) -> Self {
        Self {
            number: page.number,
            title: page.title.clone(),
            body: page.body.clone(),
        }
    }

    pub fn to_page(&self) -> Page {
        Page {
            number: self.number,
            title: self.title.clone(),
            body: self.body.clone(),
        }
    }
}

/// Per-page editor state.
///
/// Input lands in the buffer immediately. Persistence happens through two
/// independent paths:
/// - `autosave`: trailing-edge debounced, persistence only, no visible refresh.
/// - `sync_parent`: on blur, pushes the buffer into the shared page list.
///
/// The buffer is the only writer of its copy; the shared list never overwrites
/// it while the same page stays loaded.
pub(crate) struct PageEditBuffer<S: TimerScheduler> {
    state: EditBufferState,
    mode: Mode,
    identity_switch: IdentitySwitch,
    debouncer: Debouncer<S>,
    autosave: PageSink,
    sync_parent: PageSink,
}

impl<S: TimerScheduler> PageEditBuffer<S> {
    pub fn new(
        page: &Page,
        mode: Mode,
        policy: AutosavePolicy,
        scheduler: S,
        autosave: PageSink,
        sync_parent: PageSink,
    ) -> Self {
        Self {
            state: EditBufferState::from_page(page),
            mode,
            identity_switch: policy.identity_switch,
            debouncer: Debouncer::new(scheduler, policy.debounce_ms),
            autosave,
            sync_parent,
        }
    }

    pub fn state(&self) -> &EditBufferState {
        &self.state
    }

    pub fn is_editable(&self) -> bool {
        self.mode.is_write()
    }

    #[cfg(test)]
    pub fn has_pending_autosave(&self) -> bool {
        self.debouncer.is_pending()
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
        if !mode.is_write() {
            self.debouncer.cancel();
        }
    }

    /// Apply a keystroke. Ignored in read mode.
    pub fn input(&mut self, field: Field, value: String) {
        if !self.is_editable() {
            return;
        }

        match field {
            Field::Title => self.state.title = value,
            Field::Body => self.state.body = value,
        }

        let page = self.state.to_page();
        let autosave = Rc::clone(&self.autosave);
        self.debouncer.schedule(move || autosave(page));
    }

    /// Field lost focus: hand the current contents to the parent now.
    ///
    /// The pending autosave (if any) keeps running.
    pub fn blur(&self) {
        if !self.is_editable() {
            return;
        }
        (self.sync_parent)(self.state.to_page());
    }

    /// Point the buffer at `page`.
    ///
    /// Only an identity change resets the buffer; a refreshed copy of the page
    /// being edited is ignored so typing is never clobbered. Returns whether the
    /// buffer was reset.
    pub fn load(&mut self, page: &Page) -> bool {
        if page.number == self.state.number {
            return false;
        }

        match self.identity_switch {
            IdentitySwitch::Discard => {
                if self.debouncer.cancel() {
                    log::debug!(
                        "page {} switched away with unsent edits; discarding",
                        self.state.number
                    );
                }
            }
            IdentitySwitch::Flush => {
                self.debouncer.flush();
            }
        }

        self.state = EditBufferState::from_page(page);
        true
    }

    /// Send a pending autosave right away (page is being hidden).
    pub fn flush(&self) -> bool {
        self.debouncer.flush()
    }

    /// Stop the pending autosave without sending it.
    pub fn teardown(&self) {
        self.debouncer.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::debounce::testing::ManualTimers;
    use std::cell::RefCell;

    struct Harness {
        timers: ManualTimers,
        saved: Rc<RefCell<Vec<Page>>>,
        synced: Rc<RefCell<Vec<Page>>>,
    }

    fn page(number: u32, title: &str, body: &str) -> Page {
        Page {
            number,
            title: title.to_string(),
            body: body.to_string(),
        }
    }

    fn sink(into: &Rc<RefCell<Vec<Page>>>) -> PageSink {
        let into = Rc::clone(into);
        Rc::new(move |p| into.borrow_mut().push(p))
    }

    fn buffer_with(
        p: &Page,
        mode: Mode,
        identity_switch: IdentitySwitch,
    ) -> (PageEditBuffer<ManualTimers>, Harness) {
        let h = Harness {
            timers: ManualTimers::default(),
            saved: Rc::new(RefCell::new(vec![])),
            synced: Rc::new(RefCell::new(vec![])),
        };
        let b = PageEditBuffer::new(
            p,
            mode,
            AutosavePolicy {
                debounce_ms: 600,
                identity_switch,
            },
            h.timers.clone(),
            sink(&h.saved),
            sink(&h.synced),
        );
        (b, h)
    }

    fn buffer(p: &Page) -> (PageEditBuffer<ManualTimers>, Harness) {
        buffer_with(p, Mode::Write, IdentitySwitch::Discard)
    }

    #[test]
    fn test_initialized_from_page() {
        let (b, _) = buffer(&page(2, "Rain", "falls"));
        assert_eq!(b.state().to_page(), page(2, "Rain", "falls"));
    }

    #[test]
    fn test_burst_of_keystrokes_coalesces_into_one_autosave() {
        let (mut b, h) = buffer(&page(1, "", ""));

        for v in ["r", "ro", "ros", "rose"] {
            b.input(Field::Body, v.to_string());
            h.timers.advance(100);
        }
        assert!(h.saved.borrow().is_empty());

        h.timers.advance(600);
        assert_eq!(*h.saved.borrow(), vec![page(1, "", "rose")]);
        assert!(h.synced.borrow().is_empty());
    }

    #[test]
    fn test_pause_between_bursts_saves_each_burst() {
        let (mut b, h) = buffer(&page(1, "", ""));

        b.input(Field::Title, "A".to_string());
        h.timers.advance(600);
        b.input(Field::Title, "AB".to_string());
        h.timers.advance(600);

        assert_eq!(
            *h.saved.borrow(),
            vec![page(1, "A", ""), page(1, "AB", "")]
        );
    }

    #[test]
    fn test_autosave_carries_both_fields() {
        let (mut b, h) = buffer(&page(3, "old", "old"));
        b.input(Field::Title, "new title".to_string());
        b.input(Field::Body, "new body".to_string());
        h.timers.advance(600);
        assert_eq!(*h.saved.borrow(), vec![page(3, "new title", "new body")]);
    }

    #[test]
    fn test_blur_syncs_exact_contents_before_timer_fires() {
        let (mut b, h) = buffer(&page(1, "", ""));
        b.input(Field::Body, "line one".to_string());
        h.timers.advance(200);
        b.input(Field::Body, "line one\nline two".to_string());
        b.blur();

        assert_eq!(*h.synced.borrow(), vec![page(1, "", "line one\nline two")]);
        assert!(h.saved.borrow().is_empty());
        assert!(b.has_pending_autosave());

        // The debounced save still goes out afterwards.
        h.timers.advance(600);
        assert_eq!(*h.saved.borrow(), vec![page(1, "", "line one\nline two")]);
    }

    #[test]
    fn test_identity_change_discards_unsent_edits() {
        let (mut b, h) = buffer(&page(1, "A", "x"));
        b.input(Field::Body, "typed but never sent".to_string());

        assert!(b.load(&page(2, "B", "y")));
        assert_eq!(b.state().to_page(), page(2, "B", "y"));

        h.timers.advance(5_000);
        assert!(h.saved.borrow().is_empty());
        assert!(h.synced.borrow().is_empty());
    }

    #[test]
    fn test_identity_change_with_flush_policy_sends_old_page_first() {
        let (mut b, h) = buffer_with(&page(1, "A", "x"), Mode::Write, IdentitySwitch::Flush);
        b.input(Field::Body, "keep me".to_string());

        assert!(b.load(&page(2, "B", "y")));
        assert_eq!(*h.saved.borrow(), vec![page(1, "A", "keep me")]);
        assert_eq!(b.state().to_page(), page(2, "B", "y"));

        h.timers.advance(5_000);
        assert_eq!(h.saved.borrow().len(), 1);
    }

    #[test]
    fn test_refresh_of_same_page_does_not_clobber_typing() {
        let (mut b, h) = buffer(&page(1, "A", "x"));
        b.input(Field::Body, "xy".to_string());

        assert!(!b.load(&page(1, "A", "x")));
        assert_eq!(b.state().body, "xy");
        assert!(b.has_pending_autosave());

        h.timers.advance(600);
        assert_eq!(*h.saved.borrow(), vec![page(1, "A", "xy")]);
    }

    #[test]
    fn test_read_mode_is_inert() {
        let (mut b, h) = buffer_with(&page(1, "A", "x"), Mode::Read, IdentitySwitch::Discard);
        assert!(!b.is_editable());

        b.input(Field::Title, "changed".to_string());
        b.blur();

        assert_eq!(b.state().title, "A");
        assert_eq!(h.timers.pending(), 0);
        h.timers.advance(1_000);
        assert!(h.saved.borrow().is_empty());
        assert!(h.synced.borrow().is_empty());
    }

    #[test]
    fn test_switching_to_read_mode_cancels_pending_autosave() {
        let (mut b, h) = buffer(&page(1, "", ""));
        b.input(Field::Title, "draft".to_string());
        b.set_mode(Mode::Read);

        h.timers.advance(1_000);
        assert!(h.saved.borrow().is_empty());
    }

    #[test]
    fn test_flush_sends_immediately_once() {
        let (mut b, h) = buffer(&page(4, "", ""));
        b.input(Field::Title, "T".to_string());

        assert!(b.flush());
        assert!(!b.flush());
        assert_eq!(*h.saved.borrow(), vec![page(4, "T", "")]);
        h.timers.advance(1_000);
        assert_eq!(h.saved.borrow().len(), 1);
    }

    #[test]
    fn test_teardown_and_drop_cancel_the_timer() {
        let (mut b, h) = buffer(&page(1, "", ""));
        b.input(Field::Title, "T".to_string());
        b.teardown();
        h.timers.advance(1_000);
        assert!(h.saved.borrow().is_empty());

        b.input(Field::Title, "T2".to_string());
        drop(b);
        assert_eq!(h.timers.pending(), 0);
        h.timers.advance(1_000);
        assert!(h.saved.borrow().is_empty());
    }

    #[test]
    fn test_policy_from_config() {
        let cfg = EnvConfig {
            autosave_ms: 350,
            identity_switch: IdentitySwitch::Flush,
            ..EnvConfig::default()
        };
        let p = AutosavePolicy::from_config(&cfg);
        assert_eq!(p.debounce_ms, 350);
        assert_eq!(p.identity_switch, IdentitySwitch::Flush);
    }
}
