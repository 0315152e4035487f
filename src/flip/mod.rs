use crate::state::AppContext;
use leptos::ev;
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;
use wasm_bindgen::JsCast;

/// Moves the displayed page. Implementations clamp; callers never see errors.
pub(crate) trait Navigator {
    fn flip_next(&self);
    fn flip_prev(&self);
    fn flip(&self, index: usize);
}

/// Current-page index for a mounted `FlipBook`.
#[derive(Clone, Copy)]
pub(crate) struct FlipController {
    current: RwSignal<usize>,
    count: Signal<usize>,
}

impl FlipController {
    pub fn new(count: Signal<usize>) -> Self {
        Self {
            current: RwSignal::new(0),
            count,
        }
    }

    /// Tracked read of the shown index.
    pub fn current(&self) -> usize {
        self.current.get()
    }

    pub fn count(&self) -> usize {
        self.count.get()
    }

    fn go(&self, index: usize) {
        let count = self.count.get_untracked();
        if index < count && index != self.current.get_untracked() {
            self.current.set(index);
        }
    }
}

impl Navigator for FlipController {
    fn flip_next(&self) {
        self.go(self.current.get_untracked().saturating_add(1));
    }

    fn flip_prev(&self) {
        if let Some(prev) = self.current.get_untracked().checked_sub(1) {
            self.go(prev);
        }
    }

    fn flip(&self, index: usize) {
        self.go(index);
    }
}

fn is_typing_target(ev: &web_sys::KeyboardEvent) -> bool {
    ev.target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        .map(|el| {
            let tag = el.tag_name().to_lowercase();
            tag == "input" || tag == "textarea"
        })
        .unwrap_or(false)
}

/// Book frame around the current page.
///
/// While mounted, its controller is the app's navigator; arrow keys turn pages
/// unless a text field has focus.
#[component]
pub fn FlipBook(controller: FlipController, children: Children) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let navigator = app_state.0.navigator;
    let inputs_active = app_state.0.inputs_active;

    navigator.set(Some(controller));
    on_cleanup(move || navigator.set(None));

    let key_handle = window_event_listener(ev::keydown, move |ev: web_sys::KeyboardEvent| {
        if inputs_active.get_untracked() || is_typing_target(&ev) {
            return;
        }
        match ev.key().as_str() {
            "ArrowLeft" => {
                ev.prevent_default();
                controller.flip_prev();
            }
            "ArrowRight" => {
                ev.prevent_default();
                controller.flip_next();
            }
            _ => {}
        }
    });
    on_cleanup(move || key_handle.remove());

    view! {
        <div data-name="FlipBook" class="mx-auto flex w-full max-w-2xl flex-col items-center gap-3">
            <div
                class="w-full min-h-[28rem] rounded-sm border bg-card shadow-md transition-transform duration-300"
                data-page=move || controller.current().to_string()
            >
                {children()}
            </div>
            <div class="text-xs text-muted-foreground">
                {move || format!("Page {} of {}", controller.current() + 1, controller.count())}
            </div>
        </div>
    }
}
