use crate::editing::{AutosavePolicy, Field, PageEditBuffer, PageSink, WindowTimers};
use crate::models::{title_or_untitled, Mode, Page};
use leptos::ev;
use leptos::prelude::*;
use leptos_dom::helpers::window_event_listener;
use std::rc::Rc;
use wasm_bindgen::JsCast;

fn input_value(ev: &web_sys::Event) -> Option<String> {
    let target = ev.target()?;
    if let Some(el) = target.dyn_ref::<web_sys::HtmlInputElement>() {
        return Some(el.value());
    }
    target
        .dyn_ref::<web_sys::HtmlTextAreaElement>()
        .map(|el| el.value())
}

/// Editor for the page currently shown.
///
/// Stays mounted while the reader turns pages; when `page` switches to a
/// different page number the buffer resets to it. Renders nothing without a
/// page, and a missing page never reaches the buffer.
#[component]
pub fn PoemPageView(
    #[prop(into)] page: Signal<Option<Page>>,
    #[prop(into)] index: Signal<usize>,
    #[prop(into)] mode: Signal<Mode>,
    policy: AutosavePolicy,
    /// Blur: push `(index, page)` into the visible book.
    on_sync: Callback<(usize, Page)>,
    /// Debounced background save.
    on_autosave: Callback<Page>,
    on_focus_change: Callback<bool>,
) -> impl IntoView {
    let Some(initial) = page.get_untracked() else {
        return ().into_any();
    };
    let title = RwSignal::new(initial.title.clone());
    let body = RwSignal::new(initial.body.clone());
    let loaded_index = StoredValue::new(index.get_untracked());

    let autosave: PageSink = Rc::new(move |p: Page| on_autosave.run(p));
    let sync_parent: PageSink = Rc::new(move |p: Page| on_sync.run((loaded_index.get_value(), p)));
    let buffer = StoredValue::new_local(PageEditBuffer::new(
        &initial,
        mode.get_untracked(),
        policy,
        WindowTimers,
        autosave,
        sync_parent,
    ));

    Effect::new(move |_| {
        let Some(next) = page.get() else {
            return;
        };
        let at = index.get();
        if buffer.try_update_value(|b| b.load(&next)).unwrap_or(false) {
            loaded_index.set_value(at);
            title.set(next.title);
            body.set(next.body);
        }
    });

    Effect::new(move |_| {
        let m = mode.get();
        buffer.update_value(|b| b.set_mode(m));
    });

    let pagehide = window_event_listener(ev::pagehide, move |_| {
        let _ = buffer.try_with_value(|b| b.flush());
    });
    on_cleanup(move || {
        pagehide.remove();
        let _ = buffer.try_with_value(|b| b.teardown());
    });

    let edit = move |field: Field, ev: web_sys::Event| {
        let Some(value) = input_value(&ev) else {
            return;
        };
        let echoed = buffer.try_update_value(|b| {
            b.input(field, value);
            b.state().clone()
        });
        if let Some(state) = echoed {
            match field {
                Field::Title => title.set(state.title),
                Field::Body => body.set(state.body),
            }
        }
    };

    let on_focus = move |_: web_sys::FocusEvent| on_focus_change.run(true);
    let on_blur = move |_: web_sys::FocusEvent| {
        buffer.with_value(|b| b.blur());
        on_focus_change.run(false);
    };

    view! {
        <article data-name="PoemPageView" class="flex h-full flex-col gap-4 px-8 py-6 font-serif">
            <Show
                when=move || mode.get().is_write()
                fallback=move || view! {
                    <h2 class="text-2xl font-semibold tracking-tight">
                        {move || title_or_untitled(&title.get()).to_string()}
                    </h2>
                    <p class="whitespace-pre-wrap text-base leading-relaxed">{move || body.get()}</p>
                }
            >
                <input
                    type="text"
                    class="w-full border-0 border-b bg-transparent pb-2 text-2xl font-semibold tracking-tight outline-none focus-visible:border-ring"
                    placeholder="Untitled Poem"
                    prop:value=move || title.get()
                    on:input=move |ev| edit(Field::Title, ev)
                    on:focus=on_focus
                    on:blur=on_blur
                />
                <textarea
                    class="min-h-[20rem] w-full flex-1 resize-none border-0 bg-transparent text-base leading-relaxed outline-none"
                    placeholder="Write your poem..."
                    prop:value=move || body.get()
                    on:input=move |ev| edit(Field::Body, ev)
                    on:focus=on_focus
                    on:blur=on_blur
                ></textarea>
            </Show>
        </article>
    }
    .into_any()
}
