use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Input, Spinner,
};
use crate::editing::AutosavePolicy;
use crate::flip::{FlipBook, FlipController};
use crate::models::{Mode, Page};
use crate::pages::index_modal::IndexModal;
use crate::pages::mode_modal::ModeModal;
use crate::pages::page_view::PoemPageView;
use crate::state::AppContext;
use leptos::prelude::*;

/// 1-based page number typed by the reader, as a 0-based jump target.
pub(crate) fn parse_jump_target(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().map(|n| n.saturating_sub(1))
}

#[component]
pub fn BookPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let state = app_state.0.clone();

    // Remote books load once the session is confirmed.
    if !state.is_remote() {
        state.load_book();
    }

    let pages = state.pages;
    let mode = state.mode;
    let loading = state.pages_loading;
    let load_error = state.pages_error;
    let action_error = state.action_error;
    let append_in_flight = state.append_in_flight;
    let inputs_active = state.inputs_active;
    let is_remote = state.is_remote();

    let index_open = RwSignal::new(false);
    let jump_value: RwSignal<String> = RwSignal::new(String::new());

    let current_mode = Signal::derive(move || mode.get().unwrap_or(Mode::Read));
    let caps = Memo::new(move |_| pages.with(|c| c.capabilities(current_mode.get())));
    let editor_mode = Signal::derive(move || if caps.get().edit { Mode::Write } else { Mode::Read });
    let page_count = Signal::derive(move || pages.with(|c| c.len()));

    let controller = FlipController::new(page_count);
    let current_index = Signal::derive(move || controller.current());
    let current_page = Memo::new(move |_| {
        let index = controller.current();
        pages.with(|c| c.get(index).cloned())
    });
    let has_page = Memo::new(move |_| current_page.with(|p| p.is_some()));

    let policy = AutosavePolicy::from_config(&state.config);

    let on_sync = {
        let state = state.clone();
        Callback::new(move |(index, page): (usize, Page)| {
            if let Err(e) = state.update_at(index, page) {
                log::warn!("edit not applied: {e}");
            }
        })
    };
    let on_autosave = {
        let state = state.clone();
        Callback::new(move |page: Page| {
            if let Err(e) = state.autosave(page) {
                log::debug!("autosave skipped: {e}");
            }
        })
    };
    let on_focus_change = Callback::new(move |active: bool| inputs_active.set(active));

    // Editors unmount on a mode switch; do not leave shortcuts disabled.
    Effect::new(move |_| {
        current_mode.track();
        inputs_active.set(false);
    });

    let append = {
        let state = state.clone();
        Callback::new(move |_: ()| state.append_page())
    };
    let prev = {
        let state = state.clone();
        Callback::new(move |_: ()| state.flip_prev())
    };
    let next = {
        let state = state.clone();
        Callback::new(move |_: ()| state.flip_next())
    };
    let sign_out = {
        let state = state.clone();
        Callback::new(move |_: ()| state.sign_out())
    };
    let on_jump = {
        let state = state.clone();
        move |ev: web_sys::SubmitEvent| {
            ev.prevent_default();
            let raw = jump_value.get_untracked();
            jump_value.set(String::new());
            if let Some(target) = parse_jump_target(&raw) {
                state.jump_to(target);
            }
        }
    };

    view! {
        <div class="min-h-screen bg-background text-foreground">
            <header class="flex items-center justify-between border-b px-4 py-2">
                <div class="flex items-center gap-2">
                    <span class="text-sm font-semibold">"Virtual Poem Book"</span>
                    <span class="rounded-full border px-2 py-0.5 text-xs capitalize text-muted-foreground">
                        {move || mode.get().map(|m| m.to_string()).unwrap_or_default()}
                    </span>
                </div>
                <div class="flex items-center gap-2">
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Sm
                        attr:disabled=move || !caps.get().navigate
                        on:click=move |_| index_open.set(true)
                    >
                        "Index"
                    </Button>
                    <Show when=move || caps.get().append fallback=|| ().into_view()>
                        <Button
                            size=ButtonSize::Sm
                            attr:disabled=move || append_in_flight.get()
                            on:click=move |_| append.run(())
                        >
                            "Add Page"
                        </Button>
                    </Show>
                    <Show when=move || is_remote fallback=|| ().into_view()>
                        <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=move |_| sign_out.run(())>
                            "Sign out"
                        </Button>
                    </Show>
                </div>
            </header>

            <main class="flex flex-col items-center gap-4 px-4 py-8">
                <Show when=move || action_error.get().is_some() fallback=|| ().into_view()>
                    {move || {
                        action_error.get().map(|e| {
                            view! {
                                <Alert class="max-w-2xl border-destructive/30">
                                    <AlertDescription class="flex items-center justify-between gap-2 text-xs text-destructive">
                                        <span>{e}</span>
                                        <button class="underline" on:click=move |_| action_error.set(None)>"Dismiss"</button>
                                    </AlertDescription>
                                </Alert>
                            }
                        })
                    }}
                </Show>

                <Show when=move || loading.get() fallback=|| ().into_view()>
                    <Spinner class="size-6" />
                </Show>

                <Show when=move || load_error.get().is_some() fallback=|| ().into_view()>
                    {move || {
                        load_error.get().map(|e| {
                            view! {
                                <Alert class="max-w-2xl border-destructive/30">
                                    <AlertDescription class="text-xs text-destructive">{e}</AlertDescription>
                                </Alert>
                            }
                        })
                    }}
                </Show>

                <Show
                    when=move || !pages.with(|c| c.is_empty())
                    fallback=move || view! {
                        <Show when=move || !loading.get() fallback=|| ().into_view()>
                            <div class="py-16 text-center text-sm text-muted-foreground">
                                {move || if caps.get().append {
                                    "The book is empty. Add the first page to begin."
                                } else {
                                    "The book is empty."
                                }}
                            </div>
                        </Show>
                    }
                >
                    <FlipBook controller=controller>
                        <Show when=move || has_page.get() fallback=|| ().into_view()>
                            <PoemPageView
                                page=current_page
                                index=current_index
                                mode=editor_mode
                                policy=policy
                                on_sync=on_sync
                                on_autosave=on_autosave
                                on_focus_change=on_focus_change
                            />
                        </Show>
                    </FlipBook>

                    <nav class="flex items-center gap-2">
                        <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=move |_| prev.run(())>
                            "Prev"
                        </Button>
                        <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=move |_| next.run(())>
                            "Next"
                        </Button>
                        <form class="flex items-center gap-2" on:submit=on_jump.clone()>
                            <Input
                                placeholder="Jump to page #"
                                bind_value=jump_value
                                class="h-8 w-36 text-sm"
                            />
                        </form>
                    </nav>
                </Show>
            </main>

            <Show when=move || index_open.get() fallback=|| ().into_view()>
                <IndexModal open=index_open />
            </Show>

            <Show when=move || !is_remote && mode.get().is_none() fallback=|| ().into_view()>
                <ModeModal />
            </Show>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jump_target_is_one_based() {
        assert_eq!(parse_jump_target("1"), Some(0));
        assert_eq!(parse_jump_target(" 12 "), Some(11));
        assert_eq!(parse_jump_target("0"), Some(-1));
        assert_eq!(parse_jump_target("-3"), Some(-4));
    }

    #[test]
    fn test_jump_target_ignores_non_numeric() {
        assert_eq!(parse_jump_target(""), None);
        assert_eq!(parse_jump_target("three"), None);
        assert_eq!(parse_jump_target("2.5"), None);
    }
}
