use crate::components::ui::{Button, ButtonSize, ButtonVariant, Input};
use crate::state::AppContext;
use leptos::prelude::*;

#[component]
pub fn IndexModal(open: RwSignal<bool>) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let pages = app_state.0.pages;
    let query: RwSignal<String> = RwSignal::new(String::new());

    let close = move || {
        open.set(false);
        query.set(String::new());
    };

    let entries = move || {
        let q = query.get();
        pages.with(|c| {
            c.search_titles(&q)
                .into_iter()
                .map(|(index, p)| (index, p.number, p.display_title().to_string()))
                .collect::<Vec<_>>()
        })
    };

    let go_to = {
        let state = app_state.0.clone();
        Callback::new(move |index: usize| {
            close();
            state.jump_to(index as i64);
        })
    };

    view! {
        <div
            class="fixed inset-0 z-50 flex items-start justify-center bg-black/40 px-4 pt-24"
            role="dialog"
            aria-modal="true"
            on:click=move |_| close()
        >
            <div
                class="w-full max-w-md rounded-lg border bg-background p-4 shadow-lg"
                on:click=|ev| ev.stop_propagation()
            >
                <div class="mb-3 flex items-center justify-between">
                    <h2 class="text-sm font-semibold">"Index"</h2>
                    <Button variant=ButtonVariant::Ghost size=ButtonSize::Sm on:click=move |_| close()>
                        "Close"
                    </Button>
                </div>

                <Input placeholder="Search titles..." bind_value=query class="h-8 text-sm" />

                <ul class="mt-3 max-h-80 overflow-y-auto">
                    <Show
                        when=move || !entries().is_empty()
                        fallback=|| view! { <li class="px-2 py-3 text-xs text-muted-foreground">"No matching poems."</li> }
                    >
                        <For
                            each=entries
                            key=|(index, number, title)| (*index, *number, title.clone())
                            children=move |(index, number, title)| {
                                view! {
                                    <li>
                                        <button
                                            class="flex w-full items-baseline gap-3 rounded-md px-2 py-1.5 text-left text-sm hover:bg-accent"
                                            on:click=move |_| go_to.run(index)
                                        >
                                            <span class="w-8 shrink-0 text-xs tabular-nums text-muted-foreground">{number}</span>
                                            <span class="truncate">{title}</span>
                                        </button>
                                    </li>
                                }
                            }
                        />
                    </Show>
                </ul>
            </div>
        </div>
    }
}
