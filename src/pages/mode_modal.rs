use crate::components::ui::{Button, ButtonVariant, Card, CardContent, CardDescription, CardHeader, CardTitle};
use crate::models::Mode;
use crate::state::AppContext;
use leptos::prelude::*;

/// First-visit chooser between reading and writing (local backend).
#[component]
pub fn ModeModal() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let choose = Callback::new(move |mode: Mode| app_state.0.choose_mode(mode));

    view! {
        <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/40 px-4" role="dialog" aria-modal="true">
            <Card class="w-full max-w-sm">
                <CardHeader>
                    <CardTitle class="text-lg">"Open the book"</CardTitle>
                    <CardDescription class="text-xs">
                        "Read the poems as they are, or write new ones. Your choice is remembered on this device."
                    </CardDescription>
                </CardHeader>
                <CardContent>
                    <div class="flex gap-2">
                        <Button class="flex-1" variant=ButtonVariant::Outline on:click=move |_| choose.run(Mode::Read)>
                            "Read"
                        </Button>
                        <Button class="flex-1" on:click=move |_| choose.run(Mode::Write)>
                            "Write"
                        </Button>
                    </div>
                </CardContent>
            </Card>
        </div>
    }
}
