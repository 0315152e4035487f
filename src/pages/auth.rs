use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, Card, CardContent, CardDescription, CardHeader,
    CardTitle, Input, Label, Spinner,
};
use crate::state::AppContext;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Email/password form. `redirect_to` is visited after a successful sign-in.
#[component]
pub fn LoginForm(#[prop(optional, into)] redirect_to: Option<String>) -> impl IntoView {
    let email: RwSignal<String> = RwSignal::new(String::new());
    let password: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);
    let loading: RwSignal<bool> = RwSignal::new(false);

    let app_state = expect_context::<AppContext>();

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        if loading.get_untracked() {
            return;
        }

        let email_val = email.get_untracked();
        let password_val = password.get_untracked();
        let state = app_state.0.clone();
        let redirect_to = redirect_to.clone();

        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match state.sign_in(email_val.trim(), &password_val).await {
                Ok(()) => {
                    if let Some(href) = redirect_to {
                        let _ = window().location().set_href(&href);
                    }
                }
                Err(e) => {
                    log::warn!("sign-in failed: {e}");
                    error.set(Some(e.to_string()));
                }
            }
            loading.set(false);
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <div class="mb-6 text-center text-sm font-medium text-foreground">"Virtual Poem Book"</div>

                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"Sign in"</CardTitle>
                        <CardDescription class="text-xs">"Writers can edit; everyone else reads."</CardDescription>
                    </CardHeader>

                    <CardContent>
                        <form class="flex flex-col gap-3" on:submit=on_submit>
                            <div class="flex flex-col gap-1.5">
                                <Label html_for="email" class="text-xs">"Email"</Label>
                                <Input
                                    id="email"
                                    r#type="email"
                                    placeholder="you@example.com"
                                    bind_value=email
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            <div class="flex flex-col gap-1.5">
                                <Label html_for="password" class="text-xs">"Password"</Label>
                                <Input
                                    id="password"
                                    r#type="password"
                                    bind_value=password
                                    required=true
                                    class="h-8 text-sm"
                                />
                            </div>

                            <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                                {move || {
                                    error.get().map(|e| {
                                        view! {
                                            <Alert class="border-destructive/30">
                                                <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                                            </Alert>
                                        }
                                    })
                                }}
                            </Show>

                            <Button class="w-full" size=ButtonSize::Sm attr:disabled=move || loading.get()>
                                <span class="inline-flex items-center gap-2">
                                    <Show when=move || loading.get() fallback=|| ().into_view()>
                                        <Spinner />
                                    </Show>
                                    {move || if loading.get() { "Signing in..." } else { "Sign in" }}
                                </span>
                            </Button>
                        </form>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

#[component]
pub fn LoginPage() -> impl IntoView {
    view! { <LoginForm redirect_to="/" /> }
}

/// Renders `children` only with a confirmed session; otherwise the login form.
///
/// Every new session (restored or fresh) is checked with the server, its role
/// becomes the book mode, and the pages load.
#[component]
pub fn AuthGate(children: ChildrenFn) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let session = app_state.0.session;
    let checked = app_state.0.session_checked;

    let state = app_state.0.clone();
    Effect::new(move |prev: Option<Option<String>>| {
        let token = session.with(|s| s.as_ref().map(|s| s.access_token.clone()));
        if token.is_some() && prev.as_ref() != Some(&token) {
            state.start_session();
        }
        token
    });

    view! {
        <Show
            when=move || session.with(|s| s.is_some()) && checked.get()
            fallback=move || view! {
                {move || {
                    if session.with(|s| s.is_none()) {
                        view! { <LoginForm /> }.into_any()
                    } else {
                        view! {
                            <div class="flex min-h-screen items-center justify-center">
                                <Spinner class="size-6" />
                            </div>
                        }
                        .into_any()
                    }
                }}
            }
        >
            {children()}
        </Show>
    }
}
