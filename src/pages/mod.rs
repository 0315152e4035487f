mod auth;
mod book;
mod index_modal;
mod mode_modal;
mod page_view;

pub use auth::LoginPage;

use auth::AuthGate;
use book::BookPage;

use crate::state::AppContext;
use leptos::prelude::*;

/// The book, behind sign-in when pages live on the remote backend.
#[component]
pub fn RootPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();

    if app_state.0.is_remote() {
        view! {
            <AuthGate>
                <BookPage />
            </AuthGate>
        }
        .into_any()
    } else {
        view! { <BookPage /> }.into_any()
    }
}
