use leptos::prelude::*;
use leptos_ui::clx;

mod components {
    use super::*;
    clx! {Card, div, "flex flex-col gap-4 rounded-lg border bg-card py-6 text-card-foreground shadow-sm"}
    clx! {CardHeader, div, "flex flex-col gap-1.5 px-6"}
    clx! {CardTitle, h2, "font-semibold leading-none"}
    clx! {CardDescription, p, "text-sm text-muted-foreground"}
    clx! {CardContent, div, "px-6"}
}

pub use components::*;
