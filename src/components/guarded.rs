//! Outlet for protected routes.
//!
//! SYSTEM CONTEXT
//! ==============
//! The route guard settles every transition on the shared
//! [`Checkpoint`](crate::guard::Checkpoint). Routes mount their view as soon
//! as the location changes, so protected views are wrapped here and render
//! nothing until the guard has granted the current destination.

use leptos::prelude::*;
use leptos_router::hooks::use_location;

use crate::guard::{Checkpoint, Destination};

/// Render `children` only once the guard has allowed the current location.
#[component]
pub fn Guarded(children: ChildrenFn) -> impl IntoView {
    let checkpoint = expect_context::<RwSignal<Checkpoint>>();
    let location = use_location();

    let granted = move || {
        let here = Destination::from_parts(&location.pathname.get(), &location.search.get(), &location.hash.get());
        checkpoint.with(|c| c.is_granted(&here.full_path))
    };

    view! {
        <Show when=granted>
            {children()}
        </Show>
    }
}
