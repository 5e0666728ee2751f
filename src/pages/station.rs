//! Protected per-station page. Station data itself comes from the backend
//! API; this page only frames it for the signed-in user.

use leptos::prelude::*;
use leptos_router::hooks::use_params_map;

use crate::pages::home::SessionPanel;

#[component]
pub fn StationPage() -> impl IntoView {
    let params = use_params_map();
    let station_id = move || params.with(|p| p.get("id").map(|id| id.to_string()).unwrap_or_default());

    view! {
        <div class="station-page">
            <SessionPanel/>
            <h1>"Station " {station_id}</h1>
            <a href="/">"All stations"</a>
        </div>
    }
}
