//! Stash Store demo entry point
//!
//! A persisted visit counter. On the web it lives in `localStorage` and
//! survives reloads; natively it runs against in-memory storage and logs
//! each step.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_demo {
    use stash_store::PersistentStore;

    const COUNTER_KEY: &str = "stash_store_visits";

    /// Write the counter into the `#visits` element, if the page has one
    fn render(visits: u64) {
        let element = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("visits"));
        if let Some(el) = element {
            el.set_text_content(Some(&visits.to_string()));
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Stash Store demo starting...");

        let visits = PersistentStore::new(0u64, COUNTER_KEY);
        visits.on_update(|next, prev| {
            log::info!("visits: {} -> {}", prev, next);
            render(*next);
        });

        visits.sync_once();
        visits.update_value(|v| v + 1);
        render(visits.get_value());

        log::info!(
            "Visit #{} (stored at '{}' at {})",
            visits.get_value(),
            visits.storage_key(),
            String::from(js_sys::Date::new_0().to_iso_string())
        );
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    wasm_demo::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use stash_store::{MemoryStorage, PersistOptions, PersistentStore, StorageMedium};

    env_logger::init();
    log::info!("Stash Store (native) starting...");
    log::info!("Native targets have no browser storage; using an in-memory medium");

    let storage = MemoryStorage::new();

    // Two "runs" of the program sharing one medium.
    for run in 1..=2 {
        let visits = PersistentStore::with_options(
            0u64,
            "visits",
            PersistOptions::default().storage(storage.clone()),
        );
        visits.on_update(|next, prev| log::info!("visits: {} -> {}", prev, next));

        visits.sync_once();
        visits.update_value(|v| v + 1);

        log::info!(
            "run {}: visit #{}, stored as {:?}",
            run,
            visits.get_value(),
            storage.get_item("visits").ok().flatten()
        );
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
