//! Encounter initiative tracker, served in-browser from WASM.
//!
//! Exports `handle_request(method, path, query, body)` for the Service Worker
//! bridge to call. Uses `matchit` for URL routing, the same router
//! engine that powers Axum.
//!
//! `/api/tracker/*` owns the initiative table (order, turns, rounds, damage,
//! save/load, reinforcements). `/api/encounter/*` builds the payload that
//! starts a new encounter, and `/api/popup` wires reference links to open
//! in a side window.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod dice;
pub mod encounter;
pub mod error;
pub mod routes;
pub mod tracker;

/// Route `log` records to the browser console and panics to
/// `console.error`. Safe to call more than once.
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(config::LOG_LEVEL).is_ok() {
        log::info!("encounter-server ready");
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    init_logging();
}

/// Process an HTTP-like request and return an HTML fragment.
///
/// Called from JavaScript (Web Worker) via wasm-bindgen.
///
/// # Arguments
/// * `method` — HTTP method (e.g., "GET", "POST")
/// * `path`   — URL path (e.g., "/api/tracker/next")
/// * `query`  — Query string (e.g., "?name=Goblin%201")
/// * `body`   — Request body (e.g., POST form data). Empty string for GET requests.
///
/// # Returns
/// An HTML string fragment suitable for HTMX to swap into the DOM.
#[wasm_bindgen]
pub fn handle_request(method: &str, path: &str, query: &str, body: &str) -> String {
    let mut router = matchit::Router::new();

    router.insert("/api/tracker", "tracker").ok();
    router.insert("/api/tracker/roster", "tracker_roster").ok();
    router.insert("/api/tracker/sort", "tracker_sort").ok();
    router.insert("/api/tracker/next", "tracker_next").ok();
    router.insert("/api/tracker/key", "tracker_key").ok();
    router.insert("/api/tracker/dialog", "tracker_dialog").ok();
    router.insert("/api/tracker/damage", "tracker_damage").ok();
    router.insert("/api/tracker/initiative", "tracker_initiative").ok();
    router.insert("/api/tracker/notes", "tracker_notes").ok();
    router.insert("/api/tracker/round", "tracker_round").ok();
    router.insert("/api/tracker/guard", "tracker_guard").ok();
    router.insert("/api/tracker/save", "tracker_save").ok();
    router.insert("/api/tracker/load", "tracker_load").ok();
    router.insert("/api/tracker/reinforce", "tracker_reinforce").ok();

    router.insert("/api/encounter/launch", "encounter_launch").ok();
    router.insert("/api/encounter/random", "encounter_random").ok();
    router.insert("/api/popup", "popup").ok();

    log::debug!("{} {}", method, path);

    match router.at(path) {
        Ok(matched) => match (*matched.value, method) {
            // Tracker reads
            ("tracker", "GET") => routes::tracker::handle_tracker_get(query),
            ("tracker_dialog", "GET") => routes::tracker::handle_dialog_get(query),
            ("tracker_round", "GET") => routes::tracker::handle_round_get(query),
            ("tracker_guard", "GET") => routes::tracker::handle_guard_get(query),
            ("tracker_save", "GET") => routes::tracker::handle_save_get(query),
            ("tracker_load", "GET") => routes::tracker::handle_load_get(query),

            // Tracker mutations
            ("tracker_roster", "POST") => routes::tracker::handle_roster_post(query, body),
            ("tracker_sort", "POST") => routes::tracker::handle_sort_post(body),
            ("tracker_next", "POST") => routes::tracker::handle_next_post(body),
            ("tracker_key", "POST") => routes::tracker::handle_key_post(body),
            ("tracker_damage", "POST") => routes::tracker::handle_damage_post(body),
            ("tracker_initiative", "POST") => routes::tracker::handle_initiative_post(body),
            ("tracker_notes", "POST") => routes::tracker::handle_notes_post(body),
            ("tracker_round", "POST") => routes::tracker::handle_round_post(body),
            ("tracker_load", "POST") => routes::tracker::handle_load_post(body),
            ("tracker_reinforce", "POST") => routes::tracker::handle_reinforce_post(body),

            // Encounter launcher and popups
            ("encounter_launch", "POST") => routes::encounter::handle_launch_post(body),
            ("encounter_random", "POST") => routes::encounter::handle_random_post(body),
            ("popup", "GET") => routes::popup::handle_wire_get(query),

            _ => method_not_allowed(),
        },
        Err(_) => not_found(),
    }
}

fn not_found() -> String {
    r#"<span class="text-red-700">404 — route not found</span>"#.to_string()
}

fn method_not_allowed() -> String {
    r#"<span class="text-red-700">405 — method not allowed</span>"#.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::state::{replace_tracker, with_tracker, Tracker};

    const ROSTER: &str = r#"[
        {"name":"Aria","type":"player","initiative":15},
        {"name":"Goblin 1","type":"enemy","initiative":10,"max_health":7,"link":"/creatures/goblin"},
        {"name":"Wolf 1","type":"ally","initiative":20,"max_health":11}
    ]"#;

    fn reset() {
        replace_tracker(Tracker::default());
    }

    #[test]
    fn returns_404_for_unknown_route() {
        let html = handle_request("GET", "/api/nonexistent", "", "");
        assert!(html.contains("404"));
    }

    #[test]
    fn returns_405_for_wrong_method() {
        assert!(handle_request("GET", "/api/tracker/next", "", "").contains("405"));
        assert!(handle_request("POST", "/api/tracker/guard", "", "").contains("405"));
        assert!(handle_request("GET", "/api/encounter/launch", "", "").contains("405"));
    }

    #[test]
    fn routes_roster_sort_next() {
        reset();
        let html = handle_request("POST", "/api/tracker/roster", "?round=2", ROSTER);
        assert!(html.contains("Round 2"));
        assert!(html.contains(r#"target="popup""#));

        handle_request("POST", "/api/tracker/sort", "", "");
        with_tracker(|t| assert_eq!(t.names(), vec!["Wolf 1", "Aria", "Goblin 1"]));

        for _ in 0..3 {
            handle_request("POST", "/api/tracker/next", "", "");
        }
        let round = handle_request("GET", "/api/tracker/round", "", "");
        assert!(round.contains("Round 3"));
        reset();
    }

    #[test]
    fn routes_damage_flips_guard() {
        reset();
        handle_request("POST", "/api/tracker/roster", "", ROSTER);
        assert_eq!(handle_request("GET", "/api/tracker/guard", "", ""), "block");
        let dialog = handle_request("GET", "/api/tracker/dialog", "?name=Goblin%201", "");
        assert!(dialog.contains(r#"id="health_dialog""#));
        handle_request(
            "POST",
            "/api/tracker/damage",
            "",
            "name=Goblin+1&button=damage_button&value=9",
        );
        assert_eq!(handle_request("GET", "/api/tracker/guard", "", ""), "allow");
        reset();
    }

    #[test]
    fn routes_save_and_load() {
        reset();
        handle_request("POST", "/api/tracker/roster", "", ROSTER);
        handle_request("POST", "/api/tracker/notes", "", "name=Aria&notes=blessed");
        let script = handle_request("GET", "/api/tracker/save", "?now=0", "");
        assert!(script.contains("encounter_1970-01-01T00:00:00.000Z.json"));

        let saved = with_tracker(|t| t.save_json()).unwrap();
        handle_request("POST", "/api/tracker/notes", "", "name=Aria&notes=");
        let html = handle_request("POST", "/api/tracker/load", "", &saved);
        assert!(html.contains(r#"value="blessed""#));
        reset();
    }

    #[test]
    fn routes_reinforce_and_popup() {
        reset();
        handle_request("POST", "/api/tracker/roster", "", ROSTER);
        let html = handle_request("POST", "/api/tracker/reinforce", "", "name=Goblin&max_hp=7&seed=4");
        assert!(html.contains("Goblin 3"));
        assert!(handle_request("GET", "/api/popup", "", "").contains("a[target=popup]"));
        reset();
    }

    #[test]
    fn routes_encounter_launch() {
        let html = handle_request(
            "POST",
            "/api/encounter/launch",
            "",
            "encounter=%7B%22pcs%22%3A%5B%5D%7D",
        );
        assert!(html.contains(r#"fetch("/encounter""#));
    }
}
