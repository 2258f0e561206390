//! `/api/encounter/*` routes: launch a new encounter from a bestiary or
//! notes page.
//!
//! The worker cannot reach the real server, so these return a script that
//! posts the payload to `/encounter` and opens the resulting tracker page in
//! the `initiative` window with a fresh round counter.

use crate::config::{ENCOUNTER_ENDPOINT, LAUNCH_WINDOW};
use crate::dice::{DiceExpr, RngState};
use crate::encounter::{parse_field, prebuilt_body, RandomEncounter};
use crate::error::{TrackerError, TrackerResult};
use crate::routes::util::{error_fragment, get_param, js_string, parse_form_body, require_param};

fn render_launch_script(body: &str) -> String {
    format!(
        r#"<script>
(function() {{
  fetch({endpoint}, {{
    method: 'POST',
    headers: {{'Accept': 'text/html', 'Content-Type': 'application/json'}},
    body: {body}
  }}).then(function(r) {{
    var tracker = window.open(r.url, {window});
    if (tracker) tracker.sessionStorage.clear();
  }});
}})();
</script>"#,
        endpoint = js_string(ENCOUNTER_ENDPOINT),
        body = js_string(body),
        window = js_string(LAUNCH_WINDOW)
    )
}

// ── POST /api/encounter/launch ─────────────────────────────────────

/// Handle POST /api/encounter/launch
/// Body: encounter={json}
pub fn handle_launch_post(body: &str) -> String {
    let params = parse_form_body(body);
    let raw = get_param(&params, "encounter").unwrap_or("");
    match prebuilt_body(raw) {
        Ok(payload) => render_launch_script(&payload),
        Err(e) => error_fragment(&e),
    }
}

// ── POST /api/encounter/random ─────────────────────────────────────

/// Handle POST /api/encounter/random
/// Body: size={XdY + B}&creature={json}&party={json}&seed={n}
pub fn handle_random_post(body: &str) -> String {
    match random_payload(body) {
        Ok(payload) => render_launch_script(&payload),
        Err(e) => error_fragment(&e),
    }
}

fn random_payload(body: &str) -> TrackerResult<String> {
    let params = parse_form_body(body);
    let size = DiceExpr::parse(require_param(&params, "size")?)?;
    let creature = parse_field("creature", get_param(&params, "creature").unwrap_or(""))?;
    let party = parse_field("party", get_param(&params, "party").unwrap_or(""))?;
    let seed: u64 = get_param(&params, "seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let mut rng = RngState::from_seed(seed);
    let encounter = RandomEncounter::roll(&size, creature, party, &mut rng)?;
    log::info!("launching random encounter of {}", encounter.count());
    serde_json::to_string(&encounter)
        .map_err(|e| TrackerError::MalformedFile(e.to_string()))
}
