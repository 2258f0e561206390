//! `/api/tracker/*` routes: initiative order, round counter, damage,
//! save/load and reinforcements.
//!
//! Every mutation goes through `Tracker::dispatch` and answers with the
//! re-rendered `#tracker_panel`. Failed mutations re-render the panel with
//! the error under the toolbar so the table never goes stale.

use time::OffsetDateTime;

use crate::error::{TrackerError, TrackerResult};
use crate::routes::util::{
    error_fragment, escape_html, get_param, parse_form_body, parse_query, require_int,
    require_param,
};
use crate::tracker::damage::DialogOutcome;
use crate::tracker::dispatch::{TrackerAction, TrackerEvent};
use crate::tracker::participant::{RosterEntry, Side};
use crate::tracker::persist::{export_filename, parse_saved, LoadReport};
use crate::tracker::reinforce::{Reinforcement, ReinforcementSource};
use crate::tracker::render::{
    render_download_script, render_health_dialog, render_load_dialog, render_round,
    render_round_script, render_tracker, render_tracker_with,
};
use crate::tracker::state::{with_tracker, with_tracker_mut};

/// Dispatch one action and render the outcome.
fn apply(action: TrackerResult<TrackerAction>) -> String {
    apply_all(action.map(|a| vec![a]))
}

/// Dispatch actions in order, stopping at the first failure.
fn apply_all(actions: TrackerResult<Vec<TrackerAction>>) -> String {
    with_tracker_mut(|t| {
        let actions = match actions {
            Ok(actions) => actions,
            Err(e) => return render_tracker_with(t, false, Some(&error_fragment(&e))),
        };
        let mut persist_round = false;
        let mut notice = None;
        for action in actions {
            match t.dispatch(action) {
                Ok(event) => {
                    persist_round |= event.round_changed();
                    if let TrackerEvent::Loaded(report) = &event {
                        notice = Some(load_notice(report));
                    }
                }
                Err(e) => {
                    return render_tracker_with(t, persist_round, Some(&error_fragment(&e)));
                }
            }
        }
        render_tracker_with(t, persist_round, notice.as_deref())
    })
}

fn load_notice(report: &LoadReport) -> String {
    let mut text = format!("Loaded saved values into {} rows.", report.applied);
    if !report.missing.is_empty() {
        text.push_str(&format!(" Not in file: {}.", report.missing.join(", ")));
    }
    if !report.unmatched.is_empty() {
        text.push_str(&format!(" Ignored: {}.", report.unmatched.join(", ")));
    }
    format!(r#"<span class="text-emerald-700">{}</span>"#, escape_html(&text))
}

// ── GET /api/tracker ───────────────────────────────────────────────

/// Handle GET /api/tracker
/// Returns the full tracker panel.
pub fn handle_tracker_get(_query: &str) -> String {
    with_tracker(|t| render_tracker(t, false))
}

// ── POST /api/tracker/roster ───────────────────────────────────────

/// Handle POST /api/tracker/roster?round={n}
/// Body: roster={json array} (or the raw JSON array).
/// Sent once by the page on load with the server-rendered participants and
/// the round counter read from session storage.
pub fn handle_roster_post(query: &str, body: &str) -> String {
    let params = parse_form_body(body);
    let raw = json_payload(&params, body, "roster");
    let round = get_param(&parse_query(query), "round")
        .and_then(|r| r.trim().parse::<i32>().ok())
        .filter(|r| *r >= 1)
        .unwrap_or(1);

    let roster = serde_json::from_str::<Vec<RosterEntry>>(raw)
        .map_err(|e| TrackerError::MalformedFile(e.to_string()));
    apply_all(roster.map(|entries| {
        vec![TrackerAction::SetRoster(entries), TrackerAction::SetRound(round)]
    }))
}

// ── POST /api/tracker/sort ─────────────────────────────────────────

pub fn handle_sort_post(_body: &str) -> String {
    apply(Ok(TrackerAction::SortByInitiative))
}

// ── POST /api/tracker/next ─────────────────────────────────────────

pub fn handle_next_post(_body: &str) -> String {
    apply(Ok(TrackerAction::AdvanceTurn))
}

// ── POST /api/tracker/key ──────────────────────────────────────────

/// Handle POST /api/tracker/key
/// Body: key={event.key}
pub fn handle_key_post(body: &str) -> String {
    let params = parse_form_body(body);
    let key = get_param(&params, "key").unwrap_or("").to_string();
    apply(Ok(TrackerAction::Key(key)))
}

// ── GET /api/tracker/dialog ────────────────────────────────────────

/// Handle GET /api/tracker/dialog?name={name}
/// Returns the health dialog for the named row (swapped into `#tracker_dialog`).
pub fn handle_dialog_get(query: &str) -> String {
    let params = parse_query(query);
    let name = match require_param(&params, "name") {
        Ok(name) => name,
        Err(e) => return error_fragment(&e),
    };
    with_tracker(|t| match t.find(name) {
        Some(p) if p.side().tracks_health() => render_health_dialog(p),
        Some(_) => error_fragment(&TrackerError::NoHealthTrack(name.to_string())),
        None => error_fragment(&TrackerError::UnknownParticipant(name.to_string())),
    })
}

// ── POST /api/tracker/damage ───────────────────────────────────────

/// Handle POST /api/tracker/damage
/// Body params:
///   - name={name}&button={damage_button|heal_button|...}&value={n} → health dialog
///   - name={name}&damage={n}                                        → direct edit
pub fn handle_damage_post(body: &str) -> String {
    let params = parse_form_body(body);
    apply(damage_action(&params))
}

fn damage_action(params: &[(String, String)]) -> TrackerResult<TrackerAction> {
    let name = require_param(params, "name")?.to_string();
    match get_param(params, "button") {
        Some(button) => {
            let outcome = DialogOutcome::from_return_value(button);
            let amount = match outcome {
                DialogOutcome::Cancel => 0,
                _ => require_int(params, "value")?,
            };
            Ok(TrackerAction::ApplyDamage {
                name,
                outcome,
                amount,
            })
        }
        None => Ok(TrackerAction::SetDamage {
            name,
            damage: require_int(params, "damage")?,
        }),
    }
}

// ── POST /api/tracker/initiative ───────────────────────────────────

pub fn handle_initiative_post(body: &str) -> String {
    let params = parse_form_body(body);
    apply(initiative_action(&params))
}

fn initiative_action(params: &[(String, String)]) -> TrackerResult<TrackerAction> {
    Ok(TrackerAction::SetInitiative {
        name: require_param(params, "name")?.to_string(),
        initiative: require_int(params, "initiative")?,
    })
}

// ── POST /api/tracker/notes ────────────────────────────────────────

pub fn handle_notes_post(body: &str) -> String {
    let params = parse_form_body(body);
    apply(require_param(&params, "name").map(|name| TrackerAction::SetNotes {
        name: name.to_string(),
        notes: get_param(&params, "notes").unwrap_or("").to_string(),
    }))
}

// ── GET/POST /api/tracker/round ────────────────────────────────────

/// Handle GET /api/tracker/round
/// Returns the `Round N` display and writes it back to session storage.
pub fn handle_round_get(_query: &str) -> String {
    with_tracker(|t| format!("{}{}", render_round(t.round()), render_round_script(t.round())))
}

/// Handle POST /api/tracker/round
/// Body: round={n}
pub fn handle_round_post(body: &str) -> String {
    let params = parse_form_body(body);
    apply(require_int(&params, "round").map(TrackerAction::SetRound))
}

// ── GET /api/tracker/guard ─────────────────────────────────────────

/// Handle GET /api/tracker/guard
/// `block` while any enemy is alive, `allow` otherwise.
pub fn handle_guard_get(_query: &str) -> String {
    let block = with_tracker(|t| t.should_block_unload());
    let guard = if block { "block" } else { "allow" };
    guard.to_string()
}

// ── GET /api/tracker/save ──────────────────────────────────────────

/// Handle GET /api/tracker/save?now={unix millis}
/// Returns a script downloading the encounter as JSON. `now` names the file;
/// without it the worker clock is used.
pub fn handle_save_get(query: &str) -> String {
    let params = parse_query(query);
    match save_script(get_param(&params, "now")) {
        Ok(script) => script,
        Err(e) => error_fragment(&e),
    }
}

fn save_script(now: Option<&str>) -> TrackerResult<String> {
    let now = match now {
        Some(ms) => {
            let nanos = ms
                .parse::<i128>()
                .ok()
                .and_then(|ms| ms.checked_mul(1_000_000))
                .ok_or_else(|| TrackerError::invalid("now", ms))?;
            OffsetDateTime::from_unix_timestamp_nanos(nanos)
                .map_err(|e| TrackerError::invalid("now", e.to_string()))?
        }
        None => OffsetDateTime::now_utc(),
    };
    let filename = export_filename(now)?;
    let json = with_tracker(|t| t.save_json())?;
    log::info!("saving encounter as {}", filename);
    Ok(render_download_script(&json, &filename))
}

// ── GET/POST /api/tracker/load ─────────────────────────────────────

/// Handle GET /api/tracker/load
/// Returns the file-picker dialog (swapped into `#tracker_dialog`).
pub fn handle_load_get(_query: &str) -> String {
    render_load_dialog()
}

/// Handle POST /api/tracker/load
/// Body: file={json} (or the raw JSON file contents).
pub fn handle_load_post(body: &str) -> String {
    let params = parse_form_body(body);
    let raw = json_payload(&params, body, "file");
    apply(parse_saved(raw).map(TrackerAction::Load))
}

// ── POST /api/tracker/reinforce ────────────────────────────────────

/// Handle POST /api/tracker/reinforce
/// Body params:
///   - reinforcement_type=with_existing&stats={stat block}&quantity={n}&side={enemy|ally}&seed={n}
///   - reinforcement_type=with_new&name={name}&max_hp={n}&initiative_mod={n}&quantity={n}&side={enemy|ally}&seed={n}
///
/// `reinforcement_type` defaults to `with_new`.
pub fn handle_reinforce_post(body: &str) -> String {
    let params = parse_form_body(body);
    apply(reinforce_action(&params))
}

fn reinforce_action(params: &[(String, String)]) -> TrackerResult<TrackerAction> {
    let side_raw = get_param(params, "side").unwrap_or("enemy");
    let side = Side::parse(side_raw).ok_or_else(|| TrackerError::invalid("side", side_raw))?;
    let source = match get_param(params, "reinforcement_type").unwrap_or("with_new") {
        "with_existing" => ReinforcementSource::Existing {
            stats: require_param(params, "stats")?.to_string(),
        },
        "with_new" | "" => ReinforcementSource::New {
            name: require_param(params, "name")?.to_string(),
            initiative_mod: optional_int(params, "initiative_mod", 0)?,
            max_health: match get_param(params, "max_hp") {
                Some(v) if !v.is_empty() => require_int(params, "max_hp")?,
                _ => require_int(params, "max_health")?,
            },
        },
        other => return Err(TrackerError::invalid("reinforcement_type", other)),
    };
    let quantity: i64 = optional_int(params, "quantity", 1)?;
    Ok(TrackerAction::Reinforce(Reinforcement {
        source,
        quantity: u32::try_from(quantity)
            .map_err(|_| TrackerError::invalid("quantity", quantity.to_string()))?,
        side,
        seed: optional_int(params, "seed", 0)?,
    }))
}

fn optional_int<T: std::str::FromStr>(
    params: &[(String, String)],
    key: &'static str,
    default: T,
) -> TrackerResult<T> {
    match get_param(params, key) {
        Some(v) if !v.is_empty() => require_int(params, key),
        _ => Ok(default),
    }
}

/// JSON payload sent either as a raw body or in the form field `field`.
fn json_payload<'a>(params: &'a [(String, String)], body: &'a str, field: &str) -> &'a str {
    let raw = body.trim();
    if raw.starts_with('{') || raw.starts_with('[') {
        return raw;
    }
    get_param(params, field).unwrap_or(raw)
}
