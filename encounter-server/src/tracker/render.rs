//! HTML rendering for the initiative table and its dialogs.
//!
//! The table is a view of the `Tracker`: every mutation re-renders the whole
//! `#tracker_panel` and HTMX swaps it in (`outerHTML`). Element ids and
//! classes (`#tracker`, `.name`, `.initiative`, `.damage`, `.notes`, `.dead`,
//! `#current_turn`, `#current_round`, `#health_dialog`, `.dialog_value`,
//! `#load_dialog`, `#load_dialog_form`) are what the page stylesheet and
//! scripts rely on.

use serde_json::json;

use crate::config::{EXPORT_MIME, MAX_REINFORCEMENTS, NEXT_TURN_KEY, ROUND_STORAGE_KEY};
use crate::routes::popup::render_popup_link;
use crate::routes::util::{escape_html, js_string};
use crate::tracker::participant::Participant;
use crate::tracker::state::Tracker;

/// `hx-vals` attribute value naming a row.
fn name_vals(name: &str) -> String {
    escape_html(&json!({ "name": name }).to_string())
}

/// Render the whole tracker panel.
///
/// `persist_round` appends the script that writes the round counter to
/// session storage; pass it whenever the round changed.
pub fn render_tracker(t: &Tracker, persist_round: bool) -> String {
    render_tracker_with(t, persist_round, None)
}

/// Render the panel with a notice (error or status line, already HTML)
/// under the toolbar.
pub fn render_tracker_with(t: &Tracker, persist_round: bool, notice: Option<&str>) -> String {
    let mut html = String::with_capacity(4096);

    html.push_str(&format!(
        r#"<div id="tracker_panel" data-unload-guard="{}" hx-target="this" hx-swap="outerHTML">"#,
        if t.should_block_unload() { "block" } else { "allow" }
    ));

    // Toolbar
    html.push_str(r#"<div class="flex items-center gap-2 mb-2">"#);
    html.push_str(&render_round(t.round()));
    html.push_str(r#"<button type="button" hx-post="/api/tracker/sort">Sort</button>"#);
    html.push_str(r#"<button type="button" hx-post="/api/tracker/next">Next Turn</button>"#);
    html.push_str(
        r##"<button type="button" hx-get="/api/tracker/save" hx-target="#tracker_script" hx-swap="innerHTML">Save</button>"##,
    );
    html.push_str(
        r##"<button type="button" hx-get="/api/tracker/load" hx-target="#tracker_dialog" hx-swap="innerHTML">Load</button>"##,
    );
    html.push_str("</div>");

    if let Some(notice) = notice {
        html.push_str(r#"<div class="tracker-notice">"#);
        html.push_str(notice);
        html.push_str("</div>");
    }

    // Keyboard shortcut listener; ignores keys typed into inputs.
    html.push_str(&format!(
        r#"<div hidden hx-post="/api/tracker/key" hx-trigger="keyup[key=='{}' &amp;&amp; target.tagName!='INPUT' &amp;&amp; target.tagName!='TEXTAREA'] from:body" hx-vals="js:{{key: event.key}}"></div>"#,
        NEXT_TURN_KEY
    ));

    html.push_str(r#"<table id="tracker"><thead><tr>"#);
    html.push_str("<th>Name</th><th>Initiative</th><th>Damage</th><th>Notes</th>");
    html.push_str("</tr></thead><tbody>");
    for (i, p) in t.participants().iter().enumerate() {
        html.push_str(&render_row(p, i == t.current_turn()));
    }
    html.push_str("</tbody></table>");
    html.push_str(&render_reinforce_form(t));

    html.push_str(r#"<div id="tracker_dialog"></div>"#);
    html.push_str(r#"<div id="tracker_script">"#);
    if persist_round {
        html.push_str(&render_round_script(t.round()));
    }
    html.push_str(&render_unload_guard_script());
    html.push_str("</div>");

    html.push_str("</div>");
    html
}

fn render_row(p: &Participant, current: bool) -> String {
    let mut classes = p.side().as_str().to_string();
    if p.is_dead() {
        classes.push_str(" dead");
    }
    let vals = name_vals(&p.name);

    let mut html = String::with_capacity(1024);
    html.push_str(&format!(r#"<tr class="{}""#, classes));
    if current {
        html.push_str(r#" id="current_turn""#);
    }
    html.push('>');

    html.push_str(r#"<td class="name">"#);
    match &p.link {
        Some(href) => html.push_str(&render_popup_link(href, &p.name)),
        None => html.push_str(&escape_html(&p.name)),
    }
    html.push_str("</td>");

    html.push_str(&format!(
        r#"<td><input type="number" class="initiative" name="initiative" value="{}" hx-post="/api/tracker/initiative" hx-trigger="change" hx-vals="{}"></td>"#,
        p.initiative, vals
    ));

    match (p.damage(), p.max_health()) {
        (Some(damage), Some(max)) => html.push_str(&format!(
            r##"<td title="Shift-click or double-click to damage or heal" hx-get="/api/tracker/dialog" hx-trigger="click[shiftKey], dblclick" hx-target="#tracker_dialog" hx-swap="innerHTML" hx-vals="{vals}"><input type="number" class="damage" name="damage" min="0" max="{max}" value="{damage}" hx-post="/api/tracker/damage" hx-trigger="change" hx-vals="{vals}"> / {max}</td>"##,
            vals = vals,
            max = max,
            damage = damage
        )),
        _ => html.push_str("<td></td>"),
    }

    html.push_str(&format!(
        r#"<td><input type="text" class="notes" name="notes" value="{}" hx-post="/api/tracker/notes" hx-trigger="change" hx-vals="{}"></td>"#,
        escape_html(&p.notes),
        vals
    ));

    html.push_str("</tr>");
    html
}

/// Reinforcement form. "Existing" lists the encounter's stat blocks; "new"
/// takes a name, modifier and hit points. Toggling the radio collapses the
/// other fieldset.
fn render_reinforce_form(t: &Tracker) -> String {
    let has_existing = t.stat_block_names().next().is_some();
    let (existing_class, new_class) = if has_existing {
        ("", " collapsed")
    } else {
        (" collapsed", "")
    };

    let mut html = String::with_capacity(2048);
    html.push_str(&format!(
        r#"<form id="reinforce_form" hx-post="/api/tracker/reinforce" hx-vals="js:{{seed: Math.floor(Math.random() * {})}}" onchange="{}">"#,
        u32::MAX,
        escape_html(
            "var e = this.reinforcement_type.value === 'with_existing'; \
             document.getElementById('reinforce_with_existing_controls').classList.toggle('collapsed', !e); \
             document.getElementById('reinforce_with_new_controls').classList.toggle('collapsed', e);"
        )
    ));
    html.push_str(&format!(
        r#"<label><input type="radio" id="reinforce_with_existing" name="reinforcement_type" value="with_existing"{}{}> Existing</label>"#,
        if has_existing { " checked" } else { "" },
        if has_existing { "" } else { " disabled" }
    ));
    html.push_str(&format!(
        r#"<label><input type="radio" id="reinforce_with_new" name="reinforcement_type" value="with_new"{}> New</label>"#,
        if has_existing { "" } else { " checked" }
    ));

    html.push_str(&format!(
        r#"<fieldset id="reinforce_with_existing_controls" class="reinforce{}"><select name="stats">"#,
        existing_class
    ));
    for name in t.stat_block_names() {
        let name = escape_html(name);
        html.push_str(&format!(r#"<option value="{0}">{0}</option>"#, name));
    }
    html.push_str("</select></fieldset>");

    html.push_str(&format!(
        r#"<fieldset id="reinforce_with_new_controls" class="reinforce{}">"#,
        new_class
    ));
    html.push_str(r#"<input type="text" name="name" placeholder="Name">"#);
    html.push_str(r#"<input type="number" name="initiative_mod" value="0" title="Initiative modifier">"#);
    html.push_str(r#"<input type="number" name="max_hp" min="1" placeholder="HP">"#);
    html.push_str("</fieldset>");

    html.push_str(&format!(
        r#"<input type="number" name="quantity" min="1" max="{}" value="1">"#,
        MAX_REINFORCEMENTS
    ));
    html.push_str(
        r#"<select name="side"><option value="enemy">Enemy</option><option value="ally">Ally</option></select>"#,
    );
    html.push_str(r#"<button type="submit">Reinforce</button>"#);
    html.push_str("</form>");
    html
}

/// `Round N` display.
pub fn render_round(round: i32) -> String {
    format!(r#"<p id="current_round" class="font-bold">Round {}</p>"#, round)
}

/// Write the round counter to session storage.
pub fn render_round_script(round: i32) -> String {
    format!(
        "<script>sessionStorage.setItem({}, {});</script>",
        js_string(ROUND_STORAGE_KEY),
        js_string(&round.to_string())
    )
}

/// `beforeunload` handler reading the panel's guard attribute. Assigning
/// `onbeforeunload` keeps a single handler across re-renders.
fn render_unload_guard_script() -> String {
    r#"<script>window.onbeforeunload = function (e) { var p = document.getElementById('tracker_panel'); if (p && p.dataset.unloadGuard === 'block') { e.preventDefault(); e.returnValue = ''; } };</script>"#
        .to_string()
}

/// Health dialog for one row. Closing with a button posts its value.
pub fn render_health_dialog(p: &Participant) -> String {
    let name = escape_html(&p.name);
    let mut html = String::with_capacity(1024);
    html.push_str(r#"<dialog id="health_dialog">"#);
    html.push_str(
        r##"<form method="dialog" hx-post="/api/tracker/damage" hx-target="#tracker_panel" hx-swap="outerHTML">"##,
    );
    html.push_str(&format!(r#"<p class="font-bold">{}</p>"#, name));
    html.push_str(&format!(r#"<input type="hidden" name="name" value="{}">"#, name));
    html.push_str(
        r#"<input type="number" class="dialog_value" name="value" min="0" value="0" autofocus>"#,
    );
    html.push_str(r#"<button name="button" value="damage_button">Damage</button>"#);
    html.push_str(r#"<button name="button" value="heal_button">Heal</button>"#);
    html.push_str(r#"<button name="button" value="cancel" formnovalidate>Cancel</button>"#);
    html.push_str("</form></dialog>");
    html.push_str(
        "<script>document.getElementById('health_dialog').showModal();</script>",
    );
    html
}

/// File-picker dialog. The selected file's text is posted to
/// `/api/tracker/load` as the `file` field.
pub fn render_load_dialog() -> String {
    let mut html = String::with_capacity(1024);
    html.push_str(r#"<dialog id="load_dialog">"#);
    html.push_str(r#"<form id="load_dialog_form" method="dialog">"#);
    html.push_str(&format!(
        r#"<input type="file" name="file_picker" accept="{},.json">"#,
        EXPORT_MIME
    ));
    html.push_str(r#"<button>Load</button>"#);
    html.push_str("</form></dialog>");
    html.push_str(
        r#"<script>
(function() {
  var dialog = document.getElementById('load_dialog');
  var form = document.getElementById('load_dialog_form');
  form.addEventListener('submit', function(event) {
    var files = event.target.file_picker.files;
    if (files.length > 0) {
      files[0].text().then(function(text) {
        htmx.ajax('POST', '/api/tracker/load', {target: '#tracker_panel', swap: 'outerHTML', values: {file: text}});
      });
    }
  }, {once: true});
  dialog.showModal();
})();
</script>"#,
    );
    html
}

/// Script downloading `json` as `filename`.
pub fn render_download_script(json: &str, filename: &str) -> String {
    format!(
        r#"<script>
(function() {{
  var b = new Blob([{json}], {{type: {mime}}});
  var a = document.createElement('a');
  a.href = URL.createObjectURL(b);
  a.download = {filename};
  document.body.appendChild(a);
  a.click();
  document.body.removeChild(a);
  URL.revokeObjectURL(a.href);
}})();
</script>"#,
        json = js_string(json),
        mime = js_string(EXPORT_MIME),
        filename = js_string(filename)
    )
}
