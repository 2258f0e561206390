//! Popup links: `<a target="popup">` opens in a small named window instead
//! of navigating the tracker page away.

use crate::config::{POPUP_FEATURES, POPUP_WINDOW};
use crate::routes::util::{escape_html, js_string};

/// Link that opens `href` in the popup window.
pub fn render_popup_link(href: &str, text: &str) -> String {
    format!(
        r#"<a href="{href}" target="{window}" onclick="window.open(this.href, {window_js}, {features_js}); return false;">{text}</a>"#,
        href = escape_html(href),
        window = POPUP_WINDOW,
        window_js = escape_html(&js_string(POPUP_WINDOW)),
        features_js = escape_html(&js_string(POPUP_FEATURES)),
        text = escape_html(text)
    )
}

// ── GET /api/popup ─────────────────────────────────────────────────

/// Handle GET /api/popup
/// Returns a script wiring every `a[target=popup]` already on the page
/// (links rendered by templates rather than by `render_popup_link`).
pub fn handle_wire_get(_query: &str) -> String {
    format!(
        r#"<script>
(function() {{
  document.querySelectorAll('a[target={window}]').forEach(function(link) {{
    if (link.dataset.popupBound) return;
    link.dataset.popupBound = '1';
    link.addEventListener('click', function(event) {{
      event.preventDefault();
      window.open(link.href, {window_js}, {features_js});
    }});
  }});
}})();
</script>"#,
        window = POPUP_WINDOW,
        window_js = js_string(POPUP_WINDOW),
        features_js = js_string(POPUP_FEATURES)
    )
}
