//! Browser-facing assets for livelocalhost.
//!
//! - [`mime_for`] / [`is_html`]: content type resolution for served files
//! - [`client_script`]: the live reload browser client, rendered once at
//!   startup for the configured service path
//! - [`agent`]: the client's reload-or-swap decision as a pure function

pub mod agent;

/// Content type used for unknown extensions and error bodies.
pub const FALLBACK_MIME: &str = "text/plain";

/// Content type of the generated client script.
pub const SCRIPT_MIME: &str = "application/javascript";

/// Live reload client template.
const CLIENT_TEMPLATE: &str = include_str!("livereload.js");

const SERVICE_TOKEN: &str = "__LLH_RELOAD_SERVICE__";
const HOTLOAD_TOKEN: &str = "__LLH_HOTLOAD_JS__";

/// Return the MIME type string for the given file path.
///
/// Unknown or missing extensions resolve to [`FALLBACK_MIME`].
pub fn mime_for(path: &str) -> &'static str {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(FALLBACK_MIME)
}

/// Whether the path names an HTML document (`.html`, `.htm`, `.xhtml`, ...).
pub fn is_html(path: &str) -> bool {
    std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.to_ascii_lowercase().contains("htm"))
}

/// Render the live reload client for a service path.
///
/// The service path is embedded as a JSON string literal so it cannot break
/// out of the script.
pub fn client_script(service: &str, hotload_js: bool) -> String {
    let service_literal =
        serde_json::to_string(service).unwrap_or_else(|_| String::from("\"\""));
    CLIENT_TEMPLATE
        .replace(SERVICE_TOKEN, &service_literal)
        .replace(HOTLOAD_TOKEN, if hotload_js { "true" } else { "false" })
}

/// Script tag inserted into HTML pages.
pub fn script_tag(script_path: &str) -> String {
    format!("<script type=\"module\" src=\"{script_path}\"></script>\n")
}
