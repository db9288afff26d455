//! Reload decision of the browser client.
//!
//! `livereload.js` runs in the browser, so its rules are restated here as a
//! pure function over the change batch and the page state. Both must agree:
//!
//! 1. The page's own file changed, or JavaScript hot reload is on and a
//!    script changed: reload the page and do nothing else.
//! 2. Otherwise swap every same-origin stylesheet whose path changed.
//! 3. Anything else is ignored.

use percent_encoding::percent_decode_str;

/// Extensions that count as scripts for JavaScript hot reload.
const SCRIPT_EXTENSIONS: &[&str] = &[".js", ".mjs"];

/// What the client does with one change batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reaction {
    /// Full page reload.
    Reload,
    /// Replace these stylesheets in place (paths relative to the site root).
    SwapStylesheets(Vec<String>),
    /// Nothing on the page is affected.
    Ignore,
}

/// Parse a `change` event payload.
///
/// Returns `None` for anything other than a JSON array of strings; the client
/// logs and skips such payloads.
pub fn parse_batch(data: &str) -> Option<Vec<String>> {
    serde_json::from_str(data).ok()
}

/// File served for a URL path: `/` and `/docs/` map to their `index.html`.
///
/// The path is percent-decoded, matching the file names the watcher reports.
pub fn page_file(pathname: &str) -> String {
    let decoded = decode_path(pathname);
    let path = decoded.strip_prefix('/').unwrap_or(&decoded);
    if path.is_empty() || path.ends_with('/') {
        format!("{path}index.html")
    } else {
        path.to_owned()
    }
}

fn decode_path(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

/// Decide how a page reacts to a change batch.
///
/// * `changed` - relative paths from the `change` event
/// * `pathname` - URL path of the current page
/// * `stylesheets` - URL paths of the page's same-origin stylesheet links
/// * `hotload_js` - reload the page on script changes
pub fn decide(changed: &[String], pathname: &str, stylesheets: &[&str], hotload_js: bool) -> Reaction {
    let page = page_file(pathname);
    let script_changed = || {
        changed
            .iter()
            .any(|c| SCRIPT_EXTENSIONS.iter().any(|ext| c.ends_with(ext)))
    };

    if changed.contains(&page) || (hotload_js && script_changed()) {
        return Reaction::Reload;
    }

    let swaps: Vec<String> = stylesheets
        .iter()
        .map(|href| decode_path(href))
        .map(|path| match path.strip_prefix('/') {
            Some(stripped) => stripped.to_owned(),
            None => path,
        })
        .filter(|path| changed.contains(path))
        .collect();

    if swaps.is_empty() {
        Reaction::Ignore
    } else {
        Reaction::SwapStylesheets(swaps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn batch(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|p| (*p).to_owned()).collect()
    }

    #[test]
    fn test_page_file() {
        assert_eq!(page_file("/"), "index.html");
        assert_eq!(page_file("/docs/"), "docs/index.html");
        assert_eq!(page_file("/about.html"), "about.html");
        assert_eq!(page_file(""), "index.html");
    }

    #[test]
    fn test_own_index_change_reloads_without_swap() {
        let changed = batch(&["index.html", "style.css"]);
        let reaction = decide(&changed, "/", &["/style.css"], false);
        assert_eq!(reaction, Reaction::Reload);
    }

    #[test]
    fn test_nested_index_change_reloads() {
        let changed = batch(&["docs/index.html"]);
        assert_eq!(decide(&changed, "/docs/", &[], false), Reaction::Reload);
    }

    #[test]
    fn test_encoded_page_path_reloads() {
        assert_eq!(page_file("/my%20page.html"), "my page.html");
        let changed = batch(&["my page.html"]);
        assert_eq!(decide(&changed, "/my%20page.html", &[], false), Reaction::Reload);
    }

    #[test]
    fn test_encoded_stylesheet_path_swaps() {
        let changed = batch(&["css/über style.css"]);
        let reaction = decide(&changed, "/", &["/css/%C3%BCber%20style.css"], false);
        assert_eq!(
            reaction,
            Reaction::SwapStylesheets(vec!["css/über style.css".to_owned()])
        );
    }

    #[test]
    fn test_other_page_change_is_ignored() {
        let changed = batch(&["about.html"]);
        assert_eq!(decide(&changed, "/", &["/style.css"], false), Reaction::Ignore);
    }

    #[test]
    fn test_stylesheet_change_swaps() {
        let changed = batch(&["css/site.css", "img/logo.png"]);
        let reaction = decide(&changed, "/", &["/css/site.css", "/css/print.css"], false);
        assert_eq!(
            reaction,
            Reaction::SwapStylesheets(vec!["css/site.css".to_owned()])
        );
    }

    #[test]
    fn test_script_change_without_hotload_is_ignored() {
        let changed = batch(&["app.js"]);
        assert_eq!(decide(&changed, "/", &[], false), Reaction::Ignore);
    }

    #[test]
    fn test_script_change_with_hotload_reloads() {
        assert_eq!(decide(&batch(&["app.js"]), "/", &[], true), Reaction::Reload);
        assert_eq!(decide(&batch(&["lib/mod.mjs"]), "/", &[], true), Reaction::Reload);
    }

    #[test]
    fn test_parse_batch() {
        assert_eq!(
            parse_batch(r#"["a.css","b.css"]"#),
            Some(batch(&["a.css", "b.css"]))
        );
        assert_eq!(parse_batch("not json"), None);
        assert_eq!(parse_batch(r#"{"path":"a.css"}"#), None);
        assert_eq!(parse_batch("[1, 2]"), None);
    }
}
