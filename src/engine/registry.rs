use std::collections::HashMap;

/// Bidirectional mapping between backend script ids and source URLs,
/// populated incrementally from `scriptParsed` events. Ids stay inside the
/// engine; callers only ever see URLs. Entries are never removed for the
/// session's lifetime.
#[derive(Debug, Default)]
pub struct ScriptRegistry {
    id_to_url: HashMap<String, String>,
    url_to_id: HashMap<String, String>,
    /// URLs in load order, for most-recently-loaded-first searches.
    load_order: Vec<String>,
}

impl ScriptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: String, url: String) {
        if url.is_empty() {
            // Anonymous scripts (eval'd code) have no URL to resolve against.
            self.id_to_url.insert(id, url);
            return;
        }
        self.id_to_url.insert(id.clone(), url.clone());
        self.url_to_id.insert(url.clone(), id);
        self.load_order.push(url);
    }

    pub fn url_for_id(&self, id: &str) -> Option<&str> {
        self.id_to_url.get(id).map(String::as_str)
    }

    pub fn id_for_url(&self, url: &str) -> Option<&str> {
        self.url_to_id.get(url).map(String::as_str)
    }

    /// Every URL whose path suffix matches `suffix`, most recently loaded
    /// first. Separators are normalized so `src/foo.js` matches a URL path
    /// ending in `src/foo.js` regardless of platform.
    pub fn find_by_suffix(&self, suffix: &str) -> Vec<String> {
        let needle = normalize(suffix);
        let needle = needle.trim_end_matches(':');
        self.load_order
            .iter()
            .rev()
            .filter(|url| suffix_matches(&normalize(url), needle))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.load_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.load_order.is_empty()
    }
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// Suffix match on path-component boundaries: `foo.js` matches
/// `file:///src/foo.js` but not `file:///src/barfoo.js`.
fn suffix_matches(url: &str, suffix: &str) -> bool {
    if !url.ends_with(suffix) {
        return false;
    }
    let boundary = url.len() - suffix.len();
    boundary == 0 || url.as_bytes()[boundary - 1] == b'/'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ScriptRegistry {
        let mut r = ScriptRegistry::new();
        r.insert("1".into(), "file:///proj/src/foo.js".into());
        r.insert("2".into(), "file:///proj/src/bar.js".into());
        r.insert("3".into(), "file:///proj/other/foo.js".into());
        r
    }

    #[test]
    fn maps_both_directions() {
        let r = registry();
        assert_eq!(r.url_for_id("2"), Some("file:///proj/src/bar.js"));
        assert_eq!(r.id_for_url("file:///proj/src/bar.js"), Some("2"));
        assert_eq!(r.url_for_id("9"), None);
    }

    #[test]
    fn suffix_search_is_most_recent_first() {
        let r = registry();
        let hits = r.find_by_suffix("foo.js");
        assert_eq!(
            hits,
            vec![
                "file:///proj/other/foo.js".to_string(),
                "file:///proj/src/foo.js".to_string(),
            ]
        );
    }

    #[test]
    fn suffix_search_respects_component_boundaries() {
        let mut r = registry();
        r.insert("4".into(), "file:///proj/src/barfoo.js".into());
        assert_eq!(r.find_by_suffix("foo.js").len(), 2);
        assert_eq!(r.find_by_suffix("src/foo.js").len(), 1);
        assert!(r.find_by_suffix("missing.js").is_empty());
    }

    #[test]
    fn anonymous_scripts_do_not_pollute_search() {
        let mut r = registry();
        r.insert("5".into(), String::new());
        assert_eq!(r.len(), 3);
        assert_eq!(r.url_for_id("5"), Some(""));
    }

    #[test]
    fn backslash_queries_are_normalized() {
        let r = registry();
        assert_eq!(r.find_by_suffix("src\\foo.js").len(), 1);
    }
}
