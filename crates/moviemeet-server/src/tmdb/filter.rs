use serde_json::Value;

/// Keywords that drop a result when found in its title or overview.
pub const DEFAULT_DENYLIST: &[&str] = &["erotic", "sex", "adult", "pornographic"];

/// Best-effort family-friendly filter over provider movie payloads.
///
/// A movie is dropped when it carries `"adult": true` or when its title or
/// overview contains a denylisted keyword (case-insensitive substring).
#[derive(Debug, Clone)]
pub struct ContentFilter {
    keywords: Vec<String>,
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST.iter().copied())
    }
}

impl ContentFilter {
    pub fn new<'a>(keywords: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            keywords: keywords.into_iter().map(str::to_lowercase).collect(),
        }
    }

    pub fn allows(&self, movie: &Value) -> bool {
        if movie.get("adult").and_then(Value::as_bool).unwrap_or(false) {
            return false;
        }

        let text_of = |field: &str| {
            movie
                .get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_lowercase()
        };
        let title = text_of("title");
        let overview = text_of("overview");

        !self
            .keywords
            .iter()
            .any(|keyword| title.contains(keyword) || overview.contains(keyword))
    }

    /// Removes disallowed entries from the `results` array of a paged
    /// payload. Payloads without `results` are returned as they are.
    pub fn filter_results(&self, mut page: Value) -> Value {
        if let Some(results) = page.get_mut("results").and_then(Value::as_array_mut) {
            results.retain(|movie| self.allows(movie));
        }
        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn drops_adult_flag() {
        let filter = ContentFilter::default();
        assert!(!filter.allows(&json!({"title": "Fine", "overview": "", "adult": true})));
        assert!(filter.allows(&json!({"title": "Fine", "overview": "", "adult": false})));
    }

    #[test]
    fn keyword_match_is_case_insensitive_on_title_and_overview() {
        let filter = ContentFilter::default();
        assert!(!filter.allows(&json!({"title": "An EROTIC tale"})));
        assert!(!filter.allows(&json!({"title": "Quiet", "overview": "Strictly Adult viewing"})));
        assert!(filter.allows(&json!({"title": "Paddington", "overview": "A bear in London"})));
    }

    #[test]
    fn missing_fields_are_allowed() {
        assert!(ContentFilter::default().allows(&json!({})));
    }

    #[test]
    fn filters_results_array_and_keeps_paging_fields() {
        let page = json!({
            "page": 2,
            "total_pages": 9,
            "results": [
                {"id": 1, "title": "Dune", "overview": "Spice"},
                {"id": 2, "title": "Nope", "overview": "", "adult": true},
                {"id": 3, "title": "Sex Tape", "overview": ""},
            ]
        });

        let filtered = ContentFilter::default().filter_results(page);
        let ids: Vec<i64> = filtered["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_i64().unwrap())
            .collect();

        assert_eq!(ids, vec![1]);
        assert_eq!(filtered["page"], 2);
        assert_eq!(filtered["total_pages"], 9);
    }

    #[test]
    fn custom_keywords_are_lowercased() {
        let filter = ContentFilter::new(["Gore"]);
        assert!(!filter.allows(&json!({"title": "GORE fest"})));
        assert!(filter.allows(&json!({"title": "Erotic"})));
    }
}
