//! Comparison of live HTTP traffic against fixture expectations.
//!
//! Bodies are compared structurally. A rule is looked up first by the exact
//! path (`$.body.items[0].id`) and then by its wildcard form
//! (`$.body.items[*].id`). Without a rule, leaves must be equal and arrays
//! must have the same length. A `type` rule makes the subtree match by JSON
//! type only, and arrays under it are checked element-wise against the first
//! expected element.

use crate::pact::{MatchKind, MatchingRule, MatchingRules};
use axum::http::HeaderMap;
use core::fmt;
use serde_json::Value;
use std::collections::BTreeMap;

/// One difference between expectation and reality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub path: String,
    pub message: String,
}

impl Mismatch {
    fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Structural JSON body matcher.
pub struct BodyMatcher<'a> {
    rules: &'a MatchingRules,
    allow_unexpected_keys: bool,
}

impl<'a> BodyMatcher<'a> {
    /// Responses may carry keys the consumer does not read.
    pub fn response(rules: &'a MatchingRules) -> Self {
        Self {
            rules,
            allow_unexpected_keys: true,
        }
    }

    /// Requests must not carry keys the provider was not told about.
    pub fn request(rules: &'a MatchingRules) -> Self {
        Self {
            rules,
            allow_unexpected_keys: false,
        }
    }

    pub fn compare(&self, expected: &Value, actual: &Value) -> Vec<Mismatch> {
        let mut out = Vec::new();
        self.walk("$.body", expected, actual, false, &mut out);
        out
    }

    fn rule_for(&self, path: &str) -> Option<&MatchingRule> {
        self.rules
            .get(path)
            .or_else(|| self.rules.get(&wildcard(path)))
    }

    fn walk(&self, path: &str, expected: &Value, actual: &Value, by_type: bool, out: &mut Vec<Mismatch>) {
        let rule = self.rule_for(path);
        let by_type = match rule.and_then(|r| r.kind) {
            Some(MatchKind::Type) => true,
            Some(MatchKind::Equality) => false,
            None => by_type,
        };

        match (expected, actual) {
            (Value::Object(e), Value::Object(a)) => {
                for (key, ev) in e {
                    let child = format!("{path}.{key}");
                    match a.get(key) {
                        Some(av) => self.walk(&child, ev, av, by_type, out),
                        None => out.push(Mismatch::new(child, "expected key is missing")),
                    }
                }
                if !self.allow_unexpected_keys {
                    for key in a.keys().filter(|k| !e.contains_key(*k)) {
                        out.push(Mismatch::new(format!("{path}.{key}"), "unexpected key"));
                    }
                }
            }
            (Value::Array(e), Value::Array(a)) => {
                let min = rule.and_then(|r| r.min);
                let max = rule.and_then(|r| r.max);
                if let Some(min) = min.filter(|&min| a.len() < min) {
                    out.push(Mismatch::new(
                        path,
                        format!("expected at least {min} elements, got {}", a.len()),
                    ));
                }
                if let Some(max) = max.filter(|&max| a.len() > max) {
                    out.push(Mismatch::new(
                        path,
                        format!("expected at most {max} elements, got {}", a.len()),
                    ));
                }

                if by_type || min.is_some() || max.is_some() {
                    if let Some(template) = e.first() {
                        for (i, av) in a.iter().enumerate() {
                            self.walk(&format!("{path}[{i}]"), template, av, by_type, out);
                        }
                    }
                } else if e.len() != a.len() {
                    out.push(Mismatch::new(
                        path,
                        format!("expected {} elements, got {}", e.len(), a.len()),
                    ));
                } else {
                    for (i, (ev, av)) in e.iter().zip(a).enumerate() {
                        self.walk(&format!("{path}[{i}]"), ev, av, by_type, out);
                    }
                }
            }
            (e, a) if by_type => {
                if !same_type(e, a) {
                    out.push(Mismatch::new(
                        path,
                        format!("expected a {}, got {}", type_name(e), type_name(a)),
                    ));
                }
            }
            (e, a) => {
                if e != a {
                    out.push(Mismatch::new(path, format!("expected {e}, got {a}")));
                }
            }
        }
    }
}

/// Checks that every expected header is present with a matching value.
///
/// Names compare case-insensitively. `Content-Type` compares media types and
/// ignores parameters the expectation does not state.
pub fn match_headers(expected: &BTreeMap<String, String>, actual: &HeaderMap) -> Vec<Mismatch> {
    let mut out = Vec::new();
    for (name, want) in expected {
        let path = format!("$.headers.{name}");
        let Some(got) = actual.get(name.as_str()).and_then(|v| v.to_str().ok()) else {
            out.push(Mismatch::new(path, "expected header is missing"));
            continue;
        };

        let matches = if name.eq_ignore_ascii_case("content-type") {
            content_type_matches(want, got)
        } else {
            want == got
        };
        if !matches {
            out.push(Mismatch::new(path, format!("expected '{want}', got '{got}'")));
        }
    }
    out
}

/// Compares query strings as unordered, percent-decoded `key=value` pairs,
/// so `a%20b` and `a+b` are the same value.
pub fn match_query(expected: Option<&str>, actual: Option<&str>) -> Vec<Mismatch> {
    let want = query_pairs(expected.unwrap_or_default());
    let got = query_pairs(actual.unwrap_or_default());
    if want == got {
        Vec::new()
    } else {
        vec![Mismatch::new(
            "$.query",
            format!(
                "expected '{}', got '{}'",
                expected.unwrap_or_default(),
                actual.unwrap_or_default()
            ),
        )]
    }
}

fn query_pairs(query: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<_> = form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    pairs.sort_unstable();
    pairs
}

fn content_type_matches(want: &str, got: &str) -> bool {
    let (want_type, want_params) = split_media_type(want);
    let (got_type, got_params) = split_media_type(got);
    want_type.eq_ignore_ascii_case(got_type)
        && want_params.iter().all(|p| got_params.contains(p))
}

fn split_media_type(value: &str) -> (&str, Vec<String>) {
    let mut parts = value.split(';');
    let media_type = parts.next().unwrap_or_default().trim();
    let params = parts
        .map(|p| p.trim().to_ascii_lowercase())
        .filter(|p| !p.is_empty())
        .collect();
    (media_type, params)
}

/// Replaces every `[<index>]` segment with `[*]`.
fn wildcard(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(start) = rest.find('[') {
        out.push_str(&rest[..=start]);
        rest = &rest[start + 1..];
        match rest.find(']') {
            Some(end) if rest[..end].bytes().all(|b| b.is_ascii_digit()) && end > 0 => {
                out.push('*');
                rest = &rest[end..];
            }
            _ => {}
        }
    }
    out.push_str(rest);
    out
}

fn same_type(a: &Value, b: &Value) -> bool {
    core::mem::discriminant(a) == core::mem::discriminant(b)
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use serde_json::json;

    fn rules(pairs: &[(&str, MatchingRule)]) -> MatchingRules {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn by_type() -> MatchingRule {
        MatchingRule {
            kind: Some(MatchKind::Type),
            ..Default::default()
        }
    }

    #[test]
    fn wildcard_rewrites_indices_only() {
        assert_eq!(wildcard("$.body.items[12].id"), "$.body.items[*].id");
        assert_eq!(wildcard("$.body.a[0][3]"), "$.body.a[*][*]");
        assert_eq!(wildcard("$.body.weird[x]"), "$.body.weird[x]");
    }

    #[test]
    fn equality_is_the_default() {
        let r = MatchingRules::new();
        let m = BodyMatcher::response(&r);
        assert!(m.compare(&json!({"id": "a"}), &json!({"id": "a"})).is_empty());

        let diff = m.compare(&json!({"id": "a"}), &json!({"id": "b"}));
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].path, "$.body.id");
    }

    #[test]
    fn type_rule_cascades_into_arrays() {
        let r = rules(&[("$.body", by_type())]);
        let m = BodyMatcher::response(&r);

        let expected = json!({"items": [{"id": "id1", "completed": false}]});
        let actual = json!({"items": [
            {"id": "x", "completed": true},
            {"id": "y", "completed": false}
        ]});
        assert!(m.compare(&expected, &actual).is_empty());
        assert!(m.compare(&expected, &json!({"items": []})).is_empty());

        let diff = m.compare(&expected, &json!({"items": [{"id": 7, "completed": true}]}));
        assert_eq!(diff, vec![Mismatch::new("$.body.items[0].id", "expected a string, got number")]);
    }

    #[test]
    fn equality_rule_overrides_inherited_type() {
        let r = rules(&[
            ("$.body", by_type()),
            (
                "$.body.kind",
                MatchingRule {
                    kind: Some(MatchKind::Equality),
                    ..Default::default()
                },
            ),
        ]);
        let m = BodyMatcher::response(&r);
        let diff = m.compare(&json!({"kind": "a", "n": 1}), &json!({"kind": "b", "n": 2}));
        assert_eq!(diff.len(), 1);
        assert_eq!(diff[0].path, "$.body.kind");
    }

    #[test]
    fn min_is_enforced_with_wildcard_children() {
        let r = rules(&[
            (
                "$.body.items",
                MatchingRule {
                    min: Some(1),
                    ..Default::default()
                },
            ),
            ("$.body.items[*].id", by_type()),
        ]);
        let m = BodyMatcher::response(&r);
        let expected = json!({"items": [{"id": "id1"}]});

        assert!(m.compare(&expected, &json!({"items": [{"id": "a"}, {"id": "b"}]})).is_empty());
        let diff = m.compare(&expected, &json!({"items": []}));
        assert_eq!(diff.len(), 1);
        assert!(diff[0].message.contains("at least 1"));
    }

    #[test]
    fn responses_allow_extra_keys_requests_do_not() {
        let r = MatchingRules::new();
        let expected = json!({"id": "a"});
        let actual = json!({"id": "a", "extra": true});

        assert!(BodyMatcher::response(&r).compare(&expected, &actual).is_empty());
        let diff = BodyMatcher::request(&r).compare(&expected, &actual);
        assert_eq!(diff, vec![Mismatch::new("$.body.extra", "unexpected key")]);
    }

    #[test]
    fn content_type_ignores_unstated_parameters() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/json; charset=utf-8"),
        );

        let mut expected = BTreeMap::new();
        expected.insert("Content-Type".to_string(), "application/json".to_string());
        assert!(match_headers(&expected, &headers).is_empty());

        expected.insert("Content-Type".to_string(), "text/plain".to_string());
        assert_eq!(match_headers(&expected, &headers).len(), 1);
    }

    #[test]
    fn missing_header_is_reported() {
        let mut expected = BTreeMap::new();
        expected.insert("X-Trace".to_string(), "1".to_string());
        let diff = match_headers(&expected, &HeaderMap::new());
        assert_eq!(diff[0].path, "$.headers.X-Trace");
    }

    #[test]
    fn query_order_does_not_matter() {
        assert!(match_query(Some("limit=10&not_completed=true"), Some("not_completed=true&limit=10")).is_empty());
        assert_eq!(match_query(Some("limit=10"), None).len(), 1);
    }

    #[test]
    fn query_values_compare_decoded() {
        assert!(match_query(Some("title=a%20b"), Some("title=a+b")).is_empty());
        assert!(match_query(Some("q=%C3%A9t%C3%A9"), Some("q=%c3%a9t%c3%a9")).is_empty());
        assert_eq!(match_query(Some("title=a%20b"), Some("title=a%2Bb")).len(), 1);
    }
}
