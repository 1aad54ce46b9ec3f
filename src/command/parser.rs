use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::model::ParsedRequest;

const DEFAULT_METHOD: &str = "GET";
const BODY_METHOD: &str = "POST";

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"']+"#).expect("url pattern"));
static METHOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:-X|--request)\s+([A-Z]+)").expect("method pattern"));
static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:-H|--header)\s+["']([^:]+):\s*([^"']+)["']"#).expect("header pattern")
});
// the closing quote has to match the opening one, JSON bodies carry the other kind
static BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:-d|--data)\s+(?:'(.+?)'|"(.+?)")"#).expect("body pattern")
});

/// Extracts url, method, headers and body from a curl-like command.
///
/// Anything the patterns do not recognize is ignored; only a missing URL
/// is an error.
pub fn parse(command: &str) -> super::Result<ParsedRequest> {
    let url = URL
        .find(command)
        .ok_or_else(|| super::Error::Parse("no http(s) URL found".into()))?
        .as_str()
        .to_owned();

    let method = METHOD
        .captures(command)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned());

    let headers = HEADER
        .captures_iter(command)
        .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
        .map(|(k, v)| (k.trim().to_owned(), v.trim().to_owned()))
        .collect::<BTreeMap<_, _>>();

    let body = BODY
        .captures(command)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().to_owned());

    let method = match (method, &body) {
        (Some(method), _) => method,
        (None, Some(_)) => BODY_METHOD.to_owned(),
        (None, None) => DEFAULT_METHOD.to_owned(),
    };

    Ok(ParsedRequest {
        url,
        method,
        headers,
        body,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::command::Error;

    #[test]
    fn should_parse_reference_command() {
        let actual = parse(
            r#"curl -X POST https://example.com/x -H "Content-Type: application/json" -d '{"a":1}'"#,
        )
        .unwrap();

        let expected = ParsedRequest {
            url: "https://example.com/x".into(),
            method: "POST".into(),
            headers: BTreeMap::from([("Content-Type".into(), "application/json".into())]),
            body: Some(r#"{"a":1}"#.into()),
        };
        assert_eq!(actual, expected);
    }

    #[test]
    fn should_default_to_get() {
        let actual = parse("curl https://example.com/ping").unwrap();

        assert_eq!(actual.method, "GET");
        assert!(actual.headers.is_empty());
        assert_eq!(actual.body, None);
    }

    #[test]
    fn should_promote_to_post_when_body_present() {
        let actual = parse(r#"curl https://example.com/items --data "name=jora""#).unwrap();

        assert_eq!(actual.method, "POST");
        assert_eq!(actual.body.as_deref(), Some("name=jora"));
    }

    #[test]
    fn should_keep_explicit_method_with_body() {
        let actual = parse(r#"curl --request PUT https://example.com/items/1 -d '{"b":2}'"#).unwrap();

        assert_eq!(actual.method, "PUT");
        assert_eq!(actual.body.as_deref(), Some(r#"{"b":2}"#));
    }

    #[test]
    fn should_let_later_headers_win() {
        let actual = parse(
            r#"curl https://example.com -H 'Accept: text/plain' --header "Accept: application/json" -H 'X-Trace: 1'"#,
        )
        .unwrap();

        assert_eq!(actual.headers.len(), 2);
        assert_eq!(actual.headers["Accept"], "application/json");
        assert_eq!(actual.headers["X-Trace"], "1");
    }

    #[test]
    fn should_stop_url_at_quote() {
        let actual = parse(r#"curl "https://example.com/a?b=c""#).unwrap();

        assert_eq!(actual.url, "https://example.com/a?b=c");
    }

    #[test]
    fn should_fail_without_url() {
        let actual = parse("curl -X GET example.com");

        assert!(matches!(actual, Err(Error::Parse(_))));
    }

    #[test]
    fn should_ignore_lowercase_method() {
        let actual = parse("curl -X delete https://example.com").unwrap();

        assert_eq!(actual.method, "GET");
    }
}
