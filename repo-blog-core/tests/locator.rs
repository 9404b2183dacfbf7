use repo_blog_core::error::LocatorError;
use repo_blog_core::locator::{resolve, RepositoryLocator};

struct TestCase {
    name: &'static str,
    input: &'static str,
    expected: &'static str,
}

#[test]
fn test_resolve_accepted_forms_table_driven() {
    let cases = vec![
        TestCase {
            name: "https url",
            input: "https://github.com/me/foo",
            expected: "me/foo",
        },
        TestCase {
            name: "https url with .git",
            input: "https://github.com/me/foo.git",
            expected: "me/foo",
        },
        TestCase {
            name: "https url with trailing slash",
            input: "https://github.com/me/foo/",
            expected: "me/foo",
        },
        TestCase {
            name: "url with trailing path",
            input: "https://github.com/me/foo/tree/main/docs",
            expected: "me/foo",
        },
        TestCase {
            name: "url without scheme",
            input: "github.com/me/foo",
            expected: "me/foo",
        },
        TestCase {
            name: "ssh remote",
            input: "git@github.com:me/foo.git",
            expected: "me/foo",
        },
        TestCase {
            name: "shorthand",
            input: "me/foo",
            expected: "me/foo",
        },
        TestCase {
            name: "shorthand with .git and whitespace",
            input: "  me/foo.git \n",
            expected: "me/foo",
        },
    ];

    for case in cases {
        let locator = resolve(case.input)
            .unwrap_or_else(|e| panic!("{}: expected success, got {e}", case.name));
        assert_eq!(locator.as_str(), case.expected, "{}", case.name);
        assert_eq!(locator.owner(), "me", "{}", case.name);
        assert_eq!(locator.name(), "foo", "{}", case.name);
    }
}

#[test]
fn test_resolve_is_idempotent() {
    for input in [
        "me/foo",
        "https://github.com/rust-lang/rust.git",
        "git@gitlab.example.org:team/project",
        "owner/name.with.dots",
    ] {
        let once = resolve(input).unwrap();
        let twice = resolve(once.as_str()).unwrap();
        assert_eq!(once, twice, "resolving {input:?} twice changed it");
    }
}

#[test]
fn test_resolve_rejects_strings_without_a_slash() {
    for input in ["foo", "", "   ", "justaword.git", "https:", "a b"] {
        match resolve(input) {
            Err(LocatorError::InvalidLocator { input: got }) => assert_eq!(got, input),
            Ok(l) => panic!("{input:?} should not resolve, got {l}"),
        }
    }
}

#[test]
fn test_resolve_rejects_empty_name() {
    assert!(resolve("me/.git").is_err());
    assert!(resolve("/foo").is_err());
}

#[test]
fn test_locator_parses_from_str() {
    let locator: RepositoryLocator = "https://github.com/me/foo".parse().unwrap();
    assert_eq!(locator.to_string(), "me/foo");
}
