//! Property-based tests for identifier and package naming

use proptest::prelude::*;

use xsd2proto::names::{escape, escape_type, is_reserved_word, is_valid_identifier};
use xsd2proto::namespaces::namespace_to_package;

proptest! {
    #[test]
    fn escape_type_yields_identifier(name in "\\PC{0,24}") {
        let escaped = escape_type(&name);
        prop_assert!(is_valid_identifier(&escaped), "{:?} -> {:?}", name, escaped);
        prop_assert!(!is_reserved_word(&escaped));
    }

    #[test]
    fn escape_type_is_idempotent(name in "[a-zA-Z0-9_.:/ -]{0,24}") {
        let once = escape_type(&name);
        prop_assert_eq!(escape_type(&once), once);
    }

    #[test]
    fn escape_keeps_ascii_letters(name in "[a-zA-Z][a-zA-Z0-9_]{0,16}") {
        let escaped = escape(&name);
        prop_assert!(escaped.ends_with(name.as_str()));
        prop_assert!(escaped.len() <= name.len() + 2);
    }

    #[test]
    fn package_chars_are_legal(path in "[a-z0-9./:-]{0,32}") {
        let uri = format!("http://{}", path);
        let package = namespace_to_package(Some(&uri));
        prop_assert!(
            package.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.'),
            "{:?} -> {:?}", uri, package
        );
    }

    #[test]
    fn package_segments_never_start_with_digit(path in "[a-z0-9./:-]{0,32}") {
        let uri = format!("http://{}", path);
        let package = namespace_to_package(Some(&uri));
        for segment in package.split('.') {
            prop_assert!(
                !segment.starts_with(|c: char| c.is_ascii_digit()),
                "{:?} -> {:?}", uri, package
            );
        }
    }
}
