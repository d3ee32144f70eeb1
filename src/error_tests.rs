use super::*;

#[test]
fn display_all_error_kinds() {
    let cases: Vec<(ErrorKind, &str)> = vec![
        (ErrorKind::FileTooLarge, "file-too-large"),
        (ErrorKind::Unexpected('@'), "unexpected"),
        (ErrorKind::UnterminatedScalar, "unterminated-scalar"),
        (ErrorKind::DocumentMarkerInScalar, "document-marker-in-scalar"),
        (ErrorKind::InvalidEscape('q'), "invalid-escape"),
        (ErrorKind::InvalidHexEscape('g'), "invalid-hex-escape"),
        (ErrorKind::InvalidEscapeValue(0xD800), "invalid-escape-value"),
        (ErrorKind::TabIndentation, "tab-indentation"),
        (
            ErrorKind::InvalidBlockScalarHeader("x"),
            "invalid-block-scalar-header",
        ),
        (ErrorKind::EmptyAnchorName, "empty-anchor-name"),
        (ErrorKind::InvalidTag("x"), "invalid-tag"),
        (ErrorKind::InvalidDirective("x"), "invalid-directive"),
        (ErrorKind::BlockEntryNotAllowed, "block-entry-not-allowed"),
        (ErrorKind::MappingKeyNotAllowed, "mapping-key-not-allowed"),
        (ErrorKind::MappingValueNotAllowed, "mapping-value-not-allowed"),
        (ErrorKind::MissingMappingValue, "missing-mapping-value"),
        (
            ErrorKind::Wanted {
                expected: "a key",
                found: "a scalar",
            },
            "wanted",
        ),
        (ErrorKind::InvalidUtf8, "invalid-utf8"),
        (ErrorKind::UndefinedTagHandle("!e!".into()), "undefined-tag-handle"),
        (ErrorKind::DuplicateTagHandle("!e!".into()), "duplicate-tag-handle"),
        (ErrorKind::TooManyTagHandles(16), "too-many-tag-handles"),
        (
            ErrorKind::DuplicateVersionDirective,
            "duplicate-version-directive",
        ),
        (
            ErrorKind::UnsupportedVersion { major: 2, minor: 0 },
            "unsupported-version",
        ),
        (ErrorKind::UndefinedAlias("a".into()), "undefined-alias"),
        (
            ErrorKind::DepthLimitExceeded { limit: 4, depth: 5 },
            "depth-limit-exceeded",
        ),
    ];

    for (kind, expected) in &cases {
        assert_eq!(format!("{kind}"), *expected, "Display mismatch for {expected}");
        assert_eq!(format!("{kind:?}"), *expected, "Debug mismatch for {expected}");
    }
}

#[test]
fn categories() {
    assert_eq!(ErrorKind::TabIndentation.category(), ErrorCategory::Syntax);
    assert_eq!(ErrorKind::UnterminatedScalar.category(), ErrorCategory::Syntax);
    assert_eq!(
        ErrorKind::UndefinedAlias("x".into()).category(),
        ErrorCategory::Semantic
    );
    assert_eq!(
        ErrorKind::UndefinedTagHandle("!x!".into()).category(),
        ErrorCategory::Semantic
    );
    assert_eq!(
        ErrorKind::DepthLimitExceeded { limit: 1, depth: 2 }.category(),
        ErrorCategory::Limit
    );
}

#[test]
fn error_display_includes_position() {
    let err = Error::new(
        ErrorKind::Unexpected('\t'),
        Mark::new(12, 3, 0),
        Span::new(12, 13),
    );
    assert_eq!(
        err.to_string(),
        "found character that cannot start any token: `\\t` at line 4 column 1"
    );

    let err = Error::new(
        ErrorKind::DepthLimitExceeded { limit: 2, depth: 3 },
        Mark::new(0, 0, 4),
        Span::default(),
    );
    assert_eq!(
        err.to_string(),
        "nesting depth 3 exceeds the configured maximum of 2 at line 1 column 5"
    );
    assert_eq!(err.category(), ErrorCategory::Limit);
}
