use super::*;

#[test]
fn default_handles() {
    let tags = TagHandles::default();
    assert!(tags.is_empty());
    assert_eq!(tags.resolve("!"), Some("!"));
    assert_eq!(tags.resolve("!!"), Some("tag:yaml.org,2002:"));
    assert_eq!(tags.resolve("!e!"), None);
}

#[test]
fn declared_handles_override_defaults() {
    let mut tags = TagHandles::default();
    tags.declare("!e!", "tag:example.com,2000:").unwrap();
    tags.declare("!!", "tag:other,2001:").unwrap();
    assert_eq!(tags.resolve("!e!"), Some("tag:example.com,2000:"));
    assert_eq!(tags.resolve("!!"), Some("tag:other,2001:"));

    tags.clear();
    assert_eq!(tags.resolve("!e!"), None);
    assert_eq!(tags.resolve("!!"), Some(CORE_SCHEMA_PREFIX));
}

#[test]
fn duplicate_and_capacity() {
    let mut tags = TagHandles::default();
    tags.declare("!a!", "x").unwrap();
    assert_eq!(
        tags.declare("!a!", "y"),
        Err(ErrorKind::DuplicateTagHandle("!a!".into()))
    );

    let mut tags = TagHandles::default();
    for n in 0..MAX_TAG_HANDLES {
        tags.declare(&format!("!h{n}!"), "p").unwrap();
    }
    assert_eq!(
        tags.declare("!last!", "p"),
        Err(ErrorKind::TooManyTagHandles(MAX_TAG_HANDLES))
    );
}

#[test]
fn uri_escapes() {
    assert!(matches!(decode_uri("plain"), Cow::Borrowed("plain")));
    assert_eq!(decode_uri("a%21b"), "a!b");
    assert_eq!(decode_uri("%C3%A9t%C3%A9"), "été");
    assert_eq!(decode_uri("trailing%2"), "trailing%2");
}
