use super::*;

#[test]
fn test_item_hierarchy() {
    let item = Content::item("i1", "bbc.co.uk");
    assert_eq!(item.hierarchy(), Hierarchy::Item);
    assert!(!item.is_container());
}

#[test]
fn test_brand_is_top_level_container() {
    let brand = Content::brand("b1", "bbc.co.uk");
    assert_eq!(brand.hierarchy(), Hierarchy::TopLevelContainer);
    assert!(brand.is_container());
}

#[test]
fn test_series_without_parent_is_top_level() {
    let series = Content::series("s1", "bbc.co.uk", None);
    assert_eq!(series.hierarchy(), Hierarchy::TopLevelContainer);
}

#[test]
fn test_series_with_parent_is_non_top_level() {
    let series = Content::series("s1", "bbc.co.uk", Some(ContentId::new("b1")));
    assert_eq!(series.hierarchy(), Hierarchy::NonTopLevelContainer);
    assert!(series.is_container());
}

#[test]
fn test_films_and_songs_are_items() {
    assert_eq!(
        Content::new("f1", "pa", ContentKind::Film).hierarchy(),
        Hierarchy::Item
    );
    assert_eq!(
        Content::new("t1", "spotify", ContentKind::Song).hierarchy(),
        Hierarchy::Item
    );
}

#[test]
fn test_content_kind_deserializes_from_tagged_json() {
    let kind: ContentKind =
        serde_json::from_str(r#"{"type":"series","parent":"b1"}"#).expect("should parse");
    assert_eq!(
        kind,
        ContentKind::Series {
            parent: Some(ContentId::new("b1"))
        }
    );

    let kind: ContentKind = serde_json::from_str(r#"{"type":"brand"}"#).expect("should parse");
    assert_eq!(kind, ContentKind::Brand);
}

#[test]
fn test_publisher_ordering_is_by_key() {
    let a = Publisher::new("a.com");
    let b = Publisher::new("b.com");
    assert!(a < b);
    assert_eq!(a.to_string(), "a.com");
}
