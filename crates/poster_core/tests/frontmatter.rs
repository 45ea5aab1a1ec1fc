use poster_core::{parse_post, PipelineError, PostLocation};
use pretty_assertions::assert_eq;

fn location() -> PostLocation {
    PostLocation::new("content/tech/hello/index.md", "tech/hello/index.md")
}

#[test]
fn recognized_fields_are_parsed() {
    let raw = "---\ntitle: Hello World\ndate: 2024-03-01\nmastodon: true\nmastodon_thread: true\nmastodon_text: Custom words\nimage: cover.png\ntags: [a, b]\n---\n\nBody text.\n";
    let post = parse_post(location(), raw).unwrap();

    assert_eq!(post.id, "content/tech/hello/index.md");
    assert_eq!(post.site_path, "tech/hello/index.md");
    assert_eq!(post.title, "Hello World");
    assert_eq!(post.date.as_deref(), Some("2024-03-01"));
    assert!(post.share);
    assert!(post.thread);
    assert_eq!(post.announcement.as_deref(), Some("Custom words"));
    assert_eq!(post.featured_image.as_deref(), Some("cover.png"));
    assert_eq!(post.body, "\nBody text.\n");
}

#[test]
fn flags_default_to_false() {
    let post = parse_post(location(), "---\ntitle: Quiet\n---\nbody").unwrap();
    assert!(!post.share);
    assert!(!post.thread);
    assert_eq!(post.announcement, None);
    assert_eq!(post.featured_image, None);
}

#[test]
fn numeric_dates_are_kept_as_text() {
    let post = parse_post(location(), "---\ntitle: T\ndate: 2024\n---\n").unwrap();
    assert_eq!(post.date.as_deref(), Some("2024"));
}

#[test]
fn slug_and_url_overrides_are_read() {
    let post = parse_post(
        location(),
        "---\ntitle: T\nslug: nicer\nurl: /custom/path/\n---\n",
    )
    .unwrap();
    assert_eq!(post.slug.as_deref(), Some("nicer"));
    assert_eq!(post.url_override.as_deref(), Some("/custom/path/"));
}

#[test]
fn missing_title_is_reported() {
    let err = parse_post(location(), "---\nmastodon: true\n---\nbody").unwrap_err();
    assert_eq!(err, PipelineError::MissingRequiredField("title"));

    let err = parse_post(location(), "---\ntitle: \"  \"\n---\nbody").unwrap_err();
    assert_eq!(err, PipelineError::MissingRequiredField("title"));

    let err = parse_post(location(), "---\n---\nbody").unwrap_err();
    assert_eq!(err, PipelineError::MissingRequiredField("title"));
}

#[test]
fn absent_block_is_malformed() {
    let err = parse_post(location(), "# Just markdown\n\ntext").unwrap_err();
    assert!(matches!(err, PipelineError::MalformedFrontmatter(_)), "{err:?}");
}

#[test]
fn unterminated_block_is_malformed() {
    let err = parse_post(location(), "---\ntitle: Open\nbody without end").unwrap_err();
    assert!(matches!(err, PipelineError::MalformedFrontmatter(_)), "{err:?}");
}

#[test]
fn invalid_yaml_is_malformed() {
    for raw in [
        "---\ntitle: [unclosed\n---\nbody",
        "---\n- a\n- b\n---\nbody",
        "---\ntitle: T\nmastodon: maybe\n---\nbody",
    ] {
        let err = parse_post(location(), raw).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedFrontmatter(_)), "{raw:?} -> {err:?}");
    }
}
