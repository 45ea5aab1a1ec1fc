use poster_core::{
    plan_post, ImageRole, PipelineError, Post, ThreadMode, ThreadSettings, Visibility,
};
use pretty_assertions::assert_eq;
use url::Url;

const URL: &str = "https://blog.example.com/tech/hello/";
const SECOND: &str = "The second paragraph carries enough words to need a post of its own.";

fn post(thread: bool, body: &str) -> Post {
    Post {
        id: "content/tech/hello/index.md".into(),
        site_path: "tech/hello/index.md".into(),
        title: "Hello World".into(),
        date: None,
        featured_image: None,
        announcement: None,
        share: true,
        thread,
        slug: None,
        url_override: None,
        body: body.into(),
    }
}

fn settings(budget: usize) -> ThreadSettings {
    let mut settings = ThreadSettings::new(Url::parse("https://blog.example.com").unwrap());
    settings.budget = budget;
    settings
}

#[test]
fn single_mode_announces_title_and_link() {
    let mut post = post(false, "Body is ignored here. ![x](x.png)");
    post.featured_image = Some("cover.jpg".into());
    let plan = plan_post(&post, &settings(480)).unwrap();

    assert_eq!(plan.mode, ThreadMode::Single);
    assert_eq!(plan.url, URL);
    assert_eq!(plan.len(), 1);
    let first = plan.first();
    assert!(first.is_first());
    assert_eq!(first.text, format!("New post: Hello World\n\n{URL}"));
    assert_eq!(first.in_reply_to, None);
    let media: Vec<_> = first.media.iter().map(|m| m.src.as_str()).collect();
    assert_eq!(media, vec!["cover.jpg"]);
}

#[test]
fn custom_announcement_is_shortened_to_fit() {
    let mut post = post(false, "");
    post.announcement = Some("A fairly long announcement that will not fit".into());
    let plan = plan_post(&post, &settings(60)).unwrap();
    assert_eq!(plan.first().text, format!("A fairly long…\n\n{URL}"));
    assert!(plan.first().text.chars().count() <= 60);
}

#[test]
fn thread_mode_merges_header_into_first_post() {
    let body = format!("First paragraph is short.\n\n![pic](pic.png)\n\n{SECOND}\n");
    let mut post = post(true, &body);
    post.featured_image = Some("cover.jpg".into());
    let plan = plan_post(&post, &settings(100)).unwrap();

    assert_eq!(plan.mode, ThreadMode::Thread);
    let texts: Vec<_> = plan.posts().iter().map(|p| p.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            format!("Hello World\n\n{URL}\n\nFirst paragraph is short.").as_str(),
            SECOND,
        ]
    );
    let posts = plan.posts();
    assert_eq!(posts[0].media.len(), 1);
    assert_eq!(posts[0].media[0].role, ImageRole::Featured);
    assert_eq!(posts[1].media.len(), 1);
    assert_eq!(posts[1].media[0].src, "pic.png");
    assert_eq!(posts[1].media[0].alt.as_deref(), Some("pic"));
    for (i, planned) in posts.iter().enumerate() {
        assert_eq!(planned.index, i + 1);
        assert!(planned.text.chars().count() <= 100);
    }
}

#[test]
fn cramped_header_becomes_its_own_post() {
    let plan = plan_post(&post(true, "Tiny body."), &settings(60)).unwrap();
    let texts: Vec<_> = plan.posts().iter().map(|p| p.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![format!("Hello World\n\n{URL}").as_str(), "Tiny body."]
    );
    assert_eq!(plan.posts()[1].index, 2);
}

#[test]
fn wide_opening_word_pushes_header_into_its_own_post() {
    let link = "https://docs.example.org/guides/architecture/overview/components/storage-engine.html";
    let body = format!("{link} explains the layout.");
    let plan = plan_post(&post(true, &body), &settings(120)).unwrap();
    let texts: Vec<_> = plan.posts().iter().map(|p| p.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![format!("Hello World\n\n{URL}").as_str(), body.as_str()]
    );
    assert!(plan.posts().iter().all(|p| !p.text.contains('…')));
}

#[test]
fn empty_thread_is_an_error() {
    assert_eq!(
        plan_post(&post(true, "\n\n"), &settings(480)),
        Err(PipelineError::EmptyThread)
    );
    assert_eq!(
        plan_post(&post(true, "![only](a.png)\n"), &settings(480)),
        Err(PipelineError::EmptyThread)
    );
}

#[test]
fn visibility_is_applied_to_every_post() {
    let mut settings = settings(40);
    settings.visibility = Visibility::Unlisted;
    let body = "One two three four five six seven eight nine ten eleven twelve.";
    let plan = plan_post(&post(true, body), &settings).unwrap();
    assert!(plan.len() > 2);
    assert!(plan.posts().iter().all(|p| p.visibility == Visibility::Unlisted));
    assert!(plan.posts().iter().all(|p| p.in_reply_to.is_none()));
}

#[test]
fn slug_and_url_override_change_the_link() {
    let mut slugged = post(false, "");
    slugged.slug = Some("greetings".into());
    let plan = plan_post(&slugged, &settings(480)).unwrap();
    assert_eq!(plan.url, "https://blog.example.com/tech/greetings/");

    let mut moved = post(false, "");
    moved.url_override = Some("/custom/place/".into());
    let plan = plan_post(&moved, &settings(480)).unwrap();
    assert_eq!(plan.url, "https://blog.example.com/custom/place/");
}

#[test]
fn base_with_path_keeps_its_prefix() {
    let mut settings = settings(480);
    settings.site_base = Url::parse("https://example.com/blog").unwrap();
    let plan = plan_post(&post(false, ""), &settings).unwrap();
    assert_eq!(plan.url, "https://example.com/blog/tech/hello/");
}

#[test]
fn visibility_parses_case_insensitively() {
    assert_eq!("Public".parse::<Visibility>(), Ok(Visibility::Public));
    assert_eq!(" unlisted ".parse::<Visibility>(), Ok(Visibility::Unlisted));
    assert_eq!("private".parse::<Visibility>(), Ok(Visibility::Private));
    assert!("direct".parse::<Visibility>().is_err());
    assert_eq!(Visibility::default().to_string(), "public");
}
