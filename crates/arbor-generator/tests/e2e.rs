//! End-to-end tests for Arbor.
//!
//! Each test lays out a small site in a temporary directory, builds it and
//! inspects the site graph and the written output.

use std::{fs, path::Path};

use arbor_core::Config;
use arbor_generator::{
    BuildRequest, Builder, PageKind, build_content_site, build_docs_site, search::SearchIndex,
};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn config(extra: &str) -> Config {
    Config::from_toml_str(&format!(
        "[site]\ntitle = \"Test Site\"\nbase_url = \"https://example.com\"\n{extra}"
    ))
    .expect("config")
}

fn read(root: &Path, relative: &str) -> String {
    fs::read_to_string(root.join(relative))
        .unwrap_or_else(|e| panic!("reading {relative}: {e}"))
}

fn blog_site(root: &Path) {
    write(root, "content/_index.md", "---\ntitle: Blog\n---\nWelcome.\n");
    write(root, "content/posts/_index.md", "---\ntitle: Posts\n---\n");
    write(
        root,
        "content/posts/2024-hello.md",
        "---\ntitle: Hello\ndate: 2024-01-01\ntags: [Go]\n---\nHello **world**.\n",
    );
}

#[test]
fn test_blog_home_section_and_page() {
    let dir = TempDir::new().unwrap();
    blog_site(dir.path());

    let request = BuildRequest::new(dir.path(), config(""));
    let out = request.destination.clone();
    let stats = Builder::new(request).build().unwrap();
    assert_eq!(stats.pages, 1);
    assert_eq!(stats.list_pages, 2);

    let home = read(&out, "index.html");
    assert!(home.contains("<title>Blog | Test Site</title>"));
    assert!(home.contains("Welcome."));

    let posts = read(&out, "posts/index.html");
    assert!(posts.contains("<h1>Posts</h1>"));
    assert_eq!(posts.matches(r#"class="post-title""#).count(), 1);
    assert!(posts.contains(r#"href="/posts/2024-hello""#));

    let hello = read(&out, "posts/2024-hello/index.html");
    assert!(hello.contains("<h1>Hello</h1>"));
    assert!(hello.contains("<strong>world</strong>"));
    assert!(hello.contains(r#"datetime="2024-01-01""#));
}

#[test]
fn test_branch_index_is_never_a_page() {
    let dir = TempDir::new().unwrap();
    blog_site(dir.path());
    write(dir.path(), "content/posts/archive/_INDEX.md", "---\ntitle: Archive\n---\n");
    write(dir.path(), "content/posts/archive/old.md", "---\ntitle: Old\n---\n");

    let site = build_content_site(&BuildRequest::new(dir.path(), config(""))).unwrap();

    let archive = site.find_by_permalink("/posts/archive").expect("archive list");
    assert_eq!(site.page(archive).kind, PageKind::Section);
    assert_eq!(site.page(archive).title, "Archive");
    assert_eq!(site.children(archive).count(), 1);
    assert!(
        site.regular_pages()
            .all(|(_, p)| !p.permalink.ends_with("_index"))
    );
    assert_eq!(
        site.pages()
            .filter(|(_, p)| p.permalink == "/posts/archive")
            .count(),
        1
    );

    // Nested members are part of the top-level section too.
    let posts = site.find_by_permalink("/posts").expect("posts");
    assert_eq!(site.children(posts).count(), 2);
}

#[test]
fn test_leaf_bundle_routes_by_directory() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "content/posts/My Trip/index.md", "---\ntitle: Trip\n---\nPhotos.\n");
    write(dir.path(), "content/posts/My Trip/cover.png", "png");

    let request = BuildRequest::new(dir.path(), config(""));
    let out = request.destination.clone();
    let site = build_content_site(&request).unwrap();
    let trip = site.find_by_permalink("/posts/my-trip").expect("bundle page");
    assert_eq!(site.page(trip).slug, "my-trip");

    Builder::new(request).build().unwrap();
    assert!(out.join("posts/my-trip/index.html").exists());
    assert_eq!(read(&out, "posts/my-trip/cover.png"), "png");
}

#[test]
fn test_shared_tag_term_page() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "content/posts/first.md",
        "---\ntitle: First\ndate: 2024-01-01\ntags: [Go]\n---\n",
    );
    write(
        dir.path(),
        "content/posts/second.md",
        "---\ntitle: Second\ndate: 2024-02-01\ntags: [\" Go \"]\n---\n",
    );
    write(dir.path(), "content/posts/third.md", "---\ntitle: Third\n---\n");

    let request = BuildRequest::new(dir.path(), config(""));
    let out = request.destination.clone();
    Builder::new(request).build().unwrap();

    let term = read(&out, "tags/go/index.html");
    assert_eq!(term.matches(r#"class="post-title""#).count(), 2);
    assert!(term.contains(r#"href="/posts/first""#));
    assert!(term.contains(r#"href="/posts/second""#));
    assert!(!term.contains(r#"href="/posts/third""#));

    let tags = read(&out, "tags/index.html");
    assert_eq!(tags.matches(r#"class="term-item""#).count(), 1);
    assert!(tags.contains(r#"href="/tags/go""#));
}

#[test]
fn test_drafts_excluded_unless_requested() {
    let dir = TempDir::new().unwrap();
    blog_site(dir.path());
    write(
        dir.path(),
        "content/posts/secret.md",
        "---\ntitle: Secret\ndraft: true\ntags: [hidden]\n---\n",
    );

    let request = BuildRequest::new(dir.path(), config(""));
    let out = request.destination.clone();
    Builder::new(request.clone()).build().unwrap();

    assert!(!out.join("posts/secret/index.html").exists());
    assert!(!out.join("tags/hidden/index.html").exists());
    assert!(!read(&out, "sitemap.xml").contains("/posts/secret"));
    assert!(!read(&out, "index.xml").contains("Secret"));
    assert!(!read(&out, "posts/index.html").contains("Secret"));

    Builder::new(request.with_drafts(true).with_clean_destination(true))
        .build()
        .unwrap();
    assert!(out.join("posts/secret/index.html").exists());
    assert!(out.join("tags/hidden/index.html").exists());
    assert!(read(&out, "sitemap.xml").contains("/posts/secret"));
}

#[test]
fn test_existing_site_files_not_overwritten() {
    let dir = TempDir::new().unwrap();
    blog_site(dir.path());

    let request = BuildRequest::new(dir.path(), config(""));
    assert!(!request.clean_destination);
    let out = request.destination.clone();
    write(&out, "sitemap.xml", "mine");
    write(&out, "robots.txt", "User-agent: *\nDisallow: /\n");

    Builder::new(request).build().unwrap();
    assert_eq!(read(&out, "sitemap.xml"), "mine");
    assert_eq!(read(&out, "robots.txt"), "User-agent: *\nDisallow: /\n");
    assert!(out.join("index.xml").exists());
}

#[test]
fn test_clean_destination_replaces_site_files() {
    let dir = TempDir::new().unwrap();
    blog_site(dir.path());

    let request = BuildRequest::new(dir.path(), config("")).with_clean_destination(true);
    let out = request.destination.clone();
    write(&out, "sitemap.xml", "mine");

    Builder::new(request).build().unwrap();
    assert!(read(&out, "sitemap.xml").contains("<urlset"));
}

#[test]
fn test_menus_resolve_page_refs() {
    let dir = TempDir::new().unwrap();
    blog_site(dir.path());
    write(
        dir.path(),
        "content/about.md",
        "---\ntitle: About\nmenu:\n  main:\n    weight: 5\n---\n",
    );

    let menus = r#"
[[menus.main]]
name = "Posts"
pageRef = "/posts"
weight = 1

[[menus.main]]
name = "Hello"
page_ref = "posts/2024-hello"
parent = "Posts"
"#;
    let request = BuildRequest::new(dir.path(), config(menus));
    let site = build_content_site(&request).unwrap();
    let main = &site.menus["main"];

    assert_eq!(main.entries.len(), 3);
    assert!(main.entries.iter().all(|e| e.page.is_some()));

    let tree = main.tree();
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].entry.name, "Posts");
    assert_eq!(tree[0].children.len(), 1);
    assert_eq!(tree[0].children[0].entry.url, "/posts/2024-hello");
    assert_eq!(tree[1].entry.name, "About");

    let out = request.destination.clone();
    Builder::new(request).build().unwrap();
    assert!(read(&out, "about/index.html").contains(r#"<li class="active"><a href="/about">About</a></li>"#));
}

#[test]
fn test_theme_and_site_layouts() {
    let dir = TempDir::new().unwrap();
    blog_site(dir.path());
    write(dir.path(), "themes/plain/layouts/_default/single.html", "theme: {{ title }}");
    write(dir.path(), "themes/plain/layouts/_default/list.html", "theme list: {{ title }}");
    write(dir.path(), "layouts/_default/list.html", "site list: {{ title }}");
    write(dir.path(), "layouts/baseof.html", "{{ content }}");

    let mut config = config("");
    config.site.theme = Some("plain".to_string());
    let request = BuildRequest::new(dir.path(), config);
    let out = request.destination.clone();
    Builder::new(request).build().unwrap();

    assert_eq!(read(&out, "posts/2024-hello/index.html"), "theme: Hello");
    assert_eq!(read(&out, "posts/index.html"), "site list: Posts");
}

fn docs_site(root: &Path, extra: &str) -> Config {
    write(root, "docs/guide/setup.md", "---\ntitle: Setup\n---\nSee [the other page](../other/page.md).\n");
    write(
        root,
        "docs/guide/intro.md",
        r#"# Intro

## Table of Contents

- [Setup](setup.md)

### Elsewhere
- [Other](../other/page.md#usage)
- [Missing](../other/missing.md)
"#,
    );
    write(root, "docs/other/page.md", "---\ntitle: Other Page\n---\nText.\n");
    write(root, "docs/img/logo.svg", "<svg/>");
    config(&format!(
        r#"
[docs]
site_name = "Tool Docs"

[[docs.mounts]]
name = "guide"
source_dir = "docs"
url_prefix = "/docs/"
repo_url = "https://github.com/acme/tool"
repo_path = "docs"
{extra}
"#
    ))
}

#[test]
fn test_docs_mount_routing() {
    let dir = TempDir::new().unwrap();
    let config = docs_site(dir.path(), "");
    let docs = config.docs.clone().expect("docs config");
    let request = BuildRequest::new(dir.path(), config);

    let site = build_docs_site(&request, &docs).unwrap();
    let setup = site.find_by_permalink("/docs/guide/setup").expect("setup");
    assert_eq!(site.page(setup).output_path, Path::new("docs/guide/setup/index.html"));

    let guide = site.find_by_permalink("/docs/guide").expect("auto section");
    assert_eq!(site.page(guide).kind, PageKind::Section);
    assert_eq!(site.page(guide).title, "Guide");
    assert_eq!(site.page(setup).parent, Some(guide));

    let root = site.find_by_permalink("/docs").expect("mount root");
    assert_eq!(site.page(guide).ancestors, vec![site.home().unwrap(), root]);
    assert_eq!(site.page(site.home().unwrap()).title, "Tool Docs");

    // Leaves by title, then nested sections.
    let titles: Vec<_> = site.children(guide).map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Intro", "Setup"]);
}

#[test]
fn test_docs_build_output() {
    let dir = TempDir::new().unwrap();
    let request = BuildRequest::new(dir.path(), docs_site(dir.path(), ""));
    let out = request.destination.clone();
    Builder::new(request).build().unwrap();

    assert!(out.join("docs/guide/setup/index.html").exists());
    assert!(out.join("docs/guide/index.html").exists());
    assert!(out.join("docs/index.html").exists());
    assert_eq!(read(&out, "docs/img/logo.svg"), "<svg/>");

    let setup = read(&out, "docs/guide/setup/index.html");
    assert!(setup.contains(r#"href="/docs/other/page""#));
    assert!(setup.contains(r#"class="breadcrumbs""#));

    let index: SearchIndex = serde_json::from_str(&read(&out, "search-index.json")).unwrap();
    assert!(index.documents.iter().any(|d| d.url == "/docs/other/page"));
}

#[test]
fn test_docs_nav_from_toc() {
    let dir = TempDir::new().unwrap();
    let config = docs_site(dir.path(), "nav_path = \"guide/intro.md\"");
    let docs = config.docs.clone().expect("docs config");
    let site = build_docs_site(&BuildRequest::new(dir.path(), config), &docs).unwrap();

    assert_eq!(site.nav.len(), 2);
    assert_eq!(site.nav[0].url, "/docs/guide/setup");

    let group = &site.nav[1];
    assert!(group.is_section);
    assert_eq!(group.children[0].url, "/docs/other/page#usage");
    assert_eq!(
        group.children[1].url,
        "https://github.com/acme/tool/blob/main/docs/other/missing.md"
    );
}

#[test]
fn test_docs_auto_nav_without_toc() {
    let dir = TempDir::new().unwrap();
    let config = docs_site(dir.path(), "");
    let docs = config.docs.clone().expect("docs config");
    let site = build_docs_site(&BuildRequest::new(dir.path(), config), &docs).unwrap();

    let urls: Vec<_> = site.nav.iter().map(|item| item.url.as_str()).collect();
    assert_eq!(urls, vec!["/docs/guide", "/docs/other"]);
    assert!(site.nav.iter().all(|item| item.is_section));
}

#[test]
fn test_docs_readme_index_and_root_mount() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "handbook/README.md", "---\ntitle: Handbook\n---\nStart here.\n");
    write(dir.path(), "handbook/team/README.md", "# Team\n");
    write(dir.path(), "handbook/team/index.md", "---\ntitle: Team\n---\nPeople.\n");
    let config = config(
        r#"
[docs]
home_mount = "handbook"

[[docs.mounts]]
name = "handbook"
source_dir = "handbook"
"#,
    );
    let docs = config.docs.clone().expect("docs config");
    let site = build_docs_site(&BuildRequest::new(dir.path(), config), &docs).unwrap();

    let home = site.page(site.home().unwrap());
    assert_eq!(home.title, "Handbook");
    assert!(home.raw_body.as_deref().unwrap_or_default().contains("Start here."));

    // index.md outranks README.md; the README becomes a leaf.
    let team = site.find_by_permalink("/team").expect("team section");
    assert_eq!(site.page(team).kind, PageKind::Section);
    assert_eq!(site.page(team).title, "Team");
    assert!(site.find_by_permalink("/team/readme").is_some());
    assert_eq!(home.children, vec![team]);
}

#[test]
fn test_docs_blank_titles_fall_back_to_names() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "manual/getting-started.md", "---\ntitle: \"\"\n---\nHello.\n");
    write(dir.path(), "manual/api-reference/index.md", "---\ntitle: \"   \"\n---\n");
    write(dir.path(), "manual/api-reference/calls.md", "Calls.\n");
    let config = config(
        r#"
[[docs.mounts]]
name = "manual"
source_dir = "manual"
url_prefix = "/manual/"
"#,
    );
    let docs = config.docs.clone().expect("docs config");
    let site = build_docs_site(&BuildRequest::new(dir.path(), config), &docs).unwrap();

    let page = site.find_by_permalink("/manual/getting-started").expect("page");
    assert_eq!(site.page(page).title, "Getting Started");
    let section = site.find_by_permalink("/manual/api-reference").expect("section");
    assert_eq!(site.page(section).title, "Api Reference");
}
