//! Link candidate filter and next-control tests against a listing fixture

use balita::config::sources;
use balita::crawler::links::{LinkFilter, LinkRules};
use balita::crawler::pagination::{PaginationController, PaginationPolicy, PaginationStrategy};
use std::fs;

const LISTING_URL: &str = "https://pressone.ph/fact-check/";

fn listing() -> String {
    fs::read_to_string("tests/fixtures/html/listing_page.html").expect("Failed to load listing fixture")
}

fn pressone_filter(rules: &LinkRules) -> LinkFilter {
    LinkFilter::new(rules, "https://pressone.ph/").unwrap()
}

#[test]
fn test_fact_check_candidates() {
    let profile = sources::pressone();
    let filter = pressone_filter(&profile.links);

    let candidates = filter.filter(&listing(), LISTING_URL, Some("/fact-check/"));
    let urls: Vec<&str> = candidates.iter().map(|c| c.url.as_str()).collect();

    // Category, pagination, fragment, off-site and short-title links are dropped
    assert_eq!(
        urls,
        vec![
            "https://pressone.ph/fact-check/video-of-flooded-naia-terminal-is-from-2018/",
            "https://pressone.ph/fact-check/no-new-holiday-declared-for-march/",
        ]
    );
    assert_eq!(
        candidates[0].title,
        "FACT CHECK: Video of flooded NAIA terminal is from 2018"
    );
}

#[test]
fn test_general_candidates_with_junk_titles() {
    let rules = LinkRules {
        junk_titles: vec!["PRIVACY POLICY".to_string()],
        ..sources::pressone().links
    };
    let filter = pressone_filter(&rules);

    let candidates = filter.filter(&listing(), LISTING_URL, None);
    let urls: Vec<&str> = candidates.iter().map(|c| c.url.as_str()).collect();

    assert!(urls.contains(&"https://pressone.ph/news/senate-approves-budget-on-third-reading/"));
    assert!(!urls.iter().any(|u| u.contains("privacy-policy")));
    assert!(!urls.iter().any(|u| u.contains("facebook.com")));
    assert_eq!(urls.len(), 3);
}

#[test]
fn test_disabled_title_gate_keeps_short_headlines() {
    let rules = LinkRules {
        min_title_chars: None,
        ..sources::pressone().links
    };
    let filter = pressone_filter(&rules);

    let candidates = filter.filter(&listing(), LISTING_URL, Some("/fact-check/"));
    assert!(candidates
        .iter()
        .any(|c| c.url == "https://pressone.ph/fact-check/quote-card/" && c.title == "Quote card"));
}

#[test]
fn test_next_control_on_listing() {
    let policy = PaginationPolicy {
        strategy: PaginationStrategy::next_control(),
        ..PaginationPolicy::default()
    };
    let controller = PaginationController::new(&policy).unwrap();

    let control = controller
        .locate_next_control(&listing(), LISTING_URL)
        .expect("listing has a next link");
    assert_eq!(control.href.as_deref(), Some("https://pressone.ph/fact-check/page/2/"));
}

#[test]
fn test_path_pagination_urls() {
    let controller = PaginationController::new(&sources::pressone().pagination).unwrap();

    assert_eq!(controller.page_url(LISTING_URL, 1).as_deref(), Some(LISTING_URL));
    assert_eq!(
        controller.page_url(LISTING_URL, 3).as_deref(),
        Some("https://pressone.ph/fact-check/page/3/")
    );

    let query = PaginationController::new(&sources::verafiles().pagination).unwrap();
    assert_eq!(
        query
            .page_url("https://verafiles.org/articles/category/fact-check", 2)
            .as_deref(),
        Some("https://verafiles.org/articles/category/fact-check?page=2")
    );
}
