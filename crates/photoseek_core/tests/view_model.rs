use std::collections::BTreeSet;

use photoseek_core::{
    result_cards, saved_url_key, Author, JobPhase, SearchJob, SearchResult,
};

fn result(id: &str, image_url: &str) -> SearchResult {
    SearchResult {
        id: id.to_string(),
        image_url: image_url.to_string(),
        description: None,
        keywords: Vec::new(),
        author: Author {
            name: "Alex".to_string(),
            url: "https://example.com/alex".to_string(),
        },
        source_url: format!("https://example.com/posts/{id}"),
        provider: "pixabay".to_string(),
    }
}

fn completed_job(results: Vec<SearchResult>) -> SearchJob {
    SearchJob {
        id: 1,
        query: "cats".to_string(),
        phase: JobPhase::Completed,
        stream_key: Some("abc".to_string()),
        progress: None,
        results: Some(results),
        failure: None,
    }
}

#[test]
fn cards_carry_saved_and_saving_marks() {
    let job = completed_job(vec![
        result("1", "https://x/1.jpg"),
        result("2", "https://x/2.jpg"),
        result("3", "https://x/3.jpg"),
    ]);
    let saved: BTreeSet<_> = [saved_url_key("https://x/1.jpg")].into_iter().collect();
    let pending: BTreeSet<_> = [saved_url_key("https://x/2.jpg")].into_iter().collect();
    let flagged = BTreeSet::new();

    let cards = result_cards(Some(&job), &saved, &pending, &flagged);
    assert_eq!(cards.len(), 3);
    assert!(cards[0].is_saved && !cards[0].is_saving);
    assert!(!cards[1].is_saved && cards[1].is_saving);
    assert!(!cards[2].is_saved && !cards[2].is_saving);
}

#[test]
fn cards_keep_backend_order() {
    let job = completed_job(vec![
        result("b", "https://x/b.jpg"),
        result("a", "https://x/a.jpg"),
    ]);
    let empty = BTreeSet::new();

    let cards = result_cards(Some(&job), &empty, &empty, &empty);
    let ids: Vec<_> = cards.iter().map(|card| card.result.id.clone()).collect();
    // The backend ranks; the adapter must not re-sort.
    assert_eq!(ids, vec!["b", "a"]);
}

#[test]
fn no_results_yields_no_cards() {
    let empty = BTreeSet::new();
    assert!(result_cards(None, &empty, &empty, &empty).is_empty());

    let job = SearchJob {
        id: 1,
        query: "cats".to_string(),
        phase: JobPhase::Streaming,
        stream_key: Some("abc".to_string()),
        progress: None,
        results: None,
        failure: None,
    };
    assert!(result_cards(Some(&job), &empty, &empty, &empty).is_empty());
}

#[test]
fn flagged_sources_are_marked() {
    let job = completed_job(vec![result("1", "https://x/1.jpg")]);
    let empty = BTreeSet::new();
    let flagged: BTreeSet<_> = ["https://example.com/posts/1".to_string()]
        .into_iter()
        .collect();

    let cards = result_cards(Some(&job), &empty, &empty, &flagged);
    assert!(cards[0].is_flagged);
}
