//! Results that arrive after the feed moved on must not reach the presenter.

mod common;

use cinefeed::engine::{completion_channel, CompletionOutcome, FeedController, FeedStatus};
use cinefeed::feed::types::{Category, FeedCriteria, Page};
use common::{page_of, settle, Call, RecordingPresenter, ScriptedSource};

#[tokio::test]
async fn test_criteria_switch_discards_in_flight_page() {
    let source = ScriptedSource::new(|criteria, _, _| match criteria.category {
        Category::Popular => Ok(page_of(1..=3)),
        Category::Upcoming => Ok(page_of(50..=52)),
        _ => Ok(Page::default()),
    });
    let (tx, mut rx) = completion_channel();
    let mut feed = FeedController::new(source.clone(), RecordingPresenter::default(), tx);

    feed.activate(FeedCriteria::browse(Category::Popular));
    // Switch before the popular page comes back
    feed.activate(FeedCriteria::browse(Category::Upcoming));

    let first = settle(&mut feed, &mut rx).await;
    let second = settle(&mut feed, &mut rx).await;
    let outcomes = [first, second];

    assert_eq!(
        outcomes.iter().filter(|o| **o == CompletionOutcome::Stale).count(),
        1
    );
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| matches!(o, CompletionOutcome::Appended { page: 1, .. }))
            .count(),
        1
    );

    // Both fetches were made; only the upcoming items were rendered.
    assert_eq!(source.calls().len(), 2);
    assert_eq!(feed.presenter().appended_ids(), vec![50, 51, 52]);
    assert_eq!(
        feed.presenter().render_calls(),
        vec![Call::Clear, Call::Clear, Call::Append(vec![50, 51, 52])]
    );
    assert_eq!(feed.status(), Some(FeedStatus::Idle));
}

#[tokio::test]
async fn test_switch_back_to_earlier_criteria_still_discards_old_response() {
    let source = ScriptedSource::new(|criteria, _, _| match criteria.query.as_str() {
        "" => Ok(page_of(1..=2)),
        _ => Ok(page_of(7..=8)),
    });
    let (tx, mut rx) = completion_channel();
    let mut feed = FeedController::new(source.clone(), RecordingPresenter::default(), tx);
    let browse = FeedCriteria::browse(Category::Trending);

    // A -> B -> A: the first A request belongs to an older generation.
    feed.activate(browse.clone());
    feed.activate(FeedCriteria::new(Category::Trending, "arrival"));
    feed.activate(browse.clone());

    let mut appended = 0;
    let mut stale = 0;
    for _ in 0..3 {
        match settle(&mut feed, &mut rx).await {
            CompletionOutcome::Stale => stale += 1,
            CompletionOutcome::Appended { .. } => appended += 1,
            other => panic!("unexpected outcome: {:?}", other),
        }
    }
    assert_eq!((appended, stale), (1, 2));
    assert_eq!(feed.presenter().appended_ids(), vec![1, 2]);
    assert_eq!(source.pages_requested(&browse), vec![1, 1]);
}

#[tokio::test]
async fn test_deactivate_discards_in_flight_page() {
    let source = ScriptedSource::new(|_, _, _| Ok(page_of(1..=3)));
    let (tx, mut rx) = completion_channel();
    let mut feed = FeedController::new(source, RecordingPresenter::default(), tx);

    feed.activate(FeedCriteria::browse(Category::NowPlaying));
    feed.deactivate();
    assert!(feed.state().is_none());

    let out = settle(&mut feed, &mut rx).await;
    assert_eq!(out, CompletionOutcome::Stale);
    assert!(feed.presenter().appended_ids().is_empty());
    assert!(!feed.on_scroll_proximity());

    // Coming back starts from page 1 again
    assert!(feed.activate(FeedCriteria::browse(Category::NowPlaying)));
    assert_eq!(feed.state().unwrap().in_flight().map(|t| t.request.page), Some(1));
}
