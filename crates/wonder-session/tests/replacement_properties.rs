//! Behavioural properties of the page replacement cache, exercised through
//! the session API with a manual clock.

use std::sync::Arc;

use wonder_core::{ContextId, ManualClock, SessionCacheConfig, TransactionContext};
use wonder_session::{signals, AjaxSession, RenderedPage, SaveDirective, SaveOutcome, Tier};

fn setup(config: SessionCacheConfig) -> (AjaxSession<RenderedPage>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::at_epoch());
    let session = AjaxSession::with_clock(config, clock.clone());
    (session, clock)
}

fn page(name: &str) -> RenderedPage {
    RenderedPage::new(name, name).with_content(format!("<div>{name}</div>"))
}

fn id(s: &str) -> ContextId {
    ContextId::new(s)
}

fn fragment(slot: &str) -> SaveDirective {
    SaveDirective::fragment(slot).with_original_context_id("t0")
}

fn restored(session: &mut AjaxSession<RenderedPage>, ctx: &str) -> Option<RenderedPage> {
    session.restore_page(&id(ctx)).map(|r| r.page)
}

#[test]
fn test_three_generation_scenario() {
    let (mut session, _) = setup(SessionCacheConfig::default());

    session.save_page_with(page("A"), id("t1"), &fragment("s"));
    session.save_page_with(page("B"), id("t2"), &fragment("s"));
    assert_eq!(restored(&mut session, "t1"), Some(page("A")));
    assert_eq!(restored(&mut session, "t2"), Some(page("B")));

    session.save_page_with(page("C"), id("t3"), &fragment("s"));
    assert_eq!(restored(&mut session, "t1"), None);
    assert_eq!(restored(&mut session, "t2"), Some(page("B")));
    assert_eq!(restored(&mut session, "t3"), Some(page("C")));
}

#[test]
fn test_at_most_two_records_per_slot() {
    let (mut session, _) = setup(SessionCacheConfig::default());

    for n in 0..25 {
        session.save_page_with(page("P"), id(&format!("t{n}")), &fragment("s"));
        let cache = session.replacement_cache().unwrap();
        assert!(cache.records_for_slot("t0_s").count() <= 2);
    }
}

#[test]
fn test_global_bound_never_exceeded() {
    let config = SessionCacheConfig {
        max_page_replacement_cache_size: 3,
        ..SessionCacheConfig::default()
    };
    let (mut session, _) = setup(config);

    for n in 0..40 {
        let slot = format!("s{}", n % 7);
        session.save_page_with(page("P"), id(&format!("t{n}")), &fragment(&slot));
        assert!(session.replacement_cache().unwrap().len() <= 6);
    }
}

#[test]
fn test_latest_save_always_restorable() {
    let config = SessionCacheConfig {
        max_page_replacement_cache_size: 2,
        ..SessionCacheConfig::default()
    };
    let (mut session, clock) = setup(config);

    for n in 0..30 {
        let ctx = format!("t{n}");
        let slot = format!("s{}", n % 5);
        let p = page(&format!("P{n}"));
        session.save_page_with(p.clone(), id(&ctx), &fragment(&slot));
        clock.advance_secs(120);

        let restore = session.restore_page(&id(&ctx)).unwrap();
        assert_eq!(restore.page, p);
        assert_eq!(restore.tier, Tier::Replacement);
    }
}

#[test]
fn test_old_generation_not_restored_after_grace() {
    let (mut session, clock) = setup(SessionCacheConfig::default());

    session.save_page_with(page("A"), id("t1"), &fragment("s"));
    clock.advance_secs(60);
    session.save_page_with(page("B"), id("t2"), &fragment("s"));

    clock.advance_secs(5 * 60);
    assert_eq!(restored(&mut session, "t1"), Some(page("A")));

    clock.advance_secs(1);
    assert_eq!(restored(&mut session, "t1"), None);
    // The current generation does not expire.
    clock.advance_secs(24 * 60 * 60);
    assert_eq!(restored(&mut session, "t2"), Some(page("B")));
}

#[test]
fn test_single_slot_capacity_evicts_oldest() {
    let config = SessionCacheConfig {
        max_page_replacement_cache_size: 1,
        ..SessionCacheConfig::default()
    };
    let (mut session, _) = setup(config);

    session.save_page_with(page("A"), id("t1"), &fragment("s1"));
    session.save_page_with(page("B"), id("t2"), &fragment("s2"));
    assert_eq!(session.replacement_cache().unwrap().len(), 2);

    session.save_page_with(page("C"), id("t3"), &fragment("s3"));
    let cache = session.replacement_cache().unwrap();
    assert_eq!(cache.len(), 2);
    assert!(!cache.contains(&id("t1")));
    assert!(cache.contains(&id("t2")));
    assert!(cache.contains(&id("t3")));
}

#[test]
fn test_slots_scoped_by_original_context() {
    let (mut session, _) = setup(SessionCacheConfig::default());

    let first_page = SaveDirective::fragment("s").with_original_context_id("p1");
    let second_page = SaveDirective::fragment("s").with_original_context_id("p2");
    session.save_page_with(page("A"), id("t1"), &first_page);
    session.save_page_with(page("B"), id("t2"), &second_page);
    session.save_page_with(page("C"), id("t3"), &second_page);

    // Same slot name under a different original page is a different slot.
    assert_eq!(restored(&mut session, "t1"), Some(page("A")));
    let cache = session.replacement_cache().unwrap();
    assert!(!cache.get(&id("t1")).unwrap().is_old_generation());
}

#[test]
fn test_falls_through_to_backtrack() {
    let (mut session, _) = setup(SessionCacheConfig::default());

    session.save_page_with(page("Main"), id("1"), &SaveDirective::backtrack());
    session.save_page_with(page("A"), id("2"), &fragment("s"));

    let main = session.restore_page(&id("1")).unwrap();
    assert_eq!(main.tier, Tier::Backtrack);
    assert_eq!(main.page, page("Main"));
    assert!(session.restore_page(&id("404")).is_none());
}

#[test]
fn test_fragment_updates_do_not_flood_backtrack() {
    let config = SessionCacheConfig {
        page_cache_size: 3,
        ..SessionCacheConfig::default()
    };
    let (mut session, _) = setup(config);

    session.save_page_with(page("Main"), id("1"), &SaveDirective::backtrack());
    for n in 2..50 {
        session.save_page_with(page("Main"), id(&n.to_string()), &fragment("ticker"));
    }

    assert_eq!(restored(&mut session, "1"), Some(page("Main")));
}

#[test]
fn test_header_round_trip_across_requests() {
    let (mut session, _) = setup(SessionCacheConfig::default());

    // First full-page request.
    let mut ctx = TransactionContext::new("1");
    assert_eq!(session.save_page(page("Main"), &mut ctx), SaveOutcome::Backtrack);

    // The browser fires an Ajax update against context 1.
    let restore = session.restore_page(&id("1")).unwrap();
    let mut update = TransactionContext::new("2")
        .with_request_context_id("1")
        .with_response_header(signals::DONT_STORE_PAGE, "1")
        .with_response_header(signals::PAGE_CACHE_KEY, "cart");
    restore.propagate(&mut update.request);

    let outcome = session.save_page(restore.page, &mut update);
    assert_eq!(
        outcome,
        SaveOutcome::Replacement {
            composite_key: "1_cart".to_string()
        }
    );
    assert!(!update.response.contains(signals::PAGE_CACHE_KEY));

    // A link inside the updated fragment resolves on the next click.
    let next = session.restore_page(&id("2")).unwrap();
    assert_eq!(next.tier, Tier::Replacement);
    assert_eq!(next.page, page("Main"));
}
