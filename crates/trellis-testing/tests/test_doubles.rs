//! Mocked ambient stores used alongside route resolution.

use chrono::Duration;

use trellis_testing::mocks::{
    DistributedCache, MemoryCacheMock, MockDistributedCache, MockHttpContext, MockSession,
    SessionValue, TempData,
};
use trellis_testing::prelude::*;

#[test]
fn session_state_survives_across_assertions() {
    let session = MockSession::new();
    session.set_string("user", "alice");
    session
        .set_json("preferences", &json!({"theme": "dark"}))
        .unwrap();

    SessionAssert::for_session(&session)
        .has_key("user")
        .unwrap()
        .has_string("user", "alice")
        .unwrap()
        .has_key("preferences")
        .unwrap()
        .missing_key("csrf")
        .unwrap();

    session.remove("user");
    SessionAssert::for_session(&session)
        .missing_key("user")
        .unwrap();
}

#[test]
fn temp_data_disappears_after_first_read() {
    let temp = TempData::new();
    temp.set("notice", SessionValue::Str("Profile saved".to_string()));

    assert_eq!(
        temp.take("notice").unwrap().as_str(),
        Some("Profile saved")
    );
    assert!(temp.take("notice").is_none());
}

#[test]
fn cache_honours_ttl() {
    let cache = MemoryCacheMock::new();
    cache.put("expired", json!(1), Some(Duration::seconds(-1)));
    cache.put("live", json!(2), Some(Duration::minutes(10)));
    cache.put_forever("pinned", json!(3));

    CacheAssert::for_cache(&cache)
        .missing("expired")
        .unwrap()
        .contains("live")
        .unwrap()
        .has_value("pinned", &json!(3))
        .unwrap();

    cache.flush();
    CacheAssert::for_cache(&cache).missing("live").unwrap();
}

#[tokio::test]
async fn distributed_cache_mock_implements_the_seam() {
    async fn warm(cache: &dyn DistributedCache) {
        cache
            .put("token", b"abc123".to_vec(), Some(Duration::minutes(1)))
            .await
            .unwrap();
    }

    let cache = MockDistributedCache::new();
    warm(&cache).await;

    assert_eq!(cache.get("token").await.unwrap(), Some(b"abc123".to_vec()));
    assert!(cache.forget("token").await.unwrap());
    assert_eq!(cache.get("token").await.unwrap(), None);
}

#[test]
fn http_context_bundles_request_and_stores() {
    let request = SimulatedRequest::get("/Home/Index")
        .add_header("Accept", "text/html")
        .build_request()
        .unwrap();
    let ctx = MockHttpContext::new(request);

    ctx.session.set_string("user", "bob");
    ctx.view_data.set("title", json!("Home"));
    ctx.cache.put_forever("visits", json!(7));

    assert_eq!(ctx.request.path, "/Home/Index");
    SessionAssert::for_session(&ctx.session).has_key("user").unwrap();
    CacheAssert::for_cache(&ctx.cache)
        .has_value("visits", &json!(7))
        .unwrap();
    assert_eq!(ctx.view_data.get("title"), Some(json!("Home")));
}
