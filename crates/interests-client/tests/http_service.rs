mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{FeedReply, StubServer};
use interests_client::error::{FetchError, SubmitError};
use interests_client::{
    FeedController, FeedSource as _, FeedState, HttpFeedService, IdentityStore, RedbStorage,
    ServiceConfig, VoteSink as _, VoteStore,
};
use interests_core::{FeedPage, ItemId, VisitorId, VoteColor, VoteKind};
use interests_util_error::{BoxedErrorResult, FmtCompact as _};

fn fixed(status: StatusCode, body: serde_json::Value) -> FeedReply {
    FeedReply::Fixed {
        status,
        body: body.to_string(),
    }
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn fetch_sends_paging_and_visitor() -> BoxedErrorResult<()> {
    let server = StubServer::start(FeedReply::Paged { total: 25 }).await;
    let service = HttpFeedService::new(&server.config())?;

    let items = service
        .fetch_page(
            &VisitorId::from("abc"),
            FeedPage {
                offset: 20,
                limit: 10,
            },
        )
        .await?;

    assert_eq!(
        items.iter().map(|i| i.id.to_string()).collect::<Vec<_>>(),
        vec!["20", "21", "22", "23", "24"]
    );
    assert_eq!(items[0].title, "Video 20");

    let requests = server.feed_requests();
    assert_eq!(requests.len(), 1);
    let query = requests[0].query.clone().expect("query recorded");
    assert_eq!((query.limit, query.offset), (10, 20));
    assert_eq!(requests[0].body, serde_json::json!({ "user_id": "abc" }));
    assert_eq!(requests[0].tunnel_header.as_deref(), Some("true"));
    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn enveloped_response_is_accepted() -> BoxedErrorResult<()> {
    let server = StubServer::start(fixed(
        StatusCode::OK,
        serde_json::json!({
            "results": [
                {
                    "id": "a1",
                    "title": "First",
                    "description": "Something",
                    "year_views": 1200,
                    "publication_datetime": "2024-03-01T10:00:00",
                    "category": "Спорт"
                },
                { "id": 7 }
            ]
        }),
    ))
    .await;
    let service = HttpFeedService::new(&server.config())?;

    let items = service
        .fetch_page(&VisitorId::from("abc"), FeedPage::first(10))
        .await?;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].id, ItemId::from("a1"));
    assert_eq!(items[0].year_views, Some(1200));
    assert!(items[0].publication_datetime.is_some());
    assert_eq!(items[0].category.as_deref(), Some("Спорт"));
    assert_eq!(items[1].id, ItemId::from(7u64));
    assert_eq!(items[1].title, "");
    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn fetch_errors_map_to_messages() -> BoxedErrorResult<()> {
    let server = StubServer::start(fixed(
        StatusCode::BAD_REQUEST,
        serde_json::json!({ "message": "Unknown user" }),
    ))
    .await;
    let service = HttpFeedService::new(&server.config())?;
    let visitor = VisitorId::from("abc");

    let err = service
        .fetch_page(&visitor, FeedPage::first(10))
        .await
        .expect_err("must fail");
    assert!(matches!(err, FetchError::Status { .. }));
    assert_eq!(err.to_string(), "Unknown user");

    server.set_feed_reply(FeedReply::Fixed {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: "<html>oops</html>".into(),
    });
    let err = service
        .fetch_page(&visitor, FeedPage::first(10))
        .await
        .expect_err("must fail");
    assert_eq!(err.to_string(), "Failed to fetch data");

    server.set_feed_reply(fixed(StatusCode::OK, serde_json::json!({ "results": 5 })));
    let err = service
        .fetch_page(&visitor, FeedPage::first(10))
        .await
        .expect_err("must fail");
    assert_eq!(
        err.to_string(),
        "Unexpected data format: results is not an array"
    );
    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn vote_body_matches_item_id() -> BoxedErrorResult<()> {
    let server = StubServer::start(FeedReply::Paged { total: 0 }).await;
    let service = HttpFeedService::new(&server.config())?;
    let visitor = VisitorId::from("abc");

    service
        .submit_vote(&visitor, &ItemId::from(17u64), VoteKind::Like)
        .await?;
    service
        .submit_vote(&visitor, &ItemId::from("a1"), VoteKind::Dislike)
        .await?;

    let requests = server.vote_requests();
    assert_eq!(
        requests.iter().map(|r| r.body.clone()).collect::<Vec<_>>(),
        vec![
            serde_json::json!({ "user_id": "abc", "video_id": 17, "type": "like" }),
            serde_json::json!({ "user_id": "abc", "video_id": "a1", "type": "dislike" }),
        ]
    );
    assert!(
        requests
            .iter()
            .all(|r| r.tunnel_header.as_deref() == Some("true"))
    );
    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn rejected_vote_is_an_error() -> BoxedErrorResult<()> {
    let server = StubServer::start(FeedReply::Paged { total: 0 }).await;
    server.set_vote_status(StatusCode::INTERNAL_SERVER_ERROR);
    let service = HttpFeedService::new(&server.config())?;

    let err = service
        .submit_vote(&VisitorId::from("abc"), &ItemId::from(1u64), VoteKind::Like)
        .await
        .expect_err("must fail");

    assert!(matches!(err, SubmitError::SubmitStatus { .. }));
    assert_eq!(
        err.to_string(),
        "Network response was not ok: 500 Internal Server Error"
    );
    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn tunnel_header_is_optional() -> BoxedErrorResult<()> {
    let server = StubServer::start(FeedReply::Paged { total: 3 }).await;
    let config = ServiceConfig::builder()
        .base_url(server.base_url())
        .build();
    let service = HttpFeedService::new(&config)?;

    service
        .fetch_page(&VisitorId::from("abc"), FeedPage::first(10))
        .await?;

    assert_eq!(server.feed_requests()[0].tunnel_header, None);
    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn unreachable_service_is_a_network_error() -> BoxedErrorResult<()> {
    // Nothing listens on a port whose listener was already closed
    let addr = std::net::TcpListener::bind("127.0.0.1:0")?.local_addr()?;
    let config = ServiceConfig::builder()
        .base_url(url::Url::parse(&format!("http://{addr}/"))?)
        .build();

    let service = HttpFeedService::new(&config)?;
    let err = service
        .fetch_page(&VisitorId::from("abc"), FeedPage::first(10))
        .await
        .expect_err("must fail");

    assert!(matches!(err, FetchError::FetchNetwork { .. }));

    // The underlying reqwest error shows up once in the compact chain
    assert_eq!(err.to_string(), "Network error");
    let source = std::error::Error::source(&err)
        .expect("network error has a source")
        .to_string();
    let compact = err.fmt_compact().to_string();
    assert!(compact.starts_with("Network error: "));
    assert_eq!(compact.matches(source.as_str()).count(), 1);
    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread"))]
async fn controller_end_to_end_over_http() -> BoxedErrorResult<()> {
    let server = StubServer::start(FeedReply::Paged { total: 20 }).await;
    let dir = tempfile::tempdir()?;
    let storage = Arc::new(RedbStorage::open(dir.path().join("interests.redb")).await?);
    let service = Arc::new(HttpFeedService::new(&server.config())?);

    let controller = FeedController::builder()
        .page_size(10)
        .identity(Arc::new(IdentityStore::new(storage.clone())))
        .vote_store(Arc::new(VoteStore::new(storage.clone())))
        .source(service.clone())
        .sink(service)
        .build();

    controller.start().await;
    controller.request_more().await;

    let view = controller.view();
    assert_eq!(view.state, FeedState::Idle);
    assert_eq!(view.items.len(), 20);
    assert_eq!(controller.offset(), 10);

    let visitor = controller.visitor().expect("identity resolved");
    let requests = server.feed_requests();
    assert_eq!(requests.len(), 2);
    assert!(
        requests
            .iter()
            .all(|r| r.body == serde_json::json!({ "user_id": visitor.as_str() }))
    );

    let item = view.items[3].id.clone();
    controller.cast_vote(item.clone(), VoteKind::Like).await?;
    assert_eq!(
        controller.vote_color(&item, VoteKind::Like),
        VoteColor::Affirmative
    );
    assert_eq!(server.vote_requests()[0].body["video_id"], 3);
    Ok(())
}
