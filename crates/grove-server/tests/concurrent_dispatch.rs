//! A frozen router shared across tasks.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use grove_core::Raw;
use grove_server::{from_fn, Context, RawContext, Router};
use http::{Request, StatusCode};
use http_body_util::BodyExt;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_share_one_router() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    let mut router = Router::new();
    router.use_middleware(
        from_fn(move |ctx: &mut RawContext| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { ctx.next() })
        })
        .named("count"),
    );
    router.get("/echo/{n}", |ctx: Context<'_, Raw>| {
        Box::pin(async move {
            tokio::task::yield_now().await;
            Ok(ctx.path_param("n").unwrap_or_default().to_string())
        })
    });
    let router = Arc::new(router);

    let mut tasks = Vec::new();
    for n in 0..32 {
        let router = Arc::clone(&router);
        tasks.push(tokio::spawn(async move {
            let request = Request::get(format!("/echo/{n}"))
                .body(Bytes::new())
                .unwrap();
            let response = router.handle(request).await;
            assert_eq!(response.status(), StatusCode::OK);
            let body = response.into_body().collect().await.unwrap().to_bytes();
            assert_eq!(body, Bytes::from(format!("\"{n}\"")));
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(hits.load(Ordering::SeqCst), 32);
    assert!(router.is_frozen());
}
