//! End-to-end behaviour of routers built through the facade.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use grove::docs::ParameterIn;
use grove::prelude::*;
use grove_test::TestClient;
use http::{Method, StatusCode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize, Shape)]
struct GetItem {
    #[shape(path = "id")]
    #[serde(skip)]
    id: String,
}

#[derive(Debug, Serialize, Shape)]
#[allow(non_snake_case)]
struct Item {
    Name: String,
}

#[derive(Debug, Default, Deserialize, Shape)]
struct CreateItem {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Shape)]
#[serde(rename_all = "camelCase")]
struct UpdateItem {
    #[shape(path = "id")]
    #[serde(skip)]
    id: String,
    #[shape(query = "dryRun")]
    #[serde(skip)]
    dry_run: bool,
    #[shape(header = "If-Match")]
    #[serde(skip)]
    etag: String,
    display_name: String,
}

#[derive(Debug, Default, Deserialize, Shape)]
struct Rename {
    #[shape(path = "id")]
    #[serde(default)]
    id: String,
    name: String,
}

#[derive(Debug, Serialize, Shape)]
struct Category {
    label: String,
    children: Vec<Category>,
}

#[derive(Debug, Serialize, Shape)]
#[shape(content_type = "application/yaml")]
struct Manifest {
    version: u32,
}

fn get_item(router: &mut Router) {
    router.get("/items/{id}", |ctx: Context<'_, GetItem>| {
        Box::pin(async move {
            Ok(Item {
                Name: format!("item {}", ctx.path_param("id").unwrap_or_default()),
            })
        })
    });
}

#[test]
fn test_path_input_schema() {
    let mut router = Router::new();
    get_item(&mut router);

    let doc = router.schema();
    let op = doc.operation(&Method::GET, "/items/{id}").unwrap();

    assert!(op.request_body.is_none());
    assert_eq!(op.parameters.len(), 1);
    assert_eq!(op.parameters[0].name, "id");
    assert_eq!(op.parameters[0].location, ParameterIn::Path);

    let keys: Vec<_> = op.responses.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["200", "default"]);
    let schema = op.responses["200"].content["application/json"]
        .schema
        .as_ref()
        .unwrap();
    assert_eq!(schema.component_name(), Some("Item"));
    assert!(doc.components.schemas["Item"].properties.contains_key("Name"));
    assert!(!doc.components.schemas.contains_key("GetItem"));
}

#[tokio::test]
async fn test_conflict_error_status_and_title() {
    let mut router = Router::new();
    router.post("/items", |_ctx: Context<'_, CreateItem>| {
        Box::pin(async move {
            Err::<Item, _>(HttpError::conflict("an item with that name exists").into())
        })
    });
    let client = TestClient::new(Arc::new(router));

    let response = client
        .post("/items")
        .json(&serde_json::json!({"name": "lamp"}))
        .send()
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(response.content_type(), Some("application/json"));
    let body = response.json_value().unwrap();
    assert_eq!(body["title"], "Conflict");
    assert_eq!(body["status"], 409);
    assert_eq!(body["detail"], "an item with that name exists");
}

#[test]
fn test_shared_output_component_is_emitted_once() {
    let mut router = Router::new();
    get_item(&mut router);
    router.put("/items/{id}", |_ctx: Context<'_, UpdateItem>| {
        Box::pin(async move { Ok(Item { Name: String::new() }) })
    });

    let doc = router.schema();
    let item_refs = doc
        .paths
        .values()
        .flat_map(|path| [path.get.as_ref(), path.put.as_ref()])
        .flatten()
        .filter_map(|op| {
            op.responses
                .values()
                .filter_map(|r| r.content.get("application/json"))
                .filter_map(|media| media.schema.as_ref())
                .find(|schema| schema.component_name() == Some("Item"))
        })
        .count();

    assert_eq!(item_refs, 2);
    let names: Vec<_> = doc.components.schemas.keys().map(String::as_str).collect();
    assert_eq!(names.iter().filter(|n| **n == "Item").count(), 1);
}

#[test]
fn test_parameters_never_become_body_properties() {
    let mut router = Router::new();
    router.put("/items/{id}", |_ctx: Context<'_, UpdateItem>| {
        Box::pin(async move { Ok(()) })
    });

    let doc = router.schema();
    let op = doc.operation(&Method::PUT, "/items/{id}").unwrap();

    let mut params: Vec<_> = op
        .parameters
        .iter()
        .map(|p| (p.name.as_str(), p.location))
        .collect();
    params.sort_by_key(|(name, _)| *name);
    assert_eq!(
        params,
        vec![
            ("If-Match", ParameterIn::Header),
            ("dryRun", ParameterIn::Query),
            ("id", ParameterIn::Path),
        ]
    );

    let body = &doc.components.schemas["UpdateItem"];
    let props: Vec<_> = body.properties.keys().map(String::as_str).collect();
    assert_eq!(props, vec!["displayName"]);
    assert!(op.request_body.is_some());
    assert!(op.responses["202"].content.is_empty());
}

#[tokio::test]
async fn test_body_without_parameter_fields_decodes() {
    let mut router = Router::new();
    router.post("/items/{id}", |mut ctx: Context<'_, Rename>| {
        Box::pin(async move {
            let id = ctx.path_param("id").unwrap_or_default().to_string();
            let input = ctx.get_body()?;
            Ok(format!("{id}:{}", input.name))
        })
    });

    let doc = router.schema();
    let op = doc.operation(&Method::POST, "/items/{id}").unwrap();
    assert_eq!(op.parameters.len(), 1);
    assert_eq!(op.parameters[0].location, ParameterIn::Path);
    let props: Vec<_> = doc.components.schemas["Rename"]
        .properties
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(props, vec!["name"]);

    let client = TestClient::new(Arc::new(router));
    let response = client
        .post("/items/7")
        .json(&serde_json::json!({"name": "x"}))
        .send()
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<String>().unwrap(), "7:x");
}

#[tokio::test]
async fn test_empty_body_decodes_to_default() {
    let mut router = Router::new();
    router.post("/items", |mut ctx: Context<'_, CreateItem>| {
        Box::pin(async move {
            let input = ctx.get_body()?;
            Ok(serde_json::json!({
                "name": input.name,
                "tags": input.tags.len(),
            }))
        })
    });
    let client = TestClient::new(Arc::new(router));

    let response = client.post("/items").send().await;
    response.assert_status(StatusCode::CREATED);
    let body = response.json_value().unwrap();
    assert!(body["name"].is_null());
    assert_eq!(body["tags"], 0);
}

#[tokio::test]
async fn test_get_body_is_memoised() {
    let mut router = Router::new();
    router.post("/items", |mut ctx: Context<'_, CreateItem>| {
        Box::pin(async move {
            let first = ctx.get_body()? as *const CreateItem;
            let second = ctx.get_body()? as *const CreateItem;
            Ok(std::ptr::eq(first, second))
        })
    });
    let client = TestClient::new(Arc::new(router));

    let response = client
        .post("/items")
        .json(&serde_json::json!({"name": "lamp", "tags": ["a"]}))
        .send()
        .await;
    assert!(response.json::<bool>().unwrap());
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let mut router = Router::new();
    router.post("/items", |mut ctx: Context<'_, CreateItem>| {
        Box::pin(async move {
            let name = ctx.body().name.clone();
            Ok(name.unwrap_or_default())
        })
    });
    let client = TestClient::new(Arc::new(router));

    let response = client
        .post("/items")
        .content_type("application/json")
        .body(r#"{"tags": "not a list"}"#)
        .send()
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body = response.json_value().unwrap();
    assert_eq!(body["title"], "Bad Request");
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.starts_with("could not read incoming request"), "{detail}");
    assert!(detail.contains("expected a sequence"), "{detail}");
}

#[tokio::test]
async fn test_middleware_order_and_short_circuit() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let handled = Arc::new(AtomicUsize::new(0));

    let mut router = Router::new();
    for name in ["first", "second"] {
        let calls = Arc::clone(&calls);
        router.use_middleware(
            from_fn(move |ctx: &mut RawContext| {
                calls.lock().unwrap().push(name);
                Box::pin(async move { ctx.next() })
            })
            .named(name),
        );
    }

    let gate_calls = Arc::clone(&calls);
    let counter = Arc::clone(&handled);
    router
        .get("/guarded", move |_ctx: Context<'_, Raw>| {
            counter.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(()) })
        })
        .use_middleware(
            from_fn(move |ctx: &mut RawContext| {
                gate_calls.lock().unwrap().push("gate");
                Box::pin(async move {
                    if ctx.header("x-open").is_some() {
                        return ctx.next();
                    }
                    Err(HttpError::forbidden("closed").into())
                })
            })
            .named("gate"),
        );
    let client = TestClient::new(Arc::new(router));

    let response = client.get("/guarded").send().await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(*calls.lock().unwrap(), vec!["first", "second", "gate"]);
    assert_eq!(handled.load(Ordering::SeqCst), 0);

    let response = client.get("/guarded").header("x-open", "1").send().await;
    response.assert_status(StatusCode::OK);
    assert_eq!(handled.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_middleware_without_next_or_response_is_500() {
    let mut router = Router::new();
    router
        .get("/silent", |_ctx: Context<'_, Raw>| Box::pin(async move { Ok(()) }))
        .use_middleware(
            from_fn(|_ctx: &mut RawContext| Box::pin(async move { Ok(()) })).named("silent"),
        );
    let client = TestClient::new(Arc::new(router));

    let response = client.get("/silent").send().await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.json_value().unwrap()["detail"],
        "An unexpected error occurred"
    );
}

#[tokio::test]
async fn test_panics_produce_one_structured_response() {
    let mut router = Router::new();
    router.get("/handler-panic", |ctx: Context<'_, Raw>| {
        Box::pin(async move {
            if ctx.header("x-calm").is_none() {
                panic!("handler exploded");
            }
            Ok(())
        })
    });
    router
        .get("/middleware-panic", |_ctx: Context<'_, Raw>| {
            Box::pin(async move { Ok(()) })
        })
        .use_middleware(from_fn(|ctx: &mut RawContext| {
            Box::pin(async move {
                if ctx.header("x-calm").is_none() {
                    panic!("middleware exploded");
                }
                ctx.next()
            })
        }));
    router.get("/structured-panic", |_ctx: Context<'_, Raw>| {
        Box::pin(async move {
            if true {
                std::panic::panic_any(HttpError::too_many_requests("slow down"));
            }
            Ok(())
        })
    });
    let client = TestClient::new(Arc::new(router));

    for path in ["/handler-panic", "/middleware-panic"] {
        let response = client.get(path).send().await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.json_value().unwrap();
        assert_eq!(body["status"], 500);
        assert_eq!(body["detail"], "An unexpected error occurred");
        assert!(!response.text().unwrap().contains("exploded"));
    }

    let response = client.get("/structured-panic").send().await;
    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.json_value().unwrap()["detail"], "slow down");
}

#[tokio::test]
async fn test_trailing_slash_mode() {
    let mut router = Router::with_options(RouterOptions::new().prefix("/api").trailing_slash(true));
    router.get("/items", |_ctx: Context<'_, Raw>| {
        Box::pin(async move { Ok(vec![1, 2, 3]) })
    });
    router.get("/", |_ctx: Context<'_, Raw>| {
        Box::pin(async move { Ok("root".to_string()) })
    });

    let patterns: Vec<_> = router.routes().iter().map(|r| r.pattern().to_string()).collect();
    assert_eq!(patterns, vec!["/api/items/", "/api/"]);
    assert!(patterns.iter().all(|p| p.starts_with('/') && p.ends_with('/')));

    let client = TestClient::new(Arc::new(router));
    let response = client.get("/api/items/").send().await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json::<Vec<u32>>().unwrap(), vec![1, 2, 3]);
}

#[test]
fn test_recursive_shape_is_emitted_once() {
    let mut router = Router::new();
    router.get("/categories", |_ctx: Context<'_, Raw>| {
        Box::pin(async move {
            Ok(Category {
                label: "root".to_string(),
                children: Vec::new(),
            })
        })
    });
    router.get("/categories/{id}", |_ctx: Context<'_, GetItem>| {
        Box::pin(async move {
            Ok(Category {
                label: "leaf".to_string(),
                children: Vec::new(),
            })
        })
    });

    let doc = router.schema();
    let category = &doc.components.schemas["Category"];
    let children = category.properties["children"].items.as_ref().unwrap();
    assert_eq!(children.component_name(), Some("Category"));
    assert_eq!(doc.paths.len(), 2);
}

#[tokio::test]
async fn test_shape_content_type_selects_codec() {
    let mut router = Router::new();
    router.get("/manifest", |_ctx: Context<'_, Raw>| {
        Box::pin(async move { Ok(Manifest { version: 3 }) })
    });

    let doc = router.schema();
    let op = doc.operation(&Method::GET, "/manifest").unwrap();
    assert!(op.responses["200"].content.contains_key("application/yaml"));

    let client = TestClient::new(Arc::new(router));
    let response = client.get("/manifest").send().await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.content_type(), Some("application/yaml"));
    assert_eq!(response.text().unwrap().trim(), "version: 3");
}

#[tokio::test]
async fn test_unknown_path_and_verb() {
    let mut router = Router::new();
    get_item(&mut router);
    let client = TestClient::new(Arc::new(router));

    let response = client.get("/nothing/here").send().await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json_value().unwrap()["title"], "Not Found");

    let response = client.delete("/items/7").send().await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    assert!(response.header("allow").unwrap().contains("GET"));
}
