//! Router tests for the HTTP API

mod common;

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use common::{body_json, get_request, json_request, multipart_request, test_app, test_config};
use legal_rag::{providers::VectorStoreProvider, Chunk};

#[tokio::test]
async fn root_reports_zero_chunks_without_store() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(test_config(dir.path()), false);

    let response = app.router.oneshot(get_request("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Legal RAG backend running");
    assert_eq!(body["indexed_chunks"], 0);
}

#[tokio::test]
async fn root_counts_indexed_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(test_config(dir.path()), true);
    let store = app.store.clone().unwrap();
    store
        .add(
            &[
                Chunk::new("crpc.txt", "crpc.txt", 0, "bail".into()),
                Chunk::new("crpc.txt", "crpc.txt", 1, "more bail".into()),
            ],
            &[vec![1.0, 0.0, 0.05], vec![1.0, 0.0, 0.05]],
        )
        .await
        .unwrap();

    let body = body_json(app.router.oneshot(get_request("/")).await.unwrap()).await;
    assert_eq!(body["indexed_chunks"], 2);
}

#[tokio::test]
async fn health_is_ok() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(test_config(dir.path()), false);

    let response = app.router.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn ask_rejects_blank_query() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(test_config(dir.path()), false);

    let response = app
        .router
        .oneshot(json_request("/ask", json!({ "query": "   " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["detail"], "Missing query");
    assert_eq!(body["error"]["type"], "bad_request");
}

#[tokio::test]
async fn ask_without_store_uses_fallback_and_links_report() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(test_config(dir.path()), false);

    let response = app
        .router
        .clone()
        .oneshot(json_request("/ask", json!({ "query": " What is anticipatory bail? " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert!(body["answer"].as_str().unwrap().starts_with("1. Overview"));

    let reference = &body["references"][0];
    assert_eq!(reference["type"], "pdf");
    let file = reference["file"].as_str().unwrap();
    assert!(file.starts_with("case_report_") && file.ends_with(".pdf"));
    assert_eq!(
        reference["url"],
        format!("http://legal.test:8000/files/{}", file)
    );

    let prompt = app.llm.prompts.lock()[0].clone();
    assert!(prompt.contains(
        "What is anticipatory bail?\n\nExtra context: Fetched prominent cases for query: What is anticipatory bail?"
    ));
    assert!(prompt.contains("No internal references retrieved."));

    let download = app
        .router
        .oneshot(get_request(&format!("/files/{}", file)))
        .await
        .unwrap();
    assert_eq!(download.status(), StatusCode::OK);
    assert_eq!(download.headers()["content-type"], "application/pdf");
}

#[tokio::test]
async fn ask_uses_relevant_context() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(test_config(dir.path()), true);
    app.store
        .clone()
        .unwrap()
        .add(
            &[Chunk::new("crpc.txt", "acts/crpc.txt", 0, "Section 438 anticipatory bail".into())],
            &[vec![1.0, 0.0, 0.05]],
        )
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(json_request("/ask", json!({ "query": "Can I get bail?" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let prompt = app.llm.prompts.lock()[0].clone();
    assert!(prompt.contains("- Section 438 anticipatory bail [source: acts/crpc.txt]"));
    assert!(!prompt.contains("Extra context:"));
}

#[tokio::test]
async fn report_url_uses_public_base_url() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(dir.path());
    config.server.public_base_url = Some("https://legal.example.com".to_string());
    let app = test_app(config, false);

    let body = body_json(
        app.router
            .oneshot(json_request("/ask", json!({ "query": "theft" })))
            .await
            .unwrap(),
    )
    .await;
    let url = body["references"][0]["url"].as_str().unwrap();
    assert!(url.starts_with("https://legal.example.com/files/case_report_"));
}

#[tokio::test]
async fn upload_rejects_empty_file() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(test_config(dir.path()), true);

    let response = app
        .router
        .oneshot(multipart_request("/upload", &[], Some(("notice.txt", b"".as_slice()))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "Empty file");
}

#[tokio::test]
async fn upload_rejects_unsupported_extension() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(test_config(dir.path()), true);

    let response = app
        .router
        .oneshot(multipart_request("/upload", &[], Some(("ledger.xlsx", b"PK\x03\x04".as_slice()))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body_json(response).await["detail"], "Unsupported file");
    assert!(!app.config.reports.upload_dir.join("ledger.xlsx").exists());
}

#[tokio::test]
async fn upload_rejects_unreadable_documents() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(test_config(dir.path()), true);

    for filename in ["petition.docx", "judgment.pdf"] {
        let response = app
            .router
            .clone()
            .oneshot(multipart_request(
                "/upload",
                &[],
                Some((filename, b"plain bytes, not a document".as_slice())),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", filename);

        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "parse_error");
        assert!(body["detail"].as_str().unwrap().contains(filename));
    }

    assert_eq!(app.store.unwrap().len().unwrap(), 0);
    assert!(app.llm.prompts.lock().is_empty());
}

#[tokio::test]
async fn upload_indexes_and_analyses_document() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(test_config(dir.path()), true);
    let text = "LEGAL NOTICE under Section 138 of the Negotiable Instruments Act for a dishonoured cheque.";

    let response = app
        .router
        .oneshot(multipart_request("/upload", &[], Some(("../notice.txt", text.as_bytes()))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["filename"], "notice.txt");
    let chunks_added = body["chunks_added"].as_u64().unwrap();
    assert!(chunks_added > 1);
    assert_eq!(body["references"][0]["type"], "pdf");

    assert!(app.config.reports.upload_dir.join("notice.txt").exists());
    assert_eq!(
        app.store.unwrap().len().unwrap() as u64,
        chunks_added
    );

    let prompt = app.llm.prompts.lock()[0].clone();
    assert!(prompt.contains("Simplify this legal document for a layperson."));
    assert!(prompt.contains(text));
    // The freshly indexed document is its own nearest neighbour
    assert!(prompt.contains("[source: "));
    assert!(!prompt.contains("Extra context:"));
}

#[tokio::test]
async fn reupload_replaces_previous_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(test_config(dir.path()), true);
    let long = "Complaint regarding theft of a motorcycle. ".repeat(10);

    let first = app
        .router
        .clone()
        .oneshot(multipart_request("/upload", &[], Some(("fir.txt", long.as_bytes()))))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .router
        .oneshot(multipart_request("/upload", &[], Some(("fir.txt", b"Short FIR".as_slice()))))
        .await
        .unwrap();
    assert_eq!(body_json(second).await["chunks_added"], 1);
    assert_eq!(app.store.unwrap().len().unwrap(), 1);
}

#[tokio::test]
async fn ask_with_doc_echoes_query() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(test_config(dir.path()), false);

    let response = app
        .router
        .oneshot(multipart_request(
            "/ask-with-doc",
            &[("query", "Should I file a complaint?")],
            Some(("agreement.txt", b"Rental agreement between landlord and tenant".as_slice())),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["query"], "Should I file a complaint?");
    assert_eq!(body["filename"], "agreement.txt");
    assert_eq!(body["chunks_added"], 0);

    let prompt = app.llm.prompts.lock()[0].clone();
    assert!(prompt.contains(
        "User query: Should I file a complaint?\n\nDocument:\nRental agreement between landlord and tenant\n\nTask:"
    ));
    assert!(prompt.contains("Extra context: Fetched prominent cases for query: Should I file a complaint?"));
}

#[tokio::test]
async fn ask_with_doc_requires_query() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(test_config(dir.path()), false);

    let response = app
        .router
        .oneshot(multipart_request("/ask-with-doc", &[], Some(("a.txt", b"text".as_slice()))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["detail"], "Missing query");
}

#[tokio::test]
async fn unknown_route_is_json_404() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app(test_config(dir.path()), false);

    let response = app.router.oneshot(get_request("/documents")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["type"], "not_found");
}
