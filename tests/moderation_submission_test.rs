use httpmock::prelude::*;
use price_board::core::moderation::ModerationStats;
use price_board::core::submission::{FormField, SubmitOutcome, REDIRECT_DELAY};
use price_board::domain::model::{EntryId, EntryType, Location};
use price_board::{HttpPriceApi, ModerationQueue, PriceBoardError, SubmissionForm};
use serde_json::json;
use std::time::Duration;

fn api_for(server: &MockServer, token: Option<&str>) -> HttpPriceApi {
    HttpPriceApi::new(
        &server.url("/api"),
        Duration::from_secs(5),
        token.map(str::to_string),
    )
    .unwrap()
}

fn listing(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "type": "service",
        "category": "Haircuts",
        "price": 25.0,
        "currency": "GBP",
        "vendor": "Sharp Cuts",
        "country": "United Kingdom",
        "city": "Leeds",
        "status": "pending",
        "created_at": "2024-05-01T12:00:00Z"
    })
}

fn haircut_form() -> SubmissionForm {
    let mut form = SubmissionForm::new("GBP").with_known_currencies(["USD", "EUR", "GBP"]);
    form.set_field(FormField::Name, "Haircut");
    form.set_field(FormField::Type, "service");
    form.set_field(FormField::Category, "Haircuts");
    form.set_field(FormField::Price, "25");
    form.set_field(FormField::Vendor, "Sharp Cuts");
    form.set_field(FormField::Link, "https://sharpcuts.example.com");
    form.apply_location(
        &Location {
            country: "United Kingdom".to_string(),
            country_code: "GB".to_string(),
            city: "Leeds".to_string(),
            suggested_currency: Some("GBP".to_string()),
        },
        "GBP",
    );
    form
}

#[tokio::test]
async fn test_submit_posts_entry_and_resets_form() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/api/entries").json_body(json!({
            "name": "Haircut",
            "type": "service",
            "category": "Haircuts",
            "price": 25.0,
            "currency": "GBP",
            "vendor": "Sharp Cuts",
            "country": "United Kingdom",
            "city": "Leeds",
            "link": "https://sharpcuts.example.com"
        }));
        then.status(201).json_body(json!({ "data": listing("abc", "Haircut") }));
    });

    let api = api_for(&server, None);
    let mut form = haircut_form();

    match form.submit(&api).await {
        SubmitOutcome::Submitted {
            entry,
            redirect_after,
        } => {
            assert_eq!(entry.id, EntryId::from("abc"));
            assert_eq!(entry.entry_type, EntryType::Service);
            assert_eq!(redirect_after, REDIRECT_DELAY);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    mock.assert();

    assert!(form.name.is_empty());
    assert!(form.price.is_empty());
    // 位置預填在重置後保留
    assert_eq!(form.city, "Leeds");
    assert_eq!(form.currency, "GBP");
}

#[tokio::test]
async fn test_invalid_form_sends_nothing() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/api/entries");
        then.status(201);
    });

    let api = api_for(&server, None);
    let mut form = haircut_form();
    form.set_field(FormField::Price, "-3");
    form.set_field(FormField::Currency, "CHF");

    match form.submit(&api).await {
        SubmitOutcome::Invalid(errors) => {
            assert_eq!(errors[&FormField::Price], "Valid price is required");
            assert_eq!(errors[&FormField::Currency], "Valid currency is required");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(mock.hits(), 0);
    assert_eq!(form.errors().len(), 2);
}

#[tokio::test]
async fn test_server_error_message_is_shown() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/entries");
        then.status(400)
            .json_body(json!({ "error": "Category does not exist" }));
    });

    let api = api_for(&server, None);
    let mut form = haircut_form();

    assert_eq!(
        form.submit(&api).await,
        SubmitOutcome::Failed {
            message: "Category does not exist".to_string()
        }
    );
    assert_eq!(form.error(), Some("Category does not exist"));
    // 失敗時表單內容保留
    assert_eq!(form.name, "Haircut");
}

#[tokio::test]
async fn test_server_error_without_message_is_generic() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/api/entries");
        then.status(500);
    });

    let api = api_for(&server, None);
    let mut form = haircut_form();

    assert_eq!(
        form.submit(&api).await,
        SubmitOutcome::Failed {
            message: "Failed to submit entry".to_string()
        }
    );
}

#[tokio::test]
async fn test_approve_and_reject_update_queue() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET)
            .path("/api/admin/entries/pending")
            .header("Authorization", "Bearer admin");
        then.status(200).json_body(json!({
            "data": [listing("1", "A"), listing("2", "B"), listing("3", "C")]
        }));
    });
    let approve = server.mock(|when, then| {
        when.method(POST).path("/api/admin/entries/1/approve");
        then.status(200).json_body(json!({ "success": true }));
    });
    let reject = server.mock(|when, then| {
        when.method(DELETE).path("/api/entries/2");
        then.status(200).json_body(json!({ "success": true }));
    });
    let failing = server.mock(|when, then| {
        when.method(DELETE).path("/api/entries/3");
        then.status(500).json_body(json!({ "error": "Could not delete entry" }));
    });

    let api = api_for(&server, Some("admin"));
    let mut queue = ModerationQueue::new();
    queue.load(&api).await;
    assert_eq!(queue.pending().len(), 3);
    assert!(!queue.is_loading());

    tokio_test::assert_ok!(queue.approve(&api, &EntryId::from("1")).await);
    tokio_test::assert_ok!(queue.reject(&api, &EntryId::from("2")).await);

    let err = queue.reject(&api, &EntryId::from("3")).await.unwrap_err();
    assert!(matches!(err, PriceBoardError::ApiStatus { status: 500, .. }));
    assert_eq!(queue.error(), Some("Could not delete entry"));

    assert_eq!(
        queue.stats(),
        ModerationStats {
            pending: 1,
            approved: 1,
            rejected: 1,
        }
    );
    assert_eq!(queue.pending()[0].id.as_str(), "3");
    assert!(queue.action_for(&EntryId::from("3")).is_none());

    approve.assert();
    reject.assert();
    failing.assert();
}

#[tokio::test]
async fn test_unknown_entry_is_not_sent() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/admin/entries/pending");
        then.status(200).json_body(json!({ "data": [listing("1", "A")] }));
    });
    let approve = server.mock(|when, then| {
        when.method(POST).path("/api/admin/entries/99/approve");
        then.status(200);
    });

    let api = api_for(&server, None);
    let mut queue = ModerationQueue::new();
    queue.load(&api).await;

    let err = queue.approve(&api, &EntryId::from("99")).await.unwrap_err();
    assert!(matches!(err, PriceBoardError::UnknownEntry { .. }));
    assert_eq!(approve.hits(), 0);
}
