use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;
use uuid::Uuid;

use local_library_server::models::LoanStatus;
use local_library_server::services::today;

use crate::common::{json_body, location, TestApp, EDITOR_ID, LIBRARIAN_ID, READER_ID};

fn renew_url(id: Uuid) -> String {
    format!("/api/v1/book/{}/renew", id)
}

#[tokio::test]
async fn test_my_books_requires_login() {
    let app = TestApp::new();

    let response = app.get("/api/v1/mybooks", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["login_url"], "/api/v1/auth/login");
    assert!(body.get("items").is_none());
}

#[tokio::test]
async fn test_my_books_lists_only_own_loans() {
    let app = TestApp::new();

    let body = json_body(app.get("/api/v1/mybooks", Some(READER_ID)).await).await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], app.fixture.reader_loan.to_string());
    assert_eq!(items[0]["is_overdue"], false);

    let body = json_body(app.get("/api/v1/mybooks", Some(EDITOR_ID)).await).await;
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_borrowed_requires_capability() {
    let app = TestApp::new();

    let response = app.get("/api/v1/borrowed", Some(READER_ID)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.get("/api/v1/borrowed", Some(LIBRARIAN_ID)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let items = body["items"].as_array().unwrap();
    // Earliest due first: the overdue copy leads
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], app.fixture.librarian_loan.to_string());
    assert_eq!(items[0]["is_overdue"], true);
    assert_eq!(items[0]["borrower"], "librarian");
    assert_eq!(items[1]["id"], app.fixture.reader_loan.to_string());
}

#[tokio::test]
async fn test_renewal_form_proposes_three_weeks() {
    let app = TestApp::new();

    let response = app
        .get(&renew_url(app.fixture.reader_loan), Some(LIBRARIAN_ID))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["bookinst"]["book_title"], "A Wizard of Earthsea");
    assert_eq!(
        body["form"]["values"]["renewal_date"],
        (today() + Duration::weeks(3)).to_string()
    );
}

#[tokio::test]
async fn test_renewal_of_unknown_instance_is_not_found() {
    let app = TestApp::new();
    let unknown = Uuid::new_v4();

    let response = app.get(&renew_url(unknown), Some(LIBRARIAN_ID)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .post(
            &renew_url(unknown),
            Some(LIBRARIAN_ID),
            json!({"renewal_date": today().to_string()}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_renewal_without_capability_changes_nothing() {
    let app = TestApp::new();
    let id = app.fixture.reader_loan;
    let before = app.store.instance(id).unwrap();

    for user in [READER_ID, EDITOR_ID] {
        let response = app
            .post(
                &renew_url(id),
                Some(user),
                json!({"renewal_date": (today() + Duration::days(7)).to_string()}),
            )
            .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
    assert_eq!(app.store.instance(id).unwrap(), before);
}

#[tokio::test]
async fn test_renewal_end_to_end() {
    let app = TestApp::new();
    let id = app.fixture.reader_loan;
    let before = app.store.instance(id).unwrap();
    let target = today() + Duration::days(21);

    let response = app
        .post(
            &renew_url(id),
            Some(LIBRARIAN_ID),
            json!({"renewal_date": target.to_string()}),
        )
        .await;
    assert_eq!(location(&response), "/api/v1/borrowed");

    let after = app.store.instance(id).unwrap();
    assert_eq!(after.due_back, Some(target));
    assert_eq!(after.status, before.status);
    assert_eq!(after.borrower_id, before.borrower_id);
    assert_eq!(after.imprint, before.imprint);
}

#[tokio::test]
async fn test_renewal_window_boundaries() {
    let app = TestApp::new();
    let id = app.fixture.reader_loan;
    let before = app.store.instance(id).unwrap();

    let rejected = [
        (today() - Duration::days(1), "invalid date - renewal in past"),
        (
            today() + Duration::weeks(4) + Duration::days(1),
            "invalid date - more than 4 weeks ahead",
        ),
    ];
    for (date, message) in rejected {
        let response = app
            .post(
                &renew_url(id),
                Some(LIBRARIAN_ID),
                json!({"renewal_date": date.to_string()}),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["form"]["errors"]["renewal_date"][0], message);
        assert_eq!(body["form"]["values"]["renewal_date"], date.to_string());
        assert_eq!(app.store.instance(id).unwrap(), before);
    }

    let limit = today() + Duration::weeks(4);
    let response = app
        .post(
            &renew_url(id),
            Some(LIBRARIAN_ID),
            json!({"renewal_date": limit.format("%m/%d/%Y").to_string()}),
        )
        .await;
    assert_eq!(location(&response), "/api/v1/borrowed");
    assert_eq!(app.store.instance(id).unwrap().due_back, Some(limit));
}

#[tokio::test]
async fn test_renewal_rejects_missing_and_malformed_dates() {
    let app = TestApp::new();
    let id = app.fixture.reader_loan;

    for (payload, message) in [
        (json!({}), "This field is required."),
        (json!({"renewal_date": "next tuesday"}), "Enter a valid date."),
    ] {
        let response = app.post(&renew_url(id), Some(LIBRARIAN_ID), payload).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["form"]["errors"]["renewal_date"][0], message);
    }
}

#[tokio::test]
async fn test_on_loan_copies_have_borrowers() {
    let app = TestApp::new();

    for instance in app.store.instances() {
        assert_eq!(
            instance.status == LoanStatus::OnLoan,
            instance.borrower_id.is_some(),
            "copy {} breaks the borrower rule",
            instance.id
        );
        assert!(instance.borrower_consistent());
    }
    assert!(app.store.instance(app.fixture.available).unwrap().borrower_id.is_none());
}

#[tokio::test]
async fn test_borrowed_ties_break_on_id_with_undated_loans_last() {
    let app = TestApp::new();
    let book = app.fixture.earthsea;
    let shared_due = today() + Duration::days(10);

    let undated = app.store.lend(book, READER_ID, None);
    let mut same_day: Vec<Uuid> = (0..3)
        .map(|_| app.store.lend(book, READER_ID, Some(shared_due)))
        .collect();
    same_day.sort();

    let body = json_body(app.get("/api/v1/borrowed", Some(LIBRARIAN_ID)).await).await;
    let ids: Vec<String> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect();

    let mut expected = vec![app.fixture.librarian_loan, app.fixture.reader_loan];
    expected.extend(same_day);
    expected.push(undated);
    let expected: Vec<String> = expected.iter().map(Uuid::to_string).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_borrowed_pages_of_ten() {
    let app = TestApp::new();
    for days in 0..10 {
        app.store.lend(
            app.fixture.earthsea,
            READER_ID,
            Some(today() + Duration::days(5 + days)),
        );
    }

    let body = json_body(app.get("/api/v1/borrowed", Some(LIBRARIAN_ID)).await).await;
    assert_eq!(body["total"], 12);
    assert_eq!(body["num_pages"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 10);
    assert_eq!(body["items"][0]["id"], app.fixture.librarian_loan.to_string());

    let body = json_body(app.get("/api/v1/borrowed?page=2", Some(LIBRARIAN_ID)).await).await;
    assert_eq!(body["page"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);

    let response = app.get("/api/v1/borrowed?page=3", Some(LIBRARIAN_ID)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(app.get("/api/v1/mybooks?page=2", Some(READER_ID)).await).await;
    assert_eq!(body["total"], 11);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_renewal_with_non_object_body_changes_nothing() {
    let app = TestApp::new();
    let id = app.fixture.reader_loan;
    let before = app.store.instance(id).unwrap();

    let response = app
        .post(&renew_url(id), Some(LIBRARIAN_ID), json!(today().to_string()))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "BadValue");
    assert!(body["fields"]["__all__"][0].is_string());
    assert_eq!(app.store.instance(id).unwrap(), before);
}
