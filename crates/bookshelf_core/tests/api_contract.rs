use bookshelf_core::{ApiError, BookshelfApi, CreateBookRequest, LoadStrategy, Store};

fn seeded_api() -> (BookshelfApi, i64) {
    let api = BookshelfApi::new(Store::open_in_memory().unwrap());
    let author = api.seed_demo_data().unwrap().unwrap();
    (api, author.id)
}

#[test]
fn create_book_request_deserializes_from_json_body() {
    let request: CreateBookRequest =
        serde_json::from_str(r#"{"title":"Vecher","author_id":1}"#).unwrap();
    assert_eq!(request.title, "Vecher");
    assert_eq!(request.author_id, 1);
}

#[test]
fn created_book_is_returned_as_book_json() {
    let (api, author_id) = seeded_api();

    let book = api
        .create_book(&CreateBookRequest {
            title: "Vecher".to_string(),
            author_id,
        })
        .unwrap();
    let json = serde_json::to_value(&book).unwrap();
    assert_eq!(json["title"], "Vecher");
    assert_eq!(json["author_id"], author_id);
    assert!(json["id"].as_i64().unwrap() > 0);

    let titles: Vec<String> = api
        .books_by_author(author_id)
        .unwrap()
        .into_iter()
        .map(|book| book.title)
        .collect();
    assert_eq!(titles, ["Rekviem", "Poema bez geroya", "Vecher"]);
}

#[test]
fn create_book_for_unknown_author_maps_to_integrity() {
    let (api, author_id) = seeded_api();

    let err = api
        .create_book(&CreateBookRequest {
            title: "Lost".to_string(),
            author_id: author_id + 1,
        })
        .unwrap_err();
    assert_eq!(err.kind(), "integrity");
    assert_eq!(api.books_by_author(author_id).unwrap().len(), 2);
}

#[test]
fn delete_book_reports_success_then_not_found() {
    let (api, author_id) = seeded_api();
    let book_id = api.books_by_author(author_id).unwrap()[0].id;

    let response = api.delete_book(book_id).unwrap();
    assert!(response.is_success());
    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        serde_json::json!({ "status": "success", "message": format!("book {book_id} deleted") })
    );

    let err = api.delete_book(book_id).unwrap_err();
    assert!(matches!(err, ApiError::NotFound { entity: "book", id } if id == book_id));
    assert_eq!(err.kind(), "not_found");
}

#[test]
fn author_views_serialize_with_titles() {
    let (api, author_id) = seeded_api();

    let json = serde_json::to_value(api.authors(LoadStrategy::Lazy).unwrap()).unwrap();
    assert_eq!(
        json,
        serde_json::json!([{
            "id": author_id,
            "name": "Ahmatova",
            "books": ["Rekviem", "Poema bez geroya"]
        }])
    );
}

#[test]
fn api_calls_leave_no_session_open() {
    let (api, author_id) = seeded_api();
    let _ = api.books_by_author(author_id);
    let _ = api.delete_book(9_999);
    let _ = api.users_transaction_demo();
    let _ = api.authors(LoadStrategy::Eager);

    assert_eq!(api.store().stats().open, 0);
}
