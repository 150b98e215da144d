use bookshelf_core::{
    AuthorBookCount, AuthorRepository, BookRepository, BookshelfApi, SqliteAuthorRepository,
    SqliteBookRepository, Store,
};

fn count(author: &str, book_count: i64) -> AuthorBookCount {
    AuthorBookCount {
        author: author.to_string(),
        book_count,
    }
}

#[test]
fn counts_only_authors_that_own_books() {
    let store = Store::open_in_memory().unwrap();
    let authors = SqliteAuthorRepository::new(store.clone());
    authors.add_with_books("A", &["a1", "a2"]).unwrap();
    authors.add_with_books("B", &["b1"]).unwrap();
    authors.add("C").unwrap();

    let rows = BookshelfApi::new(store).author_book_counts().unwrap();
    assert_eq!(rows, vec![count("A", 2), count("B", 1)]);
}

#[test]
fn authors_sharing_a_name_are_grouped_together() {
    let store = Store::open_in_memory().unwrap();
    let authors = SqliteAuthorRepository::new(store.clone());
    authors.add_with_books("Ivanov", &["first"]).unwrap();
    authors.add_with_books("Ivanov", &["second", "third"]).unwrap();

    let rows = BookshelfApi::new(store).author_book_counts().unwrap();
    assert_eq!(rows, vec![count("Ivanov", 3)]);
}

#[test]
fn unowned_books_and_empty_store_produce_no_rows() {
    let store = Store::open_in_memory().unwrap();
    let api = BookshelfApi::new(store.clone());
    assert!(api.author_book_counts().unwrap().is_empty());

    SqliteBookRepository::new(store).add("Orphan", None).unwrap();
    assert!(api.author_book_counts().unwrap().is_empty());
}

#[test]
fn report_rows_serialize_with_author_and_count() {
    let json = serde_json::to_value(count("A", 2)).unwrap();
    assert_eq!(json, serde_json::json!({ "author": "A", "book_count": 2 }));
}
