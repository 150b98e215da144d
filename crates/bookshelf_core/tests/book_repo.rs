use bookshelf_core::{
    AuthorRepository, BookRepository, IntegrityViolation, PersistenceError,
    SqliteAuthorRepository, SqliteBookRepository, Store,
};

fn repos() -> (Store, SqliteAuthorRepository, SqliteBookRepository) {
    let store = Store::open_in_memory().unwrap();
    (
        store.clone(),
        SqliteAuthorRepository::new(store.clone()),
        SqliteBookRepository::new(store),
    )
}

#[test]
fn added_book_is_listed_under_its_author() {
    let (_store, authors, books) = repos();
    let author = authors.add("Bulgakov").unwrap();

    let created = books.add("Master i Margarita", Some(author.id)).unwrap();
    assert!(created.id > 0);
    assert_eq!(created.title, "Master i Margarita");
    assert_eq!(created.author_id, Some(author.id));

    let listed = books.list_by_author(author.id).unwrap();
    assert_eq!(listed, vec![created.clone()]);
    assert_eq!(books.get(created.id).unwrap(), Some(created));
}

#[test]
fn ids_are_assigned_by_the_store_and_increase() {
    let (_store, authors, books) = repos();
    let author = authors.add("Chekhov").unwrap();

    let first = books.add("Chaika", Some(author.id)).unwrap();
    let second = books.add("Vishnevyi sad", Some(author.id)).unwrap();
    assert!(second.id > first.id);

    let titles: Vec<String> = books
        .list_by_author(author.id)
        .unwrap()
        .into_iter()
        .map(|book| book.title)
        .collect();
    assert_eq!(titles, ["Chaika", "Vishnevyi sad"]);
}

#[test]
fn book_without_author_is_allowed() {
    let (_store, _authors, books) = repos();

    let orphan = books.add("Anonymous chronicle", None).unwrap();
    assert_eq!(orphan.author_id, None);
    assert_eq!(books.get(orphan.id).unwrap(), Some(orphan));
}

#[test]
fn unknown_author_is_an_integrity_error_and_leaves_nothing_behind() {
    let (store, authors, books) = repos();
    let author = authors.add("Gogol").unwrap();

    let err = books.add("Mertvye dushi", Some(author.id + 100)).unwrap_err();
    assert!(err.is_integrity(), "unexpected error: {err}");
    assert!(matches!(
        err,
        PersistenceError::Integrity(IntegrityViolation::ForeignKey(_))
    ));

    assert!(books.list_by_author(author.id).unwrap().is_empty());
    assert!(books.list_by_author(author.id + 100).unwrap().is_empty());
    assert_eq!(store.stats().open, 0);
}

#[test]
fn blank_title_is_rejected_before_reaching_the_store() {
    let (_store, authors, books) = repos();
    let author = authors.add("Tolstoy").unwrap();

    let err = books.add("   ", Some(author.id)).unwrap_err();
    assert!(matches!(
        err,
        PersistenceError::Integrity(IntegrityViolation::RequiredField {
            entity: "book",
            field: "title"
        })
    ));
    assert!(books.list_by_author(author.id).unwrap().is_empty());
}

#[test]
fn listing_an_author_without_books_is_empty() {
    let (_store, authors, books) = repos();
    let author = authors.add("Pushkin").unwrap();

    assert!(books.list_by_author(author.id).unwrap().is_empty());
    assert!(books.list_by_author(9_999).unwrap().is_empty());
}

#[test]
fn delete_removes_once_then_reports_absence() {
    let (_store, authors, books) = repos();
    let author = authors.add("Lermontov").unwrap();
    let keep = books.add("Demon", Some(author.id)).unwrap();
    let gone = books.add("Geroi nashego vremeni", Some(author.id)).unwrap();

    assert!(books.delete(gone.id).unwrap());
    assert!(!books.delete(gone.id).unwrap());
    assert!(!books.delete(9_999).unwrap());

    assert_eq!(books.get(gone.id).unwrap(), None);
    assert_eq!(books.list_by_author(author.id).unwrap(), vec![keep]);
}

#[test]
fn every_call_closes_its_session() {
    let (store, authors, books) = repos();
    let author = authors.add("Turgenev").unwrap();
    books.add("Ottsy i deti", Some(author.id)).unwrap();
    assert!(books.add("", Some(author.id)).is_err());
    books.list_by_author(author.id).unwrap();
    books.delete(1).unwrap();

    let stats = store.stats();
    assert_eq!(stats.open, 0);
    assert_eq!(stats.opened, stats.committed + stats.rolled_back);
    assert_eq!(stats.rolled_back, 1);
}
