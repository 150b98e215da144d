use bookshelf_core::loader::{author_views, load_authors, load_books_with_authors};
use bookshelf_core::{
    AuthorRepository, BookRepository, BookshelfApi, LoadStrategy, SqliteAuthorRepository,
    SqliteBookRepository, Store,
};

fn seeded_store() -> Store {
    let store = Store::open_in_memory().unwrap();
    let authors = SqliteAuthorRepository::new(store.clone());
    authors
        .add_with_books("Ahmatova", &["Rekviem", "Poema bez geroya"])
        .unwrap();
    authors.add_with_books("Blok", &["Dvenadtsat"]).unwrap();
    authors.add("Tsvetaeva").unwrap();
    store
}

#[test]
fn demo_author_resolves_both_titles_under_each_strategy() {
    let store = Store::open_in_memory().unwrap();
    let api = BookshelfApi::new(store);
    api.seed_demo_data().unwrap().unwrap();

    for strategy in [LoadStrategy::Lazy, LoadStrategy::Eager] {
        let views = api.authors(strategy).unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].name, "Ahmatova");
        assert_eq!(views[0].books, ["Rekviem", "Poema bez geroya"]);
    }
}

#[test]
fn seeding_twice_inserts_once() {
    let api = BookshelfApi::new(Store::open_in_memory().unwrap());
    assert!(api.seed_demo_data().unwrap().is_some());
    assert!(api.seed_demo_data().unwrap().is_none());
    assert_eq!(api.authors(LoadStrategy::Eager).unwrap().len(), 1);
}

#[test]
fn lazy_and_eager_yield_identical_authors_and_titles() {
    let store = seeded_store();

    let lazy = store.open_session().unwrap();
    let lazy_views = author_views(&lazy, LoadStrategy::Lazy).unwrap();
    lazy.commit().unwrap();

    let eager = store.open_session().unwrap();
    let eager_views = author_views(&eager, LoadStrategy::Eager).unwrap();
    eager.commit().unwrap();

    assert_eq!(lazy_views, eager_views);
    let tsvetaeva = lazy_views
        .iter()
        .find(|view| view.name == "Tsvetaeva")
        .unwrap();
    assert!(tsvetaeva.books.is_empty());
}

#[test]
fn lazy_costs_one_query_per_author_and_eager_costs_one() {
    let store = seeded_store();

    let lazy = store.open_session().unwrap();
    author_views(&lazy, LoadStrategy::Lazy).unwrap();
    assert_eq!(lazy.query_count(), 1 + 3);

    let eager = store.open_session().unwrap();
    author_views(&eager, LoadStrategy::Eager).unwrap();
    assert_eq!(eager.query_count(), 1);
}

#[test]
fn lazy_authors_resolve_books_once_per_instance() {
    let store = seeded_store();
    let session = store.open_session().unwrap();

    let mut authors = load_authors(&session, LoadStrategy::Lazy).unwrap();
    assert_eq!(session.query_count(), 1);
    assert!(authors.iter().all(|author| !author.books_loaded()));
    assert_eq!(authors[0].books(), None);

    let ahmatova = &mut authors[0];
    let titles: Vec<String> = ahmatova
        .load_books(&session)
        .unwrap()
        .iter()
        .map(|book| book.title.clone())
        .collect();
    assert_eq!(titles, ["Rekviem", "Poema bez geroya"]);
    assert_eq!(session.query_count(), 2);

    assert_eq!(ahmatova.load_books(&session).unwrap().len(), 2);
    assert_eq!(session.query_count(), 2);
    assert!(ahmatova.books_loaded());
}

#[test]
fn eager_authors_arrive_with_books_resolved() {
    let store = seeded_store();
    let session = store.open_session().unwrap();

    let mut authors = load_authors(&session, LoadStrategy::Eager).unwrap();
    assert_eq!(session.query_count(), 1);
    assert!(authors.iter().all(|author| author.books_loaded()));
    assert_eq!(authors[2].books(), Some(&[][..]));

    authors[0].load_books(&session).unwrap();
    assert_eq!(session.query_count(), 1);
}

#[test]
fn book_back_reference_matches_under_both_strategies() {
    let store = seeded_store();
    SqliteBookRepository::new(store.clone())
        .add("Unsigned pamphlet", None)
        .unwrap();
    let session = store.open_session().unwrap();

    let lazy = load_books_with_authors(&session, LoadStrategy::Lazy).unwrap();
    let eager = load_books_with_authors(&session, LoadStrategy::Eager).unwrap();
    assert_eq!(lazy, eager);

    let owners: Vec<Option<&str>> = eager
        .iter()
        .map(|item| item.author.as_ref().map(|author| author.name.as_str()))
        .collect();
    assert_eq!(
        owners,
        [Some("Ahmatova"), Some("Ahmatova"), Some("Blok"), None]
    );
}

#[test]
fn load_author_needs_no_query_for_unowned_books() {
    let store = seeded_store();
    let orphan = SqliteBookRepository::new(store.clone())
        .add("Unsigned pamphlet", None)
        .unwrap();
    let owned = SqliteBookRepository::new(store.clone())
        .list_by_author(1)
        .unwrap()
        .remove(0);

    let session = store.open_session().unwrap();
    assert_eq!(orphan.load_author(&session).unwrap(), None);
    assert_eq!(session.query_count(), 0);

    let author = owned.load_author(&session).unwrap().unwrap();
    assert_eq!(author.name, "Ahmatova");
    assert_eq!(session.query_count(), 1);
}

#[test]
fn author_repository_get_and_list_follow_strategy() {
    let store = seeded_store();
    let authors = SqliteAuthorRepository::new(store);

    let lazy = authors.list(LoadStrategy::Lazy).unwrap();
    let eager = authors.list(LoadStrategy::Eager).unwrap();
    assert_eq!(lazy.len(), eager.len());
    assert!(!lazy[0].books_loaded());
    assert_eq!(eager[1].books().map(<[_]>::len), Some(1));

    let blok = authors.get(eager[1].id).unwrap().unwrap();
    assert_eq!(blok.name, "Blok");
    assert_eq!(authors.get(9_999).unwrap(), None);
}

#[test]
fn directly_stored_blank_title_reads_the_same_under_both_strategies() {
    let store = seeded_store();
    store
        .with_connection(|conn| {
            conn.execute("INSERT INTO books (title, author_id) VALUES ('', 1);", [])?;
            Ok(())
        })
        .unwrap();
    let session = store.open_session().unwrap();

    let lazy = author_views(&session, LoadStrategy::Lazy).unwrap();
    let eager = author_views(&session, LoadStrategy::Eager).unwrap();
    assert_eq!(lazy, eager);
    assert_eq!(lazy[0].books, ["Rekviem", "Poema bez geroya", ""]);
    drop(session);

    let listed = SqliteBookRepository::new(store).list_by_author(1).unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[2].title, "");
}
