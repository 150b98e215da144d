use bookshelf_core::db::migrations::{downgrade, upgrade};
use bookshelf_core::{OrderRepository, PersistenceError, SqliteOrderRepository, Store};

#[test]
fn baseline_orders_get_created_at_from_the_store() {
    let store = Store::open_in_memory().unwrap();
    let orders = SqliteOrderRepository::new(store);

    let order = orders.add("Teapot", 2, None).unwrap();
    assert_eq!(order.product_name, "Teapot");
    assert_eq!(order.quantity, 2);
    assert!(order.created_at.unwrap() > 0);
    assert_eq!(order.price, None);
}

#[test]
fn price_is_rejected_until_the_revision_is_applied() {
    let store = Store::open_in_memory().unwrap();
    let orders = SqliteOrderRepository::new(store.clone());

    let err = orders.add("Teapot", 1, Some(12.5)).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
    assert!(orders.list().unwrap().is_empty());

    store.with_connection(upgrade).unwrap();
    let priced = orders.add("Teapot", 1, Some(12.5)).unwrap();
    assert_eq!(priced.price, Some(12.5));
    assert_eq!(priced.created_at, None);
}

#[test]
fn orders_survive_an_upgrade_and_downgrade_cycle() {
    let store = Store::open_in_memory().unwrap();
    let orders = SqliteOrderRepository::new(store.clone());
    orders.add("Samovar", 1, None).unwrap();

    store.with_connection(upgrade).unwrap();
    orders.add("Kettle", 3, Some(4.0)).unwrap();
    store.with_connection(downgrade).unwrap();

    let listed = orders.list().unwrap();
    let names: Vec<&str> = listed
        .iter()
        .map(|order| order.product_name.as_str())
        .collect();
    assert_eq!(names, ["Samovar", "Kettle"]);
    assert!(listed.iter().all(|order| order.price.is_none()));

    let after_downgrade = orders.add("Teapot", 1, None).unwrap();
    assert!(after_downgrade.created_at.unwrap() > 0);
    assert!(after_downgrade.id > listed[1].id);
}

#[test]
fn missing_orders_table_is_reported() {
    let store = Store::open_in_memory().unwrap();
    store.with_connection(downgrade).unwrap();

    let err = SqliteOrderRepository::new(store).list().unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}
