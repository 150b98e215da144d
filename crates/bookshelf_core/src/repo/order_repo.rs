//! Order repository over a table whose shape follows schema revisions.
//!
//! # Invariants
//! - Column presence is read from `PRAGMA table_info(orders)` inside the same session.
//! - `created_at` is filled by the store default while the baseline shape is active.
//! - A `price` can only be written once the `orders_price` revision is applied.

use crate::db::{Session, Store};
use crate::error::{IntegrityViolation, PersistenceError, PersistenceResult};
use crate::model::order::Order;
use crate::transaction::TransactionCoordinator;
use log::info;
use rusqlite::{params, Row};

pub trait OrderRepository {
    fn add(&self, product_name: &str, quantity: i64, price: Option<f64>)
        -> PersistenceResult<Order>;
    fn list(&self) -> PersistenceResult<Vec<Order>>;
}

#[derive(Debug, Clone)]
pub struct SqliteOrderRepository {
    tx: TransactionCoordinator,
}

impl SqliteOrderRepository {
    pub fn new(store: Store) -> Self {
        Self {
            tx: TransactionCoordinator::new(store),
        }
    }
}

impl OrderRepository for SqliteOrderRepository {
    fn add(
        &self,
        product_name: &str,
        quantity: i64,
        price: Option<f64>,
    ) -> PersistenceResult<Order> {
        let order = self.tx.run(|session| -> PersistenceResult<Order> {
            if product_name.trim().is_empty() {
                return Err(IntegrityViolation::RequiredField {
                    entity: "order",
                    field: "product_name",
                }
                .into());
            }
            let shape = OrdersShape::read(session)?;
            let id = match (shape.has_price, price) {
                (true, price) => session.insert(
                    "INSERT INTO orders (product_name, quantity, price) VALUES (?1, ?2, ?3);",
                    params![product_name, quantity, price],
                )?,
                (false, None) => session.insert(
                    "INSERT INTO orders (product_name, quantity) VALUES (?1, ?2);",
                    params![product_name, quantity],
                )?,
                (false, Some(_)) => {
                    return Err(PersistenceError::InvalidData(
                        "orders.price is not available at the current schema revision"
                            .to_string(),
                    ));
                }
            };
            session
                .query_optional(&shape.select_sql("WHERE id = ?1"), [id], order_from_row)?
                .ok_or_else(|| {
                    PersistenceError::InvalidData(format!("order {id} missing in read-back"))
                })
        })?;

        info!("event=order_add module=repo status=ok order_id={}", order.id);
        Ok(order)
    }

    fn list(&self) -> PersistenceResult<Vec<Order>> {
        self.tx.read(|session| -> PersistenceResult<Vec<Order>> {
            let shape = OrdersShape::read(session)?;
            session.query_rows(&shape.select_sql("ORDER BY id ASC"), [], order_from_row)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OrdersShape {
    has_created_at: bool,
    has_price: bool,
}

impl OrdersShape {
    fn read(session: &Session) -> PersistenceResult<Self> {
        let columns = session.query_rows("PRAGMA table_info(orders);", [], |row| {
            Ok(row.get::<_, String>("name")?)
        })?;
        if columns.is_empty() {
            return Err(PersistenceError::InvalidData(
                "orders table is absent at the current schema revision".to_string(),
            ));
        }
        Ok(Self {
            has_created_at: columns.iter().any(|column| column == "created_at"),
            has_price: columns.iter().any(|column| column == "price"),
        })
    }

    fn select_sql(&self, tail: &str) -> String {
        let created_at = if self.has_created_at {
            "created_at"
        } else {
            "NULL AS created_at"
        };
        let price = if self.has_price {
            "price"
        } else {
            "NULL AS price"
        };
        format!("SELECT id, product_name, quantity, {created_at}, {price} FROM orders {tail};")
    }
}

fn order_from_row(row: &Row<'_>) -> PersistenceResult<Order> {
    Ok(Order {
        id: row.get("id")?,
        product_name: row.get("product_name")?,
        quantity: row.get("quantity")?,
        created_at: row.get("created_at")?,
        price: row.get("price")?,
    })
}

#[cfg(test)]
mod tests {
    use super::OrdersShape;

    #[test]
    fn select_sql_fills_missing_columns_with_null() {
        let baseline = OrdersShape {
            has_created_at: true,
            has_price: false,
        };
        assert_eq!(
            baseline.select_sql("ORDER BY id ASC"),
            "SELECT id, product_name, quantity, created_at, NULL AS price FROM orders ORDER BY id ASC;"
        );

        let priced = OrdersShape {
            has_created_at: false,
            has_price: true,
        };
        assert!(priced.select_sql("").contains("NULL AS created_at, price"));
    }
}
