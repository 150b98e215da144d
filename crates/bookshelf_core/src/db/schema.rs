//! Declarative schema for authors, books, users and orders.
//!
//! # Responsibility
//! - Declare every table, column constraint and relationship in one place.
//! - Render idempotent DDL from the declarations at store startup.
//!
//! # Invariants
//! - Ids are `INTEGER PRIMARY KEY AUTOINCREMENT`, so a deleted id is never reused.
//! - `books.author_id` is nullable and references `authors(id)`.
//! - A fresh store is stamped with `BASELINE_REVISION`.

use super::migrations::latest_revision;
use super::{DbError, DbResult};
use rusqlite::Connection;

/// Revision that `create_all` produces on an empty store.
pub const BASELINE_REVISION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Text,
    Real,
}

impl SqlType {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Text => "TEXT",
            Self::Real => "REAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignKeyDef {
    pub table: &'static str,
    pub column: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub primary_key: bool,
    pub references: Option<ForeignKeyDef>,
    /// Raw SQL default expression.
    pub default_sql: Option<&'static str>,
}

impl ColumnDef {
    const fn id() -> Self {
        Self {
            name: "id",
            sql_type: SqlType::Integer,
            nullable: false,
            primary_key: true,
            references: None,
            default_sql: None,
        }
    }

    const fn required(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            nullable: false,
            primary_key: false,
            references: None,
            default_sql: None,
        }
    }

    const fn optional(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            nullable: true,
            primary_key: false,
            references: None,
            default_sql: None,
        }
    }

    const fn references(self, table: &'static str, column: &'static str) -> Self {
        Self {
            references: Some(ForeignKeyDef { table, column }),
            ..self
        }
    }

    const fn default_sql(self, expr: &'static str) -> Self {
        Self {
            default_sql: Some(expr),
            ..self
        }
    }

    fn render(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type.as_sql());
        if self.primary_key {
            sql.push_str(" PRIMARY KEY AUTOINCREMENT");
        } else if !self.nullable {
            sql.push_str(" NOT NULL");
        }
        if let Some(expr) = self.default_sql {
            sql.push_str(&format!(" DEFAULT ({expr})"));
        }
        if let Some(fk) = self.references {
            sql.push_str(&format!(" REFERENCES {}({})", fk.table, fk.column));
        }
        sql
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
}

impl TableDef {
    /// Renders `CREATE TABLE IF NOT EXISTS` DDL for this table.
    pub fn create_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(ColumnDef::render)
            .collect::<Vec<_>>()
            .join(",\n    ");
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n);",
            self.name, columns
        )
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|column| column.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    OneToMany,
    ManyToOne,
}

/// Association between two tables resolved through one foreign key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipDef {
    pub name: &'static str,
    pub owner: &'static str,
    pub target: &'static str,
    pub cardinality: Cardinality,
    /// Column on the many side holding the reference.
    pub foreign_key: &'static str,
    pub back_populates: &'static str,
}

pub const AUTHORS: TableDef = TableDef {
    name: "authors",
    columns: &[ColumnDef::id(), ColumnDef::required("name", SqlType::Text)],
};

pub const BOOKS: TableDef = TableDef {
    name: "books",
    columns: &[
        ColumnDef::id(),
        ColumnDef::required("title", SqlType::Text),
        ColumnDef::optional("author_id", SqlType::Integer).references("authors", "id"),
    ],
};

pub const USERS: TableDef = TableDef {
    name: "users",
    columns: &[
        ColumnDef::id(),
        ColumnDef::required("username", SqlType::Text),
        ColumnDef::required("email", SqlType::Text),
    ],
};

/// Baseline shape of `orders`; later revisions may reshape it.
pub const ORDERS: TableDef = TableDef {
    name: "orders",
    columns: &[
        ColumnDef::id(),
        ColumnDef::required("product_name", SqlType::Text),
        ColumnDef::required("quantity", SqlType::Integer),
        ColumnDef::optional("created_at", SqlType::Integer)
            .default_sql("strftime('%s', 'now') * 1000"),
    ],
};

pub const TABLES: &[TableDef] = &[AUTHORS, BOOKS, USERS, ORDERS];

pub const AUTHOR_BOOKS: RelationshipDef = RelationshipDef {
    name: "books",
    owner: "authors",
    target: "books",
    cardinality: Cardinality::OneToMany,
    foreign_key: "author_id",
    back_populates: "author",
};

pub const BOOK_AUTHOR: RelationshipDef = RelationshipDef {
    name: "author",
    owner: "books",
    target: "authors",
    cardinality: Cardinality::ManyToOne,
    foreign_key: "author_id",
    back_populates: "books",
};

/// Creates every declared table that is absent, in one transaction.
///
/// Safe to call on every startup. A store at revision 0 is stamped with
/// `BASELINE_REVISION`; existing revisions are left untouched.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the store was migrated by a newer binary.
pub fn create_all(conn: &mut Connection) -> DbResult<()> {
    let current = super::migrations::current_revision(conn)?;
    let latest = latest_revision();
    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }

    let tx = conn.transaction()?;
    for table in TABLES {
        tx.execute_batch(&table.create_sql())?;
    }
    if current == 0 {
        tx.execute_batch(&format!("PRAGMA user_version = {BASELINE_REVISION};"))?;
    }
    tx.commit()?;
    Ok(())
}
