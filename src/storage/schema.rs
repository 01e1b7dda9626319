//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Tiki-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Category tree, parents always inserted before their children
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    url TEXT NOT NULL,
    parent_id INTEGER REFERENCES categories(id),
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_categories_parent ON categories(parent_id);

-- Products from the standard listing
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id INTEGER NOT NULL REFERENCES categories(id),
    category_label TEXT NOT NULL,
    sku TEXT NOT NULL,
    title TEXT NOT NULL,
    regular_price INTEGER,
    final_price INTEGER NOT NULL,
    discount_label TEXT NOT NULL DEFAULT '',
    url TEXT NOT NULL,
    image_url TEXT NOT NULL,
    review_count INTEGER NOT NULL DEFAULT 0,
    variant_flag INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_items_category ON items(category_id);

-- Products from the express (fast-delivery) listing
CREATE TABLE IF NOT EXISTS items_express (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    category_id INTEGER NOT NULL REFERENCES categories(id),
    category_label TEXT NOT NULL,
    sku TEXT NOT NULL,
    title TEXT NOT NULL,
    regular_price INTEGER,
    final_price INTEGER NOT NULL,
    discount_label TEXT NOT NULL DEFAULT '',
    url TEXT NOT NULL,
    image_url TEXT NOT NULL,
    review_count INTEGER NOT NULL DEFAULT 0,
    variant_flag INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_items_express_category ON items_express(category_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
