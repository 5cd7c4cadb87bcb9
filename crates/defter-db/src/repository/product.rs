//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Stock Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read, compute, write back (lost updates)                     │
//! │     SELECT quantity ...; UPDATE products SET quantity = 7               │
//! │                                                                         │
//! │  ✅ CORRECT: one atomic delta, clamped at zero                          │
//! │     UPDATE products SET quantity = MAX(0, quantity - 3)                 │
//! │                                                                         │
//! │  Stock is set once on create. After that only invoice postings and      │
//! │  item replacements move it, through adjust_stock().                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## SKU Generation
//! ```text
//! supplier known ──► SUP-004-012 (supplier code + product count + 1)
//! otherwise ───────► TEA-261017-4821 (name prefix + date + random)
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{MAX_GENERATED_ID_ATTEMPTS, begin_write, like_pattern, new_id};
use defter_core::numbering::{standalone_sku, supplier_product_sku};
use defter_core::validation::Validate;
use defter_core::{
    NewProduct, Product, ProductSalesHistory, ProductUpdate, SalesHistoryEntry,
    DEFAULT_MIN_QUANTITY,
};

const PRODUCT_COLUMNS: &str = r#"
    id, name, description, sku, barcode, category,
    price_cents, cost_cents, currency, supplier_id,
    quantity, min_quantity, is_active, created_at, updated_at
"#;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products, newest first.
    ///
    /// With a search term, keeps products whose name, SKU or barcode
    /// contains it (case-insensitive).
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<Product>> {
        let products = match search {
            Some(term) => {
                debug!(search = %term, "Searching products");
                let sql = format!(
                    r#"
                    SELECT {PRODUCT_COLUMNS} FROM products
                    WHERE LOWER(name) LIKE ?1 ESCAPE '\'
                       OR LOWER(sku) LIKE ?1 ESCAPE '\'
                       OR LOWER(COALESCE(barcode, '')) LIKE ?1 ESCAPE '\'
                    ORDER BY created_at DESC, rowid DESC
                    "#
                );
                sqlx::query_as::<_, Product>(&sql)
                    .bind(like_pattern(term))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, rowid DESC"
                );
                sqlx::query_as::<_, Product>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(products)
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Looks a product up by barcode, falling back to SKU.
    ///
    /// Scanners read printed SKU labels as well as manufacturer barcodes.
    pub async fn get_by_barcode(&self, code: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1");
        let by_barcode = sqlx::query_as::<_, Product>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        if by_barcode.is_some() {
            return Ok(by_barcode);
        }

        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1");
        let by_sku = sqlx::query_as::<_, Product>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(by_sku)
    }

    /// Products at or below their reorder threshold, lowest stock first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE quantity <= min_quantity
            ORDER BY quantity ASC, name ASC
            "#
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Creates a product.
    ///
    /// ## What This Does
    /// 1. Validates the payload
    /// 2. Checks the supplier exists (when given)
    /// 3. Generates a SKU when none was sent, retrying on collision
    /// 4. Inserts with the opening stock
    pub async fn create(&self, input: NewProduct) -> DbResult<Product> {
        input.validate().map_err(defter_core::CoreError::from)?;

        let mut tx = begin_write(&self.pool).await?;

        let supplier_code = match input.supplier_id.as_deref() {
            Some(supplier_id) => {
                let code: Option<String> =
                    sqlx::query_scalar("SELECT supplier_code FROM suppliers WHERE id = ?1")
                        .bind(supplier_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                Some(code.ok_or_else(|| DbError::not_found("Supplier", supplier_id))?)
            }
            None => None,
        };

        let now = Utc::now();
        let mut product = Product {
            id: new_id(),
            name: input.name.trim().to_string(),
            description: input.description,
            sku: String::new(),
            barcode: input.barcode.map(|b| b.trim().to_string()),
            category: input.category,
            price_cents: input.price_cents,
            cost_cents: input.cost_cents,
            currency: input.currency.unwrap_or_default(),
            supplier_id: input.supplier_id,
            quantity: input.quantity.unwrap_or(0),
            min_quantity: input.min_quantity.unwrap_or(DEFAULT_MIN_QUANTITY),
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        match input.sku {
            Some(sku) => {
                product.sku = sku.trim().to_string();
                insert_product(&mut tx, &product)
                    .await
                    .map_err(|e| e.with_duplicate_value("sku", &product.sku))?;
            }
            None => {
                let mut offset: i64 = 0;
                if let Some(code) = supplier_code.as_deref() {
                    offset = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE supplier_id = ?1")
                        .bind(product.supplier_id.as_deref())
                        .fetch_one(&mut *tx)
                        .await?;
                    product.sku = supplier_product_sku(code, offset);
                } else {
                    product.sku = standalone_sku(&product.name, now);
                }

                let mut attempt = 1;
                loop {
                    match insert_product(&mut tx, &product).await {
                        Ok(()) => break,
                        Err(e)
                            if e.is_unique_violation_on("sku")
                                && attempt < MAX_GENERATED_ID_ATTEMPTS =>
                        {
                            warn!(sku = %product.sku, attempt, "Generated SKU taken, retrying");
                            attempt += 1;
                            offset += 1;
                            product.sku = match supplier_code.as_deref() {
                                Some(code) => supplier_product_sku(code, offset),
                                None => standalone_sku(&product.name, now),
                            };
                        }
                        Err(e) => return Err(e.with_duplicate_value("sku", &product.sku)),
                    }
                }
            }
        }

        tx.commit().await?;

        info!(id = %product.id, sku = %product.sku, "Product created");
        Ok(product)
    }

    /// Applies a partial update. Stock is not touched.
    pub async fn update(&self, id: &str, input: ProductUpdate) -> DbResult<Product> {
        input.validate().map_err(defter_core::CoreError::from)?;
        debug!(id = %id, "Updating product");

        let mut tx = begin_write(&self.pool).await?;

        if let Some(supplier_id) = input.supplier_id.as_deref() {
            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM suppliers WHERE id = ?1")
                .bind(supplier_id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(DbError::not_found("Supplier", supplier_id));
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = COALESCE(?2, name),
                description = COALESCE(?3, description),
                sku = COALESCE(?4, sku),
                barcode = COALESCE(?5, barcode),
                category = COALESCE(?6, category),
                price_cents = COALESCE(?7, price_cents),
                cost_cents = COALESCE(?8, cost_cents),
                currency = COALESCE(?9, currency),
                supplier_id = COALESCE(?10, supplier_id),
                min_quantity = COALESCE(?11, min_quantity),
                is_active = COALESCE(?12, is_active),
                updated_at = ?13
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.description.as_deref())
        .bind(input.sku.as_deref().map(str::trim))
        .bind(input.barcode.as_deref().map(str::trim))
        .bind(input.category.as_deref())
        .bind(input.price_cents)
        .bind(input.cost_cents)
        .bind(input.currency)
        .bind(input.supplier_id.as_deref())
        .bind(input.min_quantity)
        .bind(input.is_active)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)
        .map_err(|e| match (input.sku.as_deref(), input.barcode.as_deref()) {
            (Some(sku), _) if e.is_unique_violation_on("sku") => e.with_duplicate_value("sku", sku),
            (_, Some(barcode)) => e.with_duplicate_value("barcode", barcode),
            _ => e,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        let product = fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        tx.commit().await?;
        Ok(product)
    }

    /// Hard-deletes a product.
    ///
    /// Invoice lines keep their name and price snapshot; their
    /// `product_id` is cleared by the foreign key.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// Every invoice line of a product, newest first, with totals.
    pub async fn sales_history(&self, id: &str) -> DbResult<ProductSalesHistory> {
        if self.get_by_id(id).await?.is_none() {
            return Err(DbError::not_found("Product", id));
        }

        let entries = sqlx::query_as::<_, SalesHistoryEntry>(
            r#"
            SELECT
                t.id AS transaction_id,
                t.transaction_number,
                t.customer_name,
                ti.quantity,
                ti.price_cents,
                ti.total_cents,
                t.created_at AS sale_date,
                t.status
            FROM transaction_items ti
            JOIN transactions t ON t.id = ti.transaction_id
            WHERE ti.product_id = ?1
            ORDER BY t.created_at DESC, ti.rowid DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ProductSalesHistory::from_entries(entries))
    }

    /// Counts products (for diagnostics and the seed binary).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level helpers (run inside a caller's transaction)
// =============================================================================

pub(crate) async fn fetch_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// Moves stock by `delta` (negative for sales), clamped at zero.
pub(crate) async fn adjust_stock(conn: &mut SqliteConnection, id: &str, delta: i64) -> DbResult<()> {
    debug!(id = %id, delta, "Adjusting stock");

    sqlx::query(
        r#"
        UPDATE products
        SET quantity = MAX(0, quantity + ?2),
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(delta)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_product(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO products (
            id, name, description, sku, barcode, category,
            price_cents, cost_cents, currency, supplier_id,
            quantity, min_quantity, is_active, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14, ?15
        )
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(&product.sku)
    .bind(&product.barcode)
    .bind(&product.category)
    .bind(product.price_cents)
    .bind(product.cost_cents)
    .bind(product.currency)
    .bind(&product.supplier_id)
    .bind(product.quantity)
    .bind(product.min_quantity)
    .bind(product.is_active)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::memory_db;
    use defter_core::{Currency, NewSupplier};

    fn new_product(name: &str) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price_cents: 1_500,
            quantity: Some(10),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_applies_defaults() {
        let db = memory_db().await;

        let product = db.products().create(new_product("Tea Glass")).await.unwrap();

        assert_eq!(product.min_quantity, DEFAULT_MIN_QUANTITY);
        assert_eq!(product.currency, Currency::Try);
        assert!(product.is_active);
        assert!(product.sku.starts_with("TEA-"));

        let fetched = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.sku, product.sku);
        assert_eq!(fetched.quantity, 10);
    }

    #[tokio::test]
    async fn test_supplier_sku_sequence() {
        let db = memory_db().await;
        let supplier = db
            .suppliers()
            .create(NewSupplier {
                name: "Anadolu Toptan".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let mut input = new_product("Sugar");
        input.supplier_id = Some(supplier.id.clone());
        let first = db.products().create(input.clone()).await.unwrap();
        let second = db.products().create(input).await.unwrap();

        assert_eq!(first.sku, format!("{}-001", supplier.supplier_code));
        assert_eq!(second.sku, format!("{}-002", supplier.supplier_code));
    }

    #[tokio::test]
    async fn test_unknown_supplier_is_not_found() {
        let db = memory_db().await;
        let mut input = new_product("Sugar");
        input.supplier_id = Some("missing".to_string());

        let err = db.products().create(input).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Supplier"));
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = memory_db().await;
        let mut input = new_product("Coffee");
        input.sku = Some("COF-1".to_string());
        db.products().create(input.clone()).await.unwrap();

        let err = db.products().create(input).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, ref value } if field == "sku" && value == "COF-1"));
    }

    #[tokio::test]
    async fn test_search_and_barcode_lookup() {
        let db = memory_db().await;
        let mut tea = new_product("Black Tea");
        tea.barcode = Some("8690000000011".to_string());
        tea.sku = Some("TEA-BLK".to_string());
        db.products().create(tea).await.unwrap();
        db.products().create(new_product("Coffee")).await.unwrap();

        let found = db.products().list(Some("black")).await.unwrap();
        assert_eq!(found.len(), 1);

        let by_sku = db.products().list(Some("tea-blk")).await.unwrap();
        assert_eq!(by_sku.len(), 1);

        let all = db.products().list(None).await.unwrap();
        assert_eq!(all[0].name, "Coffee"); // newest first

        let scanned = db.products().get_by_barcode("8690000000011").await.unwrap();
        assert_eq!(scanned.unwrap().name, "Black Tea");

        let fallback = db.products().get_by_barcode("TEA-BLK").await.unwrap();
        assert_eq!(fallback.unwrap().name, "Black Tea");

        assert!(db.products().get_by_barcode("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_is_partial() {
        let db = memory_db().await;
        let product = db.products().create(new_product("Rice")).await.unwrap();

        let updated = db
            .products()
            .update(
                &product.id,
                ProductUpdate {
                    price_cents: Some(2_000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.price_cents, 2_000);
        assert_eq!(updated.name, "Rice");
        assert_eq!(updated.quantity, 10);

        let err = db
            .products()
            .update("missing", ProductUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_low_stock_and_delete() {
        let db = memory_db().await;
        let mut scarce = new_product("Saffron");
        scarce.quantity = Some(2);
        let scarce = db.products().create(scarce).await.unwrap();
        db.products().create(new_product("Flour")).await.unwrap();

        let low = db.products().low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, scarce.id);

        db.products().delete(&scarce.id).await.unwrap();
        assert!(db.products().get_by_id(&scarce.id).await.unwrap().is_none());
        assert!(matches!(
            db.products().delete(&scarce.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_adjust_stock_clamps_at_zero() {
        let db = memory_db().await;
        let product = db.products().create(new_product("Salt")).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        adjust_stock(&mut conn, &product.id, -25).await.unwrap();
        drop(conn);

        let after = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(after.quantity, 0);
    }

    #[tokio::test]
    async fn test_sales_history_of_unknown_product() {
        let db = memory_db().await;
        let err = db.products().sales_history("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
