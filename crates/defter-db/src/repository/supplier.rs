//! # Supplier Repository
//!
//! Database operations for suppliers.
//!
//! Deleting a supplier removes its products in the same transaction, so a
//! supplier never leaves orphaned stock behind.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::{MAX_GENERATED_ID_ATTEMPTS, begin_write, like_pattern, new_id};
use defter_core::numbering::supplier_code;
use defter_core::validation::Validate;
use defter_core::{CoreError, NewSupplier, Product, Supplier, SupplierUpdate};

const SUPPLIER_COLUMNS: &str = r#"
    id, supplier_code, name, contact_person, email, phone,
    address, tax_number, payment_terms, is_active, created_at, updated_at
"#;

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Lists suppliers, newest first, optionally filtered by name.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<Supplier>> {
        let suppliers = match search {
            Some(term) => {
                let sql = format!(
                    r#"
                    SELECT {SUPPLIER_COLUMNS} FROM suppliers
                    WHERE LOWER(name) LIKE ?1 ESCAPE '\'
                    ORDER BY created_at DESC, rowid DESC
                    "#
                );
                sqlx::query_as::<_, Supplier>(&sql)
                    .bind(like_pattern(term))
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {SUPPLIER_COLUMNS} FROM suppliers ORDER BY created_at DESC, rowid DESC"
                );
                sqlx::query_as::<_, Supplier>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(suppliers)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let mut conn = self.pool.acquire().await?;
        fetch_supplier(&mut conn, id).await
    }

    /// Creates a supplier, generating `SUP-NNN` when no code was sent.
    pub async fn create(&self, input: NewSupplier) -> DbResult<Supplier> {
        input.validate().map_err(CoreError::from)?;

        let mut tx = begin_write(&self.pool).await?;

        let now = Utc::now();
        let mut supplier = Supplier {
            id: new_id(),
            supplier_code: String::new(),
            name: input.name.trim().to_string(),
            contact_person: input.contact_person,
            email: input.email,
            phone: input.phone,
            address: input.address,
            tax_number: input.tax_number,
            payment_terms: input.payment_terms,
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        match input.supplier_code {
            Some(code) => {
                supplier.supplier_code = code.trim().to_string();
                insert_supplier(&mut tx, &supplier)
                    .await
                    .map_err(|e| e.with_duplicate_value("supplier_code", &supplier.supplier_code))?;
            }
            None => {
                let mut existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suppliers")
                    .fetch_one(&mut *tx)
                    .await?;
                supplier.supplier_code = supplier_code(existing);

                let mut attempt = 1;
                loop {
                    match insert_supplier(&mut tx, &supplier).await {
                        Ok(()) => break,
                        Err(e)
                            if e.is_unique_violation_on("supplier_code")
                                && attempt < MAX_GENERATED_ID_ATTEMPTS =>
                        {
                            warn!(code = %supplier.supplier_code, attempt, "Supplier code taken, retrying");
                            attempt += 1;
                            existing += 1;
                            supplier.supplier_code = supplier_code(existing);
                        }
                        Err(e) => {
                            return Err(e.with_duplicate_value("supplier_code", &supplier.supplier_code))
                        }
                    }
                }
            }
        }

        tx.commit().await?;

        info!(id = %supplier.id, code = %supplier.supplier_code, "Supplier created");
        Ok(supplier)
    }

    /// Applies a partial update.
    pub async fn update(&self, id: &str, input: SupplierUpdate) -> DbResult<Supplier> {
        input.validate().map_err(CoreError::from)?;
        debug!(id = %id, "Updating supplier");

        let mut tx = begin_write(&self.pool).await?;

        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                supplier_code = COALESCE(?2, supplier_code),
                name = COALESCE(?3, name),
                contact_person = COALESCE(?4, contact_person),
                email = COALESCE(?5, email),
                phone = COALESCE(?6, phone),
                address = COALESCE(?7, address),
                tax_number = COALESCE(?8, tax_number),
                payment_terms = COALESCE(?9, payment_terms),
                is_active = COALESCE(?10, is_active),
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.supplier_code.as_deref().map(str::trim))
        .bind(input.name.as_deref().map(str::trim))
        .bind(input.contact_person.as_deref())
        .bind(input.email.as_deref())
        .bind(input.phone.as_deref())
        .bind(input.address.as_deref())
        .bind(input.tax_number.as_deref())
        .bind(input.payment_terms.as_deref())
        .bind(input.is_active)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)
        .map_err(|e| match input.supplier_code.as_deref() {
            Some(code) => e.with_duplicate_value("supplier_code", code),
            None => e,
        })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        let supplier = fetch_supplier(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))?;

        tx.commit().await?;
        Ok(supplier)
    }

    /// Deletes a supplier together with all of its products.
    ///
    /// ```text
    /// BEGIN IMMEDIATE
    ///   DELETE FROM products  WHERE supplier_id = ?   (N rows)
    ///   DELETE FROM suppliers WHERE id = ?            (must be 1 row)
    /// COMMIT                                          (or rollback: nothing changes)
    /// ```
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        let products = sqlx::query("DELETE FROM products WHERE supplier_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        tx.commit().await?;

        info!(id = %id, products_removed = products.rows_affected(), "Supplier deleted");
        Ok(())
    }

    /// Active products of a supplier, newest first.
    ///
    /// An unknown supplier simply has no products.
    pub async fn products(&self, supplier_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, name, description, sku, barcode, category,
                price_cents, cost_cents, currency, supplier_id,
                quantity, min_quantity, is_active, created_at, updated_at
            FROM products
            WHERE supplier_id = ?1 AND is_active = 1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(supplier_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM suppliers")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn fetch_supplier(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Supplier>> {
    let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ?1");
    let supplier = sqlx::query_as::<_, Supplier>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(supplier)
}

async fn insert_supplier(conn: &mut SqliteConnection, supplier: &Supplier) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO suppliers (
            id, supplier_code, name, contact_person, email, phone,
            address, tax_number, payment_terms, is_active, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11, ?12
        )
        "#,
    )
    .bind(&supplier.id)
    .bind(&supplier.supplier_code)
    .bind(&supplier.name)
    .bind(&supplier.contact_person)
    .bind(&supplier.email)
    .bind(&supplier.phone)
    .bind(&supplier.address)
    .bind(&supplier.tax_number)
    .bind(&supplier.payment_terms)
    .bind(supplier.is_active)
    .bind(supplier.created_at)
    .bind(supplier.updated_at)
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
    use defter_core::NewProduct;

    fn new_supplier(name: &str) -> NewSupplier {
        NewSupplier {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_generated_codes_are_sequential() {
        let db = memory_db().await;

        let first = db.suppliers().create(new_supplier("Anadolu")).await.unwrap();
        let second = db.suppliers().create(new_supplier("Ege")).await.unwrap();

        assert_eq!(first.supplier_code, "SUP-001");
        assert_eq!(second.supplier_code, "SUP-002");
    }

    #[tokio::test]
    async fn test_generated_code_skips_taken_codes() {
        let db = memory_db().await;
        let mut manual = new_supplier("Manual");
        manual.supplier_code = Some("SUP-002".to_string());
        db.suppliers().create(manual).await.unwrap();

        // count = 1 → SUP-002 is taken → SUP-003
        let generated = db.suppliers().create(new_supplier("Generated")).await.unwrap();
        assert_eq!(generated.supplier_code, "SUP-003");
    }

    #[tokio::test]
    async fn test_search_by_name() {
        let db = memory_db().await;
        db.suppliers().create(new_supplier("Anadolu Gıda")).await.unwrap();
        db.suppliers().create(new_supplier("Marmara Kağıt")).await.unwrap();

        let found = db.suppliers().list(Some("ANADOLU")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(db.suppliers().list(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_not_found() {
        let db = memory_db().await;
        let supplier = db.suppliers().create(new_supplier("Ege")).await.unwrap();

        let updated = db
            .suppliers()
            .update(
                &supplier.id,
                SupplierUpdate {
                    phone: Some("0232 000 00 00".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.phone.as_deref(), Some("0232 000 00 00"));
        assert_eq!(updated.name, "Ege");

        let err = db
            .suppliers()
            .update("missing", SupplierUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_products() {
        let db = memory_db().await;
        let supplier = db.suppliers().create(new_supplier("Anadolu")).await.unwrap();
        let other = db.suppliers().create(new_supplier("Ege")).await.unwrap();

        for (name, owner) in [("Flour", &supplier), ("Sugar", &supplier), ("Oil", &other)] {
            db.products()
                .create(NewProduct {
                    name: name.to_string(),
                    price_cents: 100,
                    supplier_id: Some(owner.id.clone()),
                    ..Default::default()
                })
                .await
                .unwrap();
        }
        assert_eq!(db.suppliers().products(&supplier.id).await.unwrap().len(), 2);

        db.suppliers().delete(&supplier.id).await.unwrap();

        assert!(db.suppliers().get_by_id(&supplier.id).await.unwrap().is_none());
        assert!(db.suppliers().products(&supplier.id).await.unwrap().is_empty());
        assert_eq!(db.products().count().await.unwrap(), 1);

        let err = db.suppliers().delete(&supplier.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
