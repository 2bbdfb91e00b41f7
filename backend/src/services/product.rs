//! Product catalog service

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::validation::validate_product_code;

/// Product catalog service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    pub code: String,
    pub name: String,
    pub category: String,
    pub product_type: String,
    pub presentation: String,
    pub unit_price: Decimal,
    pub image_url: Option<String>,
}

/// Input for updating a product (all fields optional)
#[derive(Debug, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub product_type: Option<String>,
    pub presentation: Option<String>,
    pub unit_price: Option<Decimal>,
    pub image_url: Option<String>,
}

/// Product record returned to clients
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ProductRecord {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub category: String,
    pub product_type: String,
    pub presentation: String,
    pub unit_price: Decimal,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const PRODUCT_COLUMNS: &str = "id, code, name, category, product_type, presentation, \
                               unit_price, image_url, is_active, created_at, updated_at";

impl ProductService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a product in the catalog
    pub async fn create_product(&self, input: CreateProductInput) -> AppResult<ProductRecord> {
        validate_product_code(&input.code).map_err(|msg| AppError::Validation {
            field: "code".to_string(),
            message: msg.to_string(),
            message_es: "El código debe tener 3-12 caracteres en mayúsculas".to_string(),
        })?;

        if input.unit_price < Decimal::ZERO {
            return Err(AppError::Validation {
                field: "unit_price".to_string(),
                message: "Unit price cannot be negative".to_string(),
                message_es: "El precio unitario no puede ser negativo".to_string(),
            });
        }

        let existing = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM products WHERE code = $1",
        )
        .bind(&input.code)
        .fetch_one(&self.db)
        .await?;

        if existing > 0 {
            return Err(AppError::DuplicateEntry("code".to_string()));
        }

        let product = sqlx::query_as::<_, ProductRecord>(&format!(
            r#"
            INSERT INTO products (code, name, category, product_type, presentation, unit_price, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "#,
        ))
        .bind(&input.code)
        .bind(&input.name)
        .bind(&input.category)
        .bind(&input.product_type)
        .bind(&input.presentation)
        .bind(input.unit_price)
        .bind(&input.image_url)
        .fetch_one(&self.db)
        .await?;

        Ok(product)
    }

    /// Update a product; code is immutable once created
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<ProductRecord> {
        if let Some(price) = input.unit_price {
            if price < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "unit_price".to_string(),
                    message: "Unit price cannot be negative".to_string(),
                    message_es: "El precio unitario no puede ser negativo".to_string(),
                });
            }
        }

        let product = sqlx::query_as::<_, ProductRecord>(&format!(
            r#"
            UPDATE products
            SET name = COALESCE($2, name),
                category = COALESCE($3, category),
                product_type = COALESCE($4, product_type),
                presentation = COALESCE($5, presentation),
                unit_price = COALESCE($6, unit_price),
                image_url = COALESCE($7, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#,
        ))
        .bind(product_id)
        .bind(&input.name)
        .bind(&input.category)
        .bind(&input.product_type)
        .bind(&input.presentation)
        .bind(input.unit_price)
        .bind(&input.image_url)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(product)
    }

    /// Soft-delete a product; historical batches and orders keep referencing it
    pub async fn deactivate_product(&self, product_id: Uuid) -> AppResult<ProductRecord> {
        let product = sqlx::query_as::<_, ProductRecord>(&format!(
            r#"
            UPDATE products
            SET is_active = false, updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#,
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(product)
    }

    /// List products, optionally including deactivated ones
    pub async fn list_products(&self, include_inactive: bool) -> AppResult<Vec<ProductRecord>> {
        let products = sqlx::query_as::<_, ProductRecord>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active = true OR $1
            ORDER BY code
            "#,
        ))
        .bind(include_inactive)
        .fetch_all(&self.db)
        .await?;

        Ok(products)
    }

    /// Get a single product by id
    pub async fn get_product(&self, product_id: Uuid) -> AppResult<ProductRecord> {
        let product = sqlx::query_as::<_, ProductRecord>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1",
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        Ok(product)
    }
}
