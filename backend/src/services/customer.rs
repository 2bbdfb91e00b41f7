//! Customer registry service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::models::FiscalCondition;
use shared::validation::{validate_argentine_phone, validate_cuit, validate_email};

/// Customer registry service
#[derive(Clone)]
pub struct CustomerService {
    db: PgPool,
}

/// Input for creating a customer
#[derive(Debug, Deserialize)]
pub struct CreateCustomerInput {
    pub name: String,
    pub cuit: Option<String>,
    pub fiscal_condition: FiscalCondition,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Input for updating a customer (all fields optional)
#[derive(Debug, Deserialize)]
pub struct UpdateCustomerInput {
    pub name: Option<String>,
    pub cuit: Option<String>,
    pub fiscal_condition: Option<FiscalCondition>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Customer record returned to clients
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CustomerRecord {
    pub id: Uuid,
    pub name: String,
    pub cuit: Option<String>,
    pub fiscal_condition: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const CUSTOMER_COLUMNS: &str = "id, name, cuit, fiscal_condition, email, phone, address, \
                                is_active, created_at, updated_at";

fn check_contact_fields(
    cuit: Option<&str>,
    email: Option<&str>,
    phone: Option<&str>,
) -> AppResult<()> {
    if let Some(cuit) = cuit {
        validate_cuit(cuit).map_err(|msg| AppError::Validation {
            field: "cuit".to_string(),
            message: msg.to_string(),
            message_es: "El CUIT es inválido".to_string(),
        })?;
    }
    if let Some(email) = email {
        validate_email(email).map_err(|msg| AppError::Validation {
            field: "email".to_string(),
            message: msg.to_string(),
            message_es: "Correo electrónico inválido".to_string(),
        })?;
    }
    if let Some(phone) = phone {
        validate_argentine_phone(phone).map_err(|msg| AppError::Validation {
            field: "phone".to_string(),
            message: msg.to_string(),
            message_es: "El teléfono es inválido".to_string(),
        })?;
    }
    Ok(())
}

impl CustomerService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a customer
    pub async fn create_customer(&self, input: CreateCustomerInput) -> AppResult<CustomerRecord> {
        check_contact_fields(
            input.cuit.as_deref(),
            input.email.as_deref(),
            input.phone.as_deref(),
        )?;

        if let Some(cuit) = &input.cuit {
            let existing = sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM customers WHERE cuit = $1",
            )
            .bind(cuit)
            .fetch_one(&self.db)
            .await?;

            if existing > 0 {
                return Err(AppError::DuplicateEntry("cuit".to_string()));
            }
        }

        let customer = sqlx::query_as::<_, CustomerRecord>(&format!(
            r#"
            INSERT INTO customers (name, cuit, fiscal_condition, email, phone, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CUSTOMER_COLUMNS}
            "#,
        ))
        .bind(&input.name)
        .bind(&input.cuit)
        .bind(input.fiscal_condition.as_str())
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .fetch_one(&self.db)
        .await?;

        Ok(customer)
    }

    /// Update a customer
    pub async fn update_customer(
        &self,
        customer_id: Uuid,
        input: UpdateCustomerInput,
    ) -> AppResult<CustomerRecord> {
        check_contact_fields(
            input.cuit.as_deref(),
            input.email.as_deref(),
            input.phone.as_deref(),
        )?;

        let customer = sqlx::query_as::<_, CustomerRecord>(&format!(
            r#"
            UPDATE customers
            SET name = COALESCE($2, name),
                cuit = COALESCE($3, cuit),
                fiscal_condition = COALESCE($4, fiscal_condition),
                email = COALESCE($5, email),
                phone = COALESCE($6, phone),
                address = COALESCE($7, address),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#,
        ))
        .bind(customer_id)
        .bind(&input.name)
        .bind(&input.cuit)
        .bind(input.fiscal_condition.map(|f| f.as_str()))
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        Ok(customer)
    }

    /// Soft-delete a customer; their order history stays intact
    pub async fn deactivate_customer(&self, customer_id: Uuid) -> AppResult<CustomerRecord> {
        let customer = sqlx::query_as::<_, CustomerRecord>(&format!(
            r#"
            UPDATE customers
            SET is_active = false, updated_at = NOW()
            WHERE id = $1
            RETURNING {CUSTOMER_COLUMNS}
            "#,
        ))
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        Ok(customer)
    }

    /// List customers, optionally including deactivated ones
    pub async fn list_customers(&self, include_inactive: bool) -> AppResult<Vec<CustomerRecord>> {
        let customers = sqlx::query_as::<_, CustomerRecord>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE is_active = true OR $1
            ORDER BY name
            "#,
        ))
        .bind(include_inactive)
        .fetch_all(&self.db)
        .await?;

        Ok(customers)
    }

    /// Get a single customer by id
    pub async fn get_customer(&self, customer_id: Uuid) -> AppResult<CustomerRecord> {
        let customer = sqlx::query_as::<_, CustomerRecord>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1",
        ))
        .bind(customer_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Customer".to_string()))?;

        Ok(customer)
    }
}
