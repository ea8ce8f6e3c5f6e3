//! Products, with internal references allocated on creation

use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::{Product, StorageTemperature, SupplierInfo};
use crate::ports::{Ports, PRODUCT_CODE_SEQUENCE};

/// Input for creating a product
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,
    /// Left empty to allocate the next reference
    pub default_code: Option<String>,
    pub category_id: Uuid,
    pub specification_ref: Option<String>,
    pub storage_temperature: Option<StorageTemperature>,
    pub manual_temperature: Option<String>,
    #[serde(default)]
    pub sellers: Vec<SupplierInfo>,
}

#[derive(Clone)]
pub struct ProductService {
    ports: Ports,
}

impl ProductService {
    pub fn new(ports: Ports) -> Self {
        Self { ports }
    }

    pub async fn get(&self, product_id: Uuid) -> AppResult<Product> {
        self.ports
            .inventory
            .find_product(product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    /// Create a product; a missing internal reference comes from the sequence
    pub async fn create(&self, input: CreateProductInput) -> AppResult<Product> {
        input.validate()?;

        if self
            .ports
            .inventory
            .find_category(input.category_id)
            .await?
            .is_none()
        {
            return Err(AppError::validation("category_id", "Unknown product category"));
        }

        let default_code = match input.default_code.filter(|c| !c.trim().is_empty()) {
            Some(code) => code,
            None => self.ports.sequences.next_by_code(PRODUCT_CODE_SEQUENCE).await?,
        };

        let product = Product {
            id: Uuid::new_v4(),
            name: input.name,
            default_code: Some(default_code),
            category_id: input.category_id,
            specification_ref: input.specification_ref,
            storage_temperature: input.storage_temperature,
            manual_temperature: input.manual_temperature,
            sellers: input.sellers,
            created_at: Utc::now(),
        };
        self.ports.inventory.insert_product(&product).await?;

        tracing::info!(product = %product.name, default_code = ?product.default_code, "Product created");
        Ok(product)
    }
}
