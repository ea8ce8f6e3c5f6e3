//! Product, category and supplier models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{FormType, StorageTemperature};

selection! {
    /// Criticality of the products of a category
    #[derive(Default)]
    pub enum CriticalLevel {
        #[default]
        Furniture => ("furniture", "Office Furniture"),
        LessCritical => ("less_critical", "Less Critical"),
        Intermediary => ("intermediary", "Intermediary"),
        Critical => ("critical", "Critical"),
        Femoral => ("femoral", "Femoral Head"),
    }
}

impl CriticalLevel {
    /// Lots of this level must get an R&R form once received
    pub fn requires_form(&self) -> bool {
        !matches!(self, CriticalLevel::Furniture)
    }

    /// Lots of this level can be selected when creating a form of the given type
    pub fn accepts(&self, form_type: FormType) -> bool {
        match form_type {
            FormType::RcWithoutQc => matches!(
                self,
                CriticalLevel::Furniture | CriticalLevel::LessCritical | CriticalLevel::Intermediary
            ),
            FormType::RcWithQc => *self == CriticalLevel::Critical,
            FormType::QcResult => false,
        }
    }
}

/// Product category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: Uuid,
    pub name: String,
    pub critical_level: CriticalLevel,
}

/// Vendor reference of a product
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplierInfo {
    pub partner_id: Uuid,
    pub product_code: Option<String>,
}

/// A product that can be received in lots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    /// Internal reference
    pub default_code: Option<String>,
    pub category_id: Uuid,
    pub specification_ref: Option<String>,
    pub storage_temperature: Option<StorageTemperature>,
    pub manual_temperature: Option<String>,
    pub sellers: Vec<SupplierInfo>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Product code used by the given vendor, empty when unknown
    pub fn seller_product_code(&self, partner_id: Option<Uuid>) -> String {
        let Some(partner_id) = partner_id else {
            return String::new();
        };
        self.sellers
            .iter()
            .filter(|s| s.partner_id == partner_id)
            .find_map(|s| s.product_code.clone().filter(|c| !c.is_empty()))
            .unwrap_or_default()
    }
}
