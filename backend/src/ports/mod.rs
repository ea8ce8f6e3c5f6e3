//! Ports to the collaborators the services depend on

pub mod platform;
pub mod repository;

use std::sync::Arc;

pub use platform::*;
pub use repository::*;

/// Every collaborator a service may need, shared by all requests
#[derive(Clone)]
pub struct Ports {
    pub forms: Arc<dyn ReceptionFormRepository>,
    pub inventory: Arc<dyn InventoryRepository>,
    pub quality: Arc<dyn QualityRepository>,
    pub actions: Arc<dyn FormActionRepository>,
    pub employees: Arc<dyn EmployeeRepository>,
    pub sequences: Arc<dyn SequenceAllocator>,
    pub reports: Arc<dyn ReportRenderer>,
    pub chatter: Arc<dyn Chatter>,
    /// Web client URL used in notification links
    pub web_base_url: String,
}

impl Ports {
    /// Link to a lot in the web client
    pub fn lot_url(&self, lot_id: uuid::Uuid) -> String {
        format!("{}/lots/{}", self.web_base_url.trim_end_matches('/'), lot_id)
    }
}
