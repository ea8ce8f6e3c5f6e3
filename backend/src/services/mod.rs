//! Business logic services for reception and release management

pub mod counters;
pub mod employee;
pub mod form_action;
pub mod form_wizard;
pub mod lot;
pub mod product;
pub mod quality_check;
pub mod reception_form;

pub use counters::CounterService;
pub use employee::EmployeeService;
pub use form_action::FormActionService;
pub use form_wizard::FormWizardService;
pub use lot::LotService;
pub use product::ProductService;
pub use quality_check::QualityCheckService;
pub use reception_form::ReceptionFormService;
