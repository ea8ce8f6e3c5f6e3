//! HTTP request handlers

pub mod employee;
pub mod form_action;
pub mod health;
pub mod lot;
pub mod picking;
pub mod product;
pub mod quality_check;
pub mod reception_form;

pub use employee::*;
pub use form_action::*;
pub use health::*;
pub use lot::*;
pub use picking::*;
pub use product::*;
pub use quality_check::*;
pub use reception_form::*;
