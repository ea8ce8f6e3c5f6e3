//! Domain models for the Reception and Release Management service

mod checklist;
mod employee;
mod form_action;
mod lot;
mod picking;
mod product;
mod quality;
mod reception_form;

pub use checklist::*;
pub use employee::*;
pub use form_action::*;
pub use lot::*;
pub use picking::*;
pub use product::*;
pub use quality::*;
pub use reception_form::*;
