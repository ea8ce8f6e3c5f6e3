//! WebAssembly module for the Reception and Release web client
//!
//! Runs the form rules in the browser so the client reacts like the server:
//! - status transitions offered on a form
//! - fields cleared when their controlling field changes
//! - form eligibility and quantity checks

use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Serialize};
use std::str::FromStr;
use wasm_bindgen::prelude::*;

// Re-export shared types for use in JavaScript
pub use shared::lifecycle::*;
pub use shared::models::*;
pub use shared::onchange::*;
pub use shared::validation::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("reception-release rules loaded"));
}

fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, err))
}

fn parse<T: FromStr>(value: &str) -> Result<T, JsValue>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e| js_error("Invalid value", e))
}

/// Apply the clearing rules of `T` to a JSON record
fn cleared<T>(json: &str) -> Result<String, JsValue>
where
    T: ClearDependentFields + DeserializeOwned + Serialize,
{
    let mut record: T = serde_json::from_str(json).map_err(|e| js_error("Invalid JSON", e))?;
    record.clear_dependent_fields();
    serde_json::to_string(&record).map_err(|e| js_error("Serialization failed", e))
}

/// Status a form reaches through `transition`
/// (`confirm`, `send`, `sign`, `mark_to_close` or `close`)
#[wasm_bindgen]
pub fn next_form_status(
    form_type: &str,
    status: &str,
    transition: &str,
    notify: bool,
) -> Result<String, JsValue> {
    let transition = match transition {
        "confirm" => Transition::Confirm,
        "send" => Transition::Send { notify },
        "sign" => Transition::Sign,
        "mark_to_close" => Transition::MarkToClose,
        "close" => Transition::Close,
        other => return Err(js_error("Unknown transition", other)),
    };
    let next = next_status(parse(form_type)?, parse(status)?, transition)
        .map_err(|e| js_error("Transition refused", e))?;
    Ok(next.as_str().to_string())
}

/// Reception comment is still asked for
#[wasm_bindgen]
pub fn reception_comment_required(
    form_appendix: Option<String>,
    temperature_appendix: Option<String>,
    materials_conformity: Option<String>,
) -> Result<bool, JsValue> {
    Ok(reception_needs_explanation(
        form_appendix.as_deref().map(parse).transpose()?,
        temperature_appendix.as_deref().map(parse).transpose()?,
        materials_conformity.as_deref().map(parse).transpose()?,
    ))
}

#[wasm_bindgen]
pub fn clear_reception_fields(checklist_json: &str) -> Result<String, JsValue> {
    cleared::<ReceptionChecklist>(checklist_json)
}

#[wasm_bindgen]
pub fn clear_release_fields(release_json: &str) -> Result<String, JsValue> {
    cleared::<ReleaseDetails>(release_json)
}

#[wasm_bindgen]
pub fn clear_coa_fields(coa_json: &str) -> Result<String, JsValue> {
    cleared::<CoaSheet>(coa_json)
}

#[wasm_bindgen]
pub fn clear_qc_fields(measurements_json: &str) -> Result<String, JsValue> {
    cleared::<QcMeasurements>(measurements_json)
}

/// A lot of this critical level can get a form of this type
#[wasm_bindgen]
pub fn form_type_allowed(critical_level: &str, form_type: &str) -> Result<bool, JsValue> {
    let level: CriticalLevel = parse(critical_level)?;
    Ok(level.accepts(parse(form_type)?))
}

/// QC results cover the received quantity; quantities as decimal strings
#[wasm_bindgen]
pub fn tested_quantity_complete(total_tested: &str, product_qty: &str) -> Result<bool, JsValue> {
    let total = Decimal::from_str(total_tested).map_err(|e| js_error("Invalid quantity", e))?;
    let qty = Decimal::from_str(product_qty).map_err(|e| js_error("Invalid quantity", e))?;
    Ok(tested_quantity_reached(total, qty))
}

/// Message explaining why a trigram is refused, if it is
#[wasm_bindgen]
pub fn trigram_error(employee_name: &str, trigram: &str) -> Option<String> {
    validate_trigram(employee_name, Some(trigram)).err()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_form_status() {
        assert_eq!(
            next_form_status("rc_with_qc", "sent", "sign", false).unwrap(),
            "approved"
        );
        assert_eq!(
            next_form_status("qc_result", "confirmed", "send", true).unwrap(),
            "sent"
        );
        assert_eq!(
            next_form_status("rc_without_qc", "draft", "send", false).unwrap(),
            "confirmed"
        );
    }

    #[test]
    fn test_clear_reception_fields() {
        let json = r#"{
            "packaging_state": "good",
            "form_appendix": "done",
            "temperature_appendix": "not_applicable",
            "materials_conformity": "yes",
            "supplier_consistency": null,
            "items_consistency": null,
            "reception_comment": "stale",
            "arrival_date": null,
            "specification_reference": null,
            "expiration_date": null,
            "product_qty": "3"
        }"#;
        let cleared: ReceptionChecklist =
            serde_json::from_str(&clear_reception_fields(json).unwrap()).unwrap();
        assert_eq!(cleared.reception_comment, None);
        assert_eq!(cleared.product_qty, Decimal::from(3));
    }

    #[test]
    fn test_trigram_error() {
        assert!(trigram_error("Ada Lovelace", "ALO").is_none());
        assert!(trigram_error("Ada Lovelace", "A").is_some());
    }

    #[test]
    fn test_tested_quantity_complete() {
        assert!(tested_quantity_complete("10.0004", "10").unwrap());
        assert!(!tested_quantity_complete("9.5", "10").unwrap());
    }
}
