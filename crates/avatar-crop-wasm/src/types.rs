//! Conversions between JavaScript values and core types.

use avatar_crop_core::{CropSelection, CropperConfig, LoadOutcome};
use wasm_bindgen::prelude::*;

/// Parse an optional config object.
///
/// `undefined` and `null` give the defaults; missing fields are filled in
/// from the defaults as well.
pub(crate) fn parse_config(value: JsValue) -> Result<CropperConfig, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(CropperConfig::default());
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("Invalid cropper config: {}", e)))
}

/// Selection as a plain object: `{ center_x, center_y, size, scale }`.
pub(crate) fn selection_to_js(selection: &CropSelection) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(selection).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Name reported to JavaScript for a decode outcome.
pub(crate) fn outcome_name(outcome: LoadOutcome) -> &'static str {
    match outcome {
        LoadOutcome::Ready => "ready",
        LoadOutcome::Failed => "failed",
        LoadOutcome::Stale => "stale",
    }
}

pub(crate) fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_names() {
        assert_eq!(outcome_name(LoadOutcome::Ready), "ready");
        assert_eq!(outcome_name(LoadOutcome::Failed), "failed");
        assert_eq!(outcome_name(LoadOutcome::Stale), "stale");
    }
}
