use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn convert_target_json(project_json: &str, target_name: &str) -> Result<String, JsValue> {
    crate::convert_target_source(project_json, target_name)
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
