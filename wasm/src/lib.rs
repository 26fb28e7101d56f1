//! WebAssembly module for the Gem Certificate Digitization Platform
//!
//! Provides client-side score previews: the same classifier and evaluator
//! the worker runs, loaded with the same configuration tables, so listings
//! tooling can preview a certificate's composite score before the gem is
//! digitized server-side. The worker remains the source of truth.

use wasm_bindgen::prelude::*;

use shared::{classify, evaluate, EngineTables, RawCertificateRecord};

/// Classify a free-text shape label into its canonical family key.
///
/// Returns the empty string when the label matches no rule.
#[wasm_bindgen]
pub fn classify_shape(label: &str) -> String {
    classify(label).map(|family| family.key().to_string()).unwrap_or_default()
}

/// Score previewer holding one loaded set of engine tables
#[wasm_bindgen]
pub struct ScorePreview {
    tables: EngineTables,
}

#[wasm_bindgen]
impl ScorePreview {
    /// Build a previewer from the two configuration JSON documents
    #[wasm_bindgen(constructor)]
    pub fn new(requirements_json: &str, characteristics_json: &str) -> Result<ScorePreview, JsValue> {
        let tables = EngineTables::from_json(requirements_json, characteristics_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid engine tables: {}", e)))?;
        Ok(ScorePreview { tables })
    }

    /// Evaluate a raw certificate record (JSON) and return the score record
    /// as JSON. A shape that cannot be classified returns the engine's
    /// status message as an error.
    pub fn evaluate_record(&self, record_json: &str) -> Result<String, JsValue> {
        let record: RawCertificateRecord = serde_json::from_str(record_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid record JSON: {}", e)))?;

        let evaluation = evaluate(&self.tables, &record, None)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        serde_json::to_string(&evaluation.scores)
            .map_err(|e| JsValue::from_str(&format!("Serialization failed: {}", e)))
    }

    /// Composite percentage alone, for quick listing badges
    pub fn composite_score(&self, record_json: &str) -> Result<String, JsValue> {
        let record: RawCertificateRecord = serde_json::from_str(record_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid record JSON: {}", e)))?;

        let evaluation = evaluate(&self.tables, &record, None)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        Ok(evaluation.scores.digisation_score)
    }
}
