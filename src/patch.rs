//! JSON Patch - modifiche parziali sui campi di un DTO
//!
//! Un `PatchDocument` è una lista ordinata di operazioni RFC 6902
//! (`add`, `remove`, `replace`, `move`, `copy`, `test`) che puntano ai campi
//! di primo livello di un DTO. L'applicazione lavora sulla rappresentazione
//! JSON del DTO: ogni operazione viene verificata deserializzando il risultato,
//! così un valore del tipo sbagliato viene scartato e segnalato.
//! Gli errori non interrompono il documento: vengono raccolti tutti.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PatchError {
    #[error("the target location '{0}' was not found")]
    UnknownPath(String),

    #[error("the value for '{path}' is invalid: {reason}")]
    InvalidValue { path: String, reason: String },

    #[error("the current value at '{path}' is not equal to the test value")]
    TestFailed { path: String },

    #[error("the patch target is not a JSON object")]
    NotAnObject,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct PatchDocument(Vec<PatchOperation>);

impl PatchDocument {
    pub fn new(operations: Vec<PatchOperation>) -> Self {
        Self(operations)
    }

    pub fn operations(&self) -> &[PatchOperation] {
        &self.0
    }

    /// Applica le operazioni, in ordine, a una copia di `target`.
    ///
    /// `remove` riporta il campo al valore di `D::default()`.
    ///
    /// # Returns
    /// * `Ok(D)` - Il DTO modificato
    /// * `Err(Vec<PatchError>)` - Tutti gli errori strutturali incontrati
    pub fn apply_to<D>(&self, target: &D) -> Result<D, Vec<PatchError>>
    where
        D: Serialize + DeserializeOwned + Default,
    {
        let mut document = as_object(target).ok_or_else(|| vec![PatchError::NotAnObject])?;
        let defaults = as_object(&D::default()).ok_or_else(|| vec![PatchError::NotAnObject])?;

        let errors: Vec<PatchError> = self
            .0
            .iter()
            .filter_map(|operation| apply_operation::<D>(&mut document, &defaults, operation).err())
            .collect();
        if !errors.is_empty() {
            return Err(errors);
        }

        serde_json::from_value(Value::Object(document)).map_err(|e| {
            vec![PatchError::InvalidValue {
                path: "/".to_string(),
                reason: e.to_string(),
            }]
        })
    }
}

fn as_object<D: Serialize>(value: &D) -> Option<Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn apply_operation<D: DeserializeOwned>(
    document: &mut Map<String, Value>,
    defaults: &Map<String, Value>,
    operation: &PatchOperation,
) -> Result<(), PatchError> {
    match operation {
        // su un campo di un oggetto add e replace coincidono
        PatchOperation::Add { path, value } | PatchOperation::Replace { path, value } => {
            let field = resolve(document, path)?;
            write_checked::<D>(document, vec![(field, value.clone())], path)
        }
        PatchOperation::Remove { path } => {
            let field = resolve(document, path)?;
            let reset = default_of(defaults, &field);
            write_checked::<D>(document, vec![(field, reset)], path)
        }
        PatchOperation::Move { from, path } => {
            let source = resolve(document, from)?;
            let target = resolve(document, path)?;
            if source == target {
                return Ok(());
            }
            let value = current_of(document, &source);
            let reset = default_of(defaults, &source);
            write_checked::<D>(document, vec![(source, reset), (target, value)], path)
        }
        PatchOperation::Copy { from, path } => {
            let source = resolve(document, from)?;
            let target = resolve(document, path)?;
            let value = current_of(document, &source);
            write_checked::<D>(document, vec![(target, value)], path)
        }
        PatchOperation::Test { path, value } => {
            let field = resolve(document, path)?;
            if values_equal(&current_of(document, &field), value) {
                Ok(())
            } else {
                Err(PatchError::TestFailed { path: path.clone() })
            }
        }
    }
}

/// Risolve un JSON pointer di un solo segmento nel nome del campo.
/// Il confronto ignora maiuscole e minuscole.
fn resolve(document: &Map<String, Value>, path: &str) -> Result<String, PatchError> {
    let unknown = || PatchError::UnknownPath(path.to_string());

    let segment = path.strip_prefix('/').ok_or_else(unknown)?;
    if segment.is_empty() || segment.contains('/') {
        return Err(unknown());
    }
    let segment = segment.replace("~1", "/").replace("~0", "~");

    document
        .keys()
        .find(|key| key.eq_ignore_ascii_case(&segment))
        .cloned()
        .ok_or_else(unknown)
}

/// Scrive i valori solo se il documento risultante è ancora un `D` valido.
fn write_checked<D: DeserializeOwned>(
    document: &mut Map<String, Value>,
    writes: Vec<(String, Value)>,
    path: &str,
) -> Result<(), PatchError> {
    let mut candidate = document.clone();
    for (field, value) in writes {
        candidate.insert(field, value);
    }

    serde_json::from_value::<D>(Value::Object(candidate.clone())).map_err(|e| {
        PatchError::InvalidValue {
            path: path.to_string(),
            reason: e.to_string(),
        }
    })?;

    *document = candidate;
    Ok(())
}

fn current_of(document: &Map<String, Value>, field: &str) -> Value {
    document.get(field).cloned().unwrap_or(Value::Null)
}

fn default_of(defaults: &Map<String, Value>, field: &str) -> Value {
    defaults.get(field).cloned().unwrap_or(Value::Null)
}

fn values_equal(current: &Value, expected: &Value) -> bool {
    match (current, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => current == expected,
    }
}
