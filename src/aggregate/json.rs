//! JSON rendering of export rows
//!
//! Rows are flat objects keyed like the CSV columns. The answer keeps its
//! native JSON shape.

use serde_json::{json, Value};

use crate::store::ExportRow;

/// One denormalized row object
pub fn row_to_json(row: &ExportRow) -> Value {
    json!({
        "survey_id": row.survey_id,
        "patient_id": row.patient_id,
        "study_id": row.study_id,
        "completed_at": row.completed_at,
        "status": row.status.as_str(),
        "question_id": row.question_id,
        "question": row.question,
        "answer": row.answer.to_json(),
        "response_type": row.response_type.as_str(),
    })
}

/// The whole export as one array value
pub fn render(rows: &[ExportRow]) -> Value {
    Value::Array(rows.iter().map(row_to_json).collect())
}

/// Writes array elements incrementally so a large export can be sent in
/// pieces while the concatenated output stays one valid array.
#[derive(Debug, Default)]
pub struct JsonArrayWriter {
    written: usize,
}

impl JsonArrayWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) -> String {
        "[".to_string()
    }

    /// Appends elements, separated from anything written earlier.
    pub fn push_rows(&mut self, rows: &[ExportRow], out: &mut String) {
        for row in rows {
            if self.written > 0 {
                out.push(',');
            }
            out.push_str(&row_to_json(row).to_string());
            self.written += 1;
        }
    }

    pub fn close(&self) -> String {
        "]".to_string()
    }

    /// Elements written so far
    pub fn written(&self) -> usize {
        self.written
    }
}
