//! CSV rendering of export rows
//!
//! One physical line per (survey, question) pair. Survey-level fields repeat
//! on every line so each line stands alone in a spreadsheet. Every field is
//! wrapped in double quotes with internal quotes doubled.

use crate::store::ExportRow;

/// Fixed column order
pub const CSV_COLUMNS: [&str; 9] = [
    "survey_id",
    "patient_id",
    "study_id",
    "completed_at",
    "status",
    "question_id",
    "question",
    "answer",
    "response_type",
];

/// Quotes one field.
pub fn escape_field(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn render_line<'a>(fields: impl IntoIterator<Item = &'a str>, out: &mut String) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        out.push_str(&escape_field(field));
    }
    out.push_str("\r\n");
}

/// Header line
pub fn render_header() -> String {
    let mut out = String::new();
    render_line(CSV_COLUMNS, &mut out);
    out
}

/// Appends one line per row
pub fn render_rows(rows: &[ExportRow], out: &mut String) {
    for row in rows {
        let question_id = row.question_id.to_string();
        let answer = row.answer.to_cell();
        render_line(
            [
                row.survey_id.as_str(),
                row.patient_id.as_str(),
                row.study_id.as_str(),
                row.completed_at.as_str(),
                row.status.as_str(),
                question_id.as_str(),
                row.question.as_str(),
                answer.as_str(),
                row.response_type.as_str(),
            ],
            out,
        );
    }
}

/// Header plus every row in one string
pub fn render(rows: &[ExportRow]) -> String {
    let mut out = render_header();
    render_rows(rows, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Answer, ResponseType, SurveyStatus};
    use serde_json::json;

    fn row(question_id: u32, answer: Answer, response_type: ResponseType) -> ExportRow {
        ExportRow {
            survey_id: "abc".into(),
            patient_id: "P1".into(),
            study_id: "S1".into(),
            completed_at: "2024-03-01T08:15:00.000Z".into(),
            status: SurveyStatus::Completed,
            question_id,
            question: "Which apply?".into(),
            answer,
            response_type,
        }
    }

    #[test]
    fn test_escape_doubles_quotes() {
        assert_eq!(escape_field(r#"say "hi""#), r#""say ""hi""""#);
        assert_eq!(escape_field("a,b"), r#""a,b""#);
        assert_eq!(escape_field(""), r#""""#);
    }

    #[test]
    fn test_header_column_order() {
        assert_eq!(
            render_header(),
            "\"survey_id\",\"patient_id\",\"study_id\",\"completed_at\",\"status\",\"question_id\",\"question\",\"answer\",\"response_type\"\r\n"
        );
    }

    #[test]
    fn test_list_answer_stays_in_one_cell() {
        let rows = vec![row(3, Answer::List(vec![json!("a"), json!("b")]), ResponseType::Checkbox)];
        let csv = render(&rows);
        let line = csv.lines().nth(1).unwrap();

        assert!(line.contains(r#""[""a"",""b""]""#));
        assert!(line.ends_with(r#""checkbox""#));
    }

    #[test]
    fn test_one_line_per_response() {
        let rows = vec![
            row(1, Answer::Text("fine".into()), ResponseType::Text),
            row(2, Answer::Boolean(false), ResponseType::Boolean),
            row(3, Answer::Number(7u32.into()), ResponseType::Scale),
        ];
        let csv = render(&rows);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[2].contains(r#""2","Which apply?","false","boolean""#));
        assert!(lines[3].contains(r#""7","scale""#));
        assert!(lines.iter().skip(1).all(|l| l.starts_with(r#""abc","P1","S1""#)));
    }
}
