//! Text composition: one embeddable string per course.
//!
//! Fields are joined with a single space in the configured order. An absent
//! field contributes an empty string, so its separator is still emitted and
//! field positions stay aligned across records.
//!
//! ```text
//! fields = [Name, Description, Prerequisites, Department]
//! record = { Name: "Intro to AI", Department: "CISE" }
//! output = "Intro to AI   CISE"
//! ```

use crate::models::{CourseCorpus, CourseField, CourseRecord};

/// Build the composed text for a single record.
pub fn compose(record: &CourseRecord, fields: &[CourseField]) -> String {
    let mut out = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        if let Some(value) = record.field(*field) {
            out.push_str(value);
        }
    }
    out
}

/// Compose every record of the corpus, preserving corpus order.
pub fn compose_all(corpus: &CourseCorpus, fields: &[CourseField]) -> Vec<String> {
    corpus.iter().map(|r| compose(r, fields)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_record() -> CourseRecord {
        CourseRecord::new("CS101", "Intro to Programming")
            .with_description("Variables, loops, and functions in Python.")
            .with_prerequisites("None")
            .with_department("CISE")
    }

    #[test]
    fn test_compose_full_record() {
        let text = compose(&full_record(), &CourseField::default_text_fields());
        assert_eq!(
            text,
            "Intro to Programming Variables, loops, and functions in Python. None CISE"
        );
    }

    #[test]
    fn test_compose_is_deterministic() {
        let fields = CourseField::default_text_fields();
        let r = full_record();
        assert_eq!(compose(&r, &fields), compose(&r.clone(), &fields));
    }

    #[test]
    fn test_missing_fields_keep_separators() {
        let r = CourseRecord::new("ENG100", "Writing").with_department("English");
        let text = compose(&r, &CourseField::default_text_fields());
        assert_eq!(text, "Writing   English");
    }

    #[test]
    fn test_all_fields_absent_yields_spaces() {
        let r = CourseRecord::new("X1", "Anything");
        let fields = [
            CourseField::Description,
            CourseField::Prerequisites,
            CourseField::Department,
        ];
        let text = compose(&r, &fields);
        assert_eq!(text, "  ");
        assert!(text.chars().all(|c| c == ' '));
    }

    #[test]
    fn test_field_order_is_respected() {
        let r = full_record();
        let text = compose(&r, &[CourseField::Department, CourseField::Code]);
        assert_eq!(text, "CISE CS101");
    }

    #[test]
    fn test_empty_field_list() {
        assert_eq!(compose(&full_record(), &[]), "");
    }

    #[test]
    fn test_compose_all_preserves_order() {
        let corpus = CourseCorpus::new(vec![
            CourseRecord::new("A", "Alpha"),
            CourseRecord::new("B", "Beta"),
        ]);
        let texts = compose_all(&corpus, &[CourseField::Code, CourseField::Name]);
        assert_eq!(texts, vec!["A Alpha".to_string(), "B Beta".to_string()]);
    }
}
