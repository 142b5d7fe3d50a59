//! Course catalog data model.
//!
//! These types represent the course records, corpus, and ranked results that
//! flow through composition, indexing, and query.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::AdvisorError;

/// A catalog column the engine knows about.
///
/// `Code` and `Name` are required in every catalog; the remaining fields are
/// optional and default to empty text when composed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CourseField {
    Code,
    Name,
    Description,
    Prerequisites,
    Department,
}

impl CourseField {
    /// Columns that must be present for a catalog to load.
    pub const REQUIRED: [CourseField; 2] = [CourseField::Code, CourseField::Name];

    /// Columns that enrich composition but may be absent.
    pub const OPTIONAL: [CourseField; 3] = [
        CourseField::Description,
        CourseField::Prerequisites,
        CourseField::Department,
    ];

    /// The column header used by the catalog dataset.
    pub fn column(&self) -> &'static str {
        match self {
            CourseField::Code => "Code",
            CourseField::Name => "Name",
            CourseField::Description => "Description",
            CourseField::Prerequisites => "Prerequisites",
            CourseField::Department => "Department",
        }
    }

    /// The default ordered field list used to build course text.
    pub fn default_text_fields() -> Vec<CourseField> {
        vec![
            CourseField::Name,
            CourseField::Description,
            CourseField::Prerequisites,
            CourseField::Department,
        ]
    }
}

impl fmt::Display for CourseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for CourseField {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Code" => Ok(CourseField::Code),
            "Name" => Ok(CourseField::Name),
            "Description" => Ok(CourseField::Description),
            "Prerequisites" => Ok(CourseField::Prerequisites),
            "Department" => Ok(CourseField::Department),
            other => Err(AdvisorError::Config(format!(
                "unknown course field '{}'. Expected one of: Code, Name, Description, Prerequisites, Department",
                other
            ))),
        }
    }
}

/// One row of the course catalog.
///
/// Optional fields are `None` when the column is absent from the catalog or
/// the cell is blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseRecord {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub prerequisites: Option<String>,
    pub department: Option<String>,
}

impl CourseRecord {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            description: None,
            prerequisites: None,
            department: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_blank(description.into());
        self
    }

    pub fn with_prerequisites(mut self, prerequisites: impl Into<String>) -> Self {
        self.prerequisites = non_blank(prerequisites.into());
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = non_blank(department.into());
        self
    }

    /// Value of `field` for this record, or `None` when absent.
    pub fn field(&self, field: CourseField) -> Option<&str> {
        match field {
            CourseField::Code => Some(self.code.as_str()),
            CourseField::Name => Some(self.name.as_str()),
            CourseField::Description => self.description.as_deref(),
            CourseField::Prerequisites => self.prerequisites.as_deref(),
            CourseField::Department => self.department.as_deref(),
        }
    }
}

/// Treat blank cells as missing values.
pub fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// The ordered set of courses loaded for one process lifetime.
///
/// Position in `records` is the join key with the composed text array and
/// the embedding matrix.
#[derive(Debug, Clone, Default)]
pub struct CourseCorpus {
    records: Vec<CourseRecord>,
    missing_columns: Vec<CourseField>,
}

impl CourseCorpus {
    pub fn new(records: Vec<CourseRecord>) -> Self {
        Self {
            records,
            missing_columns: Vec::new(),
        }
    }

    /// Record which optional columns the source did not provide.
    pub fn with_missing_columns(mut self, missing: Vec<CourseField>) -> Self {
        self.missing_columns = missing;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&CourseRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[CourseRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &CourseRecord> {
        self.records.iter()
    }

    /// Optional columns the source lacked. Non-empty means degraded mode.
    pub fn missing_columns(&self) -> &[CourseField] {
        &self.missing_columns
    }

    /// Records in corpus order, truncated at `limit`.
    ///
    /// `total` always reports the full corpus size.
    pub fn list(&self, limit: Option<usize>) -> CourseListing<'_> {
        let take = limit.unwrap_or(self.records.len()).min(self.records.len());
        CourseListing {
            courses: self.records[..take].iter().collect(),
            total: self.records.len(),
        }
    }
}

/// Result of [`CourseCorpus::list`].
#[derive(Debug, Clone)]
pub struct CourseListing<'a> {
    pub courses: Vec<&'a CourseRecord>,
    pub total: usize,
}

/// One ranked match.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    /// 1-based position in the ranking.
    pub rank: usize,
    /// Position of the record in the corpus.
    pub index: usize,
    /// Cosine similarity in `[-1.0, 1.0]`.
    pub score: f32,
    pub record: CourseRecord,
}

/// Ranked matches for one query, best first.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub query: String,
    pub hits: Vec<SearchHit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus_of(n: usize) -> CourseCorpus {
        CourseCorpus::new(
            (0..n)
                .map(|i| CourseRecord::new(format!("C{}", i), format!("Course {}", i)))
                .collect(),
        )
    }

    #[test]
    fn test_field_parse_roundtrip() {
        for f in CourseField::REQUIRED.iter().chain(CourseField::OPTIONAL.iter()) {
            assert_eq!(f.column().parse::<CourseField>().unwrap(), *f);
        }
    }

    #[test]
    fn test_field_parse_is_case_sensitive() {
        assert!("description".parse::<CourseField>().is_err());
        assert!("Instructors".parse::<CourseField>().is_err());
    }

    #[test]
    fn test_blank_optional_is_none() {
        let r = CourseRecord::new("CS101", "Intro")
            .with_description("   ")
            .with_department("CISE");
        assert_eq!(r.field(CourseField::Description), None);
        assert_eq!(r.field(CourseField::Department), Some("CISE"));
        assert_eq!(r.field(CourseField::Code), Some("CS101"));
    }

    #[test]
    fn test_list_truncates_but_reports_total() {
        let corpus = corpus_of(10);
        let listing = corpus.list(Some(2));
        assert_eq!(listing.total, 10);
        let codes: Vec<&str> = listing.courses.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["C0", "C1"]);
    }

    #[test]
    fn test_list_without_limit_returns_all() {
        let corpus = corpus_of(4);
        assert_eq!(corpus.list(None).courses.len(), 4);
        assert_eq!(corpus.list(Some(100)).courses.len(), 4);
        assert_eq!(corpus.list(Some(0)).courses.len(), 0);
    }
}
