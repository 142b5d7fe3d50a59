//! Catalog loader: reads the tabular course dataset into a [`CourseCorpus`].
//!
//! The dataset is a CSV file with a header row. `Code` and `Name` are
//! required; `Description`, `Prerequisites`, and `Department` are optional
//! and any other column (instructors, meet times, credit hours, ...) is
//! ignored.
//!
//! | Condition | Result |
//! |-----------|--------|
//! | File missing / unreadable / malformed CSV | [`AdvisorError::DataSource`] |
//! | `Code` or `Name` header absent | [`AdvisorError::Schema`] |
//! | Optional header absent | warning; field treated as empty |
//! | Blank cell | field absent for that row |

use std::fs::File;
use std::io::Read;
use std::path::Path;

use course_advisor_core::models::non_blank;
use course_advisor_core::{AdvisorError, CourseCorpus, CourseField, CourseRecord, Result};
use tracing::{info, warn};

/// Load a catalog from a CSV file.
pub fn load_catalog(path: &Path) -> Result<CourseCorpus> {
    let file = File::open(path).map_err(|e| AdvisorError::DataSource {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let corpus = read_catalog(file, &path.display().to_string())?;
    info!(
        path = %path.display(),
        courses = corpus.len(),
        "loaded course catalog"
    );
    Ok(corpus)
}

/// Parse a catalog from any reader. `origin` names the source in errors.
pub fn read_catalog<R: Read>(reader: R, origin: &str) -> Result<CourseCorpus> {
    let data_source = |reason: String| AdvisorError::DataSource {
        path: origin.to_string(),
        reason,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| data_source(e.to_string()))?
        .clone();
    let column = |field: CourseField| headers.iter().position(|h| h == field.column());

    let mut required = Vec::with_capacity(CourseField::REQUIRED.len());
    for field in CourseField::REQUIRED {
        match column(field) {
            Some(i) => required.push(i),
            None => {
                return Err(AdvisorError::Schema {
                    column: field.column().to_string(),
                    path: origin.to_string(),
                })
            }
        }
    }
    let (code_col, name_col) = (required[0], required[1]);

    let description_col = column(CourseField::Description);
    let prerequisites_col = column(CourseField::Prerequisites);
    let department_col = column(CourseField::Department);

    let missing: Vec<CourseField> = CourseField::OPTIONAL
        .iter()
        .copied()
        .filter(|f| column(*f).is_none())
        .collect();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|f| f.column()).collect();
        warn!(
            source = origin,
            missing = ?names,
            "catalog is missing optional columns; they will be treated as empty"
        );
    }

    let mut records = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result.map_err(|e| data_source(format!("row {}: {}", row + 1, e)))?;
        let cell = |col: Option<usize>| {
            col.and_then(|i| record.get(i))
                .map(str::to_string)
                .and_then(non_blank)
        };

        records.push(CourseRecord {
            code: record.get(code_col).unwrap_or_default().to_string(),
            name: record.get(name_col).unwrap_or_default().to_string(),
            description: cell(description_col),
            prerequisites: cell(prerequisites_col),
            department: cell(department_col),
        });
    }

    Ok(CourseCorpus::new(records).with_missing_columns(missing))
}
