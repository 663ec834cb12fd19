use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use log::info;

use super::error::ClassifierError;
use super::issue::GithubIssue;

const ID_COLUMN: &str = "id";
const AREA_COLUMN: &str = "area";
const TITLE_COLUMN: &str = "title";
const DESCRIPTION_COLUMN: &str = "description";

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    id: Option<usize>,
    area: usize,
    title: usize,
    description: usize,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, ClassifierError> {
        let positions: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_lowercase(), idx))
            .collect();

        let required = |name: &str| {
            positions.get(name).copied().ok_or_else(|| ClassifierError::DatasetError {
                line: 1,
                message: format!("Missing required column '{}'", name),
            })
        };

        Ok(Self {
            id: positions.get(ID_COLUMN).copied(),
            area: required(AREA_COLUMN)?,
            title: required(TITLE_COLUMN)?,
            description: required(DESCRIPTION_COLUMN)?,
        })
    }
}

/// Loads labeled issues from a tab-separated file with a header row.
///
/// The `Area`, `Title` and `Description` columns are required and located by
/// name; an `ID` column is kept when present. Any malformed row aborts the load.
pub fn load_issues<P: AsRef<Path>>(path: P) -> Result<Vec<GithubIssue>, ClassifierError> {
    let path = path.as_ref();
    info!("Loading issues from {:?}", path);
    let file = File::open(path)?;
    let issues = read_issues(file)?;
    info!("Loaded {} issues", issues.len());
    Ok(issues)
}

/// Reads labeled issues from any tab-separated source.
pub fn read_issues<R: Read>(source: R) -> Result<Vec<GithubIssue>, ClassifierError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .quoting(false)
        .flexible(true)
        .from_reader(source);

    let columns = ColumnMap::from_headers(reader.headers()?)?;
    let width = reader.headers()?.len();

    let mut issues = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        if record.len() != width {
            return Err(ClassifierError::DatasetError {
                line,
                message: format!("Expected {} fields, found {}", width, record.len()),
            });
        }

        let field = |idx: usize| record.get(idx).unwrap_or_default().to_string();
        let area = field(columns.area).trim().to_string();
        if area.is_empty() {
            return Err(ClassifierError::DatasetError {
                line,
                message: "Area label is empty".into(),
            });
        }

        issues.push(GithubIssue {
            id: columns.id.map(field).filter(|id| !id.is_empty()),
            area,
            title: field(columns.title),
            description: field(columns.description),
        });
    }

    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_columns_by_name() {
        let tsv = "ID\tArea\tTitle\tDescription\n\
                   1\tarea-System.Net\tHttpClient hangs\tRequests never complete\n\
                   2\tarea-System.IO\tFile.Copy fails\tAccess denied on \"C:\\tmp\"\n";
        let issues = read_issues(tsv.as_bytes()).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].id.as_deref(), Some("1"));
        assert_eq!(issues[0].area, "area-System.Net");
        assert_eq!(issues[1].description, "Access denied on \"C:\\tmp\"");
    }

    #[test]
    fn test_header_lookup_is_case_insensitive_and_id_optional() {
        let tsv = "title\tAREA\tdescription\nSlow sort\tarea-System.Collections\tList.Sort is slow\n";
        let issues = read_issues(tsv.as_bytes()).unwrap();
        assert_eq!(issues[0].id, None);
        assert_eq!(issues[0].title, "Slow sort");
        assert_eq!(issues[0].area, "area-System.Collections");
    }

    #[test]
    fn test_missing_column_is_rejected() {
        let tsv = "ID\tArea\tTitle\n1\tarea-System.Net\tHttpClient hangs\n";
        match read_issues(tsv.as_bytes()) {
            Err(ClassifierError::DatasetError { line, message }) => {
                assert_eq!(line, 1);
                assert!(message.contains("description"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_short_row_reports_line() {
        let tsv = "ID\tArea\tTitle\tDescription\n\
                   1\tarea-System.Net\tok\tfine\n\
                   2\tarea-System.Net\tbroken\n";
        match read_issues(tsv.as_bytes()) {
            Err(ClassifierError::DatasetError { line, .. }) => assert_eq!(line, 3),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_empty_area_is_rejected() {
        let tsv = "ID\tArea\tTitle\tDescription\n1\t \tNo label\tnothing\n";
        assert!(matches!(
            read_issues(tsv.as_bytes()),
            Err(ClassifierError::DatasetError { line: 2, .. })
        ));
    }
}
