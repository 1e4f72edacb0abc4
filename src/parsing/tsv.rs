use std::borrow::Cow;
use std::fmt::Write as _;
use std::path::Path;

use thiserror::Error;

/// Column holding the identifier to convert
pub const ID: &str = "id";
pub const NAME: &str = "name";
pub const LABEL: &str = "label";
pub const RESOURCE: &str = "resource";

/// Columns every ontology file must have
pub const REQUIRED_COLUMNS: [&str; 4] = [ID, NAME, LABEL, RESOURCE];

pub const DESCRIPTION: &str = "description";
/// `|`-separated list columns
pub const SYNONYMS: &str = "synonyms";
pub const XREFS: &str = "xrefs";

/// Separator inside list cells such as `synonyms` and `xrefs`
pub const LIST_SEPARATOR: char = '|';

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("The file format is not correct, missed columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// An ontology file: a header plus rows of equal width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OntologyTable {
    /// Normalized column names (lowercase, leading `:` removed)
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Normalize a header cell so `ID`, `id` and `:LABEL` all match
fn normalize_column(name: &str) -> String {
    name.trim().trim_start_matches(':').to_lowercase()
}

impl OntologyTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = normalize_column(name);
        self.columns.iter().position(|c| *c == name)
    }

    /// Value of `column` in `row`, empty when the column is absent
    pub fn value<'a>(&'a self, row: &'a [String], column: &str) -> &'a str {
        self.column_index(column)
            .and_then(|i| row.get(i))
            .map_or("", String::as_str)
    }

    /// Non-blank identifiers with the row each came from
    pub fn ids(&self) -> (Vec<String>, Vec<usize>) {
        let mut ids = Vec::new();
        let mut row_indices = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            let id = self.value(row, ID);
            if !id.is_empty() {
                ids.push(id.to_string());
                row_indices.push(i);
            }
        }
        (ids, row_indices)
    }
}

/// Pick the delimiter from the file extension: `.csv` is comma separated,
/// everything else tab separated
pub fn delimiter_for(path: &Path) -> char {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => ',',
        _ => '\t',
    }
}

/// Read an ontology file
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn read_ontology_file(path: &Path) -> Result<OntologyTable, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_ontology_text(&content, delimiter_for(path))
}

/// Split text into records of fields.
///
/// Fields may be quoted: a quoted field can hold the delimiter, line breaks
/// and `""` for a literal quote. Blank lines are skipped. Each record carries
/// the 1-based line it starts on.
fn split_records(text: &str, delimiter: char) -> Result<Vec<(usize, Vec<String>)>, ParseError> {
    let mut records = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut quoted = false;
    let mut line_num = 1;
    let mut record_start = 1;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line_num += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.trim().is_empty() && !quoted => {
                field.clear();
                in_quotes = true;
                quoted = true;
            }
            c if c == delimiter => {
                fields.push(finish_field(&mut field, quoted));
                quoted = false;
            }
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(finish_field(&mut field, quoted));
                quoted = false;
                push_record(&mut records, record_start, std::mem::take(&mut fields));
                line_num += 1;
                record_start = line_num;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ParseError::InvalidFormat(format!(
            "Line {record_start} has an unterminated quoted field"
        )));
    }
    if !field.is_empty() || quoted || !fields.is_empty() {
        fields.push(finish_field(&mut field, quoted));
        push_record(&mut records, record_start, fields);
    }

    Ok(records)
}

fn finish_field(field: &mut String, quoted: bool) -> String {
    let value = std::mem::take(field);
    if quoted {
        value
    } else {
        value.trim().to_string()
    }
}

fn push_record(records: &mut Vec<(usize, Vec<String>)>, line_num: usize, fields: Vec<String>) {
    if fields.iter().all(|f| f.trim().is_empty()) {
        return;
    }
    records.push((line_num, fields));
}

/// Parse ontology text with a header row containing at least
/// `id`, `name`, `label` and `resource`
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` for an empty file, ragged rows or an
/// unterminated quote, and `ParseError::MissingColumns` if required columns
/// are absent.
pub fn parse_ontology_text(text: &str, delimiter: char) -> Result<OntologyTable, ParseError> {
    let mut records = split_records(text, delimiter)?.into_iter();

    let (_, header) = records
        .next()
        .ok_or_else(|| ParseError::InvalidFormat("File is empty".to_string()))?;
    let columns: Vec<String> = header.iter().map(|c| normalize_column(c)).collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !columns.iter().any(|c| c == *required))
        .map(|s| (*s).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ParseError::MissingColumns(missing));
    }

    let mut rows = Vec::new();
    for (line_num, mut fields) in records {
        if fields.len() > columns.len() {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has {} fields, expected {}",
                fields.len(),
                columns.len()
            )));
        }
        fields.resize(columns.len(), String::new());
        rows.push(fields);
    }

    Ok(OntologyTable { columns, rows })
}

/// Quote a cell when it holds the delimiter, a quote or a line break
fn escape_cell(value: &str, delimiter: char) -> Cow<'_, str> {
    if value.contains(|c| c == delimiter || c == '"' || c == '\n' || c == '\r') {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Render rows as delimited text with a header line
pub fn render_rows(columns: &[String], rows: &[Vec<String>], delimiter: char) -> String {
    let separator = delimiter.to_string();
    let mut out = String::new();
    for row in std::iter::once(columns).chain(rows.iter().map(Vec::as_slice)) {
        let cells: Vec<Cow<'_, str>> = row.iter().map(|v| escape_cell(v, delimiter)).collect();
        let _ = writeln!(out, "{}", cells.join(&separator));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ontology_text() {
        let tsv = "id\tname\tlabel\tresource\n\
                   DOID:7402\tnecrotizing fasciitis\tDisease\tDOID\n\
                   MESH:D015673\tFasciitis, Necrotizing\tDisease\tMESH\n";

        let table = parse_ontology_text(tsv, '\t').unwrap();
        assert_eq!(table.columns, vec!["id", "name", "label", "resource"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.value(&table.rows[1], "resource"), "MESH");
    }

    #[test]
    fn test_graph_style_header() {
        let tsv = "ID\tname\t:LABEL\tresource\tsynonyms\nMONDO:0005148\tT2D\tDisease\tMONDO\n";
        let table = parse_ontology_text(tsv, '\t').unwrap();
        assert_eq!(table.column_index(":LABEL"), Some(2));
        // Short rows are padded
        assert_eq!(table.value(&table.rows[0], "synonyms"), "");
    }

    #[test]
    fn test_missing_columns() {
        let err = parse_ontology_text("id,name\nDOID:1,x\n", ',').unwrap_err();
        match err {
            ParseError::MissingColumns(missing) => assert_eq!(missing, vec!["label", "resource"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_ids_skip_blank_rows() {
        let csv = "id,name,label,resource\nDOID:1,a,Disease,DOID\n,b,Disease,DOID\nMESH:D2,c,Disease,MESH\n";
        let table = parse_ontology_text(csv, ',').unwrap();
        let (ids, rows) = table.ids();
        assert_eq!(ids, vec!["DOID:1", "MESH:D2"]);
        assert_eq!(rows, vec![0, 2]);
    }

    #[test]
    fn test_too_many_fields() {
        let tsv = "id\tname\tlabel\tresource\nDOID:1\ta\tDisease\tDOID\textra\n";
        assert!(matches!(
            parse_ontology_text(tsv, '\t'),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_quoted_csv_fields() {
        let csv = "id,name,label,resource\n\
                   MESH:D015673,\"Fatigue Syndrome, Chronic\",Disease,MESH\n\
                   DOID:4001,\"ovarian \"\"carcinoma\"\"\",Disease,DOID\r\n";
        let table = parse_ontology_text(csv, ',').unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.value(&table.rows[0], "name"), "Fatigue Syndrome, Chronic");
        assert_eq!(table.value(&table.rows[0], "label"), "Disease");
        assert_eq!(table.value(&table.rows[1], "name"), "ovarian \"carcinoma\"");
        assert_eq!(table.value(&table.rows[1], "resource"), "DOID");
    }

    #[test]
    fn test_quoted_field_spanning_lines() {
        let tsv = "id\tname\tlabel\tresource\n\
                   DOID:1\t\"first\nsecond\"\tDisease\tDOID\n\
                   DOID:2\ta\tDisease\tDOID\textra\n";
        let err = parse_ontology_text(tsv, '\t').unwrap_err();
        // The multi-line cell counts as one record, so the ragged row is line 4
        assert!(err.to_string().contains("Line 4"), "{err}");
    }

    #[test]
    fn test_unterminated_quote() {
        let csv = "id,name,label,resource\nDOID:1,\"open,Disease,DOID\n";
        assert!(matches!(
            parse_ontology_text(csv, ','),
            Err(ParseError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_render_rows_escapes_cells() {
        let columns = vec!["id".to_string(), "name".to_string()];
        let rows = vec![vec!["DOID:1".to_string(), "tab\there \"quoted\"\nnext".to_string()]];

        let rendered = render_rows(&columns, &rows, '\t');
        assert_eq!(
            rendered,
            "id\tname\nDOID:1\t\"tab\there \"\"quoted\"\"\nnext\"\n"
        );

        // What is written can be read back unchanged
        let columns: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| (*c).to_string()).collect();
        let row = vec!["DOID:1".to_string(), rows[0][1].clone(), "Disease".to_string(), "DOID".to_string()];
        let table = parse_ontology_text(&render_rows(&columns, &[row], '\t'), '\t').unwrap();
        assert_eq!(table.value(&table.rows[0], "name"), rows[0][1]);
    }

    #[test]
    fn test_delimiter_for() {
        assert_eq!(delimiter_for(Path::new("disease.csv")), ',');
        assert_eq!(delimiter_for(Path::new("disease.tsv")), '\t');
        assert_eq!(delimiter_for(Path::new("disease")), '\t');
    }
}
