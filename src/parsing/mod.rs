//! Readers for ontology entity files.
//!
//! The command-line tool reads tab-separated (or `.csv`) files with one entity
//! per row. Only the `id` column is converted; the other columns are carried
//! through to the output.
//!
//! | Column | Description | Required |
//! |--------|-------------|----------|
//! | id | `PREFIX:VALUE` identifier | Yes |
//! | name | Display name | Yes |
//! | label | Entity type, e.g. `Disease` | Yes |
//! | resource | Source database | Yes |
//!
//! Header names are matched case-insensitively and a leading `:` is ignored,
//! so graph-import headers like `ID\tname\t:LABEL\tresource` are accepted.

pub mod tsv;
