//! Ontology type registry.
//!
//! Each ontology type (disease, gene, ...) accepts identifiers from a fixed set
//! of source databases and normalizes them toward one default database:
//!
//! | Type | Default | Also accepted |
//! |------|---------|---------------|
//! | disease | MONDO | DOID, MESH, OMIM, ICD-9, HP, ICD10CM, ORDO, UMLS |
//! | gene | ENTREZ | ENSEMBL, HGNC, MGI, SYMBOL, UNIPROT |
//! | compound | DrugBank | PUBCHEM, CHEBI, MESH, UMLS, CHEMBL, HMDB |
//! | symptom | MESH | SYMP, UMLS, HP |
//! | metabolite | HMDB | DrugBank, PUBCHEM, CHEBI, MESH, UMLS, CHEMBL |
//!
//! The table is embedded from `registry/ontology_types.json` and can be
//! replaced with a file of the same shape.

pub mod store;
