pub mod consolidate;
pub mod extract;
pub mod patterns;

use chrono::Utc;
use rayon::prelude::*;
use serde::Serialize;

use crate::document::Document;
use crate::store::{FieldMap, Store};

/// Fields extracted from one page, kept for diagnostics even when the page
/// never contributes to a completed record.
#[derive(Debug, Clone, Serialize)]
pub struct PageTrace {
    pub page: usize,
    pub fields: FieldMap,
}

#[derive(Debug)]
pub struct Extraction {
    pub records: Vec<FieldMap>,
    pub page_trace: Vec<PageTrace>,
}

/// Two-pass pipeline: page texts → per-page fields → consolidated records.
///
/// Per-page extraction is independent and runs in parallel; the fold stays
/// sequential because boundary detection depends on which record is open.
pub fn process_pages(pages: &[String]) -> Extraction {
    let page_fields: Vec<FieldMap> = pages
        .par_iter()
        .map(|text| extract::extract_page_fields(text))
        .collect();

    let page_trace = page_fields
        .iter()
        .enumerate()
        .filter(|(_, fields)| !fields.is_empty())
        .map(|(idx, fields)| PageTrace {
            page: idx + 1,
            fields: fields.clone(),
        })
        .collect();

    let records = consolidate::consolidate(&page_fields);
    Extraction { records, page_trace }
}

/// Per-document ingest report, shaped like the service response.
#[derive(Debug, Serialize)]
pub struct IngestReport {
    pub status: String,
    pub source_file: String,
    pub added_count: usize,
    pub updated_count: usize,
    pub completed_records: Vec<FieldMap>,
    pub per_page_trace: Vec<PageTrace>,
}

/// Run the full pipeline for one document: extract, consolidate, stamp
/// provenance, and reconcile against the store. Saving the store is the
/// caller's call.
pub fn extract_and_consolidate(document: &Document, store: &Store) -> IngestReport {
    let Extraction {
        mut records,
        page_trace,
    } = process_pages(&document.pages);

    let stamp = Utc::now().to_rfc3339();
    for record in &mut records {
        record.insert("source_file".to_string(), document.name.clone());
        record.insert("extraction_time".to_string(), stamp.clone());
    }

    let counts = store.reconcile(&records);
    IngestReport {
        status: "success".to_string(),
        source_file: document.name.clone(),
        added_count: counts.added,
        updated_count: counts.updated,
        completed_records: records,
        per_page_trace: page_trace,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn fixture_pages(name: &str) -> Vec<String> {
        crate::document::load(Path::new(&format!("tests/fixtures/{}", name)))
            .unwrap()
            .pages
    }

    #[test]
    fn jane_doe_merges_across_pages() {
        let extraction = process_pages(&fixture_pages("jane_doe"));
        assert_eq!(extraction.records.len(), 1);

        let record = &extraction.records[0];
        assert_eq!(record.get("name").map(String::as_str), Some("Jane Doe"));
        assert_eq!(record.get("student_id").map(String::as_str), Some("12345"));
        assert_eq!(record.get("course").map(String::as_str), Some("CS"));
        assert_eq!(record.get("email").map(String::as_str), Some("jane@x.com"));
    }

    #[test]
    fn admission_form_builds_one_rich_record() {
        let extraction = process_pages(&fixture_pages("admission_form"));
        assert_eq!(extraction.records.len(), 1);

        let record = &extraction.records[0];
        assert_eq!(record.get("name").map(String::as_str), Some("Rohan Verma"));
        assert_eq!(record.get("student_id").map(String::as_str), Some("GCE-2024-118"));
        assert_eq!(record.get("dob").map(String::as_str), Some("14/03/2006"));
        assert_eq!(record.get("gender").map(String::as_str), Some("Male"));
        assert_eq!(record.get("category").map(String::as_str), Some("General"));
        assert_eq!(
            record.get("email").map(String::as_str),
            Some("rohan.verma@gcek.ac.in")
        );
        assert_eq!(record.get("phone").map(String::as_str), Some("987-654-3210"));
        assert_eq!(record.get("academic_year").map(String::as_str), Some("2024-25"));
        assert_eq!(record.get("grade").map(String::as_str), Some("A+"));
        assert_eq!(
            record.get("course").map(String::as_str),
            Some("B.Tech Computer Science")
        );
        assert_eq!(
            record.get("address").map(String::as_str),
            Some("14-B Nehru Nagar, Shivaji Road, Pune 411038")
        );

        // All three pages extracted something.
        assert_eq!(extraction.page_trace.len(), 3);
    }

    #[test]
    fn roster_splits_into_two_records() {
        let extraction = process_pages(&fixture_pages("roster"));
        assert_eq!(extraction.records.len(), 2);
        assert_eq!(
            extraction.records[0].get("name").map(String::as_str),
            Some("Aarav Sharma")
        );
        assert_eq!(
            extraction.records[1].get("name").map(String::as_str),
            Some("Priya Patel")
        );
    }

    #[test]
    fn ingest_stamps_provenance_and_reconciles() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("student_database.json")).unwrap();
        let document = Document {
            name: "jane_doe.pdf".to_string(),
            pages: fixture_pages("jane_doe"),
        };

        let report = extract_and_consolidate(&document, &store);
        assert_eq!(report.status, "success");
        assert_eq!(report.added_count, 1);
        assert_eq!(report.updated_count, 0);
        assert_eq!(report.completed_records.len(), 1);

        let record = &report.completed_records[0];
        assert_eq!(record.get("source_file").map(String::as_str), Some("jane_doe.pdf"));
        assert!(record.contains_key("extraction_time"));

        // Same document again: the store dedupes on name.
        let report = extract_and_consolidate(&document, &store);
        assert_eq!(report.added_count, 0);
        assert_eq!(report.updated_count, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn empty_document_reports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("student_database.json")).unwrap();
        let document = Document {
            name: "blank.pdf".to_string(),
            pages: Vec::new(),
        };

        let report = extract_and_consolidate(&document, &store);
        assert_eq!(report.added_count, 0);
        assert!(report.completed_records.is_empty());
        assert!(report.per_page_trace.is_empty());
    }
}
