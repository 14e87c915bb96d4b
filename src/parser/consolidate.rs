use crate::store::FieldMap;

/// Folds per-page field maps into completed student records.
///
/// One document can hold several students, and one student can span several
/// pages, so the fold keeps a single open buffer. A page only starts a new
/// record on strong evidence: it names a student, carries at least three
/// fields, and the open buffer (if any) names someone else. Everything else
/// merges into whichever record is currently open, later pages winning on
/// conflicting fields.
#[derive(Debug, Default)]
pub struct Consolidator {
    buffer: FieldMap,
}

impl Consolidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one page into the state. Returns the record this page closed off,
    /// if it started a new one.
    pub fn push(&mut self, page: &FieldMap) -> Option<FieldMap> {
        let starts_new_record = page.contains_key("name")
            && page.len() >= 3
            && (self.buffer.is_empty()
                || self
                    .buffer
                    .get("name")
                    .is_some_and(|open| Some(open) != page.get("name")));

        if starts_new_record && !self.buffer.is_empty() {
            let previous = std::mem::replace(&mut self.buffer, page.clone());
            // A buffer that never got a name is dropped here; its pages are
            // still visible in the per-page trace.
            return previous.contains_key("name").then_some(previous);
        }

        for (field, value) in page {
            self.buffer.insert(field.clone(), value.clone());
        }
        None
    }

    /// Close out the record still open at the end of the document.
    pub fn finish(self) -> Option<FieldMap> {
        (!self.buffer.is_empty() && self.buffer.contains_key("name")).then_some(self.buffer)
    }
}

/// Run the whole fold over an ordered page sequence.
pub fn consolidate(pages: &[FieldMap]) -> Vec<FieldMap> {
    let mut consolidator = Consolidator::new();
    let mut records = Vec::new();
    for page in pages {
        if let Some(completed) = consolidator.push(page) {
            records.push(completed);
        }
    }
    records.extend(consolidator.finish());
    records
}

// ── Tests ──
