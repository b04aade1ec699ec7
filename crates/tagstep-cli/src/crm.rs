use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

pub const EMAIL_COLUMN: &str = "email";

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("'email' column not found in CSV file")]
    MissingEmailColumn,

    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Addresses from a CRM export, deduplicated, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrmEmails {
    emails: Vec<String>,
    rows: usize,
}

impl CrmEmails {
    pub fn from_path(path: &Path) -> Result<Self, CrmError> {
        let reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        Self::collect(reader)
    }

    pub fn from_reader<R: Read>(input: R) -> Result<Self, CrmError> {
        let reader = csv::ReaderBuilder::new().flexible(true).from_reader(input);
        Self::collect(reader)
    }

    fn collect<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, CrmError> {
        let column = reader
            .headers()?
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim() == EMAIL_COLUMN)
            .ok_or(CrmError::MissingEmailColumn)?;

        let mut seen = HashSet::new();
        let mut emails = Vec::new();
        let mut rows = 0;
        for record in reader.records() {
            let record = record?;
            rows += 1;
            let Some(email) = record.get(column).map(str::trim) else {
                continue;
            };
            if !email.is_empty() && seen.insert(email.to_string()) {
                emails.push(email.to_string());
            }
        }
        Ok(Self { emails, rows })
    }

    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    /// Data rows read, blank and duplicate addresses included.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn to_set(&self) -> HashSet<String> {
        self.emails.iter().cloned().collect()
    }
}
