//! # Row Source
//! Reads the artisan contact sheet (delimited text with a header row) into
//! `InputRecord`s. No column validation happens here: every field is optional
//! for downstream consumers except the name, and that check belongs to the
//! batch driver.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use std::fs;
use std::path::Path;

pub const NAME_COLUMNS: &[&str] = &["Name", "name"];
pub const CITY_COLUMNS: &[&str] = &["City", "city"];
pub const STATE_COLUMNS: &[&str] = &["State", "state"];
pub const EMAIL_COLUMNS: &[&str] = &["Email", "email"];
pub const PHONE1_COLUMNS: &[&str] = &["Phone Number 1", "phone_number_1"];
pub const PHONE2_COLUMNS: &[&str] = &["Phone Number 2", "phone_number_2"];

/// One parsed CSV row: header → value, in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputRecord {
    fields: Vec<(String, String)>,
}

impl InputRecord {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Exact header lookup.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }

    /// First non-empty value among the given column aliases, or `""`.
    pub fn first_of(&self, aliases: &[&str]) -> &str {
        aliases
            .iter()
            .filter_map(|c| self.get(c))
            .find(|v| !v.is_empty())
            .unwrap_or("")
    }

    pub fn name(&self) -> Option<&str> {
        let n = self.first_of(NAME_COLUMNS);
        if n.trim().is_empty() {
            None
        } else {
            Some(n)
        }
    }

    pub fn city(&self) -> &str {
        self.first_of(CITY_COLUMNS)
    }

    pub fn state(&self) -> &str {
        self.first_of(STATE_COLUMNS)
    }

    pub fn email(&self) -> &str {
        self.first_of(EMAIL_COLUMNS)
    }

    pub fn phone1(&self) -> &str {
        self.first_of(PHONE1_COLUMNS)
    }

    pub fn phone2(&self) -> &str {
        self.first_of(PHONE2_COLUMNS)
    }

    /// Both phones joined by ", " when present, otherwise whichever exists.
    pub fn joined_phone(&self) -> String {
        match (self.phone1(), self.phone2()) {
            ("", "") => String::new(),
            (p1, "") => p1.to_string(),
            ("", p2) => p2.to_string(),
            (p1, p2) => format!("{p1}, {p2}"),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// CSV reader settings.
#[derive(Debug, Clone)]
pub struct RowSource {
    delimiter: u8,
    trim: bool,
}

impl Default for RowSource {
    fn default() -> Self {
        Self {
            delimiter: b',',
            trim: true,
        }
    }
}

impl RowSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// Read every row of the file. Fails if the file is missing or unreadable.
    pub fn read_path(&self, path: &Path) -> Result<Vec<InputRecord>> {
        let bytes =
            fs::read(path).with_context(|| format!("reading input csv {}", path.display()))?;
        // Spreadsheet exports are often Latin-1; undecodable bytes become U+FFFD.
        let content = String::from_utf8_lossy(&bytes);
        self.read_str(&content)
            .with_context(|| format!("parsing input csv {}", path.display()))
    }

    pub fn read_str(&self, content: &str) -> Result<Vec<InputRecord>> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(if self.trim { Trim::All } else { Trim::None })
            .flexible(true)
            .from_reader(content.as_bytes());

        let headers = reader.headers().context("reading csv header")?.clone();

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result.with_context(|| format!("parsing csv row {}", idx + 1))?;
            let fields = headers
                .iter()
                .enumerate()
                .map(|(i, h)| (h.to_string(), record.get(i).unwrap_or("").to_string()))
                .collect();
            rows.push(InputRecord { fields });
        }
        Ok(rows)
    }
}
