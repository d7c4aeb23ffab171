use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use itertools::Itertools;

use super::storage::{Fields, RecordBody};

/// Label used wherever a record has no usable display fields.
pub const PLACEHOLDER_NAME: &str = "Artikel";

/// Stand-in manufacturer for records without one.
pub const UNKNOWN_HERSTELLER: &str = "Unbekannt";

/// One Artikel as the rest of the crate sees it: the map key (or embedded
/// id) folded into the body.
#[derive(Debug, Clone)]
pub struct Record {
    pub record_id: String,
    pub createdat: Option<String>,
    pub updatedat: Option<String>,
    pub fields: Fields,
}

impl Record {
    pub fn from_parts(record_id: String, body: RecordBody) -> Self {
        Record {
            record_id,
            createdat: body.createdat,
            updatedat: body.updatedat,
            fields: body.fields,
        }
    }

    /// Hersteller and Modell joined, falling back to the placeholder when
    /// both are absent or empty.
    pub fn display_name(&self) -> String {
        let name = [
            self.fields.hersteller.as_deref(),
            self.fields.modell.as_deref(),
        ]
        .iter()
        .copied()
        .flatten()
        .filter(|part| !part.is_empty())
        .join(" ");
        if name.is_empty() {
            PLACEHOLDER_NAME.to_owned()
        } else {
            name
        }
    }

    /// Secondary display line: Farbe and Größe, empty when neither is set.
    pub fn detail_line(&self) -> String {
        [self.fields.farbe.as_deref(), self.fields.groesse.as_deref()]
            .iter()
            .copied()
            .flatten()
            .filter(|part| !part.is_empty())
            .join(" • ")
    }

    /// Manufacturer for statistics, with absent/empty mapped to the
    /// "Unbekannt" bucket.
    pub fn hersteller_or_unknown(&self) -> &str {
        match self.fields.hersteller.as_deref() {
            Some(h) if !h.is_empty() => h,
            _ => UNKNOWN_HERSTELLER,
        }
    }

    /// Creation time for ordering. The store sends ISO 8601; a timestamp
    /// without an offset is taken as UTC. Unparseable or absent values
    /// yield `None` and order after everything else.
    pub fn created_sort_key(&self) -> Option<DateTime<Utc>> {
        let raw = self.createdat.as_deref()?;
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record_with(hersteller: Option<&str>, modell: Option<&str>) -> Record {
        Record {
            record_id: "x".to_owned(),
            createdat: None,
            updatedat: None,
            fields: Fields {
                hersteller: hersteller.map(str::to_owned),
                modell: modell.map(str::to_owned),
                ..Fields::default()
            },
        }
    }

    #[test]
    fn display_name_joins_present_parts() {
        assert_eq!(
            record_with(Some("Nike"), Some("Air Max")).display_name(),
            "Nike Air Max"
        );
        assert_eq!(record_with(None, Some("Air Max")).display_name(), "Air Max");
    }

    #[test]
    fn display_name_falls_back_to_placeholder() {
        assert_eq!(record_with(None, None).display_name(), "Artikel");
        assert_eq!(record_with(Some(""), Some("")).display_name(), "Artikel");
    }

    #[test]
    fn empty_hersteller_counts_as_unknown() {
        assert_eq!(record_with(Some(""), None).hersteller_or_unknown(), "Unbekannt");
        assert_eq!(record_with(Some("Nike"), None).hersteller_or_unknown(), "Nike");
    }

    #[test]
    fn sort_key_accepts_offset_and_naive_timestamps() {
        let mut record = record_with(None, None);
        record.createdat = Some("2024-03-01T10:00:00Z".to_owned());
        let with_offset = record.created_sort_key().unwrap();
        record.createdat = Some("2024-03-01T10:00:00".to_owned());
        assert_eq!(record.created_sort_key().unwrap(), with_offset);
        record.createdat = Some("gestern".to_owned());
        assert!(record.created_sort_key().is_none());
    }
}
