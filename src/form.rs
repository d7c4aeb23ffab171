use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::analysis::{AnalysisClient, AnalysisError, AnalysisResult};
use crate::client::{RecordClient, TransportError};
use crate::model::logical::Record;
use crate::model::storage::Fields;

#[derive(Debug, PartialEq)]
pub enum FormPhase {
    Idle,
    Analyzing,
    Submitting,
}

#[derive(Debug)]
enum FormMode {
    Create,
    Edit { record_id: String },
}

/// Create-or-edit form. On a failed submit the form keeps all of its state
/// (field values, foto, error text) and submission is re-enabled; it only
/// goes away on success.
#[derive(Debug)]
pub struct ArtikelForm {
    mode: FormMode,
    phase: FormPhase,
    pub hersteller: String,
    pub modell: String,
    pub farbe: String,
    pub groesse: String,
    foto: Option<String>,
    last_error: Option<String>,
}

impl ArtikelForm {
    pub fn create() -> Self {
        ArtikelForm {
            mode: FormMode::Create,
            phase: FormPhase::Idle,
            hersteller: String::new(),
            modell: String::new(),
            farbe: String::new(),
            groesse: String::new(),
            foto: None,
            last_error: None,
        }
    }

    /// Pre-populated from the record's current field values, including the
    /// existing foto as preview.
    pub fn edit(record: &Record) -> Self {
        ArtikelForm {
            mode: FormMode::Edit {
                record_id: record.record_id.clone(),
            },
            phase: FormPhase::Idle,
            hersteller: record.fields.hersteller.clone().unwrap_or_default(),
            modell: record.fields.modell.clone().unwrap_or_default(),
            farbe: record.fields.farbe.clone().unwrap_or_default(),
            groesse: record.fields.groesse.clone().unwrap_or_default(),
            foto: record.fields.foto.clone(),
            last_error: None,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.mode, FormMode::Edit { .. })
    }

    pub fn phase(&self) -> &FormPhase {
        &self.phase
    }

    pub fn foto(&self) -> Option<&str> {
        self.foto.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Sets the local preview first (no network dependency), then runs the
    /// best-effort analysis. `Ok(false)` means no analyzer was available;
    /// on `Err` the preview is kept and the form stays usable for manual
    /// entry.
    pub fn attach_image(
        &mut self,
        bytes: &[u8],
        analyzer: Option<&AnalysisClient>,
    ) -> Result<bool, AnalysisError> {
        let encoded = BASE64.encode(bytes);
        self.foto = Some(format!("data:image/jpeg;base64,{}", encoded));
        let analyzer = match analyzer {
            Some(a) => a,
            None => return Ok(false),
        };
        self.phase = FormPhase::Analyzing;
        let outcome = analyzer.analyze(&encoded);
        self.phase = FormPhase::Idle;
        self.apply_analysis(outcome?);
        Ok(true)
    }

    /// Non-destructive merge: an empty analysis value never blanks a field
    /// that is already filled; a non-empty one replaces the current value.
    pub fn apply_analysis(&mut self, result: AnalysisResult) {
        fill(&mut self.hersteller, result.hersteller);
        fill(&mut self.modell, result.modell);
        fill(&mut self.farbe, result.farbe);
        fill(&mut self.groesse, result.groesse);
    }

    /// The full form snapshot, not a diff: all four text fields are always
    /// sent, so a field emptied here is explicitly cleared server-side.
    /// `foto` is included only when one is attached.
    pub fn snapshot(&self) -> Fields {
        Fields {
            foto: self.foto.clone(),
            hersteller: Some(self.hersteller.clone()),
            modell: Some(self.modell.clone()),
            farbe: Some(self.farbe.clone()),
            groesse: Some(self.groesse.clone()),
        }
    }

    /// `true` when saved; `false` leaves the form open with the error
    /// retained and submission re-enabled.
    pub fn submit(&mut self, client: &RecordClient) -> bool {
        self.phase = FormPhase::Submitting;
        let fields = self.snapshot();
        let outcome = match &self.mode {
            FormMode::Create => client.create(&fields).map(|_| ()),
            FormMode::Edit { record_id } => client.update(record_id, &fields),
        };
        self.phase = FormPhase::Idle;
        match outcome {
            Ok(()) => {
                self.last_error = None;
                true
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                false
            }
        }
    }
}

fn fill(slot: &mut String, candidate: String) {
    if !candidate.is_empty() {
        *slot = candidate;
    }
}

/// Delete confirmation. `confirm` consumes the dialog, so it is gone
/// whether or not the call succeeds; a failure is surfaced by the caller
/// outside the dialog. Asymmetric with the create/edit form on purpose.
#[derive(Debug)]
pub struct DeleteConfirm {
    record_id: String,
    display_name: String,
}

impl DeleteConfirm {
    pub fn new(record: &Record) -> Self {
        DeleteConfirm {
            record_id: record.record_id.clone(),
            display_name: record.display_name(),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn confirm(self, client: &RecordClient) -> Result<bool, TransportError> {
        client.delete(&self.record_id)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record() -> Record {
        Record {
            record_id: "r1".to_owned(),
            createdat: Some("2024-01-01T00:00:00Z".to_owned()),
            updatedat: None,
            fields: Fields {
                foto: Some("data:image/jpeg;base64,AAAA".to_owned()),
                hersteller: Some("Nike".to_owned()),
                modell: Some("Air Max".to_owned()),
                farbe: Some("Schwarz".to_owned()),
                groesse: None,
            },
        }
    }

    #[test]
    fn edit_prefills_from_the_record() {
        let form = ArtikelForm::edit(&record());
        assert!(form.is_editing());
        assert_eq!(form.hersteller, "Nike");
        assert_eq!(form.groesse, "");
        assert_eq!(form.foto(), Some("data:image/jpeg;base64,AAAA"));
    }

    #[test]
    fn merge_is_non_destructive() {
        let mut form = ArtikelForm::create();
        form.hersteller = "Apple".to_owned();
        form.apply_analysis(AnalysisResult {
            hersteller: String::new(),
            modell: "iPhone 14".to_owned(),
            ..AnalysisResult::default()
        });
        assert_eq!(form.hersteller, "Apple");
        assert_eq!(form.modell, "iPhone 14");
    }

    #[test]
    fn non_empty_analysis_values_replace_current_ones() {
        let mut form = ArtikelForm::create();
        form.farbe = "Rot".to_owned();
        form.apply_analysis(AnalysisResult {
            farbe: "Schwarz".to_owned(),
            ..AnalysisResult::default()
        });
        assert_eq!(form.farbe, "Schwarz");
    }

    #[test]
    fn snapshot_always_sends_all_four_text_fields() {
        let mut form = ArtikelForm::edit(&record());
        form.farbe.clear();
        let snapshot = form.snapshot();
        // An emptied field is sent as "" so the store clears it.
        assert_eq!(snapshot.farbe.as_deref(), Some(""));
        assert_eq!(snapshot.groesse.as_deref(), Some(""));
        assert_eq!(snapshot.hersteller.as_deref(), Some("Nike"));
    }

    #[test]
    fn snapshot_omits_foto_unless_attached() {
        let form = ArtikelForm::create();
        assert!(form.snapshot().foto.is_none());
    }

    #[test]
    fn attach_without_analyzer_still_sets_the_preview() {
        let mut form = ArtikelForm::create();
        let ran = form.attach_image(&[0xFF, 0xD8], None).unwrap();
        assert!(!ran);
        assert!(form.foto().unwrap().starts_with("data:image/jpeg;base64,"));
        assert_eq!(*form.phase(), FormPhase::Idle);
    }
}
