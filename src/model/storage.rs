use serde::{Deserialize, Serialize};

// Wire model of the record store. The list endpoint returns an object keyed
// by record id whose values are bodies without the id; the single-record
// endpoint embeds the id as `id`.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordBody {
    #[serde(default)]
    pub createdat: Option<String>,
    #[serde(default)]
    pub updatedat: Option<String>,
    #[serde(default)]
    pub fields: Fields,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecordWithId {
    pub id: String,
    #[serde(flatten)]
    pub body: RecordBody,
}

/// User-editable attribute set. Absent keys stay absent on the wire;
/// an empty string is an explicit value and clears the field server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foto: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hersteller: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farbe: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groesse: Option<String>,
}

/// Write body for create and update calls.
#[derive(Debug, Serialize)]
pub struct FieldsPayload<'a> {
    pub fields: &'a Fields,
}

/// Ack returned by write calls. Decoding is lenient, the store only
/// acknowledges and delete responses may have an empty body.
#[derive(Debug, Default, Deserialize)]
pub struct WriteAck {
    #[serde(default)]
    pub id: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn record_body_tolerates_missing_keys() {
        let body: RecordBody = serde_json::from_str("{}").unwrap();
        assert!(body.createdat.is_none());
        assert_eq!(body.fields, Fields::default());
    }

    #[test]
    fn record_with_id_flattens_body() {
        let raw = r#"{"id":"abc","createdat":"2024-01-01T00:00:00Z","fields":{"modell":"Air Max"}}"#;
        let record: RecordWithId = serde_json::from_str(raw).unwrap();
        assert_eq!(record.id, "abc");
        assert_eq!(record.body.fields.modell.as_deref(), Some("Air Max"));
    }

    #[test]
    fn absent_fields_are_not_serialised() {
        let fields = Fields {
            hersteller: Some("Nike".to_owned()),
            farbe: Some(String::new()),
            ..Fields::default()
        };
        let raw = serde_json::to_string(&FieldsPayload { fields: &fields }).unwrap();
        assert_eq!(raw, r#"{"fields":{"hersteller":"Nike","farbe":""}}"#);
    }

    #[test]
    fn write_ack_tolerates_unknown_shape() {
        let ack: WriteAck = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
        assert!(ack.id.is_none());
        let ack: WriteAck = serde_json::from_str(r#"{"id":"abc"}"#).unwrap();
        assert_eq!(ack.id.as_deref(), Some("abc"));
    }
}
