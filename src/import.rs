use std::io::Read;

use serde::Deserialize;

use crate::error::Result;

/// One line of a meeting platform participant export.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParticipantCsvRow {
    pub session_uuid: String,
    pub name: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub user_email: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
    pub join_time: i64,
    pub leave_time: i64,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub source_key: Option<String>,
}

impl ParticipantCsvRow {
    /// Stable key so re-importing the same export does not duplicate rows.
    pub fn source_key(&self) -> String {
        self.source_key.clone().unwrap_or_else(|| {
            format!(
                "{}:{}:{}",
                self.session_uuid,
                self.name.trim().to_lowercase(),
                self.join_time
            )
        })
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

pub fn read_participants<R: Read>(input: R) -> Result<Vec<ParticipantCsvRow>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(input);
    let mut rows = Vec::new();

    for result in reader.deserialize::<ParticipantCsvRow>() {
        rows.push(result?);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_export_with_optional_columns() {
        let data = "\
session_uuid,name,user_email,user_id,join_time,leave_time,source_key
abc==,Dana Cohen,dana@example.edu,42,1760000000,1760003600,
abc==,iPhone,,,1760000100,1760003000,zoom-77
";
        let rows = read_participants(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_email.as_deref(), Some("dana@example.edu"));
        assert_eq!(rows[0].user_id, Some(42));
        assert_eq!(rows[0].source_key(), "abc==:dana cohen:1760000000");
        assert_eq!(rows[1].user_email, None);
        assert_eq!(rows[1].user_id, None);
        assert_eq!(rows[1].source_key(), "zoom-77");
    }

    #[test]
    fn rejects_malformed_timestamps() {
        let data = "\
session_uuid,name,user_email,user_id,join_time,leave_time,source_key
abc==,Dana,,,yesterday,1760003600,
";
        assert!(read_participants(data.as_bytes()).is_err());
    }
}
