//! Normalized ticket record and batch decoding.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SlaError;
use crate::source::SourceSystem;

/// Source-agnostic ticket as handed over by the ingestion layer.
///
/// Timestamps that are absent or could not be parsed are `None`; the
/// classifier treats such tickets as not overdue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(deserialize_with = "lenient_text")]
    pub id: String,
    pub source: SourceSystem,
    #[serde(default, alias = "created", deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        alias = "updated",
        alias = "last_updated",
        alias = "last_activity",
        deserialize_with = "lenient_timestamp"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        alias = "closed",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_timestamp"
    )]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub severity: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub priority: Option<String>,
    #[serde(
        default,
        alias = "type",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub issue_type: Option<String>,
    #[serde(
        default,
        alias = "assignee",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub owner: Option<String>,
    #[serde(
        default,
        alias = "organization",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_string"
    )]
    pub client: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub status: String,
}

impl Ticket {
    /// Bare ticket with no timestamps or classification fields.
    pub fn new(id: impl Into<String>, source: SourceSystem) -> Self {
        Self {
            id: id.into(),
            source,
            created_at: None,
            updated_at: None,
            closed_at: None,
            severity: None,
            priority: None,
            issue_type: None,
            owner: None,
            client: None,
            status: String::new(),
        }
    }
}

/// Decodes a ticket batch from either a JSON array or JSON Lines.
pub fn decode_tickets(text: &str) -> Result<Vec<Ticket>, SlaError> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return serde_json::from_str::<Vec<Ticket>>(text).map_err(|source| {
            SlaError::TicketDecode {
                line: source.line(),
                source,
            }
        });
    }

    let mut tickets = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let ticket = serde_json::from_str::<Ticket>(line).map_err(|source| {
            SlaError::TicketDecode {
                line: index + 1,
                source,
            }
        })?;
        tickets.push(ticket);
    }
    Ok(tickets)
}

/// Parses the timestamp spellings found in ticket exports. Returns `None`
/// for anything unrecognized.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    const DATETIME_FORMATS: [&str; 6] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%d/%m/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ];
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    None
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(raw)) => parse_timestamp(&raw),
        Some(serde_json::Value::Number(number)) => number
            .as_i64()
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    })
}

/// Text cells may arrive as numbers or booleans from spreadsheet exports.
fn scalar_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(text) => Some(text),
        serde_json::Value::Number(number) => Some(number.to_string()),
        serde_json::Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(scalar_text))
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{decode_tickets, parse_timestamp, Ticket};
    use crate::source::SourceSystem;

    #[test]
    fn parses_export_timestamp_spellings() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 4, 9, 30, 0).single();
        assert_eq!(parse_timestamp("2026-03-04T09:30:00Z"), expected);
        assert_eq!(parse_timestamp("2026-03-04T10:30:00+01:00"), expected);
        assert_eq!(parse_timestamp("2026-03-04 09:30:00"), expected);
        assert_eq!(parse_timestamp("2026-03-04 09:30"), expected);
        assert_eq!(parse_timestamp("04/03/2026 09:30"), expected);
        assert_eq!(
            parse_timestamp("2026-03-04"),
            Utc.with_ymd_and_hms(2026, 3, 4, 0, 0, 0).single()
        );
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp("  "), None);
    }

    #[test]
    fn decodes_json_lines_with_aliases() {
        let text = concat!(
            r#"{"id":"CS-1","source":"case-management","created":"2026-03-04 09:30","last_updated":"2026-03-04 10:30","severity":"1","assignee":"Alice","organization":"Acme","status":"Ouvert"}"#,
            "\n\n",
            r#"{"id":"PRJ-7","source":"issue-tracker","type":"Bug","priority":"High","created_at":"garbage","status":"To Do"}"#,
            "\n"
        );
        let tickets = match decode_tickets(text) {
            Ok(tickets) => tickets,
            Err(err) => panic!("decode failed: {err}"),
        };
        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].owner.as_deref(), Some("Alice"));
        assert_eq!(tickets[0].client.as_deref(), Some("Acme"));
        assert!(tickets[0].updated_at.is_some());
        assert_eq!(tickets[1].issue_type.as_deref(), Some("Bug"));
        assert_eq!(tickets[1].created_at, None);
    }

    #[test]
    fn decodes_json_array_and_reports_bad_lines() {
        let array = r#"[{"id":"CH-1","source":"itsm-change","created_at":1767225600}]"#;
        let tickets = match decode_tickets(array) {
            Ok(tickets) => tickets,
            Err(err) => panic!("decode failed: {err}"),
        };
        assert_eq!(
            tickets[0].created_at,
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single()
        );

        let broken = "{\"id\":\"a\",\"source\":\"itsm-change\"}\n{\"id\":\"b\"}\n";
        match decode_tickets(broken) {
            Ok(_) => panic!("missing source must fail"),
            Err(err) => assert!(err.to_string().starts_with("decode tickets (line 2)")),
        }
    }

    #[test]
    fn numeric_and_null_cells_decode_as_text() {
        let text = concat!(
            r#"{"id":12345,"source":"case-management","severity":1,"priority":2.5,"owner":null,"client":true,"status":3}"#,
            "\n",
            r#"{"id":"PRJ-9","source":"issue-tracker","type":{"name":"Bug"},"priority":2}"#,
            "\n"
        );
        let tickets = match decode_tickets(text) {
            Ok(tickets) => tickets,
            Err(err) => panic!("decode failed: {err}"),
        };
        assert_eq!(tickets.len(), 2);
        assert_eq!(tickets[0].id, "12345");
        assert_eq!(tickets[0].severity.as_deref(), Some("1"));
        assert_eq!(tickets[0].priority.as_deref(), Some("2.5"));
        assert_eq!(tickets[0].owner, None);
        assert_eq!(tickets[0].client.as_deref(), Some("true"));
        assert_eq!(tickets[0].status, "3");
        assert_eq!(tickets[1].issue_type, None);
        assert_eq!(tickets[1].priority.as_deref(), Some("2"));
        assert!(tickets[1].status.is_empty());
    }

    #[test]
    fn empty_input_is_an_empty_batch() {
        match decode_tickets(" \n") {
            Ok(tickets) => assert!(tickets.is_empty()),
            Err(err) => panic!("decode failed: {err}"),
        }
    }

    #[test]
    fn new_ticket_has_no_timestamps() {
        let ticket = Ticket::new("INC-1", SourceSystem::ItsmIncident);
        assert_eq!(ticket.created_at, None);
        assert!(ticket.status.is_empty());
    }
}
