//! CSV export of successfully forwarded messages.
//!
//! Layout: UTF-8 BOM, a quoted metadata preamble, one empty line, the header
//! row, then one row per successful result (newest first).

use chrono::{DateTime, SecondsFormat, Utc};
use csv::{QuoteStyle, WriterBuilder};
use std::io::Write;
use std::path::Path;

use crate::error::{RelayError, Result};
use crate::forward::{ForwardResult, ResultLog};

const BOM: &[u8] = b"\xEF\xBB\xBF";

pub const HEADERS: [&str; 13] = [
    "Original ID",
    "Status",
    "Forwarded Timestamp",
    "Message Date",
    "First Name",
    "Last Name",
    "Username",
    "User ID",
    "Is Bot",
    "Message Type",
    "Has Media",
    "Text",
    "Error",
];

/// Job details written into the preamble.
#[derive(Debug, Clone)]
pub struct ExportMeta {
    pub bot_token: String,
    pub source_chat: String,
    pub target_chat: String,
    pub start_message_id: u64,
    pub exported_at: DateTime<Utc>,
}

impl ExportMeta {
    fn preamble(&self, total: usize) -> Vec<String> {
        let or_missing = |s: &str| {
            if s.is_empty() {
                "Not configured".to_string()
            } else {
                s.to_string()
            }
        };
        let bot_id = self
            .bot_token
            .split_once(':')
            .map(|(id, _)| id)
            .filter(|id| !id.is_empty())
            .unwrap_or("unknown");
        vec![
            format!("Bot Token: {}", or_missing(&self.bot_token)),
            format!("Source Chat ID: {}", or_missing(&self.source_chat)),
            format!("Target Chat ID: {}", or_missing(&self.target_chat)),
            format!("Bot Link: https://t.me/{}", bot_id),
            format!(
                "Export Date: {}",
                self.exported_at.format("%d-%m-%Y %H:%M:%S")
            ),
            format!("Total Forwarded Messages: {}", total),
            format!("Start Message ID: {}", self.start_message_id),
            "Export Type: Successful Messages Only".to_string(),
        ]
    }
}

fn collapse_newlines(text: &str) -> String {
    text.split(['\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn row(r: &ForwardResult) -> [String; 13] {
    let s = &r.sender_info;
    [
        r.original_id.to_string(),
        "success".to_string(),
        r.timestamp_forwarded
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        r.origin_message_date
            .map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_default(),
        s.first_name.clone().unwrap_or_default(),
        s.last_name.clone().unwrap_or_default(),
        s.username.clone().unwrap_or_default(),
        s.user_id.map(|id| id.to_string()).unwrap_or_default(),
        s.is_bot.to_string(),
        r.message_kind.as_str().to_string(),
        r.has_media.to_string(),
        collapse_newlines(&r.text),
        r.error.clone().unwrap_or_default(),
    ]
}

/// Write the export to `out`. Returns the number of data rows.
pub fn write_csv<W: Write>(mut out: W, meta: &ExportMeta, log: &ResultLog) -> Result<usize> {
    let rows: Vec<&ForwardResult> = log.successes().collect();

    out.write_all(BOM)?;

    let mut preamble = WriterBuilder::new()
        .flexible(true)
        .quote_style(QuoteStyle::Always)
        .from_writer(out);
    for line in meta.preamble(rows.len()) {
        preamble.write_record([line])?;
    }
    let mut out = preamble
        .into_inner()
        .map_err(|e| RelayError::Io(e.into_error()))?;
    out.write_all(b"\n")?;

    let mut table = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(out);
    table.write_record(HEADERS)?;
    for r in &rows {
        table.write_record(row(r))?;
    }
    table.flush()?;
    Ok(rows.len())
}

/// Write the export to a file, creating parent directories.
pub fn export_to_path(path: &Path, meta: &ExportMeta, log: &ResultLog) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_csv(std::io::BufWriter::new(file), meta, log)
}

/// Default export file name for a date.
pub fn default_file_name(now: DateTime<Utc>) -> String {
    format!("forwarded_messages_{}.csv", now.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::{MessageKind, OriginType, ResultStatus, SenderInfo};
    use chrono::TimeZone;

    fn meta() -> ExportMeta {
        ExportMeta {
            bot_token: "123456:secret".into(),
            source_chat: "-100111".into(),
            target_chat: "-100222".into(),
            start_message_id: 0,
            exported_at: Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap(),
        }
    }

    fn success(id: u64, text: &str) -> ForwardResult {
        ForwardResult {
            original_id: id,
            forwarded_id: id + 500,
            status: ResultStatus::Success,
            timestamp_forwarded: Utc.with_ymd_and_hms(2024, 3, 9, 14, 0, 0).unwrap(),
            origin_message_date: Utc.timestamp_opt(1_700_000_000, 0).single(),
            text: text.to_string(),
            message_kind: MessageKind::Text,
            has_media: false,
            sender_info: SenderInfo {
                first_name: Some("Jane \"JD\"".into()),
                user_id: Some(42),
                origin_type: OriginType::User,
                ..SenderInfo::unknown()
            },
            chat_title: None,
            chat_type: None,
            error: None,
        }
    }

    fn render(log: &ResultLog) -> (usize, String) {
        let mut buf = Vec::new();
        let n = write_csv(&mut buf, &meta(), log).unwrap();
        (n, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn test_preamble_and_header() {
        let (n, out) = render(&ResultLog::new());
        assert_eq!(n, 0);
        assert!(out.starts_with('\u{FEFF}'));
        let lines: Vec<&str> = out.trim_start_matches('\u{FEFF}').lines().collect();
        assert_eq!(lines[0], "\"Bot Token: 123456:secret\"");
        assert_eq!(lines[3], "\"Bot Link: https://t.me/123456\"");
        assert_eq!(lines[4], "\"Export Date: 09-03-2024 14:05:07\"");
        assert_eq!(lines[5], "\"Total Forwarded Messages: 0\"");
        assert_eq!(lines[7], "\"Export Type: Successful Messages Only\"");
        assert_eq!(lines[8], "");
        assert!(lines[9].starts_with("\"Original ID\",\"Status\""));
    }

    #[test]
    fn test_only_successes_newest_first() {
        let mut log = ResultLog::new();
        log.push(success(1, "first"));
        log.push(ForwardResult::failed(2, "gone", Utc::now()));
        log.push(success(3, "line one\nline two"));

        let (n, out) = render(&log);
        assert_eq!(n, 2);
        let data: Vec<&str> = out.lines().skip(10).collect();
        assert_eq!(data.len(), 2);
        assert!(data[0].starts_with("3,"));
        assert!(data[0].contains("\"line one line two\""));
        assert!(data[0].contains("\"Jane \"\"JD\"\"\""));
        assert!(data[1].starts_with("1,"));
        assert!(out.contains("\"Total Forwarded Messages: 2\""));
    }

    #[test]
    fn test_missing_meta_values() {
        let mut m = meta();
        m.bot_token.clear();
        m.source_chat.clear();
        let mut buf = Vec::new();
        write_csv(&mut buf, &m, &ResultLog::new()).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("\"Bot Token: Not configured\""));
        assert!(out.contains("\"Source Chat ID: Not configured\""));
        assert!(out.contains("https://t.me/unknown"));
    }

    #[test]
    fn test_export_to_path_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("export.csv");
        let mut log = ResultLog::new();
        log.push(success(9, "hi"));
        assert_eq!(export_to_path(&path, &meta(), &log).unwrap(), 1);
        assert!(path.exists());
    }

    #[test]
    fn test_default_file_name() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(default_file_name(now), "forwarded_messages_2024-01-02.csv");
    }
}
