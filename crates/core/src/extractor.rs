use crate::provider::{MetadataRecord, TIMESTAMP_TAGS};
use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([0-9]+):([0-9]+):([0-9]+) ([0-9]+):([0-9]+):([0-9]+)(?:[+-][0-9]+:[0-9]+)?$",
    )
    .expect("Invalid timestamp regex")
});

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("作成日時の値が不正です: {value} ({source_file})")]
pub struct InvalidTimestampError {
    pub value: String,
    pub source_file: String,
}

pub fn creation_datetime(record: &MetadataRecord) -> Result<Option<NaiveDateTime>> {
    let source_file = record
        .source_file()
        .context("メタデータに SourceFile がありません")?;

    let Some(raw) = TIMESTAMP_TAGS.iter().find_map(|tag| record.get_str(tag)) else {
        eprintln!("作成日時が見つからないためスキップします: {source_file}");
        return Ok(None);
    };

    let Some(captures) = TIMESTAMP_RE.captures(raw) else {
        eprintln!("作成日時を解析できないためスキップします: {raw} ({source_file})");
        return Ok(None);
    };

    let invalid = || InvalidTimestampError {
        value: raw.to_string(),
        source_file: source_file.to_string(),
    };
    let group = |index: usize| captures.get(index).map_or("", |m| m.as_str());

    let year = group(1).parse::<i32>().map_err(|_| invalid())?;
    let month = group(2).parse::<u32>().map_err(|_| invalid())?;
    let day = group(3).parse::<u32>().map_err(|_| invalid())?;
    let hour = group(4).parse::<u32>().map_err(|_| invalid())?;
    let minute = group(5).parse::<u32>().map_err(|_| invalid())?;
    let second = group(6).parse::<u32>().map_err(|_| invalid())?;

    let datetime = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .ok_or_else(invalid)?;
    Ok(Some(datetime))
}

#[cfg(test)]
mod tests {
    use super::{creation_datetime, InvalidTimestampError};
    use crate::provider::MetadataRecord;
    use chrono::NaiveDate;

    fn record(json: &str) -> MetadataRecord {
        serde_json::from_str(json).expect("record")
    }

    fn expected(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .expect("date")
            .and_hms_opt(h, mi, s)
            .expect("time")
    }

    #[test]
    fn parses_plain_exif_timestamp() {
        let record =
            record(r#"{"SourceFile": "a.jpg", "EXIF:DateTimeOriginal": "2023:05:01 14:30:00"}"#);
        assert_eq!(
            creation_datetime(&record).expect("ok"),
            Some(expected(2023, 5, 1, 14, 30, 0))
        );
    }

    #[test]
    fn discards_timezone_offset_without_converting() {
        let positive = record(
            r#"{"SourceFile": "b.mov", "QuickTime:CreationDate": "2023:05:01 14:30:00+02:00"}"#,
        );
        assert_eq!(
            creation_datetime(&positive).expect("ok"),
            Some(expected(2023, 5, 1, 14, 30, 0))
        );

        let negative = record(
            r#"{"SourceFile": "b.mov", "QuickTime:CreationDate": "2023:05:01 14:30:00-08:00"}"#,
        );
        assert_eq!(
            creation_datetime(&negative).expect("ok"),
            Some(expected(2023, 5, 1, 14, 30, 0))
        );
    }

    #[test]
    fn photo_field_wins_over_video_field() {
        let record = record(
            r#"{
                "SourceFile": "a.jpg",
                "EXIF:DateTimeOriginal": "2020:01:02 03:04:05",
                "QuickTime:CreationDate": "2021:06:07 08:09:10"
            }"#,
        );
        assert_eq!(
            creation_datetime(&record).expect("ok"),
            Some(expected(2020, 1, 2, 3, 4, 5))
        );
    }

    #[test]
    fn missing_timestamp_fields_are_skipped_not_fatal() {
        let record = record(r#"{"SourceFile": "a.jpg", "File:FileSize": "12 kB"}"#);
        assert_eq!(creation_datetime(&record).expect("ok"), None);
    }

    #[test]
    fn unparseable_value_is_skipped_not_fatal() {
        for value in [
            "not-a-date",
            "2023:05:01",
            "2023:05:01 14:30:00 DST",
            "2023-05-01 14:30:00",
            "２０２３:05:01 14:30:00",
        ] {
            let record = record(&format!(
                r#"{{"SourceFile": "a.jpg", "EXIF:DateTimeOriginal": "{value}"}}"#
            ));
            assert_eq!(creation_datetime(&record).expect("ok"), None, "{value}");
        }
    }

    #[test]
    fn out_of_range_calendar_value_is_fatal() {
        for value in [
            "2023:13:01 14:30:00",
            "2023:02:30 14:30:00",
            "2023:05:01 25:30:00",
            "99999999999:05:01 14:30:00",
        ] {
            let record = record(&format!(
                r#"{{"SourceFile": "a.jpg", "EXIF:DateTimeOriginal": "{value}"}}"#
            ));
            let err = creation_datetime(&record).expect_err("fatal");
            let invalid = err
                .downcast_ref::<InvalidTimestampError>()
                .expect("typed error");
            assert_eq!(invalid.value, value);
            assert_eq!(invalid.source_file, "a.jpg");
        }
    }

    #[test]
    fn record_without_source_file_is_fatal() {
        let record = record(r#"{"EXIF:DateTimeOriginal": "2023:05:01 14:30:00"}"#);
        assert!(creation_datetime(&record).is_err());
    }
}
