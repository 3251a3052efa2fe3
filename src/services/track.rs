use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::MalformedRecord;
use crate::ports::spotify::SavedTrackRecord;

/// Wire format of the `added_at` field.
pub const ADDED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One track from the user's library, with the instant it was saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedTrack {
    pub id: String,
    pub name: String,
    pub added_at: DateTime<Utc>,
}

impl SavedTrack {
    /// Build a track from a raw catalog record. Pure, no I/O.
    pub fn parse(record: &SavedTrackRecord) -> Result<Self, MalformedRecord> {
        let id = match record.track_id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                return Err(MalformedRecord {
                    reason: "entry has no track id".to_string(),
                });
            }
        };

        let name = record.track_name.clone().ok_or_else(|| MalformedRecord {
            reason: format!("track {id} has no name"),
        })?;

        let added_at = NaiveDateTime::parse_from_str(&record.added_at, ADDED_AT_FORMAT)
            .map_err(|err| MalformedRecord {
                reason: format!("unparseable added_at '{}': {err}", record.added_at),
            })?
            .and_utc();

        Ok(Self { id, name, added_at })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn record(
        added_at: &str,
        track_id: Option<&str>,
        track_name: Option<&str>,
    ) -> SavedTrackRecord {
        SavedTrackRecord {
            added_at: added_at.to_string(),
            track_id: track_id.map(Into::into),
            track_name: track_name.map(Into::into),
        }
    }

    #[test]
    fn test_parse_valid_record() {
        let track =
            SavedTrack::parse(&record("2024-01-15T10:00:00Z", Some("t1"), Some("Song One")))
                .unwrap();

        assert_eq!(track.id, "t1");
        assert_eq!(track.name, "Song One");
        assert_eq!(
            track.added_at,
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_rejects_missing_track_id() {
        let err =
            SavedTrack::parse(&record("2024-01-15T10:00:00Z", None, Some("Song"))).unwrap_err();
        assert!(err.reason.contains("no track id"));
    }

    #[test]
    fn test_parse_rejects_empty_track_id() {
        let err = SavedTrack::parse(&record("2024-01-15T10:00:00Z", Some(""), Some("Song")))
            .unwrap_err();
        assert!(err.reason.contains("no track id"));
    }

    #[test]
    fn test_parse_rejects_missing_name() {
        let err = SavedTrack::parse(&record("2024-01-15T10:00:00Z", Some("t1"), None)).unwrap_err();
        assert!(err.reason.contains("no name"));
    }

    #[test]
    fn test_parse_rejects_bad_timestamp() {
        let err =
            SavedTrack::parse(&record("January 15, 2024", Some("t1"), Some("Song"))).unwrap_err();
        assert!(err.reason.contains("unparseable added_at"));
    }
}
