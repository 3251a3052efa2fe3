use chrono::{DateTime, Datelike, TimeZone, Utc};

/// Configuration surface of the monthly sync.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Tracks saved at or before this instant count as already handled.
    pub watermark: DateTime<Utc>,
    /// strftime pattern used to name month playlists, e.g. `%b '%y` -> "Jan '24".
    pub name_format: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            watermark: start_of_current_month(),
            name_format: "%b '%y".to_string(),
        }
    }
}

/// First instant of the current month, UTC.
pub fn start_of_current_month() -> DateTime<Utc> {
    let now = Utc::now();
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .expect("first day of the current month is a valid timestamp")
}

#[cfg(test)]
mod tests {
    use chrono::Timelike;

    use super::*;

    #[test]
    fn default_watermark_is_start_of_current_month() {
        let options = SyncOptions::default();
        assert_eq!(options.watermark.day(), 1);
        assert_eq!(options.watermark.hour(), 0);
        assert_eq!(options.watermark.minute(), 0);
        assert_eq!(options.watermark.month(), Utc::now().month());
    }

    #[test]
    fn default_name_format_is_month_and_year() {
        assert_eq!(SyncOptions::default().name_format, "%b '%y");
    }
}
