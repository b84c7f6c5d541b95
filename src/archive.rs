//! Archive path derivation.
//!
//! Remote report keys are partitioned by the capture date:
//! `YYYY/MM/DD/<local report filename>`. The same [`CaptureTimestamp`] also
//! names the default local report, so both always agree.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Format of the timestamp prefix on generated report filenames
pub const REPORT_STAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// The moment a session was configured, in local time
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaptureTimestamp(NaiveDateTime);

impl CaptureTimestamp {
    /// Capture the current local time
    pub fn now() -> Self {
        Self(Local::now().naive_local())
    }

    /// Build a timestamp from calendar fields; `None` if any field is out of range
    pub fn from_ymd_hms(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|d| d.and_hms_opt(hour, min, sec))
            .map(Self)
    }

    /// `YYYYMMDDTHHMMSS`, used to prefix generated report filenames
    pub fn report_stamp(&self) -> String {
        self.0.format(REPORT_STAMP_FORMAT).to_string()
    }

    /// `YYYY/MM/DD` partition prefix
    pub fn date_partition(&self) -> String {
        format!("{:04}/{:02}/{:02}", self.0.year(), self.0.month(), self.0.day())
    }
}

/// Default local report filename: `<stamp>_<prefix>.html`
pub fn report_filename(ts: &CaptureTimestamp, prefix: &str) -> String {
    format!("{}_{}.html", ts.report_stamp(), prefix)
}

/// Remote destination key for a report captured at `ts`
pub fn archive_key(ts: &CaptureTimestamp, local_filename: &str) -> String {
    format!("{}/{}", ts.date_partition(), local_filename)
}

/// Browser URL for an archived object
pub fn browse_url(base: &str, bucket: &str, key: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), bucket, key)
}
