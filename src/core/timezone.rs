use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};

/// Layout of gateway timestamps (`YYYYMMDDHHmmss`)
pub const GATEWAY_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Gateway-local time handling.
/// All timestamps are stored as UTC and converted to GMT+7 only when they
/// cross the gateway boundary.
pub struct GatewayClock;

impl GatewayClock {
    fn offset() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).expect("Valid offset")
    }

    /// Convert UTC timestamp to Asia/Ho_Chi_Minh (UTC+7)
    pub fn to_gateway_time(utc_time: DateTime<Utc>) -> DateTime<FixedOffset> {
        utc_time.with_timezone(&Self::offset())
    }

    /// Format a UTC instant as the gateway's `YYYYMMDDHHmmss` local timestamp
    pub fn format(utc_time: DateTime<Utc>) -> String {
        Self::to_gateway_time(utc_time)
            .format(GATEWAY_TIMESTAMP_FORMAT)
            .to_string()
    }

    /// Parse a gateway `YYYYMMDDHHmmss` local timestamp back to UTC
    pub fn parse(value: &str) -> Option<DateTime<Utc>> {
        let naive = NaiveDateTime::parse_from_str(value, GATEWAY_TIMESTAMP_FORMAT).ok()?;
        Self::offset()
            .from_local_datetime(&naive)
            .single()
            .map(|local| local.with_timezone(&Utc))
    }
}
