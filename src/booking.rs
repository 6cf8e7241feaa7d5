//! The booking record exchanged between extraction, review and generation.
//!
//! The record is whatever the model managed to read off the document, so
//! decoding is deliberately forgiving: numbers may arrive as strings
//! (`"LKR 1,250.00"`), identifiers may arrive as numbers, and keys we do not
//! know about are kept in [`BookingRecord::extra`] so they survive the review
//! step and reach the generation prompt unchanged.
//!
//! Nothing here repairs the record. The helpers (`effective_balance`,
//! `payment_status`, `stay_nights`, …) only *read* it, which keeps what the
//! operator saw in review identical to what the generator receives.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Fields that must be present for a direct booking.
pub const DIRECT_REQUIRED_FIELDS: &[&str] = &["guest_name", "email", "check_in", "check_out", "res_id"];

/// Agent bookings are made before the guest's own contact details are known,
/// so email is not required.
pub const AGENT_REQUIRED_FIELDS: &[&str] = &["guest_name", "check_in", "check_out", "res_id"];

/// Payment term from the brand guide: balance falls due this many days before arrival.
pub const BALANCE_DUE_DAYS_BEFORE_CHECK_IN: i64 = 14;

const DATE_FORMAT: &str = "%d/%m/%Y";

/// Whether the booking came straight from the guest or through an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingType {
    #[default]
    Direct,
    Agent,
}

impl BookingType {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingType::Direct => "direct",
            BookingType::Agent => "agent",
        }
    }
}

impl fmt::Display for BookingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Anything other than "agent" (including null) is a direct booking.
impl<'de> Deserialize<'de> for BookingType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<Value>::deserialize(deserializer)?;
        let is_agent = matches!(
            value,
            Some(Value::String(ref s)) if s.trim().eq_ignore_ascii_case("agent")
        );
        Ok(if is_agent {
            BookingType::Agent
        } else {
            BookingType::Direct
        })
    }
}

/// One room line of a booking.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Room {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub room_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub adults: Option<u32>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub children: Option<u32>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub rate_per_night: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub total_rate: Option<f64>,
}

/// Travel agent / tour operator details, meaningful for agent bookings only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub agent_contact: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub agent_email: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub tour_reference: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub voucher_number: Option<String>,
}

/// Structured booking data produced by extraction and consumed by generation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    #[serde(default)]
    pub booking_type: BookingType,

    // ── Identity ──────────────────────────────────────────────────────────
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub res_id: Option<String>,

    // ── Guest ─────────────────────────────────────────────────────────────
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub guest_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub primary_contact: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,

    // ── Stay ──────────────────────────────────────────────────────────────
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub check_in: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub check_out: Option<String>,
    #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
    pub nights: Option<u32>,
    #[serde(default, deserialize_with = "lenient::rooms")]
    pub rooms: Vec<Room>,

    // ── Money ─────────────────────────────────────────────────────────────
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub deposit_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub amount_paid: Option<f64>,
    #[serde(default, deserialize_with = "lenient::number", skip_serializing_if = "Option::is_none")]
    pub balance_due: Option<f64>,

    // ── Provenance ────────────────────────────────────────────────────────
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub reserved_date: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub booking_via: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub heard_about: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_info: Option<AgentInfo>,

    /// Keys the model or the operator added that we do not model explicitly.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Which payment-status branch the confirmation should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing paid yet (balance equals the total).
    Unpaid,
    /// Something paid, something outstanding.
    Partial,
    /// Balance is zero.
    FullyPaid,
}

impl PaymentStatus {
    pub fn label(self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "UNPAID",
            PaymentStatus::Partial => "PARTIALLY PAID",
            PaymentStatus::FullyPaid => "FULLY PAID",
        }
    }
}

/// The two orthogonal conditions that select the confirmation layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub booking_type: BookingType,
    pub room_count: usize,
}

impl Layout {
    pub fn is_multi_room(&self) -> bool {
        self.room_count > 1
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}-room", self.booking_type, self.room_count)
    }
}

/// Required fields for a booking type.
pub fn required_fields(booking_type: BookingType) -> &'static [&'static str] {
    match booking_type {
        BookingType::Agent => AGENT_REQUIRED_FIELDS,
        BookingType::Direct => DIRECT_REQUIRED_FIELDS,
    }
}

impl BookingRecord {
    /// Required fields that are absent or blank. Callers log these as
    /// warnings; they never block the workflow.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        required_fields(self.booking_type)
            .iter()
            .copied()
            .filter(|name| is_blank(self.text_field(name)))
            .collect()
    }

    fn text_field(&self, name: &str) -> Option<&str> {
        let value = match name {
            "res_id" => &self.res_id,
            "guest_name" => &self.guest_name,
            "email" => &self.email,
            "check_in" => &self.check_in,
            "check_out" => &self.check_out,
            _ => return None,
        };
        value.as_deref()
    }

    pub fn is_agent(&self) -> bool {
        self.booking_type == BookingType::Agent
    }

    pub fn layout(&self) -> Layout {
        Layout {
            booking_type: self.booking_type,
            room_count: self.rooms.len(),
        }
    }

    /// Guest name for log lines and summaries.
    pub fn guest_label(&self) -> &str {
        self.guest_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("Unknown")
    }

    /// Reservation id used as the file key; `unknown` when absent.
    pub fn res_id_or_unknown(&self) -> &str {
        self.res_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown")
    }

    /// `balance_due` when stated, otherwise `total_amount - amount_paid`.
    pub fn effective_balance(&self) -> Option<f64> {
        self.balance_due.or_else(|| {
            let total = self.total_amount?;
            Some(total - self.amount_paid.unwrap_or(0.0))
        })
    }

    /// Payment-status branch, or `None` if the amounts are unknown.
    pub fn payment_status(&self) -> Option<PaymentStatus> {
        const CENT: f64 = 0.005;
        let balance = self.effective_balance()?;
        if balance <= CENT {
            return Some(PaymentStatus::FullyPaid);
        }
        match self.total_amount {
            Some(total) if balance >= total - CENT => Some(PaymentStatus::Unpaid),
            _ => Some(PaymentStatus::Partial),
        }
    }

    pub fn check_in_date(&self) -> Option<NaiveDate> {
        self.check_in.as_deref().and_then(parse_date)
    }

    pub fn check_out_date(&self) -> Option<NaiveDate> {
        self.check_out.as_deref().and_then(parse_date)
    }

    /// Stated nights, or the day count between check-in and check-out.
    pub fn stay_nights(&self) -> Option<u32> {
        if self.nights.is_some() {
            return self.nights;
        }
        let days = (self.check_out_date()? - self.check_in_date()?).num_days();
        u32::try_from(days).ok().filter(|d| *d > 0)
    }

    /// Date the outstanding balance falls due, formatted DD/MM/YYYY.
    pub fn balance_due_date(&self) -> Option<String> {
        let due = self.check_in_date()? - Duration::days(BALANCE_DUE_DAYS_BEFORE_CHECK_IN);
        Some(due.format(DATE_FORMAT).to_string())
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |s| s.trim().is_empty())
}

/// Parse a DD/MM/YYYY date, accepting ISO dates as a fallback.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}

mod lenient {
    //! Field decoders that accept what models actually emit.

    use super::Room;
    use once_cell::sync::Lazy;
    use regex::Regex;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    static RE_AMOUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"-?\d[\d,]*(?:\.\d+)?").unwrap());

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(to_f64))
    }

    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        Ok(number(d)?
            .filter(|n| n.is_finite() && *n >= 0.0 && *n <= u32::MAX as f64)
            .map(|n| n.round() as u32))
    }

    /// `rooms: null` decodes as no rooms.
    pub fn rooms<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Room>, D::Error> {
        Ok(Option::<Vec<Room>>::deserialize(d)?.unwrap_or_default())
    }

    fn to_f64(v: &Value) -> Option<f64> {
        match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parse_amount(s),
            _ => None,
        }
    }

    /// First number in the string, thousands separators dropped:
    /// "Rs. 5,000" → 5000, "LKR 1,250.50 (incl. tax)" → 1250.5.
    /// Returns `None` when no digits are present.
    pub fn parse_amount(s: &str) -> Option<f64> {
        let token = RE_AMOUNT.find(s)?.as_str().replace(',', "");
        token.parse().ok()
    }
}
