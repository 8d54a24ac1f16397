//! Data models for the silo dashboard.
//!
//! `RawReading` is the wire shape returned by the inventory API. Defaults are
//! applied here, at the ingestion boundary, so the aggregator and the routes
//! only ever see `Silo`, `Branch` and `Summary` with well-formed numbers.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

// ---

/// Capacity used when a reading has none, or a non-positive one.
pub const DEFAULT_CAPACITY: f64 = 1000.0;

/// Fill percentage below which a silo is flagged as low.
pub const LOW_CAPACITY_THRESHOLD: f64 = 35.0;

const SILO_LABEL: &str = "ไซโล";
const BRANCH_LABEL: &str = "สาขา";
const UNKNOWN_MATERIAL: &str = "ไม่ทราบประเภท";
const UNKNOWN_SITE: &str = "N/A";

/// Raw device reading from the inventory API, one per device.
///
/// Every field is optional on the wire. Numbers and identifiers are accepted
/// either as JSON strings or numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    // ---
    #[serde(default, deserialize_with = "lenient_string")]
    pub device_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub province: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub capacity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub plant_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub site_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub silo_no: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl RawReading {
    // ---
    /// Province exactly as sent, or `None` when it is missing or blank.
    /// Readings without one are excluded from every branch.
    pub fn province_key(&self) -> Option<&str> {
        self.province
            .as_deref()
            .filter(|p| !p.trim().is_empty())
    }

    /// Capacity with the default applied; always strictly positive.
    pub fn capacity(&self) -> f64 {
        match self.capacity {
            Some(c) if c.is_finite() && c > 0.0 => c,
            _ => DEFAULT_CAPACITY,
        }
    }

    /// Current volume, never negative.
    pub fn volume(&self) -> f64 {
        match self.volume {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => 0.0,
        }
    }

    /// Derive the display silo for this reading. `index` is the reading's
    /// position in the fetched sequence and feeds the id/name fallbacks.
    pub fn to_silo(&self, index: usize) -> Silo {
        // ---
        let device_id = non_blank(&self.device_id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("device-{}", index));

        let name = match non_blank(&self.silo_no) {
            Some(no) => format!("{} {}", SILO_LABEL, no),
            None => format!("{} {}", SILO_LABEL, index + 1),
        };

        Silo {
            id: device_id.clone(),
            name,
            material: non_blank(&self.plant_type)
                .unwrap_or(UNKNOWN_MATERIAL)
                .to_string(),
            capacity: self.capacity(),
            current_amount: self.volume(),
            device_id,
            site_code: non_blank(&self.site_code)
                .unwrap_or(UNKNOWN_SITE)
                .to_string(),
            last_updated: self.timestamp,
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// A single monitored storage unit.
///
/// `percentage` and `is_low_capacity` are computed on demand from the stored
/// amounts, so they can never drift from `capacity`/`current_amount`.
#[derive(Debug, Clone, PartialEq)]
pub struct Silo {
    // ---
    pub id: String,
    pub name: String,
    pub material: String,
    pub capacity: f64,
    pub current_amount: f64,
    pub device_id: String,
    pub site_code: String,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Silo {
    // ---
    pub fn percentage(&self) -> f64 {
        self.current_amount / self.capacity * 100.0
    }

    pub fn is_low_capacity(&self) -> bool {
        self.percentage() < LOW_CAPACITY_THRESHOLD
    }

    /// Whole-number percentage as shown in cards and tables.
    pub fn rounded_percentage(&self) -> i64 {
        self.percentage().round() as i64
    }
}

impl Serialize for Silo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Silo", 10)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("material", &self.material)?;
        s.serialize_field("capacity", &self.capacity)?;
        s.serialize_field("current_amount", &self.current_amount)?;
        s.serialize_field("percentage", &self.percentage())?;
        s.serialize_field("is_low_capacity", &self.is_low_capacity())?;
        s.serialize_field("device_id", &self.device_id)?;
        s.serialize_field("site_code", &self.site_code)?;
        s.serialize_field("last_updated", &self.last_updated)?;
        s.end()
    }
}

/// Silos grouped by province.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    // ---
    pub id: String,
    pub name: String,
    pub location: String,
    pub silos: Vec<Silo>,
    pub total_capacity: f64,
    pub total_used: f64,
    pub low_capacity_silos: usize,
}

impl Branch {
    // ---
    pub fn new(province: &str) -> Self {
        Branch {
            id: province.to_string(),
            name: format!("{}{}", BRANCH_LABEL, province),
            location: province.to_string(),
            silos: Vec::new(),
            total_capacity: 0.0,
            total_used: 0.0,
            low_capacity_silos: 0,
        }
    }

    /// Append a silo, keeping the running totals in step.
    pub fn push(&mut self, silo: Silo) {
        self.total_capacity += silo.capacity;
        self.total_used += silo.current_amount;
        if silo.is_low_capacity() {
            self.low_capacity_silos += 1;
        }
        self.silos.push(silo);
    }

    /// Rounded fill level of the whole branch; 0 for an empty branch.
    pub fn usage_percentage(&self) -> i64 {
        if self.total_capacity > 0.0 {
            (self.total_used / self.total_capacity * 100.0).round() as i64
        } else {
            0
        }
    }

    pub fn active_silos(&self) -> usize {
        self.silos.len() - self.low_capacity_silos
    }

    pub fn silo(&self, silo_id: &str) -> Option<&Silo> {
        self.silos.iter().find(|s| s.id == silo_id)
    }
}

impl Serialize for Branch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Branch", 10)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("location", &self.location)?;
        s.serialize_field("silos", &self.silos)?;
        s.serialize_field("silo_count", &self.silos.len())?;
        s.serialize_field("total_capacity", &self.total_capacity)?;
        s.serialize_field("total_used", &self.total_used)?;
        s.serialize_field("usage_percentage", &self.usage_percentage())?;
        s.serialize_field("low_capacity_silos", &self.low_capacity_silos)?;
        s.serialize_field("active_silos", &self.active_silos())?;
        s.end()
    }
}

/// Whole-dataset statistics for the overview cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    // ---
    pub total_branches: usize,
    pub total_silos: usize,
    pub total_capacity: f64,
    pub total_used: f64,
    pub total_usage_percentage: f64,
    pub total_low_capacity: usize,
}

impl Summary {
    // ---
    /// Recompute the percentage from the running totals. Zero capacity yields 0.
    pub fn finish(mut self) -> Self {
        self.total_usage_percentage = if self.total_capacity > 0.0 {
            self.total_used / self.total_capacity * 100.0
        } else {
            0.0
        };
        self
    }
}

/// One point of a silo's volume history, used by the detail view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    // ---
    #[serde(deserialize_with = "strict_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume_percentage: Option<f64>,
}

/// Payload for registering a new silo with the inventory API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSilo {
    // ---
    pub device_id: String,
    pub plant_type: String,
    pub province: String,
    pub site_code: String,
    pub silo_no: String,
}

impl NewSilo {
    // ---
    /// Every field is required and must not be blank.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("device_id", &self.device_id),
            ("plant_type", &self.plant_type),
            ("province", &self.province),
            ("site_code", &self.site_code),
            ("silo_no", &self.silo_no),
        ];
        match fields.iter().find(|(_, v)| v.trim().is_empty()) {
            Some((name, _)) => Err(format!("{} is required", name)),
            None => Ok(()),
        }
    }
}

// ---

/// Parse RFC 3339, falling back to a naive ISO-8601 stamp read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    // ---
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => parse_timestamp(&s),
        _ => None,
    })
}

fn strict_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", raw)))
}
