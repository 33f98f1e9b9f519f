use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

pub type Seconds = u32;

/// One observation handed to a forwarder by whatever schedules the writes.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub name: String,
    pub tags: HashMap<String, String>,
    pub fields: HashMap<String, FieldValue>,
    pub timestamp: DateTime<Utc>,
}

impl Sample {
    pub fn with_name<S: AsRef<str>>(name: S) -> Sample {
        Sample {
            name: name.as_ref().to_owned(),
            tags: HashMap::new(),
            fields: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    pub fn tag<K: AsRef<str>, V: AsRef<str>>(mut self, key: K, value: V) -> Sample {
        self.tags.insert(key.as_ref().to_owned(), value.as_ref().to_owned());
        self
    }

    pub fn field<K: AsRef<str>, V: Into<FieldValue>>(mut self, key: K, value: V) -> Sample {
        self.fields.insert(key.as_ref().to_owned(), value.into());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Sample {
        self.timestamp = timestamp;
        self
    }

    /// The `host` tag, if the sample carries one.
    pub fn host(&self) -> Option<&str> {
        self.tags.get("host").map(|host| host.as_str())
    }
}

/// Raw value of a sample field.
///
/// Only numbers and booleans can be aggregated; `Str` exists so that callers
/// can pass samples through untouched and have the text fields dropped.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Int(i64),
    UInt(u64),
    Bool(bool),
    Str(String),
}

impl FieldValue {
    /// Widens the value to a float. Booleans become `1.0`/`0.0` and strings
    /// have no numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            FieldValue::Float(value) => Some(value),
            FieldValue::Int(value)   => Some(value as f64),
            FieldValue::UInt(value)  => Some(value as f64),
            FieldValue::Bool(true)   => Some(1.0),
            FieldValue::Bool(false)  => Some(0.0),
            FieldValue::Str(_)       => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> FieldValue { FieldValue::Float(value) }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> FieldValue { FieldValue::Float(value as f64) }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> FieldValue { FieldValue::Int(value) }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> FieldValue { FieldValue::Int(value as i64) }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> FieldValue { FieldValue::UInt(value) }
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> FieldValue { FieldValue::UInt(value as u64) }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> FieldValue { FieldValue::Bool(value) }
}

impl From<String> for FieldValue {
    fn from(value: String) -> FieldValue { FieldValue::Str(value) }
}

impl<'a> From<&'a str> for FieldValue {
    fn from(value: &'a str) -> FieldValue { FieldValue::Str(value.to_owned()) }
}

/// Running statistics for one metric path.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldStat {
    pub count: u64,
    pub total: f64,
    pub min: f64,
    pub max: f64,
    pub sum_of_squares: f64,
}

impl FieldStat {
    pub fn new(value: f64) -> FieldStat {
        FieldStat {
            count: 1,
            total: value,
            min: value,
            max: value,
            sum_of_squares: value * value,
        }
    }

    pub fn record(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
        self.sum_of_squares += value * value;

        if value > self.max {
            self.max = value;
        }
        if value < self.min {
            self.min = value;
        }
    }

    /// False once any statistic is NaN or infinite. JSON has no way to
    /// carry those values.
    pub fn is_finite(&self) -> bool {
        self.total.is_finite()
            && self.min.is_finite()
            && self.max.is_finite()
            && self.sum_of_squares.is_finite()
    }
}

/// Aggregated metrics for a single (name, tags) group, reported under the
/// host it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct Component {
    pub name: String,
    pub guid: String,
    pub duration: Seconds,
    pub metrics: BTreeMap<String, FieldStat>,
}

impl Component {
    pub fn new<N: AsRef<str>, G: AsRef<str>>(name: N, guid: G, duration: Seconds) -> Component {
        Component {
            name: name.as_ref().to_owned(),
            guid: guid.as_ref().to_owned(),
            duration: duration,
            metrics: BTreeMap::new(),
        }
    }

    /// Folds `value` into the statistics for `path`, creating them on first
    /// sight.
    pub fn record(&mut self, path: String, value: f64) {
        if let Some(stat) = self.metrics.get_mut(&path) {
            stat.record(value);
            return
        }

        self.metrics.insert(path, FieldStat::new(value));
    }
}
