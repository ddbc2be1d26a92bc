//! # Decoded Records
//!
//! A decoded uplink is a [`Document`]: named groups, each an ordered sequence
//! of [`Record`]s. Names may repeat inside a group and insertion order is the
//! payload order, so groups are sequences rather than maps. Groups that never
//! receive a record do not appear.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;

/// Output group a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Device,
    Sensors,
    InternalSensors,
    Status,
    Alerts,
    Errors,
    Drys,
    Probes,
    Modules,
    Lorawan,
}

impl Group {
    pub fn as_str(self) -> &'static str {
        match self {
            Group::Device => "device",
            Group::Sensors => "sensors",
            Group::InternalSensors => "internal_sensors",
            Group::Status => "status",
            Group::Alerts => "alerts",
            Group::Errors => "errors",
            Group::Drys => "drys",
            Group::Probes => "probes",
            Group::Modules => "modules",
            Group::Lorawan => "lorawan",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Min/max/avg aggregate reported by some current-loop channels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

/// Decoded value of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Label(&'static str),
    Stats(Stats),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            Value::Label(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&'static str> for Value {
    fn from(v: &'static str) -> Self {
        Value::Label(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Stats> for Value {
    fn from(v: Stats) -> Self {
        Value::Stats(v)
    }
}

/// One named, optionally unit-tagged reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub value: Value,
    pub unit: Option<&'static str>,
    /// Sample time in epoch seconds, for readings not taken at receive time.
    pub time: Option<i64>,
}

impl Record {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            unit: None,
            time: None,
        }
    }

    pub fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    pub fn with_time(mut self, time: i64) -> Self {
        self.time = Some(time);
        self
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("n", &self.name)?;
        match &self.value {
            Value::Number(v) => map.serialize_entry("v", v)?,
            Value::Text(s) => map.serialize_entry("v", s)?,
            Value::Label(s) => map.serialize_entry("v", s)?,
            Value::Stats(stats) => {
                if let Some(min) = stats.min {
                    map.serialize_entry("min", &min)?;
                }
                if let Some(max) = stats.max {
                    map.serialize_entry("max", &max)?;
                }
                if let Some(avg) = stats.avg {
                    map.serialize_entry("avg", &avg)?;
                }
            }
        }
        if let Some(unit) = self.unit {
            map.serialize_entry("u", unit)?;
        }
        if let Some(time) = self.time {
            map.serialize_entry("bt", &time)?;
        }
        map.end()
    }
}

/// Grouped, ordered output of one decode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    groups: Vec<(Group, Vec<Record>)>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, creating its group on first use.
    pub fn push(&mut self, group: Group, record: Record) {
        match self.groups.iter_mut().find(|(g, _)| *g == group) {
            Some((_, records)) => records.push(record),
            None => self.groups.push((group, vec![record])),
        }
    }

    /// Append every record of `other`, group by group.
    pub fn extend(&mut self, other: Document) {
        for (group, records) in other.groups {
            for record in records {
                self.push(group, record);
            }
        }
    }

    pub fn group(&self, group: Group) -> Option<&[Record]> {
        self.groups
            .iter()
            .find(|(g, _)| *g == group)
            .map(|(_, records)| records.as_slice())
    }

    /// Groups in first-insertion order.
    pub fn groups(&self) -> impl Iterator<Item = (Group, &[Record])> {
        self.groups.iter().map(|(g, r)| (*g, r.as_slice()))
    }

    /// First record named `name` in `group`.
    pub fn find(&self, group: Group, name: &str) -> Option<&Record> {
        self.group(group)?.iter().find(|r| r.name == name)
    }

    /// Numeric value of the first record named `name` in `group`.
    pub fn number(&self, group: Group, name: &str) -> Option<f64> {
        self.find(group, name)?.value.as_f64()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Total records across groups.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|(_, r)| r.len()).sum()
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (group, records) in &self.groups {
            map.serialize_entry(group.as_str(), records)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_keep_first_insertion_order() {
        let mut doc = Document::new();
        doc.push(Group::Sensors, Record::new("a", 1.0));
        doc.push(Group::Device, Record::new("model", "X"));
        doc.push(Group::Sensors, Record::new("b", 2.0));

        let order: Vec<Group> = doc.groups().map(|(g, _)| g).collect();
        assert_eq!(order, vec![Group::Sensors, Group::Device]);
        assert_eq!(doc.group(Group::Sensors).unwrap().len(), 2);
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_repeated_names_are_kept() {
        let mut doc = Document::new();
        doc.push(Group::Probes, Record::new("temperature", 20.0).with_unit("C"));
        doc.push(Group::Probes, Record::new("temperature", 21.0).with_unit("C"));
        assert_eq!(doc.group(Group::Probes).unwrap().len(), 2);
        assert_eq!(doc.number(Group::Probes, "temperature"), Some(20.0));
    }

    #[test]
    fn test_empty_groups_are_absent() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert!(doc.group(Group::Alerts).is_none());
        assert_eq!(serde_json::to_string(&doc).unwrap(), "{}");
    }

    #[test]
    fn test_serialize_shape() {
        let mut doc = Document::new();
        doc.push(Group::Device, Record::new("model", "ITE 11LI"));
        doc.push(
            Group::Sensors,
            Record::new("temperature", 21.5).with_unit("C").with_time(100),
        );
        doc.push(
            Group::Modules,
            Record::new(
                "e1_curr",
                Value::Stats(Stats {
                    min: Some(4.0),
                    max: None,
                    avg: Some(8.0),
                }),
            )
            .with_unit("mA"),
        );

        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(
            json,
            r#"{"device":[{"n":"model","v":"ITE 11LI"}],"sensors":[{"n":"temperature","v":21.5,"u":"C","bt":100}],"modules":[{"n":"e1_curr","min":4.0,"avg":8.0,"u":"mA"}]}"#
        );
    }
}
