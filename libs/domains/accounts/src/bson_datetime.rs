//! Serde adapters storing `chrono` timestamps as native BSON dates
//!
//! chrono's own serde impl writes RFC 3339 strings, which MongoDB compares
//! lexically. Range filters such as `createdDate < cutoff` need real dates.

use chrono::{DateTime, Utc};
use mongodb::bson;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error};

pub fn to_bson(value: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(value.timestamp_millis())
}

fn from_bson<E: Error>(value: bson::DateTime) -> Result<DateTime<Utc>, E> {
    DateTime::from_timestamp_millis(value.timestamp_millis())
        .ok_or_else(|| E::custom(format!("timestamp {} is out of range", value.timestamp_millis())))
}

pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    to_bson(*value).serialize(serializer)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    from_bson(bson::DateTime::deserialize(deserializer)?)
}

pub mod optional {
    use super::*;

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(to_bson).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<bson::DateTime>::deserialize(deserializer)?
            .map(from_bson)
            .transpose()
    }
}
