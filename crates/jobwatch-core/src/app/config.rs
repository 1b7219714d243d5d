//! Serde helpers for configuration: durations are written as milliseconds.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serializer};

pub mod millis {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

pub mod opt_millis {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => super::millis::serialize(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(deserializer).map(|v| v.map(Duration::from_millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "millis")]
        interval: Duration,
        #[serde(default, with = "opt_millis")]
        deadline: Option<Duration>,
    }

    #[test]
    fn durations_are_milliseconds() {
        let s: Sample = serde_json::from_str(r#"{"interval":500}"#).unwrap();
        assert_eq!(s.interval, Duration::from_millis(500));
        assert_eq!(s.deadline, None);

        let json = serde_json::to_value(Sample {
            interval: Duration::from_secs(1),
            deadline: Some(Duration::from_secs(60)),
        })
        .unwrap();
        assert_eq!(json["interval"], 1000);
        assert_eq!(json["deadline"], 60000);
    }
}
