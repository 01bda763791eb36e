//! Validated JSON request bodies.

use axum::Json;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;
use url::Url;

use crate::error::ApiError;

/// Field-level checks run after a body deserializes.
pub trait Validate {
    /// Every problem with the body; empty when it is acceptable.
    fn validate(&self) -> Vec<String>;
}

/// JSON body extractor that rejects malformed or invalid bodies with 400.
#[derive(Debug)]
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(body) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::InvalidData(vec![rejection.body_text()]))?;

        let errors = body.validate();
        if !errors.is_empty() {
            return Err(ApiError::InvalidData(errors));
        }
        Ok(Self(body))
    }
}

/// Collects validation failures for one body.
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<String>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_len(mut self, name: &str, value: &str, min: usize) -> Self {
        if value.trim().chars().count() < min {
            self.errors.push(format!(
                "Property '{}' must be at least {} characters",
                name, min
            ));
        }
        self
    }

    pub fn opt_min_len(self, name: &str, value: Option<&str>, min: usize) -> Self {
        match value {
            Some(v) => self.min_len(name, v, min),
            None => self,
        }
    }

    pub fn email(mut self, name: &str, value: &str) -> Self {
        // Simple email validation (contains @ and .)
        let valid = value
            .trim()
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid {
            self.errors
                .push(format!("Property '{}' is not a valid email address", name));
        }
        self
    }

    pub fn uri(mut self, name: &str, value: &str) -> Self {
        if Url::parse(value).is_err() {
            self.errors.push(format!("Property '{}' is not a valid URI", name));
        }
        self
    }

    pub fn check(mut self, ok: bool, message: &str) -> Self {
        if !ok {
            self.errors.push(message.to_string());
        }
        self
    }

    pub fn finish(self) -> Vec<String> {
        self.errors
    }
}

/// Lenient date and time decoding for request bodies.
///
/// Clients send either a calendar date (`YYYY-MM-DD`) or a full RFC 3339
/// timestamp; timestamps are normalized to UTC.
pub mod dates {
    use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
    use serde::{Deserialize, Deserializer};

    pub fn parse_date(raw: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .or_else(|| parse_datetime(raw).map(|dt| dt.date_naive()))
    }

    pub fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .ok()
                    .map(|d| d.and_time(NaiveTime::MIN).and_utc())
            })
    }

    pub fn date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_date(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw)))
    }

    pub fn opt_date<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse_date(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw))),
            None => Ok(None),
        }
    }

    pub fn datetime<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_datetime(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date-time: {}", raw)))
    }

    pub fn opt_datetime<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse_datetime(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date-time: {}", raw))),
            None => Ok(None),
        }
    }
}
