//! Data models for the EV Tracker API.
//!
//! Every type here is an immutable snapshot of one server response (or, for
//! [`SessionLog`], a draft assembled before submission). Wire field names are
//! camelCase and are mapped via serde; timestamps travel as UTC with a `Z`
//! suffix.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

/// An electric car registered to the account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Vehicle {
    /// Server-assigned identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Manufacturer, if recorded
    #[serde(default)]
    pub make: Option<String>,
    /// Model designation, if recorded
    #[serde(default)]
    pub model: Option<String>,
    /// Model year, if recorded
    #[serde(default)]
    pub year: Option<i32>,
}

/// Origin of the charged energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnergySource {
    /// Energy drawn from the grid
    Grid,
    /// Energy from a local photovoltaic installation
    Solar,
}

impl EnergySource {
    /// Wire representation of the value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "GRID",
            Self::Solar => "SOLAR",
        }
    }
}

impl fmt::Display for EnergySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnergySource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GRID" => Ok(Self::Grid),
            "SOLAR" => Ok(Self::Solar),
            other => Err(Error::Validation(format!("unknown energy source: {other}"))),
        }
    }
}

/// Electricity pricing tier applicable to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateTier {
    /// Off-peak tariff
    Low,
    /// Peak tariff
    High,
}

impl RateTier {
    /// Wire representation of the value.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for RateTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RateTier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "HIGH" => Ok(Self::High),
            other => Err(Error::Validation(format!("unknown rate tier: {other}"))),
        }
    }
}

/// One logged charging event, as returned by the server.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingSession {
    /// Server-assigned identifier
    pub id: i64,
    /// Energy consumed in kWh
    #[serde(rename = "energyConsumedKwh", default)]
    pub energy_kwh: f64,
    /// Total cost including VAT, if priced
    #[serde(rename = "totalCost", default)]
    pub cost: Option<f64>,
    /// When charging started
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub start_time: Option<DateTime<Utc>>,
    /// When charging ended
    #[serde(default, deserialize_with = "lenient_datetime")]
    pub end_time: Option<DateTime<Utc>>,
    /// Charging location
    #[serde(default)]
    pub location: Option<String>,
    /// Origin of the charged energy
    #[serde(default)]
    pub energy_source: Option<EnergySource>,
    /// Pricing tier the session was billed at
    #[serde(rename = "rateType", default)]
    pub rate_tier: Option<RateTier>,
}

/// Derived monthly and yearly statistics, a read-only snapshot.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateState {
    /// Energy charged this month, kWh
    #[serde(default)]
    pub monthly_energy: f64,
    /// Cost of this month's charging
    #[serde(default)]
    pub monthly_cost: f64,
    /// Number of sessions logged this month
    #[serde(default)]
    pub monthly_sessions: u32,
    /// Energy charged this year, kWh
    #[serde(default)]
    pub yearly_energy: f64,
    /// Cost of this year's charging
    #[serde(default)]
    pub yearly_cost: f64,
    /// Energy of the most recent session, if any
    #[serde(default)]
    pub last_session_energy: Option<f64>,
    /// Cost of the most recent session, if any
    #[serde(default)]
    pub last_session_cost: Option<f64>,
    /// Average cost per kWh over the tracked period, if computable
    #[serde(default)]
    pub avg_cost_per_kwh: Option<f64>,
}

/// A charging session draft assembled client-side before submission.
///
/// All fields are optional so a draft can be built up incrementally;
/// [`SessionLog::validate`] enforces the required ones before any request
/// is sent. Unset fields are omitted from the outgoing payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionLog {
    /// Energy consumed in kWh; the only required field
    pub energy_kwh: Option<f64>,
    /// When charging started
    pub start_time: Option<DateTime<Utc>>,
    /// When charging ended
    pub end_time: Option<DateTime<Utc>>,
    /// Car to associate with the session
    pub vehicle_id: Option<i64>,
    /// Charging location
    pub location: Option<String>,
    /// External identifier for idempotent submission
    pub external_id: Option<String>,
    /// Charging provider name
    pub provider: Option<String>,
    /// Origin of the charged energy
    pub energy_source: Option<EnergySource>,
    /// Pricing tier to bill the session at
    pub rate_tier: Option<RateTier>,
    /// Price per kWh without VAT
    pub price_per_kwh: Option<f64>,
    /// VAT percentage applied on top of the price
    pub vat_percentage: Option<f64>,
    /// Free-form notes
    pub notes: Option<String>,
}

impl SessionLog {
    /// Start a draft with the required energy amount.
    #[must_use]
    pub fn new(energy_kwh: f64) -> Self {
        Self {
            energy_kwh: Some(energy_kwh),
            ..Self::default()
        }
    }

    /// Set the start time.
    #[must_use]
    pub fn with_start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Set the end time.
    #[must_use]
    pub fn with_end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    /// Associate the session with a car.
    #[must_use]
    pub fn with_vehicle(mut self, vehicle_id: i64) -> Self {
        self.vehicle_id = Some(vehicle_id);
        self
    }

    /// Set the charging location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set an external identifier for idempotent submission.
    #[must_use]
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// Set the charging provider.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Set the energy source.
    #[must_use]
    pub fn with_source(mut self, source: EnergySource) -> Self {
        self.energy_source = Some(source);
        self
    }

    /// Set the rate tier.
    #[must_use]
    pub fn with_rate_tier(mut self, rate_tier: RateTier) -> Self {
        self.rate_tier = Some(rate_tier);
        self
    }

    /// Set the price per kWh without VAT.
    #[must_use]
    pub fn with_price_per_kwh(mut self, price: f64) -> Self {
        self.price_per_kwh = Some(price);
        self
    }

    /// Set the VAT percentage.
    #[must_use]
    pub fn with_vat_percentage(mut self, vat: f64) -> Self {
        self.vat_percentage = Some(vat);
        self
    }

    /// Attach free-form notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Check the draft against the required-field rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the energy amount is missing,
    /// not finite, or not positive.
    pub fn validate(&self) -> Result<(), Error> {
        let Some(energy) = self.energy_kwh else {
            return Err(Error::Validation("energy_kwh is required".to_string()));
        };
        if !energy.is_finite() || energy <= 0.0 {
            return Err(Error::Validation(format!(
                "energy_kwh must be a positive amount, got {energy}"
            )));
        }
        Ok(())
    }

    /// Build the outgoing wire payload. Call [`SessionLog::validate`] first.
    pub(crate) fn to_payload(&self) -> SessionPayload {
        SessionPayload {
            energy_consumed_kwh: self.energy_kwh.unwrap_or_default(),
            start_time: self.start_time.map(format_timestamp),
            end_time: self.end_time.map(format_timestamp),
            car_id: self.vehicle_id,
            location: self.location.clone(),
            external_id: self.external_id.clone(),
            provider: self.provider.clone(),
            energy_source: self.energy_source,
            rate_type: self.rate_tier,
            price_per_kwh: self.price_per_kwh,
            vat_percentage: self.vat_percentage,
            notes: self.notes.clone(),
        }
    }
}

/// Wire shape of a session submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionPayload {
    #[serde(rename = "energyConsumedKwh")]
    energy_consumed_kwh: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<String>,
    #[serde(rename = "carId", skip_serializing_if = "Option::is_none")]
    car_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    energy_source: Option<EnergySource>,
    #[serde(rename = "rateType", skip_serializing_if = "Option::is_none")]
    rate_type: Option<RateTier>,
    #[serde(
        rename = "pricePerKwhWithoutVat",
        skip_serializing_if = "Option::is_none"
    )]
    price_per_kwh: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vat_percentage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

/// Format a timestamp the way the backend expects: UTC with a `Z` suffix.
pub(crate) fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Lenient RFC 3339 parsing: the server occasionally emits timestamps the
/// strict parser rejects, and a record with an unreadable time is still a
/// usable record.
fn lenient_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;

    #[test]
    fn energy_source_from_str_is_case_insensitive() {
        assert_eq!("grid".parse::<EnergySource>().unwrap(), EnergySource::Grid);
        assert_eq!(
            "Solar".parse::<EnergySource>().unwrap(),
            EnergySource::Solar
        );
    }

    #[test]
    fn energy_source_from_str_rejects_unknown_values() {
        let err = "wind".parse::<EnergySource>().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(err.to_string(), "invalid session: unknown energy source: WIND");
    }

    #[test]
    fn rate_tier_from_str_rejects_unknown_values() {
        assert!(matches!(
            "medium".parse::<RateTier>(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn rate_tier_displays_wire_value() {
        assert_eq!(RateTier::Low.to_string(), "LOW");
        assert_eq!(RateTier::High.to_string(), "HIGH");
    }

    #[test]
    fn vehicle_deserializes_minimal_payload() {
        let vehicle: Vehicle =
            serde_json::from_value(json!({"id": 1, "name": "Tesla Model 3"})).unwrap();
        assert_eq!(vehicle.id, 1);
        assert_eq!(vehicle.name, "Tesla Model 3");
        assert!(vehicle.make.is_none());
        assert!(vehicle.year.is_none());
    }

    #[test]
    fn charging_session_deserializes_wire_names() {
        let session: ChargingSession = serde_json::from_value(json!({
            "id": 100,
            "energyConsumedKwh": 25.5,
            "totalCost": 120.0,
            "startTime": "2025-11-26T20:00:00Z",
            "endTime": "2025-11-26T22:00:00Z",
            "location": "Home",
            "energySource": "SOLAR",
            "rateType": "HIGH"
        }))
        .unwrap();

        assert_eq!(session.id, 100);
        assert_eq!(session.energy_kwh, 25.5);
        assert_eq!(session.cost, Some(120.0));
        assert_eq!(
            session.start_time,
            Some(Utc.with_ymd_and_hms(2025, 11, 26, 20, 0, 0).unwrap())
        );
        assert_eq!(session.energy_source, Some(EnergySource::Solar));
        assert_eq!(session.rate_tier, Some(RateTier::High));
    }

    #[test]
    fn charging_session_tolerates_sparse_payload() {
        let session: ChargingSession = serde_json::from_value(json!({"id": 7})).unwrap();
        assert_eq!(session.energy_kwh, 0.0);
        assert!(session.cost.is_none());
        assert!(session.start_time.is_none());
    }

    #[test]
    fn unreadable_timestamp_becomes_none() {
        let session: ChargingSession =
            serde_json::from_value(json!({"id": 8, "startTime": "not-a-date"})).unwrap();
        assert!(session.start_time.is_none());
    }

    #[test]
    fn aggregate_state_defaults_missing_numerics_to_zero() {
        let state: AggregateState = serde_json::from_value(json!({
            "monthlyEnergy": 120.5,
            "monthlySessions": 8
        }))
        .unwrap();

        assert_eq!(state.monthly_energy, 120.5);
        assert_eq!(state.monthly_sessions, 8);
        assert_eq!(state.yearly_energy, 0.0);
        assert!(state.avg_cost_per_kwh.is_none());
    }

    #[test]
    fn session_log_requires_energy() {
        let err = SessionLog::default().validate().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn session_log_rejects_non_positive_energy() {
        assert!(SessionLog::new(0.0).validate().is_err());
        assert!(SessionLog::new(-3.0).validate().is_err());
        assert!(SessionLog::new(f64::NAN).validate().is_err());
        assert!(SessionLog::new(45.5).validate().is_ok());
    }

    #[test]
    fn payload_uses_wire_names_and_omits_unset_fields() {
        let draft = SessionLog::new(45.0)
            .with_location("Home")
            .with_source(EnergySource::Grid)
            .with_rate_tier(RateTier::Low)
            .with_vehicle(3)
            .with_price_per_kwh(6.5);

        let payload = serde_json::to_value(draft.to_payload()).unwrap();

        assert_eq!(
            payload,
            json!({
                "energyConsumedKwh": 45.0,
                "location": "Home",
                "energySource": "GRID",
                "rateType": "LOW",
                "carId": 3,
                "pricePerKwhWithoutVat": 6.5
            })
        );
    }

    #[test]
    fn payload_timestamps_carry_z_suffix() {
        let start = Utc.with_ymd_and_hms(2025, 11, 26, 22, 0, 0).unwrap();
        let draft = SessionLog::new(10.0).with_start_time(start);

        let payload = serde_json::to_value(draft.to_payload()).unwrap();
        assert_eq!(payload["startTime"], "2025-11-26T22:00:00Z");
    }

    #[test]
    fn format_timestamp_matches_backend_convention() {
        let dt = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_timestamp(dt), "2025-01-02T03:04:05Z");
    }
}
