// ============================================================
// Layer 3 — Track Record Domain Type
// ============================================================
// One reconstructed track with its kinematic and impact-parameter
// variables, a validity flag, and the truth labels.
//
// Field names follow the event-store column names (camelCase),
// so the same struct deserialises from JSON events and from CSV
// rows without any mapping table.
//
// A TrackRecord lives only until feature extraction: the loader
// produces them, the dataset builder turns them into feature
// rows, and they are dropped.

use anyhow::{bail, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

use crate::domain::origin::TrackOrigin;

/// Numeric cells may be absent, empty (`,,` in CSV) or `null` in JSON;
/// all three read as 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackRecord {
    /// Event the track belongs to (inherited from the enclosing event)
    pub event_number: u64,

    /// Transverse momentum
    #[serde(deserialize_with = "deserialize_value")]
    pub pt:  f32,
    #[serde(deserialize_with = "deserialize_value")]
    pub eta: f32,
    #[serde(deserialize_with = "deserialize_value")]
    pub phi: f32,

    /// Transverse impact parameter
    #[serde(deserialize_with = "deserialize_value")]
    pub d0: f32,
    /// Longitudinal impact parameter projected with sin(theta)
    #[serde(deserialize_with = "deserialize_value")]
    pub z0_sin_theta: f32,
    #[serde(deserialize_with = "deserialize_value")]
    pub d0_uncertainty: f32,
    #[serde(deserialize_with = "deserialize_value")]
    pub z0_sin_theta_uncertainty: f32,

    /// Charge over momentum
    #[serde(deserialize_with = "deserialize_value")]
    pub q_over_p: f32,
    /// Track fit quality and its degrees of freedom
    #[serde(deserialize_with = "deserialize_value")]
    pub chi_squared: f32,
    #[serde(deserialize_with = "deserialize_value")]
    pub number_do_f: f32,

    /// Hit counts are stored as floats in the event store
    #[serde(deserialize_with = "deserialize_value")]
    pub number_of_pixel_hits: f32,
    #[serde(rename = "numberOfSCTHits", deserialize_with = "deserialize_value")]
    pub number_of_sct_hits: f32,
    #[serde(deserialize_with = "deserialize_value")]
    pub number_of_innermost_pixel_layer_hits: f32,

    /// Tracks flagged invalid are padding in the event store
    #[serde(deserialize_with = "deserialize_flag")]
    pub valid: bool,

    /// Truth origin label; see `TrackOrigin::from_origin_label`
    #[serde(deserialize_with = "deserialize_label")]
    pub ftag_truth_origin_label: i32,
    #[serde(deserialize_with = "deserialize_label")]
    pub ftag_truth_type_label: i32,
    #[serde(deserialize_with = "deserialize_label")]
    pub ftag_truth_vertex_index: i32,
}

impl TrackRecord {
    /// Ground-truth class of this track.
    pub fn origin(&self) -> TrackOrigin {
        TrackOrigin::from_origin_label(self.ftag_truth_origin_label)
    }
}

/// A numeric cell as it appears in JSON or CSV.
#[derive(Deserialize)]
#[serde(untagged)]
enum Cell {
    Number(f64),
    Text(String),
}

/// Empty and `null` cells read as 0. Text such as `NaN` or `inf` is
/// parsed as a float and kept.
fn deserialize_value<'de, D>(deserializer: D) -> std::result::Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Cell>::deserialize(deserializer)? {
        None => Ok(0.0),
        Some(Cell::Number(x)) => Ok(x as f32),
        Some(Cell::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(0.0);
            }
            s.parse::<f32>()
                .map_err(|_| serde::de::Error::custom(format!("invalid number '{s}'")))
        }
    }
}

/// Integer labels with the same leniency as `deserialize_value`.
fn deserialize_label<'de, D>(deserializer: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let x = deserialize_value(deserializer)?;
    if x.fract() != 0.0 || !x.is_finite() {
        return Err(serde::de::Error::custom(format!("invalid integer label '{x}'")));
    }
    Ok(x as i32)
}

/// Accepts `true`/`false` as well as `1`/`0` (numeric or textual).
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Float(f64),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(i) => Ok(i != 0),
        Flag::Float(f) => Ok(f != 0.0),
        Flag::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid validity flag '{other}'"
            ))),
        },
    }
}

// ─── TrackVariable ────────────────────────────────────────────────────────────
/// A named numeric column of a TrackRecord that can be used as a
/// network input feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackVariable {
    Pt,
    Eta,
    Phi,
    D0,
    Z0SinTheta,
    D0Uncertainty,
    Z0SinThetaUncertainty,
    QOverP,
    ChiSquared,
    NumberDoF,
    NumberOfPixelHits,
    NumberOfSctHits,
    NumberOfInnermostPixelLayerHits,
}

impl TrackVariable {
    pub const ALL: [TrackVariable; 13] = [
        TrackVariable::Pt,
        TrackVariable::Eta,
        TrackVariable::Phi,
        TrackVariable::D0,
        TrackVariable::Z0SinTheta,
        TrackVariable::D0Uncertainty,
        TrackVariable::Z0SinThetaUncertainty,
        TrackVariable::QOverP,
        TrackVariable::ChiSquared,
        TrackVariable::NumberDoF,
        TrackVariable::NumberOfPixelHits,
        TrackVariable::NumberOfSctHits,
        TrackVariable::NumberOfInnermostPixelLayerHits,
    ];

    /// Column name in the event store.
    pub fn name(self) -> &'static str {
        match self {
            TrackVariable::Pt => "pt",
            TrackVariable::Eta => "eta",
            TrackVariable::Phi => "phi",
            TrackVariable::D0 => "d0",
            TrackVariable::Z0SinTheta => "z0SinTheta",
            TrackVariable::D0Uncertainty => "d0Uncertainty",
            TrackVariable::Z0SinThetaUncertainty => "z0SinThetaUncertainty",
            TrackVariable::QOverP => "qOverP",
            TrackVariable::ChiSquared => "chiSquared",
            TrackVariable::NumberDoF => "numberDoF",
            TrackVariable::NumberOfPixelHits => "numberOfPixelHits",
            TrackVariable::NumberOfSctHits => "numberOfSCTHits",
            TrackVariable::NumberOfInnermostPixelLayerHits => "numberOfInnermostPixelLayerHits",
        }
    }

    /// Read this variable from `track`.
    pub fn value(self, track: &TrackRecord) -> f32 {
        match self {
            TrackVariable::Pt => track.pt,
            TrackVariable::Eta => track.eta,
            TrackVariable::Phi => track.phi,
            TrackVariable::D0 => track.d0,
            TrackVariable::Z0SinTheta => track.z0_sin_theta,
            TrackVariable::D0Uncertainty => track.d0_uncertainty,
            TrackVariable::Z0SinThetaUncertainty => track.z0_sin_theta_uncertainty,
            TrackVariable::QOverP => track.q_over_p,
            TrackVariable::ChiSquared => track.chi_squared,
            TrackVariable::NumberDoF => track.number_do_f,
            TrackVariable::NumberOfPixelHits => track.number_of_pixel_hits,
            TrackVariable::NumberOfSctHits => track.number_of_sct_hits,
            TrackVariable::NumberOfInnermostPixelLayerHits => {
                track.number_of_innermost_pixel_layer_hits
            }
        }
    }

    /// Parse a comma-separated variable list such as `pt,eta,d0`.
    pub fn parse_list(list: &str) -> Result<Vec<TrackVariable>> {
        let vars = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(TrackVariable::from_str)
            .collect::<Result<Vec<_>>>()?;
        if vars.is_empty() {
            bail!("variable list '{list}' selects no variables");
        }
        Ok(vars)
    }
}

impl FromStr for TrackVariable {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        TrackVariable::ALL
            .iter()
            .copied()
            .find(|v| v.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| anyhow::anyhow!("unknown track variable '{s}'"))
    }
}

impl fmt::Display for TrackVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialise_json_track() {
        let json = r#"{"pt": 12.5, "eta": -0.3, "d0": 0.01, "numberOfSCTHits": 8,
                       "valid": true, "ftagTruthOriginLabel": 2}"#;
        let t: TrackRecord = serde_json::from_str(json).unwrap();
        assert_eq!(t.pt, 12.5);
        assert_eq!(t.number_of_sct_hits, 8.0);
        // Missing fields fall back to their defaults
        assert_eq!(t.phi, 0.0);
        assert!(t.valid);
        assert_eq!(t.origin(), TrackOrigin::Prompt);
    }

    #[test]
    fn test_numeric_validity_flag() {
        let t: TrackRecord = serde_json::from_str(r#"{"valid": 0}"#).unwrap();
        assert!(!t.valid);
        let t: TrackRecord = serde_json::from_str(r#"{"valid": 1}"#).unwrap();
        assert!(t.valid);
    }

    #[test]
    fn test_null_and_empty_values_read_as_zero() {
        let json = r#"{"pt": null, "eta": "", "d0": "0.5", "ftagTruthOriginLabel": null, "valid": true}"#;
        let t: TrackRecord = serde_json::from_str(json).unwrap();
        assert_eq!(t.pt, 0.0);
        assert_eq!(t.eta, 0.0);
        assert_eq!(t.d0, 0.5);
        assert_eq!(t.origin(), TrackOrigin::PileUp);
    }

    #[test]
    fn test_unparseable_value_is_rejected() {
        assert!(serde_json::from_str::<TrackRecord>(r#"{"pt": "fast"}"#).is_err());
        assert!(serde_json::from_str::<TrackRecord>(r#"{"ftagTruthOriginLabel": 2.5}"#).is_err());
    }

    #[test]
    fn test_variable_names_parse() {
        for v in TrackVariable::ALL {
            assert_eq!(v.name().parse::<TrackVariable>().unwrap(), v);
        }
        assert!("isolation".parse::<TrackVariable>().is_err());
    }

    #[test]
    fn test_parse_list_keeps_order() {
        let vars = TrackVariable::parse_list("d0, pt ,eta").unwrap();
        assert_eq!(vars, vec![TrackVariable::D0, TrackVariable::Pt, TrackVariable::Eta]);
        assert!(TrackVariable::parse_list(" , ").is_err());
    }

    #[test]
    fn test_value_reads_matching_field() {
        let t = TrackRecord { z0_sin_theta: 0.25, q_over_p: -1.5, ..Default::default() };
        assert_eq!(TrackVariable::Z0SinTheta.value(&t), 0.25);
        assert_eq!(TrackVariable::QOverP.value(&t), -1.5);
    }
}
