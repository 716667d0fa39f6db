//! Annuity parameter records
//!
//! `AnnuityParameters` is the typed input of the engine: the annuity type
//! carries only the fields that type uses, and every optional field has an
//! explicit default applied at construction. `ParameterRecord` is the flat
//! shape supplied by forms and files; it converts into `AnnuityParameters`
//! and is also the serialized form.

use std::fmt;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::mortality::{MortalityTableId, Sex};

/// Default term of a temporary annuity (years)
pub const DEFAULT_DURATION: u32 = 30;

/// Default waiting period of a deferred annuity (years)
pub const DEFAULT_DEFERRAL_PERIOD: u32 = 0;

/// Default yearly payment growth of a growing annuity (percent)
pub const DEFAULT_GROWTH_RATE: f64 = 0.0;

/// Default share of the payment continued to the survivor (percent)
pub const DEFAULT_REVERSAL_RATE: f64 = 60.0;

/// Default age difference between the annuitant and the spouse (years)
pub const SPOUSE_AGE_GAP: u32 = 3;

/// Annuity type with its type-specific terms
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum AnnuityType {
    /// Level payments for life
    #[default]
    Simple,
    /// Life annuity with a reduced payment continued to a survivor
    Reversible {
        /// Survivor payment as a percentage of the annual amount
        reversal_rate: f64,
        spouse_age: u32,
    },
    /// Payments stop after `duration` years even if the annuitant survives
    Temporary { duration: u32 },
    /// Payments start after `deferral_period` years
    Deferred { deferral_period: u32 },
    /// Payments grow by `growth_rate` percent per year
    Growing { growth_rate: f64 },
}

impl AnnuityType {
    pub fn kind(&self) -> AnnuityKind {
        match self {
            AnnuityType::Simple => AnnuityKind::Simple,
            AnnuityType::Reversible { .. } => AnnuityKind::Reversible,
            AnnuityType::Temporary { .. } => AnnuityKind::Temporary,
            AnnuityType::Deferred { .. } => AnnuityKind::Deferred,
            AnnuityType::Growing { .. } => AnnuityKind::Growing,
        }
    }
}

/// Annuity type tag without its terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnuityKind {
    Simple,
    Reversible,
    Temporary,
    Deferred,
    Growing,
}

impl AnnuityKind {
    pub const ALL: [AnnuityKind; 5] = [
        AnnuityKind::Simple,
        AnnuityKind::Reversible,
        AnnuityKind::Temporary,
        AnnuityKind::Deferred,
        AnnuityKind::Growing,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "simple" => Some(AnnuityKind::Simple),
            "reversible" => Some(AnnuityKind::Reversible),
            "temporary" => Some(AnnuityKind::Temporary),
            "deferred" => Some(AnnuityKind::Deferred),
            "growing" => Some(AnnuityKind::Growing),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnnuityKind::Simple => "simple",
            AnnuityKind::Reversible => "reversible",
            AnnuityKind::Temporary => "temporary",
            AnnuityKind::Deferred => "deferred",
            AnnuityKind::Growing => "growing",
        }
    }
}

impl fmt::Display for AnnuityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complete input of one valuation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ParameterRecord", into = "ParameterRecord")]
pub struct AnnuityParameters {
    pub annuity: AnnuityType,

    /// Age of the primary annuitant (integer years)
    pub age: u32,

    pub sex: Sex,

    /// Technical interest rate in percent (2.5 means 2.5%)
    pub interest_rate: f64,

    /// Annual payment amount
    pub annual_amount: f64,

    pub mortality_table: MortalityTableId,
}

impl AnnuityParameters {
    /// Simple life annuity on the default mortality table
    pub fn new(age: u32, sex: Sex, interest_rate: f64, annual_amount: f64) -> Self {
        Self {
            annuity: AnnuityType::Simple,
            age,
            sex,
            interest_rate,
            annual_amount,
            mortality_table: MortalityTableId::DEFAULT,
        }
    }

    pub fn with_table(mut self, table: impl Into<MortalityTableId>) -> Self {
        self.mortality_table = table.into();
        self
    }

    pub fn with_type(mut self, annuity: AnnuityType) -> Self {
        self.annuity = annuity;
        self
    }

    pub fn temporary(self, duration: u32) -> Self {
        self.with_type(AnnuityType::Temporary { duration })
    }

    pub fn deferred(self, deferral_period: u32) -> Self {
        self.with_type(AnnuityType::Deferred { deferral_period })
    }

    pub fn growing(self, growth_rate: f64) -> Self {
        self.with_type(AnnuityType::Growing { growth_rate })
    }

    /// Reversible annuity; the spouse defaults to `SPOUSE_AGE_GAP` years younger
    pub fn reversible(self, reversal_rate: f64, spouse_age: Option<u32>) -> Self {
        let spouse_age = spouse_age.unwrap_or_else(|| default_spouse_age(self.age));
        self.with_type(AnnuityType::Reversible {
            reversal_rate,
            spouse_age,
        })
    }

    /// Default-valued terms for a type tag
    pub fn with_kind(self, kind: AnnuityKind) -> Self {
        match kind {
            AnnuityKind::Simple => self.with_type(AnnuityType::Simple),
            AnnuityKind::Reversible => self.reversible(DEFAULT_REVERSAL_RATE, None),
            AnnuityKind::Temporary => self.temporary(DEFAULT_DURATION),
            AnnuityKind::Deferred => self.deferred(DEFAULT_DEFERRAL_PERIOD),
            AnnuityKind::Growing => self.growing(DEFAULT_GROWTH_RATE),
        }
    }

    pub fn kind(&self) -> AnnuityKind {
        self.annuity.kind()
    }
}

fn default_spouse_age(age: u32) -> u32 {
    age.saturating_sub(SPOUSE_AGE_GAP)
}

/// Flat parameter record as supplied by a form or a CSV/JSON file
///
/// Optional fields only matter for the matching type. Conversion never
/// fails: unknown values degrade to documented defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterRecord {
    #[serde(rename = "type", default)]
    pub annuity_type: String,
    pub age: i64,
    pub sex: String,
    pub interest_rate: f64,
    pub annual_amount: f64,
    #[serde(default)]
    pub mortality_table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deferral_period: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub growth_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reversal_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spouse_age: Option<i64>,
}

fn clamp_age(age: i64) -> u32 {
    age.clamp(0, u32::MAX as i64) as u32
}

impl From<ParameterRecord> for AnnuityParameters {
    fn from(record: ParameterRecord) -> Self {
        let kind = AnnuityKind::parse(&record.annuity_type).unwrap_or_else(|| {
            if !record.annuity_type.is_empty() {
                warn!("Unknown annuity type '{}', valuing as simple", record.annuity_type);
            }
            AnnuityKind::Simple
        });

        if record.age < 0 {
            warn!("Negative age {} clamped to 0", record.age);
        }
        let age = clamp_age(record.age);

        // An unrecognised sex resolves to the fallback curve: male on the default table
        let (sex, mortality_table) = match Sex::parse(&record.sex) {
            Some(sex) if record.mortality_table.trim().is_empty() => (sex, MortalityTableId::DEFAULT),
            Some(sex) => (sex, MortalityTableId::parse(&record.mortality_table)),
            None => {
                warn!("Unknown sex '{}', using {} male curve", record.sex, MortalityTableId::DEFAULT);
                (Sex::Male, MortalityTableId::DEFAULT)
            }
        };

        let annuity = match kind {
            AnnuityKind::Simple => AnnuityType::Simple,
            AnnuityKind::Reversible => AnnuityType::Reversible {
                reversal_rate: record.reversal_rate.unwrap_or(DEFAULT_REVERSAL_RATE),
                spouse_age: record
                    .spouse_age
                    .map(clamp_age)
                    .unwrap_or_else(|| default_spouse_age(age)),
            },
            AnnuityKind::Temporary => AnnuityType::Temporary {
                duration: record.duration.unwrap_or(DEFAULT_DURATION),
            },
            AnnuityKind::Deferred => AnnuityType::Deferred {
                deferral_period: record.deferral_period.unwrap_or(DEFAULT_DEFERRAL_PERIOD),
            },
            AnnuityKind::Growing => AnnuityType::Growing {
                growth_rate: record.growth_rate.unwrap_or(DEFAULT_GROWTH_RATE),
            },
        };

        Self {
            annuity,
            age,
            sex,
            interest_rate: record.interest_rate,
            annual_amount: record.annual_amount,
            mortality_table,
        }
    }
}

impl From<AnnuityParameters> for ParameterRecord {
    fn from(params: AnnuityParameters) -> Self {
        let mut record = ParameterRecord {
            annuity_type: params.kind().as_str().to_string(),
            age: params.age as i64,
            sex: params.sex.as_str().to_string(),
            interest_rate: params.interest_rate,
            annual_amount: params.annual_amount,
            mortality_table: params.mortality_table.to_string(),
            ..Default::default()
        };

        match params.annuity {
            AnnuityType::Simple => {}
            AnnuityType::Reversible {
                reversal_rate,
                spouse_age,
            } => {
                record.reversal_rate = Some(reversal_rate);
                record.spouse_age = Some(spouse_age as i64);
            }
            AnnuityType::Temporary { duration } => record.duration = Some(duration),
            AnnuityType::Deferred { deferral_period } => {
                record.deferral_period = Some(deferral_period)
            }
            AnnuityType::Growing { growth_rate } => record.growth_rate = Some(growth_rate),
        }

        record
    }
}
