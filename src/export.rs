//! Data-interchange exports of a valuation
//!
//! Exporters read the originating parameters and the result by shared
//! reference and never modify them.

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::valuation::{AnnuityParameters, AnnuityResult, AnnuityType};

/// One CSV row per projection year
#[derive(Debug, Serialize)]
struct ProjectionCsvRow<'a> {
    #[serde(rename = "Year")]
    year: u32,
    #[serde(rename = "Type")]
    annuity_type: &'a str,
    #[serde(rename = "Payment")]
    payment: f64,
    #[serde(rename = "CumulativePayment")]
    cumulative_payment: f64,
    #[serde(rename = "SurvivalProbability")]
    survival_probability: f64,
}

/// Write the projection table as CSV
pub fn write_projection_csv<W: Write>(
    writer: W,
    params: &AnnuityParameters,
    result: &AnnuityResult,
) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    let annuity_type = params.kind().as_str();

    for point in &result.projections {
        writer.serialize(ProjectionCsvRow {
            year: point.year,
            annuity_type,
            payment: point.payment,
            cumulative_payment: point.cumulative_payment,
            survival_probability: point.survival_probability,
        })?;
    }

    writer.flush()?;
    Ok(())
}

/// Exported document: inputs, outputs and generation time
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportDocument<'a> {
    generated_at: DateTime<Utc>,
    parameters: &'a AnnuityParameters,
    result: &'a AnnuityResult,
}

/// Pretty-printed JSON document of a valuation
pub fn to_json(params: &AnnuityParameters, result: &AnnuityResult) -> Result<String> {
    let document = ExportDocument {
        generated_at: Utc::now(),
        parameters: params,
        result,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Plain-text summary lines
pub fn summary_lines(params: &AnnuityParameters, result: &AnnuityResult) -> Vec<String> {
    let mut lines = vec![
        format!("Annuity type:        {}", params.kind()),
        format!("Age / sex:           {} / {}", params.age, params.sex),
        format!("Mortality table:     {}", params.mortality_table),
        format!("Technical rate:      {:.2}%", params.interest_rate),
        format!("Annual amount:       {:.2}", params.annual_amount),
    ];

    match params.annuity {
        AnnuityType::Simple => {}
        AnnuityType::Reversible {
            reversal_rate,
            spouse_age,
        } => {
            lines.push(format!("Reversal rate:       {:.1}%", reversal_rate));
            lines.push(format!("Spouse age:          {}", spouse_age));
        }
        AnnuityType::Temporary { duration } => {
            lines.push(format!("Duration:            {} years", duration));
        }
        AnnuityType::Deferred { deferral_period } => {
            lines.push(format!("Deferral period:     {} years", deferral_period));
        }
        AnnuityType::Growing { growth_rate } => {
            lines.push(format!("Growth rate:         {:.2}%", growth_rate));
        }
    }

    lines.push(format!("Present value:       {:.0}", result.present_value));
    lines.push(format!("Monthly payment:     {:.0}", result.monthly_payment));
    lines.push(format!("Total payments:      {:.0}", result.total_payments));
    lines.push(format!("Life expectancy:     {:.1} years", result.life_expectancy));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mortality::Sex;
    use crate::valuation::ValuationEngine;

    fn valuation() -> (AnnuityParameters, AnnuityResult) {
        let params = AnnuityParameters::new(65, Sex::Male, 2.5, 12_000.0).temporary(5);
        let result = ValuationEngine::standard().evaluate(&params);
        (params, result)
    }

    #[test]
    fn test_projection_csv() {
        let (params, result) = valuation();
        let mut buffer = Vec::new();
        write_projection_csv(&mut buffer, &params, &result).unwrap();

        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Year,Type,Payment,CumulativePayment,SurvivalProbability");
        assert_eq!(lines.len(), result.projections.len() + 1);
        assert!(lines[1].starts_with("1,temporary,12000"));
        assert!(lines[6].starts_with("6,temporary,0"));
    }

    #[test]
    fn test_json_document() {
        let (params, result) = valuation();
        let json = to_json(&params, &result).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["parameters"]["type"], "temporary");
        assert_eq!(value["parameters"]["duration"], 5);
        assert_eq!(value["result"]["presentValue"], result.present_value);
        assert_eq!(value["parameters"]["annualAmount"], 12_000.0);
        assert!(value["generatedAt"].is_string());
        assert_eq!(
            value["result"]["projections"].as_array().map(|a| a.len()),
            Some(result.projections.len())
        );
    }

    #[test]
    fn test_export_leaves_inputs_untouched() {
        let (params, result) = valuation();
        let (params_before, result_before) = (params.clone(), result.clone());
        to_json(&params, &result).unwrap();
        write_projection_csv(std::io::sink(), &params, &result).unwrap();
        assert_eq!(params, params_before);
        assert_eq!(result, result_before);
    }

    #[test]
    fn test_summary_lines() {
        let (params, result) = valuation();
        let lines = summary_lines(&params, &result);
        assert!(lines.iter().any(|l| l.contains("Duration:            5 years")));
        assert!(lines.iter().any(|l| l == "Present value:       45685"));
    }
}
