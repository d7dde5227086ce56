//! Body composition from circumference measurements (US Navy method).

use crate::{BodyMeasurements, BodyMetrics, Error, Gender, Result};
use std::fmt;

/// Physiological bounds for the body-fat estimate
const MIN_BODY_FAT: f64 = 2.0;
const MAX_BODY_FAT: f64 = 60.0;

/// Converts lb/in² to kg/m²
const BMI_IMPERIAL_FACTOR: f64 = 703.0;

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn require_positive(value: f64, name: &str) -> Result<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidMeasurement(format!(
            "{} must be greater than zero",
            name
        )))
    }
}

/// Raw (unclamped) body-fat percentage
fn navy_body_fat(m: &BodyMeasurements) -> Result<f64> {
    match m.gender {
        Gender::Male => Ok(86.010 * (m.waist_inches - m.neck_inches).log10()
            - 70.041 * m.height_inches.log10()
            + 36.76),
        Gender::Female => {
            let hip = match m.hip_inches {
                Some(hip) if hip > 0.0 => hip,
                _ => {
                    return Err(Error::MissingMeasurement(
                        "Hip measurement required for female body fat calculation".into(),
                    ))
                }
            };

            let circumference = m.waist_inches + hip - m.neck_inches;
            if circumference <= 0.0 {
                return Err(Error::InvalidMeasurement(
                    "waist + hip - neck must be greater than zero".into(),
                ));
            }

            Ok(163.205 * circumference.log10() - 97.684 * m.height_inches.log10() - 78.387)
        }
    }
}

/// Compute body fat, fat/lean mass and BMI
///
/// Fails with `InvalidMeasurement` for non-positive inputs or a waist that
/// is not larger than the neck, and with `MissingMeasurement` when a female
/// calculation has no hip measurement.
pub fn calculate_body_metrics(m: &BodyMeasurements) -> Result<BodyMetrics> {
    require_positive(m.height_inches, "Height")?;
    require_positive(m.weight_lbs, "Weight")?;
    require_positive(m.waist_inches, "Waist")?;
    require_positive(m.neck_inches, "Neck")?;

    if m.waist_inches <= m.neck_inches {
        return Err(Error::InvalidMeasurement(
            "Waist must be larger than neck".into(),
        ));
    }

    let raw = navy_body_fat(m)?;
    let body_fat_percentage = round1(raw.clamp(MIN_BODY_FAT, MAX_BODY_FAT));
    if raw < MIN_BODY_FAT || raw > MAX_BODY_FAT {
        tracing::debug!("Body fat estimate {:.1}% clamped to {}", raw, body_fat_percentage);
    }

    let fat_mass = m.weight_lbs * body_fat_percentage / 100.0;
    let lean_mass = m.weight_lbs - fat_mass;
    let bmi = m.weight_lbs / (m.height_inches * m.height_inches) * BMI_IMPERIAL_FACTOR;

    Ok(BodyMetrics {
        body_fat_percentage,
        fat_mass: round1(fat_mass),
        lean_mass: round1(lean_mass),
        bmi: round1(bmi),
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyFatCategory {
    EssentialFat,
    Athletes,
    Fitness,
    Average,
    Obese,
}

impl fmt::Display for BodyFatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BodyFatCategory::EssentialFat => "Essential Fat",
            BodyFatCategory::Athletes => "Athletes",
            BodyFatCategory::Fitness => "Fitness",
            BodyFatCategory::Average => "Average",
            BodyFatCategory::Obese => "Obese",
        })
    }
}

/// Upper bounds (exclusive) for each category, ACE table
pub fn body_fat_category(body_fat_percentage: f64, gender: Gender) -> BodyFatCategory {
    let bounds = match gender {
        Gender::Male => [6.0, 14.0, 18.0, 25.0],
        Gender::Female => [14.0, 21.0, 25.0, 32.0],
    };

    if body_fat_percentage < bounds[0] {
        BodyFatCategory::EssentialFat
    } else if body_fat_percentage < bounds[1] {
        BodyFatCategory::Athletes
    } else if body_fat_percentage < bounds[2] {
        BodyFatCategory::Fitness
    } else if body_fat_percentage < bounds[3] {
        BodyFatCategory::Average
    } else {
        BodyFatCategory::Obese
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
        })
    }
}

pub fn bmi_category(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn male(height: f64, weight: f64, waist: f64, neck: f64) -> BodyMeasurements {
        BodyMeasurements {
            gender: Gender::Male,
            height_inches: height,
            weight_lbs: weight,
            waist_inches: waist,
            neck_inches: neck,
            hip_inches: None,
        }
    }

    #[test]
    fn test_male_body_fat() {
        let metrics = calculate_body_metrics(&male(70.0, 180.0, 34.0, 15.0)).unwrap();
        assert_eq!(metrics.body_fat_percentage, 17.5);
        assert_eq!(metrics.fat_mass, 31.5);
        assert_eq!(metrics.lean_mass, 148.5);
        assert_eq!(metrics.bmi, 25.8);
    }

    #[test]
    fn test_female_body_fat() {
        let m = BodyMeasurements {
            gender: Gender::Female,
            height_inches: 65.0,
            weight_lbs: 140.0,
            waist_inches: 30.0,
            neck_inches: 13.0,
            hip_inches: Some(38.0),
        };
        let metrics = calculate_body_metrics(&m).unwrap();
        assert_eq!(metrics.body_fat_percentage, 28.6);
        assert_eq!(metrics.fat_mass, 40.0);
        assert_eq!(metrics.lean_mass, 100.0);
        assert_eq!(metrics.bmi, 23.3);
    }

    #[test]
    fn test_female_missing_hip() {
        let mut m = male(65.0, 140.0, 30.0, 13.0);
        m.gender = Gender::Female;

        let err = calculate_body_metrics(&m).unwrap_err();
        assert!(matches!(err, Error::MissingMeasurement(_)));
        assert!(err.to_string().contains("Hip measurement required"));

        m.hip_inches = Some(0.0);
        assert!(matches!(
            calculate_body_metrics(&m),
            Err(Error::MissingMeasurement(_))
        ));
    }

    #[test]
    fn test_non_positive_inputs() {
        for m in [
            male(0.0, 180.0, 34.0, 15.0),
            male(70.0, -1.0, 34.0, 15.0),
            male(70.0, 180.0, 0.0, 15.0),
            male(70.0, 180.0, 34.0, 0.0),
        ] {
            assert!(matches!(
                calculate_body_metrics(&m),
                Err(Error::InvalidMeasurement(_))
            ));
        }
    }

    #[test]
    fn test_waist_not_larger_than_neck() {
        assert!(matches!(
            calculate_body_metrics(&male(70.0, 180.0, 15.0, 15.0)),
            Err(Error::InvalidMeasurement(_))
        ));
    }

    #[test]
    fn test_clamped_to_physiological_bounds() {
        let lean = calculate_body_metrics(&male(70.0, 150.0, 17.0, 15.0)).unwrap();
        assert_eq!(lean.body_fat_percentage, 2.0);
        assert_eq!(lean.fat_mass, 3.0);

        let heavy = calculate_body_metrics(&male(60.0, 300.0, 80.0, 14.0)).unwrap();
        assert_eq!(heavy.body_fat_percentage, 60.0);
        assert_eq!(heavy.lean_mass, 120.0);
    }

    #[test]
    fn test_body_fat_categories() {
        assert_eq!(body_fat_category(5.0, Gender::Male), BodyFatCategory::EssentialFat);
        assert_eq!(body_fat_category(10.0, Gender::Male), BodyFatCategory::Athletes);
        assert_eq!(body_fat_category(17.5, Gender::Male), BodyFatCategory::Fitness);
        assert_eq!(body_fat_category(17.5, Gender::Female), BodyFatCategory::Athletes);
        assert_eq!(body_fat_category(28.6, Gender::Female), BodyFatCategory::Average);
        assert_eq!(body_fat_category(40.0, Gender::Female), BodyFatCategory::Obese);
    }

    #[test]
    fn test_bmi_categories() {
        assert_eq!(bmi_category(17.0), BmiCategory::Underweight);
        assert_eq!(bmi_category(23.3), BmiCategory::Normal);
        assert_eq!(bmi_category(25.8), BmiCategory::Overweight);
        assert_eq!(bmi_category(30.0), BmiCategory::Obese);
        assert_eq!(BmiCategory::Normal.to_string(), "Normal");
    }
}
