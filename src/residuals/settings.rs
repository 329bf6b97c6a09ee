use crate::algebra::*;
use derive_builder::Builder;
#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Error type returned by tolerance validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    /// An error attributable to one of the fields
    #[error("Bad value for field {0}")]
    BadFieldValue(&'static str),
}

/// Convergence tolerances applied to [`ResidualNorms`](super::ResidualNorms).
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(build_fn(validate = "Self::validate"))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(bound = "T: Serialize + DeserializeOwned"))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ResidualTolerances<T: FloatT> {
    ///stationarity tolerance
    #[builder(default = "(1e-8).as_T()")]
    pub tol_stat: T,

    ///equality constraint tolerance
    #[builder(default = "(1e-8).as_T()")]
    pub tol_eq: T,

    ///inequality constraint tolerance
    #[builder(default = "(1e-8).as_T()")]
    pub tol_ineq: T,

    ///complementarity and duality gap tolerance
    #[builder(default = "(1e-8).as_T()")]
    pub tol_comp: T,
}

impl<T> Default for ResidualTolerances<T>
where
    T: FloatT,
{
    fn default() -> ResidualTolerances<T> {
        ResidualTolerancesBuilder::<T>::default().build().unwrap()
    }
}

impl<T> ResidualTolerances<T>
where
    T: FloatT,
{
    /// Checks that every tolerance is finite and non-negative.
    pub fn validate(&self) -> Result<(), SettingsError> {
        validate_tolerance("tol_stat", self.tol_stat)?;
        validate_tolerance("tol_eq", self.tol_eq)?;
        validate_tolerance("tol_ineq", self.tol_ineq)?;
        validate_tolerance("tol_comp", self.tol_comp)?;
        Ok(())
    }
}

// pre build checker (for auto-validation when using the builder)

impl From<SettingsError> for ResidualTolerancesBuilderError {
    fn from(e: SettingsError) -> Self {
        ResidualTolerancesBuilderError::ValidationError(e.to_string())
    }
}

impl<T> ResidualTolerancesBuilder<T>
where
    T: FloatT,
{
    /// check any explicitly set tolerances
    pub fn validate(&self) -> Result<(), SettingsError> {
        let fields = [
            ("tol_stat", self.tol_stat),
            ("tol_eq", self.tol_eq),
            ("tol_ineq", self.tol_ineq),
            ("tol_comp", self.tol_comp),
        ];
        for (name, value) in fields {
            if let Some(value) = value {
                validate_tolerance(name, value)?;
            }
        }
        Ok(())
    }
}

fn validate_tolerance<T: FloatT>(name: &'static str, value: T) -> Result<(), SettingsError> {
    if !value.is_finite() || value < T::zero() {
        return Err(SettingsError::BadFieldValue(name));
    }
    Ok(())
}

#[test]
fn test_tolerance_builder() {
    let tols = ResidualTolerances::<f64>::default();
    assert_eq!(tols.tol_stat, 1e-8);
    assert_eq!(tols.tol_comp, 1e-8);

    let tols = ResidualTolerancesBuilder::<f64>::default()
        .tol_eq(1e-6)
        .build()
        .unwrap();
    assert_eq!(tols.tol_eq, 1e-6);
    assert_eq!(tols.tol_ineq, 1e-8);

    let bad = ResidualTolerancesBuilder::<f64>::default()
        .tol_comp(-1.0)
        .build();
    assert!(matches!(bad, Err(ResidualTolerancesBuilderError::ValidationError(_))));

    let bad = ResidualTolerancesBuilder::<f64>::default()
        .tol_stat(f64::NAN)
        .build();
    assert!(bad.is_err());

    let tols = ResidualTolerances {
        tol_eq: f64::INFINITY,
        ..ResidualTolerances::default()
    };
    assert_eq!(tols.validate(), Err(SettingsError::BadFieldValue("tol_eq")));
}

#[cfg(feature = "serde")]
#[test]
fn test_tolerance_serde() {
    let tols = ResidualTolerancesBuilder::<f64>::default()
        .tol_stat(1e-5)
        .build()
        .unwrap();
    let json = serde_json::to_string(&tols).unwrap();
    let back: ResidualTolerances<f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(tols, back);

    // missing fields take their defaults
    let partial: ResidualTolerances<f64> = serde_json::from_str(r#"{"tol_eq": 1e-4}"#).unwrap();
    assert_eq!(partial.tol_eq, 1e-4);
    assert_eq!(partial.tol_stat, 1e-8);
}
