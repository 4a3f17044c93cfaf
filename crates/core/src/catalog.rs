use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::plan::Plan;
use crate::errors::ApplicationError;

const EMBEDDED_PLANS: &str = include_str!("../data/plans.json");

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("unsupported catalog format for {path}; expected .json or .toml")]
    UnsupportedFormat { path: PathBuf },
    #[error("failed to parse catalog: {0}")]
    Parse(String),
    #[error("catalog contains no plans")]
    Empty,
    #[error("plan #{index} is invalid: {message}")]
    InvalidPlan { index: usize, message: String },
    #[error("duplicate plan `{name}` from vendor `{vendor}`")]
    DuplicatePlan { vendor: String, name: String },
}

impl From<CatalogError> for ApplicationError {
    fn from(value: CatalogError) -> Self {
        Self::Catalog(value.to_string())
    }
}

#[derive(Deserialize)]
struct CatalogDocument {
    #[serde(alias = "providers")]
    plans: Vec<Plan>,
}

/// Immutable, validated list of plans in catalog order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Catalog {
    plans: Vec<Plan>,
}

impl Catalog {
    pub fn new(plans: Vec<Plan>) -> Result<Self, CatalogError> {
        validate_plans(&plans)?;
        Ok(Self { plans })
    }

    pub fn embedded() -> Result<Self, CatalogError> {
        Self::from_json_str(EMBEDDED_PLANS)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument =
            serde_json::from_str(raw).map_err(|error| CatalogError::Parse(error.to_string()))?;
        Self::new(document.plans)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument =
            toml::from_str(raw).map_err(|error| CatalogError::Parse(error.to_string()))?;
        Self::new(document.plans)
    }

    /// Loads a catalog file, choosing the parser from the file extension.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let extension = path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase);
        let parse: fn(&str) -> Result<Self, CatalogError> = match extension.as_deref() {
            Some("json") => Self::from_json_str,
            Some("toml") => Self::from_toml_str,
            _ => return Err(CatalogError::UnsupportedFormat { path: path.to_path_buf() }),
        };
        let raw = fs::read_to_string(path).map_err(|error| CatalogError::Io {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
        parse(&raw)
    }

    /// Configured file when present, embedded catalog otherwise.
    pub fn load_or_embedded(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::embedded(),
        }
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn mean_discount_pct(&self) -> Decimal {
        if self.plans.is_empty() {
            return Decimal::ZERO;
        }
        let total: Decimal = self.plans.iter().map(|plan| plan.discount_pct).sum();
        total / Decimal::from(self.plans.len())
    }
}

fn validate_plans(plans: &[Plan]) -> Result<(), CatalogError> {
    if plans.is_empty() {
        return Err(CatalogError::Empty);
    }

    let mut seen = HashSet::new();
    for (index, plan) in plans.iter().enumerate() {
        plan.validate()
            .map_err(|error| CatalogError::InvalidPlan { index, message: error.to_string() })?;
        let key = (plan.vendor.trim().to_lowercase(), plan.name.trim().to_lowercase());
        if !seen.insert(key) {
            return Err(CatalogError::DuplicatePlan {
                vendor: plan.vendor.clone(),
                name: plan.name.clone(),
            });
        }
    }
    Ok(())
}
