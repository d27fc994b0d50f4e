use crate::spec::{Registry, RegistryError, RegistrySpec};

const MEDICAL_INTAKE: &str = include_str!("../catalog/medical_intake.json");

/// Errors loading a registry document.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to parse registry document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid registry: {0}")]
    Invalid(#[from] RegistryError),
}

/// The canonical medical questionnaire shipped with the service.
pub fn medical_intake() -> Result<Registry, CatalogError> {
    from_json_str(MEDICAL_INTAKE)
}

pub fn from_json_str(document: &str) -> Result<Registry, CatalogError> {
    let spec: RegistrySpec = serde_json::from_str(document)?;
    Ok(Registry::new(spec)?)
}
