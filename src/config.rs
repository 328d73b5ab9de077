use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::encoding::TextEncoding;
use crate::data::export::DEFAULT_DOWNLOAD_NAME;
use crate::data::filter::FixedFilters;
use crate::data::loader::Source;
use crate::error::{Error, Result};

/// Opportunity types kept when the configuration does not name any.
pub const DEFAULT_OPPORTUNITY_TYPES: [&str; 4] = [
    "Sources Sought",
    "Presolicitation",
    "Solicitation",
    "Combined Synopsis/Solicitation",
];

/// Dashboard configuration, read from a TOML file. Every key is optional.
///
/// ```toml
/// source = "ContractOpportunities-20250203-100221.csv"
/// encoding = "latin1"
/// naics_allow_list = ["Testing Laboratories", "Medical Laboratories"]
/// sort_naics_options = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Path or `http(s)://` URL loaded at startup.
    pub source: Option<String>,
    pub encoding: TextEncoding,
    pub opportunity_types: Vec<String>,
    /// NAICS categories to keep; absent means no NAICS rule.
    pub naics_allow_list: Option<Vec<String>>,
    pub sort_naics_options: bool,
    /// Raw records shown in the preview table.
    pub preview_rows: usize,
    pub download_file_name: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: None,
            encoding: TextEncoding::default(),
            opportunity_types: DEFAULT_OPPORTUNITY_TYPES.iter().map(|s| s.to_string()).collect(),
            naics_allow_list: None,
            sort_naics_options: false,
            preview_rows: 5,
            download_file_name: DEFAULT_DOWNLOAD_NAME.to_string(),
        }
    }
}

impl DashboardConfig {
    /// Read and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| Error::Io {
            location: path.display().to_string(),
            err,
        })?;
        let config = Self::from_toml(&text)?;
        log::debug!("Read configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        let config: DashboardConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.opportunity_types.iter().all(|t| t.trim().is_empty()) {
            return Err(Error::Config(
                "opportunity_types must name at least one type".to_string(),
            ));
        }
        if let Some(naics) = &self.naics_allow_list {
            if naics.is_empty() {
                return Err(Error::Config(
                    "naics_allow_list is empty; omit it to disable the NAICS rule".to_string(),
                ));
            }
        }
        if self.download_file_name.trim().is_empty() {
            return Err(Error::Config("download_file_name is empty".to_string()));
        }
        Ok(())
    }

    /// The configured source, if any.
    pub fn source(&self) -> Option<Source> {
        self.source.as_deref().map(Source::parse)
    }

    /// Business rules as filter criteria.
    pub fn fixed_filters(&self) -> FixedFilters {
        let fixed = FixedFilters::new(self.opportunity_types.iter().cloned());
        match &self.naics_allow_list {
            Some(naics) => fixed.with_naics(naics.iter().cloned()),
            None => fixed,
        }
    }
}
