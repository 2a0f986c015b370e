use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{CompanyId, IndustryId, PatientType, PlanId, RecordStatus};

/// Collection responses come back either bare or wrapped in a paging envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListEnvelope<T> {
    Bare(Vec<T>),
    Paged { results: Vec<T> },
}

impl<T> ListEnvelope<T> {
    pub fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) => items,
            Self::Paged { results } => results,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompanyFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<IndustryId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndustryFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BenefitFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_type: Option<PatientType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordering: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SchemeFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanyId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Query for the export endpoint. Sort and pagination are never sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub file_format: ExportFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusAction {
    Activate,
    Deactivate,
    Suspend,
}

impl StatusAction {
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Activate => "activate",
            Self::Deactivate => "deactivate",
            Self::Suspend => "suspend",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "activate" => Some(Self::Activate),
            "deactivate" => Some(Self::Deactivate),
            "suspend" => Some(Self::Suspend),
            _ => None,
        }
    }

    pub fn resulting_status(self) -> RecordStatus {
        match self {
            Self::Activate => RecordStatus::Active,
            Self::Deactivate => RecordStatus::Inactive,
            Self::Suspend => RecordStatus::Suspended,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyPayload {
    pub company_name: String,
    pub address: String,
    pub industry: Option<IndustryId>,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub website: Option<String>,
    pub remark: Option<String>,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndustryPayload {
    pub industry_name: String,
    pub description: Option<String>,
    pub status: RecordStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenefitPayload {
    pub benefit_name: String,
    pub description: Option<String>,
    pub patient_type: Option<PatientType>,
    pub limit_amount: Option<f64>,
    pub plan: Option<PlanId>,
    pub status: RecordStatus,
}
