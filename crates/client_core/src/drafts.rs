//! Editable draft state behind the create/update forms.

use std::fmt;

use serde::Serialize;
use shared::{
    domain::{IndustryId, PatientType, PlanId, RecordStatus},
    error::FieldErrors,
    protocol::{BenefitPayload, CompanyPayload, IndustryPayload},
};

use thiserror::Error;

use crate::validation;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftFieldError {
    #[error("unknown form field '{0}'")]
    Unknown(String),
    #[error("{field}: {message}")]
    InvalidValue { field: String, message: String },
}

pub trait FormDraft: Clone + Default + fmt::Debug + PartialEq + Send + Sync + 'static {
    type Payload: Serialize + Send + Sync;

    /// Field names accepted by [`FormDraft::set_field`], in display order.
    const FIELD_NAMES: &'static [&'static str];

    fn set_field(&mut self, name: &str, value: &str) -> Result<(), DraftFieldError>;

    fn field(&self, name: &str) -> Option<String>;

    fn validate(&self) -> FieldErrors;

    fn payload(&self) -> Self::Payload;
}

fn optional_text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_status(value: &str) -> Result<RecordStatus, DraftFieldError> {
    match value.trim().to_ascii_uppercase().as_str() {
        "ACTIVE" => Ok(RecordStatus::Active),
        "INACTIVE" => Ok(RecordStatus::Inactive),
        "SUSPENDED" => Ok(RecordStatus::Suspended),
        _ => Err(DraftFieldError::InvalidValue {
            field: "status".to_string(),
            message: format!("'{value}' is not one of ACTIVE, INACTIVE, SUSPENDED"),
        }),
    }
}

fn collect(errors: &mut FieldErrors, field: &str, message: Option<String>) {
    if let Some(message) = message {
        errors.insert(field.to_string(), message);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyDraft {
    pub company_name: String,
    pub address: String,
    /// Raw industry id as picked in the form.
    pub industry: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub website: String,
    pub remark: String,
    pub status: RecordStatus,
}

impl FormDraft for CompanyDraft {
    type Payload = CompanyPayload;

    const FIELD_NAMES: &'static [&'static str] = &[
        "company_name",
        "address",
        "industry",
        "contact_person",
        "email",
        "phone",
        "website",
        "remark",
        "status",
    ];

    fn set_field(&mut self, name: &str, value: &str) -> Result<(), DraftFieldError> {
        let slot = match name {
            "company_name" => &mut self.company_name,
            "address" => &mut self.address,
            "industry" => &mut self.industry,
            "contact_person" => &mut self.contact_person,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "website" => &mut self.website,
            "remark" => &mut self.remark,
            "status" => {
                self.status = parse_status(value)?;
                return Ok(());
            }
            other => return Err(DraftFieldError::Unknown(other.to_string())),
        };
        *slot = value.to_string();
        Ok(())
    }

    fn field(&self, name: &str) -> Option<String> {
        let value = match name {
            "company_name" => &self.company_name,
            "address" => &self.address,
            "industry" => &self.industry,
            "contact_person" => &self.contact_person,
            "email" => &self.email,
            "phone" => &self.phone,
            "website" => &self.website,
            "remark" => &self.remark,
            "status" => return Some(self.status.as_str().to_string()),
            _ => return None,
        };
        Some(value.clone())
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        collect(
            &mut errors,
            "company_name",
            validation::required_name("Company name", &self.company_name),
        );
        collect(
            &mut errors,
            "address",
            validation::required("Address", &self.address),
        );
        collect(
            &mut errors,
            "industry",
            validation::selected_id("an industry", &self.industry),
        );
        collect(
            &mut errors,
            "contact_person",
            validation::required_name("Contact person", &self.contact_person),
        );
        collect(&mut errors, "email", validation::email(&self.email));
        collect(&mut errors, "phone", validation::phone(&self.phone));
        collect(
            &mut errors,
            "website",
            validation::optional_website(&self.website),
        );
        errors
    }

    fn payload(&self) -> CompanyPayload {
        CompanyPayload {
            company_name: self.company_name.trim().to_string(),
            address: self.address.trim().to_string(),
            industry: self.industry.trim().parse().ok().map(IndustryId),
            contact_person: self.contact_person.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            website: optional_text(&self.website),
            remark: optional_text(&self.remark),
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndustryDraft {
    pub industry_name: String,
    pub description: String,
    pub status: RecordStatus,
}

impl FormDraft for IndustryDraft {
    type Payload = IndustryPayload;

    const FIELD_NAMES: &'static [&'static str] = &["industry_name", "description", "status"];

    fn set_field(&mut self, name: &str, value: &str) -> Result<(), DraftFieldError> {
        match name {
            "industry_name" => self.industry_name = value.to_string(),
            "description" => self.description = value.to_string(),
            "status" => self.status = parse_status(value)?,
            other => return Err(DraftFieldError::Unknown(other.to_string())),
        }
        Ok(())
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "industry_name" => Some(self.industry_name.clone()),
            "description" => Some(self.description.clone()),
            "status" => Some(self.status.as_str().to_string()),
            _ => None,
        }
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        collect(
            &mut errors,
            "industry_name",
            validation::required_name("Industry name", &self.industry_name),
        );
        errors
    }

    fn payload(&self) -> IndustryPayload {
        IndustryPayload {
            industry_name: self.industry_name.trim().to_string(),
            description: optional_text(&self.description),
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenefitDraft {
    pub benefit_name: String,
    pub description: String,
    pub patient_type: String,
    pub limit_amount: String,
    pub plan: String,
    pub status: RecordStatus,
}

impl FormDraft for BenefitDraft {
    type Payload = BenefitPayload;

    const FIELD_NAMES: &'static [&'static str] = &[
        "benefit_name",
        "description",
        "patient_type",
        "limit_amount",
        "plan",
        "status",
    ];

    fn set_field(&mut self, name: &str, value: &str) -> Result<(), DraftFieldError> {
        match name {
            "benefit_name" => self.benefit_name = value.to_string(),
            "description" => self.description = value.to_string(),
            "patient_type" => self.patient_type = value.to_string(),
            "limit_amount" => self.limit_amount = value.to_string(),
            "plan" => self.plan = value.to_string(),
            "status" => self.status = parse_status(value)?,
            other => return Err(DraftFieldError::Unknown(other.to_string())),
        }
        Ok(())
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "benefit_name" => Some(self.benefit_name.clone()),
            "description" => Some(self.description.clone()),
            "patient_type" => Some(self.patient_type.clone()),
            "limit_amount" => Some(self.limit_amount.clone()),
            "plan" => Some(self.plan.clone()),
            "status" => Some(self.status.as_str().to_string()),
            _ => None,
        }
    }

    fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        collect(
            &mut errors,
            "benefit_name",
            validation::required_name("Benefit name", &self.benefit_name),
        );
        let patient_type = validation::required("Patient type", &self.patient_type).or_else(|| {
            PatientType::parse(&self.patient_type)
                .is_none()
                .then(|| "Patient type must be INPATIENT, OUTPATIENT or BOTH".to_string())
        });
        collect(&mut errors, "patient_type", patient_type);
        collect(
            &mut errors,
            "limit_amount",
            validation::optional_amount("Limit amount", &self.limit_amount),
        );
        collect(&mut errors, "plan", validation::optional_id("plan", &self.plan));
        errors
    }

    fn payload(&self) -> BenefitPayload {
        BenefitPayload {
            benefit_name: self.benefit_name.trim().to_string(),
            description: optional_text(&self.description),
            patient_type: PatientType::parse(&self.patient_type),
            limit_amount: self.limit_amount.trim().parse().ok(),
            plan: self.plan.trim().parse().ok().map(PlanId),
            status: self.status,
        }
    }
}
