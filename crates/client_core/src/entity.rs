//! Static per-entity declarations: REST resource, cache key, export prefix and
//! typed field accessors used for searching and sorting.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{Benefit, BenefitId, Company, CompanyId, Industry, IndustryId, Scheme, SchemeId},
    protocol::{BenefitFilter, CompanyFilter, IndustryFilter, SchemeFilter},
};

use crate::{
    cache::CACHE_KEY_SUFFIX,
    drafts::{BenefitDraft, CompanyDraft, FormDraft, IndustryDraft},
};

/// The value of one declared field, borrowed from the record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    Time(DateTime<Utc>),
    Missing,
}

impl FieldValue<'_> {
    /// Case-insensitive substring match; `needle` must already be lowercase.
    pub fn contains_lowercase(&self, needle: &str) -> bool {
        match self {
            Self::Text(text) => text.to_lowercase().contains(needle),
            Self::Number(number) => number.to_string().contains(needle),
            Self::Time(_) | Self::Missing => false,
        }
    }

    fn text(value: &Option<String>) -> FieldValue<'_> {
        value
            .as_deref()
            .map(FieldValue::Text)
            .unwrap_or(FieldValue::Missing)
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(number) if number.fract() == 0.0 => write!(f, "{number:.0}"),
            Self::Number(number) => write!(f, "{number:.2}"),
            Self::Time(time) => write!(f, "{}", time.format("%Y-%m-%d %H:%M")),
            Self::Missing => f.write_str("-"),
        }
    }
}

pub trait Entity: Clone + fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    type Id: Copy + Eq + From<i64> + fmt::Display + fmt::Debug + Send + Sync + 'static;
    type Field: Copy + Eq + fmt::Debug + Send + Sync + 'static;
    type Filter: Serialize + Default + Send + Sync;

    /// Path segment of the REST collection, e.g. `companies`.
    const RESOURCE: &'static str;
    const EXPORT_PREFIX: &'static str;
    /// Column names as the backend spells them.
    const FIELDS: &'static [(&'static str, Self::Field)];
    const SEARCHABLE: &'static [Self::Field];

    fn id(&self) -> Self::Id;

    fn field_value(&self, field: Self::Field) -> FieldValue<'_>;

    fn cache_key() -> String {
        format!("{}{CACHE_KEY_SUFFIX}", Self::RESOURCE)
    }

    fn parse_field(name: &str) -> Option<Self::Field> {
        Self::FIELDS
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name.trim()))
            .map(|(_, field)| *field)
    }
}

/// Entities the console can create and update through a form.
pub trait Editable: Entity {
    type Draft: FormDraft;

    fn to_draft(&self) -> Self::Draft;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompanyField {
    Id,
    Name,
    Industry,
    ContactPerson,
    Email,
    Phone,
    Status,
    CreatedAt,
    UpdatedAt,
}

impl Entity for Company {
    type Id = CompanyId;
    type Field = CompanyField;
    type Filter = CompanyFilter;

    const RESOURCE: &'static str = "companies";
    const EXPORT_PREFIX: &'static str = "companies";
    const FIELDS: &'static [(&'static str, CompanyField)] = &[
        ("id", CompanyField::Id),
        ("company_name", CompanyField::Name),
        ("industry", CompanyField::Industry),
        ("contact_person", CompanyField::ContactPerson),
        ("email", CompanyField::Email),
        ("phone", CompanyField::Phone),
        ("status", CompanyField::Status),
        ("created_at", CompanyField::CreatedAt),
        ("updated_at", CompanyField::UpdatedAt),
    ];
    const SEARCHABLE: &'static [CompanyField] = &[
        CompanyField::Name,
        CompanyField::Industry,
        CompanyField::ContactPerson,
        CompanyField::Email,
    ];

    fn id(&self) -> CompanyId {
        self.id
    }

    fn field_value(&self, field: CompanyField) -> FieldValue<'_> {
        match field {
            CompanyField::Id => FieldValue::Number(self.id.0 as f64),
            CompanyField::Name => FieldValue::Text(&self.company_name),
            CompanyField::Industry => self
                .industry_detail
                .as_ref()
                .map(|detail| FieldValue::Text(&detail.industry_name))
                .unwrap_or(FieldValue::Missing),
            CompanyField::ContactPerson => FieldValue::Text(&self.contact_person),
            CompanyField::Email => FieldValue::Text(&self.email),
            CompanyField::Phone => FieldValue::Text(&self.phone),
            CompanyField::Status => FieldValue::Text(self.status.as_str()),
            CompanyField::CreatedAt => FieldValue::Time(self.created_at),
            CompanyField::UpdatedAt => FieldValue::Time(self.updated_at),
        }
    }
}

impl Editable for Company {
    type Draft = CompanyDraft;

    fn to_draft(&self) -> CompanyDraft {
        CompanyDraft {
            company_name: self.company_name.clone(),
            address: self.address.clone(),
            industry: self.industry.0.to_string(),
            contact_person: self.contact_person.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            website: self.website.clone().unwrap_or_default(),
            remark: self.remark.clone().unwrap_or_default(),
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndustryField {
    Id,
    Name,
    Description,
    Status,
    CreatedAt,
}

impl Entity for Industry {
    type Id = IndustryId;
    type Field = IndustryField;
    type Filter = IndustryFilter;

    const RESOURCE: &'static str = "industries";
    const EXPORT_PREFIX: &'static str = "industries";
    const FIELDS: &'static [(&'static str, IndustryField)] = &[
        ("id", IndustryField::Id),
        ("industry_name", IndustryField::Name),
        ("description", IndustryField::Description),
        ("status", IndustryField::Status),
        ("created_at", IndustryField::CreatedAt),
    ];
    const SEARCHABLE: &'static [IndustryField] = &[IndustryField::Name, IndustryField::Description];

    fn id(&self) -> IndustryId {
        self.id
    }

    fn field_value(&self, field: IndustryField) -> FieldValue<'_> {
        match field {
            IndustryField::Id => FieldValue::Number(self.id.0 as f64),
            IndustryField::Name => FieldValue::Text(&self.industry_name),
            IndustryField::Description => FieldValue::text(&self.description),
            IndustryField::Status => FieldValue::Text(self.status.as_str()),
            IndustryField::CreatedAt => FieldValue::Time(self.created_at),
        }
    }
}

impl Editable for Industry {
    type Draft = IndustryDraft;

    fn to_draft(&self) -> IndustryDraft {
        IndustryDraft {
            industry_name: self.industry_name.clone(),
            description: self.description.clone().unwrap_or_default(),
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BenefitField {
    Id,
    Name,
    Description,
    PatientType,
    LimitAmount,
    Status,
    CreatedAt,
}

impl Entity for Benefit {
    type Id = BenefitId;
    type Field = BenefitField;
    type Filter = BenefitFilter;

    const RESOURCE: &'static str = "benefits";
    const EXPORT_PREFIX: &'static str = "benefits";
    const FIELDS: &'static [(&'static str, BenefitField)] = &[
        ("id", BenefitField::Id),
        ("benefit_name", BenefitField::Name),
        ("description", BenefitField::Description),
        ("patient_type", BenefitField::PatientType),
        ("limit_amount", BenefitField::LimitAmount),
        ("status", BenefitField::Status),
        ("created_at", BenefitField::CreatedAt),
    ];
    const SEARCHABLE: &'static [BenefitField] = &[
        BenefitField::Name,
        BenefitField::Description,
        BenefitField::PatientType,
    ];

    fn id(&self) -> BenefitId {
        self.id
    }

    fn field_value(&self, field: BenefitField) -> FieldValue<'_> {
        match field {
            BenefitField::Id => FieldValue::Number(self.id.0 as f64),
            BenefitField::Name => FieldValue::Text(&self.benefit_name),
            BenefitField::Description => FieldValue::text(&self.description),
            BenefitField::PatientType => FieldValue::Text(self.patient_type.as_str()),
            BenefitField::LimitAmount => self
                .limit_amount
                .map(FieldValue::Number)
                .unwrap_or(FieldValue::Missing),
            BenefitField::Status => FieldValue::Text(self.status.as_str()),
            BenefitField::CreatedAt => FieldValue::Time(self.created_at),
        }
    }
}

impl Editable for Benefit {
    type Draft = BenefitDraft;

    fn to_draft(&self) -> BenefitDraft {
        BenefitDraft {
            benefit_name: self.benefit_name.clone(),
            description: self.description.clone().unwrap_or_default(),
            patient_type: self.patient_type.as_str().to_string(),
            limit_amount: self
                .limit_amount
                .map(|amount| amount.to_string())
                .unwrap_or_default(),
            plan: self.plan.map(|plan| plan.0.to_string()).unwrap_or_default(),
            status: self.status,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemeField {
    Id,
    Name,
    CardCode,
    Description,
    Status,
}

impl Entity for Scheme {
    type Id = SchemeId;
    type Field = SchemeField;
    type Filter = SchemeFilter;

    const RESOURCE: &'static str = "schemes";
    const EXPORT_PREFIX: &'static str = "schemes";
    const FIELDS: &'static [(&'static str, SchemeField)] = &[
        ("id", SchemeField::Id),
        ("scheme_name", SchemeField::Name),
        ("card_code", SchemeField::CardCode),
        ("description", SchemeField::Description),
        ("status", SchemeField::Status),
    ];
    const SEARCHABLE: &'static [SchemeField] = &[
        SchemeField::Name,
        SchemeField::CardCode,
        SchemeField::Description,
    ];

    fn id(&self) -> SchemeId {
        self.id
    }

    fn field_value(&self, field: SchemeField) -> FieldValue<'_> {
        match field {
            SchemeField::Id => FieldValue::Number(self.id.0 as f64),
            SchemeField::Name => FieldValue::Text(&self.scheme_name),
            SchemeField::CardCode => FieldValue::Text(&self.card_code),
            SchemeField::Description => FieldValue::Text(&self.description),
            SchemeField::Status => FieldValue::Text(self.status.as_str()),
        }
    }
}
