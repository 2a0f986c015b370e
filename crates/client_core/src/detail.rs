use shared::{
    domain::{Company, CompanyId, Scheme},
    protocol::{CompanyFilter, SchemeFilter},
};
use tracing::debug;

use crate::{
    api::{EntityApi, RemoteError},
    entity::Entity,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Detail<T> {
    Found(T),
    /// The record is gone from a freshly loaded collection; show the parent list.
    RedirectToList,
}

pub fn resolve<T: Entity>(items: &[T], id: T::Id) -> Detail<T> {
    match items.iter().find(|item| item.id() == id) {
        Some(item) => Detail::Found(item.clone()),
        None => {
            debug!(resource = T::RESOURCE, %id, "record not found; redirecting to list");
            Detail::RedirectToList
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyDetail {
    pub company: Company,
    pub schemes: Vec<Scheme>,
}

pub async fn load_company_detail<A>(api: &A, id: CompanyId) -> Result<Detail<CompanyDetail>, RemoteError>
where
    A: EntityApi<Company> + EntityApi<Scheme>,
{
    let companies: Vec<Company> = EntityApi::<Company>::list(api, &CompanyFilter::default()).await?;
    let company = match resolve(&companies, id) {
        Detail::Found(company) => company,
        Detail::RedirectToList => return Ok(Detail::RedirectToList),
    };

    let filter = SchemeFilter {
        company: Some(id),
        ..SchemeFilter::default()
    };
    let schemes = EntityApi::<Scheme>::list(api, &filter).await?;
    Ok(Detail::Found(CompanyDetail { company, schemes }))
}

#[cfg(test)]
#[path = "tests/detail_tests.rs"]
mod tests;
