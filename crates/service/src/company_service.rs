use sea_orm::DatabaseConnection;
use tracing::{info, instrument};

use models::company::{self, CompanyForm};
use crate::errors::ServiceError;

pub async fn list_companies(db: &DatabaseConnection) -> Result<Vec<company::Model>, ServiceError> {
    Ok(company::list(db).await?)
}

pub async fn get_company(db: &DatabaseConnection, id: i32) -> Result<company::Model, ServiceError> {
    company::get(db, id).await?.ok_or_else(|| ServiceError::not_found("company"))
}

/// Validate the submitted form and insert exactly one company.
#[instrument(skip(db, form))]
pub async fn create_company(db: &DatabaseConnection, form: &CompanyForm) -> Result<company::Model, ServiceError> {
    let input = form.validate().map_err(ServiceError::Invalid)?;
    let created = company::create(db, input).await?;
    info!(company_id = created.id, name = %created.name, event = "company_created", "company created");
    Ok(created)
}
