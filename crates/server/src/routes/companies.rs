use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use minijinja::context;
use tracing::debug;

use models::company::CompanyForm;
use models::errors::FieldErrors;
use service::company_service;
use service::errors::ServiceError;

use super::auth::ServerState;
use crate::errors::PageError;

pub const LIST_PATH: &str = "/masters";
const NO_MATCH: &str = "No company matches the given query.";

fn render(state: &ServerState, name: &str, ctx: minijinja::Value) -> Result<Html<String>, PageError> {
    state
        .templates
        .render(name, ctx)
        .map(Html)
        .map_err(|e| PageError::internal(&state.templates, e))
}

fn render_form(state: &ServerState, form: &CompanyForm, errors: &FieldErrors) -> Result<Html<String>, PageError> {
    render(state, "masters/new.html", context! { form => form, errors => errors })
}

/// Company list page.
pub async fn welcome(State(state): State<ServerState>) -> Result<Html<String>, PageError> {
    let companies = company_service::list_companies(&state.db)
        .await
        .map_err(|e| PageError::internal(&state.templates, e))?;
    render(&state, "masters/home.html", context! { companies => companies })
}

/// Single company page; unknown ids render the not-found page.
pub async fn company(State(state): State<ServerState>, Path(raw): Path<String>) -> Result<Html<String>, PageError> {
    let not_found = || PageError::not_found(&state.templates, NO_MATCH);
    let id = super::parse_id(&raw).ok_or_else(not_found)?;
    let found = company_service::get_company(&state.db, id).await.map_err(|e| match e {
        ServiceError::NotFound(_) => not_found(),
        other => PageError::internal(&state.templates, other),
    })?;
    render(&state, "masters/details.html", context! { company => found })
}

pub async fn new_form(State(state): State<ServerState>) -> Result<Html<String>, PageError> {
    render_form(&state, &CompanyForm::default(), &FieldErrors::new())
}

/// Valid submissions persist one company and redirect to the list; invalid ones
/// re-render the form with the submitted values and nothing is written.
pub async fn submit_new(State(state): State<ServerState>, Form(form): Form<CompanyForm>) -> Result<Response, PageError> {
    match company_service::create_company(&state.db, &form).await {
        Ok(_) => Ok(Redirect::to(LIST_PATH).into_response()),
        Err(ServiceError::Invalid(errors)) => {
            debug!(fields = %errors, "company form rejected");
            Ok(render_form(&state, &form, &errors)?.into_response())
        }
        Err(e) => Err(PageError::internal(&state.templates, e)),
    }
}
