use chrono::{Datelike, NaiveDate};
use sea_orm::{entity::prelude::*, ActiveValue::NotSet, DatabaseConnection, QueryOrder, Set};
use serde::{Deserialize, Serialize};

use crate::errors::{self, FieldErrors, ModelError};

pub const NAME_MAX_LEN: usize = 50;
pub const DESCRIPTION_MAX_LEN: usize = 500;
pub const INVALID_DATE: &str = "Enter a valid date.";

/// Accepted input formats for `created_on`, tried in order.
const DATE_INPUT_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "company")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: String,
    pub created_on: Date,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation {}

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef { panic!("no relations defined here") }
}

impl ActiveModelBehavior for ActiveModel {}

/// Raw form submission; every field may be missing.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CompanyForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_on: Option<String>,
}

/// A form that passed validation and can be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCompany {
    pub name: String,
    pub description: String,
    pub created_on: NaiveDate,
}

/// chrono's `%Y` also takes 1-3 digit years, so `03/04/21` would become year 21.
/// Four-digit formats only accept four-digit years; two-digit input falls through to `%y`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    DATE_INPUT_FORMATS.iter().find_map(|fmt| {
        let parsed = NaiveDate::parse_from_str(raw, fmt).ok()?;
        if fmt.contains("%Y") && parsed.year() < 1000 {
            return None;
        }
        Some(parsed)
    })
}

fn required<'a>(errs: &mut FieldErrors, field: &str, value: Option<&'a str>) -> Option<&'a str> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errs.add(field, errors::REQUIRED);
            None
        }
    }
}

impl CompanyForm {
    /// Form-level validation: presence, lengths and date parsing.
    pub fn validate(&self) -> Result<NewCompany, FieldErrors> {
        let mut errs = FieldErrors::new();
        let name = required(&mut errs, "name", self.name.as_deref());
        errs.check_len("name", name, NAME_MAX_LEN);
        let description = required(&mut errs, "description", self.description.as_deref());
        errs.check_len("description", description, DESCRIPTION_MAX_LEN);
        let created_on = required(&mut errs, "created_on", self.created_on.as_deref()).and_then(|raw| {
            let parsed = parse_date(raw);
            if parsed.is_none() { errs.add("created_on", INVALID_DATE); }
            parsed
        });

        match (name, description, created_on) {
            (Some(n), Some(d), Some(c)) if errs.is_empty() => Ok(NewCompany {
                name: n.to_string(),
                description: d.to_string(),
                created_on: c,
            }),
            _ => Err(errs),
        }
    }
}

pub async fn create(db: &DatabaseConnection, input: NewCompany) -> Result<Model, ModelError> {
    let am = ActiveModel {
        id: NotSet,
        name: Set(input.name),
        description: Set(input.description),
        created_on: Set(input.created_on),
    };
    am.insert(db).await.map_err(|e| ModelError::Db(e.to_string()))
}

pub async fn list(db: &DatabaseConnection) -> Result<Vec<Model>, ModelError> {
    Ok(Entity::find().order_by_asc(Column::Id).all(db).await?)
}

pub async fn get(db: &DatabaseConnection, id: i32) -> Result<Option<Model>, ModelError> {
    Ok(Entity::find_by_id(id).one(db).await?)
}
