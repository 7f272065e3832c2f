use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

/// A vaccine in the catalog. Read-only to this core.
#[derive(Queryable, Identifiable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::vaccines)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Vaccine {
    pub id: String,
    pub name: String,
    pub manufacturer: Option<String>,
    pub doses_required: i32,
    pub created_at: NaiveDateTime,
}

/// A vaccination center. Read-only to this core.
#[derive(Queryable, Identifiable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::centers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Center {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A platform user (patient or clinical staff). Read-only to this core.
/// `wallet_address` is the linked external-ledger address, stored in
/// canonical lowercase form.
#[derive(Queryable, Identifiable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: Option<String>,
    pub wallet_address: Option<String>,
    pub created_at: NaiveDateTime,
}
