use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
pub enum Membership {
    #[serde(rename = "bronze")]
    #[sqlx(rename = "B")]
    Bronze,
    #[default]
    #[serde(rename = "silver")]
    #[sqlx(rename = "S")]
    Silver,
    #[serde(rename = "gold")]
    #[sqlx(rename = "G")]
    Gold,
}

impl std::fmt::Display for Membership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Membership::Bronze => write!(f, "bronze"),
            Membership::Silver => write!(f, "silver"),
            Membership::Gold => write!(f, "gold"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i64,
    pub user_id: String,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub membership: Membership,
}
