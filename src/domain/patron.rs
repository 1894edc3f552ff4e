use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::PatronId;

/// 利用者（パトロン）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patron {
    pub id: PatronId,
    #[serde(flatten)]
    pub details: PatronDetails,
}

/// 利用者の属性（IDを除く）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatronDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub date_of_birth: NaiveDate,
    pub address: String,
    pub membership_start_date: NaiveDate,
    pub membership_end_date: Option<NaiveDate>,
    pub is_active: bool,
}

impl std::ops::Deref for Patron {
    type Target = PatronDetails;

    fn deref(&self) -> &Self::Target {
        &self.details
    }
}
