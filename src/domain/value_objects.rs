use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::InvalidId;

/// 正の整数IDを持つ値オブジェクトを定義する
///
/// 0以下の値は`InvalidId`として拒否され、ストレージに触れる前に弾かれる。
macro_rules! positive_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i32")]
        pub struct $name(i32);

        impl $name {
            /// 生の値から生成する（正の整数のみ）
            pub fn new(raw: i64) -> Result<Self, InvalidId> {
                if raw <= 0 {
                    return Err(InvalidId::NotPositive { kind: $label, value: raw });
                }
                i32::try_from(raw)
                    .map(Self)
                    .map_err(|_| InvalidId::OutOfRange { kind: $label, value: raw })
            }

            pub fn value(&self) -> i32 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = InvalidId;

            fn try_from(raw: i64) -> Result<Self, Self::Error> {
                Self::new(raw)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

positive_id!(
    /// 書籍ID
    BookId,
    "book"
);

positive_id!(
    /// 利用者（パトロン）ID
    PatronId,
    "patron"
);

positive_id!(
    /// 貸出記録ID - ストレージが採番する
    LoanId,
    "loan"
);

/// アカウントID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(Uuid);

impl AccountId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl Default for AccountId {
    fn default() -> Self {
        Self::new()
    }
}

/// アカウントのロール（JWTのrolesクレームに載る）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Admin" => Ok(Role::Admin),
            "User" => Ok(Role::User),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}
