use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered user level. Privileges name the minimum rank they require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRank {
    Anonymous,
    Restricted,
    Regular,
    Power,
    Moderator,
    Administrator,
}

impl UserRank {
    pub fn parse(s: &str) -> Result<Self, String> {
        match s {
            "anonymous" => Ok(Self::Anonymous),
            "restricted" => Ok(Self::Restricted),
            "regular" => Ok(Self::Regular),
            "power" => Ok(Self::Power),
            "moderator" => Ok(Self::Moderator),
            "administrator" => Ok(Self::Administrator),
            other => Err(format!("Invalid user rank: {other}")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Restricted => "restricted",
            Self::Regular => "regular",
            Self::Power => "power",
            Self::Moderator => "moderator",
            Self::Administrator => "administrator",
        }
    }
}

impl fmt::Display for UserRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The acting party of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Client {
    pub id: Option<i64>,
    pub rank: UserRank,
}

impl Client {
    pub fn anonymous() -> Self {
        Self {
            id: None,
            rank: UserRank::Anonymous,
        }
    }

    pub fn user(id: i64, rank: UserRank) -> Self {
        Self { id: Some(id), rank }
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "user {id} ({})", self.rank),
            None => f.write_str("anonymous"),
        }
    }
}

/// Whether the acting client authored the resource it acts upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    Own,
    Any,
}

impl Ownership {
    /// A client owns a resource only when both sides carry the same user id.
    /// Anonymous clients and author-less resources never match.
    pub fn of(client: &Client, author_id: Option<i64>) -> Self {
        match (client.id, author_id) {
            (Some(client_id), Some(author_id)) if client_id == author_id => Self::Own,
            _ => Self::Any,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    CommentList,
    CommentCreate,
    CommentView,
    CommentEdit(Ownership),
    CommentDelete(Ownership),
    CommentScore,
}

impl Privilege {
    pub const ALL: [Privilege; 8] = [
        Privilege::CommentList,
        Privilege::CommentCreate,
        Privilege::CommentView,
        Privilege::CommentEdit(Ownership::Own),
        Privilege::CommentEdit(Ownership::Any),
        Privilege::CommentDelete(Ownership::Own),
        Privilege::CommentDelete(Ownership::Any),
        Privilege::CommentScore,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Privilege::CommentList => "comments:list",
            Privilege::CommentCreate => "comments:create",
            Privilege::CommentView => "comments:view",
            Privilege::CommentEdit(Ownership::Own) => "comments:edit:self",
            Privilege::CommentEdit(Ownership::Any) => "comments:edit:any",
            Privilege::CommentDelete(Ownership::Own) => "comments:delete:self",
            Privilege::CommentDelete(Ownership::Any) => "comments:delete:any",
            Privilege::CommentScore => "comments:score",
        }
    }
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("Insufficient privileges: {0} required")]
pub struct InsufficientPrivileges(pub Privilege);

/// Minimum rank for every privilege, built from the `privileges` configuration section.
#[derive(Debug, Clone)]
pub struct PrivilegeTable {
    ranks: HashMap<&'static str, UserRank>,
}

impl PrivilegeTable {
    pub fn required_rank(&self, privilege: Privilege) -> UserRank {
        // construction guarantees every key is present
        self.ranks
            .get(privilege.key())
            .copied()
            .unwrap_or(UserRank::Administrator)
    }

    pub fn verify(&self, client: &Client, privilege: Privilege) -> Result<(), InsufficientPrivileges> {
        if client.rank >= self.required_rank(privilege) {
            Ok(())
        } else {
            Err(InsufficientPrivileges(privilege))
        }
    }
}

impl TryFrom<HashMap<String, UserRank>> for PrivilegeTable {
    type Error = String;

    fn try_from(configured: HashMap<String, UserRank>) -> Result<Self, Self::Error> {
        let mut ranks = HashMap::with_capacity(Privilege::ALL.len());
        for privilege in Privilege::ALL {
            let rank = configured
                .get(privilege.key())
                .copied()
                .ok_or_else(|| format!("Missing rank for privilege `{privilege}`"))?;
            ranks.insert(privilege.key(), rank);
        }

        Ok(Self { ranks })
    }
}
