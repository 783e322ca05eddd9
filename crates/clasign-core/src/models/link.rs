//! An organization's binding to its CLA texts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::email::EmailAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaType {
    Individual,
    Corporation,
}

impl ClaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Corporation => "corporation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "individual" => Some(Self::Individual),
            "corporation" => Some(Self::Corporation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cla {
    pub id: String,
    pub cla_type: ClaType,
    pub language: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub org: String,
    pub email_sender: EmailAddr,
    pub submitter: String,
    pub clas: Vec<Cla>,
    /// Monotonic counter behind stable CLA ids.
    pub cla_num: u64,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// Assign the next stable id to `cla` and attach it.
    pub fn add_cla(&mut self, mut cla: Cla) -> &Cla {
        self.cla_num += 1;
        cla.id = format!("cla_{}", self.cla_num);
        self.clas.push(cla);
        &self.clas[self.clas.len() - 1]
    }
}

#[derive(Debug, Clone)]
pub struct CreateLink {
    pub org: String,
    pub email_sender: EmailAddr,
    pub submitter: String,
}
