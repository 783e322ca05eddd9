//! SurrealDB implementation of [`CorpSigningRepository`].
//!
//! Every write is a conditional update on `version`: the statement only
//! matches while the stored version equals the one the caller read, and
//! bumps it in the same statement. No match means another writer got
//! there first and the call fails with `ConcurrentUpdating`.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use clasign_core::email::EmailAddr;
use clasign_core::error::{ClaError, ClaResult, ErrorCode};
use clasign_core::models::AllSigningInfo;
use clasign_core::models::corp_signing::{CorpSigning, CorpSummary, CreateCorpSigning, LinkInfo};
use clasign_core::models::corporation::Corporation;
use clasign_core::models::employee_signing::EmployeeSigning;
use clasign_core::models::manager::{Manager, Representative};
use clasign_core::repository::CorpSigningRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::{DbError, classify};
use crate::query::{DEFAULT_QUERY_TIMEOUT, bounded};

const ENTITY: &str = "corp_signing";

/// Projection shared by every read of the aggregate. The PDF is loaded
/// only by `find_corp_pdf`.
const FIELDS: &str = "meta::id(id) AS record_id, version, date, link_id, \
    cla_id, lang, rep_name, rep_email, corp_name, corp_domain, \
    corp_domains, admin, managers, employees, has_pdf, signing_info";

#[derive(Debug, SurrealValue)]
struct CorpSigningRow {
    record_id: String,
    version: u64,
    date: DateTime<Utc>,
    link_id: String,
    cla_id: String,
    lang: String,
    rep_name: String,
    rep_email: String,
    corp_name: String,
    corp_domain: String,
    corp_domains: Vec<String>,
    admin: serde_json::Value,
    managers: serde_json::Value,
    employees: serde_json::Value,
    has_pdf: bool,
    signing_info: serde_json::Value,
}

impl CorpSigningRow {
    fn try_into_signing(self) -> Result<CorpSigning, DbError> {
        let email = EmailAddr::parse(&self.rep_email)
            .map_err(|e| DbError::decode("representative email", e))?;
        Ok(CorpSigning {
            id: self.record_id,
            version: self.version,
            signed_at: self.date,
            link: LinkInfo {
                link_id: self.link_id,
                cla_id: self.cla_id,
                language: self.lang,
            },
            representative: Representative {
                name: self.rep_name,
                email,
            },
            corporation: Corporation {
                name: self.corp_name,
                primary_email_domain: self.corp_domain,
                all_email_domains: self.corp_domains,
            },
            admin: from_doc("admin", self.admin)?,
            managers: from_doc("managers", self.managers)?,
            employees: from_doc("employees", self.employees)?,
            has_pdf: self.has_pdf,
            info: from_doc::<Option<AllSigningInfo>>("signing info", self.signing_info)?
                .unwrap_or_default(),
        })
    }
}

#[derive(Debug, SurrealValue)]
struct VersionRow {
    #[allow(dead_code)]
    version: u64,
}

#[derive(Debug, SurrealValue)]
struct IdRow {
    record_id: String,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

#[derive(Debug, SurrealValue)]
struct SummaryRow {
    record_id: String,
    corp_name: String,
    has_manager: bool,
}

#[derive(Debug, SurrealValue)]
struct ManagersRow {
    managers: serde_json::Value,
}

#[derive(Debug, SurrealValue)]
struct EmployeesRow {
    employees: serde_json::Value,
}

#[derive(Debug, SurrealValue)]
struct DomainsRow {
    corp_domains: Vec<String>,
}

#[derive(Debug, SurrealValue)]
struct PdfRow {
    has_pdf: bool,
    pdf: Option<String>,
}

fn from_doc<T: serde::de::DeserializeOwned>(
    what: &str,
    value: serde_json::Value,
) -> Result<T, DbError> {
    serde_json::from_value(value).map_err(|e| DbError::decode(what, e))
}

fn to_doc<T: serde::Serialize>(value: &T) -> ClaResult<serde_json::Value> {
    serde_json::to_value(value).map_err(ClaError::from)
}

/// A conditional write that returned no row lost the version race (or the
/// record is gone, which is the same outcome for the caller).
fn applied(rows: &[VersionRow], cs: &CorpSigning) -> Result<(), DbError> {
    if rows.is_empty() {
        debug!(id = %cs.id, version = cs.version, "Stale corp signing write rejected");
        return Err(DbError::stale(ENTITY, &cs.id));
    }
    Ok(())
}

/// SurrealDB implementation of the corporation signing repository.
#[derive(Clone)]
pub struct SurrealCorpSigningRepository<C: Connection> {
    db: Surreal<C>,
    timeout: Duration,
}

impl<C: Connection> SurrealCorpSigningRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self::with_timeout(db, DEFAULT_QUERY_TIMEOUT)
    }

    pub fn with_timeout(db: Surreal<C>, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    async fn select_one<T: SurrealValue>(&self, fields: &str, id: &str) -> ClaResult<T> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(format!(
                    "SELECT {fields} FROM type::record('corp_signing', $id)"
                ))
                .bind(("id", id.to_string())),
        )
        .await?;

        let rows: Vec<T> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(ENTITY, id).into())
    }

    /// Archive a removed signing. The live record is already gone, so a
    /// failure here is logged rather than surfaced.
    async fn archive(&self, cs: &CorpSigning) {
        let snapshot = match to_doc(cs) {
            Ok(v) => v,
            Err(e) => {
                error!(id = %cs.id, error = %e, "Failed to snapshot removed corp signing");
                return;
            }
        };

        let outcome = bounded(
            self.timeout,
            self.db
                .query(
                    "CREATE type::record('corp_signing_archive', $id) SET \
                     link_id = $link_id, \
                     snapshot = $snapshot",
                )
                .bind(("id", cs.id.clone()))
                .bind(("link_id", cs.link.link_id.clone()))
                .bind(("snapshot", snapshot)),
        )
        .await
        .and_then(|r| r.check().map_err(classify));

        if let Err(e) = outcome {
            error!(id = %cs.id, error = %e, "Failed to archive removed corp signing");
        }
    }
}

impl<C: Connection> CorpSigningRepository for SurrealCorpSigningRepository<C> {
    async fn add(&self, input: CreateCorpSigning) -> ClaResult<CorpSigning> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let corporation = input.corporation();
        let info = to_doc(&input.info)?;

        bounded(
            self.timeout,
            self.db
                .query(
                    "CREATE type::record('corp_signing', $id) SET \
                     version = 0, \
                     date = $date, \
                     link_id = $link_id, \
                     cla_id = $cla_id, \
                     lang = $lang, \
                     rep_name = $rep_name, \
                     rep_email = $rep_email, \
                     corp_name = $corp_name, \
                     corp_domain = $corp_domain, \
                     corp_domains = [$corp_domain], \
                     admin = NULL, \
                     managers = [], \
                     employees = [], \
                     deleted = [], \
                     has_pdf = false, \
                     signing_info = $signing_info",
                )
                .bind(("id", id.clone()))
                .bind(("date", now))
                .bind(("link_id", input.link.link_id.clone()))
                .bind(("cla_id", input.link.cla_id.clone()))
                .bind(("lang", input.link.language.clone()))
                .bind(("rep_name", input.representative.name.clone()))
                .bind(("rep_email", input.representative.email.to_string()))
                .bind(("corp_name", corporation.name.clone()))
                .bind(("corp_domain", corporation.primary_email_domain.clone()))
                .bind(("signing_info", info)),
        )
        .await?
        .check()
        .map_err(classify)?;

        Ok(CorpSigning {
            id,
            version: 0,
            signed_at: now,
            link: input.link,
            representative: input.representative,
            corporation,
            admin: None,
            managers: Vec::new(),
            employees: Vec::new(),
            has_pdf: false,
            info: input.info,
        })
    }

    async fn find(&self, id: &str) -> ClaResult<CorpSigning> {
        let row: CorpSigningRow = self.select_one(FIELDS, id).await?;
        row.try_into_signing().map_err(Into::into)
    }

    async fn list_by_link(&self, link_id: &str) -> ClaResult<Vec<CorpSigning>> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(format!(
                    "SELECT {FIELDS} FROM corp_signing \
                     WHERE link_id = $link_id ORDER BY date ASC"
                ))
                .bind(("link_id", link_id.to_string())),
        )
        .await?;

        let rows: Vec<CorpSigningRow> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .map(|r| r.try_into_signing().map_err(Into::into))
            .collect()
    }

    async fn find_corp_summary(&self, link_id: &str, domain: &str) -> ClaResult<Vec<CorpSummary>> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "SELECT meta::id(id) AS record_id, corp_name, \
                     array::len(managers) > 0 AS has_manager FROM corp_signing \
                     WHERE link_id = $link_id \
                     AND corp_domains CONTAINS $domain",
                )
                .bind(("link_id", link_id.to_string()))
                .bind(("domain", domain.to_ascii_lowercase())),
        )
        .await?;

        let rows: Vec<SummaryRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|r| CorpSummary {
                corp_signing_id: r.record_id,
                corp_name: r.corp_name,
                has_manager: r.has_manager,
            })
            .collect())
    }

    async fn count_admins_by_domain(&self, link_id: &str, domain: &str) -> ClaResult<u64> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "SELECT count() AS total FROM corp_signing \
                     WHERE link_id = $link_id \
                     AND corp_domain = $domain AND !!admin GROUP ALL",
                )
                .bind(("link_id", link_id.to_string()))
                .bind(("domain", domain.to_ascii_lowercase())),
        )
        .await?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn has_signed_link(&self, link_id: &str) -> ClaResult<bool> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "SELECT meta::id(id) AS record_id FROM corp_signing \
                     WHERE link_id = $link_id LIMIT 1",
                )
                .bind(("link_id", link_id.to_string())),
        )
        .await?;

        let rows: Vec<IdRow> = result.take(0).map_err(DbError::from)?;
        Ok(!rows.is_empty())
    }

    async fn remove(&self, cs: &CorpSigning) -> ClaResult<()> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "DELETE type::record('corp_signing', $id) \
                     WHERE version = $version RETURN BEFORE",
                )
                .bind(("id", cs.id.clone()))
                .bind(("version", cs.version)),
        )
        .await?
        .check()
        .map_err(classify)?;

        let rows: Vec<VersionRow> = result.take(0).map_err(DbError::from)?;
        applied(&rows, cs)?;

        self.archive(cs).await;
        Ok(())
    }

    async fn add_admin(&self, cs: &CorpSigning) -> ClaResult<()> {
        let admin = cs
            .admin
            .as_ref()
            .ok_or_else(|| ClaError::validation("corp signing has no admin to store"))?;
        let admin = to_doc(admin)?;

        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "UPDATE type::record('corp_signing', $id) SET \
                     admin = $admin, version += 1 \
                     WHERE version = $version RETURN version",
                )
                .bind(("id", cs.id.clone()))
                .bind(("version", cs.version))
                .bind(("admin", admin)),
        )
        .await?
        .check()
        .map_err(classify)?;

        let rows: Vec<VersionRow> = result.take(0).map_err(DbError::from)?;
        applied(&rows, cs).map_err(Into::into)
    }

    async fn add_employee_managers(&self, cs: &CorpSigning, managers: &[Manager]) -> ClaResult<()> {
        let managers = to_doc(&managers)?;

        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "UPDATE type::record('corp_signing', $id) SET \
                     managers = array::concat(managers, $managers), \
                     version += 1 \
                     WHERE version = $version RETURN version",
                )
                .bind(("id", cs.id.clone()))
                .bind(("version", cs.version))
                .bind(("managers", managers)),
        )
        .await?
        .check()
        .map_err(classify)?;

        let rows: Vec<VersionRow> = result.take(0).map_err(DbError::from)?;
        applied(&rows, cs).map_err(Into::into)
    }

    async fn remove_employee_managers(&self, cs: &CorpSigning, ids: &[String]) -> ClaResult<()> {
        let kept: Vec<&Manager> = cs
            .managers
            .iter()
            .filter(|m| !ids.contains(&m.id))
            .collect();
        let kept = to_doc(&kept)?;

        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "UPDATE type::record('corp_signing', $id) SET \
                     managers = $managers, version += 1 \
                     WHERE version = $version RETURN version",
                )
                .bind(("id", cs.id.clone()))
                .bind(("version", cs.version))
                .bind(("managers", kept)),
        )
        .await?
        .check()
        .map_err(classify)?;

        let rows: Vec<VersionRow> = result.take(0).map_err(DbError::from)?;
        applied(&rows, cs).map_err(Into::into)
    }

    async fn find_employee_managers(&self, id: &str) -> ClaResult<Vec<Manager>> {
        let row: ManagersRow = self.select_one("managers", id).await?;
        from_doc("managers", row.managers).map_err(Into::into)
    }

    async fn add_employee(&self, cs: &CorpSigning, es: &EmployeeSigning) -> ClaResult<String> {
        let mut es = es.clone();
        es.id = Uuid::new_v4().simple().to_string();
        let doc = to_doc(&es)?;

        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "UPDATE type::record('corp_signing', $id) SET \
                     employees = array::append(employees, $employee), \
                     version += 1 \
                     WHERE version = $version RETURN version",
                )
                .bind(("id", cs.id.clone()))
                .bind(("version", cs.version))
                .bind(("employee", doc)),
        )
        .await?
        .check()
        .map_err(classify)?;

        let rows: Vec<VersionRow> = result.take(0).map_err(DbError::from)?;
        applied(&rows, cs)?;

        Ok(es.id)
    }

    async fn save_employee(&self, cs: &CorpSigning, es: &EmployeeSigning) -> ClaResult<()> {
        if !cs.employees.iter().any(|e| e.id == es.id) {
            return Err(ErrorCode::EmployeeSigningNotFound.into());
        }
        let employees: Vec<&EmployeeSigning> = cs
            .employees
            .iter()
            .map(|e| if e.id == es.id { es } else { e })
            .collect();
        let employees = to_doc(&employees)?;

        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "UPDATE type::record('corp_signing', $id) SET \
                     employees = $employees, version += 1 \
                     WHERE version = $version RETURN version",
                )
                .bind(("id", cs.id.clone()))
                .bind(("version", cs.version))
                .bind(("employees", employees)),
        )
        .await?
        .check()
        .map_err(classify)?;

        let rows: Vec<VersionRow> = result.take(0).map_err(DbError::from)?;
        applied(&rows, cs).map_err(Into::into)
    }

    async fn remove_employee(&self, cs: &CorpSigning, es: &EmployeeSigning) -> ClaResult<()> {
        let kept: Vec<&EmployeeSigning> = cs.employees.iter().filter(|e| e.id != es.id).collect();
        let kept = to_doc(&kept)?;
        let removed = to_doc(es)?;

        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "UPDATE type::record('corp_signing', $id) SET \
                     employees = $employees, \
                     deleted = array::append(deleted, $removed), \
                     version += 1 \
                     WHERE version = $version RETURN version",
                )
                .bind(("id", cs.id.clone()))
                .bind(("version", cs.version))
                .bind(("employees", kept))
                .bind(("removed", removed)),
        )
        .await?
        .check()
        .map_err(classify)?;

        let rows: Vec<VersionRow> = result.take(0).map_err(DbError::from)?;
        applied(&rows, cs).map_err(Into::into)
    }

    async fn find_employees(&self, id: &str) -> ClaResult<Vec<EmployeeSigning>> {
        let row: EmployeesRow = self.select_one("employees", id).await?;
        from_doc("employees", row.employees).map_err(Into::into)
    }

    async fn find_employees_by_email(
        &self,
        link_id: &str,
        email: &EmailAddr,
    ) -> ClaResult<Vec<EmployeeSigning>> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "SELECT employees FROM corp_signing \
                     WHERE link_id = $link_id \
                     AND employees.representative.email CONTAINS $email",
                )
                .bind(("link_id", link_id.to_string()))
                .bind(("email", email.to_string())),
        )
        .await?;

        let rows: Vec<EmployeesRow> = result.take(0).map_err(DbError::from)?;
        let mut found = Vec::new();
        for row in rows {
            let employees: Vec<EmployeeSigning> = from_doc("employees", row.employees)?;
            found.extend(
                employees
                    .into_iter()
                    .filter(|e| e.representative.email == *email),
            );
        }
        Ok(found)
    }

    async fn add_email_domain(&self, cs: &CorpSigning, domain: &str) -> ClaResult<()> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "UPDATE type::record('corp_signing', $id) SET \
                     corp_domains = array::append(corp_domains, $domain), \
                     triggered = true, version += 1 \
                     WHERE version = $version RETURN version",
                )
                .bind(("id", cs.id.clone()))
                .bind(("version", cs.version))
                .bind(("domain", domain.to_ascii_lowercase())),
        )
        .await?
        .check()
        .map_err(classify)?;

        let rows: Vec<VersionRow> = result.take(0).map_err(DbError::from)?;
        applied(&rows, cs).map_err(Into::into)
    }

    async fn find_email_domains(&self, id: &str) -> ClaResult<Vec<String>> {
        let row: DomainsRow = self.select_one("corp_domains", id).await?;
        Ok(row.corp_domains)
    }

    async fn save_corp_pdf(&self, cs: &CorpSigning, pdf: &[u8]) -> ClaResult<()> {
        let mut result = bounded(
            self.timeout,
            self.db
                .query(
                    "UPDATE type::record('corp_signing', $id) SET \
                     pdf = $pdf, has_pdf = true, triggered = true, \
                     version += 1 \
                     WHERE version = $version RETURN version",
                )
                .bind(("id", cs.id.clone()))
                .bind(("version", cs.version))
                .bind(("pdf", STANDARD.encode(pdf))),
        )
        .await?
        .check()
        .map_err(classify)?;

        let rows: Vec<VersionRow> = result.take(0).map_err(DbError::from)?;
        applied(&rows, cs).map_err(Into::into)
    }

    async fn find_corp_pdf(&self, id: &str) -> ClaResult<Vec<u8>> {
        let row: PdfRow = self.select_one("has_pdf, pdf", id).await?;
        match row.pdf {
            Some(pdf) if row.has_pdf => STANDARD
                .decode(pdf)
                .map_err(|e| DbError::decode("corp pdf", e).into()),
            _ => Err(ErrorCode::CorpPdfNotFound.into()),
        }
    }
}
