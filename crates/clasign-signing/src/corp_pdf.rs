//! Upload and download of the signed corporation PDF.

use clasign_core::config::SigningConfig;
use clasign_core::error::{ClaError, ClaResult};
use clasign_core::repository::CorpSigningRepository;
use tracing::info;

use crate::accounts::load;
use crate::retry::retry_on_conflict;

const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Clone)]
pub struct CorpPdfService<C: CorpSigningRepository> {
    repo: C,
    config: SigningConfig,
}

impl<C: CorpSigningRepository> CorpPdfService<C> {
    pub fn new(repo: C, config: SigningConfig) -> Self {
        Self { repo, config }
    }

    pub async fn upload(&self, cs_id: &str, pdf: &[u8]) -> ClaResult<()> {
        if !pdf.starts_with(PDF_MAGIC) {
            return Err(ClaError::validation("not a PDF document"));
        }

        let repo = &self.repo;
        retry_on_conflict(self.config.max_cas_attempts, || async move {
            let cs = load(repo, cs_id).await?;
            repo.save_corp_pdf(&cs, pdf).await
        })
        .await?;

        info!(corp_signing_id = %cs_id, bytes = pdf.len(), "Corporation PDF uploaded");
        Ok(())
    }

    pub async fn download(&self, cs_id: &str) -> ClaResult<Vec<u8>> {
        self.repo.find_corp_pdf(cs_id).await
    }
}
