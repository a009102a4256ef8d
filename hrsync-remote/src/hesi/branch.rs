//! Bank-branch export: request a download link, wait while the platform
//! prepares the file, then stream it to disk.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::HesiClient;
use crate::clock::Clock;
use crate::error::{io_err, RemoteError};
use crate::http::Method;

const GET_ALL_BRANCH_PATH: &str = "/api/openapi/v1/banks/getAllBranch";

pub const BRANCH_FILE_NAME: &str = "branch_info.xlsx";

const READY_CODE: &str = "A200";
const PROCESSING_CODES: [&str; 4] = ["A201", "A202", "A203", "A204"];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BranchLink {
    code: Option<String>,
    msg: Option<String>,
    url: Option<String>,
}

impl HesiClient {
    /// Download the bank-branch file into `dest_dir`, waiting `retry_delay`
    /// between "still processing" answers, for at most `max_retries` attempts.
    pub fn download_branch_file(
        &self,
        dest_dir: &Path,
        retry_delay: Duration,
        max_retries: u32,
        clock: &dyn Clock,
    ) -> Result<PathBuf, RemoteError> {
        let attempts = max_retries.max(1);
        for attempt in 1..=attempts {
            let request = self.request(Method::Post, GET_ALL_BRANCH_PATH)?;
            let response = self.transport.send(&request)?.error_for_status()?;
            let link: BranchLink = response.json("getAllBranch")?;
            let code = link.code.as_deref().unwrap_or_default();
            let msg = link.msg.as_deref().unwrap_or_default();

            match (code, link.url.as_deref()) {
                (READY_CODE, Some(url)) if !url.is_empty() => {
                    return self.save_branch_file(url, dest_dir);
                }
                (code, _) if PROCESSING_CODES.contains(&code) => {
                    tracing::warn!(
                        code,
                        msg,
                        attempt,
                        retry_in_secs = retry_delay.as_secs(),
                        "branch file still being prepared"
                    );
                    if attempt < attempts {
                        clock.sleep(retry_delay);
                    }
                }
                _ => return Err(RemoteError::api(code, msg)),
            }
        }
        Err(RemoteError::RetriesExhausted {
            operation: "bank branch file".into(),
            attempts,
        })
    }

    fn save_branch_file(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, RemoteError> {
        std::fs::create_dir_all(dest_dir).map_err(|e| io_err(dest_dir, e))?;
        let dest = dest_dir.join(BRANCH_FILE_NAME);
        let bytes = self.transport.download(url, &dest)?;
        tracing::info!(path = %dest.display(), bytes, "branch file downloaded");
        Ok(dest)
    }
}
