/*
[INPUT]:  Station context
[OUTPUT]: Full backlog snapshots
[POS]:    HTTP layer - backlog snapshot endpoint
[UPDATE]: When the snapshot endpoint grows filters or pagination
*/

use reqwest::Method;

use crate::http::{FloorClient, Result};
use crate::types::BacklogEntry;

impl FloorClient {
    /// Fetch the full snapshot of backlog entries visible to this station.
    ///
    /// GET /api/backlog_snapshot
    pub async fn list_snapshot(&self) -> Result<Vec<BacklogEntry>> {
        let builder = self.request(Method::GET, "/api/backlog_snapshot")?;
        self.send_json(builder).await
    }
}
