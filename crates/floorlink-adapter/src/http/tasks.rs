/*
[INPUT]:  Guided-work queries and commit bodies
[OUTPUT]: Next-work envelopes and action receipts
[POS]:    HTTP layer - task assignment and confirmation endpoints
[UPDATE]: When task endpoints change or new task kinds are added
*/

use reqwest::Method;

use crate::http::{FloorClient, Result};
use crate::types::{
    ActionReceipt, CompleteRelocationRequest, ConfirmPickRequest, NextWorkResponse,
    UpdateStatusRequest, WorkStatus,
};

impl FloorClient {
    /// Request the next pick item for an order
    ///
    /// GET /api/next_pick_item?order_id={order_id}
    pub async fn next_pick_item(&self, order_id: &str) -> Result<NextWorkResponse> {
        let endpoint = format!("/api/next_pick_item?order_id={}", order_id);
        let builder = self.request(Method::GET, &endpoint)?;
        self.send_json(builder).await
    }

    /// Request the next relocation task in the station queue
    ///
    /// GET /api/next_relocation
    pub async fn next_relocation(&self) -> Result<NextWorkResponse> {
        let builder = self.request(Method::GET, "/api/next_relocation")?;
        self.send_json(builder).await
    }

    /// Commit a pick confirmation
    ///
    /// POST /api/confirm_pick
    pub async fn confirm_pick(&self, req: ConfirmPickRequest) -> Result<ActionReceipt> {
        let builder = self.request(Method::POST, "/api/confirm_pick")?.json(&req);
        self.send_json(builder).await
    }

    /// Commit a relocation completion
    ///
    /// POST /api/complete_relocation
    pub async fn complete_relocation(
        &self,
        req: CompleteRelocationRequest,
    ) -> Result<ActionReceipt> {
        let builder = self
            .request(Method::POST, "/api/complete_relocation")?
            .json(&req);
        self.send_json(builder).await
    }

    /// Report a task status change. Fire-and-forget: callers log failures
    /// and never surface them to the operator.
    ///
    /// POST /api/update_task_status
    pub async fn update_task_status(&self, task_id: &str, status: WorkStatus) -> Result<()> {
        let req = UpdateStatusRequest {
            task_id: task_id.to_string(),
            status,
        };
        let builder = self
            .request(Method::POST, "/api/update_task_status")?
            .json(&req);
        self.send_unit(builder).await
    }
}
