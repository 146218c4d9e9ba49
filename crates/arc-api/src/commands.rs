// Reserved (non-resource) server commands.

use serde_json::Value;

use crate::envelope::ServerResponse;
use crate::rpc::RpcClient;

/// Re-import the request-submission form responses into the sheet.
pub const REFRESH_REQUEST_SUBMISSIONS: &str = "refreshRequestSubmissionsWithForm";
/// Dump server-side state for inspection.
pub const DEBUG: &str = "debug";
/// Free-form named command (`["command", name]`).
pub const COMMAND: &str = "command";

impl RpcClient {
    pub async fn refresh_request_submissions_with_form(&self) -> ServerResponse {
        self.ask(vec![Value::from(REFRESH_REQUEST_SUBMISSIONS)]).await
    }

    pub async fn debug(&self) -> ServerResponse {
        self.ask(vec![Value::from(DEBUG)]).await
    }

    /// Run the free-form server command `name`.
    pub async fn command(&self, name: &str) -> ServerResponse {
        self.ask(vec![Value::from(COMMAND), Value::from(name)]).await
    }
}
