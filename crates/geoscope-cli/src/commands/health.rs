use crate::client::ApiClient;
use crate::output::OutputWriter;
use anyhow::Result;

pub async fn execute(client: &ApiClient, output: &OutputWriter) -> Result<()> {
    let health = client.health().await?;

    if output.is_json() {
        return output.result(&health);
    }
    output.success(format!("{} is {} at {}", health.service, health.status, client.base_url()));
    output.kv("Storage", &health.storage);
    Ok(())
}
