use anyhow::Context;
use booru_comments::configuration::get_config;
use booru_comments::startup::Application;
use booru_comments::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("booru-comments".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_config().context("Failed to read configuration")?;
    let application = Application::build(configuration).await?;
    tracing::info!(port = application.port(), "Comment service listening");

    application.run_until_stopped().await
}
