use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use querypilot_agent::{Assistant, Settings};
use querypilot_core::Message;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "querypilot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let question: String = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if question.is_empty() {
        eprintln!("usage: querypilot <question about the database>");
        std::process::exit(2);
    }

    let settings = Settings::from_env()?;
    tracing::info!(provider = %settings.provider, model = %settings.model_name, "querypilot starting");

    let assistant = Assistant::from_settings(&settings).await?;

    let thread_id = uuid::Uuid::now_v7().to_string();
    let state = assistant
        .invoke(&thread_id, vec![Message::user(question)])
        .await?;

    match state.final_answer() {
        Some(answer) => println!("{}", answer.content),
        None => println!("The conversation ended without a final answer."),
    }

    Ok(())
}
