use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use fenestra_ai::HttpAssistantClient;
use fenestra_console::{Command, TerminalPresenter, option_at, parse_command};
use fenestra_infra::{AppConfig, Collaborators, ConfiguratorSession, load_catalog};
use fenestra_state::InMemorySessionRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fenestra_observability::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let assistant = HttpAssistantClient::new(config.ai_endpoint.clone(), config.ai_timeout)
        .context("failed to build assistant client")?;
    let catalog = load_catalog(&config);

    let session = ConfiguratorSession::start(
        &config,
        catalog,
        Collaborators {
            repository: Arc::new(InMemorySessionRepository::new()),
            assistant: Arc::new(assistant),
            presenter: Arc::new(TerminalPresenter::stdout()),
        },
    )
    .await;

    println!("(número = escolher opção, /reiniciar, /especialista, /sair; outro texto vai para o chat)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match parse_command(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::Restart => session.restart().await,
            Command::Specialist => session.request_specialist().await,
            Command::Pick(n) => match option_at(&session.view(), n) {
                Some((facet, code)) => {
                    if let Err(err) = session.click(facet, &code).await {
                        tracing::warn!(error = %err, "option rejected");
                    }
                }
                None => println!("Opção {n} não está disponível."),
            },
            Command::Chat(text) => {
                session.chat(&text).await;
            }
        }
        session.sync_transcript();
    }

    tracing::info!(session_id = ?session.session_id(), "session closed");
    Ok(())
}
