//! Chat command handler.
//!
//! A line-oriented terminal front end for a running assistant service.

use clap::Args;
use civic_core::{config::AppConfig, AppResult};
use civic_server::{AssistantClient, ChatReply};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const GREETING: &str = "Hi! Ask me anything about city services. Type 'exit' to leave.";

/// Chat with a running assistant service
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Base URL of the assistant service
    #[arg(long)]
    pub backend_url: Option<String>,
}

impl ChatCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let client = AssistantClient::new(&config.server.backend_url);
        tracing::debug!("Chatting with {}", config.server.backend_url);

        let mut stdout = tokio::io::stdout();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        println!("{}", GREETING);

        loop {
            stdout.write_all(b"\nYou: ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if matches!(question, "exit" | "quit") {
                break;
            }

            let reply = client.ask(question).await;
            println!("\nAssistant: {}", render(&reply));
        }

        Ok(())
    }
}

/// Reply text followed by a bullet list of sources, if any.
fn render(reply: &ChatReply) -> String {
    let mut text = reply.message().to_string();

    let sources = reply.sources();
    if !sources.is_empty() {
        text.push_str("\n\nSources:");
        for source in sources {
            text.push_str(&format!("\n- {} ({})", source.title, source.category));
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_knowledge::Source;
    use civic_server::client::UNREACHABLE_MESSAGE;

    #[test]
    fn test_render_answer_with_sources() {
        let reply = ChatReply::Answer {
            answer: "Apply online.".to_string(),
            sources: vec![Source {
                title: "Building Permit".to_string(),
                category: "permits".to_string(),
            }],
        };

        assert_eq!(
            render(&reply),
            "Apply online.\n\nSources:\n- Building Permit (permits)"
        );
    }

    #[test]
    fn test_render_failure_has_no_sources() {
        let reply = ChatReply::Unreachable("connection refused".to_string());
        assert_eq!(render(&reply), UNREACHABLE_MESSAGE);
    }
}
