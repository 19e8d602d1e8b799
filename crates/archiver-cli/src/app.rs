use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use chat_core::{Config, Conversation};
use chrono::Utc;
use conversation_extractor::{is_supported_page, ConversationExtractor};
use github_client::auth::{DeviceFlow, GitHubOAuthClient};
use github_client::{build_http_client, AccessToken, RepoPublisher};
use storage_manager::{ConversationStore, FileKeyValueStore, KeyValueStore, TokenStore};
use tokio_util::sync::CancellationToken;

use crate::presenter::TerminalPresenter;
use crate::status::{Report, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Markdown,
    Json,
}

impl OutputFormat {
    fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "md",
            OutputFormat::Json => "json",
        }
    }

    fn render(&self, conversation: &Conversation) -> anyhow::Result<String> {
        Ok(match self {
            OutputFormat::Markdown => conversation.render_markdown(),
            OutputFormat::Json => conversation.to_pretty_json()?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub id: String,
    pub repo: String,
    pub create: bool,
    pub description: Option<String>,
    pub path: Option<String>,
    pub message: Option<String>,
    pub format: OutputFormat,
}

/// Command handlers shared by every subcommand
pub struct App {
    config: Config,
    tokens: TokenStore,
    conversations: ConversationStore,
}

impl App {
    pub fn new(config: Config, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            config,
            tokens: TokenStore::new(store.clone()),
            conversations: ConversationStore::new(store),
        }
    }

    /// Opens the JSON file store under the configured data directory
    pub fn open(config: Config) -> anyhow::Result<Self> {
        let data_dir = chat_core::paths::ensure_dir(&config.data_dir())
            .with_context(|| format!("Failed to create {}", config.data_dir().display()))?;
        let store = FileKeyValueStore::new(chat_core::paths::storage_file_path(&data_dir));
        tracing::debug!("Using storage file {}", store.path().display());
        Ok(Self::new(config, Arc::new(store)))
    }

    pub fn check(&self, url: &str) -> anyhow::Result<Report> {
        if is_supported_page(url)? {
            Ok(Report::status(Status::success("Connected to ChatGPT")))
        } else {
            Ok(Report::status(Status::warning(
                "Please navigate to ChatGPT first",
            )))
        }
    }

    pub async fn extract(
        &self,
        html_file: &Path,
        url: Option<&str>,
        save: bool,
        json: bool,
    ) -> anyhow::Result<Report> {
        if let Some(url) = url {
            if !is_supported_page(url)? {
                bail!("Please navigate to ChatGPT first");
            }
        }

        let html = tokio::fs::read_to_string(html_file)
            .await
            .with_context(|| format!("Failed to read {}", html_file.display()))?;

        let now = Utc::now();
        let messages = ConversationExtractor::new()?.extract_at(&html, now);
        if messages.is_empty() {
            return Ok(Report::status(Status::warning("No conversation found")));
        }

        let count = messages.len();
        let conversation = if save {
            self.conversations.save(messages, now).await?
        } else {
            Conversation::new(Conversation::key_for(now), messages)
        };

        let body = if json {
            conversation.to_pretty_json()?
        } else {
            conversation.render_markdown()
        };

        let status = if save {
            Status::success(format!(
                "Saved {} messages as {}",
                count, conversation.id
            ))
        } else {
            Status::success(format!("Extracted {} messages", count))
        };

        Ok(Report::status(status).with_body(body))
    }

    pub async fn list(&self) -> anyhow::Result<Report> {
        let conversations = self.conversations.list().await?;
        if conversations.is_empty() {
            return Ok(Report::status(Status::info("No saved conversations")));
        }

        let lines: Vec<String> = conversations
            .iter()
            .map(|c| {
                let saved = c
                    .saved_at()
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_default();
                format!("{}  {}  {} messages", c.id, saved, c.len())
            })
            .collect();
        Ok(Report::body(lines.join("\n")))
    }

    pub async fn show(&self, id: &str, format: OutputFormat) -> anyhow::Result<Report> {
        let conversation = self.load_conversation(id).await?;
        Ok(Report::body(format.render(&conversation)?))
    }

    pub async fn status(&self) -> anyhow::Result<Report> {
        if self.tokens.token().await?.is_some() {
            return Ok(Report::status(Status::success("GitHub: Connected")));
        }

        match self.tokens.pending_verification().await? {
            Some(pending) if !pending.is_expired(Utc::now()) => {
                Ok(Report::status(Status::warning(format!(
                    "GitHub: Waiting for authorization\n   Code: {}\n   Visit: {}",
                    pending.user_code, pending.verification_uri
                ))))
            }
            _ => Ok(Report::status(Status::info("GitHub: Not connected"))),
        }
    }

    pub async fn login(&self, cancel: &CancellationToken) -> anyhow::Result<Report> {
        self.config.validate_for_auth()?;

        if let Some(pending) = self.tokens.pending_verification().await? {
            if !pending.is_expired(Utc::now()) {
                bail!(
                    "GitHub: Authorization already in progress. Enter code {} at {}",
                    pending.user_code,
                    pending.verification_uri
                );
            }
            tracing::info!("Discarding expired device code {}", pending.user_code);
            self.tokens.clear_pending_verification().await?;
        }

        let client = build_http_client(&self.config)?;
        let endpoint = GitHubOAuthClient::new(client, &self.config.github_login_base_url);
        let flow = DeviceFlow::new(
            Arc::new(endpoint),
            self.tokens.clone(),
            Arc::new(TerminalPresenter::new(self.config.open_browser)),
        )
        .with_max_attempts(self.config.max_poll_attempts);

        let scopes = self.config.scope_list().join(" ");
        flow.run_with_cancel(&self.config.client_id, &scopes, cancel)
            .await
            .map_err(|e| anyhow!("GitHub: {}", e))?;

        Ok(Report::status(Status::success("GitHub: Connected")))
    }

    pub async fn logout(&self) -> anyhow::Result<Report> {
        self.tokens.clear_token().await?;
        self.tokens.clear_pending_verification().await?;
        Ok(Report::status(Status::info("GitHub: Not connected")))
    }

    pub async fn publish(&self, request: PublishRequest) -> anyhow::Result<Report> {
        let conversation = self.load_conversation(&request.id).await?;
        let token = AccessToken::new(self.tokens.require_token().await?);

        let client = build_http_client(&self.config)?;
        let publisher = RepoPublisher::new(client, &self.config.github_api_base_url)
            .with_branch(&self.config.default_branch)
            .with_private_repos(self.config.private_repos);

        let user = publisher.get_authenticated_user(&token).await?;
        let owner = if request.create {
            let repo = publisher
                .create_repository(&token, &request.repo, request.description.as_deref())
                .await?;
            tracing::info!("Created repository {}", repo.name);
            repo.owner.map(|o| o.login).unwrap_or(user.login)
        } else {
            user.login
        };

        let path = request
            .path
            .clone()
            .unwrap_or_else(|| conversation.file_name(request.format.extension()));
        let content = request.format.render(&conversation)?;

        let commit = publisher
            .put_file(
                &token,
                &owner,
                &request.repo,
                &path,
                &content,
                request.message.as_deref(),
            )
            .await?;

        let location = commit
            .content
            .html_url
            .unwrap_or_else(|| format!("{}/{}/{}", owner, request.repo, commit.content.path));
        Ok(Report::status(Status::success(format!(
            "Published {} to {}",
            conversation.id, location
        ))))
    }

    async fn load_conversation(&self, id: &str) -> anyhow::Result<Conversation> {
        self.conversations
            .get(id)
            .await?
            .ok_or_else(|| anyhow!("Conversation {} not found", id))
    }
}
