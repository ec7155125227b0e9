//! `sdc`: command-line client for the SD Connect API.
//!
//! # Usage
//!
//! ```
//! sdc --url http://localhost:8787 profiles
//! sdc login --email admin@sdconnect.example --password 12345
//! sdc send --from 4 --conversation 2 "Are you free on Friday?"
//! sdc credits add --user 4 25
//! sdc vote --voter 5 --target 3 met
//! ```

mod client;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use client::ApiClient;
use sdc_core::{
  conversation::ConversationId,
  gate::{ChatView, MessagingGate, SendOutcome},
  profile::ProfileId,
  vote::VoteChoice,
};
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const DEFAULT_URL: &str = "http://localhost:8787";
const DEFAULT_LOW_CREDIT_REPLY: &str =
  "I'd love to keep talking, but it looks like you're out of credits. Top up and message me again!";

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "sdc", about = "Command-line client for SD Connect")]
struct Args {
  /// Path to a TOML config file (url, low_credit_reply).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the server (default: http://localhost:8787).
  #[arg(long, env = "SDC_URL")]
  url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Check credentials and print the matching profile.
  Login {
    #[arg(long)]
    email:    String,
    #[arg(long, env = "SDC_PASSWORD")]
    password: String,
  },
  /// List profiles, or show one with `--id`.
  Profiles {
    #[arg(long)]
    id: Option<ProfileId>,
  },
  /// List conversations with their participant.
  Conversations,
  /// Send a message through the credit gate.
  Send {
    /// Id of the sending profile.
    #[arg(long)]
    from:         ProfileId,
    #[arg(long)]
    conversation: ConversationId,
    text:         String,
  },
  /// Show or top up a credit balance.
  Credits {
    #[command(subcommand)]
    action: CreditsCommand,
  },
  /// Record whether `voter` has met `target` (`met` or `notMet`).
  Vote {
    #[arg(long)]
    voter:  ProfileId,
    #[arg(long)]
    target: ProfileId,
    choice: VoteChoice,
  },
}

#[derive(Subcommand, Debug)]
enum CreditsCommand {
  Show {
    #[arg(long)]
    user: ProfileId,
  },
  Add {
    #[arg(long)]
    user:   ProfileId,
    amount: u64,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(default)]
  url:              String,
  #[serde(default)]
  low_credit_reply: String,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  // CLI flags override config file, which overrides defaults.
  let base_url = args
    .url
    .or_else(|| (!file_cfg.url.is_empty()).then(|| file_cfg.url.clone()))
    .unwrap_or_else(|| DEFAULT_URL.to_string());
  let low_credit_reply = if file_cfg.low_credit_reply.is_empty() {
    DEFAULT_LOW_CREDIT_REPLY.to_string()
  } else {
    file_cfg.low_credit_reply
  };

  let client = ApiClient::new(base_url).context("failed to build HTTP client")?;

  match args.command {
    Command::Login { email, password } => {
      let user = client.login(&email, &password).await?;
      print_json(&user)
    }
    Command::Profiles { id: Some(id) } => print_json(&client.get_profile(id).await?),
    Command::Profiles { id: None } => print_json(&client.list_profiles().await?),
    Command::Conversations => print_json(&client.list_conversations().await?),
    Command::Send {
      from,
      conversation,
      text,
    } => send(client, from, conversation, text, low_credit_reply).await,
    Command::Credits {
      action: CreditsCommand::Show { user },
    } => {
      println!("{}", client.credits(user).await?);
      Ok(())
    }
    Command::Credits {
      action: CreditsCommand::Add { user, amount },
    } => {
      println!("{}", client.update_credits(user, "add", amount).await?);
      Ok(())
    }
    Command::Vote {
      voter,
      target,
      choice,
    } => print_json(&client.vote(voter, target, choice).await?),
  }
}

// ─── Commands ─────────────────────────────────────────────────────────────────

async fn send(
  client: ApiClient,
  from: ProfileId,
  conversation_id: ConversationId,
  text: String,
  low_credit_reply: String,
) -> Result<()> {
  let sender = client
    .get_profile(from)
    .await
    .with_context(|| format!("loading profile {from}"))?;
  let joined = client
    .list_conversations()
    .await
    .context("loading conversations")?
    .into_iter()
    .find(|c| c.id == conversation_id)
    .ok_or_else(|| anyhow!("conversation {conversation_id} not found"))?;

  let mut chat = ChatView::new(joined.into());
  chat.draft = text;

  let gate = MessagingGate::new(client).with_low_credit_reply(low_credit_reply);
  match gate.submit(&sender, &mut chat).await {
    SendOutcome::Ignored => println!("nothing to send"),
    SendOutcome::Blocked { auto_reply } => {
      println!("out of credits; message not sent");
      if let Some(reply) = auto_reply {
        println!("reply from {}: {}", reply.sender_id, reply.text);
      }
    }
    SendOutcome::Sent {
      message,
      remaining_credits,
    } => {
      println!("sent {}", message.id);
      if let Some(credits) = remaining_credits {
        println!("credits remaining: {credits}");
      }
    }
    SendOutcome::Failed { error } => return Err(error).context("sending message"),
  }
  Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  println!("{}", serde_json::to_string_pretty(value)?);
  Ok(())
}
