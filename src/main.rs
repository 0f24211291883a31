mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use convoke_core::InviteRequest;
use convoke_core::html::render_invite_html;
use convoke_core::ics::generate_invite;
use convoke_core::mime::build_envelope;
use convoke_core::protocol::OutboundMessage;
use convoke_core::send::{SenderIdentity, invite_subject, send_invites};
use convoke_core::transport::Mailer;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "convoke")]
#[command(about = "Generate and send calendar invites for convoke scheduling polls")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalized invite document for a request
    Preview {
        /// Path to a JSON invite request file
        input: PathBuf,

        /// Print the full MIME envelope for the first attendee instead
        #[arg(long)]
        mime: bool,
    },
    /// Send the invite to every attendee via the configured mailer
    Send {
        /// Path to a JSON invite request file
        input: PathBuf,

        /// Mailer to use (overrides the config file)
        #[arg(long)]
        mailer: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Preview { input, mime } => cmd_preview(&input, mime),
        Commands::Send { input, mailer } => cmd_send(&input, mailer).await,
    }
}

fn read_request(path: &Path) -> Result<InviteRequest> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read invite request at {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse invite request at {}", path.display()))
}

fn cmd_preview(input: &Path, as_mime: bool) -> Result<()> {
    let request = read_request(input)?;
    let invite = generate_invite(&request)?;

    if as_mime {
        let cfg = config::load_config()?;
        // generate_invite guarantees a non-empty attendee list
        let first = invite.attendees.first().context("no attendees")?;
        let message = OutboundMessage {
            from: cfg.sender.from.clone(),
            to: first.email.clone(),
            reply_to: Some(
                cfg.sender
                    .reply_to
                    .clone()
                    .unwrap_or_else(|| request.creator_email.trim().to_string()),
            ),
            subject: invite_subject(&request.title, request.start.date),
            html_body: render_invite_html(&request),
            ics_text: invite.ics.clone(),
        };
        print!("{}", build_envelope(&message)?);
    } else {
        print!("{}", invite.ics);
    }

    Ok(())
}

async fn cmd_send(input: &Path, mailer_override: Option<String>) -> Result<()> {
    let request = read_request(input)?;
    let cfg = config::load_config()?;

    let mailer_name = mailer_override.unwrap_or_else(|| cfg.mailer.clone());
    let mailer = Mailer::from_name(&mailer_name);
    let sender = SenderIdentity {
        from: cfg.sender.from.clone(),
        reply_to: cfg.sender.reply_to.clone(),
    };

    println!("📨 Sending: {}", request.title);

    let report = send_invites(&mailer, &sender, &request).await?;

    for failure in &report.failures {
        println!("  ✗ {}: {}", failure.email, failure.error);
    }
    println!(
        "\nSent {} of {} invites ({} failed)",
        report.sent, report.total, report.failed
    );

    if report.sent == 0 && report.failed > 0 {
        anyhow::bail!(
            "all {} sends failed via mailer '{}'",
            report.failed,
            mailer_name
        );
    }

    Ok(())
}
