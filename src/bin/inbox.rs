use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use futures::future::try_join_all;
use notifications_app::model::{
    ListOptions, MarkAllReadRequest, MarkReadRequest, RepoSpec, ThreadKey,
};
use notifications_app::projection::RepoGroupView;
use notifications_app::read_state::{ReadStateController, Transition};
use notifications_app::store::{NotificationStore, RemoteStore};
use reqwest::Url;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(about = "Read and triage notifications served by a notifications-app instance.")]
struct Args {
    /// Base URL of the server, e.g. http://127.0.0.1:8080/
    #[arg(long, default_value = "http://127.0.0.1:8080/")]
    url: String,

    /// Access token sent as a bearer token
    #[arg(long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print notifications grouped by repository, most recent first
    List {
        /// Include notifications that are already read
        #[arg(long)]
        all: bool,
    },
    /// Print the number of unread notifications
    Count,
    /// Mark one or more threads of a repository as read
    MarkRead {
        /// Kind of thread, e.g. Issue or PullRequest
        #[arg(long)]
        app: String,
        repo: String,
        #[arg(required = true)]
        thread_ids: Vec<u64>,
    },
    /// Mark every notification of a repository as read
    MarkAllRead { repo: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let url = Url::parse(&args.url).with_context(|| format!("invalid --url {}", args.url))?;
    let store = Arc::new(RemoteStore::new(url, args.token.clone())?);
    run(store, args.command).await
}

async fn run(store: Arc<RemoteStore>, command: Command) -> Result<()> {
    match command {
        Command::Count => {
            println!("{}", store.count().await?);
        }
        Command::List { all } => {
            let controller = ReadStateController::new(store, Vec::new());
            controller.refresh(&ListOptions { repo: None, all }).await?;
            print!("{}", format_groups(&controller.render(Utc::now()).await));
        }
        Command::MarkRead { app, repo, thread_ids } => {
            let repo = RepoSpec::new(repo);
            let controller = ReadStateController::new(store, Vec::new());
            controller
                .refresh(&ListOptions {
                    repo: Some(repo.clone()),
                    all: false,
                })
                .await?;

            let keys: Vec<ThreadKey> = thread_ids
                .into_iter()
                .map(|id| ThreadKey::new(app.clone(), repo.clone(), id))
                .collect();
            let reqs: Vec<MarkReadRequest> = keys.iter().map(MarkReadRequest::for_thread).collect();
            let transitions = try_join_all(
                keys.iter()
                    .zip(reqs.iter())
                    .map(|(key, req)| controller.mark_read(key, req)),
            )
            .await?;

            for (key, t) in keys.iter().zip(transitions) {
                println!("{}: {}", key, describe(t));
            }
        }
        Command::MarkAllRead { repo } => {
            let controller = ReadStateController::new(store, Vec::new());
            controller.refresh(&ListOptions::default()).await?;
            let t = controller
                .mark_all_read(&MarkAllReadRequest { repo_uri: repo.clone() })
                .await?;
            println!("{}: {}", repo, describe(t));
        }
    }
    Ok(())
}

fn describe(t: Transition) -> &'static str {
    match t {
        Transition::SoftRead => "hidden locally",
        Transition::Read { group_all_read: true } => "read (repository is now all read)",
        Transition::Read { group_all_read: false } => "read",
        Transition::AllRead => "all read",
        Transition::AlreadyRead => "already read",
        Transition::Discarded => "marked read (not in the current inbox)",
    }
}

fn format_groups(groups: &[RepoGroupView]) -> String {
    if groups.is_empty() {
        return format!("{}\n", notifications_app::render::EMPTY_STATE);
    }
    let mut out = String::new();
    for g in groups {
        let marker = if g.any_unread { "" } else { " (read)" };
        out.push_str(&format!("{}{}\n", g.repo.uri, marker));
        for n in &g.notifications {
            out.push_str(&format!(
                "  {} {:<12} #{:<6} {}  ({}, @{})\n",
                if n.read { " " } else { "*" },
                n.key.app_id,
                n.key.thread_id,
                n.title,
                n.time.relative,
                n.actor_login
            ));
        }
    }
    out
}
