//! `wld-import`: loads tab-separated survey files into the dictionary store.
//!
//! Reads `wld.toml` (or the path given with `--config`), opens the SQLite
//! store and runs one import. `WLD_*` variables override the file.
//!
//! ```text
//! wld-import register-issue 2 0 5 "Mijnwerkerstaal" 1995 Goossens Assen
//! wld-import register-file 2 0 5 d2a5.tsv
//! wld-import run --part 2 --issue 5 --staged --serve
//! wld-import status --id 1
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use wld_core::{
  catalog::Catalog,
  key::IssueKey,
  model::{Issue, Pk},
  status::Method,
};
use wld_fixture::StagingStore;
use wld_import::{Controller, ImportConfig, RunOptions, Selection, api};
use wld_store_sqlite::SqliteStore;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Dialect dictionary importer")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "wld.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

/// Publication coordinates. All zero selects every registered file; a zero
/// section means the publication has none.
#[derive(clap::Args, Debug, Clone, Copy)]
struct Coordinates {
  #[arg(long, default_value_t = 0)]
  part:    u32,
  #[arg(long, default_value_t = 0)]
  section: u32,
  #[arg(long, default_value_t = 0)]
  issue:   u32,
}

impl Coordinates {
  fn key(self) -> IssueKey {
    IssueKey::new(self.part, (self.section != 0).then_some(self.section), self.issue)
  }
}

#[derive(Subcommand)]
enum Command {
  /// Import the selected files.
  Run {
    #[command(flatten)]
    at:     Coordinates,
    /// Read this file instead of the registered one.
    #[arg(long)]
    file:   Option<PathBuf>,
    /// Write fixture documents instead of updating the store.
    #[arg(long)]
    staged: bool,
    /// Reuse an existing identical entry instead of adding another.
    #[arg(long)]
    dedupe: bool,
    /// Serve the status endpoint while the run is in progress.
    #[arg(long)]
    serve:  bool,
  },
  /// Print one run status as JSON.
  Status {
    #[arg(long)]
    id: i64,
  },
  /// Serve the status endpoint until interrupted.
  Serve,
  /// Register a publication.
  RegisterIssue {
    part:    u32,
    section: u32,
    issue:   u32,
    title:   String,
    year:    i32,
    authors: String,
    place:   String,
  },
  /// Register the source file for a publication.
  RegisterFile {
    part:    u32,
    section: u32,
    issue:   u32,
    path:    PathBuf,
  },
  /// Mark files as not yet processed so the next run reads them again.
  Reset {
    #[command(flatten)]
    at: Coordinates,
  },
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let mut cfg = ImportConfig::load(&cli.config)
    .with_context(|| format!("failed to read config {}", cli.config.display()))?;
  cfg.store_path = expand_tilde(&cfg.store_path);
  cfg.input_dir = expand_tilde(&cfg.input_dir);
  cfg.output_dir = expand_tilde(&cfg.output_dir);

  if let Command::Run { staged, dedupe, .. } = &cli.command {
    if *staged {
      cfg.method = Method::Staged;
    }
    cfg.dedupe_entries |= *dedupe;
  }

  let store = SqliteStore::open(&cfg.store_path, cfg.resolver())
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;
  let catalog = Arc::new(store);

  match cli.command {
    Command::Run { at, file, serve, .. } => {
      if serve {
        let router = api::status_router(catalog.clone());
        let listener = bind(&cfg).await?;
        tokio::spawn(async move {
          if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "status server stopped");
          }
        });
      }
      run(&cfg, catalog, Selection::from_coordinates(at.part, at.section, at.issue, file))
        .await?;
    }
    Command::Status { id } => {
      let Some(status) = catalog.get_status(Pk(id)).await? else {
        bail!("no run with id {id}");
      };
      println!("{}", serde_json::to_string_pretty(&status)?);
    }
    Command::Serve => {
      let listener = bind(&cfg).await?;
      axum::serve(listener, api::status_router(catalog))
        .await
        .context("server error")?;
    }
    Command::RegisterIssue { part, section, issue, title, year, authors, place } => {
      let at = Coordinates { part, section, issue };
      let pk = catalog
        .register_issue(Issue {
          part,
          section: at.key().section,
          number: issue,
          title,
          year,
          authors,
          publication_place: place,
          visible: true,
        })
        .await?;
      println!("issue {} registered as {pk}", at.key());
    }
    Command::RegisterFile { part, section, issue, path } => {
      let key = Coordinates { part, section, issue }.key();
      let file = catalog.register_source_file(key, path).await?;
      println!("{key}: {}", file.path.display());
    }
    Command::Reset { at } => {
      let key = match Selection::from_coordinates(at.part, at.section, at.issue, None) {
        Selection::Everything => None,
        Selection::One { key, .. } => Some(key),
      };
      let n = catalog.clear_processed(key).await?;
      println!("{n} file(s) reset");
    }
  }

  Ok(())
}

/// Run one import with the configured method and print the summary.
async fn run(
  cfg: &ImportConfig,
  catalog: Arc<SqliteStore>,
  selection: Selection,
) -> anyhow::Result<()> {
  let options = RunOptions::from(cfg);
  let summary = match cfg.method {
    Method::Direct => {
      let store = (*catalog).clone();
      Controller::new(catalog, store, options).run(selection).await?
    }
    Method::Staged => {
      let snapshot = catalog.snapshot().await?;
      let store = StagingStore::new(snapshot, cfg.resolver(), &cfg.output_dir);
      Controller::new(catalog, store, options).run(selection).await?
    }
  };
  println!("{}", serde_json::to_string_pretty(&summary)?);
  Ok(())
}

async fn bind(cfg: &ImportConfig) -> anyhow::Result<TcpListener> {
  let Some(address) = &cfg.status_addr else {
    bail!("status_addr is not configured");
  };
  tracing::info!("Status endpoint on http://{address}");
  TcpListener::bind(address)
    .await
    .with_context(|| format!("failed to bind {address}"))
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
