//! ldhead CLI entry point

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use ldhead::{
    admin::{parse_flag, BulkApplyInput, SchemaInput, SchemaService},
    api::{self, AJAX_NONCE_ACTION},
    commands::{
        cmd_add, cmd_bulk_apply, cmd_candidates, cmd_content_field, cmd_content_meta,
        cmd_content_upsert, cmd_edit, cmd_init, cmd_list, cmd_nonce, cmd_remove, cmd_render,
        cmd_show, cmd_status, cmd_toggle, print_bulk_outcome, print_candidates,
        print_content_item, print_field_saved, print_init, print_item_meta_saved, print_page, print_record, print_render, print_saved, print_status,
        read_schema_data, read_url_file, record_line, InitOptions, ListOptions,
    },
    config::Config,
    error::{Error, Result},
    meta::{MetaDb, NewContentItem},
    progress::LogWriterFactory,
    render::HeadRenderer,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "ldhead")]
#[command(
    version,
    about = "Per-URL JSON-LD schemas and meta tag overrides for a site's <head>",
    long_about = None
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Schema fields shared by `add`, `edit` and `bulk-apply`
#[derive(Args, Debug, Clone, Default)]
struct SchemaFields {
    /// Display name
    #[arg(short, long)]
    name: Option<String>,

    /// Schema type (WebPage, Article, Product, FAQ, ...)
    #[arg(short = 't', long = "type")]
    schema_type: Option<String>,

    /// JSON-LD body, or @path to read it from a file
    #[arg(short, long)]
    data: Option<String>,

    /// Meta title override
    #[arg(long)]
    meta_title: Option<String>,

    /// Meta description override
    #[arg(long)]
    meta_description: Option<String>,

    /// Active flag (1/0, true/false)
    #[arg(long)]
    active: Option<String>,
}

impl SchemaFields {
    fn into_input(self, url: Option<String>) -> Result<SchemaInput> {
        let schema_data = self.data.as_deref().map(read_schema_data).transpose()?;
        let is_active = match self.active.as_deref() {
            None => None,
            Some(v) => Some(
                parse_flag(v).ok_or_else(|| Error::Config(format!("Invalid --active value: {}", v)))?,
            ),
        };

        Ok(SchemaInput {
            url,
            schema_name: self.name,
            schema_type: self.schema_type,
            schema_data,
            meta_title: self.meta_title,
            meta_description: self.meta_description,
            is_active,
        })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize ldhead configuration and database
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,

        /// Site base URL (e.g. https://example.com)
        #[arg(long)]
        site: Option<String>,
    },

    /// Attach a new schema to a URL
    Add {
        /// Page URL on the configured site
        url: String,

        #[command(flatten)]
        fields: SchemaFields,
    },

    /// Replace the fields of an existing schema
    Edit {
        id: i64,

        /// Page URL on the configured site
        #[arg(long)]
        url: String,

        #[command(flatten)]
        fields: SchemaFields,
    },

    /// Flip a schema's active flag, or set it with --active
    Toggle {
        id: i64,

        #[arg(long)]
        active: Option<String>,
    },

    /// Delete a schema
    Remove { id: i64 },

    /// Show one schema
    Show { id: i64 },

    /// List schemas, most recently updated first
    List {
        /// Exact URL
        #[arg(long)]
        url: Option<String>,

        /// Schema type
        #[arg(short = 't', long = "type")]
        schema_type: Option<String>,

        /// Substring of URL, name or body
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long)]
        page: Option<i64>,

        #[arg(long)]
        per_page: Option<i64>,
    },

    /// Attach one schema body to many URLs
    BulkApply {
        /// Target URLs
        urls: Vec<String>,

        /// Read more URLs from a file, one per line
        #[arg(short, long)]
        file: Option<PathBuf>,

        #[command(flatten)]
        fields: SchemaFields,
    },

    /// Print the head fragment for a URL
    Render {
        url: String,

        /// Content item being viewed, for singular pages
        #[arg(long)]
        item: Option<i64>,
    },

    /// Show system status
    Status,

    /// Start the admin HTTP server
    Serve {
        /// Override api.bind
        #[arg(long)]
        bind: Option<String>,
    },

    /// Manage the site's content items
    Content {
        #[command(subcommand)]
        action: ContentAction,
    },

    /// Mint a form-channel nonce
    Nonce {
        /// Admin user name
        #[arg(long, default_value = "admin")]
        user: String,

        /// Nonce action
        #[arg(default_value = AJAX_NONCE_ACTION)]
        action: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ContentAction {
    /// Register a page, post or product (replaces one with the same URL)
    Upsert {
        url: String,

        #[arg(short, long)]
        title: String,

        /// page, post, product, ...
        #[arg(short, long, default_value = "page")]
        kind: String,

        #[arg(long)]
        excerpt: Option<String>,

        /// HTML body, or @path to read it from a file
        #[arg(long)]
        body: Option<String>,
    },

    /// Set an item's meta overrides and sync them onto its schemas
    Meta {
        id: i64,

        #[arg(long, default_value = "")]
        title: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Set or remove a raw field on an item (e.g. _yoast_wpseo_title, rank_math_description)
    Field {
        id: i64,

        key: String,

        /// Value to store; omit together with --delete to remove the field
        #[arg(required_unless_present = "delete")]
        value: Option<String>,

        #[arg(long, conflicts_with = "value")]
        delete: bool,
    },

    /// List items offered for bulk apply
    Candidates {
        /// all-pages, all-posts, all-products, or a kind
        #[arg(default_value = "all-pages")]
        selector: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory::default()))
        .with(filter)
        .init();

    if let Commands::Init { force, site } = cli.command {
        let base_dir = cli.config.map(|path| {
            if path.extension().is_some_and(|e| e == "toml") {
                path.parent().map(PathBuf::from).unwrap_or_else(Config::default_base_dir)
            } else {
                path
            }
        });
        let report = cmd_init(InitOptions {
            base_dir,
            site_url: site,
            force,
        })
        .await?;
        return if cli.json {
            print_json(&report)
        } else {
            print_init(&report);
            Ok(())
        };
    }

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "ldhead", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;

    if let Commands::Nonce { user, action } = &cli.command {
        let nonce = cmd_nonce(&config, user, action)?;
        if cli.json {
            print_json(&serde_json::json!({ "nonce": nonce }))?;
        } else {
            println!("{}", nonce);
        }
        return Ok(());
    }

    let db = MetaDb::new(&config.paths.db_file).await?;
    let service = SchemaService::new(db.clone(), &config);

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } | Commands::Nonce { .. } => {
            unreachable!()
        }

        Commands::Add { url, fields } => {
            let saved = cmd_add(&service, &fields.into_input(Some(url))?).await?;
            if cli.json {
                print_json(&saved)?;
            } else {
                print_saved(&saved, "saved");
            }
        }

        Commands::Edit { id, url, fields } => {
            let saved = cmd_edit(&service, id, &fields.into_input(Some(url))?).await?;
            if cli.json {
                print_json(&saved)?;
            } else {
                print_saved(&saved, "updated");
            }
        }

        Commands::Toggle { id, active } => {
            let active = match active.as_deref() {
                None => None,
                Some(v) => Some(
                    parse_flag(v)
                        .ok_or_else(|| Error::Config(format!("Invalid --active value: {}", v)))?,
                ),
            };
            let is_active = cmd_toggle(&service, id, active).await?;
            if cli.json {
                print_json(&serde_json::json!({ "id": id, "is_active": u8::from(is_active) }))?;
            } else {
                let state = if is_active { "active" } else { "inactive" };
                println!("✓ Schema {} is now {}", id, state);
            }
        }

        Commands::Remove { id } => {
            cmd_remove(&service, id).await?;
            if cli.json {
                print_json(&serde_json::json!({ "success": true }))?;
            } else {
                println!("✓ Schema {} deleted", id);
            }
        }

        Commands::Show { id } => {
            let record = cmd_show(&service, id).await?;
            if cli.json {
                print_json(&record)?;
            } else {
                print_record(&record);
            }
        }

        Commands::List {
            url,
            schema_type,
            search,
            page,
            per_page,
        } => {
            let options = ListOptions {
                url,
                schema_type,
                search,
                page,
                per_page,
            };
            let page = cmd_list(
                &service,
                options,
                config.api.default_per_page,
                config.api.max_per_page,
            )
            .await?;
            if cli.json {
                print_json(&page)?;
            } else {
                print_page(&page, record_line);
            }
        }

        Commands::BulkApply { mut urls, file, fields } => {
            if let Some(path) = file {
                urls.extend(read_url_file(&path)?);
            }
            let input = BulkApplyInput {
                urls,
                schema: fields.into_input(None)?,
            };
            let outcome = cmd_bulk_apply(&service, &input, cli.json).await?;
            if cli.json {
                print_json(&outcome)?;
            } else {
                print_bulk_outcome(&outcome);
            }
        }

        Commands::Render { url, item } => {
            let renderer = HeadRenderer::new(&config);
            let report = cmd_render(&renderer, &db, &url, item).await?;
            if cli.json {
                print_json(&report)?;
            } else {
                print_render(&report);
            }
        }

        Commands::Status => {
            let status = cmd_status(&config, &db).await?;
            if cli.json {
                print_json(&status)?;
            } else {
                print_status(&status);
            }
        }

        Commands::Serve { bind } => {
            let mut config = config;
            if let Some(bind) = bind {
                config.api.bind = bind;
            }
            api::serve(&config, db).await?;
        }

        Commands::Content { action } => {
            handle_content(&config, &db, &service, action, cli.json).await?;
        }
    }

    Ok(())
}

async fn handle_content(
    config: &Config,
    db: &MetaDb,
    service: &SchemaService,
    action: ContentAction,
    json: bool,
) -> Result<()> {
    match action {
        ContentAction::Upsert {
            url,
            title,
            kind,
            excerpt,
            body,
        } => {
            let body = body.as_deref().map(read_schema_data).transpose()?;
            let item = NewContentItem {
                url,
                kind,
                title,
                excerpt,
                body: body.unwrap_or_default(),
            };
            let item = cmd_content_upsert(db, &config.site.base_url, item).await?;
            if json {
                print_json(&item)?;
            } else {
                print_content_item(&item);
            }
        }

        ContentAction::Meta {
            id,
            title,
            description,
        } => {
            let saved = cmd_content_meta(service, id, &title, &description).await?;
            if json {
                print_json(&saved)?;
            } else {
                print_item_meta_saved(&saved);
            }
        }

        ContentAction::Field {
            id,
            key,
            value,
            delete: _,
        } => {
            let saved = cmd_content_field(db, id, &key, value.as_deref()).await?;
            if json {
                print_json(&saved)?;
            } else {
                print_field_saved(&saved);
            }
        }

        ContentAction::Candidates { selector } => {
            let candidates = cmd_candidates(service, &selector).await?;
            if json {
                print_json(&candidates)?;
            } else {
                print_candidates(&candidates);
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_config_path);

    if !config_path.exists() {
        eprintln!(
            "Config file not found: {}\nRun 'ldhead init' first.",
            config_path.display()
        );
        std::process::exit(1);
    }

    Config::load(&config_path)
}
