//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use refinery_pages::{
    Conditions, FinderOptions, LocaleProvider, Locales, PageFinder, PageQuery, slug_for,
};
use refinery_shared::{
    AppConfig, ConditionValue, NewPage, Page, PageId, PageTranslation, init_config, load_config,
    load_config_from,
};
use refinery_storage::Storage;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Refinery — resolve and manage pages in a localized content tree.
#[derive(Parser)]
#[command(
    name = "refinery",
    version,
    about = "Resolve URL paths to pages and manage the page tree.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.refinery/refinery.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding `[storage] database_path`.
    #[arg(long, env = "REFINERY_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Active locale, overriding `[i18n] current_locale`.
    #[arg(long, global = true)]
    pub locale: Option<String>,

    /// Print pages as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Resolve a URL path (or an id) to a page.
    Resolve {
        /// Slash-delimited path, e.g. `about/team`.
        path: Option<String>,

        /// Page id, used when the path is blank.
        #[arg(long)]
        id: Option<PageId>,
    },

    /// Find a page by title in the active locale.
    Title {
        title: String,
    },

    /// Find a page by slug in any frontend locale.
    Slug {
        slug: String,

        /// Only root pages.
        #[arg(long, conflicts_with = "parent")]
        root: bool,

        /// Only children of this page.
        #[arg(long)]
        parent: Option<PageId>,

        /// Skip draft pages.
        #[arg(long)]
        live: bool,
    },

    /// Page management.
    Page {
        #[command(subcommand)]
        action: PageAction,
    },

    /// Print the page tree with each page's path.
    Tree,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Page subcommands.
#[derive(Subcommand)]
pub(crate) enum PageAction {
    /// Create a page with a translation in the active locale.
    Add {
        /// Parent page id (omit for a root page).
        #[arg(long)]
        parent: Option<PageId>,

        /// Sibling position (defaults to last).
        #[arg(long)]
        position: Option<i64>,

        /// Create as draft.
        #[arg(long)]
        draft: bool,

        /// Redirect target for menu-link pages.
        #[arg(long)]
        link_url: Option<String>,

        #[command(flatten)]
        translation: TranslationArgs,
    },

    /// Add or replace a page's translation in the active locale.
    Translate {
        id: PageId,

        #[command(flatten)]
        translation: TranslationArgs,
    },
}

/// Translatable fields shared by `page add` and `page translate`.
#[derive(Args)]
pub(crate) struct TranslationArgs {
    #[arg(long)]
    title: String,

    /// Menu title (defaults to the title).
    #[arg(long)]
    menu_title: Option<String>,

    /// Slug override; otherwise derived from the title.
    #[arg(long)]
    custom_slug: Option<String>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init {
        /// Replace an existing config file.
        #[arg(long)]
        force: bool,
    },
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "refinery=info",
        1 => "refinery=debug",
        _ => "refinery=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime context
// ---------------------------------------------------------------------------

/// Config merged with CLI overrides.
struct Context {
    config: AppConfig,
    locales: Locales,
    database: PathBuf,
    json: bool,
}

impl Context {
    fn load(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => load_config_from(path)?,
            None => load_config()?,
        };

        let mut locales = Locales::from(&config.i18n);
        if let Some(locale) = &cli.locale {
            locales = locales.with_current(locale.clone());
        }

        let database = match &cli.db {
            Some(path) => path.clone(),
            None => config.database_path()?,
        };

        Ok(Self {
            config,
            locales,
            database,
            json: cli.json,
        })
    }

    fn options(&self) -> FinderOptions {
        FinderOptions::from(&self.config)
    }

    async fn open_readonly(&self) -> Result<Storage> {
        Ok(Storage::open_readonly(&self.database).await?)
    }

    async fn open(&self) -> Result<Storage> {
        Ok(Storage::open(&self.database).await?)
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init { force } => cmd_config_init(*force).await,
            ConfigAction::Show => cmd_config_show(&cli).await,
        };
    }

    let ctx = Context::load(&cli)?;
    match cli.command {
        Command::Resolve { path, id } => {
            cmd_lookup(&ctx, PageQuery::ByPathOrId { path, id }).await
        }
        Command::Title { title } => cmd_lookup(&ctx, PageQuery::ByTitle { title }).await,
        Command::Slug {
            slug,
            root,
            parent,
            live,
        } => {
            let mut conditions = Conditions::new();
            if root {
                conditions.insert("parent_id", ConditionValue::Null);
            }
            if let Some(parent) = parent {
                conditions.insert("parent_id", parent.0);
            }
            if live {
                conditions.insert("draft", false);
            }
            cmd_lookup(&ctx, PageQuery::BySlug { slug, conditions }).await
        }
        Command::Page { action } => match action {
            PageAction::Add {
                parent,
                position,
                draft,
                link_url,
                translation,
            } => {
                let page = NewPage {
                    parent_id: parent,
                    position,
                    draft,
                    link_url,
                };
                cmd_page_add(&ctx, &page, &translation).await
            }
            PageAction::Translate { id, translation } => {
                cmd_page_translate(&ctx, id, &translation).await
            }
        },
        Command::Tree => cmd_tree(&ctx).await,
        Command::Config { .. } => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_lookup(ctx: &Context, query: PageQuery) -> Result<()> {
    let storage = ctx.open_readonly().await?;
    let finder = PageFinder::new(&storage, &ctx.locales, ctx.options());

    info!(?query, locale = ctx.locales.current_locale(), "looking up page");
    let described = format!("{query:?}");
    let Some(page) = finder.resolve(query).await? else {
        return Err(eyre!("no page matches {described}"));
    };

    let locale = page
        .translation
        .as_ref()
        .map(|t| t.locale.clone())
        .unwrap_or_else(|| ctx.locales.current_locale().to_string());
    let path = storage.nested_path(page.id, &locale).await?;
    print_page(ctx, &page, path.as_deref())
}

async fn cmd_page_add(ctx: &Context, page: &NewPage, args: &TranslationArgs) -> Result<()> {
    let translation = build_translation(ctx, args)?;
    let storage = ctx.open().await?;

    let id = storage.create_page_with_translation(page, &translation).await?;

    let path = storage.nested_path(id, &translation.locale).await?;
    println!(
        "Created page {id} at /{}",
        path.unwrap_or_else(|| translation.slug.clone())
    );
    Ok(())
}

async fn cmd_page_translate(ctx: &Context, id: PageId, args: &TranslationArgs) -> Result<()> {
    let translation = build_translation(ctx, args)?;
    let storage = ctx.open().await?;

    storage.upsert_translation(id, &translation).await?;
    println!(
        "Translated page {id} into '{}' as '{}'",
        translation.locale, translation.slug
    );
    Ok(())
}

fn build_translation(ctx: &Context, args: &TranslationArgs) -> Result<PageTranslation> {
    let slug = slug_for(&args.title, args.custom_slug.as_deref())
        .ok_or_else(|| eyre!("cannot derive a slug from title '{}'", args.title))?;

    Ok(PageTranslation {
        locale: ctx.locales.current_locale().to_string(),
        title: args.title.clone(),
        menu_title: args.menu_title.clone(),
        custom_slug: args.custom_slug.clone(),
        slug,
    })
}

async fn cmd_tree(ctx: &Context) -> Result<()> {
    let storage = ctx.open_readonly().await?;
    let locale = ctx.locales.current_locale();

    // (page, depth, path of its parent); `None` once an ancestor is untranslated
    let mut stack: Vec<(Page, usize, Option<String>)> = storage
        .roots(locale)
        .await?
        .into_iter()
        .rev()
        .map(|page| (page, 0, Some(String::new())))
        .collect();

    if stack.is_empty() {
        println!("(no pages)");
        return Ok(());
    }

    while let Some((page, depth, parent_path)) = stack.pop() {
        let path = match (parent_path, page.slug()) {
            (Some(parent), Some(slug)) if parent.is_empty() => Some(slug.to_string()),
            (Some(parent), Some(slug)) => Some(format!("{parent}/{slug}")),
            _ => None,
        };

        let indent = "  ".repeat(depth);
        let title = page.title().unwrap_or("(untranslated)");
        let draft = if page.draft { " [draft]" } else { "" };
        match &path {
            Some(path) => println!("{indent}{:>4}  {title}  /{path}{draft}", page.id),
            None => println!("{indent}{:>4}  {title}{draft}", page.id),
        }

        let children = storage.children(page.id, locale).await?;
        for child in children.into_iter().rev() {
            stack.push((child, depth + 1, path.clone()));
        }
    }
    Ok(())
}

fn print_page(ctx: &Context, page: &Page, path: Option<&str>) -> Result<()> {
    if ctx.json {
        let mut value = serde_json::to_value(page)?;
        if let (Some(path), Some(object)) = (path, value.as_object_mut()) {
            object.insert("path".into(), serde_json::Value::String(format!("/{path}")));
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!();
    println!("  ID:       {}", page.id);
    if let Some(t) = &page.translation {
        println!("  Title:    {}", t.title);
        println!("  Slug:     {}", t.slug);
        println!("  Locale:   {}", t.locale);
    }
    if let Some(path) = path {
        println!("  Path:     /{path}");
    }
    match page.parent_id {
        Some(parent) => println!("  Parent:   {parent}"),
        None => println!("  Parent:   (root)"),
    }
    println!("  Draft:    {}", page.draft);
    if let Some(url) = &page.link_url {
        println!("  Link URL: {url}");
    }
    println!();
    Ok(())
}

async fn cmd_config_init(force: bool) -> Result<()> {
    let path = init_config(force)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(cli: &Cli) -> Result<()> {
    let config: AppConfig = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_resolve_with_id() {
        let cli = Cli::try_parse_from(["refinery", "resolve", "--id", "7"]).expect("parse");
        match cli.command {
            Command::Resolve { path, id } => {
                assert!(path.is_none());
                assert_eq!(id, Some(PageId(7)));
            }
            _ => panic!("expected resolve"),
        }
    }

    #[test]
    fn slug_root_conflicts_with_parent() {
        let result =
            Cli::try_parse_from(["refinery", "slug", "team", "--root", "--parent", "3"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "refinery", "title", "About", "--locale", "fr", "--json", "-vv",
        ])
        .expect("parse");
        assert_eq!(cli.locale.as_deref(), Some("fr"));
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn config_init_takes_force_flag() {
        let cli = Cli::try_parse_from(["refinery", "config", "init", "--force"]).expect("parse");
        match cli.command {
            Command::Config {
                action: ConfigAction::Init { force },
            } => assert!(force),
            _ => panic!("expected config init"),
        }
    }
}
