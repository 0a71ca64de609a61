//! searchbox CLI - command-line front end for the searchbox library
//!
//! Fetches autocomplete suggestions, builds browser search requests and
//! manages the persisted search box preferences.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use searchbox::{
    endpoint::{
        EndpointResolver, LocaleSource, SystemLocale, DEFAULT_SEARCH_TEMPLATE,
        DEFAULT_SUGGEST_TEMPLATE,
    },
    search::{AppData, DeviceLocation, LocationOptIn, LocationPolicy, SearchForwarder, SearchIntent},
    settings::PreferenceStore,
    transport::{AlwaysOnline, Connectivity, ReqwestTransport, TcpCheck},
    troubleshooting_info,
    types::{ColumnLayout, Locale, SuggestionResultSet},
    utils::debug::debug_all,
    LookupConfig, SuggestionLookup, WebSearchRequest,
};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "searchbox")]
#[command(about = "Search box suggestions and web search forwarding")]
#[command(version)]
struct Cli {
    /// Locale such as en_US or pt-BR (defaults to LC_ALL/LC_MESSAGES/LANG)
    #[arg(short, long, global = true, env = "SEARCHBOX_LOCALE")]
    locale: Option<String>,

    /// Client identifier appended to endpoint URLs
    #[arg(long, global = true, env = "SEARCHBOX_CLIENT_ID")]
    client_id: Option<String>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch autocomplete suggestions for a partial query
    Suggest {
        /// Partial query
        query: String,

        /// Suggestion endpoint template with {language} and {country} placeholders
        #[arg(long, env = "SEARCHBOX_SUGGEST_URL", default_value = DEFAULT_SUGGEST_TEMPLATE)]
        endpoint: String,

        /// Request timeout in milliseconds
        #[arg(long, default_value = "1000")]
        timeout_ms: u64,

        /// Omit the icon columns
        #[arg(long)]
        plain: bool,

        /// Check reachability of host:port before querying
        #[arg(long)]
        check_host: Option<String>,

        /// Report lookup failures instead of printing no suggestions
        #[arg(long)]
        strict: bool,

        /// Query even if web suggestions are turned off in the settings
        #[arg(long)]
        force: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Build the browser request for a submitted query
    Search {
        /// Search query
        query: String,

        /// Where the search was started from
        #[arg(short, long)]
        source: Option<String>,

        /// Application data as key=value, repeatable
        #[arg(long = "app-data", value_parser = parse_key_value)]
        app_data: Vec<(String, String)>,

        /// Device latitude
        #[arg(long, requires = "longitude", allow_hyphen_values = true)]
        latitude: Option<f64>,

        /// Device longitude
        #[arg(long, requires = "latitude", allow_hyphen_values = true)]
        longitude: Option<f64>,

        /// The system has the settings provider that owns the location opt-in
        #[arg(long)]
        location_provider: bool,

        /// Search endpoint template with {language} and {country} placeholders
        #[arg(long, env = "SEARCHBOX_SEARCH_URL", default_value = DEFAULT_SEARCH_TEMPLATE)]
        endpoint: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Show the endpoint URLs resolved for the locale
    Endpoint {
        /// Suggestion endpoint template, as used by `suggest`
        #[arg(long, env = "SEARCHBOX_SUGGEST_URL", default_value = DEFAULT_SUGGEST_TEMPLATE)]
        suggest_url: String,

        /// Search endpoint template, as used by `search`
        #[arg(long, env = "SEARCHBOX_SEARCH_URL", default_value = DEFAULT_SEARCH_TEMPLATE)]
        search_url: String,
    },
    /// Show or change preferences
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print current preferences
    Show,
    /// Turn web suggestions on or off
    WebSuggestions {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Record the location opt-in answer
    LocationOptIn {
        #[arg(value_enum)]
        state: OptInCli,
    },
}

#[derive(ValueEnum, Clone, Debug)]
enum Toggle {
    On,
    Off,
}

#[derive(ValueEnum, Clone, Debug)]
enum OptInCli {
    Unset,
    Consented,
    Declined,
}

#[derive(ValueEnum, Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
    Simple,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if cli.debug { "debug" } else { "warn" }),
    )
    .init();

    let locale = resolve_locale(cli.locale.as_deref())?;

    match cli.command {
        Commands::Suggest {
            query,
            endpoint,
            timeout_ms,
            plain,
            check_host,
            strict,
            force,
            format,
        } => {
            let options = SuggestOptions {
                query,
                endpoint,
                client_id: cli.client_id,
                timeout_ms,
                plain,
                check_host,
                strict,
                force,
                debug: cli.debug,
            };
            handle_suggest(options, locale, format).await?;
        }
        Commands::Search {
            query,
            source,
            app_data,
            latitude,
            longitude,
            location_provider,
            endpoint,
            format,
        } => {
            let location = latitude
                .zip(longitude)
                .map(|(lat, lng)| DeviceLocation::new(lat, lng));
            let mut intent = SearchIntent::search(&query);
            intent.source = source;
            if !app_data.is_empty() {
                intent.app_data = Some(app_data.into_iter().collect::<AppData>());
            }
            handle_search(
                intent,
                location,
                location_provider,
                &endpoint,
                cli.client_id.as_deref(),
                locale,
                format,
            )?;
        }
        Commands::Endpoint {
            suggest_url,
            search_url,
        } => {
            handle_endpoint(&suggest_url, &search_url, &locale, cli.client_id.as_deref())?;
        }
        Commands::Settings { action } => {
            handle_settings(action.unwrap_or(SettingsAction::Show))?;
        }
    }

    Ok(())
}

struct SuggestOptions {
    query: String,
    endpoint: String,
    client_id: Option<String>,
    timeout_ms: u64,
    plain: bool,
    check_host: Option<String>,
    strict: bool,
    force: bool,
    debug: bool,
}

async fn handle_suggest(
    options: SuggestOptions,
    locale: Locale,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let prefs = PreferenceStore::default_location()
        .load()
        .context("Could not read preferences")?;
    if !prefs.show_web_suggestions && !options.force {
        eprintln!(
            "{}",
            "Web suggestions are turned off (searchbox settings web-suggestions on)".yellow()
        );
        return Ok(());
    }

    let transport = ReqwestTransport::with_settings(
        searchbox::transport::DEFAULT_USER_AGENT,
        options.timeout_ms,
    )?;
    let connectivity: Arc<dyn Connectivity> = match &options.check_host {
        Some(target) => Arc::new(TcpCheck::new(
            target,
            Duration::from_millis(options.timeout_ms),
        )),
        None => Arc::new(AlwaysOnline),
    };

    let config = LookupConfig {
        template: options.endpoint,
        client_id: options.client_id,
        layout: if options.plain {
            ColumnLayout::Plain
        } else {
            ColumnLayout::WithIcons
        },
        debug: options.debug.then(debug_all),
    };

    let lookup = SuggestionLookup::new(config, Arc::new(transport))?
        .with_locale_source(Arc::new(locale))
        .with_connectivity(connectivity);

    let results = if options.strict {
        lookup.try_lookup(&options.query).await.map_err(|e| {
            anyhow!(
                "Suggestion lookup failed: {e}\n\nTroubleshooting: {}",
                troubleshooting_info(&e)
            )
        })?
    } else {
        lookup.lookup(&options.query).await
    };

    display_suggestions(&results, &format)
}

fn handle_search(
    intent: SearchIntent,
    location: Option<DeviceLocation>,
    has_location_provider: bool,
    endpoint: &str,
    client_id: Option<&str>,
    locale: Locale,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let prefs = PreferenceStore::default_location()
        .load()
        .context("Could not read preferences")?;
    let policy = LocationPolicy::new(has_location_provider, prefs.location_opt_in);

    if policy.should_prompt() && location.is_some() {
        eprintln!(
            "{}",
            "Location not sent: answer the opt-in with `searchbox settings location-opt-in`"
                .yellow()
        );
    }

    let forwarder =
        SearchForwarder::new(endpoint, client_id)?.with_locale_source(Arc::new(locale));

    match forwarder.forward(&intent, &policy, location) {
        Some(request) => display_search_request(&request, &format),
        None => Err(anyhow!("Nothing to search for: query is empty")),
    }
}

fn handle_endpoint(
    suggest_url: &str,
    search_url: &str,
    locale: &Locale,
    client_id: Option<&str>,
) -> anyhow::Result<()> {
    let suggest = EndpointResolver::new(suggest_url, client_id)?;
    let search = EndpointResolver::new(search_url, client_id)?;

    println!("{} {}", "Locale:".bold(), locale.to_string().cyan());
    println!("{} {}", "Suggest:".bold(), suggest.suggest_base(locale));
    println!("{} {}", "Search:".bold(), search.search_base(locale));
    Ok(())
}

fn handle_settings(action: SettingsAction) -> anyhow::Result<()> {
    let store = PreferenceStore::default_location();

    let prefs = match action {
        SettingsAction::Show => store.load(),
        SettingsAction::WebSuggestions { state } => {
            store.set_show_web_suggestions(matches!(state, Toggle::On))
        }
        SettingsAction::LocationOptIn { state } => store.set_location_opt_in(match state {
            OptInCli::Unset => LocationOptIn::Unset,
            OptInCli::Consented => LocationOptIn::Consented,
            OptInCli::Declined => LocationOptIn::Declined,
        }),
    }
    .with_context(|| format!("Could not update {}", store.path().display()))?;

    println!("{} {}", "Settings file:".bold(), store.path().display());
    println!(
        "  show_web_suggestions: {}",
        if prefs.show_web_suggestions {
            "on".green()
        } else {
            "off".red()
        }
    );
    println!("  location_opt_in: {}", prefs.location_opt_in.to_string().cyan());
    Ok(())
}

fn resolve_locale(name: Option<&str>) -> anyhow::Result<Locale> {
    match name {
        Some(name) => Locale::parse(name).ok_or_else(|| anyhow!("Invalid locale: {name}")),
        None => Ok(SystemLocale.current_locale()),
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

fn display_suggestions(results: &SuggestionResultSet, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(results.rows())?);
        }
        OutputFormat::Simple => {
            for row in results {
                println!("{}", row.text);
            }
        }
        OutputFormat::Table => {
            println!("{}", "Suggestions".bold().blue());
            println!("{}", "─".repeat(60).dimmed());

            for row in results {
                println!(
                    "{}. {} {}",
                    format!("{:>3}", row.id).bold(),
                    format!("{:<40}", row.text).bold(),
                    row.popularity.dimmed()
                );
            }

            println!("{} {}", "Total suggestions:".bold(), results.len().to_string().bold());
        }
    }
    Ok(())
}

fn display_search_request(request: &WebSearchRequest, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(request)?);
        }
        OutputFormat::Simple => {
            println!("{}", request.url);
        }
        OutputFormat::Table => {
            println!("{} {}", "URL:".bold(), request.url.blue().underline());
            if let Some(post_data) = &request.post_data {
                println!("{} {}", "POST data:".bold(), post_data.yellow());
            }
            if let Some(app_data) = &request.app_data {
                println!("{}", "App data:".bold());
                for (key, value) in app_data {
                    println!("  {key} = {value}");
                }
            }
        }
    }
    Ok(())
}
