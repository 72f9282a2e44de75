use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password};

use city_weather_core::{
    Config, ForecastAggregator, GeoQuery, ProviderId, Resolution, ResolverKind, WeatherView,
    resolver::resolver_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "city-weather", version, about = "City weather web app")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web server.
    Serve {
        /// Address to bind, e.g. "0.0.0.0:8080". Defaults to the configured one.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Resolve a query and print the weather once.
    Show {
        /// City name or free-text question.
        query: String,

        /// ISO country code to pick among same-named cities.
        #[arg(long)]
        country: Option<String>,

        /// Print the view as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, "openweather" or "openai".
        provider: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Serve { bind } => {
                let config = Config::load()?;
                city_weather::init_tracing(config.log_level());
                city_weather::server::serve(&config, bind.as_deref()).await
            }
            Command::Show { query, country, json } => {
                let config = Config::load()?;
                city_weather::init_tracing(config.log_level());
                show(&config, &query, country, json).await
            }
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;

    // Edit the file as stored, without environment overrides.
    let path = Config::config_file_path()?;
    let mut config = Config::load_from(&path)?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    let api_key = api_key.trim();
    if api_key.is_empty() {
        anyhow::bail!("API key must not be empty");
    }
    config.upsert_provider_api_key(id, api_key.to_string());

    if id == ProviderId::OpenAi {
        let assisted = Confirm::new("Use the language model to resolve search queries?")
            .with_default(true)
            .prompt()
            .context("Failed to read answer")?;
        config.set_default_resolver(if assisted {
            ResolverKind::Assisted
        } else {
            ResolverKind::PassThrough
        });
    }

    config.save_to(&path)?;
    println!("Saved {id} credentials to {}", path.display());
    Ok(())
}

async fn show(
    config: &Config,
    query: &str,
    country: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let resolver = resolver_from_config(config)?;
    let aggregator = ForecastAggregator::from_config(config)?;

    let city = match resolver.resolve(query).await? {
        Resolution::Resolved(city) => city,
        unresolved => {
            println!("{}", unresolved.fallback_message().unwrap_or_default());
            return Ok(());
        }
    };

    let view = aggregator
        .aggregate(&GeoQuery::new(city).with_country(country))
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print_view(&view);
    }
    Ok(())
}

fn print_view(view: &WeatherView) {
    println!("{} ({})", view.city_name, view.location.label());
    println!("{}", view.current_date);
    println!(
        "  {}°C, {} (min {}°C / max {}°C), wind {} m/s",
        view.current_temp, view.current_weather, view.min_temp, view.max_temp, view.wind_speed
    );
    for day in &view.five_day_forecast {
        println!("  {:<10} {:>4}°C  {}", day.weekday, day.temp, day.condition);
    }
    if !view.alternatives.is_empty() {
        let others: Vec<String> = view.alternatives.iter().map(|c| c.label()).collect();
        println!("Other matches: {}", others.join("; "));
    }
}
