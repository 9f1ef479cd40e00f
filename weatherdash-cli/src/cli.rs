use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use inquire::{InquireError, Password, Select, Text};
use weatherdash_core::{
    Config, Dashboard, DashboardState, Geolocator, LocationResolver, Timestamp, UnitSystem,
    location::{GeolocationOptions, Position, StaticGeolocator, geolocator_from_config},
    present::toggle_label,
    provider_from_config,
};

use crate::render::render_dashboard;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherdash", version, about = "Terminal weather dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Where to look and how to show it.
#[derive(Debug, Args, Default)]
pub struct LocationArgs {
    /// Unit system: "metric" or "imperial".
    #[arg(long)]
    pub units: Option<String>,

    /// Latitude of the device position.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of the device position.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Approximate the device position from the public IP address.
    #[arg(long)]
    pub ip_location: bool,

    /// Show times in the displayed city's time zone instead of the local one.
    #[arg(long)]
    pub city_time: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key, default city and units.
    Configure,

    /// Show weather once for a city, or for the current location.
    Show {
        /// City name; omitted means "use my location".
        city: Option<String>,

        #[command(flatten)]
        location: LocationArgs,
    },

    /// Keep the dashboard open: search, toggle units, relocate.
    Interactive {
        #[command(flatten)]
        location: LocationArgs,
    },
}

const SEARCH: &str = "Search for a city";
const USE_LOCATION: &str = "Use my location";
const QUIT: &str = "Quit";

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show { city, location } => {
                let config = Config::load()?;
                let (dashboard, icon_base_url) = build_dashboard(&config, &location)?;

                eprintln!("Loading weather data...");
                let state = match city {
                    Some(city) => dashboard.search(&city).await,
                    None => dashboard.start().await,
                };
                print_state(&state, &icon_base_url, location.city_time)?;

                match state.error {
                    Some(error) => Err(anyhow::anyhow!(error)),
                    None => Ok(()),
                }
            }
            Command::Interactive { location } => {
                let config = Config::load()?;
                let (dashboard, icon_base_url) = build_dashboard(&config, &location)?;
                interactive(&dashboard, &icon_base_url, location.city_time).await
            }
        }
    }
}

fn build_dashboard(config: &Config, args: &LocationArgs) -> anyhow::Result<(Dashboard, String)> {
    let provider = provider_from_config(config)?;

    let units = match &args.units {
        Some(units) => UnitSystem::try_from(units.as_str())?,
        None => config.units,
    };

    let mut geolocation = config.geolocation.clone();
    geolocation.ip_lookup |= args.ip_location;

    let geolocator: Box<dyn Geolocator> = match (args.lat, args.lon) {
        (Some(latitude), Some(longitude)) => {
            Box::new(StaticGeolocator(Position { latitude, longitude }))
        }
        _ => geolocator_from_config(&geolocation),
    };

    let resolver = LocationResolver::new(
        geolocator,
        GeolocationOptions::from(&geolocation),
        config.default_city.clone(),
    );

    tracing::debug!(
        %units,
        fallback = resolver.fallback_city(),
        ip_lookup = geolocation.ip_lookup,
        "Building dashboard"
    );

    Ok((Dashboard::new(Box::new(provider), resolver, units), config.icon_base_url.clone()))
}

fn print_state(state: &DashboardState, icon_base_url: &str, city_time: bool) -> anyhow::Result<()> {
    let now = Timestamp::now();
    let city_offset = state.snapshot.as_ref().filter(|_| city_time).and_then(|s| s.utc_offset());

    let mut out = String::new();
    match city_offset {
        Some(offset) => render_dashboard(&mut out, state, now, &offset, icon_base_url)?,
        None => render_dashboard(&mut out, state, now, &chrono::Local, icon_base_url)?,
    }
    println!("{out}");
    Ok(())
}

/// `None` when the user cancelled the prompt.
fn prompt<T>(result: Result<T, InquireError>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(e) => Err(e).context("Prompt failed"),
    }
}

async fn interactive(
    dashboard: &Dashboard,
    icon_base_url: &str,
    city_time: bool,
) -> anyhow::Result<()> {
    eprintln!("Loading weather data...");
    let mut state = dashboard.start().await;

    loop {
        print_state(&state, icon_base_url, city_time)?;

        let toggle = toggle_label(state.units);
        let options = vec![SEARCH, toggle.as_str(), USE_LOCATION, QUIT];
        let Some(choice) = prompt(Select::new("What next?", options).prompt())? else {
            return Ok(());
        };

        state = match choice {
            SEARCH => {
                let Some(city) = prompt(Text::new("City:").prompt())? else {
                    continue;
                };
                eprintln!("Loading weather data...");
                dashboard.search(&city).await
            }
            USE_LOCATION => {
                eprintln!("Locating...");
                dashboard.use_my_location().await
            }
            QUIT => return Ok(()),
            _ => dashboard.toggle_units().await,
        };
    }
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let Some(api_key) = prompt(
        Password::new("OpenWeather API key:")
            .without_confirmation()
            .with_help_message("Create one at https://home.openweathermap.org/api_keys")
            .prompt(),
    )?
    else {
        return Ok(());
    };

    let Some(city) =
        prompt(Text::new("Default city:").with_default(&config.default_city).prompt())?
    else {
        return Ok(());
    };

    let Some(units) = prompt(Select::new("Units:", UnitSystem::all().to_vec()).prompt())? else {
        return Ok(());
    };

    config.set_api_key(api_key);
    config.default_city = city;
    config.units = units;

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}
