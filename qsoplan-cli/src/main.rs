mod config;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use qsoplan_client::{
    grid_square, pair_contacts, parse_datetime, sort_by_confirmed, ApiClient, Band, Mode,
    NewContact, ProfileUpdate, RegistrationRequest, SessionStore,
};
use std::io::Write;
use tracing::debug;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "qsoplan")]
#[command(about = "Command line client for the QSO Plan contact logger", version)]
struct Cli {
    /// Server base URL (overrides the config file)
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Log in and store the session
    Login {
        /// Account call sign
        call_sign: String,

        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Log out and discard the stored session
    Logout,

    /// Register a new account
    Register {
        /// Call sign to register, also used as the username
        call_sign: String,

        /// Contact email address
        #[arg(long)]
        email: String,

        /// Default grid square for the profile
        #[arg(long)]
        grid: String,

        /// Password (prompted for when omitted)
        #[arg(long)]
        password: Option<String>,
    },

    /// Log a contact
    Log(LogArgs),

    /// List your contacts as paired QSOs
    List {
        /// Show the raw per-direction records instead
        #[arg(long)]
        raw: bool,
    },

    /// Delete a contact record by id
    Delete {
        /// Record id as shown by list
        id: i64,
    },

    /// Show the public confirmed-contact rankings
    Rankings,

    /// Show your profile
    Profile,

    /// Update profile fields
    Update {
        /// New email address
        #[arg(long)]
        email: Option<String>,

        /// New default grid square
        #[arg(long)]
        grid: Option<String>,
    },

    /// Change the account password
    Password,

    /// Search call signs by prefix
    Search {
        /// Prefix, at least two characters
        query: String,
    },

    /// Derive a Maidenhead locator from coordinates
    Locate {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
    },

    /// Print a band's channel table
    Channels {
        /// CB or PMR (both when omitted)
        band: Option<String>,
    },
}

#[derive(Args, Debug)]
struct LogArgs {
    /// Call sign of the worked station
    recipient: String,

    /// Frequency in MHz
    #[arg(long, conflicts_with = "channel")]
    frequency: Option<f64>,

    /// Channel number instead of a frequency
    #[arg(long)]
    channel: Option<u8>,

    /// Band for --channel (CB or PMR)
    #[arg(long)]
    band: Option<String>,

    /// Mode (AM, SSB or FM)
    #[arg(long)]
    mode: Option<String>,

    /// Contact time, ISO 8601 (defaults to now)
    #[arg(long)]
    at: Option<String>,

    /// Your grid square (defaults to the profile's)
    #[arg(long)]
    my_grid: Option<String>,

    /// The other station's grid square
    #[arg(long)]
    their_grid: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stdout is the interface, so stay quiet by default
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;
    config
        .ensure_directories()
        .context("Failed to create directories")?;

    let server_url = cli.server.unwrap_or_else(|| config.server.url.clone());
    debug!("Using server {}", server_url);

    let client = ApiClient::new(&server_url).context("Failed to create API client")?;
    let mut store =
        SessionStore::new(config.session_path()).context("Failed to open session store")?;

    match cli.command {
        Commands::Login {
            call_sign,
            password,
        } => cmd_login(&client, &mut store, &call_sign, password).await,
        Commands::Logout => cmd_logout(&mut store),
        Commands::Register {
            call_sign,
            email,
            grid,
            password,
        } => cmd_register(&client, call_sign, email, grid, password).await,
        Commands::Log(args) => cmd_log(&client, &mut store, &config, args).await,
        Commands::List { raw } => cmd_list(&client, &mut store, raw).await,
        Commands::Delete { id } => cmd_delete(&client, &mut store, id).await,
        Commands::Rankings => cmd_rankings(&client).await,
        Commands::Profile => cmd_profile(&client, &mut store).await,
        Commands::Update { email, grid } => cmd_update(&client, &mut store, email, grid).await,
        Commands::Password => cmd_password(&client, &mut store).await,
        Commands::Search { query } => cmd_search(&client, &mut store, &query).await,
        Commands::Locate {
            latitude,
            longitude,
        } => cmd_locate(latitude, longitude),
        Commands::Channels { band } => cmd_channels(band),
    }
}

async fn cmd_login(
    client: &ApiClient,
    store: &mut SessionStore,
    call_sign: &str,
    password: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt("Password: ")?,
    };

    let profile = client
        .sign_in(store, &call_sign.trim().to_uppercase(), &password)
        .await
        .context("Login failed")?;

    println!("Logged in as {} ({})", profile.call_sign, profile.email);
    if !profile.default_grid_square.is_empty() {
        println!("Default grid square: {}", profile.default_grid_square);
    }
    Ok(())
}

fn cmd_logout(store: &mut SessionStore) -> Result<()> {
    if !store.is_logged_in() {
        println!("Not logged in.");
        return Ok(());
    }
    store.clear().context("Failed to clear session")?;
    println!("Logged out.");
    Ok(())
}

async fn cmd_register(
    client: &ApiClient,
    call_sign: String,
    email: String,
    grid: String,
    password: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => {
            let first = prompt("Password: ")?;
            let second = prompt("Repeat password: ")?;
            if first != second {
                bail!("Passwords do not match");
            }
            first
        }
    };

    let request = RegistrationRequest {
        email,
        call_sign,
        default_grid_square: grid,
        password,
    };
    let response = client
        .register(&request)
        .await
        .context("Registration failed")?;

    println!("{}", response.message);
    println!("Registered {} ({})", response.call_sign, response.email);
    Ok(())
}

async fn cmd_log(
    client: &ApiClient,
    store: &mut SessionStore,
    config: &Config,
    args: LogArgs,
) -> Result<()> {
    let band: Option<Band> = args.band.as_deref().map(str::parse).transpose()?;

    let frequency = match (args.frequency, args.channel) {
        (Some(frequency), None) => frequency,
        (None, Some(channel)) => {
            let band = match band {
                Some(band) => band,
                None => config
                    .defaults
                    .band
                    .parse()
                    .context("Invalid default band in config")?,
            };
            band.channel_frequency(channel)
                .with_context(|| format!("{} has no channel {}", band, channel))?
        }
        (Some(_), Some(_)) => bail!("Give either --frequency or --channel, not both"),
        (None, None) => bail!("Give --frequency or --channel"),
    };

    let mode: Mode = match args.mode.as_deref() {
        Some(mode) => mode.parse()?,
        None => {
            let configured: Mode = config
                .defaults
                .mode
                .parse()
                .context("Invalid default mode in config")?;
            // Fall back to the band's own default when the configured
            // mode is not legal there.
            match Band::from_frequency(frequency) {
                Some(band) if !band.supports(configured) => band.default_mode(),
                _ => configured,
            }
        }
    };

    let at = match args.at.as_deref() {
        Some(raw) => {
            parse_datetime(raw).with_context(|| format!("Could not parse timestamp '{}'", raw))?
        }
        None => Utc::now(),
    };

    let my_grid = match args.my_grid {
        Some(grid) => grid,
        None => {
            let grid = store.require()?.user.default_grid_square.clone();
            if grid.is_empty() {
                bail!("No --my-grid given and the profile has no default grid square");
            }
            grid
        }
    };

    let contact = NewContact::new(args.recipient, frequency, mode, at, my_grid, args.their_grid);
    let record = client
        .create_contact(store, contact)
        .await
        .context("Failed to log contact")?;

    println!(
        "Logged QSO #{} with {} on {:.3} MHz {} at {}",
        record.id,
        record.recipient,
        record.frequency,
        record.mode.as_str(),
        record.datetime
    );
    Ok(())
}

async fn cmd_list(client: &ApiClient, store: &mut SessionStore, raw: bool) -> Result<()> {
    let records = client
        .list_contacts(store)
        .await
        .context("Failed to fetch contacts")?;
    if records.is_empty() {
        println!("No contacts logged yet.");
        return Ok(());
    }

    if raw {
        println!(
            "{:>6}  {:<10} {:<10} {:>9}  {:<4} {:<25} confirmed",
            "id", "from", "to", "MHz", "mode", "time"
        );
        for record in &records {
            println!(
                "{:>6}  {:<10} {:<10} {:>9.3}  {:<4} {:<25} {}",
                record.id,
                record.initiator_callsign,
                record.recipient,
                record.frequency,
                record.mode.as_str(),
                record.datetime,
                if record.confirmed { "yes" } else { "no" }
            );
        }
        return Ok(());
    }

    let views = pair_contacts(&records);
    let confirmed = views.iter().filter(|view| view.confirmed).count();
    println!("{} QSOs ({} confirmed)", views.len(), confirmed);

    for view in &views {
        let when = match view.datetime_utc() {
            Some(at) => at.format("%Y-%m-%d %H:%M").to_string(),
            None => format!("unreadable time ({})", view.datetime),
        };
        let status = if view.confirmed { "confirmed" } else { "pending" };
        println!(
            "#{:<5} {}  {} ({}) <-> {} ({})  {:.3} MHz {}  [{}]",
            view.id,
            when,
            view.station1,
            view.location1,
            view.station2,
            view.location2,
            view.frequency,
            view.mode.as_str(),
            status
        );
    }
    Ok(())
}

async fn cmd_delete(client: &ApiClient, store: &mut SessionStore, id: i64) -> Result<()> {
    client
        .delete_contact(store, id)
        .await
        .context("Failed to delete contact")?;
    println!("Deleted record #{}", id);
    Ok(())
}

async fn cmd_rankings(client: &ApiClient) -> Result<()> {
    let mut entries = client.rankings().await.context("Failed to fetch rankings")?;
    if entries.is_empty() {
        println!("No rankings yet.");
        return Ok(());
    }
    sort_by_confirmed(&mut entries);

    println!(
        "{:>4}  {:<10} {:>9} {:>6} {:>7}",
        "rank", "call sign", "confirmed", "total", "rate"
    );
    for (index, entry) in entries.iter().enumerate() {
        println!(
            "{:>4}  {:<10} {:>9} {:>6} {:>7}",
            index + 1,
            entry.call_sign,
            entry.confirmed_contacts,
            entry.total_contacts,
            entry.confirmation_rate_display()
        );
    }
    Ok(())
}

async fn cmd_profile(client: &ApiClient, store: &mut SessionStore) -> Result<()> {
    let profile = client
        .fetch_profile(store)
        .await
        .context("Failed to fetch profile")?;

    println!("Call sign:   {}", profile.call_sign);
    println!("Email:       {}", profile.email);
    if profile.default_grid_square.is_empty() {
        println!("Grid square: (not set)");
    } else {
        println!("Grid square: {}", profile.default_grid_square);
    }
    Ok(())
}

async fn cmd_update(
    client: &ApiClient,
    store: &mut SessionStore,
    email: Option<String>,
    grid: Option<String>,
) -> Result<()> {
    let update = ProfileUpdate {
        email,
        default_grid_square: grid,
    };
    if update.is_empty() {
        bail!("Nothing to update; give --email or --grid");
    }

    let profile = client
        .update_profile(store, &update)
        .await
        .context("Failed to update profile")?;

    println!("Profile updated.");
    println!("Email:       {}", profile.email);
    println!("Grid square: {}", profile.default_grid_square);
    Ok(())
}

async fn cmd_password(client: &ApiClient, store: &mut SessionStore) -> Result<()> {
    let old_password = prompt("Current password: ")?;
    let new_password = prompt("New password: ")?;
    let repeat = prompt("Repeat new password: ")?;
    if new_password != repeat {
        bail!("Passwords do not match");
    }

    client
        .change_password(store, &old_password, &new_password)
        .await
        .context("Failed to change password")?;
    println!("Password changed.");
    Ok(())
}

async fn cmd_search(client: &ApiClient, store: &mut SessionStore, query: &str) -> Result<()> {
    let matches = client
        .search_callsigns(store, query)
        .await
        .context("Search failed")?;
    if matches.is_empty() {
        println!("No call signs matching '{}'.", query.trim());
        return Ok(());
    }

    for hit in &matches {
        if hit.default_grid_square.is_empty() {
            println!("{}", hit.call_sign);
        } else {
            println!("{:<10} {}", hit.call_sign, hit.default_grid_square);
        }
    }
    Ok(())
}

fn cmd_locate(latitude: f64, longitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) {
        bail!("Latitude must be between -90 and 90");
    }
    if !(-180.0..=360.0).contains(&longitude) {
        bail!("Longitude must be between -180 and 360");
    }
    println!("{}", grid_square(latitude, longitude));
    Ok(())
}

fn cmd_channels(band: Option<String>) -> Result<()> {
    let bands = match band {
        Some(band) => vec![band.parse::<Band>()?],
        None => vec![Band::Cb, Band::Pmr],
    };

    for (index, band) in bands.iter().enumerate() {
        if index > 0 {
            println!();
        }
        let modes = band
            .modes()
            .iter()
            .map(|mode| mode.as_str())
            .collect::<Vec<_>>()
            .join("/");
        println!("{} ({} channels, {})", band, band.channel_count(), modes);
        for channel in band.channels() {
            println!("  {:>2}  {:>8.3} MHz", channel.number, channel.frequency);
        }
    }
    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read input")?;
    Ok(line
        .trim_end_matches(|c| c == '\r' || c == '\n')
        .to_string())
}
