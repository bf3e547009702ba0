mod args;
mod logger;
mod terminal;

use std::{error::Error, io::Write};

use tokio::io::BufReader;
use tracing::error;

use dalvacation::{
    config::{Config, ConfigError},
    services::reservation::BookingDetails,
    session::Session,
    signup::{Command as FlowCommand, SignUpFlow},
    VERSION,
};

use args::{args_to_options, parse_args, Command};
use terminal::Terminal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env file is fine, the variables may come from the environment.
    let _ = dotenv::dotenv();

    let args = parse_args(std::env::args().collect(), VERSION)?;
    let options = args_to_options(&args)?;

    options.datadir.init()?;

    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(|| Config::path(&options.datadir));
    let config = match Config::from_file(&config_path) {
        Ok(config) => config,
        Err(ConfigError::NotFound) => Config::default(),
        Err(e) => return Err(e.into()),
    }
    .with_env();

    let log_level = match logger::parse_log_level()? {
        Some(level) => level,
        None => config.log_level()?,
    };
    logger::setup_logger(log_level, &options.datadir)?;
    setup_panic_hook();

    let mut session = Session::load(&options.datadir)?;
    let mut term = Terminal::new(BufReader::new(tokio::io::stdin()), std::io::stdout());

    match options.command {
        Command::SignUp => {
            let identity = config.identity_client()?;
            let backend = config.profile_client()?;
            let (mut flow, command) = SignUpFlow::new(&session, config.user_pool_id()?.to_string());
            if let FlowCommand::Redirect(route) = command {
                println!("Already signed in, going to {}", route);
                return Ok(());
            }
            match term.sign_up(&mut flow, &identity, &backend).await? {
                Some(route) => println!("Continue at {}", route),
                None => println!("Sign up abandoned"),
            }
        }
        Command::Rooms => {
            let rooms = config.rooms_client()?.fetch_rooms().await?;
            term.rooms(&rooms)?;
        }
        Command::Room(room_id) => {
            let room = config.rooms_client()?.fetch_room(&room_id).await?;
            let reservations = match session.user_id() {
                Some(user_id) => {
                    config
                        .reservation_client()?
                        .fetch_user_reservations(&room.room_id, user_id)
                        .await?
                }
                None => Vec::new(),
            };
            term.room(&room, &reservations)?;
        }
        Command::Reserve(room_id) => {
            let user_id = session
                .user_id()
                .ok_or("Sign in to book a room")?
                .to_string();
            let room = config.rooms_client()?.fetch_room(&room_id).await?;
            let Some(stay) = term.stay(chrono::Utc::now().date_naive()).await? else {
                println!("Booking abandoned");
                return Ok(());
            };
            let details = BookingDetails::new(room.room_id, user_id, room.room_number, stay);
            let reservation_id = config
                .reservation_client()?
                .create_reservation(&details)
                .await?;
            println!(
                "Booking request {} sent for room #{} ({} night(s))",
                reservation_id,
                room.room_number,
                stay.nights()
            );
        }
        Command::Concern => {
            let (Some(email), Some(customer_id)) = (session.email(), session.user_id()) else {
                return Err("Sign in to send a concern".into());
            };
            match term.concern(email, customer_id).await? {
                Some(message) => {
                    config.pubsub_client()?.publish_message(&message).await?;
                    println!("Concern sent to the support agents");
                }
                None => println!("Concern abandoned"),
            }
        }
        Command::Logout => {
            session.clear();
            session.store(&options.datadir)?;
            println!("Signed out");
        }
    }

    Ok(())
}

fn setup_panic_hook() {
    std::panic::set_hook(Box::new(move |panic_info| {
        let file = panic_info
            .location()
            .map(|l| l.file())
            .unwrap_or_else(|| "'unknown'");
        let line = panic_info
            .location()
            .map(|l| l.line().to_string())
            .unwrap_or_else(|| "'unknown'".to_string());

        let bt = backtrace::Backtrace::new();
        let info = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned());
        error!(
            "panic occurred at line {} of file {}: {:?}\n{:?}",
            line, file, info, bt
        );

        let _ = std::io::stdout().flush();
        std::process::exit(1);
    }));
}
