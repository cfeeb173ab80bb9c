use std::error::Error;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::Map;

use crate::domain::countdown::TimeLeft;
use crate::domain::engagement::{Page, PhotoUpload};
use crate::domain::forms::{
    DonationForm, GuestbookForm, RsvpForm, SongSuggestionForm, SubEventAnswer, SubEventRsvpForm,
};
use crate::domain::guest::{IdentifyOutcome, IdentifyQuery, RsvpStatus};
use crate::domain::listings::{SeatingPlan, group_program_by_day};
use crate::domain::modules::{self, Navigation};
use crate::frameworks::app::{boot, init_tracing};
use crate::frameworks::config::Settings;
use crate::interface_adapters::state::AppServices;

#[derive(Parser, Debug)]
#[command(name = "guest")]
#[command(author, version, about = "Guest companion for a hosted event", long_about = None)]
pub struct Args {
    /// Event slug; overrides EVENT_ID
    #[arg(long, global = true)]
    event: Option<String>,

    /// Backend base URL; overrides GUEST_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Use the bundled demo event instead of the backend config
    #[arg(long, global = true)]
    demo: bool,

    /// Refetch the event config even when the cached copy is fresh
    #[arg(long, global = true)]
    reload: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Event summary, countdown and guest session
    Status,
    /// Identify yourself by name, email, phone or personal code
    Identify {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long, conflicts_with_all = ["name", "email", "phone"])]
        code: Option<String>,
    },
    /// Forget the identified guest on this device
    Logout,
    /// Personalized program, grouped by day
    Program,
    /// Enabled modules and the resulting navigation
    Modules,
    /// Answer the invitation. With --answer, replies per sub-event.
    Rsvp {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// yes or no
        #[arg(long, value_parser = parse_yes_no)]
        attending: Option<bool>,
        #[arg(long = "plus-one")]
        plus_ones: Vec<String>,
        #[arg(long)]
        dietary: Option<String>,
        #[arg(long)]
        allergies: Option<String>,
        #[arg(long)]
        message: Option<String>,
        /// slug=yes[:count] or slug=no, repeatable
        #[arg(long = "answer", value_parser = parse_answer)]
        answers: Vec<SubEventAnswer>,
    },
    /// List approved photos
    Photos {
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Share a photo with the gallery
    UploadPhoto {
        path: PathBuf,
        #[arg(long)]
        caption: Option<String>,
        #[arg(long = "by")]
        uploaded_by: Option<String>,
    },
    /// Read the guestbook
    Guestbook {
        #[arg(long, default_value_t = 0)]
        skip: u32,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
    /// Leave a message in the guestbook
    SignGuestbook {
        #[arg(long)]
        author: String,
        #[arg(long)]
        message: String,
    },
    /// Start a donation
    Donate {
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        anonymous: bool,
    },
    /// Donation totals
    DonationStats,
    /// Song suggestions, most voted first
    Playlist {
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Suggest a song for the party
    SuggestSong {
        #[arg(long)]
        title: String,
        #[arg(long)]
        artist: String,
        #[arg(long = "by")]
        guest_name: String,
        #[arg(long)]
        spotify_url: Option<String>,
    },
    /// Find your table
    Seating { name: String },
    /// Push notification subscription for this event
    Notifications {
        #[command(subcommand)]
        action: NotificationAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum NotificationAction {
    Enable,
    Disable,
    Status,
}

pub async fn run() -> ExitCode {
    let args = Args::parse();

    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    init_tracing();

    let mut settings = Settings::from_env();
    if let Some(event) = args.event {
        settings.event_id = event;
    }
    if let Some(api_url) = args.api_url {
        settings.api_url = api_url;
    }
    settings.demo_mode |= args.demo;

    let settings = match settings.validated() {
        Ok(settings) => settings,
        Err(err) => {
            tracing::error!(error = %err, "invalid settings");
            return ExitCode::FAILURE;
        }
    };

    let services = match boot(&settings, args.reload).await {
        Ok(services) => services,
        Err(err) => {
            tracing::error!(error = %err, "startup failed");
            return ExitCode::FAILURE;
        }
    };

    let command = args.command.unwrap_or(Command::Status);
    match execute(&services, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn execute(services: &AppServices, command: Command) -> Result<(), Box<dyn Error>> {
    let config = &services.loaded.config;

    match command {
        Command::Status => {
            println!("{} ({})", config.event.title, config.event.event_type);
            println!("config: {}", services.loaded.origin.as_str());
            if let Some(date) = config.event_date() {
                let left = TimeLeft::until(date, Utc::now());
                if left.is_over() {
                    println!("the big day is here");
                } else {
                    println!("countdown: {left}");
                }
            }
            match services.session.guest().await {
                Some(guest) => println!("hello {}", guest.greeting_name()),
                // A code can be saved but unconfirmed when the backend was unreachable.
                None => match services.session.saved_identity().await? {
                    Some(saved) => println!(
                        "saved guest {} ({}), not confirmed yet",
                        non_empty(&saved.guest_name, "unknown"),
                        saved.personal_code
                    ),
                    None => println!("not identified"),
                },
            }
        }
        Command::Identify {
            name,
            email,
            phone,
            code,
        } => {
            let query = match code {
                Some(code) => IdentifyQuery::by_code(code),
                None => IdentifyQuery::Details { name, email, phone },
            };
            match services.session.identify(query).await? {
                IdentifyOutcome::Identified(guest) => {
                    println!("welcome {}", guest.greeting_name());
                    if let Some(code) = guest.personal_code {
                        println!("your personal code: {code}");
                    }
                }
                IdentifyOutcome::NotFound { message } => println!("not found: {message}"),
                IdentifyOutcome::Ambiguous { message } => {
                    println!("{message}");
                    println!("several guests match; add --email or --phone");
                }
            }
        }
        Command::Logout => {
            services.session.logout().await?;
            println!("logged out");
        }
        Command::Program => {
            if !services.session.is_identified().await {
                return Err("identify yourself first".into());
            }
            let program = match services.session.refresh_program().await {
                Ok(Some(program)) => program,
                Ok(None) => return Err("identify yourself first".into()),
                Err(err) => {
                    tracing::warn!(error = %err, "program refresh failed; using last known");
                    services
                        .session
                        .program()
                        .await
                        .ok_or("program unavailable")?
                }
            };
            println!("{} ({})", program.guest_name, program.group_name);
            for day in group_program_by_day(&program.sub_events) {
                println!("{}", day.date.as_deref().unwrap_or("date to be announced"));
                for event in day.events {
                    println!(
                        "  {:>5}  {:<30} {}",
                        event.start_time.as_deref().unwrap_or("--:--"),
                        event.name,
                        event.rsvp_status.as_str()
                    );
                }
            }
            if let Some(deadline) = program.rsvp_deadline {
                println!("answer before {deadline}");
            }
        }
        Command::Modules => {
            for (name, module) in &config.modules {
                let state = if module.enabled { "on" } else { "off" };
                println!("{name:<20} {state}");
            }
            match services.navigation().await {
                Navigation::IdentificationRequired => println!("tabs: identification required"),
                Navigation::Tabs { tabs, more } => {
                    let tabs: Vec<&str> = tabs.iter().map(|t| t.title()).collect();
                    println!("tabs: {}", tabs.join(" | "));
                    if !more.is_empty() {
                        let more: Vec<&str> = more.iter().map(|m| m.title()).collect();
                        println!("more: {}", more.join(", "));
                    }
                }
            }
        }
        Command::Rsvp {
            name,
            email,
            attending,
            plus_ones,
            dietary,
            allergies,
            message,
            answers,
        } => {
            if !answers.is_empty() {
                let ack = services
                    .session
                    .submit_sub_event_rsvp(SubEventRsvpForm {
                        answers,
                        dietary,
                        allergies,
                        message,
                    })
                    .await?;
                println!("{}", non_empty(&ack.message, "answers saved"));
                return Ok(());
            }

            let name = match name {
                Some(name) => name,
                None => services
                    .session
                    .guest()
                    .await
                    .map(|g| g.name)
                    .unwrap_or_default(),
            };
            let guest = services
                .engagement
                .submit_rsvp(RsvpForm {
                    name,
                    email,
                    phone: None,
                    attending,
                    plus_one_names: plus_ones,
                    dietary,
                    allergies,
                    menu_choice: None,
                    custom_answers: Map::new(),
                })
                .await?;
            println!(
                "thank you {}, answer recorded ({})",
                guest.greeting_name(),
                guest.status.as_str()
            );
        }
        Command::Photos { skip, limit } => {
            let photos = services.engagement.photos(Page { skip, limit }).await?;
            if photos.is_empty() {
                println!("no photos yet");
            }
            for photo in photos {
                let by = photo.uploaded_by.as_deref().unwrap_or("anonymous");
                println!("{}  {}  ({by})", photo.id, photo.url);
            }
        }
        Command::UploadPhoto {
            path,
            caption,
            uploaded_by,
        } => {
            let bytes = tokio::fs::read(&path).await?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "photo.jpg".to_string());
            let photo = services
                .engagement
                .upload_photo(PhotoUpload {
                    mime_type: mime_for(&path).to_string(),
                    file_name,
                    bytes,
                    uploaded_by,
                    caption,
                })
                .await?;
            println!("uploaded {}", photo.url);
        }
        Command::Guestbook { skip, limit } => {
            let entries = services.engagement.guestbook(Page { skip, limit }).await?;
            if entries.is_empty() {
                println!("the guestbook is empty");
            }
            for entry in entries {
                println!("{}: {}", entry.author_name, entry.message);
            }
        }
        Command::SignGuestbook { author, message } => {
            services
                .engagement
                .sign_guestbook(GuestbookForm {
                    author_name: author,
                    message,
                    photo_url: None,
                })
                .await?;
            println!("message sent; it will appear once approved");
        }
        Command::Donate {
            amount,
            name,
            message,
            anonymous,
        } => {
            let intent = services
                .engagement
                .donate(DonationForm {
                    amount,
                    donor_name: name,
                    message,
                    anonymous,
                    currency: services.engagement.donation_currency(),
                })
                .await?;
            println!("payment intent {}", intent.payment_intent_id);
            println!("client secret {}", intent.client_secret);
        }
        Command::DonationStats => {
            let stats = services.engagement.donation_stats().await?;
            println!(
                "{:.2} {} from {} donations",
                stats.total_amount, stats.currency, stats.total_count
            );
        }
        Command::Playlist { search } => {
            let board = services.engagement.playlist().await?;
            for entry in board.ranked(&search) {
                let artist = entry.suggestion.artist.as_deref().unwrap_or("?");
                println!(
                    "{:>3}  {} - {}",
                    entry.votes, entry.suggestion.song_title, artist
                );
            }
        }
        Command::SuggestSong {
            title,
            artist,
            guest_name,
            spotify_url,
        } => {
            let song = services
                .engagement
                .suggest_song(SongSuggestionForm {
                    guest_name,
                    song_title: title,
                    artist,
                    spotify_url,
                })
                .await?;
            println!("added {}", song.song_title);
        }
        Command::Seating { name } => {
            // The published plan answers offline; the backend is asked otherwise.
            let local = config
                .module(modules::SEATING_PLAN)
                .map(SeatingPlan::from_module)
                .unwrap_or_default();
            if let Some(table) = local.table_for(&name) {
                println!("{}", table.name);
                return Ok(());
            }
            let result = services.engagement.find_seat(&name).await?;
            match (result.found, result.table_name) {
                (true, Some(table)) => println!("{table}"),
                _ => println!("{}", non_empty(&result.message, "no table found")),
            }
        }
        Command::Notifications { action } => {
            let push = &services.push;
            match action {
                NotificationAction::Enable => {
                    if push.initialize(&services.event_id).await {
                        println!("notifications enabled");
                    } else {
                        return Err("could not enable notifications (is PUSH_TOKEN set?)".into());
                    }
                }
                NotificationAction::Disable => {
                    if push.unsubscribe(&services.event_id).await {
                        println!("notifications disabled");
                    } else {
                        return Err("could not disable notifications".into());
                    }
                }
                NotificationAction::Status => match push.subscribed_event_id().await {
                    Some(event_id) if event_id == services.event_id => println!("subscribed"),
                    Some(event_id) => println!("subscribed to another event ({event_id})"),
                    None => println!("not subscribed"),
                },
            }
        }
    }

    Ok(())
}

fn non_empty<'a>(message: &'a str, fallback: &'a str) -> &'a str {
    if message.trim().is_empty() {
        fallback
    } else {
        message
    }
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "heic" => "image/heic",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

fn parse_yes_no(value: &str) -> Result<bool, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "oui" => Ok(true),
        "no" | "n" | "false" | "non" => Ok(false),
        other => Err(format!("expected yes or no, got {other:?}")),
    }
}

// slug=yes[:count] | slug=no
fn parse_answer(value: &str) -> Result<SubEventAnswer, String> {
    let (slug, answer) = value
        .split_once('=')
        .ok_or_else(|| format!("expected slug=yes[:count] or slug=no, got {value:?}"))?;
    let (decision, count) = match answer.split_once(':') {
        Some((decision, count)) => {
            let count = count
                .trim()
                .parse::<u32>()
                .map_err(|_| format!("invalid attendee count {count:?}"))?;
            (decision, Some(count))
        }
        None => (answer, None),
    };
    let status = if parse_yes_no(decision)? {
        RsvpStatus::Confirmed
    } else {
        RsvpStatus::Declined
    };
    let attendees_count = match status {
        RsvpStatus::Confirmed => count.unwrap_or(1),
        _ => 0,
    };
    Ok(SubEventAnswer {
        slug: slug.trim().to_string(),
        status,
        attendees_count,
    })
}
