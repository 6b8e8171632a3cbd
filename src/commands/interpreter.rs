//! Executes interpreted commands against the listing store

use super::rules::{interpret, Command, ServiceCategory, SERVICE_CATEGORIES};
use crate::gigs::{Gig, ListingStore};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

pub const DEFAULT_WAGE: u32 = 500;
pub const VOICE_CUSTOMER_NAME: &str = "Voice Customer";
pub const VOICE_BOOKING_TIME: &str = "Kal Subah 9 AM";
pub const DEFAULT_LOCATION: &str = "Customer Location";
pub const MAX_LISTED_SERVICES: usize = 5;

pub const FORM_OPENED_REPLY: &str = "Gig form khol diya!";
pub const DELETED_LAST_REPLY: &str = "Last gig delete!";
pub const FALLBACK_REPLY: &str =
    "Samajh nahi aaya. Kahiye: services dikhao, post gig, plumber book karo!";

/// State change caused by a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    Inserted(u64),
    Deleted(u64),
    FormOpened,
}

/// Result of executing one command
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub command: Command,
    /// Text to speak, if any
    pub reply: Option<String>,
    pub effect: Effect,
}

impl Outcome {
    fn reply(command: Command, text: impl Into<String>, effect: Effect) -> Self {
        Self {
            command,
            reply: Some(text.into()),
            effect,
        }
    }

    fn silent(command: Command) -> Self {
        Self {
            command,
            reply: None,
            effect: Effect::None,
        }
    }
}

/// Turns transcripts into store mutations and replies
pub struct CommandInterpreter {
    rng: StdRng,
}

impl Default for CommandInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandInterpreter {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic mobile numbers, for tests
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Interpret and execute a transcript in one step
    pub fn handle(&mut self, transcript: &str, store: &mut ListingStore, now_ms: u64) -> Outcome {
        info!("Command: {}", transcript);
        let command = interpret(transcript);
        self.execute(command, store, now_ms)
    }

    pub fn execute(&mut self, command: Command, store: &mut ListingStore, now_ms: u64) -> Outcome {
        debug!("Executing {}", command.name());
        match command {
            Command::ListServices => {
                Outcome::reply(command, list_services_reply(store), Effect::None)
            }
            Command::BookService(service) => {
                let gig = self.book(service, store, now_ms);
                let reply = format!("{} book ho gaya! ₹{}", service.name, gig.wage);
                let id = gig.id;
                store.insert(gig);
                Outcome::reply(command, reply, Effect::Inserted(id))
            }
            Command::OpenForm => Outcome::reply(command, FORM_OPENED_REPLY, Effect::FormOpened),
            Command::ShowListings => {
                Outcome::reply(command, format!("{} gigs hain!", store.len()), Effect::None)
            }
            Command::DeleteLast => match store.delete_last() {
                Some(removed) => {
                    Outcome::reply(command, DELETED_LAST_REPLY, Effect::Deleted(removed.id))
                }
                None => Outcome::silent(command),
            },
            Command::Greeting => Outcome::reply(
                command,
                format!(
                    "Namaste! {} gigs active. Boliye: services, post gig, plumber book!",
                    store.len()
                ),
                Effect::None,
            ),
            Command::Fallback => Outcome::reply(command, FALLBACK_REPLY, Effect::None),
        }
    }

    /// Build a voice booking, reusing wage and location from an earlier gig
    /// for the same service
    fn book(&mut self, service: &ServiceCategory, store: &ListingStore, now_ms: u64) -> Gig {
        let existing = store.find_by_service(service.name);
        let wage = existing
            .map(|g| g.wage)
            .filter(|w| *w > 0)
            .unwrap_or(DEFAULT_WAGE);
        let location = existing
            .and_then(|g| g.location.clone())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());

        Gig::new(
            store.next_id(now_ms),
            service.title(),
            VOICE_CUSTOMER_NAME,
            self.mobile_number(),
            wage,
            VOICE_BOOKING_TIME,
        )
        .with_location(location)
    }

    fn mobile_number(&mut self) -> String {
        format!("98{}", self.rng.gen_range(1_000_000..=9_999_999u32))
    }
}

fn list_services_reply(store: &ListingStore) -> String {
    let titles = store.distinct_titles(MAX_LISTED_SERVICES);
    let list = if titles.is_empty() {
        "No services yet".to_string()
    } else {
        titles.join(", ")
    };
    let example = titles
        .first()
        .map(|t| t.to_lowercase())
        .unwrap_or_else(|| SERVICE_CATEGORIES[0].name.to_string());
    format!("Available: {}. Kahiye \"{} book karo\"", list, example)
}
