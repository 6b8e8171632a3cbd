//! Ordered keyword rules mapping a transcript to a command
//!
//! Matching is plain substring containment on the lower-cased transcript.
//! Rules run top to bottom and the first hit wins, so overlapping keywords
//! resolve by position in `RULES` alone.

use tracing::debug;

/// A bookable service and the words that trigger it
#[derive(Debug, PartialEq, Eq)]
pub struct ServiceCategory {
    /// Lower-case service name, also used to find earlier gigs
    pub name: &'static str,
    /// Latin and Devanagari trigger words
    pub keywords: &'static [&'static str],
}

impl ServiceCategory {
    /// The name with its first letter upper-cased, used as the work title
    pub fn title(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn matches(&self, command: &str) -> bool {
        contains_any(command, self.keywords)
    }
}

pub static SERVICE_CATEGORIES: &[ServiceCategory] = &[
    ServiceCategory {
        name: "plumber",
        keywords: &["plumber", "प्लंबर", "pipe", "leak", "tap", "नल"],
    },
    ServiceCategory {
        name: "electrician",
        keywords: &["electrician", "इलेक्ट्रीशियन", "fuse", "light", "fan", "बिजली"],
    },
    ServiceCategory {
        name: "painter",
        keywords: &["painter", "पेंटर", "paint", "रंग"],
    },
];

pub const LIST_SERVICES_KEYWORDS: &[&str] = &["service", "kya", "सर्विस"];
pub const OPEN_FORM_KEYWORDS: &[&str] = &["post", "gig", "daalo", "form"];
pub const SHOW_LISTINGS_KEYWORDS: &[&str] = &["gigs", "show", "dikhao"];
pub const DELETE_KEYWORDS: &[&str] = &["delete", "हटाओ"];
pub const GREETING_KEYWORDS: &[&str] = &["hello", "hi", "नमस्ते"];

/// The action a transcript resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ListServices,
    BookService(&'static ServiceCategory),
    OpenForm,
    ShowListings,
    DeleteLast,
    Greeting,
    Fallback,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::ListServices => "list_services",
            Command::BookService(_) => "book_service",
            Command::OpenForm => "open_form",
            Command::ShowListings => "show_listings",
            Command::DeleteLast => "delete_last",
            Command::Greeting => "greeting",
            Command::Fallback => "fallback",
        }
    }
}

/// One (predicate, command) pair
pub struct Rule {
    pub name: &'static str,
    matcher: fn(&str) -> Option<Command>,
}

impl Rule {
    pub fn apply(&self, command: &str) -> Option<Command> {
        (self.matcher)(command)
    }
}

fn keyword_rule(keywords: &[&str], command: Command, text: &str) -> Option<Command> {
    contains_any(text, keywords).then_some(command)
}

pub static RULES: &[Rule] = &[
    Rule {
        name: "list_services",
        matcher: |t| keyword_rule(LIST_SERVICES_KEYWORDS, Command::ListServices, t),
    },
    Rule {
        name: "book_service",
        matcher: |t| {
            SERVICE_CATEGORIES
                .iter()
                .find(|s| s.matches(t))
                .map(Command::BookService)
        },
    },
    Rule {
        name: "open_form",
        matcher: |t| keyword_rule(OPEN_FORM_KEYWORDS, Command::OpenForm, t),
    },
    Rule {
        name: "show_listings",
        matcher: |t| keyword_rule(SHOW_LISTINGS_KEYWORDS, Command::ShowListings, t),
    },
    Rule {
        name: "delete_last",
        matcher: |t| keyword_rule(DELETE_KEYWORDS, Command::DeleteLast, t),
    },
    Rule {
        name: "greeting",
        matcher: |t| keyword_rule(GREETING_KEYWORDS, Command::Greeting, t),
    },
];

pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| text.contains(kw))
}

pub fn normalize(transcript: &str) -> String {
    transcript.trim().to_lowercase()
}

/// Resolve a transcript to exactly one command
pub fn interpret(transcript: &str) -> Command {
    let text = normalize(transcript);
    for rule in RULES {
        if let Some(command) = rule.apply(&text) {
            debug!("'{}' matched rule {}", text, rule.name);
            return command;
        }
    }
    debug!("'{}' matched no rule", text);
    Command::Fallback
}
