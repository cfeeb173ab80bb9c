use crate::domain::config::{EventConfig, ModuleSettings};
use std::collections::BTreeMap;

pub const RSVP: &str = "rsvp";
pub const GALLERY: &str = "gallery";
pub const DONATION: &str = "donation";
pub const GUESTBOOK: &str = "guestbook";
pub const PLAYLIST: &str = "playlist";
pub const SEATING_PLAN: &str = "seating_plan";
pub const INVITATION_GROUPS: &str = "invitation_groups";

// Absent modules are disabled.
pub fn is_module_enabled(modules: &BTreeMap<String, ModuleSettings>, name: &str) -> bool {
    modules.get(name).is_some_and(|module| module.enabled)
}

// Wedding mode swaps in the personalized program/RSVP and gates on identification.
pub fn is_wedding_mode(config: &EventConfig) -> bool {
    is_module_enabled(&config.modules, INVITATION_GROUPS)
        || config.event.event_type == "wedding"
        || config.event_type.as_deref() == Some("wedding")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Program,
    PersonalizedProgram,
    Rsvp,
    SubEventRsvp,
    Gallery,
    Info,
    More,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Home => "Home",
            Tab::Program | Tab::PersonalizedProgram => "Program",
            Tab::Rsvp | Tab::SubEventRsvp => "RSVP",
            Tab::Gallery => "Photos",
            Tab::Info => "Info",
            Tab::More => "More",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoreItem {
    Donation,
    Guestbook,
    Playlist,
    Seating,
}

impl MoreItem {
    pub fn module(&self) -> &'static str {
        match self {
            MoreItem::Donation => DONATION,
            MoreItem::Guestbook => GUESTBOOK,
            MoreItem::Playlist => PLAYLIST,
            MoreItem::Seating => SEATING_PLAN,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            MoreItem::Donation => "Donations",
            MoreItem::Guestbook => "Guestbook",
            MoreItem::Playlist => "Playlist",
            MoreItem::Seating => "Seating plan",
        }
    }
}

const MORE_ITEMS: [MoreItem; 4] = [
    MoreItem::Donation,
    MoreItem::Guestbook,
    MoreItem::Playlist,
    MoreItem::Seating,
];

// Screens reachable for the current config and session. Recomputed whenever
// either changes; never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    IdentificationRequired,
    Tabs { tabs: Vec<Tab>, more: Vec<MoreItem> },
}

impl Navigation {
    pub fn derive(config: &EventConfig, identified: bool) -> Self {
        let wedding = is_wedding_mode(config);
        if wedding && !identified {
            return Navigation::IdentificationRequired;
        }

        let enabled = |name: &str| is_module_enabled(&config.modules, name);
        let more: Vec<MoreItem> = MORE_ITEMS
            .into_iter()
            .filter(|item| enabled(item.module()))
            .collect();

        let mut tabs = vec![Tab::Home];
        tabs.push(if wedding {
            Tab::PersonalizedProgram
        } else {
            Tab::Program
        });
        if enabled(RSVP) {
            tabs.push(if wedding { Tab::SubEventRsvp } else { Tab::Rsvp });
        }
        if enabled(GALLERY) {
            tabs.push(Tab::Gallery);
        }
        tabs.push(Tab::Info);
        if !more.is_empty() {
            tabs.push(Tab::More);
        }

        Navigation::Tabs { tabs, more }
    }

    pub fn tabs(&self) -> &[Tab] {
        match self {
            Navigation::IdentificationRequired => &[],
            Navigation::Tabs { tabs, .. } => tabs,
        }
    }
}
