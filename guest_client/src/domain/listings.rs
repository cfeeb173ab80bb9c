use crate::domain::config::ModuleSettings;
use crate::domain::engagement::PlaylistSuggestion;
use crate::domain::guest::SubEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Sub-events of one day, ordered by start time.
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup {
    // None collects sub-events without a date; that group sorts last.
    pub date: Option<String>,
    pub events: Vec<SubEvent>,
}

pub fn group_program_by_day(sub_events: &[SubEvent]) -> Vec<DayGroup> {
    let mut dated: BTreeMap<String, Vec<SubEvent>> = BTreeMap::new();
    let mut undated = Vec::new();

    for event in sub_events {
        match event.date.as_deref().filter(|d| !d.is_empty()) {
            // Keep only the day part so full timestamps group with bare dates.
            Some(date) => dated
                .entry(date.chars().take(10).collect())
                .or_default()
                .push(event.clone()),
            None => undated.push(event.clone()),
        }
    }

    let mut groups: Vec<DayGroup> = dated
        .into_iter()
        .map(|(date, events)| DayGroup {
            date: Some(date),
            events,
        })
        .collect();
    if !undated.is_empty() {
        groups.push(DayGroup {
            date: None,
            events: undated,
        });
    }

    for group in &mut groups {
        // Stable sort; events without a start time go last.
        group
            .events
            .sort_by(|a, b| match (a.start_time.as_deref(), b.start_time.as_deref()) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            });
    }

    groups
}

// Playlist suggestions with this device's votes layered on top.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntry {
    pub suggestion: PlaylistSuggestion,
    pub votes: u32,
    pub voted: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaylistBoard {
    entries: Vec<PlaylistEntry>,
}

impl PlaylistBoard {
    pub fn new(suggestions: Vec<PlaylistSuggestion>) -> Self {
        let entries = suggestions
            .into_iter()
            .map(|suggestion| PlaylistEntry {
                votes: suggestion.votes,
                voted: false,
                suggestion,
            })
            .collect();
        Self { entries }
    }

    // A freshly suggested song starts with the suggester's own vote.
    pub fn add_own(&mut self, suggestion: PlaylistSuggestion) {
        let votes = suggestion.votes.max(1);
        self.entries.insert(
            0,
            PlaylistEntry {
                suggestion,
                votes,
                voted: true,
            },
        );
    }

    // Returns the new vote state, or None when the id is unknown.
    pub fn toggle_vote(&mut self, id: &str) -> Option<bool> {
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.suggestion.id == id)?;
        if entry.voted {
            entry.votes = entry.votes.saturating_sub(1);
        } else {
            entry.votes += 1;
        }
        entry.voted = !entry.voted;
        Some(entry.voted)
    }

    // Case-insensitive title/artist filter, most votes first, ties keep order.
    pub fn ranked(&self, query: &str) -> Vec<&PlaylistEntry> {
        let needle = query.trim().to_lowercase();
        let mut matches: Vec<&PlaylistEntry> = self
            .entries
            .iter()
            .filter(|entry| {
                needle.is_empty()
                    || entry.suggestion.song_title.to_lowercase().contains(&needle)
                    || entry
                        .suggestion
                        .artist
                        .as_deref()
                        .is_some_and(|artist| artist.to_lowercase().contains(&needle))
            })
            .collect();
        matches.sort_by(|a, b| b.votes.cmp(&a.votes));
        matches
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeatingTable {
    pub name: String,
    #[serde(default)]
    pub guests: Vec<String>,
}

// Table layout published through the seating_plan module options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeatingPlan {
    pub tables: Vec<SeatingTable>,
}

impl SeatingPlan {
    pub fn from_module(module: &ModuleSettings) -> Self {
        Self {
            tables: module.option_as("tables").unwrap_or_default(),
        }
    }

    // Tables whose name or any guest matches the query, case-insensitively.
    pub fn search(&self, query: &str) -> Vec<&SeatingTable> {
        let needle = query.trim().to_lowercase();
        self.tables
            .iter()
            .filter(|table| {
                needle.is_empty()
                    || table.name.to_lowercase().contains(&needle)
                    || table
                        .guests
                        .iter()
                        .any(|guest| guest.to_lowercase().contains(&needle))
            })
            .collect()
    }

    // Exact (case-insensitive) guest lookup.
    pub fn table_for(&self, guest_name: &str) -> Option<&SeatingTable> {
        let wanted = guest_name.trim().to_lowercase();
        self.tables.iter().find(|table| {
            table
                .guests
                .iter()
                .any(|guest| guest.trim().to_lowercase() == wanted)
        })
    }
}
