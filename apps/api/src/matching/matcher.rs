//! Pairs recipients with generated links.
//!
//! Links are keyed by the normalised identity recovered from the URL.
//! Each recipient offers a short list of name spellings (candidate keys) in
//! priority order; the first one present in the lookup wins and the link is
//! removed, so one link is handed to at most one recipient per run.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::matching::normalize::{normalize, NameKey};
use crate::models::{DashboardLink, Department, EmployeeRecord, RecipientRecord};

/// Owned, consumable table of links keyed by normalised identity.
#[derive(Debug, Default)]
pub struct LinkLookup {
    links: HashMap<NameKey, DashboardLink>,
}

impl LinkLookup {
    /// Links whose key normalises to empty are left out; when two keys
    /// normalise alike the first one is kept.
    pub fn new<I>(links: I) -> Self
    where
        I: IntoIterator<Item = DashboardLink>,
    {
        let mut map = HashMap::new();
        for link in links {
            let key = normalize(&link.employee_key);
            if key.is_empty() {
                continue;
            }
            map.entry(key).or_insert(link);
        }
        Self { links: map }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    fn take(&mut self, key: &NameKey) -> Option<DashboardLink> {
        if key.is_empty() {
            return None;
        }
        self.links.remove(key)
    }
}

/// Name spellings to try for a recipient, best first, without duplicates.
///
/// Staff: assembled full name, first+last, the source row's first+last and
/// last+first. Managers: assembled full name, first+last, the source row's
/// manager name. Staff never fall back to their manager's name.
pub fn candidate_keys(recipient: &RecipientRecord) -> Vec<NameKey> {
    let source = &recipient.source;
    let mut raw = vec![
        recipient.full_name.clone(),
        format!("{} {}", recipient.first_name, recipient.last_name),
    ];

    match recipient.audience {
        Department::Sc | Department::ScTest => {
            raw.push(format!("{} {}", source.sc_firstname, source.sc_lastname));
            raw.push(format!("{} {}", source.sc_lastname, source.sc_firstname));
        }
        Department::Grm => raw.push(source.grm_name.clone()),
    }

    let mut keys: Vec<NameKey> = Vec::with_capacity(raw.len());
    for candidate in raw {
        let key = normalize(&candidate);
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// Claims the recipient's link from `lookup`, consuming it.
///
/// `None` when no candidate matches or the matched link has no URL; in the
/// latter case the link is still consumed.
pub fn resolve(recipient: &RecipientRecord, lookup: &mut LinkLookup) -> Option<DashboardLink> {
    for key in candidate_keys(recipient) {
        let Some(link) = lookup.take(&key) else {
            continue;
        };
        if link.url.trim().is_empty() {
            warn!("Link for '{key}' has no URL; skipping {}", recipient.email);
            return None;
        }
        debug!("Matched {} via '{key}'", recipient.email);
        return Some(link);
    }
    None
}

/// Outcome of matching a whole recipient list.
#[derive(Debug, Default)]
pub struct MatchOutcome {
    pub matched: Vec<(RecipientRecord, DashboardLink)>,
    pub skipped: Vec<EmployeeRecord>,
}

/// Matches every recipient in order. Runs to completion before any dispatch.
pub fn match_recipients(recipients: Vec<RecipientRecord>, mut lookup: LinkLookup) -> MatchOutcome {
    let mut outcome = MatchOutcome::default();
    for recipient in recipients {
        match resolve(&recipient, &mut lookup) {
            Some(link) => outcome.matched.push((recipient, link)),
            None => {
                warn!("No dashboard link matched {}", recipient.email);
                outcome.skipped.push(recipient.source);
            }
        }
    }
    if !lookup.is_empty() {
        debug!("{} links left unclaimed", lookup.len());
    }
    outcome
}
