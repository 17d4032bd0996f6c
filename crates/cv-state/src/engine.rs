//! State engine
//!
//! Owns the visitor's view state and is the only place it changes. Startup
//! layers, lowest precedence first:
//!
//! 1. config defaults
//! 2. adaptation defaults (`apply_adaptation`)
//! 3. persisted state (`apply_state`)
//! 4. URL delta (`apply_difference_in_state`)
//!
//! Input from URLs, storage and adaptation files is untrusted: every toggle,
//! tab and placeholder is validated against the config and dropped with a
//! warning when unknown, while the rest of the input still applies.
//!
//! Each public mutation builds the next state on a copy and swaps it in, then
//! notifies subscribers, so a half-merged state is never observable.

use std::collections::BTreeMap;
use std::fmt;

use crate::{
    AdaptationDefaults, Config, PagePresence, PlaceholderRegistry, PlaceholderSource,
    StateDelta, ToggleVisibility, ViewState,
};

type Listener = Box<dyn FnMut(&ViewState)>;

pub struct StateEngine {
    config: Config,
    registry: PlaceholderRegistry,
    adaptation: Option<AdaptationDefaults>,
    state: ViewState,
    listeners: Vec<Listener>,
}

impl fmt::Debug for StateEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateEngine")
            .field("state", &self.state)
            .field("adaptation", &self.adaptation)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl StateEngine {
    /// Engine seeded with the config defaults
    pub fn new(config: Config) -> Self {
        let registry = PlaceholderRegistry::from_config(&config);
        let mut engine = Self {
            config,
            registry,
            adaptation: None,
            state: ViewState::default(),
            listeners: Vec::new(),
        };
        engine.state = engine.compute_defaults();
        engine
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &PlaceholderRegistry {
        &self.registry
    }

    /// Current state
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Owned copy of the current state
    pub fn snapshot(&self) -> ViewState {
        self.state.clone()
    }

    /// Called with the new state after every mutation
    pub fn subscribe(&mut self, listener: impl FnMut(&ViewState) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn commit(&mut self, next: ViewState) {
        let changed = next != self.state;
        self.state = next;
        if changed {
            for listener in &mut self.listeners {
                listener(&self.state);
            }
        }
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Canonical id of a configured toggle (case-insensitive lookup)
    pub fn validate_toggle(&self, toggle_id: &str) -> Option<String> {
        let found = self.config.find_toggle(toggle_id).map(|t| t.toggle_id.clone());
        if found.is_none() {
            tracing::warn!("Ignoring unknown toggle {:?}", toggle_id);
        }
        found
    }

    /// Whether `tab_id` is a tab of `group_id`
    pub fn validate_tab(&self, group_id: &str, tab_id: &str) -> bool {
        let valid = self
            .config
            .find_tab_group(group_id)
            .is_some_and(|g| g.find_tab(tab_id).is_some());
        if !valid {
            tracing::warn!("Ignoring invalid tab {}:{}", group_id, tab_id);
        }
        valid
    }

    fn validate_tabs(&self, tabs: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        tabs.iter()
            .filter(|(g, t)| self.validate_tab(g, t))
            .map(|(g, t)| (g.clone(), t.clone()))
            .collect()
    }

    fn apply_toggle_list(&self, state: &mut ViewState, ids: &[String], visibility: ToggleVisibility) {
        for id in ids {
            if let Some(id) = self.validate_toggle(id) {
                state.set_visibility(&id, visibility);
            }
        }
    }

    /// Value the group's linked placeholder takes for a tab
    ///
    /// `None` when the group has no tab-derived placeholder (including when
    /// the config defines the same name itself) or the tab carries no value.
    fn derived_placeholder(&self, group_id: &str, tab_id: &str) -> Option<(String, String)> {
        let def = self.registry.for_tab_group(group_id)?;
        let tab = self.config.find_tab_group(group_id)?.find_tab(tab_id)?;
        let value = tab.placeholder_value.clone()?;
        Some((def.name.clone(), value))
    }

    // ------------------------------------------------------------------
    // Layers
    // ------------------------------------------------------------------

    fn config_defaults(&self) -> ViewState {
        let mut state = ViewState::default();

        for toggle in &self.config.toggles {
            state.set_visibility(&toggle.toggle_id, toggle.default);
        }

        for group in &self.config.tab_groups {
            let Some(tab) = group.default_tab() else {
                continue;
            };
            state.tabs.insert(group.group_id.clone(), tab.tab_id.clone());
            if let Some((name, value)) = self.derived_placeholder(&group.group_id, &tab.tab_id) {
                state.placeholders.insert(name, value);
            }
        }

        for def in self.registry.iter() {
            if def.source != PlaceholderSource::Config {
                continue;
            }
            if let Some(value) = &def.default_value {
                state.placeholders.insert(def.name.clone(), value.clone());
            }
        }

        state
    }

    fn overlay_adaptation(&self, state: &mut ViewState, defaults: &AdaptationDefaults) {
        for (id, visibility) in &defaults.toggles {
            if let Some(id) = self.validate_toggle(id) {
                state.set_visibility(&id, *visibility);
            }
        }
        state.placeholders.extend(self.registry.filter_values(&defaults.placeholders));
    }

    /// Config defaults with the active adaptation on top
    pub fn compute_defaults(&self) -> ViewState {
        let mut state = self.config_defaults();
        if let Some(defaults) = &self.adaptation {
            self.overlay_adaptation(&mut state, defaults);
        }
        state
    }

    /// Put back the config default for every value the previous adaptation
    /// set, unless the visitor has changed it since.
    fn withdraw_adaptation(&self, state: &mut ViewState, previous: &AdaptationDefaults) {
        let applied = self.compute_defaults();
        let base = self.config_defaults();

        for id in previous.toggles.keys() {
            let Some(toggle) = self.config.find_toggle(id) else {
                continue;
            };
            let id = &toggle.toggle_id;
            if state.visibility(id) == applied.visibility(id) {
                state.set_visibility(id, base.visibility(id));
            }
        }

        for name in previous.placeholders.keys() {
            if !self.registry.contains(name) || state.placeholder(name) != applied.placeholder(name) {
                continue;
            }
            match base.placeholders.get(name) {
                Some(value) => {
                    state.placeholders.insert(name.clone(), value.clone());
                }
                None => {
                    state.placeholders.remove(name);
                }
            }
        }
    }

    /// Select (or clear) the adaptation overlay and merge it into the state
    ///
    /// Values the previous adaptation set fall back to the config defaults
    /// first, so nothing of it outlives a switch or a clear.
    pub fn apply_adaptation(&mut self, defaults: Option<AdaptationDefaults>) {
        let mut next = self.state.clone();
        if let Some(previous) = &self.adaptation {
            self.withdraw_adaptation(&mut next, previous);
        }
        self.adaptation = defaults;
        if let Some(defaults) = &self.adaptation {
            tracing::debug!(
                "Applying adaptation defaults: {} toggles, {} placeholders",
                defaults.toggles.len(),
                defaults.placeholders.len()
            );
            self.overlay_adaptation(&mut next, defaults);
        }
        self.commit(next);
    }

    /// Replace the state with a persisted one
    ///
    /// Starts from fresh defaults and layers each field the blob carries. The
    /// two toggle lists replace the defaults together when either is present.
    /// Tab-linked placeholders the blob does not set are derived from the
    /// restored tabs.
    pub fn apply_state(&mut self, persisted: &StateDelta) {
        let mut next = self.compute_defaults();

        if let Some(tabs) = &persisted.tabs {
            next.tabs.extend(self.validate_tabs(tabs));
        }
        if let Some(values) = &persisted.placeholders {
            next.placeholders.extend(self.registry.filter_values(values));
        }
        if persisted.has_toggles() {
            next.shown_toggles.clear();
            next.peek_toggles.clear();
            let lists = [
                (&persisted.shown_toggles, ToggleVisibility::Show),
                (&persisted.peek_toggles, ToggleVisibility::Peek),
                (&persisted.hidden_toggles, ToggleVisibility::Hide),
            ];
            for (ids, visibility) in lists {
                if let Some(ids) = ids {
                    self.apply_toggle_list(&mut next, ids, visibility);
                }
            }
        }

        let explicit = persisted.placeholders.as_ref();
        for (group_id, tab_id) in &next.tabs.clone() {
            if let Some((name, value)) = self.derived_placeholder(group_id, tab_id) {
                if !explicit.is_some_and(|p| p.contains_key(&name)) {
                    next.placeholders.insert(name, value);
                }
            }
        }

        self.commit(next);
    }

    /// Apply a sparse delta on top of the current state
    ///
    /// Only mentioned toggles move (hide last, so it wins over show/peek for
    /// an id listed twice). Tabs and placeholders merge. A tab change
    /// re-derives its linked placeholder unless the delta sets that
    /// placeholder too.
    pub fn apply_difference_in_state(&mut self, delta: &StateDelta) {
        let mut next = self.state.clone();

        let lists = [
            (&delta.shown_toggles, ToggleVisibility::Show),
            (&delta.peek_toggles, ToggleVisibility::Peek),
            (&delta.hidden_toggles, ToggleVisibility::Hide),
        ];
        for (ids, visibility) in lists {
            if let Some(ids) = ids {
                self.apply_toggle_list(&mut next, ids, visibility);
            }
        }

        let tabs = delta.tabs.as_ref().map(|t| self.validate_tabs(t)).unwrap_or_default();
        next.tabs.extend(tabs.clone());

        let explicit = delta
            .placeholders
            .as_ref()
            .map(|p| self.registry.filter_values(p))
            .unwrap_or_default();
        next.placeholders.extend(explicit.clone());

        for (group_id, tab_id) in &tabs {
            if let Some((name, value)) = self.derived_placeholder(group_id, tab_id) {
                if !explicit.contains_key(&name) {
                    next.placeholders.insert(name, value);
                }
            }
        }

        self.commit(next);
    }

    // ------------------------------------------------------------------
    // Visitor edits
    // ------------------------------------------------------------------

    /// Replace the shown and peek lists
    ///
    /// An id in both lists ends up peeked (last write wins).
    pub fn set_toggles<S: AsRef<str>>(&mut self, shown: &[S], peek: &[S]) {
        let mut next = self.state.clone();
        next.shown_toggles.clear();
        next.peek_toggles.clear();
        for (ids, visibility) in [(shown, ToggleVisibility::Show), (peek, ToggleVisibility::Peek)] {
            for id in ids {
                if let Some(id) = self.validate_toggle(id.as_ref()) {
                    next.set_visibility(&id, visibility);
                }
            }
        }
        self.commit(next);
    }

    /// Change one toggle
    pub fn set_toggle_visibility(&mut self, toggle_id: &str, visibility: ToggleVisibility) -> bool {
        let Some(id) = self.validate_toggle(toggle_id) else {
            return false;
        };
        let mut next = self.state.clone();
        next.set_visibility(&id, visibility);
        self.commit(next);
        true
    }

    /// Pin a tab and cascade into its linked placeholder
    pub fn set_pinned_tab(&mut self, group_id: &str, tab_id: &str) -> bool {
        if !self.validate_tab(group_id, tab_id) {
            return false;
        }
        let mut next = self.state.clone();
        next.tabs.insert(group_id.to_string(), tab_id.to_string());
        if let Some((name, value)) = self.derived_placeholder(group_id, tab_id) {
            next.placeholders.insert(name, value);
        }
        self.commit(next);
        true
    }

    /// Set a placeholder value typed by the visitor
    pub fn set_placeholder(&mut self, name: &str, value: &str) -> bool {
        if !self.registry.contains(name) {
            tracing::warn!("Ignoring unknown placeholder {:?}", name);
            return false;
        }
        let mut next = self.state.clone();
        next.placeholders.insert(name.to_string(), value.to_string());
        self.commit(next);
        true
    }

    /// Back to config + adaptation defaults
    pub fn reset_to_defaults(&mut self) {
        let next = self.compute_defaults();
        self.commit(next);
    }

    /// The part of the state worth putting in a link for this page
    pub fn shareable_state(&self, presence: &PagePresence) -> StateDelta {
        crate::compute_shareable_state(&self.state, &self.config, &self.registry, presence)
    }
}
