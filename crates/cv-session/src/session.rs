//! Session - one visitor on one page

use cv_dom::{Document, DomTree, MutationRecord, NodeId};
use cv_focus::ExclusionRules;
use cv_state::url_codec;
use cv_state::{
    Adaptation, AdaptationCatalog, CLEAR_ADAPTATION, Config, PagePresence, PersistentStore,
    PlaceholderDefinition, StateEngine, StorageBackend, ToggleVisibility, ViewState,
};
use url::Url;

use crate::assets::{Asset, AssetCatalog};
use crate::focus::{self, FocusMode, FocusPlan};
use crate::{Notice, scan};

const ADAPT_PARAM: &str = "adapt";
const ADAPTATION_META: &str = "cv-adaptation";

/// Everything the site ships
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub config: Config,
    pub adaptations: AdaptationCatalog,
    pub assets: AssetCatalog,
}

impl SessionOptions {
    pub fn new(config: Config) -> Self {
        Self { config, ..Self::default() }
    }

    pub fn with_adaptations(mut self, adaptations: AdaptationCatalog) -> Self {
        self.adaptations = adaptations;
        self
    }

    pub fn with_assets(mut self, assets: AssetCatalog) -> Self {
        self.assets = assets;
        self
    }
}

/// Per-page CustomViews context
#[derive(Debug)]
pub struct Session<B: StorageBackend> {
    engine: StateEngine,
    store: PersistentStore<B>,
    adaptations: AdaptationCatalog,
    active_adaptation: Option<String>,
    assets: AssetCatalog,
    exclusions: ExclusionRules,
    presence: PagePresence,
    notices: Vec<Notice>,
}

impl<B: StorageBackend> Session<B> {
    /// Resolve the starting state for `doc` and persist it
    ///
    /// Layers, lowest first: config defaults, the selected adaptation, the
    /// stored state, the managed parameters of the page URL.
    pub fn start(options: SessionOptions, backend: B, doc: &Document) -> Self {
        let SessionOptions { config, adaptations, assets } = options;
        let exclusions = ExclusionRules::new(
            config.share_exclusions.tags.as_slice(),
            config.share_exclusions.ids.as_slice(),
        );
        let mut store = PersistentStore::new(backend, config.storage_key());
        let mut engine = StateEngine::new(config);

        let url = match Url::parse(doc.url()) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("Unparseable page URL {:?}: {}", doc.url(), e);
                None
            }
        };

        let active_adaptation = select_adaptation(&adaptations, &mut store, url.as_ref(), doc);
        if let Some(adaptation) = active_adaptation.as_deref().and_then(|id| adaptations.get(id)) {
            tracing::info!("Using adaptation {:?}", adaptation.id);
            engine.apply_adaptation(Some(adaptation.defaults.clone()));
        }

        if let Some(persisted) = store.load_state() {
            engine.apply_state(&persisted);
        }

        let delta = url_codec::decode(url.as_ref().and_then(Url::query).unwrap_or_default());
        if !delta.is_empty() {
            tracing::debug!("Applying URL state {:?}", delta);
            engine.apply_difference_in_state(&delta);
        }

        store.save_state(engine.state());

        Self {
            engine,
            store,
            adaptations,
            active_adaptation,
            assets,
            exclusions,
            presence: scan::page_presence(doc),
            notices: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    pub fn state(&self) -> &ViewState {
        self.engine.state()
    }

    pub fn engine(&self) -> &StateEngine {
        &self.engine
    }

    pub fn config(&self) -> &Config {
        self.engine.config()
    }

    pub fn store(&self) -> &PersistentStore<B> {
        &self.store
    }

    /// Called with the new state after every change
    pub fn subscribe(&mut self, listener: impl FnMut(&ViewState) + 'static) {
        self.engine.subscribe(listener);
    }

    fn persist(&mut self) {
        self.store.save_state(self.engine.state());
    }

    pub fn set_toggle_visibility(&mut self, toggle_id: &str, visibility: ToggleVisibility) -> bool {
        let applied = self.engine.set_toggle_visibility(toggle_id, visibility);
        if applied {
            self.persist();
        }
        applied
    }

    pub fn set_toggles<S: AsRef<str>>(&mut self, shown: &[S], peek: &[S]) {
        self.engine.set_toggles(shown, peek);
        self.persist();
    }

    pub fn set_pinned_tab(&mut self, group_id: &str, tab_id: &str) -> bool {
        let applied = self.engine.set_pinned_tab(group_id, tab_id);
        if applied {
            self.persist();
        }
        applied
    }

    pub fn set_placeholder(&mut self, name: &str, value: &str) -> bool {
        let applied = self.engine.set_placeholder(name, value);
        if applied {
            self.persist();
        }
        applied
    }

    /// Back to config + adaptation defaults
    ///
    /// Also forgets the UI flags; the adaptation choice is kept.
    pub fn reset_to_defaults(&mut self) {
        self.store.clear_all();
        self.store.set_adaptation_id(self.active_adaptation.as_deref());
        self.engine.reset_to_defaults();
        self.persist();
    }

    // ------------------------------------------------------------------
    // Adaptations
    // ------------------------------------------------------------------

    pub fn active_adaptation(&self) -> Option<&Adaptation> {
        self.active_adaptation.as_deref().and_then(|id| self.adaptations.get(id))
    }

    /// Switch adaptation (`None` clears it); unknown ids are refused
    pub fn select_adaptation(&mut self, id: Option<&str>) -> bool {
        let defaults = match id {
            Some(id) => match self.adaptations.get(id) {
                Some(adaptation) => Some(adaptation.defaults.clone()),
                None => {
                    tracing::warn!("Unknown adaptation {:?}", id);
                    return false;
                }
            },
            None => None,
        };
        self.active_adaptation = id.map(str::to_string);
        self.store.set_adaptation_id(id);
        self.engine.apply_adaptation(defaults);
        self.persist();
        true
    }

    // ------------------------------------------------------------------
    // Page content
    // ------------------------------------------------------------------

    /// What the last scan found on the page
    pub fn page_presence(&self) -> &PagePresence {
        &self.presence
    }

    pub fn rescan(&mut self, doc: &Document) {
        self.presence = scan::page_presence(doc);
    }

    /// React to DOM changes; returns local placeholders that just appeared
    ///
    /// Any content change, removals included, triggers a rescan.
    pub fn handle_mutations(&mut self, doc: &Document, records: &[MutationRecord]) -> Vec<String> {
        let content_changed = records
            .iter()
            .any(|r| r.adds_content() || !r.removed_nodes.is_empty());
        if !content_changed {
            return Vec::new();
        }
        let previous = std::mem::replace(&mut self.presence, scan::page_presence(doc));
        let registry = self.engine.registry();
        let found: Vec<String> = self
            .presence
            .placeholders
            .difference(&previous.placeholders)
            .filter(|name| registry.get(name).is_some_and(|d| d.is_local))
            .cloned()
            .collect();
        if !found.is_empty() {
            tracing::info!("New local placeholders on page: {:?}", found);
            self.notices.push(Notice::PlaceholdersDetected(found.clone()));
        }
        found
    }

    /// Placeholders the settings panel offers on this page
    pub fn settings_placeholders(&self) -> Vec<&PlaceholderDefinition> {
        self.engine.registry().settings_entries(&self.presence.placeholders).collect()
    }

    /// `text` with `[[name]]` tokens replaced by current values
    pub fn render_text(&self, text: &str) -> String {
        self.engine.registry().substitute(text, &self.engine.state().placeholders)
    }

    pub fn asset(&self, key: &str) -> Option<&Asset> {
        self.assets.get(key)
    }

    // ------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------

    /// Page URL carrying the shareable part of the state
    pub fn share_url(&self, doc: &Document) -> crate::Result<String> {
        let presence = scan::page_presence(doc);
        let delta = self.engine.shareable_state(&presence);
        Ok(url_codec::apply_to_url(doc.url(), &delta)?)
    }

    /// Whether an element is off limits for share and focus
    pub fn is_excluded(&self, tree: &DomTree, node: NodeId) -> bool {
        self.exclusions.is_excluded(tree, node)
    }

    /// Focus link for the selected elements; excluded ones are dropped
    pub fn focus_link(&self, doc: &Document, mode: FocusMode, elements: &[NodeId], base: &str) -> crate::Result<String> {
        let kept: Vec<NodeId> = elements
            .iter()
            .copied()
            .filter(|&e| !self.is_excluded(doc.tree(), e))
            .collect();
        if kept.len() < elements.len() {
            tracing::debug!("Dropped {} excluded elements from focus link", elements.len() - kept.len());
        }
        focus::focus_link(doc, mode, &kept, base)
    }

    /// Plan the focus view a URL asks for
    ///
    /// Queues a notice when some sections are missing; when none resolve the
    /// plan is `None` and the page stays as it is.
    pub fn apply_focus(&mut self, doc: &Document, url: &str) -> Option<FocusPlan> {
        let (mode, descriptors) = focus::read_focus_param(url)?;
        let plan = focus::plan_focus(doc, mode, &descriptors, |n| {
            self.exclusions.is_excluded(doc.tree(), n)
        });
        match plan {
            None => {
                self.notices.push(Notice::FocusAborted);
                None
            }
            Some(plan) => {
                if plan.missing > 0 {
                    self.notices.push(Notice::MissingSections {
                        missing: plan.missing,
                        total: descriptors.len(),
                    });
                }
                Some(plan)
            }
        }
    }

    /// Drain queued notices
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // ------------------------------------------------------------------
    // UI flags
    // ------------------------------------------------------------------

    pub fn tab_nav_visible(&self) -> bool {
        self.store.tab_nav_visible().unwrap_or(true)
    }

    pub fn set_tab_nav_visible(&mut self, visible: bool) {
        self.store.set_tab_nav_visible(visible);
    }

    pub fn settings_icon_offset(&self) -> Option<f64> {
        self.store.settings_icon_offset()
    }

    pub fn set_settings_icon_offset(&mut self, offset: f64) {
        self.store.set_settings_icon_offset(offset);
    }

    pub fn intro_seen(&self) -> bool {
        self.store.intro_seen()
    }

    pub fn mark_intro_seen(&mut self) {
        self.store.mark_intro_seen();
    }
}

/// URL `adapt=<id>` > URL `adapt=clear` > meta tag > stored choice
fn select_adaptation<B: StorageBackend>(
    catalog: &AdaptationCatalog,
    store: &mut PersistentStore<B>,
    url: Option<&Url>,
    doc: &Document,
) -> Option<String> {
    let known = |id: &str| {
        let found = catalog.get(id).is_some();
        if !found {
            tracing::warn!("Unknown adaptation {:?}", id);
        }
        found
    };

    let requested = url.and_then(|u| {
        u.query_pairs()
            .find(|(key, _)| key == ADAPT_PARAM)
            .map(|(_, value)| value.into_owned())
    });
    match requested.as_deref() {
        Some(CLEAR_ADAPTATION) => {
            store.set_adaptation_id(None);
            return None;
        }
        Some(id) => {
            if !known(id) {
                return None;
            }
            store.set_adaptation_id(Some(id));
            return Some(id.to_string());
        }
        None => {}
    }

    if let Some(id) = doc.meta_content(ADAPTATION_META) {
        return known(id).then(|| id.to_string());
    }
    store.adaptation_id().filter(|id| known(id.as_str()))
}
