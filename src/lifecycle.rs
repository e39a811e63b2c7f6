//! Request lifecycle binding.
//! Derives the domain list and store cache key from route parameters
//! and loads/saves the bound translator's cache at configured request
//! phases: Initialize → Startup → BeforeRender, terminating at Shutdown
//! after rendering or at BeforeRedirect when the request redirects.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::store::CacheStore;
use crate::translate::TranslatorContract;

/// Component name prefixed to store cache keys unless configured
/// otherwise.
pub const DEFAULT_NAME: &str = "TranslatorAutoload";

/// Request lifecycle phases, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Initialize,
    Startup,
    BeforeRender,
    BeforeRedirect,
    Shutdown,
}

impl Phase {
    /// Whether moving from `self` to `next` follows the linear request
    /// flow. A redirect may cut the flow short at any pre-terminal
    /// phase.
    pub fn can_transition_to(self, next: Phase) -> bool {
        matches!(
            (self, next),
            (Phase::Initialize, Phase::Startup)
                | (Phase::Startup, Phase::BeforeRender)
                | (Phase::BeforeRender, Phase::Shutdown)
                | (Phase::Initialize, Phase::BeforeRedirect)
                | (Phase::Startup, Phase::BeforeRedirect)
                | (Phase::BeforeRender, Phase::BeforeRedirect)
        )
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Initialize => write!(f, "initialize"),
            Phase::Startup => write!(f, "startup"),
            Phase::BeforeRender => write!(f, "before_render"),
            Phase::BeforeRedirect => write!(f, "before_redirect"),
            Phase::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// Action to run at a phase. Configured as a raw string and parsed at
/// dispatch time; anything but `load` / `save` is a configuration
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseAction {
    Load,
    Save,
}

impl PhaseAction {
    pub fn parse(raw: &str) -> Result<Self, Error> {
        match raw {
            "load" => Ok(Self::Load),
            "save" => Ok(Self::Save),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }
}

/// Route parameters the binding derives domains and the cache key from.
/// Controller and action may be empty; an absent plugin contributes no
/// prefix.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteParams {
    pub plugin: Option<String>,
    pub controller: String,
    pub action: String,
}

impl RouteParams {
    pub fn new(plugin: Option<&str>, controller: &str, action: &str) -> Self {
        Self {
            plugin: plugin.map(str::to_string),
            controller: controller.to_string(),
            action: action.to_string(),
        }
    }
}

/// Binding configuration: which action, if any, runs at each phase.
/// Action strings stay unvalidated until the phase is dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Name prefixed to store cache keys.
    pub name: String,
    /// Phase → action string ("load" / "save"); `None` and absent
    /// phases are no-ops.
    pub events: BTreeMap<Phase, Option<String>>,
}

impl Default for BindingConfig {
    /// Translations load before the controller runs and save after
    /// rendering or before a redirect.
    fn default() -> Self {
        let mut events = BTreeMap::new();
        events.insert(Phase::Initialize, Some("load".to_string()));
        events.insert(Phase::Startup, None);
        events.insert(Phase::BeforeRender, None);
        events.insert(Phase::BeforeRedirect, Some("save".to_string()));
        events.insert(Phase::Shutdown, Some("save".to_string()));
        Self {
            name: DEFAULT_NAME.to_string(),
            events,
        }
    }
}

/// Candidate domain list for a route: most specific first, deduplicated
/// preserving first occurrence, `"default"` as the final fallback.
fn derive_domains(params: &RouteParams) -> Vec<String> {
    let controller = snake_case(&params.controller);
    let action = snake_case(&params.action);
    let plugin_prefix = match params.plugin.as_deref() {
        Some(plugin) if !plugin.is_empty() => format!("{}_", snake_case(plugin)),
        _ => String::new(),
    };

    let candidates = [
        format!("{plugin_prefix}{controller}_{action}"),
        format!("{controller}_{action}"),
        format!("{plugin_prefix}{controller}"),
        controller,
        "default".to_string(),
    ];

    let mut domains: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !domains.contains(&candidate) {
            domains.push(candidate);
        }
    }
    domains
}

/// Store key for a route: `{name}.{Plugin.}{controller}.{action}`.
fn derive_cache_key(name: &str, params: &RouteParams) -> String {
    let plugin_part = match params.plugin.as_deref() {
        Some(plugin) if !plugin.is_empty() => format!("{plugin}."),
        _ => String::new(),
    };
    format!(
        "{name}.{plugin_part}{controller}.{action}",
        controller = params.controller,
        action = params.action
    )
}

/// Lower-snake a route segment (`BlogPosts` → `blog_posts`).
fn snake_case(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 4);
    for (index, ch) in segment.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if index > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Per-request glue between a translator, a cache store and the route.
/// One binding serves one request; route-derived data is computed once
/// and memoized.
pub struct RequestBinding {
    config: BindingConfig,
    params: RouteParams,
    translator: Arc<dyn TranslatorContract>,
    store: Arc<dyn CacheStore>,
    domains: Option<Vec<String>>,
    cache_key: Option<String>,
    phase: Option<Phase>,
}

impl RequestBinding {
    pub fn new(
        config: BindingConfig,
        params: RouteParams,
        translator: Arc<dyn TranslatorContract>,
        store: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            config,
            params,
            translator,
            store,
            domains: None,
            cache_key: None,
            phase: None,
        }
    }

    /// Candidate domain list for the current route, computed once per
    /// request.
    pub fn domains(&mut self) -> Vec<String> {
        if let Some(ref domains) = self.domains {
            return domains.clone();
        }
        let domains = derive_domains(&self.params);
        debug!(?domains, "route_domains");
        self.domains = Some(domains.clone());
        domains
    }

    /// Store cache key for the current route, computed once per request.
    pub fn cache_key(&mut self) -> String {
        if let Some(ref key) = self.cache_key {
            return key.clone();
        }
        let key = derive_cache_key(&self.config.name, &self.params);
        self.cache_key = Some(key.clone());
        key
    }

    /// Point the translator at the route's domains and import any
    /// previously persisted cache for this route.
    pub fn load(&mut self) {
        let domains = self.domains();
        self.translator.set_domains(domains);

        let cache_key = self.cache_key();
        match self.store.read(&cache_key) {
            Some(cache) => {
                self.translator.import(&cache);
                debug!(key = %cache_key, "translations_loaded");
            }
            None => debug!(key = %cache_key, "no persisted translations"),
        }
    }

    /// Persist the translator's cache if it holds unsaved entries.
    pub fn save(&mut self) {
        if !self.translator.tainted() {
            return;
        }
        let cache_key = self.cache_key();
        let cache = self.translator.export();
        self.store.write(&cache_key, &cache);
        info!(key = %cache_key, "translations_saved");
    }

    /// Run the action configured for `phase`, if any. The configured
    /// string is validated here, not at construction; an unknown action
    /// is fatal.
    pub fn dispatch(&mut self, phase: Phase) -> Result<(), Error> {
        self.track(phase);
        let Some(Some(raw)) = self.config.events.get(&phase).cloned() else {
            return Ok(());
        };
        match PhaseAction::parse(&raw)? {
            PhaseAction::Load => self.load(),
            PhaseAction::Save => self.save(),
        }
        Ok(())
    }

    fn track(&mut self, next: Phase) {
        if let Some(prev) = self.phase {
            if prev.can_transition_to(next) {
                info!(from = %prev, to = %next, "phase_transition");
            } else {
                warn!(from = %prev, to = %next, "phase out of order");
            }
        }
        self.phase = Some(next);
    }
}
