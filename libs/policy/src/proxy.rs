use std::collections::HashMap;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::document::Document;

const DEFAULT_ICON: &str = "server-icon.png";
const DEFAULT_SAMPLE: &str = "sample.txt";

/// Proxy configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    pub connect: ConnectSettings,
    pub proxy: ProxySettings,
}

/// Where the proxy finds its authority, and how it logs in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConnectSettings {
    pub address: String,
    pub credentials: ConnectCredentials,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConnectCredentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub bind: String,
    pub motd: String,
    pub max_players: u16,
    pub authenticate: bool,
    pub locale: ProxyLocale,
    /// Domain routes. The lookup index is built on first use, so changes made
    /// after the first lookup are not seen.
    pub routes: Vec<RouteRule>,
    #[serde(skip)]
    index: OnceCell<HashMap<String, usize>>,
}

impl PartialEq for ProxySettings {
    fn eq(&self, other: &Self) -> bool {
        self.bind == other.bind
            && self.motd == other.motd
            && self.max_players == other.max_players
            && self.authenticate == other.authenticate
            && self.locale == other.locale
            && self.routes == other.routes
    }
}

/// Disconnect and kick messages shown to players
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProxyLocale {
    pub full: String,
    pub offline: String,
    pub logged_in: String,
    pub lost_conn: String,
    pub shutdown: String,
}

/// What a requested domain maps to
///
/// The empty domain is the wildcard route. List fields take precedence over
/// their single-valued counterpart; an empty list counts as unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RouteRule {
    pub domain: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub server: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub motd: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub motds: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub icons: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sample: String,
}

/// `list` when set, else `[single]` when set, else nothing
fn one_or_many(single: &str, list: &[String]) -> Option<Vec<String>> {
    if !list.is_empty() {
        Some(list.to_vec())
    } else if !single.is_empty() {
        Some(vec![single.to_string()])
    } else {
        None
    }
}

impl ProxySettings {
    fn find(&self, domain: &str) -> Option<&RouteRule> {
        let index = self.index.get_or_init(|| {
            // Later duplicates overwrite earlier ones.
            self.routes
                .iter()
                .enumerate()
                .map(|(position, rule)| (rule.domain.to_lowercase(), position))
                .collect()
        });
        index
            .get(&domain.to_lowercase())
            .and_then(|&position| self.routes.get(position))
    }

    /// Ask the matching route, then the wildcard route, for a value
    fn resolve<T>(&self, domain: &str, pick: impl Fn(&RouteRule) -> Option<T>) -> Option<T> {
        if let Some(value) = self.find(domain).and_then(&pick) {
            return Some(value);
        }
        if domain.is_empty() {
            return None;
        }
        self.find("").and_then(pick)
    }
}

impl ProxyConfig {
    /// Backend servers for `domain`, matched case-insensitively
    ///
    /// A matched route that names no server yields an empty list without
    /// consulting the wildcard route.
    pub fn route(&self, domain: &str) -> Vec<String> {
        let settings = &self.proxy;
        if let Some(rule) = settings.find(domain) {
            return one_or_many(&rule.server, &rule.servers).unwrap_or_default();
        }
        if domain.is_empty() {
            return Vec::new();
        }
        self.route("")
    }

    /// Server-list messages for `domain`; defaults to the proxy MOTD
    pub fn route_motds(&self, domain: &str) -> Vec<String> {
        self.proxy
            .resolve(domain, |rule| one_or_many(&rule.motd, &rule.motds))
            .unwrap_or_else(|| vec![self.proxy.motd.clone()])
    }

    /// Server-list icon files for `domain`
    pub fn route_icons(&self, domain: &str) -> Vec<String> {
        self.proxy
            .resolve(domain, |rule| one_or_many(&rule.icon, &rule.icons))
            .unwrap_or_else(|| vec![DEFAULT_ICON.to_string()])
    }

    /// Player-sample file for `domain`
    pub fn route_sample(&self, domain: &str) -> String {
        self.proxy
            .resolve(domain, |rule| {
                (!rule.sample.is_empty()).then(|| rule.sample.clone())
            })
            .unwrap_or_else(|| DEFAULT_SAMPLE.to_string())
    }

    pub fn locale_full(&self) -> &str {
        &self.proxy.locale.full
    }

    pub fn locale_offline(&self) -> &str {
        &self.proxy.locale.offline
    }

    pub fn locale_logged_in(&self) -> &str {
        &self.proxy.locale.logged_in
    }

    pub fn locale_lost_conn(&self) -> &str {
        &self.proxy.locale.lost_conn
    }

    pub fn locale_shutdown(&self) -> &str {
        &self.proxy.locale.shutdown
    }
}

impl Default for ConnectSettings {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:5091".to_string(),
            credentials: ConnectCredentials {
                username: "example".to_string(),
                password: "example".to_string(),
            },
        }
    }
}

impl Default for ProxySettings {
    fn default() -> Self {
        let strings = |values: &[&str]| -> Vec<String> {
            values.iter().map(|value| value.to_string()).collect()
        };
        Self {
            bind: ":25565".to_string(),
            motd: "A LilyPad Server".to_string(),
            max_players: 1,
            authenticate: true,
            locale: ProxyLocale {
                full: "The server seems to be currently full. Try again later!".to_string(),
                offline: "The requested server is currently offline. Try again later!"
                    .to_string(),
                logged_in: "You seem to be logged in already. Try again later!".to_string(),
                lost_conn: "Lost connection... Please try to reconnect".to_string(),
                shutdown: "The server is being restarted. Please try to reconnect".to_string(),
            },
            routes: vec![
                RouteRule {
                    domain: String::new(),
                    server: "example".to_string(),
                    ..RouteRule::default()
                },
                RouteRule {
                    domain: "example.com".to_string(),
                    servers: strings(&["hub1", "hub2"]),
                    motd: "Example Custom MOTD".to_string(),
                    ..RouteRule::default()
                },
                RouteRule {
                    domain: "hub.exmaple.com".to_string(),
                    server: "hub".to_string(),
                    motds: strings(&["Example MOTD 1", "Example MOTD 2"]),
                    ..RouteRule::default()
                },
                RouteRule {
                    domain: "icon.exmaple.com".to_string(),
                    server: "hub".to_string(),
                    icon: "icon.png".to_string(),
                    icons: strings(&["icon1.png", "icon2.png", "icons/icon3.png"]),
                    ..RouteRule::default()
                },
            ],
            index: OnceCell::new(),
        }
    }
}

impl Document for ProxyConfig {}
