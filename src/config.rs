use crate::constants::{
    CONFIG_KEY_CLOCKSKEW, CONFIG_KEY_KDC_TIMEOUT, CONFIG_SECTION_LIBDEFAULTS, DEFAULT_KDC_TIMEOUT,
};
use crate::error::KrbError;
use crate::proto::MethodDataPolicy;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error};

/// Integer lookups from `[section] key = value` configuration.
pub trait ConfigProvider {
    fn get_default_int_value(&self, key: &str, section: &str) -> Option<i64>;
}

/// The ordered realms a client walks from its own realm to a service realm,
/// both endpoints included.
pub trait RealmHierarchy {
    fn realms_list(&self, local: &str, service: &str) -> Vec<String>;
}

#[derive(Debug, Default, Deserialize)]
struct LibDefaults {
    default_realm: Option<String>,
    clockskew: Option<i64>,
    kdc_timeout: Option<i64>,
    method_data_error_codes: Option<Vec<i32>>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RealmConfig {
    #[serde(default)]
    pub kdc: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    libdefaults: LibDefaults,
    #[serde(default)]
    realms: BTreeMap<String, RealmConfig>,
    /// client realm -> service realm -> intermediate realms.
    #[serde(default)]
    capaths: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl ClientConfig {
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self, KrbError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|err| {
            error!(?err, path = ?path.as_ref(), "unable to read configuration");
            KrbError::ConfigIo
        })?;
        Self::from_str(&contents)
    }

    pub fn default_realm(&self) -> Option<&str> {
        self.libdefaults.default_realm.as_deref()
    }

    /// The KDC addresses configured for a realm, in the order they are tried.
    pub fn kdcs(&self, realm: &str) -> &[String] {
        self.realms
            .get(realm)
            .map(|realm_config| realm_config.kdc.as_slice())
            .unwrap_or(&[])
    }

    pub fn realms(&self) -> &BTreeMap<String, RealmConfig> {
        &self.realms
    }

    /// The deadline for a KDC to answer, from `kdc_timeout` in seconds. A
    /// missing or non positive value falls back to thirty seconds.
    pub fn kdc_timeout(&self) -> Duration {
        match self.get_default_int_value(CONFIG_KEY_KDC_TIMEOUT, CONFIG_SECTION_LIBDEFAULTS) {
            Some(secs) if secs > 0 => Duration::from_secs(secs as u64),
            _ => DEFAULT_KDC_TIMEOUT,
        }
    }

    /// The error codes whose e-data is read as METHOD-DATA.
    pub fn method_data_policy(&self) -> MethodDataPolicy {
        match &self.libdefaults.method_data_error_codes {
            Some(codes) => MethodDataPolicy::new(codes.iter().copied()),
            None => MethodDataPolicy::default(),
        }
    }
}

impl FromStr for ClientConfig {
    type Err = KrbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s).map_err(|err| {
            error!(?err, "unable to parse configuration");
            KrbError::ConfigParse
        })
    }
}

impl ConfigProvider for ClientConfig {
    fn get_default_int_value(&self, key: &str, section: &str) -> Option<i64> {
        if section != CONFIG_SECTION_LIBDEFAULTS {
            return None;
        }
        match key {
            CONFIG_KEY_CLOCKSKEW => self.libdefaults.clockskew,
            CONFIG_KEY_KDC_TIMEOUT => self.libdefaults.kdc_timeout,
            _ => None,
        }
    }
}

impl RealmHierarchy for ClientConfig {
    fn realms_list(&self, local: &str, service: &str) -> Vec<String> {
        if local == service {
            return vec![local.to_string()];
        }

        if let Some(intermediates) = self
            .capaths
            .get(local)
            .and_then(|paths| paths.get(service))
        {
            debug!(?intermediates, "using capaths");
            let mut realms = Vec::with_capacity(intermediates.len() + 2);
            realms.push(local.to_string());
            realms.extend(
                intermediates
                    .iter()
                    .filter(|realm| realm.as_str() != local && realm.as_str() != service)
                    .cloned(),
            );
            realms.push(service.to_string());
            return realms;
        }

        hierarchical_path(local, service)
    }
}

/// Walk up from `local` to the suffix it shares with `service`, then down to
/// `service`. Without a shared suffix the walk goes through the top level
/// components of both realms.
pub fn hierarchical_path(local: &str, service: &str) -> Vec<String> {
    let local_parts: Vec<&str> = local.split('.').collect();
    let service_parts: Vec<&str> = service.split('.').collect();

    let common = local_parts
        .iter()
        .rev()
        .zip(service_parts.iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let mut realms = Vec::new();

    // Ancestors of local, down to the common suffix, or to its top level
    // component when nothing is shared.
    let up_to = local_parts.len() - common.max(1);
    for i in 0..=up_to {
        realms.push(local_parts[i..].join("."));
    }

    // Ancestors of service from the top, then service itself.
    let down_from = service_parts.len() - common.max(1);
    let start = if common == 0 { down_from } else { down_from.saturating_sub(1) };
    let mut descent = Vec::new();
    for i in (0..=start).rev() {
        let realm = service_parts[i..].join(".");
        if realms.last() != Some(&realm) {
            descent.push(realm);
        }
    }
    realms.extend(descent);
    realms.dedup();
    realms
}
