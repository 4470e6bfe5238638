//! Name registry for configuration model identifiers.
//!
//! Maps internal model/table identifiers (the prefix of a telemetry
//! feature name) to the names shown in the controller UI. The table is
//! built once at startup and never mutated afterwards.

use std::collections::BTreeMap;

/// Built-in identifier -> display name entries.
const BUILTIN_NAMES: &[(&str, &str)] = &[
    ("PTPolicylistGen", "Policy Tags"),
    ("Dot11Gen", "Global Radio Configs"),
    ("FlexpolicyGen", "Flex Profiles"),
    ("RadiusServerGroup", "AAA->RADIUS Server Groups"),
    ("RfProfileDefaultGen", "Multi-Screen Attributes"),
    ("AaaNeSettings", "AAA->Method Lists"),
    ("RadiusNeSettings", "AAA->RADIUS Servers"),
    ("SiteTagConfigGen", "Site Tags"),
    ("MeshConfigGen", "Mesh->Global"),
    ("InterfaceConfig", "VLAN->VLAN"),
    ("ApJoinProfileGen", "AP Join Profiles"),
    ("RrmGen", "RRM"),
    ("WirelessAaaPolicyConfigGen", "AAA Policy"),
    ("MeshProfileGen", "Mesh Profiles"),
    ("ApTagGen", "Static AP Tag Mapping"),
    ("GuestlanMapGen", "Guest LAN Map"),
    ("WlanConfigProfileGen", "WLAN Profiles"),
    ("WlanPolicyProfileGen", "Policy Profiles"),
    ("GuestlanConfigGen", "Guest LAN Profiles"),
    ("NgwcInterfaceConfig", "VLAN->SVI"),
    ("RfTagGen", "RF Tags"),
    ("RfProfileGen", "RF Profiles"),
];

/// Immutable identifier -> display name lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRegistry {
    names: BTreeMap<String, String>,
}

impl Default for NameRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl NameRegistry {
    /// The built-in table.
    pub fn builtin() -> Self {
        let names = BUILTIN_NAMES
            .iter()
            .map(|(id, name)| (id.to_string(), name.to_string()))
            .collect();
        Self { names }
    }

    /// A new registry with `overrides` layered on top of this one.
    ///
    /// Entries in `overrides` replace existing identifiers and add new ones.
    pub fn with_overrides(&self, overrides: &BTreeMap<String, String>) -> Self {
        let mut names = self.names.clone();
        for (id, name) in overrides {
            names.insert(id.clone(), name.clone());
        }
        Self { names }
    }

    /// Display name for `id`, or `id` itself when it is not registered.
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.names.get(id).map(String::as_str).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Iterate entries in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
