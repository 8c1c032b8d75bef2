// src/translate/attributes.rs

//! Task context derivation from pod annotations and node metadata.
//!
//! Pods publish their network identity under two naming schemes: the legacy
//! flat keys (`IpAddress`, `NetworkMode`, ...) and newer keys scoped under a
//! network domain (`<network_domain>network-mode`, ...). The structured key
//! wins when both are present.

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::config::AnnotationSection;
use crate::model::context_keys as keys;
use crate::model::{NodeSnapshot, PodSnapshot};

pub const LEGACY_ANNOTATION_IP_ADDRESS: &str = "IpAddress";
pub const LEGACY_ANNOTATION_ENI_IP_ADDRESS: &str = "EniIPAddress";
pub const LEGACY_ANNOTATION_ENI_IPV6_ADDRESS: &str = "EniIPv6Address";
pub const LEGACY_ANNOTATION_NETWORK_MODE: &str = "NetworkMode";

/// Well-known node label carrying the availability zone.
pub const NODE_LABEL_ZONE: &str = "topology.kubernetes.io/zone";

/// Fully-qualified annotation and label names the resolver reads.
///
/// Built once from `[annotations]` and shared by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationKeys {
    pub ip_address: Vec<String>,
    pub ipv4_address: Vec<String>,
    pub ipv6_address: Vec<String>,
    pub network_mode: Vec<String>,
    pub node_ami: String,
    pub node_stack: String,
}

impl AnnotationKeys {
    pub fn from_config(section: &AnnotationSection) -> Self {
        let net = section.network_domain.as_str();
        let node = section.node_domain.as_str();
        Self {
            ip_address: vec![format!("{net}address-ip"), LEGACY_ANNOTATION_IP_ADDRESS.into()],
            ipv4_address: vec![
                format!("{net}address-ipv4"),
                LEGACY_ANNOTATION_ENI_IP_ADDRESS.into(),
            ],
            ipv6_address: vec![
                format!("{net}address-ipv6"),
                LEGACY_ANNOTATION_ENI_IPV6_ADDRESS.into(),
            ],
            network_mode: vec![
                format!("{net}network-mode"),
                LEGACY_ANNOTATION_NETWORK_MODE.into(),
            ],
            node_ami: format!("{node}ami"),
            node_stack: format!("{node}stack"),
        }
    }
}

impl Default for AnnotationKeys {
    fn default() -> Self {
        Self::from_config(&AnnotationSection::default())
    }
}

/// Network addressing mode requested for a pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkMode {
    #[default]
    Ipv4Only,
    /// Dual stack: both addresses are unique to the task.
    Ipv6AndIpv4,
    /// Transition mode: IPv6 primary, IPv4 only through a shared fallback.
    Ipv6AndIpv4Fallback,
    Ipv6Only,
}

impl NetworkMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "Ipv4Only" | "UnknownNetworkMode" | "HighScale" => Some(NetworkMode::Ipv4Only),
            "Ipv6AndIpv4" => Some(NetworkMode::Ipv6AndIpv4),
            "Ipv6AndIpv4Fallback" => Some(NetworkMode::Ipv6AndIpv4Fallback),
            "Ipv6Only" => Some(NetworkMode::Ipv6Only),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NetworkMode::Ipv4Only => "Ipv4Only",
            NetworkMode::Ipv6AndIpv4 => "Ipv6AndIpv4",
            NetworkMode::Ipv6AndIpv4Fallback => "Ipv6AndIpv4Fallback",
            NetworkMode::Ipv6Only => "Ipv6Only",
        }
    }
}

impl fmt::Display for NetworkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys to set on a task context, plus keys that must not survive the merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextDelta {
    pub entries: BTreeMap<String, String>,
    pub suppressed: Vec<&'static str>,
}

impl ContextDelta {
    /// Merge into an existing context. Existing keys not mentioned by the
    /// delta are kept.
    pub fn apply_to(&self, context: &mut BTreeMap<String, String>) {
        for key in &self.suppressed {
            context.remove(*key);
        }
        for (k, v) in &self.entries {
            context.insert(k.clone(), v.clone());
        }
    }

    fn put(&mut self, key: &str, value: Option<&str>) {
        if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
            self.entries.insert(key.to_string(), v.to_string());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}

/// Network mode of the pod; `Ipv4Only` when absent or unrecognized.
pub fn resolve_network_mode(pod: &PodSnapshot, annotation_keys: &AnnotationKeys) -> NetworkMode {
    match pod.first_annotation(&annotation_keys.network_mode) {
        None => NetworkMode::default(),
        Some(raw) => NetworkMode::parse(raw).unwrap_or_else(|| {
            debug!(task = %pod.name, mode = raw, "unrecognized network mode; assuming Ipv4Only");
            NetworkMode::default()
        }),
    }
}

/// Derive task context entries from a pod and (optionally) its node.
pub fn resolve_attributes(
    pod: &PodSnapshot,
    node: Option<&NodeSnapshot>,
    annotation_keys: &AnnotationKeys,
) -> ContextDelta {
    let mut delta = ContextDelta::default();

    let mode = resolve_network_mode(pod, annotation_keys);
    let primary = pod.first_annotation(&annotation_keys.ip_address);
    let ipv4 = pod.first_annotation(&annotation_keys.ipv4_address);
    let ipv6 = pod.first_annotation(&annotation_keys.ipv6_address);

    match mode {
        NetworkMode::Ipv6AndIpv4Fallback => {
            // The fallback IPv4 is shared between tasks on the agent; it must
            // never be published as the task's own IPv4 address.
            let address = primary.or(ipv6);
            delta.put(keys::CONTAINER_IP, address);
            delta.put(keys::CONTAINER_IPV6, address);
            delta.put(keys::TRANSITION_IPV4, ipv4);
            delta.suppressed.push(keys::CONTAINER_IPV4);
        }
        NetworkMode::Ipv4Only => {
            let address = primary.or(ipv4);
            delta.put(keys::CONTAINER_IP, address);
            delta.put(keys::CONTAINER_IPV4, address);
        }
        NetworkMode::Ipv6AndIpv4 => {
            let address = primary.or(ipv4);
            delta.put(keys::CONTAINER_IP, address);
            delta.put(keys::CONTAINER_IPV4, address);
            delta.put(keys::CONTAINER_IPV6, ipv6);
        }
        NetworkMode::Ipv6Only => {
            let address = primary.or(ipv6);
            delta.put(keys::CONTAINER_IP, address);
            delta.put(keys::CONTAINER_IPV6, address);
        }
    }

    if pod.first_annotation(&annotation_keys.network_mode).is_some() {
        delta.put(keys::NETWORK_MODE, Some(mode.as_str()));
    }

    if let Some(node) = node {
        delta.put(keys::AGENT_HOST, Some(node.address.as_str()));
        delta.put(keys::AGENT_INSTANCE_ID, Some(node.name.as_str()));
        delta.put(keys::AGENT_AMI, node.metadata(&annotation_keys.node_ami));
        delta.put(keys::AGENT_STACK, node.metadata(&annotation_keys.node_stack));
        delta.put(keys::AGENT_ZONE, node.metadata(NODE_LABEL_ZONE));
    }

    delta
}
