//! Working resource list and the kind table
//!
//! Resources are kept as untyped JSON so fragments may carry any field,
//! including ones for custom resources. Enrichers that build new objects
//! construct them with `k8s-openapi` types and convert.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Static facts about a known kind
#[derive(Debug, Clone, Copy)]
pub struct KindInfo {
    pub kind: &'static str,
    pub api_version: &'static str,
    /// Lowercase token used in individual file names
    pub suffix: &'static str,
    /// Accepted `<type>` tokens in fragment file names
    pub aliases: &'static [&'static str],
}

const fn kind(
    kind: &'static str,
    api_version: &'static str,
    suffix: &'static str,
    aliases: &'static [&'static str],
) -> KindInfo {
    KindInfo {
        kind,
        api_version,
        suffix,
        aliases,
    }
}

const KINDS: &[KindInfo] = &[
    kind("BuildConfig", "build.openshift.io/v1", "buildconfig", &["bc", "buildconfig"]),
    kind("ClusterRole", "rbac.authorization.k8s.io/v1", "clusterrole", &["clusterrole"]),
    kind("ClusterRoleBinding", "rbac.authorization.k8s.io/v1", "clusterrolebinding", &["clusterrolebinding", "crb"]),
    kind("ConfigMap", "v1", "configmap", &["cm", "configmap"]),
    kind("CronJob", "batch/v1", "cronjob", &["cj", "cronjob"]),
    kind("DaemonSet", "apps/v1", "daemonset", &["ds", "daemonset"]),
    kind("Deployment", "apps/v1", "deployment", &["deployment"]),
    kind("DeploymentConfig", "apps.openshift.io/v1", "deploymentconfig", &["dc", "deploymentconfig"]),
    kind("HorizontalPodAutoscaler", "autoscaling/v2", "hpa", &["hpa", "horizontalpodautoscaler"]),
    kind("ImageStream", "image.openshift.io/v1", "is", &["is", "imagestream"]),
    kind("ImageStreamTag", "image.openshift.io/v1", "istag", &["istag", "imagestreamtag"]),
    kind("Ingress", "networking.k8s.io/v1", "ingress", &["ingress", "ing"]),
    kind("Job", "batch/v1", "job", &["job"]),
    kind("Namespace", "v1", "namespace", &["namespace", "ns"]),
    kind("NetworkPolicy", "networking.k8s.io/v1", "networkpolicy", &["networkpolicy", "np"]),
    kind("PersistentVolume", "v1", "pv", &["pv", "persistentvolume"]),
    kind("PersistentVolumeClaim", "v1", "pvc", &["pvc", "persistentvolumeclaim"]),
    kind("Pod", "v1", "pod", &["pod"]),
    kind("ReplicaSet", "apps/v1", "replicaset", &["rs", "replicaset"]),
    kind("ReplicationController", "v1", "rc", &["rc", "replicationcontroller"]),
    kind("Role", "rbac.authorization.k8s.io/v1", "role", &["role"]),
    kind("RoleBinding", "rbac.authorization.k8s.io/v1", "rolebinding", &["rolebinding", "rb"]),
    kind("Route", "route.openshift.io/v1", "route", &["route"]),
    kind("Secret", "v1", "secret", &["secret"]),
    kind("Service", "v1", "service", &["svc", "service"]),
    kind("ServiceAccount", "v1", "serviceaccount", &["sa", "serviceaccount"]),
    kind("StatefulSet", "apps/v1", "statefulset", &["statefulset"]),
    kind("Template", "template.openshift.io/v1", "template", &["template"]),
];

/// Kinds whose pod template lives at `/spec/template`
pub const CONTROLLER_KINDS: &[&str] = &[
    "Deployment",
    "DeploymentConfig",
    "StatefulSet",
    "DaemonSet",
    "ReplicaSet",
    "ReplicationController",
    "Job",
];

/// Suffix used for kinds missing from the table
pub const CUSTOM_RESOURCE_SUFFIX: &str = "cr";

pub fn kind_info(kind: &str) -> Option<&'static KindInfo> {
    KINDS.iter().find(|k| k.kind == kind)
}

/// Look up a kind by a file-name type token (case-insensitive)
pub fn kind_for_alias(alias: &str) -> Option<&'static KindInfo> {
    let alias = alias.to_ascii_lowercase();
    KINDS.iter().find(|k| k.aliases.contains(&alias.as_str()))
}

pub fn default_api_version(kind: &str) -> Option<&'static str> {
    kind_info(kind).map(|k| k.api_version)
}

pub fn file_suffix(kind: &str) -> &'static str {
    kind_info(kind)
        .map(|k| k.suffix)
        .unwrap_or(CUSTOM_RESOURCE_SUFFIX)
}

/// Sorting bucket; dependencies sort before their dependents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceCategory {
    Namespace = 1,
    Rbac = 10,
    Config = 20,
    Storage = 21,
    Image = 25,
    Network = 30,
    Workload = 40,
    Batch = 50,
    Autoscaling = 60,
    CustomResource = 70,
    Other = 100,
}

impl ResourceCategory {
    pub fn from_resource(kind: &str, api_version: &str) -> Self {
        match kind {
            "Namespace" => Self::Namespace,
            "ServiceAccount" | "Role" | "RoleBinding" | "ClusterRole" | "ClusterRoleBinding" => {
                Self::Rbac
            }
            "ConfigMap" | "Secret" => Self::Config,
            "PersistentVolume" | "PersistentVolumeClaim" => Self::Storage,
            "ImageStream" | "ImageStreamTag" | "BuildConfig" => Self::Image,
            "Service" | "Ingress" | "Route" | "NetworkPolicy" => Self::Network,
            "Deployment" | "DeploymentConfig" | "StatefulSet" | "DaemonSet" | "ReplicaSet"
            | "ReplicationController" | "Pod" => Self::Workload,
            "Job" | "CronJob" => Self::Batch,
            "HorizontalPodAutoscaler" => Self::Autoscaling,
            _ if api_version.contains('.') && kind_info(kind).is_none() => Self::CustomResource,
            _ => Self::Other,
        }
    }
}

/// A single manifest object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource {
    value: JsonValue,
}

impl Resource {
    pub fn new(value: JsonValue) -> Self {
        Self { value }
    }

    /// Convert a typed object (`k8s-openapi` or any `Serialize`)
    pub fn from_typed<T: Serialize>(object: &T) -> serde_json::Result<Self> {
        serde_json::to_value(object).map(Self::new)
    }

    /// Skeleton with `apiVersion`, `kind` and `metadata.name`
    pub fn skeleton(kind: &str, name: &str) -> Self {
        let mut value = serde_json::json!({
            "kind": kind,
            "metadata": { "name": name },
        });
        if let Some(api_version) = default_api_version(kind) {
            value["apiVersion"] = JsonValue::from(api_version);
        }
        Self::new(value)
    }

    pub fn value(&self) -> &JsonValue {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut JsonValue {
        &mut self.value
    }

    pub fn into_value(self) -> JsonValue {
        self.value
    }

    pub fn kind(&self) -> &str {
        self.str_at("/kind").unwrap_or_default()
    }

    pub fn api_version(&self) -> &str {
        self.str_at("/apiVersion").unwrap_or_default()
    }

    pub fn name(&self) -> &str {
        self.str_at("/metadata/name").unwrap_or_default()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.str_at("/metadata/namespace")
    }

    pub fn set_kind(&mut self, kind: &str) {
        root_object(&mut self.value).insert("kind".to_string(), JsonValue::from(kind));
    }

    pub fn set_api_version(&mut self, api_version: &str) {
        root_object(&mut self.value).insert("apiVersion".to_string(), JsonValue::from(api_version));
    }

    pub fn set_name(&mut self, name: &str) {
        self.object_at_mut("/metadata")
            .insert("name".to_string(), JsonValue::from(name));
    }

    /// `kind/name`, unique within a list
    pub fn key(&self) -> String {
        format!("{}/{}", self.kind(), self.name())
    }

    pub fn get(&self, pointer: &str) -> Option<&JsonValue> {
        self.value.pointer(pointer)
    }

    pub fn str_at(&self, pointer: &str) -> Option<&str> {
        self.value.pointer(pointer).and_then(JsonValue::as_str)
    }

    /// Whether a field is absent, null, or an empty string/array/object
    pub fn is_unset(&self, pointer: &str) -> bool {
        match self.value.pointer(pointer) {
            None | Some(JsonValue::Null) => true,
            Some(JsonValue::String(s)) => s.is_empty(),
            Some(JsonValue::Array(a)) => a.is_empty(),
            Some(JsonValue::Object(o)) => o.is_empty(),
            Some(_) => false,
        }
    }

    /// Object at `pointer`, creating it (and its parents) when missing
    pub fn object_at_mut(&mut self, pointer: &str) -> &mut Map<String, JsonValue> {
        object_at_mut(&mut self.value, pointer)
    }

    /// Set a field only when it is unset
    pub fn set_default(&mut self, pointer: &str, value: JsonValue) -> bool {
        if !self.is_unset(pointer) {
            return false;
        }
        let (parent, field) = match pointer.rsplit_once('/') {
            Some(split) => split,
            None => return false,
        };
        self.object_at_mut(parent).insert(field.to_string(), value);
        true
    }

    pub fn is_controller(&self) -> bool {
        CONTROLLER_KINDS.contains(&self.kind())
    }

    /// Pointer to the pod template spec, for kinds that carry one
    pub fn pod_spec_pointer(&self) -> Option<&'static str> {
        match self.kind() {
            "Pod" => Some("/spec"),
            "CronJob" => Some("/spec/jobTemplate/spec/template/spec"),
            k if CONTROLLER_KINDS.contains(&k) => Some("/spec/template/spec"),
            _ => None,
        }
    }

    /// Containers of the pod spec, mutable
    pub fn containers_mut(&mut self) -> Option<&mut Vec<JsonValue>> {
        let pointer = format!("{}/containers", self.pod_spec_pointer()?);
        self.value.pointer_mut(&pointer)?.as_array_mut()
    }

    pub fn category(&self) -> ResourceCategory {
        ResourceCategory::from_resource(self.kind(), self.api_version())
    }
}

fn root_object(value: &mut JsonValue) -> &mut Map<String, JsonValue> {
    ensure_object(value)
}

fn ensure_object(value: &mut JsonValue) -> &mut Map<String, JsonValue> {
    if !value.is_object() {
        *value = JsonValue::Object(Map::new());
    }
    match value {
        JsonValue::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}

/// Walk a JSON pointer, replacing missing or non-object steps with objects
pub fn object_at_mut<'a>(root: &'a mut JsonValue, pointer: &str) -> &'a mut Map<String, JsonValue> {
    let mut map = ensure_object(root);
    for segment in pointer.split('/').filter(|s| !s.is_empty()) {
        let entry = map
            .entry(segment.to_string())
            .or_insert_with(|| JsonValue::Object(Map::new()));
        map = ensure_object(entry);
    }
    map
}

/// Ordering used before writing: category, then kind, then name
pub fn compare(a: &Resource, b: &Resource) -> Ordering {
    a.category()
        .cmp(&b.category())
        .then_with(|| a.kind().cmp(b.kind()))
        .then_with(|| a.name().cmp(b.name()))
}

/// The working manifest set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceList {
    items: Vec<Resource>,
}

impl ResourceList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, resource: Resource) {
        self.items.push(resource);
    }

    pub fn extend(&mut self, other: ResourceList) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Resource> {
        self.items.iter_mut()
    }

    pub fn items(&self) -> &[Resource] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Resource> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn find(&self, kind: &str, name: &str) -> Option<&Resource> {
        self.items
            .iter()
            .find(|r| r.kind() == kind && r.name() == name)
    }

    pub fn find_mut(&mut self, kind: &str, name: &str) -> Option<&mut Resource> {
        self.items
            .iter_mut()
            .find(|r| r.kind() == kind && r.name() == name)
    }

    pub fn contains(&self, kind: &str, name: &str) -> bool {
        self.find(kind, name).is_some()
    }

    pub fn has_kind(&self, kinds: &[&str]) -> bool {
        self.items.iter().any(|r| kinds.contains(&r.kind()))
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Resource> + 'a {
        self.items.iter().filter(move |r| r.kind() == kind)
    }

    pub fn of_kind_mut<'a>(&'a mut self, kind: &'a str) -> impl Iterator<Item = &'a mut Resource> + 'a {
        self.items.iter_mut().filter(move |r| r.kind() == kind)
    }

    /// Stable sort by category, kind and name
    pub fn sort(&mut self) {
        self.items.sort_by(compare);
    }

    /// The single item when it is a `Template`
    pub fn singleton_template(&self) -> Option<&Resource> {
        match self.items.as_slice() {
            [only] if only.kind() == "Template" => Some(only),
            _ => None,
        }
    }

    /// `kind: List` wrapper used for composite output
    pub fn to_list_value(&self) -> JsonValue {
        serde_json::json!({
            "apiVersion": "v1",
            "kind": "List",
            "items": self.items,
        })
    }
}

impl FromIterator<Resource> for ResourceList {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ResourceList {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_table_lookup() {
        assert_eq!(kind_for_alias("SVC").unwrap().kind, "Service");
        assert_eq!(kind_for_alias("dc").unwrap().kind, "DeploymentConfig");
        assert!(kind_for_alias("widget").is_none());

        assert_eq!(default_api_version("Deployment"), Some("apps/v1"));
        assert_eq!(file_suffix("Service"), "service");
        assert_eq!(file_suffix("Widget"), "cr");
    }

    #[test]
    fn test_resource_accessors() {
        let mut r = Resource::new(json!({
            "apiVersion": "v1",
            "kind": "Service",
            "metadata": { "name": "web", "namespace": "prod" }
        }));
        assert_eq!(r.kind(), "Service");
        assert_eq!(r.name(), "web");
        assert_eq!(r.namespace(), Some("prod"));
        assert_eq!(r.key(), "Service/web");

        assert!(r.is_unset("/spec/type"));
        assert!(r.set_default("/spec/type", json!("ClusterIP")));
        assert!(!r.set_default("/spec/type", json!("NodePort")));
        assert_eq!(r.str_at("/spec/type"), Some("ClusterIP"));
    }

    #[test]
    fn test_object_at_mut_creates_parents() {
        let mut r = Resource::skeleton("Deployment", "app");
        r.object_at_mut("/spec/template/metadata/labels")
            .insert("app".into(), json!("demo"));
        assert_eq!(r.str_at("/spec/template/metadata/labels/app"), Some("demo"));
        assert_eq!(r.api_version(), "apps/v1");
    }

    #[test]
    fn test_sort_by_category_kind_name() {
        let mut list: ResourceList = [
            Resource::skeleton("Deployment", "b"),
            Resource::skeleton("Service", "z"),
            Resource::skeleton("Deployment", "a"),
            Resource::skeleton("ConfigMap", "cfg"),
            Resource::skeleton("ServiceAccount", "sa"),
        ]
        .into_iter()
        .collect();
        list.sort();

        let keys: Vec<String> = list.iter().map(Resource::key).collect();
        assert_eq!(
            keys,
            vec![
                "ServiceAccount/sa",
                "ConfigMap/cfg",
                "Service/z",
                "Deployment/a",
                "Deployment/b",
            ]
        );
    }

    #[test]
    fn test_pod_spec_pointer() {
        assert_eq!(
            Resource::skeleton("Deployment", "x").pod_spec_pointer(),
            Some("/spec/template/spec")
        );
        assert_eq!(Resource::skeleton("Pod", "x").pod_spec_pointer(), Some("/spec"));
        assert_eq!(Resource::skeleton("Service", "x").pod_spec_pointer(), None);
    }

    #[test]
    fn test_singleton_template() {
        let list: ResourceList = [Resource::skeleton("Template", "t")].into_iter().collect();
        assert!(list.singleton_template().is_some());

        let list: ResourceList = [Resource::skeleton("Template", "t"), Resource::skeleton("Service", "s")]
            .into_iter()
            .collect();
        assert!(list.singleton_template().is_none());
    }
}
