// src/enrich/profile.rs
//! Output shapes: the full artisan profile and the degraded fallbacks.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::source::InputRecord;

/// Typed view of the profile the model is asked to produce.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArtisanProfile {
    #[serde(default)]
    pub artisan_profile: ArtisanIdentity,
    #[serde(default)]
    pub craft_details: CraftDetails,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ArtisanIdentity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: Location,
    #[serde(default)]
    pub contact: Contact,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Location {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Contact {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Craft fields come from the model; any of them may be null.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CraftDetails {
    #[serde(default)]
    pub craft_category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub cultural_heritage: Option<String>,
    #[serde(default)]
    pub primary_materials: Vec<String>,
    #[serde(default)]
    pub techniques_used: Vec<String>,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub product_photos: Vec<String>,
}

impl ArtisanProfile {
    /// Empty skeleton rendered into the prompt as the expected schema.
    pub fn schema_skeleton() -> Value {
        serde_json::json!({
            "artisan_profile": {
                "name": "",
                "location": { "city": "", "state": "", "country": "" },
                "contact": { "email": "", "phone": "" }
            },
            "craft_details": {
                "craft_category": "",
                "subcategory": "",
                "cultural_heritage": "",
                "primary_materials": [],
                "techniques_used": [],
                "tools_used": [],
                "product_photos": []
            }
        })
    }
}

/// One element of the output array. The array is heterogeneous: full
/// profiles sit next to degraded `{name, raw_response}` / `{name, error}`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum ProfileEntry {
    /// Model payload after the identity/contact overlay. Unknown keys the
    /// model added are kept as-is.
    Full(Value),
    RawResponse { name: String, raw_response: String },
    Failed { name: String, error: String },
}

impl ProfileEntry {
    pub fn is_degraded(&self) -> bool {
        !matches!(self, ProfileEntry::Full(_))
    }

    /// `artisan_profile.name` for full entries, `name` for degraded ones.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            ProfileEntry::Full(v) => v
                .get("artisan_profile")
                .and_then(|p| p.get("name"))
                .and_then(Value::as_str),
            ProfileEntry::RawResponse { name, .. } | ProfileEntry::Failed { name, .. } => {
                Some(name)
            }
        }
    }
}

/// Force the CSV-owned fields onto a model payload.
///
/// The input sheet is authoritative for name, location and contact; the model
/// only owns `craft_details`. Missing or non-object nesting is replaced by an
/// empty object before writing.
pub fn apply_overlay(value: Value, record: &InputRecord, country: &str) -> Value {
    let mut root = match value {
        Value::Object(m) => m,
        _ => Map::new(),
    };

    let profile = ensure_object(&mut root, "artisan_profile");
    profile.insert(
        "name".into(),
        Value::String(record.name().unwrap_or_default().to_string()),
    );

    let location = ensure_object(profile, "location");
    location.insert("city".into(), Value::String(record.city().to_string()));
    location.insert("state".into(), Value::String(record.state().to_string()));
    location.insert("country".into(), Value::String(country.to_string()));

    let contact = ensure_object(profile, "contact");
    contact.insert("email".into(), Value::String(record.email().to_string()));
    contact.insert("phone".into(), Value::String(record.joined_phone()));

    Value::Object(root)
}

fn ensure_object<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(m) => m,
        _ => unreachable!("slot was just replaced by an object"),
    }
}
