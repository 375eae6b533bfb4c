// src/enrich/prompt.rs
use serde::{Deserialize, Serialize};

use super::profile::ArtisanProfile;
use crate::source::InputRecord;

/// Two-message chat exchange sent to the completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub system: String,
    /// Language the model must answer in.
    pub language: String,
    /// Country every artisan in the sheet belongs to.
    pub country: String,
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            system: "You are a helpful assistant that answers in valid JSON only.".to_string(),
            language: "English".to_string(),
            country: "Brazil".to_string(),
        }
    }
}

impl PromptTemplate {
    pub fn new(language: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            country: country.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: PromptTemplate,
    schema: String,
}

impl PromptBuilder {
    pub fn new(template: PromptTemplate) -> Self {
        let schema = serde_json::to_string_pretty(&ArtisanProfile::schema_skeleton())
            .unwrap_or_else(|_| "{}".to_string());
        Self { template, schema }
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn build(&self, record: &InputRecord) -> ChatPrompt {
        let t = &self.template;
        let user = format!(
            "Respond in {language}. For the artisan \"{name}\" from {country}, what is their \
             artistic practice and what materials do they use?\n\n\
             Here is additional information from a database: City: {city}, State: {state}, \
             Email: {email}, Phone 1: {phone1}, Phone 2: {phone2}.\n\n\
             Respond ONLY with a valid JSON object in the following structure. Do not include \
             any explanation, markdown, or text outside the JSON. If any field is missing, \
             leave it null or empty.\n\n{schema}",
            language = t.language,
            country = t.country,
            name = record.name().unwrap_or_default(),
            city = record.city(),
            state = record.state(),
            email = record.email(),
            phone1 = record.phone1(),
            phone2 = record.phone2(),
            schema = self.schema,
        );
        ChatPrompt {
            system: t.system.clone(),
            user,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_carries_record_and_schema() {
        let rec = InputRecord::from_pairs([
            ("Name", "Maria"),
            ("City", "Recife"),
            ("Phone Number 2", "222"),
        ]);
        let p = PromptBuilder::new(PromptTemplate::default()).build(&rec);
        assert!(p.system.contains("valid JSON only"));
        assert!(p.user.starts_with("Respond in English."));
        assert!(p.user.contains("\"Maria\" from Brazil"));
        assert!(p.user.contains("City: Recife, State: ,"));
        assert!(p.user.contains("Phone 2: 222."));
        assert!(p.user.contains("\"craft_details\""));
        assert!(p.user.contains("\"product_photos\""));
    }

    #[test]
    fn language_and_country_are_configurable() {
        let rec = InputRecord::from_pairs([("name", "Ana")]);
        let p = PromptBuilder::new(PromptTemplate::new("Portuguese", "Portugal")).build(&rec);
        assert!(p.user.starts_with("Respond in Portuguese."));
        assert!(p.user.contains("from Portugal"));
    }
}
