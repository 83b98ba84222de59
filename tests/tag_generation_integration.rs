//! Integration tests for storing generated tags.
//!
//! A stub generator stands in for the HTTP backend so these tests exercise
//! request building, reconciliation against the catalogue and the write.

use std::cell::RefCell;

use anyhow::Result;
use loctag::ai::{
    AiError, GenerateTagsRequest, GenerationMode, TagGenerator, TagSuggestion, parse_response,
};
use loctag::store::LOCATIONS;
use loctag::tags::MatcherConfig;
use loctag::{Category, Database, DocumentStore, LocationId, TagMap, TagService};
use serde_json::json;

/// Replays canned response bodies, one per call.
struct ReplayGenerator {
    bodies: RefCell<Vec<&'static str>>,
}

impl TagGenerator for ReplayGenerator {
    fn generate_tags(&self, request: &GenerateTagsRequest) -> Result<TagSuggestion, AiError> {
        let body = self.bodies.borrow_mut().remove(0);
        parse_response(body, request.mode)
    }
}

fn catalogue() -> Result<TagService> {
    let service = TagService::new(Database::in_memory()?);
    service.import_locations(vec![
        json!({
            "id": "bormio",
            "name": "Bormio",
            "tags": { "sport": ["Mountain Biking", "Sci Alpinismo"], "info": ["Parcheggio"] }
        }),
        json!({
            "id": "livigno",
            "name": "Livigno",
            "description": "Duty-free ski resort",
            "services": ["Ski school", "Bike park"],
            "tags": { "vibe": ["Relax"] }
        }),
    ])?;
    Ok(service)
}

#[test]
fn test_seo_generation_converges_on_catalogue_tags() -> Result<()> {
    // Arrange
    let service = catalogue()?;
    let generator = ReplayGenerator {
        bodies: RefCell::new(vec![
            r#"{"status":"success","data":{
                "sport":["Biking","sci alpinismo","Padel","Padel indoor"],
                "info":["Parcheggio gratuito"],
                "vibe":["Relax","Relax"]
            }}"#,
        ]),
    };

    // Act
    let written = service.suggest_tags(
        &LocationId::new("livigno"),
        &generator,
        GenerationMode::Seo,
        "it",
        &MatcherConfig::default(),
    )?;

    // Assert: similar proposals reuse existing strings, new ones converge within the batch
    assert_eq!(
        written.get(Category::Sport),
        ["Mountain Biking", "Sci Alpinismo", "Padel"]
    );
    assert_eq!(written.get(Category::Info), ["Parcheggio"]);
    assert_eq!(written.get(Category::Vibe), ["Relax"]);

    let stored = service.store().get(LOCATIONS, "livigno")?.expect("livigno exists");
    assert_eq!(stored.body["name"], "Livigno");
    assert_eq!(stored.body["tags"]["info"], json!(["Parcheggio"]));

    Ok(())
}

#[test]
fn test_wizard_generation_replaces_selection_and_weights() -> Result<()> {
    let service = catalogue()?;
    let generator = ReplayGenerator {
        bodies: RefCell::new(vec![
            r#"{"status":"success","data":{"weights":{"vibe":{"relax":0.8},"target":{"family":0.6,"couples":0.4}}}}"#,
        ]),
    };

    let written = service.suggest_tags(
        &LocationId::new("livigno"),
        &generator,
        GenerationMode::Wizard,
        "it",
        &MatcherConfig::default(),
    )?;

    assert_eq!(written.get(Category::Target), ["couples", "family"]);
    let stored = service.store().get(LOCATIONS, "livigno")?.expect("livigno exists");
    assert_eq!(stored.body["tags"]["vibe"], json!(["relax"]));
    assert_eq!(stored.body["tagWeights"]["target"]["family"], 0.6);

    Ok(())
}

#[test]
fn test_backend_error_is_surfaced_without_writing() -> Result<()> {
    let service = catalogue()?;
    let generator = ReplayGenerator {
        bodies: RefCell::new(vec![r#"{"status":"error","message":"quota exceeded"}"#]),
    };

    let result = service.suggest_tags(
        &LocationId::new("livigno"),
        &generator,
        GenerationMode::Seo,
        "it",
        &MatcherConfig::default(),
    );

    let err = result.unwrap_err();
    assert!(err.chain().any(|cause| cause.is::<AiError>()));
    let stored = service.store().get(LOCATIONS, "livigno")?.expect("livigno exists");
    assert_eq!(stored.body["tags"], json!({ "vibe": ["Relax"] }));

    Ok(())
}

#[test]
fn test_custom_stop_words_change_matching() -> Result<()> {
    let proposed = || TagMap::from([(Category::Sport, vec!["E-Biking Tours"])]);
    let livigno = LocationId::new("livigno");

    let default_written = catalogue()?.apply_suggestion(
        &livigno,
        TagSuggestion::Seo(proposed()),
        &MatcherConfig::default(),
    )?;

    let mut config = MatcherConfig::default();
    config.stop_words.insert("biking".to_string());
    let custom_written =
        catalogue()?.apply_suggestion(&livigno, TagSuggestion::Seo(proposed()), &config)?;

    assert_eq!(default_written.get(Category::Sport), ["Mountain Biking"]);
    assert_eq!(custom_written.get(Category::Sport), ["E-Biking Tours"]);
    Ok(())
}
