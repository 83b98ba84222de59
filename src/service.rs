use std::collections::{BTreeMap, HashSet};
use std::fmt;

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::ai::{GenerateTagsRequest, GenerationMode, TagGenerator, TagSuggestion};
use crate::models::{Category, Location, LocationAnalysis, LocationId, TagMap, TagUsage};
use crate::store::{DocumentStore, LOCATION_DETAILS, LOCATIONS, StoreError};
use crate::tags::{
    FuzzyMatcher, MatcherConfig, MergePlan, TagError, aggregate_seo_usage, aggregate_usage,
    analyze_locations, auto_cleanup, build_reference_sets, changed_categories, locations_using,
    remove_tag, union_tags,
};
use crate::utils::locations_from_documents;
use crate::Database;

/// Fields stored on the heavy `location_details` document rather than on
/// the listed location document.
pub const HEAVY_FIELDS: &[&str] = &[
    "services",
    "technicalData",
    "accessibility",
    "parking",
    "localMobility",
    "infoPoints",
    "medical",
    "advancedSkiing",
    "outdoorNonSki",
    "family",
    "rentals",
    "eventsAndSeasonality",
    "gastronomy",
    "digital",
    "practicalTips",
    "openingHours",
    "safety",
    "sustainability",
    "aiGenerationMetadata",
    "profile",
];

/// Invalid input to a location-level operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location {0} not found")]
    NotFound(LocationId),

    #[error("At least one source location is required")]
    NoSources,

    #[error("Location {0} cannot be merged into itself")]
    MasterInSources(LocationId),

    #[error("Imported document #{0} has no string \"id\" field")]
    MissingId(usize),
}

/// Outcome of an operation applied independently to several locations.
///
/// Writes are not transactional across locations: everything listed in
/// `updated` is committed even when `failed` is non-empty.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Number of candidate locations.
    pub requested: usize,
    /// Locations whose document was written.
    pub updated: Vec<LocationId>,
    /// Locations read successfully that needed no change.
    pub unchanged: Vec<LocationId>,
    /// Locations that no longer exist.
    pub skipped: Vec<LocationId>,
    /// Locations whose read or write failed. The batch stops at the first.
    pub failed: Vec<(LocationId, StoreError)>,
    /// Locations never attempted because the batch stopped early.
    pub pending: Vec<LocationId>,
}

impl BatchReport {
    /// True when every candidate was processed without a store error.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.pending.is_empty()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "updated {} of {} locations",
            self.updated.len(),
            self.requested
        )?;
        if !self.unchanged.is_empty() {
            write!(f, ", {} unchanged", self.unchanged.len())?;
        }
        if !self.skipped.is_empty() {
            write!(f, ", {} skipped (no longer exist)", self.skipped.len())?;
        }
        if !self.failed.is_empty() {
            write!(f, ", {} failed", self.failed.len())?;
        }
        if !self.pending.is_empty() {
            write!(f, ", {} not attempted", self.pending.len())?;
        }
        Ok(())
    }
}

enum Outcome {
    Updated,
    Unchanged,
    Missing,
}

/// Runs `step` for each id in order, stopping at the first store error.
fn run_batch<F>(ids: &[LocationId], mut step: F) -> BatchReport
where
    F: FnMut(&LocationId) -> Result<Outcome, StoreError>,
{
    let mut report = BatchReport {
        requested: ids.len(),
        ..Default::default()
    };

    for (index, id) in ids.iter().enumerate() {
        match step(id) {
            Ok(Outcome::Updated) => {
                debug!(location = %id, "location updated");
                report.updated.push(id.clone());
            }
            Ok(Outcome::Unchanged) => report.unchanged.push(id.clone()),
            Ok(Outcome::Missing) | Err(StoreError::NotFound { .. }) => {
                info!(location = %id, "location no longer exists, skipping");
                report.skipped.push(id.clone());
            }
            Err(e) => {
                warn!(location = %id, error = %e, "store call failed, stopping batch");
                report.failed.push((id.clone(), e));
                report.pending = ids[index + 1..].to_vec();
                break;
            }
        }
    }

    report
}

/// Result of auto-cleanup on one location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// These categories lost at least one entry.
    Cleaned(Vec<Category>),
    /// No normalized tag repeated.
    AlreadyClean,
    /// The location no longer exists.
    Missing,
}

/// Result of merging duplicate location records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationMergeReport {
    /// Sources whose tags were folded into the master and which were deleted.
    pub merged: Vec<LocationId>,
    /// Sources that no longer existed.
    pub skipped: Vec<LocationId>,
}

/// Tag maintenance over a document store.
///
/// Reads documents, runs the pure functions in [`crate::tags`], and writes
/// each affected location back with a dotted-path update of the categories
/// it touched. No operation retries a store call.
///
/// # Examples
///
/// ```
/// use loctag::{Category, Database, TagService};
///
/// # fn main() -> anyhow::Result<()> {
/// let service = TagService::new(Database::in_memory()?);
/// service.import_locations(vec![serde_json::json!({
///     "id": "livigno",
///     "name": "Livigno",
///     "tags": { "sport": ["Ski", "Skiing"] }
/// })])?;
///
/// let usage = service.tag_usage(Category::Sport)?;
/// assert_eq!(usage.len(), 2);
/// # Ok(())
/// # }
/// ```
pub struct TagService<S: DocumentStore = Database> {
    store: S,
}

impl<S: DocumentStore> TagService<S> {
    /// Creates a new service owning the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Loads every location into memory.
    pub fn load_locations(&self) -> Result<Vec<Location>> {
        let documents = self
            .store
            .list(LOCATIONS)
            .context("Failed to load locations")?;
        Ok(locations_from_documents(&documents))
    }

    /// Loads one location, `None` if absent.
    pub fn get_location(&self, id: &LocationId) -> Result<Option<Location>> {
        let document = self
            .store
            .get(LOCATIONS, id.as_str())
            .with_context(|| format!("Failed to load location {id}"))?;
        Ok(document.map(|doc| Location::from_document(doc.id.as_str(), &doc.body)))
    }

    /// Usage table for one category.
    pub fn tag_usage(&self, category: Category) -> Result<Vec<TagUsage>> {
        let locations = self.load_locations()?;
        Ok(aggregate_usage(&locations, category))
    }

    /// Usage tables for every SEO category.
    pub fn seo_usage(&self) -> Result<BTreeMap<Category, Vec<TagUsage>>> {
        let locations = self.load_locations()?;
        Ok(aggregate_seo_usage(&locations))
    }

    /// Duplicate reports for every location, most duplicated first.
    pub fn analyze_duplicates(&self) -> Result<Vec<LocationAnalysis>> {
        let locations = self.load_locations()?;
        Ok(analyze_locations(&locations))
    }

    fn read_location(&self, id: &LocationId) -> Result<Option<Location>, StoreError> {
        Ok(self
            .store
            .get(LOCATIONS, id.as_str())?
            .map(|doc| Location::from_document(doc.id.as_str(), &doc.body)))
    }

    fn write_categories(
        &self,
        id: &LocationId,
        tags: &TagMap,
        categories: &[Category],
    ) -> Result<(), StoreError> {
        let fields = categories
            .iter()
            .map(|category| (format!("tags.{category}"), json!(tags.get(*category))))
            .collect();
        self.store.update(LOCATIONS, id.as_str(), fields)
    }

    fn cleanup_step(&self, id: &LocationId) -> Result<(Outcome, Vec<Category>), StoreError> {
        let Some(location) = self.read_location(id)? else {
            return Ok((Outcome::Missing, Vec::new()));
        };

        let cleaned = auto_cleanup(location.tags(), &Category::ALL);
        let changed = changed_categories(location.tags(), &cleaned);
        if changed.is_empty() {
            return Ok((Outcome::Unchanged, changed));
        }

        self.write_categories(id, &cleaned, &changed)?;
        Ok((Outcome::Updated, changed))
    }

    /// Removes repeated tags from one location, keeping each in its
    /// highest-priority category. Other locations are not touched.
    pub fn cleanup_location(&self, id: &LocationId) -> Result<CleanupOutcome> {
        let (outcome, changed) = match self.cleanup_step(id) {
            Err(StoreError::NotFound { .. }) => (Outcome::Missing, Vec::new()),
            other => other.with_context(|| format!("Failed to clean up location {id}"))?,
        };

        Ok(match outcome {
            Outcome::Updated => {
                info!(location = %id, categories = ?changed, "duplicate tags removed");
                CleanupOutcome::Cleaned(changed)
            }
            Outcome::Unchanged => CleanupOutcome::AlreadyClean,
            Outcome::Missing => CleanupOutcome::Missing,
        })
    }

    /// Runs auto-cleanup on every location currently reporting duplicates.
    pub fn cleanup_all(&self) -> Result<BatchReport> {
        let ids: Vec<LocationId> = self
            .analyze_duplicates()?
            .into_iter()
            .filter(|analysis| !analysis.is_clean())
            .map(|analysis| analysis.id)
            .collect();

        let report = run_batch(&ids, |id| self.cleanup_step(id).map(|(outcome, _)| outcome));
        info!(%report, "bulk cleanup finished");
        Ok(report)
    }

    fn rewrite_category<F>(&self, category: Category, ids: &[LocationId], mut rewrite: F) -> BatchReport
    where
        F: FnMut(&[String]) -> Option<Vec<String>>,
    {
        run_batch(ids, |id| {
            let Some(mut location) = self.read_location(id)? else {
                return Ok(Outcome::Missing);
            };
            let Some(next) = rewrite(location.tags().get(category)) else {
                return Ok(Outcome::Unchanged);
            };

            location.tags_mut().set(category, next);
            self.write_categories(id, location.tags(), &[category])?;
            Ok(Outcome::Updated)
        })
    }

    /// Renames `old` to `new` in one category on the given locations.
    ///
    /// The ids normally come from the usage entry of `old`. Afterwards `old`
    /// is absent from every touched list and `new` appears exactly once.
    pub fn rename_tag(
        &self,
        category: Category,
        old: &str,
        new: &str,
        location_ids: &[LocationId],
    ) -> Result<BatchReport> {
        let plan = MergePlan::rename(old, new)?;
        if location_ids.is_empty() {
            return Err(TagError::NoCandidates.into());
        }

        let report = self.apply_plan(category, &plan, location_ids);
        info!(%category, old, new = plan.destination(), %report, "tag renamed");
        Ok(report)
    }

    /// Merges several tags of one category into `destination`.
    ///
    /// Candidates are every location listed under any source in `usages`.
    pub fn merge_tags(
        &self,
        category: Category,
        sources: &[String],
        destination: &str,
        usages: &[TagUsage],
    ) -> Result<BatchReport> {
        let plan = MergePlan::merge(sources.iter().cloned(), destination)?;
        let candidates = locations_using(usages, plan.sources());
        if candidates.is_empty() {
            return Err(TagError::NoCandidates.into());
        }

        let report = self.apply_plan(category, &plan, &candidates);
        info!(%category, destination = plan.destination(), %report, "tags merged");
        Ok(report)
    }

    fn apply_plan(&self, category: Category, plan: &MergePlan, ids: &[LocationId]) -> BatchReport {
        self.rewrite_category(category, ids, |list| {
            let next = plan.apply(list);
            (next.as_slice() != list).then_some(next)
        })
    }

    /// Deletes every exact occurrence of `tag` from one category on the
    /// given locations. Only locations whose list changed count as updated.
    pub fn delete_tag(
        &self,
        category: Category,
        tag: &str,
        location_ids: &[LocationId],
    ) -> Result<BatchReport> {
        if tag.trim().is_empty() {
            return Err(TagError::EmptyTagName.into());
        }

        let report = self.rewrite_category(category, location_ids, |list| remove_tag(list, tag));
        info!(%category, tag, %report, "tag deleted");
        Ok(report)
    }

    /// Stores a generated suggestion on one location.
    ///
    /// SEO suggestions are reconciled per SEO category against every tag
    /// already used in that category, then replace the suggested categories.
    /// Wizard suggestions select every weighted tag id and store the weights
    /// under `tagWeights`. Returns the category lists written.
    pub fn apply_suggestion(
        &self,
        id: &LocationId,
        suggestion: TagSuggestion,
        matcher_config: &MatcherConfig,
    ) -> Result<TagMap> {
        let mut fields: Vec<(String, Value)> = Vec::new();
        let mut written = TagMap::new();

        match suggestion {
            TagSuggestion::Seo(proposed) => {
                let locations = self.load_locations()?;
                let mut references = build_reference_sets(&locations);
                let matcher = FuzzyMatcher::new(matcher_config);

                for (key, proposals) in proposed.iter() {
                    let reference = match key.parse::<Category>() {
                        Ok(category) if category.is_seo() => references.get_mut(&category),
                        _ => None,
                    };
                    let accepted = match reference {
                        Some(reference) => matcher.reconcile(proposals, reference),
                        None => union_tags(proposals, &[]),
                    };
                    fields.push((format!("tags.{key}"), json!(accepted)));
                    written.set_raw(key, accepted);
                }
            }
            TagSuggestion::Wizard(weights) => {
                for (key, tag_weights) in &weights {
                    let selected: Vec<String> = tag_weights.keys().cloned().collect();
                    fields.push((format!("tags.{key}"), json!(selected)));
                    written.set_raw(key.clone(), selected);
                }
                fields.push(("tagWeights".to_string(), serde_json::to_value(&weights)?));
            }
        }

        match self.store.update(LOCATIONS, id.as_str(), fields) {
            Err(StoreError::NotFound { .. }) => Err(LocationError::NotFound(id.clone()).into()),
            other => other.with_context(|| format!("Failed to store tags on location {id}")),
        }?;

        info!(location = %id, "generated tags stored");
        Ok(written)
    }

    /// Asks the generator for tags for one location and stores them.
    pub fn suggest_tags(
        &self,
        id: &LocationId,
        generator: &dyn TagGenerator,
        mode: GenerationMode,
        language: &str,
        matcher_config: &MatcherConfig,
    ) -> Result<TagMap> {
        let document = self
            .store
            .get(LOCATIONS, id.as_str())
            .with_context(|| format!("Failed to load location {id}"))?
            .ok_or_else(|| LocationError::NotFound(id.clone()))?;
        let details = self
            .store
            .get(LOCATION_DETAILS, id.as_str())
            .with_context(|| format!("Failed to load details of location {id}"))?;

        let text = |field: &str| {
            document
                .body
                .get(field)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let services = details
            .as_ref()
            .and_then(|doc| doc.body.get("services"))
            .or_else(|| document.body.get("services"))
            .cloned()
            .unwrap_or_else(|| json!([]));

        let request = GenerateTagsRequest {
            location_name: text("name"),
            description: text("description"),
            services,
            language: language.to_string(),
            mode,
        };

        let suggestion = generator
            .generate_tags(&request)
            .context("Tag generation failed")?;
        self.apply_suggestion(id, suggestion, matcher_config)
    }

    /// Folds duplicate location records into `master`.
    ///
    /// Every tag category of the master becomes the exact-string union of
    /// the master list followed by each source list. Sources are then
    /// deleted from both collections. Missing sources are skipped.
    pub fn merge_locations(
        &self,
        master: &LocationId,
        sources: &[LocationId],
    ) -> Result<LocationMergeReport> {
        if sources.is_empty() {
            return Err(LocationError::NoSources.into());
        }
        if sources.contains(master) {
            return Err(LocationError::MasterInSources(master.clone()).into());
        }

        let mut merged_location = self
            .get_location(master)?
            .ok_or_else(|| LocationError::NotFound(master.clone()))?;

        let mut report = LocationMergeReport::default();
        let mut seen = HashSet::new();
        for source_id in sources.iter().filter(|id| seen.insert(*id)) {
            let Some(source) = self.get_location(source_id)? else {
                info!(location = %source_id, "merge source no longer exists, skipping");
                report.skipped.push(source_id.clone());
                continue;
            };

            for (key, list) in source.tags().iter() {
                let combined = union_tags(merged_location.tags().get_raw(key), list);
                merged_location.tags_mut().set_raw(key, combined);
            }
            report.merged.push(source_id.clone());
        }

        let fields = merged_location
            .tags()
            .iter()
            .map(|(key, list)| (format!("tags.{key}"), json!(list)))
            .collect();
        self.store
            .update(LOCATIONS, master.as_str(), fields)
            .with_context(|| format!("Failed to update master location {master}"))?;

        let merged_ids: Vec<String> = report.merged.iter().map(|id| id.to_string()).collect();
        for collection in [LOCATIONS, LOCATION_DETAILS] {
            self.store
                .delete_many(collection, &merged_ids)
                .with_context(|| format!("Failed to delete merged locations from {collection}"))?;
        }

        info!(
            %master,
            merged = report.merged.len(),
            skipped = report.skipped.len(),
            "locations merged"
        );
        Ok(report)
    }

    /// Deletes a location together with its details document.
    pub fn delete_location(&self, id: &LocationId) -> Result<()> {
        self.store
            .delete(LOCATIONS, id.as_str())
            .with_context(|| format!("Failed to delete location {id}"))?;
        self.store
            .delete(LOCATION_DETAILS, id.as_str())
            .with_context(|| format!("Failed to delete details of location {id}"))?;
        debug!(location = %id, "location deleted");
        Ok(())
    }

    /// Stores location documents, splitting heavy fields into the details
    /// collection. Each document needs a string `id`. Returns how many were
    /// written.
    pub fn import_locations(&self, documents: Vec<Value>) -> Result<usize> {
        let mut imported = 0;

        for (index, document) in documents.into_iter().enumerate() {
            let Value::Object(mut body) = document else {
                return Err(LocationError::MissingId(index).into());
            };
            let id = match body.remove("id") {
                Some(Value::String(id)) if !id.trim().is_empty() => id,
                _ => return Err(LocationError::MissingId(index).into()),
            };

            let (light, heavy) = split_heavy_fields(body);
            self.store
                .set(LOCATIONS, &id, Value::Object(light), false)
                .with_context(|| format!("Failed to import location {id}"))?;
            if !heavy.is_empty() {
                self.store
                    .set(LOCATION_DETAILS, &id, Value::Object(heavy), true)
                    .with_context(|| format!("Failed to import details of location {id}"))?;
            }
            imported += 1;
        }

        info!(imported, "locations imported");
        Ok(imported)
    }

    /// Returns every location with its details folded back in and its `id`
    /// set, in id order.
    pub fn export_locations(&self) -> Result<Vec<Value>> {
        let documents = self
            .store
            .list(LOCATIONS)
            .context("Failed to load locations")?;

        let mut exported = Vec::with_capacity(documents.len());
        for document in documents {
            let mut body = match document.body {
                Value::Object(map) => map,
                _ => Map::new(),
            };
            let details = self
                .store
                .get(LOCATION_DETAILS, &document.id)
                .with_context(|| format!("Failed to load details of location {}", document.id))?;
            if let Some(Value::Object(heavy)) = details.map(|doc| doc.body) {
                body.extend(heavy);
            }
            body.insert("id".to_string(), Value::String(document.id));
            exported.push(Value::Object(body));
        }

        Ok(exported)
    }
}

fn split_heavy_fields(body: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    body.into_iter()
        .partition(|(key, _)| !HEAVY_FIELDS.contains(&key.as_str()))
}
