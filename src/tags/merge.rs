//! Rewrites of one category list: rename, multi-tag merge and delete.
//!
//! Matching here is by exact string. Case variants are distinct tags for
//! these operations; the usage view lists them separately so the user can
//! pick them explicitly.

use std::collections::HashSet;

use thiserror::Error;

/// Invalid input to a tag rewrite, raised before any document is read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("Tag name cannot be empty")]
    EmptyTagName,

    #[error("New tag name is the same as the old one: {0}")]
    UnchangedTagName(String),

    #[error("Merging needs at least 2 source tags, got {got}")]
    NotEnoughSources { got: usize },

    #[error("No location uses the selected tags")]
    NoCandidates,
}

/// Validated input for a rename or merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    sources: HashSet<String>,
    destination: String,
}

impl MergePlan {
    /// Plans a single rename of `old` to `new`.
    ///
    /// The new name is trimmed. Fails when it is blank or equal to `old`.
    pub fn rename(old: &str, new: &str) -> Result<Self, TagError> {
        let destination = validated_name(new)?;
        if destination == old {
            return Err(TagError::UnchangedTagName(destination));
        }

        Ok(Self {
            sources: HashSet::from([old.to_string()]),
            destination,
        })
    }

    /// Plans a merge of two or more source tags into one destination.
    ///
    /// The destination may be one of the sources.
    pub fn merge<I, S>(sources: I, destination: &str) -> Result<Self, TagError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let destination = validated_name(destination)?;
        let sources: HashSet<String> = sources.into_iter().map(Into::into).collect();
        if sources.len() < 2 {
            return Err(TagError::NotEnoughSources { got: sources.len() });
        }

        Ok(Self {
            sources,
            destination,
        })
    }

    pub fn sources(&self) -> &HashSet<String> {
        &self.sources
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Applies the plan to one category list.
    ///
    /// Every entry equal to a source is removed, then the destination is
    /// appended unless the remaining list already holds it. Other entries
    /// keep their order, so a destination that is also a source moves to
    /// the end.
    ///
    /// # Examples
    ///
    /// ```
    /// use loctag::tags::MergePlan;
    ///
    /// let plan = MergePlan::merge(["Ski", "Skiing"], "Ski Alpino").unwrap();
    /// let list = vec!["Ski".to_string(), "Hiking".to_string(), "Skiing".to_string()];
    ///
    /// assert_eq!(plan.apply(&list), vec!["Hiking", "Ski Alpino"]);
    /// ```
    pub fn apply(&self, list: &[String]) -> Vec<String> {
        let mut result: Vec<String> = list
            .iter()
            .filter(|tag| !self.sources.contains(tag.as_str()))
            .cloned()
            .collect();

        if !result.contains(&self.destination) {
            result.push(self.destination.clone());
        }
        result
    }
}

fn validated_name(name: &str) -> Result<String, TagError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TagError::EmptyTagName);
    }
    Ok(trimmed.to_string())
}

/// Removes every exact occurrence of `tag` from a list.
///
/// Returns `None` when the list did not contain it.
pub fn remove_tag(list: &[String], tag: &str) -> Option<Vec<String>> {
    let kept: Vec<String> = list.iter().filter(|t| *t != tag).cloned().collect();
    (kept.len() != list.len()).then_some(kept)
}

/// Exact-string union of two lists, `first` order then new entries of
/// `second`.
pub fn union_tags(first: &[String], second: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    first
        .iter()
        .chain(second)
        .filter(|tag| seen.insert(tag.as_str()))
        .cloned()
        .collect()
}
