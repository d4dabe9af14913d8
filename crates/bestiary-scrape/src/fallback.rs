use std::collections::HashSet;
use std::path::PathBuf;

use bestiary_core::{Subject, normalize_name};
use tracing::{error, info, warn};

use crate::resolver::{FailureReason, PageResolver};
use crate::store::ImageStore;

/// Tries a subject's alternative names in order until one yields a stored image.
pub struct FallbackStrategy {
    resolver: PageResolver,
    store: ImageStore,
    search_fallback: bool,
}

impl FallbackStrategy {
    pub fn new(resolver: PageResolver, store: ImageStore) -> Self {
        Self {
            resolver,
            store,
            search_fallback: false,
        }
    }

    pub fn with_search_fallback(mut self, enabled: bool) -> Self {
        self.search_fallback = enabled;
        self
    }

    /// Names to try, in order: the normalized name, each slash alternate,
    /// then the first word. Repeats and empty names are dropped.
    pub fn candidate_names(subject: &Subject) -> Vec<String> {
        let normalized = subject.normalized().to_string();
        let mut names = vec![normalized.clone()];
        names.extend(subject.alternates().into_iter().map(normalize_name));
        if let Some(first_word) = normalized.split_whitespace().next()
            && first_word != normalized
        {
            names.push(first_word.to_string());
        }

        let mut seen = HashSet::new();
        names.retain(|name| !name.is_empty() && seen.insert(name.clone()));
        names
    }

    /// Image path for `subject`, or `None` when every name failed.
    pub async fn resolve_subject(&self, subject: &Subject) -> Option<PathBuf> {
        self.try_resolve_subject(subject).await.ok()
    }

    pub async fn try_resolve_subject(
        &self,
        subject: &Subject,
    ) -> std::result::Result<PathBuf, FailureReason> {
        let mut tried = Vec::new();
        for name in Self::candidate_names(subject) {
            if let Some(path) = self.try_name(subject, &name).await {
                return Ok(path);
            }
            tried.push(name);
        }

        if self.search_fallback {
            match self.resolver.source().search_title(subject.normalized()).await {
                Ok(Some(title)) if !tried.contains(&title) => {
                    if let Some(path) = self.try_name(subject, &title).await {
                        return Ok(path);
                    }
                }
                Ok(_) => {}
                Err(e) => warn!(subject = %subject.raw, error = %e, "search fallback failed"),
            }
        }

        error!(subject = %subject.raw, "could not get an image");
        Err(FailureReason::AllFallbacksExhausted)
    }

    async fn try_name(&self, subject: &Subject, name: &str) -> Option<PathBuf> {
        match self.attempt(subject, name).await {
            Ok(path) => {
                info!(subject = %subject.raw, candidate = name, path = %path.display(), "image saved");
                Some(path)
            }
            Err(reason) => {
                warn!(subject = %subject.raw, candidate = name, reason = %reason, "attempt failed");
                None
            }
        }
    }

    /// One naming attempt with its own visited set.
    async fn attempt(
        &self,
        subject: &Subject,
        name: &str,
    ) -> std::result::Result<PathBuf, FailureReason> {
        let mut visited = HashSet::new();
        let src = self.resolver.resolve_chain(name, &mut visited).await?;

        let bytes = self
            .resolver
            .source()
            .fetch_image(&src)
            .await
            .map_err(|e| FailureReason::FetchError(e.to_string()))?;
        self.store
            .save(&subject.file_stem, &bytes)
            .await
            .map_err(|e| FailureReason::FetchError(e.to_string()))
    }
}
