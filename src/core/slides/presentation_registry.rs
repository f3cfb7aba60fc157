use dashmap::DashMap;

use super::slides_error::SlidesError;
use super::slides_models::PresentationHandle;

/// Process-local lookup of presentations created in this session, keyed by
/// the title they were created with. Nothing is persisted; after a restart
/// callers have to pass IDs or URLs again.
#[derive(Debug, Default)]
pub struct PresentationRegistry {
    by_name: DashMap<String, PresentationHandle>,
}

impl PresentationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remembers `name → handle`. A later presentation with the same title
    /// replaces the earlier entry.
    pub fn register(&self, name: &str, handle: PresentationHandle) {
        if let Some(previous) = self.by_name.insert(name.to_string(), handle.clone()) {
            if previous != handle {
                tracing::debug!(name, previous = %previous, current = %handle, "Presentation name re-registered");
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<PresentationHandle> {
        self.by_name.get(name).map(|entry| entry.value().clone())
    }

    /// Resolves a tool argument that may be a registered name, a Slides URL
    /// or a bare presentation ID. Names win over IDs.
    pub fn resolve(&self, name_url_or_id: &str) -> Result<PresentationHandle, SlidesError> {
        let trimmed = name_url_or_id.trim();
        if let Some(handle) = self.lookup(trimmed) {
            return Ok(handle);
        }
        PresentationHandle::parse(trimmed).ok_or_else(|| {
            SlidesError::invalid(format!(
                "'{}' is neither a known presentation name nor a presentation ID or URL",
                name_url_or_id
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_take_precedence() {
        let registry = PresentationRegistry::new();
        registry.register("Quarterly", PresentationHandle::new("abc123"));

        assert_eq!(registry.resolve("Quarterly").unwrap().as_str(), "abc123");
        assert_eq!(registry.resolve("xyz789").unwrap().as_str(), "xyz789");
        assert_eq!(
            registry
                .resolve("https://docs.google.com/presentation/d/p42/edit")
                .unwrap()
                .as_str(),
            "p42"
        );
    }

    #[test]
    fn test_unknown_name_with_spaces_is_invalid() {
        let registry = PresentationRegistry::new();
        assert!(matches!(
            registry.resolve("My Deck"),
            Err(SlidesError::InvalidSpec(_))
        ));
    }

    #[test]
    fn test_reregister_replaces() {
        let registry = PresentationRegistry::new();
        registry.register("Deck", PresentationHandle::new("one"));
        registry.register("Deck", PresentationHandle::new("two"));
        assert_eq!(registry.lookup("Deck").unwrap().as_str(), "two");
        assert_eq!(registry.resolve("Deck").unwrap().as_str(), "two");
    }
}
