//! Binary assets discovered while rewriting documents.

use std::path::PathBuf;

/// A binary file to copy into a version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Asset {
    /// Current location of the file.
    pub source: PathBuf,
    /// Versioned location of the file.
    pub destination: PathBuf,
}

/// Accumulates assets in discovery order, once per source/destination pair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetRegistry {
    assets: Vec<Asset>,
}

impl AssetRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source/destination pair; repeated pairs are ignored.
    pub fn register(&mut self, source: PathBuf, destination: PathBuf) {
        let asset = Asset {
            source,
            destination,
        };
        if !self.assets.contains(&asset) {
            self.assets.push(asset);
        }
    }

    /// Consume the registry, returning its assets.
    #[must_use]
    pub fn into_assets(self) -> Vec<Asset> {
        self.assets
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_register_keeps_discovery_order() {
        let mut registry = AssetRegistry::new();
        registry.register(PathBuf::from("b.png"), PathBuf::from("2.0/b.png"));
        registry.register(PathBuf::from("a.png"), PathBuf::from("2.0/a.png"));

        let sources: Vec<_> = registry.into_assets().into_iter().map(|a| a.source).collect();
        assert_eq!(sources, vec![PathBuf::from("b.png"), PathBuf::from("a.png")]);
    }

    #[test]
    fn test_register_skips_repeated_pair() {
        let mut registry = AssetRegistry::new();
        registry.register(PathBuf::from("a.png"), PathBuf::from("2.0/a.png"));
        registry.register(PathBuf::from("b.png"), PathBuf::from("2.0/b.png"));
        registry.register(PathBuf::from("a.png"), PathBuf::from("2.0/a.png"));

        assert_eq!(registry.into_assets().len(), 2);
    }
}
