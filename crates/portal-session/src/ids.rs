use uuid::Uuid;

/// Source of opaque identifiers for messages and conversations.
///
/// Identifiers are only compared for equality; nothing depends on their
/// structure. Injectable so tests can use predictable values.
pub trait IdSource: Send + Sync {
    fn generate(&self) -> String;
}

/// Random UUID v4 source, the default outside of tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidSource;

impl IdSource for UuidSource {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uuid_source_yields_distinct_ids() {
        let source = UuidSource;
        assert_ne!(source.generate(), source.generate());
    }
}
