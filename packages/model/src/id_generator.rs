use crc32fast::Hasher;

/// Generate a document seed from its name using CRC32
pub fn get_document_seed(name: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(name.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Sequential ID generator for nodes created inside one document
#[derive(Debug, Clone)]
pub struct IdGenerator {
    seed: String,
    count: u32,
}

impl IdGenerator {
    pub fn new(document_name: &str) -> Self {
        Self {
            seed: get_document_seed(document_name),
            count: 0,
        }
    }

    pub fn from_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            count: 0,
        }
    }

    /// Skip past every `{seed}-{n}` id already present so loaded content
    /// never collides with freshly generated nodes.
    pub fn resume_after<'a>(&mut self, existing: impl IntoIterator<Item = &'a str>) {
        let prefix = format!("{}-", self.seed);
        for id in existing {
            if let Some(n) = id.strip_prefix(&prefix).and_then(|n| n.parse::<u32>().ok()) {
                self.count = self.count.max(n);
            }
        }
    }

    /// Generate next sequential ID
    pub fn new_id(&mut self) -> String {
        self.count += 1;
        format!("{}-{}", self.seed, self.count)
    }

    pub fn seed(&self) -> &str {
        &self.seed
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new("untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_seed_is_stable() {
        assert_eq!(get_document_seed("lesson-1"), get_document_seed("lesson-1"));
        assert_ne!(get_document_seed("lesson-1"), get_document_seed("lesson-2"));
    }

    #[test]
    fn test_sequential_ids() {
        let mut ids = IdGenerator::from_seed("doc");
        assert_eq!(ids.new_id(), "doc-1");
        assert_eq!(ids.new_id(), "doc-2");
        assert_eq!(ids.seed(), "doc");
    }

    #[test]
    fn test_resume_after_existing_ids() {
        let mut ids = IdGenerator::from_seed("doc");
        ids.resume_after(["doc-4", "doc-11", "other-40", "doc-x"]);
        assert_eq!(ids.new_id(), "doc-12");
    }
}
