use serde::Deserialize;

const PPE_CLASSES: [&str; 10] = [
    "person",
    "hard-hat",
    "gloves",
    "mask",
    "glasses",
    "boots",
    "vest",
    "ppe-suit",
    "ear-protector",
    "safety-harness",
];

/// Ordered class names; a name's position is its class index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ClassVocabulary {
    names: Vec<String>,
}

impl ClassVocabulary {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|candidate| candidate == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for ClassVocabulary {
    fn default() -> Self {
        Self::new(PPE_CLASSES.iter().map(|name| name.to_string()).collect())
    }
}
