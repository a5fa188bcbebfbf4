//! The emotion profile table.

use moodvoice_types::{
    builtin_profiles, normalize_label, EmotionProfile, ProfileError, DEFAULT_EMOTION,
};
use std::collections::BTreeMap;

/// Immutable mapping from normalized emotion label to profile.
///
/// Every profile is validated on construction, so anything reachable
/// through [`EmotionTable::lookup`] is safe to feed to the DSP chain.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionTable {
    profiles: BTreeMap<String, EmotionProfile>,
}

impl EmotionTable {
    /// Builds a table, normalizing labels and validating each profile.
    ///
    /// # Errors
    ///
    /// Returns the first invalid profile, `DuplicateLabel` when two labels
    /// normalize to the same key, or `MissingDefault` when no profile answers
    /// to [`DEFAULT_EMOTION`].
    pub fn from_profiles<I>(profiles: I) -> Result<Self, ProfileError>
    where
        I: IntoIterator<Item = (String, EmotionProfile)>,
    {
        let mut table = BTreeMap::new();
        for (label, profile) in profiles {
            let key = normalize_label(&label);
            profile.validate(&key)?;
            if table.insert(key.clone(), profile).is_some() {
                return Err(ProfileError::DuplicateLabel(key));
            }
        }
        if !table.contains_key(DEFAULT_EMOTION) {
            return Err(ProfileError::MissingDefault(DEFAULT_EMOTION));
        }
        Ok(Self { profiles: table })
    }

    /// The profiles shipped with the service.
    pub fn builtin() -> Self {
        Self {
            profiles: builtin_profiles()
                .into_iter()
                .map(|(label, profile)| (normalize_label(&label), profile))
                .collect(),
        }
    }

    /// Looks up a profile. Case and surrounding whitespace are ignored.
    pub fn lookup(&self, label: &str) -> Option<&EmotionProfile> {
        self.profiles.get(&normalize_label(label))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EmotionProfile)> {
        self.profiles.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Label to preferred voice, for introspection.
    pub fn voices(&self) -> BTreeMap<String, String> {
        self.profiles
            .iter()
            .map(|(label, profile)| (label.clone(), profile.voice.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for EmotionTable {
    fn default() -> Self {
        Self::builtin()
    }
}
