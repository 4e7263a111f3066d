use serde::{Deserialize, Serialize};

/// How often the user wants to be reminded about a contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Weekly,
        Frequency::Biweekly,
        Frequency::Monthly,
        Frequency::Quarterly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
        }
    }

    /// Lenient parse of a service-provided value; unknown values yield `None`
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(raw))
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields the extraction service pulled out of a spoken contact description
///
/// Optional fields are only set when the service was confident about them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactExtraction {
    pub name: String,
    pub frequency: Option<Frequency>,
    pub notes: Option<String>,
    /// ISO date (`YYYY-MM-DD`)
    pub birthday: Option<String>,
    /// Raw transcript the fields were extracted from
    pub recognized_text: String,
}

impl ContactExtraction {
    /// Nothing usable was extracted
    pub fn is_empty(&self) -> bool {
        self.name.trim().is_empty()
    }
}

/// New-contact form state, as prefilled by voice or typed by hand
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContactDraft {
    pub name: String,
    pub frequency: Frequency,
    pub notes: String,
    pub birthday: String,
}

impl ContactDraft {
    /// Copy over whatever the extraction found, keeping existing values otherwise
    pub fn apply(&mut self, extraction: &ContactExtraction) {
        let name = extraction.name.trim();
        if !name.is_empty() {
            self.name = name.to_string();
        }
        if let Some(frequency) = extraction.frequency {
            self.frequency = frequency;
        }
        if let Some(notes) = extraction.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            self.notes = notes.to_string();
        }
        if let Some(birthday) = extraction.birthday.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
            self.birthday = birthday.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_parse_is_case_insensitive() {
        assert_eq!(Frequency::parse("Monthly"), Some(Frequency::Monthly));
        assert_eq!(Frequency::parse(" biweekly "), Some(Frequency::Biweekly));
        assert_eq!(Frequency::parse("daily"), None);
    }

    #[test]
    fn test_default_draft_is_weekly_and_blank() {
        let draft = ContactDraft::default();
        assert_eq!(draft.frequency, Frequency::Weekly);
        assert!(draft.name.is_empty() && draft.notes.is_empty() && draft.birthday.is_empty());
    }

    #[test]
    fn test_apply_keeps_fields_the_extraction_lacks() {
        let mut draft = ContactDraft {
            notes: "met at the conference".to_string(),
            ..Default::default()
        };
        draft.apply(&ContactExtraction {
            name: "Alisher".to_string(),
            frequency: Some(Frequency::Monthly),
            ..Default::default()
        });

        assert_eq!(draft.name, "Alisher");
        assert_eq!(draft.frequency, Frequency::Monthly);
        assert_eq!(draft.notes, "met at the conference");
        assert_eq!(draft.birthday, "");
    }
}
