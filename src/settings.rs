use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::iter::FromIterator;

use crate::viewer::UserId;

/// The single configuration record persisted by the host.
///
/// Stored layout: `{ "allowed_admins": [int], "custom_css": string }`, both
/// keys optional.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_admins: Option<AllowList>,

    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_css: Option<String>,
}

impl Settings {
    /// Reads whatever the host stored under the option name.
    ///
    /// Anything that is not a JSON object (`null`, `false`, `""`, `[]`) means
    /// the plugin was never configured.
    pub fn from_stored(raw: serde_json::Value) -> crate::Result<Option<Settings>> {
        if !raw.is_object() {
            return Ok(None);
        }
        let settings: Settings = serde_json::from_value(raw)?;
        Ok(Some(settings))
    }

    /// No allow-list and no custom CSS: nobody gets restricted.
    pub fn is_empty(&self) -> bool {
        self.allow_list_is_empty()
            && self
                .custom_css
                .as_deref()
                .map_or(true, |css| css.trim().is_empty())
    }

    pub fn allow_list_is_empty(&self) -> bool {
        self.allowed_admins.as_ref().map_or(true, AllowList::is_empty)
    }

    pub fn is_allowed(&self, id: UserId) -> bool {
        self.allowed_admins
            .as_ref()
            .map_or(false, |list| list.contains(id))
    }

    pub fn custom_css(&self) -> Option<&str> {
        self.custom_css.as_deref()
    }
}

/// Allowed administrator ids.
///
/// Entries are coerced on read; entries that do not coerce to a user id are
/// kept as non-matching holes so the list still counts as "present".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AllowList(Vec<Option<UserId>>);

impl AllowList {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.0.iter().any(|entry| *entry == Some(id))
    }

    pub fn ids(&self) -> BTreeSet<UserId> {
        self.0.iter().flatten().copied().collect()
    }
}

impl FromIterator<UserId> for AllowList {
    fn from_iter<T: IntoIterator<Item = UserId>>(iter: T) -> Self {
        let unique: BTreeSet<UserId> = iter.into_iter().collect();
        AllowList(unique.into_iter().map(Some).collect())
    }
}

impl<'de> Deserialize<'de> for AllowList {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let entries = match raw {
            serde_json::Value::Null => Vec::new(),
            serde_json::Value::Array(values) => values.iter().map(UserId::coerce).collect(),
            // form submissions serialized by the host keep their numeric keys
            serde_json::Value::Object(map) => map.values().map(UserId::coerce).collect(),
            scalar => vec![UserId::coerce(&scalar)],
        };
        Ok(AllowList(entries))
    }
}

impl Serialize for AllowList {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.ids())
    }
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match raw {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;
    use std::fs::File;
    use std::io::BufReader;

    fn read_options_file(path: &str) -> Result<serde_json::Value> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let v = serde_json::from_reader(reader)?;

        Ok(v)
    }

    #[test]
    fn unset_option_means_no_configuration() -> Result<()> {
        for raw in vec![json!(null), json!(false), json!(""), json!([])] {
            assert_eq!(Settings::from_stored(raw)?, None);
        }

        Ok(())
    }

    #[test]
    fn read_full_record() -> Result<()> {
        let settings = Settings::from_stored(read_options_file("test_data/options_full.json")?)?
            .expect("record present");

        assert!(!settings.is_empty());
        assert!(settings.is_allowed(UserId(1)));
        assert!(settings.is_allowed(UserId(4)));
        assert!(!settings.is_allowed(UserId(2)));
        assert_eq!(settings.custom_css(), Some(".update-nag { display: none; }"));

        Ok(())
    }

    #[test]
    fn read_record_with_malformed_entries() -> Result<()> {
        let settings = Settings::from_stored(read_options_file("test_data/options_malformed.json")?)?
            .expect("record present");

        assert!(!settings.allow_list_is_empty());
        assert!(settings.is_allowed(UserId(7)));
        assert!(settings.is_allowed(UserId(12)));
        assert_eq!(
            settings.allowed_admins.as_ref().map(AllowList::ids),
            Some([UserId(7), UserId(12)].iter().copied().collect::<BTreeSet<_>>())
        );

        Ok(())
    }

    #[test]
    fn allow_list_of_garbage_is_present_but_matches_nobody() -> Result<()> {
        let settings: Settings = serde_json::from_value(json!({"allowed_admins": ["abc", null]}))?;

        assert!(!settings.allow_list_is_empty());
        assert!(!settings.is_empty());
        assert!(settings.allowed_admins.as_ref().map_or(false, |l| l.ids().is_empty()));

        Ok(())
    }

    #[test]
    fn blank_css_and_empty_list_is_empty() -> Result<()> {
        let settings: Settings =
            serde_json::from_value(json!({"allowed_admins": [], "custom_css": "  \n"}))?;

        assert!(settings.is_empty());

        Ok(())
    }

    #[test]
    fn stored_layout() -> Result<()> {
        let settings = Settings {
            allowed_admins: Some(vec![UserId(9), UserId(3), UserId(9)].into_iter().collect()),
            custom_css: Some("#wpbody .notice{display:none}".into()),
        };

        assert_eq!(
            serde_json::to_value(&settings)?,
            json!({"allowed_admins": [3, 9], "custom_css": "#wpbody .notice{display:none}"})
        );

        Ok(())
    }
}
