use serde::{Deserialize, Serialize};

/// Description of a tag as returned by the tag-listing commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDescription {
    #[serde(rename = "tag_id")]
    pub id: String,
    #[serde(rename = "tag_name")]
    pub name: String,
    #[serde(rename = "tag_description", default)]
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_keys() {
        let tag = TagDescription {
            id: "site".into(),
            name: "Site".into(),
            description: "Physical site of the device".into(),
        };
        let value = serde_json::to_value(&tag).unwrap();
        assert_eq!(value["tag_id"], "site");
        assert_eq!(value["tag_name"], "Site");
        assert_eq!(value["tag_description"], "Physical site of the device");

        let parsed: TagDescription = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, tag);
    }
}
