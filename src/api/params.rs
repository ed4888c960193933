/// Boolean query parameter accepting the spellings Python clients send:
/// `true`/`false`, `True`/`False`, `1`/`0`, `yes`/`no`, `on`/`off`, `t`/`f`, `y`/`n`.
pub mod lenient_bool {
    use serde::{de, Deserialize, Deserializer};

    pub fn parse(raw: &str) -> Option<bool> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "t" | "1" | "yes" | "y" | "on" => Some(true),
            "false" | "f" | "0" | "no" | "n" | "off" => Some(false),
            _ => None,
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| de::Error::invalid_value(de::Unexpected::Str(&raw), &"a boolean"))
    }
}
