use serde::{Deserialize, Serialize};

/// A bounded slice of a filtered result.
///
/// `total` is `None` unless the caller asked for it: "not computed" is kept
/// apart from "zero matches".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataPage<T> {
    pub data: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
}

impl<T> DataPage<T> {
    pub fn new(data: Vec<T>, total: Option<usize>) -> Self { Self { data, total } }

    pub fn len(&self) -> usize { self.data.len() }

    pub fn is_empty(&self) -> bool { self.data.is_empty() }
}

impl<T> Default for DataPage<T> {
    fn default() -> Self { Self { data: Vec::new(), total: None } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_total_is_not_serialized() {
        let page = DataPage::new(vec![1, 2], None);
        assert_eq!(serde_json::to_string(&page).unwrap(), r#"{"data":[1,2]}"#);
        let counted = DataPage::new(Vec::<i32>::new(), Some(0));
        assert_eq!(serde_json::to_string(&counted).unwrap(), r#"{"data":[],"total":0}"#);
    }
}
