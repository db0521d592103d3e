use crate::core::document::{Document, Element};
use crate::core::mapping::normalize_id;
use std::borrow::Cow;

pub const CUSTOMER: &str = "customer";
pub const ID_ATTRIBUTE: &str = "id";

/// A located record plus the namespace declarations it inherits from
/// ancestors below the document root.
#[derive(Debug, Clone)]
pub struct Located<'a> {
    pub record: &'a Element,
    /// Nearest ancestor first.
    pub inherited: Vec<(&'a str, &'a str)>,
}

impl<'a> Located<'a> {
    /// The record made self-contained: inherited declarations it does not
    /// redeclare itself are copied onto it. Root declarations are carried by
    /// the output root and are not repeated here.
    pub fn detached(&self) -> Cow<'a, Element> {
        let record = self.record;
        if self
            .inherited
            .iter()
            .all(|(key, _)| record.attribute(key).is_some())
        {
            return Cow::Borrowed(record);
        }

        let mut owned = record.clone();
        for (key, value) in &self.inherited {
            if owned.attribute(key).is_none() {
                owned.set_attribute(key, *value);
            }
        }
        Cow::Owned(owned)
    }
}

/// Finds the customer record whose `id` equals `current_id`.
///
/// Records are searched at any depth in document order and the first match
/// wins when an export contains the same id twice.
pub fn locate<'a>(document: &'a Document, namespace: &str, current_id: &str) -> Option<Located<'a>> {
    let wanted = normalize_id(current_id);
    let is_match = |element: &Element| {
        element.is(namespace, CUSTOMER) && element.attribute(ID_ATTRIBUTE) == Some(wanted.as_str())
    };

    if is_match(&document.root) {
        return Some(Located {
            record: &document.root,
            inherited: Vec::new(),
        });
    }
    search(&document.root, &is_match, &mut Vec::new())
}

fn search<'a, F>(
    parent: &'a Element,
    is_match: &F,
    scope: &mut Vec<(&'a str, &'a str)>,
) -> Option<Located<'a>>
where
    F: Fn(&Element) -> bool,
{
    for child in parent.elements() {
        if is_match(child) {
            return Some(Located {
                record: child,
                inherited: scope.iter().rev().copied().collect(),
            });
        }

        let mark = scope.len();
        scope.extend(child.namespace_declarations());
        let found = search(child, is_match, scope);
        scope.truncate(mark);
        if found.is_some() {
            return found;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "urn:customer";

    fn source() -> Document {
        Document::parse(
            r#"<enfinity xmlns="urn:customer" xmlns:o="urn:other">
  <customer id="1001"><customer-no>first</customer-no></customer>
  <group><customer id="1002"/></group>
  <customer id="1001"><customer-no>second</customer-no></customer>
  <o:customer id="3003"/>
</enfinity>"#,
        )
        .unwrap()
    }

    #[test]
    fn test_locate_first_match_in_document_order() {
        let doc = source();
        let found = locate(&doc, NS, "1001").unwrap();
        assert_eq!(found.record.elements().next().unwrap().text(), Some("first"));
        assert!(found.inherited.is_empty());
        assert!(matches!(found.detached(), Cow::Borrowed(_)));
    }

    #[test]
    fn test_locate_nested_record() {
        let doc = source();
        assert!(locate(&doc, NS, "1002").is_some());
        assert!(locate(&doc, NS, " 1002 ").is_some());
    }

    #[test]
    fn test_locate_requires_exact_id_and_namespace() {
        let doc = source();
        assert!(locate(&doc, NS, "100").is_none());
        assert!(locate(&doc, NS, "3003").is_none());
        assert!(locate(&doc, "urn:other", "3003").is_some());
    }

    #[test]
    fn test_nested_record_carries_ancestor_declarations() {
        let doc = Document::parse(
            r#"<enfinity xmlns="urn:customer">
  <batch xmlns:x="urn:outer"><inner xmlns:x="urn:inner" xmlns:y="urn:y">
    <customer id="5005" xmlns:y="urn:own"><x:note>n</x:note></customer>
  </inner></batch>
</enfinity>"#,
        )
        .unwrap();

        let found = locate(&doc, NS, "5005").unwrap();
        assert_eq!(found.inherited.len(), 3);

        let record = found.detached().into_owned();
        // 最近的祖先宣告優先，紀錄本身的宣告不被覆蓋
        assert_eq!(record.attribute("xmlns:x"), Some("urn:inner"));
        assert_eq!(record.attribute("xmlns:y"), Some("urn:own"));
        assert_eq!(record.attribute("xmlns"), None);

        let standalone = Document::new(record).to_xml().unwrap();
        let reparsed = Document::from_bytes(&standalone).unwrap();
        assert_eq!(reparsed.root.elements().next().unwrap().namespace.as_deref(), Some("urn:inner"));
    }
}
