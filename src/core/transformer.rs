//! Customer record rewrite.
//!
//! Every transformation works on a deep clone of the located record, so the
//! source document is never modified and can be reused across runs.

use crate::core::document::Element;
use crate::core::locator::ID_ATTRIBUTE;
use crate::domain::model::{ResolvedRow, RewriteRules};

pub const CUSTOM_ATTRIBUTES: &str = "custom-attributes";
pub const CUSTOM_ATTRIBUTE: &str = "custom-attribute";
pub const USER: &str = "user";
pub const USER_GROUPS: &str = "user-groups";
pub const USER_GROUP: &str = "user-group";
pub const CREDENTIALS: &str = "credentials";
pub const LAST_LOGGED_IN: &str = "last-logged-in";
pub const PROFILE: &str = "profile";
pub const CREATION_DATE: &str = "creation-date";
pub const BUSINESS_PARTNER_NO: &str = "business-partner-no";

pub const ATTR_COMPANY: &str = "MEK_Company";
pub const ATTR_STORE_ID: &str = "MEK_Store_Id";
pub const ATTR_WAREHOUSE_ID: &str = "MEK_WarehouseID";
pub const ATTR_STORE_NAME: &str = "MEK_Store_Name";
pub const ATTR_DATA_AREA_ID: &str = "MEK_DataAreaID";
pub const ATTR_SOURCE_ID: &str = "MEK_SourceID";
pub const ATTR_SYSTEM_ID: &str = "MEK_SystemID";
pub const ATTR_ORDER_NUMBER_MANDATORY: &str = "MEK_CustomerOrderNumberMandatory";
pub const ATTR_DEFAULT_DELIVERY_DAY: &str = "MEK_DefaultDeliveryday";
pub const ATTR_LAST_ORDER_DATE: &str = "LastOrderDate";

const DEFAULT_DATATYPE_PREFIX: &str = "dt";

#[derive(Debug, Default, Clone, Copy)]
struct SeenAttributes {
    order_number_mandatory: bool,
    default_delivery_day: bool,
}

pub struct CustomerTransformer<'a> {
    rules: &'a RewriteRules,
    processing_date: &'a str,
    /// Prefix the source root binds to the datatype namespace.
    datatype_prefix: Option<String>,
}

impl<'a> CustomerTransformer<'a> {
    pub fn new(rules: &'a RewriteRules, processing_date: &'a str, source_root: &Element) -> Self {
        let datatype_prefix = source_root
            .prefix_for_namespace(&rules.namespaces.datatype)
            .flatten()
            .map(str::to_owned);
        Self {
            rules,
            processing_date,
            datatype_prefix,
        }
    }

    fn core_ns(&self) -> &str {
        &self.rules.namespaces.core
    }

    /// Returns a migrated copy of `record` according to `row`.
    pub fn transform(&self, record: &Element, row: &ResolvedRow) -> Element {
        let mut customer = record.clone();
        customer.set_attribute(ID_ATTRIBUTE, row.new_id.as_str());

        let seen = self.rewrite_attributes(&mut customer, row);
        self.insert_missing_attributes(&mut customer, row, seen);

        // 客戶層級若有 user-groups 也一併加入新區段
        if let Some(groups) = customer.child_mut(self.core_ns(), USER_GROUPS) {
            self.ensure_membership(groups);
        }

        let ns = self.core_ns().to_string();
        customer.for_each_descendant_mut(&ns, USER, &mut |account| {
            self.migrate_account(account, row)
        });

        tracing::debug!(
            "🔧 Customer '{}' rewritten as '{}'",
            row.current_id,
            row.new_id
        );
        customer
    }

    /// Single pass over the record's own custom attributes (accounts excluded).
    fn rewrite_attributes(&self, customer: &mut Element, row: &ResolvedRow) -> SeenAttributes {
        let ns = self.core_ns();
        let mut seen = SeenAttributes::default();

        for container in customer.elements_mut().filter(|e| e.is(ns, CUSTOM_ATTRIBUTES)) {
            for attribute in container.elements_mut().filter(|e| e.is(ns, CUSTOM_ATTRIBUTE)) {
                let Some(name) = attribute.attribute("name").map(str::to_owned) else {
                    continue;
                };
                match name.as_str() {
                    ATTR_COMPANY => {
                        if attribute.text() == Some(self.rules.source_brand.as_str()) {
                            attribute.set_text(self.rules.target_brand.as_str());
                        }
                    }
                    ATTR_STORE_ID | ATTR_WAREHOUSE_ID => attribute.set_text(row.new_store_id.as_str()),
                    ATTR_STORE_NAME => attribute.set_text(row.new_store_name.as_str()),
                    ATTR_DATA_AREA_ID | ATTR_SOURCE_ID => {
                        attribute.set_text(row.new_source_id.as_str())
                    }
                    ATTR_SYSTEM_ID => attribute.set_text(self.rules.system_id.as_str()),
                    ATTR_ORDER_NUMBER_MANDATORY => {
                        if let Some(mandatory) = &row.mandatory_reference {
                            attribute.set_text(mandatory.as_str());
                            seen.order_number_mandatory = true;
                        }
                    }
                    ATTR_DEFAULT_DELIVERY_DAY => {
                        attribute.set_text(row.delivery_day.as_str());
                        seen.default_delivery_day = true;
                    }
                    _ => {}
                }
            }
        }

        seen
    }

    fn insert_missing_attributes(&self, customer: &mut Element, row: &ResolvedRow, seen: SeenAttributes) {
        if !seen.default_delivery_day {
            let attribute =
                self.typed_attribute(customer, ATTR_DEFAULT_DELIVERY_DAY, "string", &row.delivery_day);
            self.push_attribute(customer, attribute);
        }

        if !seen.order_number_mandatory {
            if let Some(mandatory) = &row.mandatory_reference {
                let attribute =
                    self.typed_attribute(customer, ATTR_ORDER_NUMBER_MANDATORY, "boolean", mandatory);
                self.push_attribute(customer, attribute);
            }
        }
    }

    /// Appends `attribute` to the record's `custom-attributes`, creating the
    /// container when the record has none.
    fn push_attribute(&self, customer: &mut Element, attribute: Element) {
        let ns = self.core_ns();
        if customer.child(ns, CUSTOM_ATTRIBUTES).is_none() {
            let container = customer.new_child(CUSTOM_ATTRIBUTES);
            customer.push_child(container);
        }
        if let Some(container) = customer.child_mut(ns, CUSTOM_ATTRIBUTES) {
            container.push_child(attribute);
        }
    }

    /// `<custom-attribute name=".." dt:dt="..">value</custom-attribute>`
    fn typed_attribute(&self, customer: &Element, name: &str, datatype: &str, value: &str) -> Element {
        let mut attribute = Element::new(customer.child_name(CUSTOM_ATTRIBUTE), customer.namespace.clone());
        attribute.set_attribute("name", name);

        let own_prefix = customer
            .prefix_for_namespace(&self.rules.namespaces.datatype)
            .flatten()
            .map(str::to_owned);
        let prefix = match self.datatype_prefix.clone().or(own_prefix) {
            Some(prefix) => prefix,
            None => {
                // 來源未宣告 datatype 命名空間時在元素上就地宣告
                attribute.set_attribute(
                    &format!("xmlns:{}", DEFAULT_DATATYPE_PREFIX),
                    self.rules.namespaces.datatype.as_str(),
                );
                DEFAULT_DATATYPE_PREFIX.to_string()
            }
        };
        attribute.set_attribute(&format!("{}:dt", prefix), datatype);
        attribute.set_text(value);
        attribute
    }

    /// Adds the segment `user-group` unless the container already lists it.
    fn ensure_membership(&self, groups: &mut Element) {
        let ns = self.core_ns();
        let segment = self.rules.segment_id.as_str();
        let present = groups
            .elements()
            .any(|group| group.is(ns, USER_GROUP) && group.attribute("id") == Some(segment));
        if !present {
            let mut group = groups.new_child(USER_GROUP);
            group.set_attribute("id", segment);
            groups.push_child(group);
        }
    }

    fn migrate_account(&self, account: &mut Element, row: &ResolvedRow) {
        let ns = self.core_ns();
        let old_id = row.current_id.as_str();
        let new_id = row.new_id.as_str();

        if account.attribute(BUSINESS_PARTNER_NO) == Some(old_id) {
            account.set_attribute(BUSINESS_PARTNER_NO, new_id);
        }

        // 帳號內任何等於舊客戶編號的文字都改為新編號
        account.walk_mut(&mut |element| {
            if element.text() == Some(old_id) {
                element.set_text(new_id);
            }
        });

        account.for_each_descendant_mut(ns, USER_GROUPS, &mut |groups| {
            self.ensure_membership(groups)
        });

        account.for_each_descendant_mut(ns, CUSTOM_ATTRIBUTES, &mut |attributes| {
            let removed = attributes.retain_elements(|e| {
                !(e.is(ns, CUSTOM_ATTRIBUTE) && e.attribute("name") == Some(ATTR_LAST_ORDER_DATE))
            });
            if removed > 0 {
                tracing::debug!("Removed {} {} entries", removed, ATTR_LAST_ORDER_DATE);
            }
        });

        account.for_each_descendant_mut(ns, CREDENTIALS, &mut |credentials| {
            credentials.retain_elements(|e| !e.is(ns, LAST_LOGGED_IN));
        });

        let processing_date = self.processing_date;
        account.for_each_descendant_mut(ns, PROFILE, &mut |profile| {
            profile.for_each_descendant_mut(ns, CREATION_DATE, &mut |date| {
                date.set_text(processing_date)
            });
        });
    }
}
