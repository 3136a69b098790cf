//! Conditional inclusion: profile and property filters applied to the
//! candidate set before the graph is built. Evaluation is pure.

use serde::{Deserialize, Serialize};

use crate::config::PropertySource;

/// Named-property condition: include the component only when the property
/// matches the required value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyCondition {
    pub name: String,
    pub having_value: String,
    /// Result when the property is absent from the source
    pub match_if_missing: bool,
}

impl PropertyCondition {
    /// Create a new property condition
    pub fn new(
        name: impl Into<String>,
        having_value: impl Into<String>,
        match_if_missing: bool,
    ) -> Self {
        Self {
            name: name.into(),
            having_value: having_value.into(),
            match_if_missing,
        }
    }
}

/// Conditional-inclusion tags attached to a component or bean definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSet {
    pub profile_include: Vec<String>,
    pub profile_exclude: Vec<String>,
    pub property: Option<PropertyCondition>,
}

impl ConditionSet {
    /// Create an empty condition set
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if the set carries no conditions at all
    pub fn is_empty(&self) -> bool {
        self.profile_include.is_empty()
            && self.profile_exclude.is_empty()
            && self.property.is_none()
    }

    /// Parse a comma-separated profile list: split, trim, drop empties
    pub fn profiles_from_str(profiles: &str) -> Vec<String> {
        profiles
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Decide whether a set of condition tags admits a component under the
/// active profile and property source.
///
/// Both rules are evaluated independently; the component must pass both.
pub fn include(
    conditions: &ConditionSet,
    active_profile: Option<&str>,
    properties: &dyn PropertySource,
) -> bool {
    passes_profile(conditions, active_profile) && passes_property(conditions, properties)
}

fn passes_profile(conditions: &ConditionSet, active_profile: Option<&str>) -> bool {
    if conditions.profile_include.is_empty() && conditions.profile_exclude.is_empty() {
        return true;
    }

    // a whitespace-only profile counts as "no profile set"
    match active_profile.map(str::trim).filter(|p| !p.is_empty()) {
        Some(profile) => {
            if conditions
                .profile_exclude
                .iter()
                .any(|p| eq_ignore_case_trim(p, profile))
            {
                return false;
            }
            if !conditions.profile_include.is_empty()
                && !conditions
                    .profile_include
                    .iter()
                    .any(|p| eq_ignore_case_trim(p, profile))
            {
                return false;
            }
            true
        }
        // an unconditional include requirement cannot be satisfied by
        // "no profile"
        None => conditions.profile_include.is_empty(),
    }
}

fn passes_property(conditions: &ConditionSet, properties: &dyn PropertySource) -> bool {
    let Some(condition) = &conditions.property else {
        return true;
    };
    match properties.get(&condition.name) {
        None => condition.match_if_missing,
        Some(value) => value.eq_ignore_ascii_case(&condition.having_value),
    }
}

fn eq_ignore_case_trim(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Module-path prefix filter applied to candidate type names before
/// condition evaluation.
///
/// An empty filter admits everything; exclusion wins over inclusion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFilter {
    pub include_prefixes: Vec<String>,
    pub exclude_prefixes: Vec<String>,
}

impl ScanFilter {
    /// Create a filter that admits everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit only types under the given module-path prefix (repeatable)
    pub fn include(mut self, prefix: impl Into<String>) -> Self {
        self.include_prefixes.push(prefix.into());
        self
    }

    /// Reject types under the given module-path prefix (repeatable)
    pub fn exclude(mut self, prefix: impl Into<String>) -> Self {
        self.exclude_prefixes.push(prefix.into());
        self
    }

    /// Check whether a fully qualified type name passes the filter
    pub fn admits(&self, type_name: &str) -> bool {
        if !self.include_prefixes.is_empty()
            && !self
                .include_prefixes
                .iter()
                .any(|p| is_same_or_sub_path(type_name, p))
        {
            return false;
        }
        !self
            .exclude_prefixes
            .iter()
            .any(|p| is_same_or_sub_path(type_name, p))
    }
}

fn is_same_or_sub_path(candidate: &str, prefix: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }
    candidate == prefix
        || candidate
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with("::"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapProperties;

    fn dev_prod_conditions() -> ConditionSet {
        ConditionSet {
            profile_include: vec!["dev".to_string()],
            profile_exclude: vec!["prod".to_string()],
            property: None,
        }
    }

    #[test]
    fn test_profile_include_exclude_matrix() {
        let conditions = dev_prod_conditions();
        let props = MapProperties::new();

        assert!(include(&conditions, Some("dev"), &props));
        assert!(!include(&conditions, Some("prod"), &props));
        // include list is non-empty, so "no profile" excludes
        assert!(!include(&conditions, None, &props));
    }

    #[test]
    fn test_profile_comparison_is_trim_and_case_insensitive() {
        let conditions = dev_prod_conditions();
        let props = MapProperties::new();

        assert!(include(&conditions, Some("  DEV "), &props));
        assert!(!include(&conditions, Some("PROD"), &props));
        // whitespace-only profile counts as unset
        assert!(!include(&conditions, Some("   "), &props));
    }

    #[test]
    fn test_exclude_only_profiles_admit_when_unset() {
        let conditions = ConditionSet {
            profile_exclude: vec!["prod".to_string()],
            ..ConditionSet::default()
        };
        let props = MapProperties::new();

        assert!(include(&conditions, None, &props));
        assert!(include(&conditions, Some("dev"), &props));
        assert!(!include(&conditions, Some("prod"), &props));
    }

    #[test]
    fn test_property_condition_match_if_missing() {
        let props = MapProperties::new();

        let mut conditions = ConditionSet::new();
        conditions.property = Some(PropertyCondition::new("app.sendmail", "true", true));
        assert!(include(&conditions, None, &props));

        conditions.property = Some(PropertyCondition::new("app.sendmail", "true", false));
        assert!(!include(&conditions, None, &props));
    }

    #[test]
    fn test_property_condition_value_comparison() {
        let props = MapProperties::new().with("app.sendmail", "TRUE");

        let mut conditions = ConditionSet::new();
        conditions.property = Some(PropertyCondition::new("app.sendmail", "true", false));
        assert!(include(&conditions, None, &props));

        conditions.property = Some(PropertyCondition::new("app.sendmail", "false", true));
        assert!(!include(&conditions, None, &props));
    }

    #[test]
    fn test_profile_and_property_must_both_pass() {
        let mut conditions = dev_prod_conditions();
        conditions.property = Some(PropertyCondition::new("flag", "on", false));

        let props = MapProperties::new().with("flag", "off");
        assert!(!include(&conditions, Some("dev"), &props));

        let props = MapProperties::new().with("flag", "on");
        assert!(include(&conditions, Some("dev"), &props));
    }

    #[test]
    fn test_profiles_from_str_parsing() {
        assert_eq!(
            ConditionSet::profiles_from_str(" dev, prod ,,staging"),
            vec!["dev", "prod", "staging"]
        );
        assert!(ConditionSet::profiles_from_str("").is_empty());
    }

    #[test]
    fn test_scan_filter_prefixes() {
        let filter = ScanFilter::new()
            .include("app::services")
            .exclude("app::services::legacy");

        assert!(filter.admits("app::services::EmailService"));
        assert!(!filter.admits("app::controllers::Weather"));
        assert!(!filter.admits("app::services::legacy::OldService"));
        // prefix match is segment-aware, not substring
        assert!(!filter.admits("app::services_extra::Thing"));

        assert!(ScanFilter::new().admits("anything::at::all"));
    }
}
