//! Road type resolution: which of a country's road types applies to a road.

use std::collections::{HashMap, HashSet};

use super::error::ConfigurationError;
use super::reduce::create_result_tags;
use super::road_type::{Certitude, FilterSlot, RoadType, RoadTypeFilter, SpeedLimits};
use crate::Tags;
use crate::dsl::TagFilterExpression;
use crate::filters::RelevantKey;

/// Lets the caller override the outcome of a named road type filter. Receives the name and a
/// closure that evaluates the filter as configured.
pub type Replacer<'a> = dyn Fn(&str, &dyn Fn() -> bool) -> bool + 'a;

/// The replacer used by [`LegalDefaultSpeeds::speed_limits`]: always evaluates.
fn evaluate(_name: &str, evaluate: &dyn Fn() -> bool) -> bool {
    evaluate()
}

#[derive(Debug, Clone)]
struct RoadTypeFilterExpressions {
    filter: Option<TagFilterExpression>,
    fuzzy_filter: Option<TagFilterExpression>,
    relation_filter: Option<TagFilterExpression>,
}

impl RoadTypeFilterExpressions {
    fn parse(name: &str, filters: &RoadTypeFilter) -> Result<Self, ConfigurationError> {
        Ok(RoadTypeFilterExpressions {
            filter: parse_slot(name, FilterSlot::Filter, filters.filter.as_deref())?,
            fuzzy_filter: parse_slot(name, FilterSlot::FuzzyFilter, filters.fuzzy_filter.as_deref())?,
            relation_filter: parse_slot(
                name,
                FilterSlot::RelationFilter,
                filters.relation_filter.as_deref(),
            )?,
        })
    }

    fn expressions(&self) -> impl Iterator<Item = &TagFilterExpression> {
        [&self.filter, &self.fuzzy_filter, &self.relation_filter]
            .into_iter()
            .flatten()
    }
}

fn parse_slot(
    road_type: &str,
    slot: FilterSlot,
    filter: Option<&str>,
) -> Result<Option<TagFilterExpression>, ConfigurationError> {
    filter
        .map(|filter| {
            TagFilterExpression::new(filter).map_err(|source| ConfigurationError::InvalidFilter {
                road_type: road_type.to_string(),
                slot,
                source,
            })
        })
        .transpose()
}

/// Looks up the legal default speed limits of roads per country.
///
/// All filters are parsed and checked for circular placeholders on construction, so a
/// constructed instance never fails at query time. It is immutable and can be shared
/// between threads.
#[derive(Debug, Clone)]
pub struct LegalDefaultSpeeds {
    filters: HashMap<String, RoadTypeFilterExpressions>,
    speed_limits: HashMap<String, Vec<RoadType>>,
    relevant_keys: HashSet<RelevantKey>,
}

impl LegalDefaultSpeeds {
    /// `road_types` maps a road type name to its filters. `speed_limits` maps a country code
    /// (`DE`, `BE-VLG`) to its road types; their order decides between multiple matches.
    pub fn new(
        road_types: HashMap<String, RoadTypeFilter>,
        speed_limits: HashMap<String, Vec<RoadType>>,
    ) -> Result<Self, ConfigurationError> {
        let mut names: Vec<&String> = road_types.keys().collect();
        names.sort();

        let mut filters = HashMap::with_capacity(road_types.len());
        for name in names {
            let parsed = RoadTypeFilterExpressions::parse(name, &road_types[name])?;
            filters.insert(name.clone(), parsed);
        }

        check_for_circular_placeholders(&filters)?;
        warn_about_suspicious_entries(&filters, &speed_limits);

        let relevant_keys = filters
            .values()
            .flat_map(RoadTypeFilterExpressions::expressions)
            .flat_map(TagFilterExpression::relevant_keys)
            .collect();

        Ok(LegalDefaultSpeeds {
            filters,
            speed_limits,
            relevant_keys,
        })
    }

    /// Finds the road type of a road with the given `tags` in `country_code` and returns the
    /// tags it implicitly has in addition. `relations` are the tags of the relations the road
    /// is a member of. Returns `None` if the country is unknown or nothing matched and the
    /// country has no default rule.
    pub fn speed_limits(
        &self,
        country_code: &str,
        tags: &Tags,
        relations: &[Tags],
    ) -> Option<SpeedLimits> {
        self.speed_limits_with(country_code, tags, relations, &evaluate)
    }

    /// Like [`speed_limits`](Self::speed_limits), but every named filter goes through
    /// `replacer` first. E.g. to use another source for whether a road is `urban`:
    ///
    /// ```
    /// # use legal_speeds::{LegalDefaultSpeeds, Tags};
    /// # fn lookup(speeds: &LegalDefaultSpeeds, tags: &Tags, in_built_up_area: bool) {
    /// speeds.speed_limits_with("DE", tags, &[], &|name, evaluate| {
    ///     if name == "urban" { in_built_up_area } else { evaluate() }
    /// });
    /// # }
    /// ```
    pub fn speed_limits_with(
        &self,
        country_code: &str,
        tags: &Tags,
        relations: &[Tags],
        replacer: &Replacer<'_>,
    ) -> Option<SpeedLimits> {
        let road_types = self.road_types_of(country_code)?;

        let exact = Query {
            filters: &self.filters,
            tags,
            relations,
            fuzzy: false,
            replacer,
        };
        let result = exact
            .find(road_types)
            .map(|road_type| (road_type, Certitude::Exact))
            .or_else(|| {
                find_by_max_speed(road_types, tags)
                    .map(|road_type| (road_type, Certitude::FromMaxSpeed))
            })
            .or_else(|| {
                let fuzzy = Query {
                    fuzzy: true,
                    ..exact
                };
                fuzzy
                    .find(road_types)
                    .map(|road_type| (road_type, Certitude::Fuzzy))
            })
            .or_else(|| {
                road_types
                    .iter()
                    .find(|road_type| road_type.name.is_none())
                    .map(|road_type| (road_type, Certitude::Fallback))
            });

        let Some((road_type, certitude)) = result else {
            tracing::debug!("Resolve: {}: no road type", country_code);
            return None;
        };
        tracing::debug!(
            "Resolve: {}: {} ({:?})",
            country_code,
            road_type.name.as_deref().unwrap_or("<default>"),
            certitude
        );

        Some(SpeedLimits {
            road_type_name: road_type.name.clone(),
            tags: create_result_tags(tags, &road_type.tags),
            certitude,
        })
    }

    /// Whether a tag with this key can affect the result of any filter.
    pub fn is_relevant_key(&self, key: &str) -> bool {
        self.relevant_keys.iter().any(|relevant| relevant.matches(key))
    }

    pub fn country_codes(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.speed_limits.keys().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }

    pub fn road_type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.filters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The subdivision (`US-TX`) if known, otherwise its country (`US`).
    fn road_types_of(&self, country_code: &str) -> Option<&[RoadType]> {
        self.speed_limits
            .get(country_code)
            .or_else(|| {
                let (country, _) = country_code.split_once('-')?;
                self.speed_limits.get(country)
            })
            .map(Vec::as_slice)
    }
}

/// State of a single filter pass over one road.
#[derive(Clone, Copy)]
struct Query<'a> {
    filters: &'a HashMap<String, RoadTypeFilterExpressions>,
    tags: &'a Tags,
    relations: &'a [Tags],
    fuzzy: bool,
    replacer: &'a Replacer<'a>,
}

impl Query<'_> {
    fn find<'r>(&self, road_types: &'r [RoadType]) -> Option<&'r RoadType> {
        find_road_type(road_types, |name, _| self.filters_match_replace(name))
    }

    fn filters_match_replace(&self, name: &str) -> bool {
        (self.replacer)(name, &|| self.filters_match(name))
    }

    fn filters_match(&self, name: &str) -> bool {
        let Some(filters) = self.filters.get(name) else {
            return false;
        };
        let resolve = |placeholder: &str| self.filters_match_replace(placeholder);

        if let Some(relation_filter) = &filters.relation_filter {
            if self
                .relations
                .iter()
                .any(|relation| relation_filter.matches(relation, &resolve))
            {
                return true;
            }
        }
        if let Some(filter) = &filters.filter {
            if filter.matches(self.tags, &resolve) {
                return true;
            }
        }
        match &filters.fuzzy_filter {
            Some(fuzzy_filter) if self.fuzzy => fuzzy_filter.matches(self.tags, &resolve),
            _ => false,
        }
    }
}

fn find_by_max_speed<'r>(road_types: &'r [RoadType], tags: &Tags) -> Option<&'r RoadType> {
    let maxspeed = tags.get("maxspeed")?;
    find_road_type(road_types, |_, road_type| {
        road_type.tags.get("maxspeed") == Some(maxspeed)
    })
}

/// Entries after the default rule are tried from the bottom up, then the entries before it
/// from the top down. The default rule itself is never returned.
fn find_road_type<'r>(
    road_types: &'r [RoadType],
    matches: impl Fn(&str, &RoadType) -> bool,
) -> Option<&'r RoadType> {
    for road_type in road_types.iter().rev() {
        let Some(name) = road_type.name.as_deref() else {
            break;
        };
        if matches(name, road_type) {
            return Some(road_type);
        }
    }
    for road_type in road_types {
        let Some(name) = road_type.name.as_deref() else {
            break;
        };
        if matches(name, road_type) {
            return Some(road_type);
        }
    }
    None
}

fn check_for_circular_placeholders(
    filters: &HashMap<String, RoadTypeFilterExpressions>,
) -> Result<(), ConfigurationError> {
    // e.g. "rural paved road" -> {"rural", "paved road"}
    let references: HashMap<&str, HashSet<&str>> = filters
        .iter()
        .map(|(name, expressions)| {
            let placeholders = expressions
                .expressions()
                .flat_map(TagFilterExpression::placeholders)
                .collect();
            (name.as_str(), placeholders)
        })
        .collect();

    let mut names: Vec<&str> = references.keys().copied().collect();
    names.sort_unstable();

    for name in names {
        let mut reachable: HashSet<&str> = references[name].clone();
        let mut frontier: Vec<&str> = reachable.iter().copied().collect();
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for placeholder in frontier {
                let Some(referred) = references.get(placeholder) else {
                    continue;
                };
                for &r in referred {
                    if reachable.insert(r) {
                        next.push(r);
                    }
                }
            }
            frontier = next;
        }

        if reachable.contains(name) {
            return Err(ConfigurationError::CircularPlaceholder {
                road_type: name.to_string(),
            });
        }
    }
    Ok(())
}

fn warn_about_suspicious_entries(
    filters: &HashMap<String, RoadTypeFilterExpressions>,
    speed_limits: &HashMap<String, Vec<RoadType>>,
) {
    let mut countries: Vec<&String> = speed_limits.keys().collect();
    countries.sort();

    let mut undefined: HashSet<&str> = HashSet::new();
    for country in countries {
        let road_types = &speed_limits[country];

        let fallbacks = road_types.iter().filter(|rt| rt.name.is_none()).count();
        if fallbacks > 1 {
            tracing::warn!(
                "Rules: {} has {} default rules, only the first is used",
                country,
                fallbacks
            );
        }

        for name in road_types.iter().filter_map(|rt| rt.name.as_deref()) {
            if !filters.contains_key(name) && undefined.insert(name) {
                tracing::warn!(
                    "Rules: road type \"{}\" ({}) has no filters and only matches by maxspeed",
                    name,
                    country
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn filters(
        filter: Option<&str>,
        fuzzy_filter: Option<&str>,
        relation_filter: Option<&str>,
    ) -> RoadTypeFilter {
        RoadTypeFilter {
            filter: filter.map(str::to_string),
            fuzzy_filter: fuzzy_filter.map(str::to_string),
            relation_filter: relation_filter.map(str::to_string),
        }
    }

    fn filter(filter: &str) -> RoadTypeFilter {
        filters(Some(filter), None, None)
    }

    fn road(name: Option<&str>, maxspeed: &str) -> RoadType {
        RoadType::new(name, tags(&[("maxspeed", maxspeed)]))
    }

    fn result(name: Option<&str>, pairs: &[(&str, &str)], certitude: Certitude) -> SpeedLimits {
        SpeedLimits {
            road_type_name: name.map(str::to_string),
            tags: tags(pairs),
            certitude,
        }
    }

    fn za() -> LegalDefaultSpeeds {
        let road_types = HashMap::from([
            ("living street".to_string(), filter("highway=living_street")),
            ("alley".to_string(), filter("{urban} and alley=yes")),
            (
                "urban".to_string(),
                filters(Some("lit=yes"), Some("highway=residential"), None),
            ),
            ("urban state road".to_string(), filter("{urban} and {state road}")),
            ("rural".to_string(), filters(None, Some("sidewalk=no"), None)),
            ("dual carriageway".to_string(), filter("dual_carriageway=yes")),
            ("motorway".to_string(), filter("highway=motorway")),
            (
                "state road".to_string(),
                filters(None, None, Some("type=route and ref~ZA.*")),
            ),
            ("rural state road".to_string(), filter("{rural} and {state road}")),
            (
                "road in construction".to_string(),
                filter("~construction|proposed~yes"),
            ),
            ("imaginary road".to_string(), filter("~imagination:.*")),
        ]);
        let speed_limits = HashMap::from([(
            "ZA".to_string(),
            vec![
                road(Some("road in construction"), "0"),
                road(Some("living street"), "10"),
                road(Some("alley"), "5"),
                road(Some("urban state road"), "60"),
                road(Some("urban"), "50"),
                road(None, "100"),
                road(Some("rural"), "100"),
                road(Some("dual carriageway"), "110"),
                road(Some("rural state road"), "115"),
                road(Some("motorway"), "120"),
                road(Some("imaginary road"), "999"),
            ],
        )]);
        LegalDefaultSpeeds::new(road_types, speed_limits).unwrap()
    }

    fn single_country(road_types: Vec<RoadType>) -> LegalDefaultSpeeds {
        LegalDefaultSpeeds::new(
            HashMap::new(),
            HashMap::from([("AB".to_string(), road_types)]),
        )
        .unwrap()
    }

    #[test]
    fn test_fails_on_invalid_filter() {
        let speed_limits = || HashMap::from([("FR".to_string(), vec![road(Some("urban"), "50")])]);

        for (slot, road_type_filter) in [
            (FilterSlot::Filter, filters(Some("and and"), None, None)),
            (FilterSlot::FuzzyFilter, filters(None, Some("and and"), None)),
            (FilterSlot::RelationFilter, filters(None, None, Some("and and"))),
        ] {
            let err = LegalDefaultSpeeds::new(
                HashMap::from([("urban".to_string(), road_type_filter)]),
                speed_limits(),
            )
            .unwrap_err();
            match err {
                ConfigurationError::InvalidFilter {
                    road_type,
                    slot: failed,
                    ..
                } => {
                    assert_eq!(road_type, "urban");
                    assert_eq!(failed, slot);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_no_tags_match() {
        let speeds = LegalDefaultSpeeds::new(
            HashMap::from([("urban".to_string(), filter("lit=yes"))]),
            HashMap::from([("SD".to_string(), vec![road(Some("urban"), "60")])]),
        )
        .unwrap();
        assert_eq!(speeds.speed_limits("SD", &tags(&[("lit", "no")]), &[]), None);
    }

    #[test]
    fn test_unknown_country() {
        assert_eq!(za().speed_limits("GY", &tags(&[("lit", "yes")]), &[]), None);
    }

    #[test]
    fn test_end_to_end() {
        let za = za();
        assert_eq!(
            za.speed_limits("ZA", &tags(&[("lit", "yes")]), &[]),
            Some(result(Some("urban"), &[("maxspeed", "50")], Certitude::Exact))
        );
        assert_eq!(
            za.speed_limits("ZA", &tags(&[("highway", "residential")]), &[]),
            Some(result(Some("urban"), &[("maxspeed", "50")], Certitude::Fuzzy))
        );
        assert_eq!(
            za.speed_limits("ZA", &tags(&[]), &[]),
            Some(result(None, &[("maxspeed", "100")], Certitude::Fallback))
        );
        assert_eq!(
            za.speed_limits("ZA", &tags(&[("lit", "no")]), &[]),
            Some(result(None, &[("maxspeed", "100")], Certitude::Fallback))
        );
    }

    #[test]
    fn test_falls_back_to_country_of_unknown_subdivision() {
        let za = za();
        assert_eq!(
            za.speed_limits("ZA-NC", &tags(&[("lit", "yes")]), &[]),
            Some(result(Some("urban"), &[("maxspeed", "50")], Certitude::Exact))
        );
        assert_eq!(
            za.speed_limits("ZA-NC", &tags(&[("maxspeed", "50")]), &[]),
            Some(result(Some("urban"), &[], Certitude::FromMaxSpeed))
        );
    }

    #[test]
    fn test_prefers_known_subdivision() {
        let speeds = LegalDefaultSpeeds::new(
            HashMap::new(),
            HashMap::from([
                ("US".to_string(), vec![road(None, "65")]),
                ("US-TX".to_string(), vec![road(None, "70")]),
            ]),
        )
        .unwrap();
        let expected = |maxspeed| Some(result(None, &[("maxspeed", maxspeed)], Certitude::Fallback));
        assert_eq!(speeds.speed_limits("US-TX", &Tags::new(), &[]), expected("70"));
        assert_eq!(speeds.speed_limits("US-OR", &Tags::new(), &[]), expected("65"));
        assert_eq!(speeds.speed_limits("US", &Tags::new(), &[]), expected("65"));
    }

    #[test]
    fn test_from_max_speed() {
        let za = za();
        assert_eq!(
            za.speed_limits("ZA", &tags(&[("maxspeed", "110")]), &[]),
            Some(result(Some("dual carriageway"), &[], Certitude::FromMaxSpeed))
        );
        // compared as strings
        assert_eq!(
            za.speed_limits("ZA", &tags(&[("maxspeed", "110.0")]), &[]),
            Some(result(None, &[], Certitude::Fallback))
        );
    }

    #[test]
    fn test_prefers_matches_further_down_the_list() {
        let za = za();
        assert_eq!(
            za.speed_limits(
                "ZA",
                &tags(&[
                    ("highway", "motorway"),
                    ("lit", "yes"),
                    ("dual_carriageway", "yes")
                ]),
                &[]
            ),
            Some(result(Some("motorway"), &[("maxspeed", "120")], Certitude::Exact))
        );
        assert_eq!(
            za.speed_limits(
                "ZA",
                &tags(&[("lit", "yes"), ("dual_carriageway", "yes")]),
                &[]
            ),
            Some(result(
                Some("dual carriageway"),
                &[("maxspeed", "110")],
                Certitude::Exact
            ))
        );
    }

    #[test]
    fn test_prefers_matches_at_the_top_of_the_list_otherwise() {
        assert_eq!(
            za().speed_limits(
                "ZA",
                &tags(&[("highway", "living_street"), ("lit", "yes")]),
                &[]
            ),
            Some(result(
                Some("living street"),
                &[("maxspeed", "10")],
                Certitude::Exact
            ))
        );
    }

    #[test]
    fn test_tie_break_order() {
        let road_types = ["A", "B", "C", "D"]
            .into_iter()
            .map(|name| (name.to_string(), filter("highway")))
            .collect::<HashMap<_, _>>();
        let list = vec![
            road(Some("A"), "1"),
            road(Some("B"), "2"),
            road(None, "3"),
            road(Some("C"), "4"),
            road(Some("D"), "5"),
        ];
        let speeds = LegalDefaultSpeeds::new(
            road_types.clone(),
            HashMap::from([("XX".to_string(), list.clone())]),
        )
        .unwrap();
        let found = speeds.speed_limits("XX", &tags(&[("highway", "x")]), &[]).unwrap();
        assert_eq!(found.road_type_name.as_deref(), Some("D"));

        // only the entries before the default rule match
        let only_top = ["A", "B"]
            .into_iter()
            .map(|name| (name.to_string(), filter("highway")))
            .chain([("C".to_string(), filter("nope")), ("D".to_string(), filter("nope"))])
            .collect::<HashMap<_, _>>();
        let speeds =
            LegalDefaultSpeeds::new(only_top, HashMap::from([("XX".to_string(), list)])).unwrap();
        let found = speeds.speed_limits("XX", &tags(&[("highway", "x")]), &[]).unwrap();
        assert_eq!(found.road_type_name.as_deref(), Some("A"));

        // same order for the maxspeed pass
        let list = vec![
            road(Some("A"), "50"),
            road(Some("B"), "50"),
            road(None, "100"),
            road(Some("C"), "50"),
            road(Some("D"), "50"),
        ];
        let speeds = single_country(list);
        let found = speeds.speed_limits("AB", &tags(&[("maxspeed", "50")]), &[]).unwrap();
        assert_eq!(found.road_type_name.as_deref(), Some("D"));
        assert_eq!(found.certitude, Certitude::FromMaxSpeed);
    }

    #[test]
    fn test_without_default_rule_scans_whole_list() {
        let road_types = HashMap::from([
            ("A".to_string(), filter("highway")),
            ("B".to_string(), filter("highway")),
        ]);
        let speeds = LegalDefaultSpeeds::new(
            road_types,
            HashMap::from([(
                "XX".to_string(),
                vec![road(Some("A"), "1"), road(Some("B"), "2")],
            )]),
        )
        .unwrap();
        let found = speeds.speed_limits("XX", &tags(&[("highway", "x")]), &[]).unwrap();
        assert_eq!(found.road_type_name.as_deref(), Some("B"));
        assert_eq!(speeds.speed_limits("XX", &Tags::new(), &[]), None);
    }

    #[test]
    fn test_certitude_preference() {
        let za = za();
        assert_eq!(
            za.speed_limits("ZA", &tags(&[("lit", "yes"), ("sidewalk", "no")]), &[]),
            Some(result(Some("urban"), &[("maxspeed", "50")], Certitude::Exact))
        );
        assert_eq!(
            za.speed_limits(
                "ZA",
                &tags(&[("lit", "yes"), ("sidewalk", "no"), ("maxspeed", "110")]),
                &[]
            ),
            Some(result(Some("urban"), &[], Certitude::Exact))
        );
        assert_eq!(
            za.speed_limits("ZA", &tags(&[("sidewalk", "no"), ("maxspeed", "110")]), &[]),
            Some(result(Some("dual carriageway"), &[], Certitude::FromMaxSpeed))
        );
        assert!(Certitude::Exact < Certitude::FromMaxSpeed);
        assert!(Certitude::FromMaxSpeed < Certitude::Fuzzy);
        assert!(Certitude::Fuzzy < Certitude::Fallback);
    }

    #[test]
    fn test_placeholders() {
        let za = za();
        assert_eq!(
            za.speed_limits("ZA", &tags(&[("lit", "yes"), ("alley", "yes")]), &[]),
            Some(result(Some("alley"), &[("maxspeed", "5")], Certitude::Exact))
        );
        assert_eq!(
            za.speed_limits(
                "ZA",
                &tags(&[("highway", "residential"), ("alley", "yes")]),
                &[]
            ),
            Some(result(Some("alley"), &[("maxspeed", "5")], Certitude::Fuzzy))
        );
    }

    #[test]
    fn test_relation_filter() {
        let za = za();
        let relations = [
            tags(&[("type", "route"), ("ref", "Bus 1234")]),
            tags(&[("type", "route"), ("ref", "ZA 2")]),
        ];
        assert_eq!(
            za.speed_limits("ZA", &tags(&[("sidewalk", "no")]), &relations),
            Some(result(
                Some("rural state road"),
                &[("maxspeed", "115")],
                Certitude::Fuzzy
            ))
        );
        assert_eq!(
            za.speed_limits("ZA", &tags(&[("lit", "yes")]), &relations[1..]),
            Some(result(
                Some("urban state road"),
                &[("maxspeed", "60")],
                Certitude::Exact
            ))
        );
        // relation filters never look at the road's own tags
        assert_eq!(
            za.speed_limits(
                "ZA",
                &tags(&[("lit", "yes"), ("type", "route"), ("ref", "ZA 2")]),
                &[]
            ),
            Some(result(Some("urban"), &[("maxspeed", "50")], Certitude::Exact))
        );
    }

    #[test]
    fn test_replacer() {
        let za = za();
        let urban = |name: &str, evaluate: &dyn Fn() -> bool| name == "urban" || evaluate();
        assert_eq!(
            za.speed_limits_with("ZA", &Tags::new(), &[], &urban),
            Some(result(Some("urban"), &[("maxspeed", "50")], Certitude::Exact))
        );
        assert_eq!(
            za.speed_limits_with("ZA", &tags(&[("alley", "yes")]), &[], &urban),
            Some(result(Some("alley"), &[("maxspeed", "5")], Certitude::Exact))
        );

        let state_road = |name: &str, evaluate: &dyn Fn() -> bool| name == "state road" || evaluate();
        assert_eq!(
            za.speed_limits_with("ZA", &tags(&[("highway", "residential")]), &[], &state_road),
            Some(result(
                Some("urban state road"),
                &[("maxspeed", "60")],
                Certitude::Fuzzy
            ))
        );

        // replacing with false hides a match
        let not_urban = |name: &str, evaluate: &dyn Fn() -> bool| name != "urban" && evaluate();
        assert_eq!(
            za.speed_limits_with("ZA", &tags(&[("lit", "yes")]), &[], &not_urban),
            Some(result(None, &[("maxspeed", "100")], Certitude::Fallback))
        );
    }

    #[test]
    fn test_reduces_result_tags() {
        let speeds = single_country(vec![RoadType::new(
            None,
            tags(&[
                ("maxspeed", "60"),
                ("maxspeed:hgv", "80"),
                ("maxspeed:mofa", "50"),
            ]),
        )]);
        assert_eq!(
            speeds.speed_limits("AB", &Tags::new(), &[]).unwrap().tags,
            tags(&[("maxspeed", "60"), ("maxspeed:mofa", "50")])
        );
    }

    #[test]
    fn test_result_never_repeats_input_keys() {
        let speeds = single_country(vec![RoadType::new(
            None,
            tags(&[("maxspeed", "100"), ("maxspeed:hgv", "80")]),
        )]);
        for input in [
            tags(&[("maxspeed", "RO:urban")]),
            tags(&[("maxspeed", "100")]),
            tags(&[("maxspeed:hgv", "60"), ("lit", "yes")]),
            tags(&[("maxspeed", "walk"), ("maxspeed:hgv", "none")]),
        ] {
            let found = speeds.speed_limits("AB", &input, &[]).unwrap();
            assert!(
                found.tags.keys().all(|key| !input.contains_key(key)),
                "{input:?} -> {:?}",
                found.tags
            );
        }
    }

    #[test]
    fn test_fails_on_circular_placeholders() {
        let circular = [
            vec![("rural", filter("{rural}"))],
            vec![("rural", filter("!{rural}"))],
            vec![("urban", filter("{lit}")), ("lit", filter("{urban}"))],
            vec![
                ("urban", filters(Some("{lit}"), Some("{sidewalk}"), None)),
                ("lit", filter("lit=yes")),
                ("sidewalk", filters(Some("sidewalk=yes"), Some("{something else}"), None)),
                ("something else", filter("{urban}")),
            ],
            vec![
                ("a", filters(None, None, Some("{b}"))),
                ("b", filter("{c} or x")),
                ("c", filter("{d}")),
                ("d", filter("!{a}")),
            ],
        ];
        for road_types in circular {
            let road_types: HashMap<String, RoadTypeFilter> = road_types
                .into_iter()
                .map(|(name, f)| (name.to_string(), f))
                .collect();
            let err = LegalDefaultSpeeds::new(road_types.clone(), HashMap::new()).unwrap_err();
            match err {
                ConfigurationError::CircularPlaceholder { road_type } => {
                    assert!(road_types.contains_key(&road_type))
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        let err = LegalDefaultSpeeds::new(
            HashMap::from([("rural".to_string(), filter("{rural}"))]),
            HashMap::new(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "A road type filter for \"rural\" contains circular placeholders"
        );
    }

    #[test]
    fn test_accepts_shared_placeholders() {
        let road_types = HashMap::from([
            ("a".to_string(), filter("{b} and {c}")),
            ("b".to_string(), filter("{d}")),
            ("c".to_string(), filter("{d} or !{d}")),
            ("d".to_string(), filter("lit")),
            ("e".to_string(), filter("{undefined}")),
        ]);
        assert!(LegalDefaultSpeeds::new(road_types, HashMap::new()).is_ok());
    }

    #[test]
    fn test_relevant_keys() {
        let za = za();
        for key in ["highway", "sidewalk", "ref", "proposed", "imagination:1"] {
            assert!(za.is_relevant_key(key), "{key}");
        }
        for key in ["opening_hours", "urban", "{urban}", "not:imagination"] {
            assert!(!za.is_relevant_key(key), "{key}");
        }
    }

    #[test]
    fn test_accessors() {
        let za = za();
        assert_eq!(za.country_codes(), vec!["ZA"]);
        let names = za.road_type_names();
        assert_eq!(names.len(), 11);
        assert_eq!(names.first(), Some(&"alley"));
        assert_eq!(names.last(), Some(&"urban state road"));
    }
}
