//! Curated feature labels derived from raw record attributes.

/// How an attribute value decides whether its label applies.
#[derive(Debug, Clone, Copy)]
enum ValueRule {
    /// Any value except `no`.
    NotNo,
    /// Attribute presence is enough.
    Present,
    /// Only the value `primary`.
    Primary,
}

impl ValueRule {
    fn accepts(self, value: &str) -> bool {
        match self {
            ValueRule::NotNo => value != "no",
            ValueRule::Present => true,
            ValueRule::Primary => value == "primary",
        }
    }
}

/// Attribute name, curated label, value rule.
const WHITELIST: &[(&str, &str, ValueRule)] = &[
    ("diet:vegetarian", "Vegetarian Options", ValueRule::NotNo),
    ("diet:vegan", "Vegan Options", ValueRule::NotNo),
    ("wheelchair", "Wheelchair Accessible", ValueRule::NotNo),
    ("outdoor_seating", "Outdoor Seating", ValueRule::NotNo),
    ("beer_garden", "Outdoor Seating", ValueRule::NotNo),
    ("food", "Food", ValueRule::NotNo),
    ("toilets:wheelchair", "Wheelchair Accessible Toilet", ValueRule::NotNo),
    ("real ale", "Real Ale", ValueRule::Present),
    ("real_ale", "Real Ale", ValueRule::NotNo),
    ("brewery", "Brewery", ValueRule::NotNo),
    ("microbrewery", "Micro Brewery", ValueRule::NotNo),
    ("lgbtq", "LGBTQ+", ValueRule::Primary),
];

/// Map raw attributes to curated feature labels.
///
/// Labels are emitted once each, in the order their first matching attribute
/// is seen. Attributes outside the whitelist, or whose value the whitelist
/// rejects, are dropped.
pub fn filter_tags<'a, I>(attributes: I) -> Vec<String>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut labels: Vec<String> = Vec::new();

    for (name, value) in attributes {
        let Some((_, label, rule)) = WHITELIST.iter().find(|(key, _, _)| *key == name) else {
            continue;
        };
        if rule.accepts(value) && !labels.iter().any(|seen| seen == label) {
            labels.push((*label).to_owned());
        }
    }

    labels
}
