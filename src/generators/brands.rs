use serde::{Deserialize, Serialize};

use crate::jitter::Jitter;
use crate::pipeline::narrative::Descriptor;

pub const BRAND_COUNT: usize = 6;

const DOMAIN_STATES: [&str; 2] = ["Available", "Taken"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandName {
    pub name: String,
    #[serde(default, alias = "tagline", alias = "meaning")]
    pub reason: String,
}

/// Domain availability is advisory only; no registrar is queried.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainAvailability {
    #[serde(rename = ".com")]
    pub com: String,
    #[serde(rename = ".in")]
    pub in_: String,
    #[serde(rename = ".ai")]
    pub ai: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrandSuggestion {
    pub name: String,
    pub reason: String,
    pub domains: DomainAvailability,
}

pub struct BrandNaming;

impl Descriptor for BrandNaming {
    type Input = str;
    type Output = Vec<BrandName>;
    const NAME: &'static str = "generate_brands";

    fn prompt(description: &str) -> String {
        format!(
            r#"Act as a brand strategist. Suggest {BRAND_COUNT} short, memorable brand names for this startup:

"{description}"

Return ONLY a JSON array of objects:
[
    {{"name": "BrandName", "reason": "One sentence on why it fits"}}
]"#
        )
    }

    fn accept(names: &Vec<BrandName>) -> bool {
        !names.is_empty() && names.iter().all(|b| !b.name.trim().is_empty())
    }

    fn fallback(description: &str, _jitter: &Jitter) -> Vec<BrandName> {
        let stem = description
            .split_whitespace()
            .find(|w| w.len() > 3 && w.chars().all(char::is_alphabetic))
            .map(|w| {
                let mut c = w.chars();
                match c.next() {
                    Some(f) => f.to_uppercase().chain(c.flat_map(char::to_lowercase)).collect(),
                    None => String::new(),
                }
            })
            .unwrap_or_else(|| "Venture".to_string());

        ["ly", "ify", "Hub", "Nest", "Labs", "Works"]
            .iter()
            .map(|suffix| BrandName {
                name: format!("{stem}{suffix}"),
                reason: format!("Built on \"{stem}\" so the product is obvious from the name."),
            })
            .collect()
    }
}

/// Attach a domain-availability guess to each name, keeping at most
/// `BRAND_COUNT` entries.
pub fn with_domains(names: Vec<BrandName>, jitter: &Jitter) -> Vec<BrandSuggestion> {
    let pick = || jitter.choose(&DOMAIN_STATES).copied().unwrap_or("Available").to_string();
    names
        .into_iter()
        .take(BRAND_COUNT)
        .map(|b| BrandSuggestion {
            domains: DomainAvailability {
                com: pick(),
                in_: pick(),
                ai: "Available".to_string(),
            },
            name: b.name,
            reason: b.reason,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_builds_six_names_from_description() {
        let names = BrandNaming::fallback("an app for rural clinics", &Jitter::disabled());
        assert_eq!(names.len(), BRAND_COUNT);
        assert_eq!(names[0].name, "Rurally");
        assert_eq!(names[5].name, "RuralWorks");
        assert!(BrandNaming::accept(&names));
    }

    #[test]
    fn fallback_stem_defaults() {
        let names = BrandNaming::fallback("a b c", &Jitter::disabled());
        assert_eq!(names[2].name, "VentureHub");
    }

    #[test]
    fn domains_are_attached_and_capped() {
        let mut names = BrandNaming::fallback("quantum", &Jitter::disabled());
        names.extend(BrandNaming::fallback("orbit", &Jitter::disabled()));
        let out = with_domains(names, &Jitter::new(0, Some(3)));
        assert_eq!(out.len(), BRAND_COUNT);
        for s in &out {
            assert!(DOMAIN_STATES.contains(&s.domains.com.as_str()));
            assert!(DOMAIN_STATES.contains(&s.domains.in_.as_str()));
            assert_eq!(s.domains.ai, "Available");
        }
        let v = serde_json::to_value(&out[0]).unwrap();
        assert!(v["domains"][".in"].is_string());
        assert_eq!(v["domains"][".ai"], "Available");
    }
}
