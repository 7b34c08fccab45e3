use serde::{Deserialize, Serialize};

use crate::jitter::Jitter;
use crate::pipeline::narrative::Descriptor;

pub const IDEA_COUNT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Idea {
    pub name: String,
    pub problem: String,
    pub solution: String,
    pub audience: String,
}

pub struct IdeaGeneration;

impl Descriptor for IdeaGeneration {
    type Input = str;
    type Output = Vec<Idea>;
    const NAME: &'static str = "generate_idea";

    fn prompt(topic: &str) -> String {
        format!(
            r#"Act as a startup consultant. Generate exactly 3 innovative startup ideas in the "{topic}" industry.

Categories:
1. Hard-Tech/Physical Idea.
2. Business Model Innovation.
3. Tech-Enabled Solution.

Return ONLY a valid JSON array of objects.
Format:
[
    {{"name": "Idea Name", "problem": "Statement", "solution": "Description", "audience": "Target"}}
]"#
        )
    }

    fn accept(ideas: &Vec<Idea>) -> bool {
        ideas.len() == IDEA_COUNT && ideas.iter().all(|i| !i.name.trim().is_empty())
    }

    fn fallback(topic: &str, _jitter: &Jitter) -> Vec<Idea> {
        let t = title_case(topic);
        let t = if t.is_empty() { "Startup".to_string() } else { t };
        vec![
            Idea {
                name: format!("Smart {t} Logistics Hub"),
                problem: format!("The current supply chain for {t} is fragmented."),
                solution: format!("A decentralized network of micro-warehouses for {t}."),
                audience: format!("{t} Manufacturers"),
            },
            Idea {
                name: format!("{t}-as-a-Service"),
                problem: format!("High upfront costs prevent access to {t} services."),
                solution: format!("A subscription model for {t} infrastructure."),
                audience: format!("Startups in {t}"),
            },
            Idea {
                name: format!("AI-Powered {t} Optimizer"),
                problem: format!("Inefficiencies in demand prediction in the {t} sector."),
                solution: format!("An AI platform that predicts market demand for {t}."),
                audience: format!("{t} Operations Managers"),
            },
        ]
    }
}

/// "smart farming" → "Smart Farming".
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_is_topic_templated() {
        let ideas = IdeaGeneration::fallback("smart farming", &Jitter::disabled());
        assert_eq!(ideas.len(), IDEA_COUNT);
        assert_eq!(ideas[0].name, "Smart Smart Farming Logistics Hub");
        assert_eq!(ideas[1].name, "Smart Farming-as-a-Service");
        assert!(IdeaGeneration::accept(&ideas));
    }

    #[test]
    fn blank_topic_falls_back_to_startup() {
        let ideas = IdeaGeneration::fallback("   ", &Jitter::disabled());
        assert_eq!(ideas[2].name, "AI-Powered Startup Optimizer");
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("edTECH  for kids"), "Edtech For Kids");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn wrong_idea_count_rejected() {
        assert!(!IdeaGeneration::accept(&Vec::new()));

        let ideas = IdeaGeneration::fallback("fintech", &Jitter::disabled());
        assert!(!IdeaGeneration::accept(&ideas[..1].to_vec()));

        let seven: Vec<Idea> = ideas.iter().cycle().take(7).cloned().collect();
        assert!(!IdeaGeneration::accept(&seven));
    }
}
