use serde::{Deserialize, Serialize};

use crate::jitter::Jitter;
use crate::pipeline::narrative::Descriptor;

pub const SLIDE_COUNT: usize = 10;

const OUTLINE: [&str; SLIDE_COUNT] = [
    "Title",
    "Problem",
    "Solution",
    "Market Opportunity",
    "Product",
    "Business Model",
    "Traction",
    "Competition",
    "Team",
    "The Ask",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    pub title: String,
    #[serde(default, alias = "points", alias = "bullets")]
    pub content: Vec<String>,
}

pub struct PitchDeck;

impl Descriptor for PitchDeck {
    type Input = str;
    type Output = Vec<Slide>;
    const NAME: &'static str = "generate_pitch";

    fn prompt(idea: &str) -> String {
        let outline = OUTLINE.join(", ");
        format!(
            r#"Act as a pitch coach for early-stage founders. Build a {SLIDE_COUNT}-slide investor pitch deck for:

"{idea}"

Slides in order: {outline}.
Each slide gets 2-4 short bullet points.

Return ONLY a JSON array:
[
    {{"title": "Slide Title", "content": ["point", "point"]}}
]"#
        )
    }

    fn accept(slides: &Vec<Slide>) -> bool {
        !slides.is_empty() && slides.iter().all(|s| !s.title.trim().is_empty())
    }

    fn fallback(idea: &str, _jitter: &Jitter) -> Vec<Slide> {
        let idea = idea.trim();
        OUTLINE
            .iter()
            .map(|title| Slide {
                title: title.to_string(),
                content: slide_points(title, idea),
            })
            .collect()
    }
}

fn slide_points(title: &str, idea: &str) -> Vec<String> {
    let points: &[&str] = match title {
        "Title" => return vec![idea.to_string(), "Seed round pitch".to_string()],
        "Problem" => &["Who is hurting today", "How they cope now", "Why existing options fail"],
        "Solution" => &["What we build", "Why it is 10x better"],
        "Market Opportunity" => &["TAM, SAM and SOM estimates", "Growth drivers in India"],
        "Product" => &["Core user journey", "Key features shipped"],
        "Business Model" => &["Pricing", "Unit economics"],
        "Traction" => &["Users or pilots to date", "Month-on-month growth"],
        "Competition" => &["Direct competitors", "Our unfair advantage"],
        "Team" => &["Founders and relevant experience", "Key hires planned"],
        _ => &["Amount being raised", "Use of funds", "Milestones the round unlocks"],
    };
    points.iter().map(|p| p.to_string()).collect()
}
