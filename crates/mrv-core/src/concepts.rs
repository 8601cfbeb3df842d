//! # Key Concepts
//!
//! Static teaching content shown before any scoring: what a boundary,
//! baseline, assumption, emission factor and uncertainty statement are, and
//! which integrity failures to watch for.

use serde::Serialize;

/// One teaching entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Concept {
    pub number: u8,
    pub title: &'static str,
    pub body: &'static str,
}

/// Opening paragraph.
pub const INTRODUCTION: &str = "Before any calculator: define the **system**, defend the **baseline**, \
write your **assumptions**, cite your **factors**, and express **uncertainty**. \
That's how you build carbon integrity.";

pub const KEY_CONCEPTS: [Concept; 6] = [
    Concept {
        number: 1,
        title: "Boundaries (what's in / out)",
        body: "A boundary is your system definition. Different boundaries → different \"truth\".",
    },
    Concept {
        number: 2,
        title: "Baselines (what would happen otherwise)",
        body: "A baseline is a counterfactual story with rules (methodology logic).",
    },
    Concept {
        number: 3,
        title: "Assumptions (your real inputs)",
        body: "Assumptions are not weaknesses — they are your transparency layer.",
    },
    Concept {
        number: 4,
        title: "Emission Factors (EFs)",
        body: "EFs are contextual: geography, year, dataset, Scope 2 basis choice.",
    },
    Concept {
        number: 5,
        title: "Uncertainty",
        body: "Uncertainty is how you communicate confidence and MRV readiness.",
    },
    Concept {
        number: 6,
        title: "Integrity failures to watch",
        body: "Double counting, baseline inflation, boundary creep, EF cherry-picking.",
    },
];

/// Render the introduction and all concepts as markdown.
#[must_use]
pub fn render_concepts() -> String {
    let mut out = String::from("## What this is for\n");
    out.push_str(INTRODUCTION);
    out.push_str("\n\n## Key Concepts\n");
    for concept in &KEY_CONCEPTS {
        out.push_str(&format!(
            "\n### {}) {}\n{}\n",
            concept.number, concept.title, concept.body
        ));
    }
    out
}
