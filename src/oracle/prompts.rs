//! Prompt text for the classification oracle.
//!
//! The wording here is load-bearing: the system instruction teaches the
//! model how to read the serialized taxonomy blocks, and the step prompts
//! pin the answer to terms from the outline. Treat any change as a
//! behavior change, not a copy edit.

use crate::taxonomy::Dimension;

/// Teaches the model the two-part taxonomy format with a worked
/// gastronomy example.
pub const SYSTEM_INSTRUCTION: &str = r#"
You are presented with learning material that you shall classify using a given taxonomy.

You will know that a taxonomy starts when you see the line:

Taxonomy for <placeholder>

The taxonomy will always consist of two parts, an outline and definition section.

You will know that the outline starts when you see the line:

A) Outline of <placeholder>

You will know that the definitions starts when you see the line:

b) Definitions of <placeholder>

Between the "---" is an example of an outline for gastronomic terms :

---
1 Drinks
1.1 Non-alcoholic
1.2 Alcoholic
1.2.1 Beer
1.2.2 Wine
2 Food
2.1 Italian
2.2 French
---

Each item in the outline consists of an index and the term, consequently:

* "1 Drinks" describes the term "Drinks" at index "1"
* "1.1 Non-alcoholic" describes the term "Non-alcoholic" at index "1.1"

Further, the index in the outline express a parent-child relationship, consequently:

* "1.1" and "1.2" are children of "1" and
* "1.2.1" and "1.2.2" are children of "1.2"
* "Alcoholic" is a child element of "Drinks".
* "Food" is a parent element of "Italian" and "French"
* "Drinks" and "Food" are root elements
* "Beer", "Wine", "Italian" and "French" are leaf elements

Between the "---" is an example of definitions for gastronomic terms :

---
1 Drinks

All types of beverages.

1.1 Non-alcoholic

Beverages without alcohol.

1.2 Alcoholic

Beverages that contain alcohol.

1.2.1 Beer

A malty alcoholic drink.

1.2.2 Wine

An alcoholic drink made of grapes.

2 Food

2.1 Italian

Dishes that are typically prepared in Italy.

2.2 French

Dishes that are typically prepared in France.
---

Each definition has a title and a description. The title always starts with an index and always exactly matches an item in the previously explained outline. The descriptions follows in the next following paragraphs and ends with the next title.

Consequently:

* "1 Drinks" is the title with index "1" for term "Drinks"
* "All types of beverages." is the description of "Drinks"
* "1.2 Alcoholic" is the title with index "1.2" for term "Alcoholic"
* "Beverages that contain alcohol." is the description of "Alcoholic"

Sometimes, a definition does not contain a description. However when available, use the description when determining classification matches.
"#;

/// Three-step prompt asking for the single best-matching term.
pub fn single_prompt(taxonomy: &str, priming_instruction: &str, matching_instruction: &str) -> String {
    format!(
        r#"
Step 1: {priming_instruction}

Step 2: Consider the following taxonomy within "---" for classification:

---
{taxonomy}
---

Step 3: Only using terms from the taxonomy, {matching_instruction}. When responding the matched term, respond without its index and description.
"#
    )
}

/// Three-step prompt asking for all matching terms.
pub fn multi_prompt(taxonomy: &str, priming_instruction: &str, matching_instruction: &str) -> String {
    format!(
        r#"
Step 1: {priming_instruction}

Step 2: Consider the following taxonomy within "---" for classification:

---
{taxonomy}
---

Step 3: Only using terms from the taxonomy, {matching_instruction}. When responding the matched terms, respond without their index and description.
"#
    )
}

/// Step-1 instruction priming the model's description of the material.
pub fn priming_instruction(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Area => {
            "Describe the precise area of learning covered by the provided learning material in one sentence."
        }
        Dimension::Ability => {
            "Describe the student abilities challenged by the provided learning material in one sentence."
        }
        // "up tp" is what the deployed prompt says; keep it until the
        // prompt is re-evaluated against real traffic.
        Dimension::Scope => {
            "Describe the representative aspects of the learning material in up tp 200 words."
        }
    }
}

/// Step-3 instruction selecting taxonomy terms.
pub fn matching_instruction(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Area => "find the term that best matches the description provided in step 1",
        Dimension::Ability => "find the terms that best match the description provided in step 1",
        Dimension::Scope => "find the terms that best match the description of the learning material",
    }
}
