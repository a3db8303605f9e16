//! Prompt construction for the renovation planner.
//!
//! Both instructions are deterministic string templates: the raw request is
//! interpolated verbatim, with no sanitization of user-supplied text.

/// Section labels the generated plan is asked to carry, in order.
pub const SECTION_LABELS: [&str; 4] = [
    "Design Vision",
    "Budget Breakdown",
    "Timeline",
    "Visual Description",
];

const PLANNER_PERSONA: &str = "You are an expert home renovation planner. For every request you \
produce a complete, practical renovation plan with four parts: a design vision covering style, \
color palette, materials and mood; an itemized budget breakdown whose line items sum to the \
stated budget; a week-by-week timeline; and a closing section labeled 'Visual Description' \
holding one photorealistic paragraph of 100-150 words that enumerates wall and furniture \
colors, materials, lighting, layout and texture of the finished space.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system_instruction: String,
    pub user_instruction: String,
}

pub fn build_prompt_pair(request: &str) -> PromptPair {
    let user_instruction = format!(
        "Renovation request: {request}\n\n\
         Structure the plan with these sections:\n\
         1. Design Vision: style, color palette, materials, mood.\n\
         2. Budget Breakdown: itemized costs summing to the stated budget.\n\
         3. Timeline: week-by-week schedule of the work.\n\
         4. Visual Description: one paragraph, 100-150 words, photorealistic, \
         covering wall and furniture colors, materials, lighting, layout and texture."
    );
    PromptPair {
        system_instruction: PLANNER_PERSONA.to_string(),
        user_instruction,
    }
}

/// Wraps a visual snippet in the fixed enhancement template that biases
/// image providers toward the interior-design domain.
pub fn enhance_image_prompt(snippet: &str) -> String {
    format!(
        "{snippet}, professional interior design photograph, high quality, \
         well lit, architectural photography"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_instruction_carries_request_and_all_section_labels() {
        let request = "Modern kitchen, ₹50,000 budget, white cabinets, marble countertops";
        let pair = build_prompt_pair(request);
        assert!(pair.user_instruction.contains(request));
        for label in SECTION_LABELS {
            assert!(
                pair.user_instruction.contains(label),
                "missing section label {label}"
            );
        }
    }

    #[test]
    fn system_instruction_is_fixed_persona() {
        let a = build_prompt_pair("repaint the bedroom");
        let b = build_prompt_pair("new bathroom tiles");
        assert_eq!(a.system_instruction, b.system_instruction);
        assert!(a.system_instruction.contains("renovation planner"));
        assert!(a.system_instruction.contains("Visual Description"));
    }

    #[test]
    fn build_is_deterministic() {
        let request = "open up the living room";
        assert_eq!(build_prompt_pair(request), build_prompt_pair(request));
    }

    #[test]
    fn enhancement_template_keeps_snippet_and_adds_qualifiers() {
        let enhanced = enhance_image_prompt("warm oak floors and sage green walls");
        assert!(enhanced.starts_with("warm oak floors and sage green walls"));
        assert!(enhanced.contains("professional interior design photograph"));
        assert!(enhanced.contains("high quality"));
        assert!(enhanced.contains("well lit"));
        assert!(enhanced.contains("architectural photography"));
    }
}
