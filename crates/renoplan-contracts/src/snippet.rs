//! Visual-snippet extraction from generated plan text.
//!
//! The plan is scanned line by line for a labeled visual-description section;
//! the section body becomes the image prompt. The scan is an explicit
//! two-state machine so the magic cutoffs live in one place instead of
//! drifting between call sites.

/// Case-insensitive marker phrases that open the visual-description section.
pub const SNIPPET_MARKERS: [&str; 2] = ["visual description", "detailed visual"];

/// Stop capturing once the joined section body grows past this many chars.
pub const CAPTURE_CUTOFF_CHARS: usize = 300;

/// A captured section shorter than this is discarded in favor of the
/// request-derived fallback.
pub const MIN_ACCEPTABLE_CHARS: usize = 50;

/// Fallback bound on the raw request when it has no sentence break.
pub const FALLBACK_REQUEST_CHARS: usize = 240;

/// Deployment-tunable extraction thresholds. The source deployments disagree
/// on the capture cutoff (250 / 300 / 400); 300 is the canonical default.
#[derive(Debug, Clone, Copy)]
pub struct ExtractorConfig {
    pub capture_cutoff: usize,
    pub min_acceptable: usize,
    pub fallback_chars: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            capture_cutoff: CAPTURE_CUTOFF_CHARS,
            min_acceptable: MIN_ACCEPTABLE_CHARS,
            fallback_chars: FALLBACK_REQUEST_CHARS,
        }
    }
}

/// Where the returned snippet came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetSource {
    PlanSection,
    RequestFallback,
}

impl SnippetSource {
    pub fn label(&self) -> &'static str {
        match self {
            SnippetSource::PlanSection => "plan_section",
            SnippetSource::RequestFallback => "request_fallback",
        }
    }
}

enum ScanState {
    Searching,
    Capturing,
}

pub fn extract_visual_snippet(plan_text: &str, request: &str) -> String {
    extract_visual_snippet_with(ExtractorConfig::default(), plan_text, request).0
}

/// Scans `plan_text` for a visual-description section and returns the snippet
/// plus its provenance. Falls back to the request when the marker is missing
/// or the captured body is too short to prompt an image model with.
pub fn extract_visual_snippet_with(
    config: ExtractorConfig,
    plan_text: &str,
    request: &str,
) -> (String, SnippetSource) {
    let mut state = ScanState::Searching;
    let mut captured: Vec<&str> = Vec::new();
    let mut captured_chars = 0usize;

    for line in plan_text.lines() {
        let trimmed = line.trim();
        match state {
            ScanState::Searching => {
                if contains_marker(trimmed) {
                    state = ScanState::Capturing;
                }
            }
            ScanState::Capturing => {
                if trimmed.is_empty() {
                    continue;
                }
                if is_header_line(trimmed) && !captured.is_empty() {
                    break;
                }
                if !captured.is_empty() {
                    captured_chars += 1;
                }
                captured_chars += trimmed.chars().count();
                captured.push(trimmed);
                if captured_chars > config.capture_cutoff {
                    break;
                }
            }
        }
    }

    if captured_chars >= config.min_acceptable {
        return (captured.join(" "), SnippetSource::PlanSection);
    }
    (
        request_fallback(request, config.fallback_chars),
        SnippetSource::RequestFallback,
    )
}

/// Final clamp to a provider's prompt-size limit, applied just before
/// submission. Char-based so multi-byte input never splits.
pub fn clamp_snippet(snippet: &str, limit: usize) -> String {
    if snippet.chars().count() <= limit {
        return snippet.to_string();
    }
    snippet.chars().take(limit).collect()
}

fn request_fallback(request: &str, fallback_chars: usize) -> String {
    if let Some(idx) = request.find('.') {
        let sentence = request[..idx].trim();
        if !sentence.is_empty() {
            return sentence.to_string();
        }
    }
    clamp_snippet(request, fallback_chars)
}

fn contains_marker(line: &str) -> bool {
    let lowered = line.to_lowercase();
    SNIPPET_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

fn is_header_line(line: &str) -> bool {
    line.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &str = "Modern kitchen, ₹50,000 budget, white cabinets, marble countertops";

    fn plan_with_section(body: &str) -> String {
        format!(
            "## Design Vision\nScandinavian calm with warm accents.\n\n\
             ## Budget Breakdown\n- Cabinets: 30,000\n- Counters: 20,000\n\n\
             ## Visual Description\n{body}\n\n## Timeline\nWeek 1: demolition."
        )
    }

    #[test]
    fn labeled_section_is_returned_verbatim_space_joined() {
        let body = "A bright kitchen with matte white cabinets,\nhoned marble counters and brushed brass pulls under\nwarm recessed lighting.";
        let plan = plan_with_section(body);
        let (snippet, source) = extract_visual_snippet_with(ExtractorConfig::default(), &plan, REQUEST);
        assert_eq!(
            snippet,
            "A bright kitchen with matte white cabinets, honed marble counters and brushed brass pulls under warm recessed lighting."
        );
        assert_eq!(source, SnippetSource::PlanSection);
    }

    #[test]
    fn marker_synonym_is_recognized() {
        let plan = "Intro text\nHere is a detailed visual of the result:\nSage green walls with oak open shelving and a deep farmhouse sink beneath a steel pendant light.";
        let (snippet, source) = extract_visual_snippet_with(ExtractorConfig::default(), plan, REQUEST);
        assert!(snippet.starts_with("Sage green walls"));
        assert_eq!(source, SnippetSource::PlanSection);
    }

    #[test]
    fn marker_match_is_case_insensitive() {
        let plan = plan_with_section("Warm terracotta floor tiles framed by cream walls, with rattan stools and a skylight washing the island in daylight.");
        let plan = plan.replace("## Visual Description", "## VISUAL DESCRIPTION");
        let (_, source) = extract_visual_snippet_with(ExtractorConfig::default(), &plan, REQUEST);
        assert_eq!(source, SnippetSource::PlanSection);
    }

    #[test]
    fn header_after_content_stops_capture() {
        let plan = plan_with_section(
            "Pale oak herringbone floors meet a deep navy island topped with white marble under three glass globe pendants.",
        );
        let snippet = extract_visual_snippet(&plan, REQUEST);
        assert!(!snippet.contains("Week 1"));
        assert!(!snippet.contains("Timeline"));
    }

    #[test]
    fn capture_stops_once_cutoff_is_exceeded() {
        let line = "a ".repeat(120); // 240 chars per line
        let body = format!("{line}\n{line}\n{line}");
        let plan = plan_with_section(&body);
        let snippet = extract_visual_snippet(&plan, REQUEST);
        // The second line crosses the 300-char cutoff; the third is never taken.
        assert!(snippet.chars().count() <= 2 * 241 + 1);
        assert!(snippet.chars().count() > CAPTURE_CUTOFF_CHARS);
    }

    #[test]
    fn short_captured_section_falls_back_to_request_sentence() {
        let plan = plan_with_section("Bright and airy.");
        let request = "Refit the attic as a study. Budget is small.";
        let (snippet, source) = extract_visual_snippet_with(ExtractorConfig::default(), &plan, request);
        assert_eq!(snippet, "Refit the attic as a study");
        assert_eq!(source, SnippetSource::RequestFallback);
    }

    #[test]
    fn missing_marker_falls_back_to_request() {
        let plan = "## Design Vision\nNothing visual here.\n## Timeline\nWeek 1.";
        let (snippet, source) = extract_visual_snippet_with(ExtractorConfig::default(), plan, REQUEST);
        assert_eq!(snippet, REQUEST);
        assert_eq!(source, SnippetSource::RequestFallback);
    }

    #[test]
    fn fallback_without_period_clamps_to_char_bound() {
        let long_request = "renovate ".repeat(60);
        let (snippet, _) =
            extract_visual_snippet_with(ExtractorConfig::default(), "no marker", &long_request);
        assert_eq!(snippet.chars().count(), FALLBACK_REQUEST_CHARS);
    }

    #[test]
    fn short_request_passes_through_unmodified() {
        let (snippet, _) =
            extract_visual_snippet_with(ExtractorConfig::default(), "no marker", "tiny bathroom");
        assert_eq!(snippet, "tiny bathroom");
    }

    #[test]
    fn snippet_is_never_empty_for_valid_request() {
        let (snippet, _) = extract_visual_snippet_with(ExtractorConfig::default(), "", REQUEST);
        assert!(!snippet.is_empty());
    }

    #[test]
    fn clamp_respects_char_boundaries() {
        assert_eq!(clamp_snippet("₹₹₹₹₹", 3), "₹₹₹");
        assert_eq!(clamp_snippet("short", 300), "short");
    }

    #[test]
    fn custom_cutoff_is_honored() {
        let config = ExtractorConfig {
            capture_cutoff: 250,
            ..ExtractorConfig::default()
        };
        let line = "b ".repeat(130); // 260 chars, crosses a 250 cutoff alone
        let body = format!("{line}\nnever captured");
        let plan = plan_with_section(&body);
        let (snippet, _) = extract_visual_snippet_with(config, &plan, REQUEST);
        assert!(!snippet.contains("never captured"));
    }
}
