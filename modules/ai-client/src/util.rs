/// Strip markdown code blocks from a response.
///
/// Grounded generation returns prose; when the model wraps its JSON payload
/// in ```json fences this peels them off before parsing.
pub fn strip_code_blocks(response: &str) -> &str {
    response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}
