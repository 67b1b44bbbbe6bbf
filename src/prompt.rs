use crate::types::Finding;

/// System message sent with every fix request
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Build the fix request for one finding
///
/// `numbered_content` is embedded verbatim so the model can match the
/// reported line range against the visible line numbers.
pub fn build_prompt(finding: &Finding, numbered_content: &str) -> String {
    let message = finding.message();
    let range = finding.line_range();
    format!(
        "You are a code assistant. Here is a code snippet from a file:\n\n\
        {numbered_content}\n\n\
        The code has an issue: \"{message}\" located between lines {start} and {end}. \
        Please provide fixed file for this issue only.\n\
        Do not change any other code. Do not include any explanation and do not add any annotation, \
        Provide entire file with fix.\n\
        Add a comment near the fixed code lines indicating \"AI Fix for issue: {message}\".",
        start = range.start_line,
        end = range.end_line,
    )
}
