//! Prompt template for the code-generation request.

/// Name of the function the generated module must define.
pub const ENTRY_POINT: &str = "fun_generated";

const TYPE_PLACEHOLDER: &str = "TYPE_OF_DATA";

const TEMPLATE_INSTRUCTIONS: &str = "YOUR TASK:
Generate a function called `fun_generated` that takes the input 'data' (that is a TYPE_OF_DATA))
and solves the problem that the user is asking.
Only write the code without any other comment or explanation.

Include the imports neccesary to run the code.

THE CODE:
";

/// Compose the request sent to the model. Pure; any string is accepted.
pub fn build_prompt(instruction: &str, description: &str, type_name: &str) -> String {
    let mut prompt = format!("The user has asked the following question: \n{}\n\n", instruction);
    prompt.push_str("DESCRIPTION OF THE DATA:\n");
    prompt.push_str(description);
    prompt.push_str(&TEMPLATE_INSTRUCTIONS.replace(TYPE_PLACEHOLDER, type_name));
    prompt
}

/// Drop markdown fence lines (```python, ```py, ```) from a completion.
pub fn strip_code_fences(text: &str) -> String {
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect();
    let mut code = kept.join("\n");
    // Fences glued onto code lines
    code = code.replace("```python", "").replace("```", "");
    if text.ends_with('\n') && !code.is_empty() {
        code.push('\n');
    }
    code
}
